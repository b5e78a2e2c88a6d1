use crate::domain::errors::RequestError;
use crate::domain::payload::{Field, Payload};
use either::Either;
use serde_json::Value;
use std::fmt;
use std::io::Write;
use strum::IntoEnumIterator;

pub const SEPARATOR: &str =
    "================================================================================";
pub const HEADLINE: &str = "Webhook received!";

/// What gets printed for one webhook: the field breakdown when the body is a
/// JSON object, the body text when it isn't JSON at all.
#[derive(Debug)]
pub struct Report<'a> {
    decoded: Either<Payload, &'a str>,
}

impl<'a> Report<'a> {
    /// Decodes a raw body.
    ///
    /// Only malformed JSON falls back to the raw text, which then has to be
    /// valid UTF-8. Well-formed JSON that isn't an object has no fields to
    /// print and fails the request.
    pub fn decode(body: &'a [u8]) -> Result<Self, RequestError> {
        let decoded = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Either::Left(Payload::from(map)),
            Ok(_) => return Err(RequestError::NotAnObject),
            Err(err) => {
                tracing::debug!(error = %err, "body is not JSON");
                Either::Right(std::str::from_utf8(body)?)
            }
        };

        Ok(Self { decoded })
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.decoded.as_ref().left()
    }

    /// Writes the whole block in one go and flushes.
    pub fn print_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(self.to_string().as_bytes())?;
        out.flush()
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "{HEADLINE}")?;
        writeln!(f, "{SEPARATOR}")?;

        match &self.decoded {
            Either::Left(payload) => {
                for field in Field::iter() {
                    writeln!(f, "{}: {}", field.label(), payload.field(field))?;
                }
            }
            Either::Right(raw) => writeln!(f, "Raw data: {raw}")?,
        }

        writeln!(f, "{SEPARATOR}")
    }
}
