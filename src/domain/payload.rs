use derive_more::Deref;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use strum::{EnumIter, EnumMessage, IntoStaticStr};

/// Text printed for a field the payload doesn't carry.
pub const ABSENT_PLACEHOLDER: &str = "None";

/// A webhook body that decoded to a JSON object.
///
/// No schema is enforced, any object is a valid payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Deref)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

/// The fields printed for every payload, in print order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumMessage, EnumIter)]
pub enum Field {
    #[strum(serialize = "from", message = "From")]
    Sender,
    #[strum(serialize = "to", message = "To")]
    Recipient,
    #[strum(serialize = "subject", message = "Subject")]
    Subject,
    #[strum(serialize = "body", message = "Body")]
    Body,
    #[strum(serialize = "timestamp", message = "Timestamp")]
    Timestamp,
}

impl Field {
    /// Key looked up in the payload.
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        self.get_message().unwrap_or_else(|| self.key())
    }
}

#[derive(Debug, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Present(&'a Value),
}

impl Payload {
    /// Looks a field up, `null` counts as absent.
    pub fn field(&self, field: Field) -> FieldValue<'_> {
        self.get_or_absent(field.key())
    }

    pub fn get_or_absent(&self, key: &str) -> FieldValue<'_> {
        match self.0.get(key) {
            None | Some(Value::Null) => FieldValue::Absent,
            Some(value) => FieldValue::Present(value),
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => f.write_str(ABSENT_PLACEHOLDER),
            // strings print bare, everything else as compact json
            FieldValue::Present(Value::String(s)) => f.write_str(s),
            FieldValue::Present(other) => write!(f, "{other}"),
        }
    }
}
