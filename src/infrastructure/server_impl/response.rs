use crate::infrastructure::server_impl::server::Header;
use bytes::{Bytes, BytesMut};
use compact_str::CompactString;
use fnv::FnvHashMap;
use std::fmt::Write;
use strum::{EnumMessage, EnumString, IntoStaticStr};
use time::macros::format_description;
use time::OffsetDateTime;

pub const SERVER_NAME: &str = "webhook-receiver";

/// Interim answer to `Expect: 100-continue`.
pub const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumString, EnumMessage)]
pub enum StatusCode {
    #[strum(serialize = "200", message = "OK")]
    Ok,
    #[strum(serialize = "400", message = "Bad Request")]
    BadRequest,
    #[strum(serialize = "431", message = "Request Header Fields Too Large")]
    HeaderFieldsTooLarge,
    #[strum(serialize = "501", message = "Not Implemented")]
    NotImplemented,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        let code: &str = self.into();
        code.parse().unwrap_or(500)
    }
}

#[derive(Debug)]
pub struct Response {
    pub headers: FnvHashMap<Header, CompactString>,
    pub status_code: StatusCode,
    pub body: Option<Bytes>,
}

impl Response {
    pub fn from_status_code(value: StatusCode, body: impl Into<Option<Bytes>>) -> Self {
        Self {
            headers: Default::default(),
            status_code: value,
            body: body.into(),
        }
    }

    /// A `text/plain` response.
    pub fn text(value: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut response = Self::from_status_code(value, body.into());
        response
            .headers
            .insert(Header::CONTENT_TYPE, CompactString::from("text/plain"));
        response
    }

    /// The fixed acknowledgement sent for every webhook.
    pub fn acknowledge() -> Self {
        Self::text(StatusCode::Ok, Bytes::from_static(b"OK"))
    }
}

impl Response {
    /// Serializes the response. The connection is always closed afterwards, so
    /// `Connection` and `Content-Length` are set here and not taken from `headers`.
    pub fn into_http(self) -> Bytes {
        let mut head = String::with_capacity(160);
        let status_code: &str = self.status_code.into();
        let status_message = self.status_code.get_message().unwrap_or_default();
        let date = OffsetDateTime::now_utc()
            .format(format_description!(
                "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
            ))
            .unwrap_or_default();

        write!(
            head,
            "HTTP/1.1 {status_code} {status_message}\r\n\
             Server: {SERVER_NAME}\r\n\
             Date: {date}\r\n"
        )
        .expect("No reason to fail.");

        let mut headers: Vec<_> = self
            .headers
            .iter()
            .filter(|(h, _)| !matches!(h, Header::CONTENT_LENGTH | Header::CONNECTION))
            .collect();
        headers.sort_by_key(|(h, _)| **h);

        for (header, value) in headers {
            write!(head, "{}: {value}\r\n", header.canonical_name()).expect("No reason to fail.");
        }

        let body = self.body.unwrap_or_default();
        let length = body.len();
        write!(
            head,
            "Content-Length: {length}\r\n\
             Connection: close\r\n\r\n"
        )
        .expect("No reason to fail.");

        let mut buf = BytesMut::with_capacity(head.len() + length);
        buf.extend_from_slice(head.as_bytes());
        buf.extend_from_slice(&body);
        buf.freeze()
    }
}
