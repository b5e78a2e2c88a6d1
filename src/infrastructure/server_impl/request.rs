use crate::domain::errors::RequestError;
use crate::infrastructure::server_impl::server::{Header, Method};
use enum_map::EnumMap;

#[derive(Debug)]
pub struct Request<'a> {
    pub method: Method,
    /// Method exactly as sent, kept for error messages about unknown methods.
    pub method_token: &'a str,
    pub headers: EnumMap<Header, Option<&'a str>>,
    pub resource: &'a str,
    /// Length of the request line plus headers, including the blank line.
    pub head_len: usize,
    /// Bytes buffered after the head. Only complete once `Content-Length` bytes were read.
    pub body: &'a [u8],
}

impl Request<'_> {
    pub fn header(&self, header: Header) -> Option<&str> {
        self.headers[header]
    }

    pub fn content_length(&self) -> Result<usize, RequestError> {
        let raw = self
            .header(Header::CONTENT_LENGTH)
            .ok_or(RequestError::MissingContentLength)?;

        raw.trim()
            .parse()
            .map_err(|_| RequestError::InvalidContentLength(raw.to_owned()))
    }

    pub fn expects_continue(&self) -> bool {
        self.header(Header::EXPECT)
            .is_some_and(|value| unicase::eq(value.trim(), "100-continue"))
    }
}
