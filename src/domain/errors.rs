//! Domain Errors

use crate::infrastructure::server_impl::response::StatusCode;

/// Everything that can go wrong while handling a single connection.
///
/// None of these take the listener down, the connection is dropped and the
/// next one is accepted.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request has no Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),
    #[error("body is JSON but not an object")]
    NotAnObject,
    #[error("body is neither JSON nor valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("malformed request head: {0}")]
    Malformed(#[from] httparse::Error),
    #[error("request head too large")]
    HeadTooLarge,
    #[error("connection closed before the request was complete")]
    UnexpectedEof,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RequestError {
    /// Status to answer with before closing, if the error happened early enough
    /// for a response to make sense.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Malformed(httparse::Error::TooManyHeaders) | Self::HeadTooLarge => {
                Some(StatusCode::HeaderFieldsTooLarge)
            }
            Self::Malformed(_) => Some(StatusCode::BadRequest),
            _ => None,
        }
    }
}
