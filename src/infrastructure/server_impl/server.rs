use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::api::webhook_route;
use crate::application::ServerConfig;
use crate::domain::errors::RequestError;
use crate::AnyResult;
use compact_str::CompactString;
use enum_map::{Enum, EnumMap};
use eyre::WrapErr;
use httparse::{ParserConfig, Status};
use strum::{EnumIter, EnumMessage, EnumString, IntoEnumIterator, IntoStaticStr};
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::infrastructure::server_impl::request::Request;
use crate::infrastructure::server_impl::response::{Response, StatusCode, CONTINUE};

pub const MAX_HEADERS: usize = 64;
pub const MAX_HEAD_BYTES: usize = 64 * 1024;
const READ_CHUNK: usize = 2048;

#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, IntoStaticStr, EnumIter, EnumMessage,
)]
#[non_exhaustive]
pub enum Header {
    #[strum(serialize = "accept", message = "Accept")]
    ACCEPT,
    #[strum(serialize = "connection", message = "Connection")]
    CONNECTION,
    #[strum(serialize = "content-length", message = "Content-Length")]
    CONTENT_LENGTH,
    #[strum(serialize = "content-type", message = "Content-type")]
    CONTENT_TYPE,
    #[strum(serialize = "expect", message = "Expect")]
    EXPECT,
    #[strum(serialize = "host", message = "Host")]
    HOST,
    #[strum(serialize = "user-agent", message = "User-Agent")]
    USER_AGENT,
}

impl Header {
    /// Spelling used when writing the header out.
    pub fn canonical_name(self) -> &'static str {
        self.get_message().unwrap_or_else(|| self.into())
    }
}

impl FromStr for Header {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter().find(|c| unicase::eq(c.into(), s)).ok_or(())
    }
}

#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, EnumString, IntoStaticStr)]
pub enum Method {
    CONNECT,
    DELETE,
    GET,
    HEAD,
    OPTIONS,
    PATCH,
    POST,
    PUT,
    TRACE,
    /// Any token httparse accepts that isn't listed above.
    #[strum(disabled)]
    OTHER,
}

impl Method {
    pub fn from_token(token: &str) -> Self {
        Method::from_str(token).unwrap_or(Method::OTHER)
    }
}

/// Parses the request head at the start of `request`.
///
/// Returns `Ok(None)` while the head is incomplete. Whatever follows the head
/// becomes the body, it is up to the caller to make sure all of it was read.
pub fn parse_http(request: &[u8]) -> Result<Option<Request<'_>>, RequestError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let head_len = match ParserConfig::default().parse_request(&mut req, request)? {
        Status::Complete(idx) => idx,
        Status::Partial => return Ok(None),
    };

    // both are always set on a complete parse
    let method_token = req.method.unwrap_or_default();
    let resource = req.path.unwrap_or_default();

    let mut known: EnumMap<Header, Option<&str>> = EnumMap::default();
    for header in req.headers.iter() {
        let Ok(name) = Header::from_str(header.name) else {
            continue;
        };
        let Ok(value) = std::str::from_utf8(header.value) else {
            continue;
        };
        // first occurrence wins
        known[name].get_or_insert(value);
    }

    Ok(Some(Request {
        method: Method::from_token(method_token),
        method_token,
        headers: known,
        resource,
        head_len,
        body: &request[head_len..],
    }))
}

/// What got handled on a connection, for the access log.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    pub resource: CompactString,
    pub status: StatusCode,
}

/// Reads one request off `stream`, answers it and closes the write side.
///
/// `Ok(None)` means the peer disconnected without sending anything.
pub async fn serve_connection<S, W>(stream: &mut S, out: &mut W) -> Result<Option<Exchange>, RequestError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    W: Write,
{
    let mut buffer = Vec::with_capacity(READ_CHUNK);

    let outcome = match read_and_route(stream, &mut buffer, out).await {
        Ok(Some((exchange, response))) => write_response(stream, response)
            .await
            .map(|_| Some(exchange))
            .map_err(RequestError::from),
        Ok(None) => Ok(None),
        Err(err) => {
            if let Some(status) = err.status_code() {
                let response = Response::text(status, err.to_string());
                if let Err(write_err) = write_response(stream, response).await {
                    tracing::debug!(error = %write_err, "could not send error response");
                }
            }
            Err(err)
        }
    };

    let _ = stream.shutdown().await;
    outcome
}

async fn write_response<S>(stream: &mut S, response: Response) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&response.into_http()).await?;
    stream.flush().await
}

async fn read_and_route<S, W>(
    stream: &mut S,
    buffer: &mut Vec<u8>,
    out: &mut W,
) -> Result<Option<(Exchange, Response)>, RequestError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    W: Write,
{
    let mut chunk = [0u8; READ_CHUNK];

    let (head_len, method, content_length, expects_continue) = loop {
        if let Some(head) = parse_http(buffer)? {
            break (
                head.head_len,
                head.method,
                head.content_length(),
                head.expects_continue(),
            );
        }
        if buffer.len() >= MAX_HEAD_BYTES {
            return Err(RequestError::HeadTooLarge);
        }

        match stream.read(&mut chunk).await? {
            0 if buffer.is_empty() => return Ok(None),
            0 => return Err(RequestError::UnexpectedEof),
            n => buffer.extend_from_slice(&chunk[..n]),
        }
    };

    // only POST needs a body, anything else is drained if it announces one
    let body_len = match method {
        Method::POST => content_length?,
        _ => content_length.unwrap_or(0),
    };
    let total = head_len.saturating_add(body_len);

    if method == Method::POST && expects_continue && buffer.len() < total {
        stream.write_all(CONTINUE).await?;
        stream.flush().await?;
    }

    while buffer.len() < total {
        match stream.read(&mut chunk).await? {
            0 => return Err(RequestError::UnexpectedEof),
            n => buffer.extend_from_slice(&chunk[..n]),
        }
    }
    buffer.truncate(total);

    let request = parse_http(buffer)?.ok_or(RequestError::UnexpectedEof)?;
    let response = webhook_route(&request, out)?;

    let exchange = Exchange {
        method: request.method,
        resource: CompactString::from(request.resource),
        status: response.status_code,
    };

    Ok(Some((exchange, response)))
}

/// The listening socket. Connections are handled one at a time, in accept order.
#[derive(Debug)]
pub struct WebhookServer {
    listener: TcpListener,
    config: ServerConfig,
}

impl WebhookServer {
    pub async fn bind(config: ServerConfig) -> AnyResult<Self> {
        let listener = TcpListener::bind(config.addr)
            .await
            .wrap_err_with(|| format!("failed to bind {}", config.addr))?;

        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> AnyResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts and handles connections until `shutdown` resolves. Reports are
    /// written to `out`.
    ///
    /// A failing connection is logged and dropped, the listener keeps going.
    pub async fn serve<W, F>(self, out: &mut W, shutdown: F) -> AnyResult<()>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let (mut socket, peer) = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to accept connection");
                        continue;
                    }
                },
            };

            tracing::debug!(%peer, "accepted connection");

            match serve_connection(&mut socket, out).await {
                Ok(Some(exchange)) if self.config.access_log => log_access(peer, &exchange),
                Ok(_) => {}
                Err(err) => tracing::warn!(%peer, error = %err, "request failed"),
            }
        }
    }
}

fn log_access(peer: SocketAddr, exchange: &Exchange) {
    let timestamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[day]/[month repr:short]/[year] [hour]:[minute]:[second]"
        ))
        .unwrap_or_default();
    let method: &str = exchange.method.into();

    tracing::info!(
        %peer,
        method,
        path = %exchange.resource,
        status = exchange.status.as_u16(),
        "[{timestamp}] \"{method} {}\" {}",
        exchange.resource,
        exchange.status.as_u16()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_with_body() {
        let sample = b"POST /somepath HTTP/1.1\nHost: ifconfig.me\nUser-Agent: curl/8.5.0\nAccept: */*\nContent-Type: application/json\nContent-Length: 16\r\n\r\n{\"json_key\": 10}";

        let request = parse_http(sample).unwrap().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.resource, "/somepath");
        assert_eq!(
            request.headers[Header::CONTENT_TYPE],
            Some("application/json")
        );
        assert_eq!(request.content_length().unwrap(), 16);
        assert_eq!(request.body, br#"{"json_key": 10}"#);
    }

    #[test]
    fn success_without_body() {
        let sample = b"GET /somepath HTTP/1.1\nHost: ifconfig.me\nUser-Agent: curl/8.5.0\nAccept: */*\nContent-Type: text/html; charset=ISO-8859-4\r\n\r\n";

        let request = parse_http(sample).unwrap().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.resource, "/somepath");
        assert_eq!(request.headers[Header::HOST], Some("ifconfig.me"));
        assert!(request.body.is_empty());
        assert!(matches!(
            request.content_length(),
            Err(RequestError::MissingContentLength)
        ));
    }

    #[test]
    fn partial_head() {
        assert!(parse_http(b"POST / HTTP/1.1\r\nHost: local").unwrap().is_none());
        assert!(parse_http(b"").unwrap().is_none());
    }

    #[test]
    fn malformed_head() {
        let err = parse_http(b"POST / HTTP/1.1\r\nBad Header\r\n\r\n").unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
        assert_eq!(err.status_code(), Some(StatusCode::BadRequest));
    }

    #[test]
    fn header_names_are_case_insensitive() {
        assert_eq!(Header::from_str("content-length"), Ok(Header::CONTENT_LENGTH));
        assert_eq!(Header::from_str("CONTENT-LENGTH"), Ok(Header::CONTENT_LENGTH));
        assert_eq!(Header::from_str("Content-Type"), Ok(Header::CONTENT_TYPE));
        assert_eq!(Header::from_str("X-Hub-Signature"), Err(()));
        assert_eq!(Header::CONTENT_TYPE.canonical_name(), "Content-type");
    }

    #[test]
    fn invalid_content_length() {
        let sample = b"POST / HTTP/1.1\r\ncontent-length: ten\r\n\r\n";
        let request = parse_http(sample).unwrap().unwrap();

        assert!(matches!(
            request.content_length(),
            Err(RequestError::InvalidContentLength(raw)) if raw == "ten"
        ));
    }

    #[test]
    fn first_header_occurrence_wins() {
        let sample = b"POST / HTTP/1.1\r\nContent-Length: 2\r\nContent-Length: 5\r\n\r\nOK";
        let request = parse_http(sample).unwrap().unwrap();
        assert_eq!(request.content_length().unwrap(), 2);
    }

    #[test]
    fn expect_continue() {
        let sample = b"POST / HTTP/1.1\r\nExpect: 100-Continue\r\nContent-Length: 0\r\n\r\n";
        assert!(parse_http(sample).unwrap().unwrap().expects_continue());

        let sample = b"POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
        assert!(!parse_http(sample).unwrap().unwrap().expects_continue());
    }

    #[test]
    fn unknown_methods() {
        let request = parse_http(b"PURGE /cache HTTP/1.1\r\n\r\n").unwrap().unwrap();
        assert_eq!(request.method, Method::OTHER);
        assert_eq!(request.method_token, "PURGE");
    }
}
