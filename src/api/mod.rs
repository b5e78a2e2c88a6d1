use crate::application::report::Report;
use crate::domain::errors::RequestError;
use crate::infrastructure::server_impl::request::Request;
use crate::infrastructure::server_impl::response::{Response, StatusCode};
use crate::infrastructure::server_impl::server::Method;
use std::io::Write;

/// Any path is accepted. POST bodies are printed to `out` and acknowledged,
/// other methods are refused.
pub fn webhook_route<W: Write>(req: &Request<'_>, out: &mut W) -> Result<Response, RequestError> {
    if req.method != Method::POST {
        return Ok(Response::text(
            StatusCode::NotImplemented,
            format!("Unsupported method ('{}')", req.method_token),
        ));
    }

    let report = Report::decode(req.body)?;
    report.print_to(out)?;

    Ok(Response::acknowledge())
}
