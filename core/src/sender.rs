//! Attaching cookies and headers to an opened request, then transmitting it.

use log::{debug, warn};

use crate::engine::{AddHeaderMode, Engine, RequestHandle};
use crate::error::HttpError;
use crate::http::Request;

/// Line added ahead of the real cookies when the sentinel is enabled.
pub const SENTINEL_COOKIE_LINE: &str = "Cookie: ignore=ignore";

/// How the sender attaches cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel<'a> {
    /// Add this line with add-if-new semantics before the real cookies.
    /// Some engines drop the first add-if-new `Cookie` line they receive.
    Line(&'a str),
    Disabled,
}

/// Attach cookies, then headers, then send the body.
///
/// Fails fast: the first failed attachment aborts the send, and lines added
/// before it stay on the handle.
pub fn send_request<E: Engine + ?Sized>(
    engine: &E,
    handle: RequestHandle,
    request: &Request,
    sentinel: Sentinel<'_>,
) -> Result<(), HttpError> {
    attach_cookies(engine, handle, request, sentinel)?;
    attach_headers(engine, handle, request)?;

    debug!("sending {} byte body", request.body.len());
    engine
        .send_request(handle, "", &request.body)
        .map_err(HttpError::Send)
}

fn attach_cookies<E: Engine + ?Sized>(
    engine: &E,
    handle: RequestHandle,
    request: &Request,
    sentinel: Sentinel<'_>,
) -> Result<(), HttpError> {
    if let Sentinel::Line(line) = sentinel {
        // The engine may legitimately refuse this; it is only a placeholder.
        if let Err(e) = engine.add_headers(handle, line, AddHeaderMode::AddIfNew) {
            warn!("sentinel cookie header rejected: {e}");
        }
    }

    for cookie in &request.cookies {
        let line = format!("Cookie: {cookie}");
        engine
            .add_headers(handle, &line, AddHeaderMode::Add)
            .map_err(|source| HttpError::Header {
                name: "Cookie".to_string(),
                source,
            })?;
    }
    Ok(())
}

fn attach_headers<E: Engine + ?Sized>(
    engine: &E,
    handle: RequestHandle,
    request: &Request,
) -> Result<(), HttpError> {
    for (key, value) in &request.headers {
        let line = format!("{key}: {value}");
        engine
            .add_headers(handle, &line, AddHeaderMode::AddReplace)
            .map_err(|source| HttpError::Header {
                name: key.clone(),
                source,
            })?;
    }
    Ok(())
}
