//! One request/response cycle over a borrowed native session.
//!
//! # Design
//! `Client` holds the engine, the caller's session handle and a few options,
//! and nothing else. `send` opens a connection and request handle, attaches
//! cookies and headers, transmits the body, rebuilds the response and then
//! releases both handles. No state survives between calls, so every
//! `Response` owns its own cookies and headers.
//!
//! Timeouts and cancellation belong on the session handle; the client never
//! creates or configures a session.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::{Engine, SessionHandle};
use crate::error::HttpError;
use crate::http::{Request, Response};
use crate::request::open_request;
use crate::response::assemble_response;
use crate::sender::{send_request, Sentinel, SENTINEL_COOKIE_LINE};

/// Tunables for `Client`. Every field has a default, so a partial JSON or
/// TOML document deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Add the sentinel cookie line before real cookies. Only needed for
    /// engines that drop the first add-if-new `Cookie` line.
    pub sentinel_cookie: bool,
    pub sentinel_cookie_line: String,
    /// Ask the engine to keep the connection for multi-step authentication.
    pub keep_connection: bool,
    /// Initial buffer size for info queries. Zero always takes the resize
    /// path.
    pub query_buffer_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            sentinel_cookie: true,
            sentinel_cookie_line: SENTINEL_COOKIE_LINE.to_string(),
            keep_connection: true,
            query_buffer_size: 0,
        }
    }
}

/// Sends `Request` values through a native engine session.
#[derive(Debug, Clone)]
pub struct Client<E> {
    engine: E,
    session: SessionHandle,
    options: ClientOptions,
}

impl<E: Engine> Client<E> {
    pub fn new(engine: E, session: SessionHandle) -> Self {
        Self::with_options(engine, session, ClientOptions::default())
    }

    pub fn with_options(engine: E, session: SessionHandle, options: ClientOptions) -> Self {
        Self {
            engine,
            session,
            options,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn session(&self) -> SessionHandle {
        self.session
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Run one full request/response cycle.
    ///
    /// Any failure aborts the cycle; there is no partial response. The
    /// connection and request handles are released on every path.
    pub fn send(&self, request: &Request) -> Result<Response, HttpError> {
        debug!("{} {}", request.method, request.url);
        let opened = open_request(
            &self.engine,
            self.session,
            request,
            self.options.keep_connection,
        )?;

        let sentinel = if self.options.sentinel_cookie {
            Sentinel::Line(&self.options.sentinel_cookie_line)
        } else {
            Sentinel::Disabled
        };
        send_request(&self.engine, opened.handle(), request, sentinel)?;

        assemble_response(
            &self.engine,
            opened.handle(),
            &request.cookies,
            self.options.query_buffer_size,
        )
    }
}
