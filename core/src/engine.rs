//! The native engine seen from the adapter's side.
//!
//! # Design
//! The engine is a handle-based API: a session owns connections, a connection
//! owns requests, and every call names the handle it works on. The trait takes
//! `&self` everywhere because all state lives behind those handles, exactly as
//! it does in the native library. Implementations that keep state in Rust
//! (the scripted engine, test engines) use interior mutability.
//!
//! `query_info` returns a [`QueryInfo`] value instead of smuggling the
//! required buffer size through the error channel, which keeps the resize
//! retry in [`crate::query`] mechanical.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Session handle owned by the caller. The adapter borrows it and never
/// creates or closes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub usize);

/// Connection handle opened by the request builder for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionHandle(pub usize);

/// Request handle opened by the request builder for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestHandle(pub usize);

/// Service kind requested from `connect`. Only HTTP is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Http,
}

/// Flags passed to `connect` and `open_request`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFlags {
    /// Use TLS. Set iff the URL scheme is `https`.
    #[serde(default)]
    pub secure: bool,
    /// Keep the connection open across the exchange so multi-step
    /// authentication (NTLM, Negotiate) can complete.
    #[serde(default)]
    pub keep_connection: bool,
}

/// How `add_headers` merges a header line into the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddHeaderMode {
    /// Append the line, keeping existing lines with the same name.
    Add,
    /// Add the line only if no header with that name exists yet.
    AddIfNew,
    /// Add the line, replacing an existing header with the same name.
    AddReplace,
}

/// Response fields the adapter queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoKind {
    StatusCode,
    StatusText,
    RawHeadersCrlf,
    /// Repeated field: one `Set-Cookie` value per index.
    SetCookie,
}

impl fmt::Display for InfoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InfoKind::StatusCode => "status code",
            InfoKind::StatusText => "status text",
            InfoKind::RawHeadersCrlf => "raw headers",
            InfoKind::SetCookie => "set-cookie",
        };
        f.write_str(name)
    }
}

/// Outcome of one `query_info` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryInfo {
    /// The value was written to the front of the buffer.
    Written(usize),
    /// The buffer was too small; the engine needs `required` bytes.
    InsufficientBuffer { required: usize },
}

/// Everything `connect` needs to reach the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams<'a> {
    pub host: &'a str,
    /// `None` lets the engine pick the scheme's default port.
    pub port: Option<u16>,
    pub username: &'a str,
    pub password: &'a str,
    pub service: Service,
    pub flags: RequestFlags,
}

/// The primitive operations of the native HTTP engine.
pub trait Engine {
    fn connect(
        &self,
        session: SessionHandle,
        params: &ConnectParams<'_>,
    ) -> Result<ConnectionHandle, EngineError>;

    fn open_request(
        &self,
        connection: ConnectionHandle,
        method: &str,
        target: &str,
        flags: RequestFlags,
    ) -> Result<RequestHandle, EngineError>;

    fn add_headers(
        &self,
        request: RequestHandle,
        line: &str,
        mode: AddHeaderMode,
    ) -> Result<(), EngineError>;

    fn send_request(
        &self,
        request: RequestHandle,
        extra_headers: &str,
        body: &[u8],
    ) -> Result<(), EngineError>;

    /// Copy the value of `kind` (at `index` for repeated fields) into `buf`.
    fn query_info(
        &self,
        request: RequestHandle,
        kind: InfoKind,
        index: u32,
        buf: &mut [u8],
    ) -> Result<QueryInfo, EngineError>;

    /// Number of body bytes that can be read without blocking. Zero means the
    /// body is exhausted.
    fn query_data_available(&self, request: RequestHandle) -> Result<usize, EngineError>;

    /// Read up to `buf.len()` body bytes, returning how many were written.
    fn read_chunk(&self, request: RequestHandle, buf: &mut [u8]) -> Result<usize, EngineError>;

    fn close_request(&self, request: RequestHandle) -> Result<(), EngineError>;

    fn close_connection(&self, connection: ConnectionHandle) -> Result<(), EngineError>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn connect(
        &self,
        session: SessionHandle,
        params: &ConnectParams<'_>,
    ) -> Result<ConnectionHandle, EngineError> {
        (**self).connect(session, params)
    }

    fn open_request(
        &self,
        connection: ConnectionHandle,
        method: &str,
        target: &str,
        flags: RequestFlags,
    ) -> Result<RequestHandle, EngineError> {
        (**self).open_request(connection, method, target, flags)
    }

    fn add_headers(
        &self,
        request: RequestHandle,
        line: &str,
        mode: AddHeaderMode,
    ) -> Result<(), EngineError> {
        (**self).add_headers(request, line, mode)
    }

    fn send_request(
        &self,
        request: RequestHandle,
        extra_headers: &str,
        body: &[u8],
    ) -> Result<(), EngineError> {
        (**self).send_request(request, extra_headers, body)
    }

    fn query_info(
        &self,
        request: RequestHandle,
        kind: InfoKind,
        index: u32,
        buf: &mut [u8],
    ) -> Result<QueryInfo, EngineError> {
        (**self).query_info(request, kind, index, buf)
    }

    fn query_data_available(&self, request: RequestHandle) -> Result<usize, EngineError> {
        (**self).query_data_available(request)
    }

    fn read_chunk(&self, request: RequestHandle, buf: &mut [u8]) -> Result<usize, EngineError> {
        (**self).read_chunk(request, buf)
    }

    fn close_request(&self, request: RequestHandle) -> Result<(), EngineError> {
        (**self).close_request(request)
    }

    fn close_connection(&self, connection: ConnectionHandle) -> Result<(), EngineError> {
        (**self).close_connection(connection)
    }
}
