//! Error types for the native HTTP adapter.
//!
//! # Design
//! `EngineError` is what the native engine reports: a numeric last-error code
//! plus whatever message the binding attaches. `HttpError` is what `send`
//! returns. Every variant names the operation that failed and keeps the
//! engine's error as its `source`, so a caller can tell a refused connection
//! from a failed header add without string matching.
//!
//! Running out of cookies or header lines is never an error; those conditions
//! stay inside the components that enumerate them.

use std::fmt;

use crate::engine::InfoKind;

/// Native error code for "the buffer passed to a query was too small".
pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;

/// An error reported by the native engine for a single primitive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub code: u32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The error recorded when a retried query still reports a larger size.
    pub fn insufficient_buffer(required: usize) -> Self {
        Self::new(
            ERROR_INSUFFICIENT_BUFFER,
            format!("buffer still too small, engine requires {required} bytes"),
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "native error {}", self.code)
        } else {
            write!(f, "native error {}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for EngineError {}

/// Why the chunk reader stopped before the engine reported zero bytes left.
#[derive(Debug, thiserror::Error)]
pub enum ReadFailure {
    /// Asking how many bytes are available failed.
    #[error("failed to query data available: {0}")]
    QueryAvailable(#[source] EngineError),

    /// Reading a chunk failed.
    #[error("failed to read data: {0}")]
    Chunk(#[source] EngineError),

    /// The engine returned fewer bytes than it said were available.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },
}

/// Errors returned by `Client::send` and the individual cycle stages.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request URL could not be parsed or is not `http`/`https`.
    #[error("failed to parse url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The engine refused to create a connection handle.
    #[error("failed to create connection to {host}: {source}")]
    Connection {
        host: String,
        #[source]
        source: EngineError,
    },

    /// The engine refused to open a request handle.
    #[error("failed to open request {method} {target}: {source}")]
    RequestOpen {
        method: String,
        target: String,
        #[source]
        source: EngineError,
    },

    /// Attaching a cookie or header line failed. Lines attached before the
    /// failure stay attached.
    #[error("failed to add {name} header: {source}")]
    Header {
        name: String,
        #[source]
        source: EngineError,
    },

    /// Transmitting the request failed.
    #[error("failed to send request: {0}")]
    Send(#[source] EngineError),

    /// The status code was missing or not a decimal number, or the protocol
    /// line carried a malformed version. `source` is set when the engine
    /// refused the status code query.
    #[error("protocol error: {reason}")]
    Protocol {
        reason: String,
        #[source]
        source: Option<EngineError>,
    },

    /// A buffered info query failed after its single resize retry.
    #[error("failed to query {kind} (index {index}): {source}")]
    QueryInfo {
        kind: InfoKind,
        index: u32,
        #[source]
        source: EngineError,
    },

    /// The response body could not be drained.
    #[error("failed to read response body after {received} bytes: {reason}")]
    Read {
        received: u64,
        #[source]
        reason: ReadFailure,
    },
}
