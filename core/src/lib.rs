//! Adapter that drives a handle-based native HTTP engine through one
//! request/response cycle.
//!
//! # Overview
//! The native engine exposes a stateful, poll-and-query API: status, headers,
//! cookies and body are each fetched by separate calls, some with a
//! buffer-too-small retry, some by enumerating indices until a call fails.
//! This crate turns that into a single value-level operation,
//! [`Client::send`], which takes a [`Request`] and returns a fully read
//! [`Response`].
//!
//! # Design
//! - [`Engine`] is the seam to the native library. The crate never creates
//!   or destroys a session; it borrows one per [`Client`].
//! - Each stage is a free function over `&impl Engine` so it can be tested
//!   against [`scripted::ScriptedEngine`] in isolation: [`request`] opens
//!   handles, [`sender`] attaches and transmits, [`response`] assembles, with
//!   [`query`], [`headers`], [`cookies`] and [`body`] underneath.
//! - Errors are fail-fast; see [`HttpError`].

pub mod body;
pub mod client;
pub mod cookies;
pub mod engine;
pub mod error;
pub mod headers;
pub mod http;
pub mod query;
pub mod request;
pub mod response;
pub mod scripted;
pub mod sender;

pub use client::{Client, ClientOptions};
pub use engine::{
    AddHeaderMode, ConnectParams, ConnectionHandle, Engine, InfoKind, QueryInfo, RequestFlags,
    RequestHandle, Service, SessionHandle,
};
pub use error::{EngineError, HttpError, ReadFailure};
pub use http::{Body, Cookie, HeaderMap, Request, Response};
