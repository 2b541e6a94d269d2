//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Input types (`FfiRequest`, `FfiKeyValue`) borrow caller memory through
//! `*const` pointers and are never freed here. Output types (`FfiResult`,
//! `FfiResponse` and everything they point to) are allocated by this library
//! and released with `nh_free_result`. Arrays are handed out as boxed slices
//! so length and capacity always agree when they come back to be freed.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use native_http_core::{Client, ClientOptions, HttpError, ReadFailure, Response};

use crate::engine::HostEngine;

// ---------------------------------------------------------------------------
// Native constants
// ---------------------------------------------------------------------------

/// Returned by `query_info` when the buffer is too small; the callback must
/// store the required size in `*len`.
pub const NH_ERROR_INSUFFICIENT_BUFFER: u32 = 122;
/// Returned by the adapter when a table entry is null.
pub const NH_ERROR_NOT_SUPPORTED: u32 = 50;
/// Returned by the adapter when a string cannot be passed to C.
pub const NH_ERROR_INVALID_PARAMETER: u32 = 87;

pub const NH_SERVICE_HTTP: u32 = 3;

pub const NH_FLAG_KEEP_CONNECTION: u32 = 0x0040_0000;
pub const NH_FLAG_SECURE: u32 = 0x0080_0000;

pub const NH_ADDREQ_FLAG_ADD_IF_NEW: u32 = 0x1000_0000;
pub const NH_ADDREQ_FLAG_ADD: u32 = 0x2000_0000;
pub const NH_ADDREQ_FLAG_REPLACE: u32 = 0x8000_0000;

pub const NH_QUERY_STATUS_CODE: u32 = 19;
pub const NH_QUERY_STATUS_TEXT: u32 = 20;
pub const NH_QUERY_RAW_HEADERS_CRLF: u32 = 22;
pub const NH_QUERY_SET_COOKIE: u32 = 43;

// ---------------------------------------------------------------------------
// Engine table
// ---------------------------------------------------------------------------

pub type ConnectFn = extern "C" fn(
    ctx: *mut c_void,
    session: usize,
    host: *const c_char,
    port: u16,
    username: *const c_char,
    password: *const c_char,
    service: u32,
    flags: u32,
    out_connection: *mut usize,
) -> u32;

pub type OpenRequestFn = extern "C" fn(
    ctx: *mut c_void,
    connection: usize,
    method: *const c_char,
    target: *const c_char,
    flags: u32,
    out_request: *mut usize,
) -> u32;

pub type AddHeadersFn =
    extern "C" fn(ctx: *mut c_void, request: usize, line: *const c_char, modifiers: u32) -> u32;

pub type SendRequestFn = extern "C" fn(
    ctx: *mut c_void,
    request: usize,
    headers: *const c_char,
    body: *const u8,
    body_len: usize,
) -> u32;

/// `*len` holds the buffer size on entry and the written (or required) size
/// on return.
pub type QueryInfoFn = extern "C" fn(
    ctx: *mut c_void,
    request: usize,
    info: u32,
    index: u32,
    buf: *mut u8,
    len: *mut usize,
) -> u32;

pub type QueryDataAvailableFn =
    extern "C" fn(ctx: *mut c_void, request: usize, out_available: *mut usize) -> u32;

pub type ReadFileFn = extern "C" fn(
    ctx: *mut c_void,
    request: usize,
    buf: *mut u8,
    len: usize,
    out_read: *mut usize,
) -> u32;

pub type CloseHandleFn = extern "C" fn(ctx: *mut c_void, handle: usize) -> u32;

/// The native engine supplied by the host. Every callback returns 0 on
/// success or a native error code. `ctx` is passed back untouched.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FfiEngine {
    pub ctx: *mut c_void,
    pub connect: Option<ConnectFn>,
    pub open_request: Option<OpenRequestFn>,
    pub add_headers: Option<AddHeadersFn>,
    pub send_request: Option<SendRequestFn>,
    pub query_info: Option<QueryInfoFn>,
    pub query_data_available: Option<QueryDataAvailableFn>,
    pub read_file: Option<ReadFileFn>,
    pub close_handle: Option<CloseHandleFn>,
}

/// Client options as a C struct. Start from `nh_client_options_default`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiClientOptions {
    pub sentinel_cookie: bool,
    pub keep_connection: bool,
    pub query_buffer_size: usize,
}

impl From<FfiClientOptions> for ClientOptions {
    fn from(o: FfiClientOptions) -> Self {
        ClientOptions {
            sentinel_cookie: o.sentinel_cookie,
            keep_connection: o.keep_connection,
            query_buffer_size: o.query_buffer_size,
            ..ClientOptions::default()
        }
    }
}

impl From<&ClientOptions> for FfiClientOptions {
    fn from(o: &ClientOptions) -> Self {
        FfiClientOptions {
            sentinel_cookie: o.sentinel_cookie,
            keep_connection: o.keep_connection,
            query_buffer_size: o.query_buffer_size,
        }
    }
}

/// Opaque handle to a client. C callers receive a pointer to this and pass
/// it back into `nh_send`.
pub struct FfiClient {
    pub(crate) inner: Client<HostEngine>,
}

// ---------------------------------------------------------------------------
// Request input (caller-owned)
// ---------------------------------------------------------------------------

/// A borrowed key/value pair of C strings, used for headers and cookies.
#[repr(C)]
pub struct FfiKeyValue {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// A request described by the C caller. Nothing here is freed by the library.
#[repr(C)]
pub struct FfiRequest {
    pub method: *const c_char,
    pub url: *const c_char,
    pub headers: *const FfiKeyValue,
    pub headers_len: u32,
    pub cookies: *const FfiKeyValue,
    pub cookies_len: u32,
    pub body: *const u8,
    pub body_len: usize,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidUrl = 1,
    Connection = 2,
    RequestOpen = 3,
    Header = 4,
    Send = 5,
    Protocol = 6,
    QueryInfo = 7,
    Read = 8,
    Panic = 9,
    NullArg = 10,
    InvalidArg = 11,
}

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

#[repr(C)]
pub struct FfiCookie {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// A response exposed to C. Headers are flattened to one entry per value,
/// grouped by key in first-seen order.
#[repr(C)]
pub struct FfiResponse {
    pub status_code: u16,
    pub status: *mut c_char,
    pub proto: *mut c_char,
    pub proto_major: u32,
    pub proto_minor: u32,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub cookies: *mut FfiCookie,
    pub cookies_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
    pub content_length: u64,
}

/// Result envelope for `nh_send`.
///
/// On success `error_code` is `Ok`, `error_message` is null and `response`
/// points to the response. On failure `error_message` is a C string,
/// `native_error` holds the engine's code when one caused the failure, and
/// `response` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub native_error: u32,
    pub response: *mut FfiResponse,
}

/// Convert to a heap C string, dropping interior NULs.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Leak a vector as a boxed slice, returning null for an empty one.
pub(crate) fn into_raw_slice<T>(items: Vec<T>) -> *mut T {
    if items.is_empty() {
        return std::ptr::null_mut();
    }
    Box::into_raw(items.into_boxed_slice()) as *mut T
}

/// Reclaim a slice produced by `into_raw_slice`.
///
/// # Safety
/// `ptr` must come from `into_raw_slice` with exactly `len` items, or be null.
pub(crate) unsafe fn from_raw_slice<T>(ptr: *mut T, len: usize) -> Option<Box<[T]>> {
    if ptr.is_null() || len == 0 {
        return None;
    }
    Some(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) })
}

impl FfiResponse {
    pub(crate) fn from_core(resp: Response) -> Self {
        let headers: Vec<FfiHeader> = resp
            .headers
            .iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let cookies: Vec<FfiCookie> = resp
            .cookies
            .into_iter()
            .map(|c| FfiCookie {
                name: c_string(c.name),
                value: c_string(c.value),
            })
            .collect();
        let body = resp.body.into_bytes().to_vec();

        FfiResponse {
            status_code: resp.status_code,
            status: c_string(resp.status),
            proto: c_string(resp.proto),
            proto_major: resp.proto_major,
            proto_minor: resp.proto_minor,
            headers_len: headers.len() as u32,
            headers: into_raw_slice(headers),
            cookies_len: cookies.len() as u32,
            cookies: into_raw_slice(cookies),
            body_len: body.len(),
            body: into_raw_slice(body),
            content_length: resp.content_length,
        }
    }
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        native_error: u32,
        response: *mut FfiResponse,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            native_error,
            response,
        }))
    }

    /// Build a success result carrying a response.
    pub(crate) fn ok(resp: Response) -> *mut Self {
        let response = Box::into_raw(Box::new(FfiResponse::from_core(resp)));
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, response)
    }

    /// Build an error result from an `HttpError`.
    pub(crate) fn from_error(err: HttpError) -> *mut Self {
        let (error_code, native_error) = match &err {
            HttpError::InvalidUrl { .. } => (FfiErrorCode::InvalidUrl, 0),
            HttpError::Connection { source, .. } => (FfiErrorCode::Connection, source.code),
            HttpError::RequestOpen { source, .. } => (FfiErrorCode::RequestOpen, source.code),
            HttpError::Header { source, .. } => (FfiErrorCode::Header, source.code),
            HttpError::Send(source) => (FfiErrorCode::Send, source.code),
            HttpError::Protocol { source, .. } => (
                FfiErrorCode::Protocol,
                source.as_ref().map_or(0, |e| e.code),
            ),
            HttpError::QueryInfo { source, .. } => (FfiErrorCode::QueryInfo, source.code),
            HttpError::Read { reason, .. } => {
                let code = match reason {
                    ReadFailure::QueryAvailable(e)
                    | ReadFailure::Chunk(e) => e.code,
                    ReadFailure::ShortRead { .. } => 0,
                };
                (FfiErrorCode::Read, code)
            }
        };
        Self::boxed(
            error_code,
            c_string(err.to_string()),
            native_error,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            c_string(format!("null argument: {name}")),
            0,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for an argument that is not valid UTF-8.
    pub(crate) fn invalid_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::InvalidArg,
            c_string(format!("invalid argument: {name} is not UTF-8")),
            0,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Panic,
            c_string(msg),
            0,
            std::ptr::null_mut(),
        )
    }
}
