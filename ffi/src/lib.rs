//! C-ABI wrapper around `native-http-core`.
//!
//! # Overview
//! A C host hands over its native HTTP engine as an [`FfiEngine`] table of
//! callbacks plus a session handle, then sends requests with `nh_send` and
//! gets back a fully read response. The request/response cycle itself runs
//! in Rust.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A single `FfiResult` envelope carries either the response or an error
//!   code, message and the engine's native error code.
//! - The C caller owns all returned pointers and must call the matching
//!   `nh_*_free` function to release them. Request input is only borrowed.

pub mod engine;
pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use native_http_core::{Client, ClientOptions, Cookie, Request, SessionHandle};

use engine::HostEngine;
use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Default client options: sentinel cookie on, keep-connection on, and a
/// zero initial query buffer.
#[unsafe(no_mangle)]
pub extern "C" fn nh_client_options_default() -> FfiClientOptions {
    FfiClientOptions::from(&ClientOptions::default())
}

/// Create a client that drives `engine` within the host's `session`.
///
/// The session is borrowed; the library never closes it. The caller must
/// free the returned pointer with `nh_client_free`. Returns null on panic.
#[unsafe(no_mangle)]
pub extern "C" fn nh_client_new(engine: FfiEngine, session: usize) -> *mut FfiClient {
    nh_client_new_with_options(engine, session, nh_client_options_default())
}

/// Like `nh_client_new` with explicit options.
#[unsafe(no_mangle)]
pub extern "C" fn nh_client_new_with_options(
    engine: FfiEngine,
    session: usize,
    options: FfiClientOptions,
) -> *mut FfiClient {
    catch_unwind(|| {
        let client = Client::with_options(
            HostEngine::new(engine),
            SessionHandle(session),
            options.into(),
        );
        Box::into_raw(Box::new(FfiClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `nh_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn nh_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

/// Borrow a required C string as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn required_str<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut FfiResult> {
    if ptr.is_null() {
        return Err(FfiResult::null_arg(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| FfiResult::invalid_arg(name))
}

/// # Safety
/// `ptr` must be null or point to `len` valid `FfiKeyValue`s.
unsafe fn key_values(
    ptr: *const FfiKeyValue,
    len: u32,
    name: &str,
) -> Result<Vec<(String, String)>, *mut FfiResult> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(FfiResult::null_arg(name));
    }
    let items = unsafe { std::slice::from_raw_parts(ptr, len as usize) };
    items
        .iter()
        .map(|kv| {
            let key = unsafe { required_str(kv.key, name) }?;
            let value = unsafe { required_str(kv.value, name) }?;
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Copy a caller-described request into an owned core `Request`.
///
/// # Safety
/// Every pointer in `req` must satisfy the contract documented on
/// `FfiRequest`.
unsafe fn request_from_ffi(req: &FfiRequest) -> Result<Request, *mut FfiResult> {
    let method = unsafe { required_str(req.method, "method") }?;
    let url = unsafe { required_str(req.url, "url") }?;
    let headers = unsafe { key_values(req.headers, req.headers_len, "headers") }?;
    let cookies = unsafe { key_values(req.cookies, req.cookies_len, "cookies") }?
        .into_iter()
        .map(|(name, value)| Cookie::new(name, value))
        .collect();
    let body = if req.body_len == 0 {
        Vec::new()
    } else if req.body.is_null() {
        return Err(FfiResult::null_arg("body"));
    } else {
        unsafe { std::slice::from_raw_parts(req.body, req.body_len) }.to_vec()
    };

    Ok(Request {
        method: method.to_string(),
        url: url.to_string(),
        headers,
        cookies,
        body,
    })
}

/// Run one request/response cycle through the host engine.
///
/// Always returns a result (never null), which the caller must free with
/// `nh_free_result`. Handles opened for the cycle are closed before this
/// returns, on success and on failure.
#[unsafe(no_mangle)]
pub extern "C" fn nh_send(client: *const FfiClient, request: *const FfiRequest) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if request.is_null() {
            return FfiResult::null_arg("request");
        }
        let client = unsafe { &*client };
        let request = match unsafe { request_from_ffi(&*request) } {
            Ok(r) => r,
            Err(result) => return result,
        };
        match client.inner.send(&request) {
            Ok(resp) => FfiResult::ok(resp),
            Err(e) => {
                log::debug!("{} {} failed: {e}", request.method, request.url);
                FfiResult::from_error(e)
            }
        }
    })
    .unwrap_or_else(|_| {
        log::error!("panic while sending request");
        FfiResult::panic("panic while sending request")
    })
}

// ---------------------------------------------------------------------------
// Memory management
// ---------------------------------------------------------------------------

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

fn free_response(resp: Box<FfiResponse>) {
    free_c_string(resp.status);
    free_c_string(resp.proto);
    if let Some(headers) = unsafe { from_raw_slice(resp.headers, resp.headers_len as usize) } {
        for h in headers.iter() {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    }
    if let Some(cookies) = unsafe { from_raw_slice(resp.cookies, resp.cookies_len as usize) } {
        for c in cookies.iter() {
            free_c_string(c.name);
            free_c_string(c.value);
        }
    }
    drop(unsafe { from_raw_slice(resp.body, resp.body_len) });
}

/// Free an `FfiResult` returned by `nh_send`, including its response.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn nh_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.response.is_null() {
            free_response(unsafe { Box::from_raw(result.response) });
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
