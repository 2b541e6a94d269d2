//! [`Engine`] over a host-supplied table of `extern "C"` callbacks.

use std::ffi::CString;

use native_http_core::{
    AddHeaderMode, ConnectParams, ConnectionHandle, Engine, EngineError, InfoKind, QueryInfo,
    RequestFlags, RequestHandle, Service, SessionHandle,
};

use crate::types::*;

/// The host's engine table, driven through the core [`Engine`] trait.
pub struct HostEngine {
    table: FfiEngine,
}

impl HostEngine {
    pub fn new(table: FfiEngine) -> Self {
        HostEngine { table }
    }
}

fn check(code: u32, call: &str) -> Result<(), EngineError> {
    if code == 0 {
        Ok(())
    } else {
        Err(EngineError::new(code, format!("{call} failed")))
    }
}

fn callback<F>(f: Option<F>, call: &str) -> Result<F, EngineError> {
    f.ok_or_else(|| EngineError::new(NH_ERROR_NOT_SUPPORTED, format!("{call} is not provided")))
}

fn c_str(s: &str, what: &str) -> Result<CString, EngineError> {
    CString::new(s).map_err(|_| {
        EngineError::new(
            NH_ERROR_INVALID_PARAMETER,
            format!("{what} contains a NUL byte"),
        )
    })
}

fn flag_bits(flags: RequestFlags) -> u32 {
    let mut bits = 0;
    if flags.secure {
        bits |= NH_FLAG_SECURE;
    }
    if flags.keep_connection {
        bits |= NH_FLAG_KEEP_CONNECTION;
    }
    bits
}

fn mode_bits(mode: AddHeaderMode) -> u32 {
    match mode {
        AddHeaderMode::Add => NH_ADDREQ_FLAG_ADD,
        AddHeaderMode::AddIfNew => NH_ADDREQ_FLAG_ADD_IF_NEW,
        AddHeaderMode::AddReplace => NH_ADDREQ_FLAG_ADD | NH_ADDREQ_FLAG_REPLACE,
    }
}

fn info_code(kind: InfoKind) -> u32 {
    match kind {
        InfoKind::StatusCode => NH_QUERY_STATUS_CODE,
        InfoKind::StatusText => NH_QUERY_STATUS_TEXT,
        InfoKind::RawHeadersCrlf => NH_QUERY_RAW_HEADERS_CRLF,
        InfoKind::SetCookie => NH_QUERY_SET_COOKIE,
    }
}

fn service_code(service: Service) -> u32 {
    match service {
        Service::Http => NH_SERVICE_HTTP,
    }
}

impl Engine for HostEngine {
    fn connect(
        &self,
        session: SessionHandle,
        params: &ConnectParams<'_>,
    ) -> Result<ConnectionHandle, EngineError> {
        let f = callback(self.table.connect, "connect")?;
        let host = c_str(params.host, "host")?;
        let username = c_str(params.username, "username")?;
        let password = c_str(params.password, "password")?;
        let mut out = 0usize;
        let code = f(
            self.table.ctx,
            session.0,
            host.as_ptr(),
            params.port.unwrap_or(0),
            username.as_ptr(),
            password.as_ptr(),
            service_code(params.service),
            flag_bits(params.flags),
            &mut out,
        );
        check(code, "connect")?;
        Ok(ConnectionHandle(out))
    }

    fn open_request(
        &self,
        connection: ConnectionHandle,
        method: &str,
        target: &str,
        flags: RequestFlags,
    ) -> Result<RequestHandle, EngineError> {
        let f = callback(self.table.open_request, "open_request")?;
        let method = c_str(method, "method")?;
        let target = c_str(target, "target")?;
        let mut out = 0usize;
        let code = f(
            self.table.ctx,
            connection.0,
            method.as_ptr(),
            target.as_ptr(),
            flag_bits(flags),
            &mut out,
        );
        check(code, "open_request")?;
        Ok(RequestHandle(out))
    }

    fn add_headers(
        &self,
        request: RequestHandle,
        line: &str,
        mode: AddHeaderMode,
    ) -> Result<(), EngineError> {
        let f = callback(self.table.add_headers, "add_headers")?;
        let line = c_str(line, "header line")?;
        check(
            f(self.table.ctx, request.0, line.as_ptr(), mode_bits(mode)),
            "add_headers",
        )
    }

    fn send_request(
        &self,
        request: RequestHandle,
        extra_headers: &str,
        body: &[u8],
    ) -> Result<(), EngineError> {
        let f = callback(self.table.send_request, "send_request")?;
        let extra = c_str(extra_headers, "extra headers")?;
        let body_ptr = if body.is_empty() {
            std::ptr::null()
        } else {
            body.as_ptr()
        };
        check(
            f(self.table.ctx, request.0, extra.as_ptr(), body_ptr, body.len()),
            "send_request",
        )
    }

    fn query_info(
        &self,
        request: RequestHandle,
        kind: InfoKind,
        index: u32,
        buf: &mut [u8],
    ) -> Result<QueryInfo, EngineError> {
        let f = callback(self.table.query_info, "query_info")?;
        let mut len = buf.len();
        let code = f(
            self.table.ctx,
            request.0,
            info_code(kind),
            index,
            buf.as_mut_ptr(),
            &mut len,
        );
        match code {
            0 => Ok(QueryInfo::Written(len.min(buf.len()))),
            NH_ERROR_INSUFFICIENT_BUFFER => Ok(QueryInfo::InsufficientBuffer { required: len }),
            code => Err(EngineError::new(code, format!("query_info({kind}) failed"))),
        }
    }

    fn query_data_available(&self, request: RequestHandle) -> Result<usize, EngineError> {
        let f = callback(self.table.query_data_available, "query_data_available")?;
        let mut out = 0usize;
        check(
            f(self.table.ctx, request.0, &mut out),
            "query_data_available",
        )?;
        Ok(out)
    }

    fn read_chunk(&self, request: RequestHandle, buf: &mut [u8]) -> Result<usize, EngineError> {
        let f = callback(self.table.read_file, "read_file")?;
        let mut read = 0usize;
        check(
            f(self.table.ctx, request.0, buf.as_mut_ptr(), buf.len(), &mut read),
            "read_file",
        )?;
        Ok(read.min(buf.len()))
    }

    fn close_request(&self, request: RequestHandle) -> Result<(), EngineError> {
        let f = callback(self.table.close_handle, "close_handle")?;
        check(f(self.table.ctx, request.0), "close_handle")
    }

    fn close_connection(&self, connection: ConnectionHandle) -> Result<(), EngineError> {
        let f = callback(self.table.close_handle, "close_handle")?;
        check(f(self.table.ctx, connection.0), "close_handle")
    }
}
