//! Enumeration of response cookies.
//!
//! The engine exposes repeated `Set-Cookie` fields by index. Probing index 0,
//! 1, 2, ... until a probe fails yields every cookie; the failing probe marks
//! the end of the sequence and is not reported as an error.

use log::trace;

use crate::engine::{Engine, InfoKind, RequestHandle};
use crate::http::Cookie;
use crate::query::query_string;

/// Outcome of probing one index of a repeated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Found(T),
    End,
}

/// Probe `Set-Cookie` at `index`. Any query failure means there is no such
/// index.
pub fn probe_cookie<E: Engine + ?Sized>(
    engine: &E,
    request: RequestHandle,
    index: u32,
    buffer_size: usize,
) -> Probe<Cookie> {
    match query_string(engine, request, InfoKind::SetCookie, index, buffer_size) {
        Ok(raw) => Probe::Found(Cookie::parse_set_cookie(&raw)),
        Err(e) => {
            trace!("cookie enumeration ended at index {index}: {e}");
            Probe::End
        }
    }
}

/// Lazy, finite sequence of the cookies a response sets.
///
/// Each `next` issues one probe. After the first `End` the iterator stays
/// exhausted; enumerating again requires a new `ResponseCookies`.
pub struct ResponseCookies<'e, E: Engine + ?Sized> {
    engine: &'e E,
    request: RequestHandle,
    buffer_size: usize,
    index: u32,
    done: bool,
}

impl<'e, E: Engine + ?Sized> ResponseCookies<'e, E> {
    pub fn new(engine: &'e E, request: RequestHandle, buffer_size: usize) -> Self {
        Self {
            engine,
            request,
            buffer_size,
            index: 0,
            done: false,
        }
    }
}

impl<E: Engine + ?Sized> Iterator for ResponseCookies<'_, E> {
    type Item = Cookie;

    fn next(&mut self) -> Option<Cookie> {
        if self.done {
            return None;
        }
        match probe_cookie(self.engine, self.request, self.index, self.buffer_size) {
            Probe::Found(cookie) => {
                self.index += 1;
                Some(cookie)
            }
            Probe::End => {
                self.done = true;
                None
            }
        }
    }
}

impl<E: Engine + ?Sized> std::iter::FusedIterator for ResponseCookies<'_, E> {}
