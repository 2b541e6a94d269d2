use std::{collections::HashSet, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::AppendHeaders,
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Largest body `/bytes/{n}` will produce.
pub const MAX_BYTES: usize = 1 << 20;

/// What the server saw for a request to `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Header lines in the order they arrived, names lowercased.
    pub headers: Vec<(String, String)>,
    /// Cookie pairs from every `Cookie` header, in order.
    pub cookies: Vec<(String, String)>,
    pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
}

pub type Sessions = Arc<RwLock<HashSet<Uuid>>>;

pub fn app() -> Router {
    let sessions: Sessions = Arc::new(RwLock::new(HashSet::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/cookies", get(set_cookies))
        .route("/login", post(login))
        .route("/whoami", get(whoami))
        .route("/status/{code}", get(status))
        .route("/bytes/{n}", get(bytes))
        .with_state(sessions)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("mock server listening on {addr}");
    }
    axum::serve(listener, app()).await
}

/// Parse `name=value` pairs out of every `Cookie` header.
pub fn request_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect(),
        cookies: request_cookies(&headers),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn set_cookies() -> (AppendHeaders<[(header::HeaderName, String); 3]>, &'static str) {
    (
        AppendHeaders([
            (header::SET_COOKIE, "theme=dark".to_string()),
            (header::SET_COOKIE, "lang=en; Path=/; Max-Age=60".to_string()),
            (header::SET_COOKIE, format!("visit={}; HttpOnly", Uuid::new_v4())),
        ]),
        "ok",
    )
}

async fn login(
    State(sessions): State<Sessions>,
) -> (StatusCode, AppendHeaders<[(header::HeaderName, String); 1]>, Json<Session>) {
    let id = Uuid::new_v4();
    sessions.write().await.insert(id);
    (
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, format!("session={id}; Path=/"))]),
        Json(Session { id }),
    )
}

async fn whoami(
    State(sessions): State<Sessions>,
    headers: HeaderMap,
) -> Result<Json<Session>, StatusCode> {
    let id = request_cookies(&headers)
        .into_iter()
        .rev()
        .find(|(name, _)| name == "session")
        .and_then(|(_, value)| Uuid::parse_str(&value).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if sessions.read().await.contains(&id) {
        Ok(Json(Session { id }))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn bytes(Path(n): Path<usize>) -> Result<Vec<u8>, StatusCode> {
    if n > MAX_BYTES {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }
    Ok(pattern(n))
}

/// Deterministic body for `/bytes/{n}`: `abc...xyzabc...`.
pub fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| b'a' + (i % 26) as u8).collect()
}
