use axum::http::{self, header, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, pattern, Echo, Session, MAX_BYTES};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

// --- echo ---

#[tokio::test]
async fn echo_reports_method_query_and_body() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/echo?a=1&b=2")
                .header(http::header::CONTENT_TYPE, "text/plain")
                .body("payload".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.query.as_deref(), Some("a=1&b=2"));
    assert_eq!(echo.body, "payload");
    assert!(echo
        .headers
        .contains(&("content-type".to_string(), "text/plain".to_string())));
}

#[tokio::test]
async fn echo_collects_cookies_from_every_header() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header(header::COOKIE, "ignore=ignore")
                .header(header::COOKIE, "A=1")
                .header(header::COOKIE, "B=2")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    let names: Vec<&str> = echo.cookies.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["ignore", "A", "B"]);
}

// --- cookies ---

#[tokio::test]
async fn cookies_route_sets_three_cookies() {
    let resp = app().oneshot(get("/cookies")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cookies = set_cookies(&resp);
    assert_eq!(cookies.len(), 3);
    assert_eq!(cookies[0], "theme=dark");
    assert!(cookies[1].starts_with("lang=en;"));
    assert!(cookies[2].starts_with("visit="));
}

// --- sessions ---

#[tokio::test]
async fn whoami_without_cookie_is_401() {
    let resp = app().oneshot(get("/whoami")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_with_unknown_session_is_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header(header::COOKIE, "session=00000000-0000-0000-0000-000000000000")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_then_whoami() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("POST")
                .uri("/login")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let cookie = set_cookies(&resp).remove(0);
    let session: Session = body_json(resp).await;
    assert_eq!(cookie, format!("session={}; Path=/", session.id));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/whoami")
                .header(header::COOKIE, format!("session={}", session.id))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Session = body_json(resp).await;
    assert_eq!(me.id, session.id);
}

// --- status ---

#[tokio::test]
async fn status_route_returns_requested_code() {
    let resp = app().oneshot(get("/status/418")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_route_rejects_out_of_range() {
    let resp = app().oneshot(get("/status/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- bytes ---

#[tokio::test]
async fn bytes_route_returns_pattern() {
    let resp = app().oneshot(get("/bytes/100")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, pattern(100));
}

#[tokio::test]
async fn bytes_route_caps_size() {
    let resp = app()
        .oneshot(get(&format!("/bytes/{}", MAX_BYTES + 1)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
