//! End-to-end scenarios over real TCP against an ephemeral-port listener.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use valet_cache::ResponseCache;
use valet_config::ValetConfig;
use valet_http::Response;
use valet_router::{cached::cached, handler, Router};

use crate::auth::Passcode;
use crate::server::{Server, ServerHandle};
use crate::state::AppState;

struct TestServer {
    addr: SocketAddr,
    handle: ServerHandle,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.stop();
    }
}

async fn spawn_server(router: Router, passcode: Arc<Passcode>, cache: Arc<ResponseCache>) -> TestServer {
    let mut cfg = ValetConfig::default();
    cfg.http.listen = "127.0.0.1:0".to_string();
    cfg.http.client_read_timeout_secs = 2;
    cfg.http.client_write_timeout_secs = 2;

    let state = Arc::new(AppState {
        cfg,
        router,
        cache,
        passcode,
    });
    let (server, handle) = Server::bind(state).await.expect("bind");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(server.run());
    TestServer { addr, handle }
}

/// Writes a raw request, reads until the server closes the connection.
async fn send_raw(addr: SocketAddr, payload: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(payload).await.expect("write");
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.expect("read");
    String::from_utf8_lossy(&out).into_owned()
}

fn status_line(raw: &str) -> &str {
    raw.split("\r\n").next().unwrap_or("")
}

fn body_json(raw: &str) -> Value {
    let body = raw.split("\r\n\r\n").nth(1).expect("body");
    serde_json::from_str(body).expect("json body")
}

fn ok_router() -> Router {
    let mut router = Router::new();
    router.public_path("/");
    router.route(
        "GET",
        "/api/health",
        handler(|_req| async { Ok(Response::json(200, &json!({"status": "ok"}))) }),
    );
    router
}

#[tokio::test]
async fn header_credential_reaches_the_route() {
    let server = spawn_server(
        ok_router(),
        Arc::new(Passcode::new("secret")),
        Arc::new(ResponseCache::new()),
    )
    .await;

    let raw = send_raw(
        server.addr,
        b"GET /api/health HTTP/1.1\r\nX-Api-Key: secret\r\n\r\n",
    )
    .await;
    assert_eq!(status_line(&raw), "HTTP/1.1 200 OK");
    assert_eq!(body_json(&raw)["status"], "ok");
}

#[tokio::test]
async fn query_credential_reaches_the_route() {
    let server = spawn_server(
        ok_router(),
        Arc::new(Passcode::new("secret")),
        Arc::new(ResponseCache::new()),
    )
    .await;

    let raw = send_raw(
        server.addr,
        b"GET /api/health?passcode=secret HTTP/1.1\r\n\r\n",
    )
    .await;
    assert_eq!(status_line(&raw), "HTTP/1.1 200 OK");
}

#[tokio::test]
async fn missing_or_wrong_credentials_get_401() {
    let server = spawn_server(
        ok_router(),
        Arc::new(Passcode::new("secret")),
        Arc::new(ResponseCache::new()),
    )
    .await;

    let none = send_raw(server.addr, b"GET /api/health HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_line(&none), "HTTP/1.1 401 Unauthorized");
    assert!(body_json(&none).get("error").is_some());

    let wrong_header = send_raw(
        server.addr,
        b"GET /api/health HTTP/1.1\r\nX-Api-Key: nope\r\n\r\n",
    )
    .await;
    assert_eq!(status_line(&wrong_header), "HTTP/1.1 401 Unauthorized");

    let wrong_query = send_raw(
        server.addr,
        b"GET /api/health?passcode=nope HTTP/1.1\r\n\r\n",
    )
    .await;
    assert_eq!(status_line(&wrong_query), "HTTP/1.1 401 Unauthorized");
}

#[tokio::test]
async fn unknown_route_returns_404_with_error_field() {
    let server = spawn_server(
        ok_router(),
        Arc::new(Passcode::new("secret")),
        Arc::new(ResponseCache::new()),
    )
    .await;

    let raw = send_raw(
        server.addr,
        b"GET /api/does-not-exist HTTP/1.1\r\nX-Api-Key: secret\r\n\r\n",
    )
    .await;
    assert_eq!(status_line(&raw), "HTTP/1.1 404 Not Found");
    assert!(body_json(&raw).get("error").is_some());
}

#[tokio::test]
async fn garbage_input_closes_silently() {
    let server = spawn_server(
        ok_router(),
        Arc::new(Passcode::new("secret")),
        Arc::new(ResponseCache::new()),
    )
    .await;

    let raw = send_raw(server.addr, b"GARBAGE\r\n\r\n").await;
    assert!(raw.is_empty());
}

#[tokio::test]
async fn public_path_skips_auth_and_serves_html() {
    let server = spawn_server(
        ok_router(),
        Arc::new(Passcode::new("secret")),
        Arc::new(ResponseCache::new()),
    )
    .await;

    let raw = send_raw(server.addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_line(&raw), "HTTP/1.1 200 OK");
    assert!(raw.contains("Content-Type: text/html; charset=utf-8"));
}

#[tokio::test]
async fn cache_hit_avoids_invoking_the_handler_twice() {
    let cache = Arc::new(ResponseCache::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut router = Router::new();
    router.route(
        "GET",
        "/api/briefing",
        cached(
            cache.clone(),
            "/api/briefing",
            Duration::from_secs(60),
            handler(move |_req| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Response::json(200, &json!({"briefing": "two meetings"})))
                }
            }),
        ),
    );

    let server = spawn_server(router, Arc::new(Passcode::new("secret")), cache).await;
    let request = b"GET /api/briefing?day=today&passcode=secret HTTP/1.1\r\n\r\n";

    let first = send_raw(server.addr, request).await;
    let second = send_raw(server.addr, request).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(status_line(&second), "HTTP/1.1 200 OK");
    assert_eq!(body_json(&first), body_json(&second));
}

#[tokio::test]
async fn passcode_hot_reload_requires_no_restart() {
    let passcode = Arc::new(Passcode::new("old"));
    let mut router = ok_router();
    let cell = passcode.clone();
    router.route(
        "POST",
        "/api/config/passcode",
        handler(move |req| {
            let cell = cell.clone();
            async move {
                let body: Value = serde_json::from_slice(req.body.as_deref().unwrap_or(b""))?;
                let next = body["passcode"].as_str().unwrap_or_default();
                cell.rotate(next);
                Ok(Response::json(200, &json!({"status": "updated"})))
            }
        }),
    );

    let server = spawn_server(router, passcode, Arc::new(ResponseCache::new())).await;

    let body = b"{\"passcode\":\"new\"}";
    let rotate = format!(
        "POST /api/config/passcode HTTP/1.1\r\nX-Api-Key: old\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        String::from_utf8_lossy(body),
    );
    let raw = send_raw(server.addr, rotate.as_bytes()).await;
    assert_eq!(status_line(&raw), "HTTP/1.1 200 OK");

    let with_old = send_raw(
        server.addr,
        b"GET /api/health HTTP/1.1\r\nX-Api-Key: old\r\n\r\n",
    )
    .await;
    assert_eq!(status_line(&with_old), "HTTP/1.1 401 Unauthorized");

    let with_new = send_raw(
        server.addr,
        b"GET /api/health HTTP/1.1\r\nX-Api-Key: new\r\n\r\n",
    )
    .await;
    assert_eq!(status_line(&with_new), "HTTP/1.1 200 OK");
}

#[tokio::test]
async fn declared_body_is_completed_by_one_continuation_read() {
    let mut router = Router::new();
    router.route(
        "POST",
        "/api/query",
        handler(|req| async move {
            let len = req.body.as_ref().map(Vec::len).unwrap_or(0);
            Ok(Response::json(200, &json!({ "received": len })))
        }),
    );

    let server = spawn_server(
        router,
        Arc::new(Passcode::new("secret")),
        Arc::new(ResponseCache::new()),
    )
    .await;

    let body = vec![b'q'; 500];
    let head = format!(
        "POST /api/query?passcode=secret HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        body.len()
    );

    let mut stream = TcpStream::connect(server.addr).await.expect("connect");
    let mut first = head.into_bytes();
    first.extend_from_slice(&body[..100]);
    stream.write_all(&first).await.expect("write head");
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(&body[100..]).await.expect("write rest");

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.expect("read");
    let raw = String::from_utf8_lossy(&out).into_owned();
    assert_eq!(status_line(&raw), "HTTP/1.1 200 OK");
    assert_eq!(body_json(&raw)["received"], 500);
}

#[tokio::test]
async fn stop_closes_the_listener() {
    let server = spawn_server(
        ok_router(),
        Arc::new(Passcode::new("secret")),
        Arc::new(ResponseCache::new()),
    )
    .await;

    server.handle.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(TcpStream::connect(server.addr).await.is_err());
}
