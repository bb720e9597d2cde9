//! HTTP-level tests for the document backend and the served assets

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use specpad_gateway::{EditorSource, Gateway, GatewayConfig};
use std::io::ErrorKind;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

fn temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("specpad-gateway-")
        .tempdir()
        .unwrap()
}

fn gateway(dir: &TempDir) -> Gateway {
    let config = GatewayConfig::new()
        .with_document(dir.path().join("api-spec.yaml"))
        .with_open_browser(false)
        .with_flush_interval(Duration::from_millis(50));
    Gateway::new(config)
}

async fn send(router: &Router, method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_fetch_empty_document() {
    let dir = temp_dir();
    let router = gateway(&dir).build_router();

    let (status, body) = send(&router, Method::GET, "/backend", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_replace_then_fetch() {
    let dir = temp_dir();
    let gateway = gateway(&dir);
    let router = gateway.build_router();

    let (status, body) = send(&router, Method::PUT, "/backend", "openapi: 3.0.0").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert!(gateway.state().document.is_dirty());

    let (status, body) = send(&router, Method::GET, "/backend", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"openapi: 3.0.0");
}

#[tokio::test]
async fn test_replace_accepts_arbitrary_bytes() {
    let dir = temp_dir();
    let router = gateway(&dir).build_router();
    let payload: Vec<u8> = (0..=255u8).cycle().take(3 * 1024 * 1024).collect();

    let (status, _) = send(&router, Method::PUT, "/backend", payload.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, Method::GET, "/backend", Body::empty()).await;
    assert_eq!(body, payload);
}

#[tokio::test]
async fn test_failed_body_read_keeps_document() {
    let dir = temp_dir();
    let gateway = gateway(&dir);
    let router = gateway.build_router();
    gateway.state().document.replace("keep");

    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"openapi: ")),
        Err(std::io::Error::new(ErrorKind::ConnectionReset, "client went away")),
    ];
    let body = Body::from_stream(futures::stream::iter(chunks));

    let (status, _) = send(&router, Method::PUT, "/backend", body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(gateway.state().document.read(), Bytes::from_static(b"keep"));
    assert_eq!(gateway.state().document.revision(), 1);
}

#[tokio::test]
async fn test_other_methods_rejected() {
    let dir = temp_dir();
    let router = gateway(&dir).build_router();

    let (status, _) = send(&router, Method::DELETE, "/backend", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_concurrent_fetches_agree() {
    let dir = temp_dir();
    let gateway = gateway(&dir);
    let router = gateway.build_router();
    let contents = "paths:\n  /pets:\n    get: {}\n".repeat(500);
    gateway.state().document.replace(contents.clone());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move { send(&router, Method::GET, "/backend", Body::empty()).await })
        })
        .collect();

    for task in tasks {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, contents.as_bytes());
    }
}

#[tokio::test]
async fn test_write_reaches_disk_after_tick() {
    let dir = temp_dir();
    let gateway = gateway(&dir);
    let router = gateway.build_router();
    let persister = gateway.persister();
    persister.open().await.unwrap();
    let token = gateway.shutdown_token();
    let sync = tokio::spawn(persister.flush_loop(token.clone()));

    send(&router, Method::PUT, "/backend", "openapi: 3.0.0").await;

    let path = dir.path().join("api-spec.yaml");
    let mut flushed = false;
    for _ in 0..200 {
        if std::fs::read(&path).unwrap() == b"openapi: 3.0.0" {
            flushed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(flushed);

    token.cancel();
    sync.await.unwrap().unwrap();
    assert!(!gateway.state().document.is_dirty());
}

#[tokio::test]
async fn test_status_reports_document() {
    let dir = temp_dir();
    let gateway = gateway(&dir);
    let router = gateway.build_router();
    send(&router, Method::PUT, "/backend", "info: {}").await;

    let (status, body) = send(&router, Method::GET, "/status", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["document"]["bytes"], 8);
    assert_eq!(json["document"]["dirty"], true);
    assert_eq!(json["sync"]["phase"], "loading");

    let (status, body) = send(&router, Method::GET, "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_bundled_editor() {
    let dir = temp_dir();
    let router = gateway(&dir).build_router();

    let response = router
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );

    let response = router
        .clone()
        .oneshot(Request::get("/editor.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");

    let (status, body) = send(&router, Method::GET, "/missing.css", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"resource not found: /missing.css");
}

#[tokio::test]
async fn test_editor_directory() {
    let dir = temp_dir();
    let editor_dir = dir.path().join("editor");
    std::fs::create_dir(&editor_dir).unwrap();
    std::fs::write(editor_dir.join("index.html"), "<h1>custom</h1>").unwrap();

    let config = GatewayConfig::new()
        .with_document(dir.path().join("api-spec.yaml"))
        .with_editor(EditorSource::Directory(editor_dir));
    let router = Gateway::new(config).build_router();

    let (status, body) = send(&router, Method::GET, "/", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<h1>custom</h1>");
}

#[tokio::test]
async fn test_static_files_with_cors() {
    let dir = temp_dir();
    std::fs::write(dir.path().join("pets.yaml"), "type: object").unwrap();
    let router = gateway(&dir).build_router();

    let response = router
        .clone()
        .oneshot(
            Request::get("/static/pets.yaml")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"type: object");

    let preflight = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/static/pets.yaml")
                .header(header::ORIGIN, "http://example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let methods = preflight.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("PUT"));
    assert!(methods.contains("PATCH"));
}

#[tokio::test]
async fn test_backend_has_no_cors_headers() {
    let dir = temp_dir();
    let router = gateway(&dir).build_router();

    let response = router
        .oneshot(
            Request::get("/backend")
                .header(header::ORIGIN, "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
