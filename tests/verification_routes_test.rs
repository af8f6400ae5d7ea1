//! 验证代理路由集成测试

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing_subscriber::{filter::Targets, layer::SubscriberExt, Layer};
use wiremock::matchers::{body_string_contains, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zintel_gateway::business::domain::{BackendPayload, BackendProbe, BinaryPayload};
use zintel_gateway::business::services::{BackendProxy, VerificationBackend};
use zintel_gateway::infrastructure::{BackendConfig, UploadConfig};
use zintel_gateway::{create_routes, AppResult, AppState};

const BOUNDARY: &str = "zintel-test-boundary";

fn router_for(backend_uri: &str) -> Router {
    router_with_upload(backend_uri, UploadConfig::default())
}

fn router_with_upload(backend_uri: &str, upload: UploadConfig) -> Router {
    let backend = BackendProxy::new(&BackendConfig::new(backend_uri)).unwrap();
    create_routes(AppState::new(Arc::new(backend), upload), None)
}

fn dead_backend_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// 记录调用次数的后端桩
#[derive(Default)]
struct CountingBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl VerificationBackend for CountingBackend {
    async fn forward_text(&self, _text: &str) -> AppResult<BackendPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        unreachable!("invalid requests must not reach the backend")
    }

    async fn forward_file(&self, _file: BinaryPayload) -> AppResult<BackendPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        unreachable!("invalid requests must not reach the backend")
    }

    async fn fetch_news(&self) -> AppResult<BackendPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        unreachable!("news is not requested in these tests")
    }

    async fn probe(&self) -> BackendProbe {
        BackendProbe {
            origin: "stub".to_string(),
            reachable: false,
            status: None,
            response_time_ms: 0,
            error: Some("stub".to_string()),
        }
    }
}

/// 收集日志输出的内存缓冲区
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// 构造单字段 multipart 请求；`file_name` 为 None 时是普通文本字段
fn multipart_request(field: &str, file_name: Option<&str>, content: &[u8]) -> Request<Body> {
    let disposition = match file_name {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n{}\r\n", BOUNDARY, disposition).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/verify-ocr")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

async fn send_json(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_predict_relays_backend_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(query_param("text", "sample headline"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"label": "real", "score": 0.91})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, headers, body) = send(
        router_for(&mock_server.uri()),
        json_request("/api/predict", r#"{"text": "sample headline"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({"label": "real", "score": 0.91}));
}

#[tokio::test]
async fn test_predict_missing_text_makes_no_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, body) =
        send_json(router_for(&mock_server.uri()), json_request("/api/predict", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Text parameter is required"}));
}

#[tokio::test]
async fn test_invalid_requests_never_reach_backend() {
    let backend = Arc::new(CountingBackend::default());
    let router = create_routes(
        AppState::new(backend.clone(), UploadConfig::default()),
        None,
    );

    let requests = vec![
        json_request("/api/predict", "{}"),
        json_request("/api/predict", r#"{"text": ""}"#),
        json_request("/api/predict", "not json"),
        multipart_request("file", None, b"plain text, not a file"),
        multipart_request("image", Some("wrong-field.png"), b"bytes"),
        json_request("/api/verify-ocr", r#"{"file": "nope"}"#),
    ];

    for request in requests {
        let (status, _, _) = send(router.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backend_failure_status_becomes_503() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        router_for(&mock_server.uri()),
        json_request("/api/predict", r#"{"text": "headline"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["backend_status"], 500);
    assert_eq!(body["details"], "Backend returned 500");
    assert_eq!(
        body["error"],
        "Failed to analyze text. Make sure Python backend is running."
    );
}

#[tokio::test]
async fn test_unreachable_backend_reports_hint() {
    let router = router_for(&dead_backend_uri());

    let (status, body) = send_json(router.clone(), get_request("/api/news")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Make sure Python backend is running"));
    assert!(body["details"].as_str().is_some());

    let (status, _) = send_json(
        router,
        json_request("/api/predict", r#"{"text": "headline"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_backend_failure_is_logged_once() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .with_filter(Targets::new().with_target("zintel_gateway", tracing::Level::DEBUG)),
    );
    let _guard = tracing::subscriber::set_default(subscriber);

    let (status, _) = send_json(router_for(&dead_backend_uri()), get_request("/api/news")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let output = logs.contents();
    let error_lines = output.lines().filter(|line| line.contains(" ERROR ")).count();
    assert_eq!(error_lines, 1, "unexpected log output:\n{}", output);
}

#[tokio::test]
async fn test_verify_ocr_backend_failure_becomes_503() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify-ocr"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, headers, body) = send(
        router_for(&mock_server.uri()),
        multipart_request("file", Some("front-page.png"), b"PNG-CONTENT"),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["backend_status"], 500);
    assert_eq!(body["details"], "Backend returned 500");
    assert_eq!(
        body["error"],
        "Failed to verify image. Make sure Python backend is running."
    );
}

#[tokio::test]
async fn test_news_is_fetched_on_every_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(header_regex("cache-control", "no-store"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"title": "Monsoon arrives early", "source": "wire"}])),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let router = router_for(&mock_server.uri());
    for _ in 0..2 {
        let (status, headers, body) = send(router.clone(), get_request("/api/news")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body[0]["title"], "Monsoon arrives early");
    }
}

#[tokio::test]
async fn test_verify_ocr_forwards_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify-ocr"))
        .and(body_string_contains("filename=\"front-page.png\""))
        .and(body_string_contains("PNG-CONTENT"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"extracted_text": "headline", "label": "fake"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        router_for(&mock_server.uri()),
        multipart_request("file", Some("front-page.png"), b"PNG-CONTENT"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"extracted_text": "headline", "label": "fake"}));
}

#[tokio::test]
async fn test_verify_ocr_text_field_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (status, body) = send_json(
        router_for(&mock_server.uri()),
        multipart_request("file", None, b"just text"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Image file is required"}));
}

#[tokio::test]
async fn test_verify_ocr_rejects_oversized_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let router = router_with_upload(&mock_server.uri(), UploadConfig { max_file_bytes: 16 });
    let (status, body) = send_json(
        router,
        multipart_request("file", Some("big.png"), &[7u8; 64]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("File size exceeds"));
}

#[tokio::test]
async fn test_backend_health() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "running"})))
        .mount(&mock_server)
        .await;

    let (status, body) =
        send_json(router_for(&mock_server.uri()), get_request("/api/health/backend")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"]["reachable"], true);

    let (status, body) =
        send_json(router_for(&dead_backend_uri()), get_request("/api/health/backend")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["backend"]["reachable"], false);
}

#[tokio::test]
async fn test_liveness() {
    let (status, body) =
        send_json(router_for(&dead_backend_uri()), get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "zintel-gateway");
}
