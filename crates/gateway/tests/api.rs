//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use agent_gateway_controller::{AgentRegistry, Dispatcher, DispatcherConfig};
use agent_gateway_core::{traits::AgentHandler, types::Options, Error, Result};
use agent_gateway_http::{build_router, AppState, GatewayConfig};

#[derive(Default)]
struct QuizStub {
    calls: Mutex<Vec<(String, Options)>>,
}

#[async_trait]
impl AgentHandler for QuizStub {
    async fn execute(&self, topic: &str, options: &Options) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((topic.to_string(), options.clone()));
        Ok(json!({
            "questions": [{ "q": format!("What is {}?", topic) }],
            "pdf": "/srv/data/quizzes/quiz_123.pdf"
        }))
    }
}

struct BrokenAgent;

#[async_trait]
impl AgentHandler for BrokenAgent {
    async fn execute(&self, _topic: &str, _options: &Options) -> Result<Value> {
        Err(Error::model("API quota exhausted"))
    }
}

struct Harness {
    router: Router,
    quiz: Arc<QuizStub>,
}

fn harness_with(data_dir: &Path, tweak: impl FnOnce(&mut GatewayConfig)) -> Harness {
    let mut config = GatewayConfig {
        data_dir: data_dir.to_path_buf(),
        ..GatewayConfig::default()
    };
    tweak(&mut config);

    let quiz = Arc::new(QuizStub::default());
    let registry = Arc::new(AgentRegistry::builtin().unwrap());
    let dispatcher = Dispatcher::new(registry, DispatcherConfig::default())
        .with_handler("quiz_gen", quiz.clone())
        .unwrap()
        .with_handler("email_gen", Arc::new(BrokenAgent))
        .unwrap();

    Harness {
        router: build_router(AppState::new(dispatcher, &config)),
        quiz,
    }
}

fn harness(data_dir: &Path) -> Harness {
    harness_with(data_dir, |_| {})
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn execute(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/execute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_list_agents() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());

    let (status, body) = send_json(&h.router, get("/api/agents")).await;
    assert_eq!(status, StatusCode::OK);

    let agents = body["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 15);
    assert!(agents.iter().any(|a| a["id"] == "quiz_gen"));
    assert!(agents[0].get("options").is_none());
}

#[tokio::test]
async fn test_describe_options() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());

    let (status, body) = send_json(&h.router, get("/api/agents/quiz_gen/options")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agent"], "quiz_gen");

    let options = body["options"].as_array().unwrap();
    let difficulty = options.iter().find(|o| o["name"] == "difficulty").unwrap();
    assert_eq!(difficulty["kind"], "select");
    assert_eq!(difficulty["allowed_values"], json!(["easy", "medium", "hard"]));

    let (status, body) = send_json(&h.router, get("/api/agents/nope/options")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_agent");
}

#[tokio::test]
async fn test_execute_success_carries_result_and_download_link() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());

    let (status, body) = send_json(
        &h.router,
        execute(json!({
            "agent": "quiz_gen",
            "topic": "Python Basics",
            "options": { "difficulty": "hard", "questions": "5" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["agent"], "quiz_gen");
    assert_eq!(body["cached"], false);
    assert_eq!(body["result"]["questions"][0]["q"], "What is Python Basics?");
    assert_eq!(body["artifact"]["url"], "/files/quiz_123.pdf");
    assert!(body.get("error").is_none());

    let calls = h.quiz.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "Python Basics");
    assert_eq!(calls[0].1["questions"], json!(5));
    assert_eq!(calls[0].1["difficulty"], "hard");
}

#[tokio::test]
async fn test_repeated_request_is_served_from_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());
    let request = json!({ "agent": "quiz_gen", "topic": "Rust" });

    send_json(&h.router, execute(request.clone())).await;
    let (status, body) = send_json(&h.router, execute(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);
    assert_eq!(h.quiz.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_agent_failure_is_reported_in_band() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());

    let (status, body) = send_json(
        &h.router,
        execute(json!({ "agent": "email_gen", "topic": "Follow up" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "agent_execution_failed");
    assert!(body["detail"].as_str().unwrap().contains("API quota exhausted"));
    assert!(body.get("result").is_none());

    // Gateway keeps serving after a failed agent.
    let (status, body) = send_json(
        &h.router,
        execute(json!({ "agent": "quiz_gen", "topic": "Rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_rejections_map_to_statuses() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());

    let cases = [
        (json!({ "agent": "ghost", "topic": "x" }), StatusCode::NOT_FOUND, "unknown_agent"),
        (json!({ "agent": "quiz_gen" }), StatusCode::BAD_REQUEST, "invalid_input"),
        (json!({ "agent": "quiz_gen", "topic": "   " }), StatusCode::BAD_REQUEST, "invalid_input"),
        (
            json!({ "agent": "quiz_gen", "topic": "x", "options": { "questions": "many" } }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_option",
        ),
        (
            json!({ "agent": "quiz_gen", "topic": "x", "options": { "difficulty": "impossible" } }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_option",
        ),
    ];

    for (request, expected_status, expected_code) in cases {
        let (status, body) = send_json(&h.router, execute(request.clone())).await;
        assert_eq!(status, expected_status, "request {}", request);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], expected_code);
        assert!(body["detail"].is_string());
    }

    assert!(h.quiz.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_gets_json_error() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/execute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send_json(&h.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "malformed_request");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/execute")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send_json(&h.router, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "malformed_request");
}

#[tokio::test]
async fn test_files_served_by_final_segment() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("quizzes")).unwrap();
    std::fs::write(tmp.path().join("quizzes/quiz_123.pdf"), b"%PDF-1.4").unwrap();
    std::fs::write(tmp.path().join("notes.md"), b"# notes").unwrap();
    let h = harness(tmp.path());

    for uri in ["/files/quiz_123.pdf", "/files/srv/data/quizzes/quiz_123.pdf"] {
        let response = h.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"%PDF-1.4");
    }

    let (status, body) = send(&h.router, get("/files/notes.md")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"# notes");
}

#[tokio::test]
async fn test_files_outside_data_dir_are_unreachable() {
    let outer = tempfile::tempdir().unwrap();
    let data_dir = outer.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
    let h = harness(&data_dir);

    for uri in [
        "/files/..%2Fsecret.txt",
        "/files/../secret.txt",
        "/files/missing.pdf",
        "/files/..",
    ] {
        let (status, body) = send(&h.router, get(uri)).await;
        assert_ne!(status, StatusCode::OK, "{}", uri);
        assert_ne!(body, b"secret", "{}", uri);
    }

    let (status, body) = send_json(&h.router, get("/files/missing.pdf")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "file_not_found");
}

#[tokio::test]
async fn test_rate_limit_applies_to_api_routes_only() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness_with(tmp.path(), |config| config.rate_limit_per_minute = 2);

    for _ in 0..2 {
        let (status, _) = send(&h.router, get("/api/agents")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send_json(&h.router, get("/api/agents")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");
    assert_eq!(body["success"], false);

    let (status, _) = send(&h.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());

    let (status, body) = send_json(&h.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "agents": 15 }));

    let (status, _) = send(&h.router, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness_with(tmp.path(), |config| {
        config.allowed_origins = vec!["http://app.test".to_string()];
    });

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://app.test")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://app.test"
    );

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://evil.test")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_large_responses_are_gzipped() {
    let tmp = tempfile::tempdir().unwrap();
    let h = harness(tmp.path());

    let request = Request::builder()
        .uri("/api/agents")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

    let request = Request::builder()
        .uri("/health")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();
    assert!(response.headers().get(header::CONTENT_ENCODING).is_none());

    let (_, body) = send_json(&h.router, get("/api/agents")).await;
    assert_eq!(body["agents"].as_array().unwrap().len(), 15);
}
