//! Client against a live gateway listener with stub agents.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use agent_gateway_client::{ExecutionSession, GatewayClient, ProgressConfig, ProgressPhase};
use agent_gateway_controller::{AgentRegistry, Dispatcher, DispatcherConfig};
use agent_gateway_core::{traits::AgentHandler, types::Options, Error, Result};
use agent_gateway_http::{serve_with_listener, AppState, GatewayConfig};

/// Writes a fake PDF and reports it the way the quiz agent does.
struct QuizStub {
    data_dir: PathBuf,
}

#[async_trait]
impl AgentHandler for QuizStub {
    async fn execute(&self, topic: &str, options: &Options) -> Result<Value> {
        let dir = self.data_dir.join("quizzes");
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("python_quiz.pdf");
        tokio::fs::write(&path, format!("quiz on {}", topic)).await?;

        Ok(json!({
            "quiz": { "title": topic, "difficulty": options["difficulty"] },
            "pdf": path.to_string_lossy(),
        }))
    }
}

struct FailingStub;

#[async_trait]
impl AgentHandler for FailingStub {
    async fn execute(&self, _topic: &str, _options: &Options) -> Result<Value> {
        Err(Error::model("API quota exhausted"))
    }
}

struct SlowStub;

#[async_trait]
impl AgentHandler for SlowStub {
    async fn execute(&self, topic: &str, _options: &Options) -> Result<Value> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(json!({ "video": topic }))
    }
}

struct Gateway {
    client: Arc<GatewayClient>,
    _data_dir: tempfile::TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl Gateway {
    async fn start() -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            data_dir: data_dir.path().to_path_buf(),
            ..GatewayConfig::default()
        };

        let registry = Arc::new(AgentRegistry::builtin().unwrap());
        let dispatcher = Dispatcher::new(registry, DispatcherConfig::default())
            .with_handler(
                "quiz_gen",
                Arc::new(QuizStub {
                    data_dir: config.data_dir.clone(),
                }),
            )
            .unwrap()
            .with_handler("email_gen", Arc::new(FailingStub))
            .unwrap()
            .with_handler("video_gen", Arc::new(SlowStub))
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_with_listener(
            listener,
            AppState::new(dispatcher, &config),
            async move {
                rx.await.ok();
            },
        ));

        Self {
            client: Arc::new(GatewayClient::new(format!("http://{}", address)).unwrap()),
            _data_dir: data_dir,
            shutdown: Some(tx),
            server,
        }
    }

    fn session(&self, agent: &str) -> ExecutionSession {
        ExecutionSession::with_progress(
            self.client.clone(),
            agent,
            ProgressConfig {
                tick: Duration::from_millis(20),
                ..ProgressConfig::default()
            },
        )
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        self.server.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_quiz_success_with_download() {
    let gateway = Gateway::start().await;

    let mut session = gateway.session("quiz_gen");
    session.set_option("difficulty", "medium");
    let envelope = session.submit("Python Basics").await.unwrap();

    assert!(envelope.success, "{:?}", envelope.detail);
    let result = envelope.result.as_ref().unwrap();
    assert_eq!(result["quiz"]["difficulty"], "medium");
    assert_eq!(session.snapshot().phase, ProgressPhase::Completing);

    let artifact = envelope.artifact.clone().unwrap();
    assert_eq!(artifact.file_name, "python_quiz.pdf");
    assert!(session
        .download_url(&envelope)
        .unwrap()
        .ends_with("/files/python_quiz.pdf"));

    let bytes = gateway.client.download(&artifact).await.unwrap();
    assert_eq!(bytes, b"quiz on Python Basics");

    drop(session);
    gateway.stop().await;
}

#[tokio::test]
async fn test_unknown_agent_is_rejected() {
    let gateway = Gateway::start().await;

    let mut session = gateway.session("ghost_agent");
    let envelope = session.submit("anything").await.unwrap();

    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("unknown_agent"));
    assert!(envelope.detail.unwrap().contains("ghost_agent"));

    drop(session);
    gateway.stop().await;
}

#[tokio::test]
async fn test_blank_topic_is_rejected() {
    let gateway = Gateway::start().await;

    let mut session = gateway.session("roadmap_gen");
    let envelope = session.submit("").await.unwrap();

    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("invalid_input"));
    assert_eq!(session.snapshot().percent, 100);

    drop(session);
    gateway.stop().await;
}

#[tokio::test]
async fn test_failed_agent_then_recovery() {
    let gateway = Gateway::start().await;

    let mut failing = gateway.session("email_gen");
    let envelope = failing.submit("Follow up on invoice").await.unwrap();
    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("agent_execution_failed"));
    assert!(envelope.detail.unwrap().contains("API quota exhausted"));

    let mut quiz = gateway.session("quiz_gen");
    let envelope = quiz.submit("Rust").await.unwrap();
    assert!(envelope.success);

    drop((failing, quiz));
    gateway.stop().await;
}

#[tokio::test]
async fn test_slow_agent_does_not_block_others() {
    let gateway = Gateway::start().await;

    let mut slow = gateway.session("video_gen");
    let mut fast = gateway.session("quiz_gen");

    let started = tokio::time::Instant::now();
    let (slow_result, fast_result) = tokio::join!(
        slow.submit("Ownership explained"),
        async {
            let envelope = fast.submit("Borrowing").await;
            (envelope, started.elapsed())
        }
    );

    assert!(slow_result.unwrap().success);
    let (fast_envelope, fast_elapsed) = fast_result;
    assert!(fast_envelope.unwrap().success);
    assert!(fast_elapsed < Duration::from_millis(500));

    drop((slow, fast));
    gateway.stop().await;
}

#[tokio::test]
async fn test_listing_and_options() {
    let gateway = Gateway::start().await;

    let agents = gateway.client.list_agents().await.unwrap();
    assert_eq!(agents.len(), 15);

    let options = gateway.client.describe_options("quiz_gen").await.unwrap();
    assert!(options.iter().any(|o| o.name == "difficulty"));
    assert!(gateway.client.describe_options("missing").await.is_err());

    gateway.stop().await;
}
