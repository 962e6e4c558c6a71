//! One open agent interaction.
//!
//! A session is created when the user opens an agent and dropped when the
//! interaction closes. Dropping cancels any call still in flight.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use agent_gateway_core::types::{ExecutionEnvelope, ExecutionRequest, Options};

use crate::client::GatewayClient;
use crate::error::Result;
use crate::progress::{ProgressConfig, ProgressSimulator, ProgressSnapshot};

/// One user interaction with a single agent: selected agent, collected options
/// and simulated progress for the in-flight call.
pub struct ExecutionSession {
    client: Arc<GatewayClient>,
    agent: String,
    options: Options,
    simulator: ProgressSimulator,
    cancel: CancellationToken,
}

impl ExecutionSession {
    /// Session for `agent` with default progress timing.
    pub fn open(client: Arc<GatewayClient>, agent: impl Into<String>) -> Self {
        Self::with_progress(client, agent, ProgressConfig::default())
    }

    /// Session for `agent` with custom progress timing.
    pub fn with_progress(
        client: Arc<GatewayClient>,
        agent: impl Into<String>,
        progress: ProgressConfig,
    ) -> Self {
        let agent = agent.into();
        tracing::debug!(agent = %agent, "Session opened");
        Self {
            client,
            agent,
            options: Options::new(),
            simulator: ProgressSimulator::new(progress),
            cancel: CancellationToken::new(),
        }
    }

    /// Currently selected agent id.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Switch to another agent; clears options and progress.
    pub fn select_agent(&mut self, agent: impl Into<String>) {
        self.agent = agent.into();
        self.options.clear();
        self.simulator.reset();
    }

    /// Set an option sent with the next submission.
    pub fn set_option(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.options.insert(name.into(), value.into());
    }

    /// Receiver of progress updates.
    pub fn progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.simulator.subscribe()
    }

    /// Current progress state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.simulator.snapshot()
    }

    /// Token that closes the interaction when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the selected agent on `topic` with the collected options.
    ///
    /// Resolves with the gateway's envelope whether the agent succeeded or
    /// not; `ClientError::Cancelled` when the session was closed meanwhile.
    pub async fn submit(&mut self, topic: impl Into<String>) -> Result<ExecutionEnvelope> {
        self.simulator.reset();

        let request = ExecutionRequest {
            agent: self.agent.clone(),
            topic: topic.into(),
            options: self.options.clone(),
        };

        let envelope = self
            .simulator
            .run(self.client.execute(&request), &self.cancel)
            .await??;

        if envelope.success {
            tracing::info!(agent = %self.agent, cached = envelope.cached, "Execution succeeded");
        } else {
            tracing::info!(
                agent = %self.agent,
                detail = envelope.detail.as_deref().unwrap_or_default(),
                "Execution failed"
            );
        }
        Ok(envelope)
    }

    /// Absolute download URL of the artifact in `envelope`, if any.
    pub fn download_url(&self, envelope: &ExecutionEnvelope) -> Option<String> {
        envelope
            .artifact
            .as_ref()
            .map(|artifact| self.client.download_url(artifact))
    }
}

impl Drop for ExecutionSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
