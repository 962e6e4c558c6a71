use serde::{Deserialize, Serialize};

use super::refs::ArtifactLink;
use crate::artifact::find_artifact;
use crate::error::Error;

// =============================================================================
// Execution Result Types
// =============================================================================

/// Outcome of an agent invocation.
///
/// Exactly one of a result payload or an error detail exists.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Agent produced a payload of arbitrary shape.
    Success { result: serde_json::Value },

    /// Agent failed; message is shown to the user.
    Failure { detail: String },
}

impl ExecutionResult {
    /// Create a successful result.
    pub fn success(result: serde_json::Value) -> Self {
        Self::Success { result }
    }

    /// Create a failed result.
    pub fn failure(detail: impl Into<String>) -> Self {
        Self::Failure {
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Payload, if successful.
    pub fn result(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Success { result } => Some(result),
            Self::Failure { .. } => None,
        }
    }

    /// Error detail, if failed.
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { detail } => Some(detail),
        }
    }

    /// Artifact referenced by a successful payload.
    pub fn artifact(&self) -> Option<&str> {
        self.result().and_then(find_artifact)
    }
}

/// Wire form of an execution response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEnvelope {
    /// Whether the agent succeeded.
    pub success: bool,

    /// Agent the request targeted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    /// Agent payload (success only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Human-readable failure message (failure only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Machine-readable failure code (failure only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Downloadable artifact, if the payload references one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactLink>,

    /// Whether the payload was served from the response cache.
    #[serde(default)]
    pub cached: bool,

    /// RFC 3339 response timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ExecutionEnvelope {
    /// Wrap an execution result for the wire.
    pub fn from_result(agent: impl Into<String>, outcome: ExecutionResult) -> Self {
        let agent = Some(agent.into());
        let timestamp = Some(now_rfc3339());
        match outcome {
            ExecutionResult::Success { result } => {
                let artifact = find_artifact(&result).and_then(ArtifactLink::from_path);
                Self {
                    success: true,
                    agent,
                    result: Some(result),
                    detail: None,
                    error: None,
                    artifact,
                    cached: false,
                    timestamp,
                }
            }
            ExecutionResult::Failure { detail } => Self {
                success: false,
                agent,
                result: None,
                detail: Some(detail),
                error: Some("agent_execution_failed".to_string()),
                artifact: None,
                cached: false,
                timestamp,
            },
        }
    }

    /// Envelope for a request rejected before invocation.
    pub fn rejected(error: &Error) -> Self {
        Self {
            success: false,
            agent: None,
            result: None,
            detail: Some(error.to_string()),
            error: Some(error.code().to_string()),
            artifact: None,
            cached: false,
            timestamp: Some(now_rfc3339()),
        }
    }

    /// Mark the envelope as served from cache.
    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    /// Convert back into an execution result.
    pub fn into_result(self) -> ExecutionResult {
        if self.success {
            ExecutionResult::success(self.result.unwrap_or(serde_json::Value::Null))
        } else {
            ExecutionResult::failure(self.detail.unwrap_or_default())
        }
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
