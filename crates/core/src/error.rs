//! Error types for the agent gateway.

use std::time::Duration;

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the gateway and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested agent id is not registered.
    #[error("unknown agent: '{0}'")]
    UnknownAgent(String),

    /// Required input is missing or empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Option value cannot be coerced to its declared kind.
    #[error("invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    /// Agent handler failed.
    #[error("agent '{agent}' failed: {message}")]
    AgentExecution { agent: String, message: String },

    /// Agent handler exceeded the execution timeout.
    #[error("agent '{agent}' timed out after {limit:?}")]
    Timeout { agent: String, limit: Duration },

    /// Registry configuration is invalid.
    #[error("registry error: {0}")]
    Registry(String),

    /// Language model provider error.
    #[error("model error: {0}")]
    Model(String),

    /// Artifact could not be written or read.
    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an invalid option error.
    pub fn invalid_option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an agent execution error.
    pub fn agent(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AgentExecution {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Create a registry error.
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry(message.into())
    }

    /// Create a model error.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }

    /// Create an artifact error.
    pub fn artifact(message: impl Into<String>) -> Self {
        Self::Artifact(message.into())
    }

    /// Stable machine-readable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnknownAgent(_) => "unknown_agent",
            Error::InvalidInput(_) => "invalid_input",
            Error::InvalidOption { .. } => "invalid_option",
            Error::AgentExecution { .. } | Error::Timeout { .. } => "agent_execution_failed",
            Error::Registry(_) => "registry_error",
            Error::Model(_) => "model_error",
            Error::Artifact(_) => "artifact_error",
            Error::Io(_) | Error::Serialization(_) | Error::Yaml(_) => "internal_error",
        }
    }

    /// Whether the request was rejected before any handler ran.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::UnknownAgent(_) | Error::InvalidInput(_) | Error::InvalidOption { .. }
        )
    }
}
