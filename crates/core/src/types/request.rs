use serde::{Deserialize, Serialize};

/// Option values keyed by option name.
pub type Options = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Request Types
// =============================================================================

/// A single agent execution request as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Identifier of the agent to run.
    pub agent: String,

    /// Primary free-text input.
    #[serde(default)]
    pub topic: String,

    /// Agent options; unknown keys are passed through to the handler.
    #[serde(default)]
    pub options: Options,
}

impl ExecutionRequest {
    /// Create a request with no options.
    pub fn new(agent: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            topic: topic.into(),
            options: Options::new(),
        }
    }

    /// Add an option value.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}
