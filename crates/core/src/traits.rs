//! Collaborator traits.
//!
//! The dispatcher depends only on [`AgentHandler`]; agents that talk to a
//! language model do so through [`LlmClient`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Options;
use crate::Result;

// =============================================================================
// Agent Handlers
// =============================================================================

/// A named content-generation capability.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Run the agent on a topic with resolved options.
    ///
    /// The returned value may have any shape; a generated file is reported
    /// under one of the well-known artifact keys.
    async fn execute(&self, topic: &str, options: &Options) -> Result<serde_json::Value>;
}

// =============================================================================
// Language Model
// =============================================================================

/// Chat message sent to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role (user, model).
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A single completion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System instruction.
    pub system: Option<String>,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Ask the provider for a JSON response body.
    pub json_output: bool,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text.
    pub content: String,
    /// Token usage.
    pub usage: LlmUsage,
}

/// Language model provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion.
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse>;
}
