//! Model-backed agent driven by a [`PromptSpec`].
//!
//! Renders the prompt template, asks the model for JSON, stores the output as
//! a markdown artifact and returns
//! `{ <result_key>: <parsed output>, "output_file": <path>, "usage": {...} }`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_gateway_core::{
    traits::{AgentHandler, ChatMessage, CompletionRequest, LlmClient},
    types::{Options, PromptSpec},
    Error, Result,
};

use crate::artifacts::ArtifactWriter;

const DEFAULT_TEMPERATURE: f32 = 0.7;

pub struct PromptAgent {
    agent_id: String,
    spec: PromptSpec,
    llm: Arc<dyn LlmClient>,
    writer: Arc<ArtifactWriter>,
}

impl PromptAgent {
    pub fn new(
        agent_id: impl Into<String>,
        spec: PromptSpec,
        llm: Arc<dyn LlmClient>,
        writer: Arc<ArtifactWriter>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            spec,
            llm,
            writer,
        }
    }

    /// Render the user prompt for a topic and resolved options.
    pub fn render_prompt(&self, topic: &str, options: &Options) -> Result<String> {
        let mut context = tera::Context::new();
        for (name, value) in options {
            context.insert(name.as_str(), value);
        }
        context.insert("topic", topic);

        tera::Tera::one_off(&self.spec.template, &context, false).map_err(|e| {
            Error::agent(&self.agent_id, format!("prompt template failed to render: {}", e))
        })
    }

    fn to_markdown(&self, topic: &str, output: &Value) -> String {
        let body = match output {
            Value::String(text) => text.clone(),
            other => format!(
                "```json\n{}\n```",
                serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
            ),
        };
        format!("# {}: {}\n\n{}\n", self.agent_id, topic, body)
    }
}

#[async_trait]
impl AgentHandler for PromptAgent {
    async fn execute(&self, topic: &str, options: &Options) -> Result<Value> {
        let prompt = self.render_prompt(topic, options)?;
        let request = CompletionRequest {
            system: Some(self.spec.system.clone()),
            messages: vec![ChatMessage::user(prompt)],
            temperature: Some(self.spec.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
            json_output: true,
        };

        tracing::info!(agent = %self.agent_id, "Generating content");
        let response = self.llm.complete(&request).await?;
        let output = parse_model_output(&response.content);

        let path = self
            .writer
            .write_markdown(
                &self.spec.artifact_dir,
                topic,
                &self.agent_id,
                &self.to_markdown(topic, &output),
            )
            .await?;

        let mut result = serde_json::Map::new();
        result.insert(self.spec.result_key.clone(), output);
        result.insert("output_file".to_string(), json!(path.to_string_lossy()));
        result.insert(
            "usage".to_string(),
            json!({
                "prompt_tokens": response.usage.prompt_tokens,
                "completion_tokens": response.usage.completion_tokens,
            }),
        );
        Ok(Value::Object(result))
    }
}

/// Parse model output as JSON, tolerating markdown code fences.
///
/// Output that is not JSON is returned as a string.
pub fn parse_model_output(content: &str) -> Value {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}
