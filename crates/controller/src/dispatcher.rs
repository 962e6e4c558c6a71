//! Execution dispatcher.
//!
//! Validates a request against the registry, resolves its options and runs
//! exactly one agent handler:
//! 1. Unknown agent ids are rejected
//! 2. Blank topics are rejected
//! 3. Options are coerced to their declared kinds
//! 4. The handler runs in its own task under the execution timeout
//!
//! Rejections surface as `Err`. Anything that goes wrong inside the handler
//! (error, timeout, panic) becomes an [`ExecutionResult::Failure`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{AbortHandle, JoinError};
use tokio::time::Instant;

use agent_gateway_core::{
    traits::AgentHandler,
    types::{AgentDescriptor, ExecutionRequest, ExecutionResult, Options},
    Error, Result,
};

use crate::cache::ResponseCache;
use crate::options::resolve_options;
use crate::registry::AgentRegistry;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Upper bound on a single agent invocation.
    pub execution_timeout: Duration,
    /// Lifetime of cached successful results.
    pub cache_ttl: Duration,
    /// Maximum cached results; zero disables caching.
    pub cache_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            execution_timeout: Duration::from_secs(300),
            cache_ttl: Duration::from_secs(3600),
            cache_capacity: 100,
        }
    }
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest<'a> {
    pub descriptor: &'a AgentDescriptor,
    pub topic: String,
    pub options: Options,
}

/// Result of a dispatched request.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub result: ExecutionResult,
    /// Served from the response cache without invoking the handler.
    pub cached: bool,
}

/// Routes execution requests to agent handlers.
pub struct Dispatcher {
    config: DispatcherConfig,
    registry: Arc<AgentRegistry>,
    handlers: HashMap<String, Arc<dyn AgentHandler>>,
    cache: ResponseCache,
}

impl Dispatcher {
    /// Create a dispatcher with no handlers bound.
    pub fn new(registry: Arc<AgentRegistry>, config: DispatcherConfig) -> Self {
        let cache = ResponseCache::new(config.cache_ttl, config.cache_capacity);
        Self {
            config,
            registry,
            handlers: HashMap::new(),
            cache,
        }
    }

    /// Bind a handler to a registered agent id.
    pub fn with_handler(mut self, agent_id: &str, handler: Arc<dyn AgentHandler>) -> Result<Self> {
        if !self.registry.contains(agent_id) {
            return Err(Error::registry(format!(
                "cannot bind handler to unregistered agent '{}'",
                agent_id
            )));
        }
        self.handlers.insert(agent_id.to_string(), handler);
        Ok(self)
    }

    /// The registry this dispatcher validates against.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Whether a handler is bound for the agent.
    pub fn has_handler(&self, agent_id: &str) -> bool {
        self.handlers.contains_key(agent_id)
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Run the validation chain; first failing check wins.
    pub fn validate<'a>(&'a self, request: &ExecutionRequest) -> Result<ValidatedRequest<'a>> {
        let descriptor = self.registry.get(&request.agent)?;

        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(Error::InvalidInput("topic must not be empty".to_string()));
        }

        let options = resolve_options(descriptor, &request.options)?;

        Ok(ValidatedRequest {
            descriptor,
            topic: topic.to_string(),
            options,
        })
    }

    /// Validate and execute a request.
    pub async fn execute(&self, request: ExecutionRequest) -> Result<DispatchOutcome> {
        let validated = match self.validate(&request) {
            Ok(v) => v,
            Err(e) => {
                tracing::info!(agent = %request.agent, error = %e, "Execution request rejected");
                metrics::counter!("agent_requests_rejected_total", "reason" => e.code())
                    .increment(1);
                return Err(e);
            }
        };
        let agent_id = validated.descriptor.id.clone();

        let cache_key = ResponseCache::key(&agent_id, &validated.topic, &validated.options);
        if let Some(value) = self.cache.get(&cache_key) {
            tracing::info!(agent = %agent_id, "Cache hit");
            metrics::counter!("agent_executions_total", "agent" => agent_id, "outcome" => "cached")
                .increment(1);
            return Ok(DispatchOutcome {
                result: ExecutionResult::success(value),
                cached: true,
            });
        }

        let result = self
            .invoke(&agent_id, validated.topic, validated.options)
            .await;

        if let ExecutionResult::Success { result: value } = &result {
            self.cache.insert(cache_key, value.clone());
        }

        Ok(DispatchOutcome {
            result,
            cached: false,
        })
    }

    async fn invoke(&self, agent_id: &str, topic: String, options: Options) -> ExecutionResult {
        let Some(handler) = self.handlers.get(agent_id).cloned() else {
            tracing::error!(agent = %agent_id, "No handler bound for registered agent");
            return ExecutionResult::failure(format!(
                "agent '{}' is registered but has no handler",
                agent_id
            ));
        };

        tracing::info!(agent = %agent_id, topic_len = topic.len(), "Invoking agent");
        let started = Instant::now();

        let task = tokio::spawn(async move { handler.execute(&topic, &options).await });
        // Aborts the handler on timeout and when the caller drops this future.
        let _guard = AbortOnDrop(task.abort_handle());

        let (result, outcome) = match tokio::time::timeout(self.config.execution_timeout, task).await
        {
            Ok(Ok(Ok(value))) => (ExecutionResult::success(value), "success"),
            Ok(Ok(Err(e))) => {
                tracing::warn!(agent = %agent_id, error = %e, "Agent failed");
                (ExecutionResult::failure(e.to_string()), "failure")
            }
            Ok(Err(join_error)) => {
                let detail = join_failure_detail(agent_id, join_error);
                tracing::error!(agent = %agent_id, detail = %detail, "Agent task aborted");
                (ExecutionResult::failure(detail), "failure")
            }
            Err(_) => {
                let err = Error::Timeout {
                    agent: agent_id.to_string(),
                    limit: self.config.execution_timeout,
                };
                tracing::warn!(agent = %agent_id, error = %err, "Agent timed out");
                (ExecutionResult::failure(err.to_string()), "timeout")
            }
        };

        let elapsed = started.elapsed();
        tracing::info!(
            agent = %agent_id,
            outcome = outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            "Agent finished"
        );
        metrics::counter!(
            "agent_executions_total",
            "agent" => agent_id.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("agent_execution_seconds", "agent" => agent_id.to_string())
            .record(elapsed.as_secs_f64());

        result
    }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn join_failure_detail(agent_id: &str, err: JoinError) -> String {
    if !err.is_panic() {
        return format!("agent '{}' was cancelled", agent_id);
    }

    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("agent '{}' panicked: {}", agent_id, message)
}
