//! Agent handlers for the gateway.
//!
//! Every registry entry with a prompt configuration is served by a
//! [`PromptAgent`] sharing one model client and one artifact writer.

pub mod artifacts;
pub mod prompt_agent;

use std::sync::Arc;

use agent_gateway_controller::Dispatcher;
use agent_gateway_core::{traits::LlmClient, Result};

pub use artifacts::{ArtifactWriter, ARTIFACT_DIRS};
pub use prompt_agent::{parse_model_output, PromptAgent};

/// Bind a [`PromptAgent`] for every registered agent with a prompt.
pub fn register_prompt_agents(
    dispatcher: Dispatcher,
    llm: Arc<dyn LlmClient>,
    writer: Arc<ArtifactWriter>,
) -> Result<Dispatcher> {
    let specs: Vec<_> = dispatcher
        .registry()
        .list_agents()
        .iter()
        .filter_map(|d| {
            dispatcher
                .registry()
                .prompt(&d.id)
                .map(|spec| (d.id.clone(), spec.clone()))
        })
        .collect();

    let mut dispatcher = dispatcher;
    for (agent_id, spec) in specs {
        tracing::debug!(agent = %agent_id, "Binding prompt agent");
        let agent = PromptAgent::new(agent_id.as_str(), spec, Arc::clone(&llm), Arc::clone(&writer));
        dispatcher = dispatcher.with_handler(&agent_id, Arc::new(agent))?;
    }

    Ok(dispatcher)
}
