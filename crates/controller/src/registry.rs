//! Static agent registry.
//!
//! Loaded once at startup from YAML configuration and read-only afterwards,
//! so it is shared across requests behind an `Arc` without locking.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use agent_gateway_core::{
    types::{AgentDescriptor, AgentSummary, OptionDef, OptionKind, PromptSpec},
    Error, Result,
};

use crate::options::coerce_value;

/// Registry shipped with the gateway.
pub const BUILTIN_REGISTRY: &str = include_str!("../agents.yaml");

#[derive(Debug, Deserialize)]
struct RegistryFile {
    agents: Vec<RegistryEntry>,
}

#[derive(Debug, Deserialize)]
struct RegistryEntry {
    id: String,
    name: String,
    description: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    options: Vec<OptionDef>,
    #[serde(default)]
    prompt: Option<PromptSpec>,
}

/// Read-only mapping from agent id to descriptor.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: Vec<AgentDescriptor>,
    index: HashMap<String, usize>,
    prompts: HashMap<String, PromptSpec>,
}

impl AgentRegistry {
    /// Load the built-in registry.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_REGISTRY)
    }

    /// Parse a registry from YAML.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(source)?;
        let mut registry = Self::default();

        for entry in file.agents {
            let descriptor = AgentDescriptor {
                id: entry.id,
                name: entry.name,
                description: entry.description,
                icon: entry.icon,
                options: entry.options,
            };
            if let Some(prompt) = entry.prompt {
                registry.prompts.insert(descriptor.id.clone(), prompt);
            }
            registry.push(descriptor)?;
        }

        tracing::debug!(agents = registry.len(), "Agent registry loaded");
        Ok(registry)
    }

    /// Load a registry file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::registry(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&source)
    }

    /// Build a registry from descriptors, without prompt configuration.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = AgentDescriptor>) -> Result<Self> {
        let mut registry = Self::default();
        for descriptor in descriptors {
            registry.push(descriptor)?;
        }
        Ok(registry)
    }

    fn push(&mut self, descriptor: AgentDescriptor) -> Result<()> {
        validate_descriptor(&descriptor)?;
        if self.index.contains_key(&descriptor.id) {
            return Err(Error::registry(format!("duplicate agent id '{}'", descriptor.id)));
        }
        self.index.insert(descriptor.id.clone(), self.agents.len());
        self.agents.push(descriptor);
        Ok(())
    }

    /// All agents in configuration order.
    pub fn list_agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    /// Listing form of all agents.
    pub fn summaries(&self) -> Vec<AgentSummary> {
        self.agents.iter().map(AgentDescriptor::summary).collect()
    }

    /// Look up an agent.
    pub fn get(&self, agent_id: &str) -> Result<&AgentDescriptor> {
        self.index
            .get(agent_id)
            .map(|&i| &self.agents[i])
            .ok_or_else(|| Error::UnknownAgent(agent_id.to_string()))
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.index.contains_key(agent_id)
    }

    /// Ordered option schema of an agent; empty if it declares none.
    pub fn describe_options(&self, agent_id: &str) -> Result<&[OptionDef]> {
        self.get(agent_id).map(|d| d.options.as_slice())
    }

    /// Prompt configuration of a model-backed agent.
    pub fn prompt(&self, agent_id: &str) -> Option<&PromptSpec> {
        self.prompts.get(agent_id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn validate_descriptor(descriptor: &AgentDescriptor) -> Result<()> {
    if descriptor.id.trim().is_empty() {
        return Err(Error::registry("agent id must not be empty"));
    }

    let mut seen = HashSet::new();
    for def in &descriptor.options {
        if !seen.insert(def.name.as_str()) {
            return Err(Error::registry(format!(
                "agent '{}' declares option '{}' twice",
                descriptor.id, def.name
            )));
        }
        if def.kind == OptionKind::Select
            && def.allowed_values.as_ref().map_or(true, |v| v.is_empty())
        {
            return Err(Error::registry(format!(
                "select option '{}' of agent '{}' has no allowed values",
                def.name, descriptor.id
            )));
        }
        if let Some(default) = &def.default {
            coerce_value(def, default).map_err(|e| {
                Error::registry(format!("agent '{}': bad default: {}", descriptor.id, e))
            })?;
        }
    }

    Ok(())
}
