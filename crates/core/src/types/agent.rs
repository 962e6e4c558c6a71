use serde::{Deserialize, Serialize};

// =============================================================================
// Agent Descriptor Types (Registry)
// =============================================================================

/// Kind of value an agent option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    /// Free text.
    Text,
    /// Integer value.
    Number,
    /// One of a fixed list of values.
    Select,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OptionKind::Text => "text",
            OptionKind::Number => "number",
            OptionKind::Select => "select",
        };
        f.write_str(label)
    }
}

/// Definition of a single option an agent accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDef {
    /// Option key in the request's `options` map.
    pub name: String,

    /// Label shown next to the input field.
    pub label: String,

    /// Declared value kind.
    pub kind: OptionKind,

    /// Permitted values for `select` options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,

    /// Value used when the request omits the option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// Static metadata describing a registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique, stable identifier (e.g. `quiz_gen`).
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// One-line summary shown in the UI.
    pub description: String,

    /// Optional icon markup for the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Ordered option schema.
    #[serde(default)]
    pub options: Vec<OptionDef>,
}

impl AgentDescriptor {
    /// Look up an option definition by name.
    pub fn option(&self, name: &str) -> Option<&OptionDef> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Listing form without the option schema.
    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Entry of the `GET /api/agents` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Agent identifier, as accepted by `POST /api/execute`.
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// One-line summary shown in the UI.
    pub description: String,

    /// Optional icon markup for the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Prompt configuration for agents backed by the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    /// System instruction.
    pub system: String,

    /// User prompt template, rendered with the topic and resolved options.
    pub template: String,

    /// Data sub-directory the artifact is written to.
    pub artifact_dir: String,

    /// Key the parsed model output is returned under.
    pub result_key: String,

    /// Sampling temperature override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}
