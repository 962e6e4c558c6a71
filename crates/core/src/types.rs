//! Core type definitions for the agent gateway.
//!
//! This module contains the data structures shared by the registry, the
//! dispatcher, the HTTP surface and the client.

mod agent;
mod refs;
mod request;
mod result;

pub use agent::{AgentDescriptor, AgentSummary, OptionDef, OptionKind, PromptSpec};
pub use refs::{ArtifactLink, FILES_ROUTE};
pub use request::{ExecutionRequest, Options};
pub use result::{ExecutionEnvelope, ExecutionResult};
