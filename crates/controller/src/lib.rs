//! Request validation and dispatch for the agent gateway.
//!
//! This crate provides the static agent registry, option coercion, the
//! execution dispatcher and its response cache.

pub mod cache;
pub mod dispatcher;
pub mod options;
pub mod registry;

pub use cache::ResponseCache;
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherConfig, ValidatedRequest};
pub use options::resolve_options;
pub use registry::AgentRegistry;
