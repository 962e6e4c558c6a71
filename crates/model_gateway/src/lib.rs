//! Language model access for model-backed agents.
//!
//! Provider calls share a semaphore so at most `max_concurrency` requests are
//! in flight, and quota/availability errors are retried with exponential
//! backoff.

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};
