//! Core types, errors and collaborator traits for the agent gateway.

pub mod artifact;
pub mod error;
pub mod traits;
pub mod types;

pub use artifact::{artifact_file_name, find_artifact, ARTIFACT_KEYS};
pub use error::{Error, Result};
