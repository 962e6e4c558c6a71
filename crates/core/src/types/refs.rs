use serde::{Deserialize, Serialize};

use crate::artifact::artifact_file_name;

// =============================================================================
// Artifact References
// =============================================================================

/// Prefix under which generated files are served.
pub const FILES_ROUTE: &str = "/files";

/// Downloadable file surfaced from an agent result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLink {
    /// Path as produced by the agent.
    pub path: String,

    /// Final path segment.
    pub file_name: String,

    /// Download URL relative to the gateway root.
    pub url: String,
}

impl ArtifactLink {
    /// Build a link from an agent-produced path.
    ///
    /// Returns `None` when the path has no usable final segment.
    pub fn from_path(path: &str) -> Option<Self> {
        let file_name = artifact_file_name(path)?;
        Some(Self {
            path: path.to_string(),
            file_name: file_name.to_string(),
            url: format!("{}/{}", FILES_ROUTE, file_name),
        })
    }
}

impl std::fmt::Display for ArtifactLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
