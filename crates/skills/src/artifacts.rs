//! Artifact files written by agents under the data directory.

use std::path::{Path, PathBuf};

use agent_gateway_core::{Error, Result};

/// Data sub-directories created at startup.
pub const ARTIFACT_DIRS: [&str; 6] = [
    "images",
    "presentations",
    "quizzes",
    "roadmaps",
    "videos",
    "reports",
];

const MAX_SLUG_LEN: usize = 60;

/// Writes agent output into `<root>/<dir>/<slug>_<timestamp>_<suffix>.md`.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data directory root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and every well-known sub-directory.
    pub async fn init_directories(&self) -> Result<()> {
        for dir in ARTIFACT_DIRS {
            tokio::fs::create_dir_all(self.root.join(dir)).await?;
        }
        Ok(())
    }

    /// Write a markdown artifact and return its path.
    pub async fn write_markdown(
        &self,
        dir: &str,
        topic: &str,
        suffix: &str,
        contents: &str,
    ) -> Result<PathBuf> {
        let dir = dir.trim_matches(['/', '\\']);
        if dir.is_empty() || dir.contains(['/', '\\']) || dir == ".." || dir == "." {
            return Err(Error::artifact(format!("invalid artifact directory '{}'", dir)));
        }

        let target_dir = self.root.join(dir);
        tokio::fs::create_dir_all(&target_dir).await?;

        let file_name = format!(
            "{}_{}_{}.md",
            slugify(topic),
            chrono::Utc::now().timestamp_millis(),
            slugify(suffix)
        );
        let path = target_dir.join(file_name);
        tokio::fs::write(&path, contents).await?;

        tracing::info!(path = %path.display(), bytes = contents.len(), "Artifact written");
        Ok(path)
    }
}

/// Lowercase file-name stem built from free text.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_LEN));
    for c in text.trim().chars() {
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() || c == '-' {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '_') && !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() {
        "artifact".to_string()
    } else {
        slug
    }
}
