//! Artifact downloads under `/files`.
//!
//! Only the final path segment is honoured. The file is looked up directly in
//! the data directory, then anywhere beneath it; nothing outside the data
//! directory is reachable.

use std::path::{Path, PathBuf};

use axum::{
    extract::{Path as UrlPath, State},
    http::header,
    response::{IntoResponse, Response},
};

use agent_gateway_core::artifact_file_name;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn download(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Result<Response, ApiError> {
    let file_name = artifact_file_name(&path)
        .ok_or_else(|| ApiError::FileNotFound(path.clone()))?
        .to_string();

    let located = locate(state.data_dir(), &file_name)
        .await?
        .ok_or_else(|| ApiError::FileNotFound(file_name.clone()))?;

    let bytes = tokio::fs::read(&located).await?;
    let mime = mime_guess::from_path(&located).first_or_octet_stream();
    tracing::debug!(file = %located.display(), mime = %mime, "Serving artifact");

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Find `file_name` in `root`, falling back to a walk of its sub-directories.
pub async fn locate(root: &Path, file_name: &str) -> std::io::Result<Option<PathBuf>> {
    let direct = root.join(file_name);
    if tokio::fs::symlink_metadata(&direct)
        .await
        .is_ok_and(|meta| meta.file_type().is_file())
    {
        return Ok(Some(direct));
    }

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            // Symlinks are neither followed nor served.
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() && entry.file_name() == file_name {
                return Ok(Some(entry.path()));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_locate_direct_and_nested() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("top.txt"), "top").unwrap();
        std::fs::create_dir_all(tmp.path().join("quizzes/2024")).unwrap();
        std::fs::write(tmp.path().join("quizzes/2024/quiz.pdf"), "pdf").unwrap();

        assert_eq!(
            locate(tmp.path(), "top.txt").await.unwrap(),
            Some(tmp.path().join("top.txt"))
        );
        assert_eq!(
            locate(tmp.path(), "quiz.pdf").await.unwrap(),
            Some(tmp.path().join("quizzes/2024/quiz.pdf"))
        );
        assert_eq!(locate(tmp.path(), "missing.pdf").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_directories_are_not_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("reports")).unwrap();
        assert_eq!(locate(tmp.path(), "reports").await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_not_served() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        std::fs::create_dir_all(data.join("reports")).unwrap();
        std::fs::write(tmp.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink("../secret.txt", data.join("leak.txt")).unwrap();
        std::os::unix::fs::symlink("../../secret.txt", data.join("reports/nested.txt")).unwrap();

        assert_eq!(locate(&data, "leak.txt").await.unwrap(), None);
        assert_eq!(locate(&data, "nested.txt").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(locate(&tmp.path().join("absent"), "a.pdf").await.unwrap(), None);
    }
}
