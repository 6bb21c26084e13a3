//! Filesystem utilities for output destinations.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Ensure the parent directory of `destination` exists.
///
/// Missing directories are created recursively. Calling this again for the
/// same destination is a no-op.
pub async fn prepare_output(destination: impl AsRef<Path>) -> MediaResult<()> {
    let destination = destination.as_ref();

    let Some(parent) = destination.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || fs::try_exists(parent).await.unwrap_or(false) {
        return Ok(());
    }

    tracing::debug!("Creating output directory {}", parent.display());
    fs::create_dir_all(parent)
        .await
        .map_err(|source| MediaError::OutputDirectory {
            path: parent.to_path_buf(),
            source,
        })
}

/// Prepare every destination in order, stopping at the first failure.
pub async fn prepare_outputs<S: AsRef<str>>(destinations: &[S]) -> MediaResult<()> {
    for destination in destinations {
        prepare_output(destination.as_ref()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_prepare_output_creates_parents() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("a/b/c/out.mp4");

        prepare_output(&dest).await.unwrap();

        assert!(temp.path().join("a/b/c").is_dir());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_prepare_output_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out/b.mp4");

        prepare_output(&dest).await.unwrap();
        prepare_output(&dest).await.unwrap();

        assert!(temp.path().join("out").is_dir());
    }

    #[tokio::test]
    async fn test_prepare_output_bare_file_name() {
        prepare_output("out.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn test_prepare_output_fails_under_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let err = prepare_output(blocker.join("sub/out.mp4")).await.unwrap_err();
        assert!(matches!(err, MediaError::OutputDirectory { .. }));
    }
}
