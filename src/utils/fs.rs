// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// Whether an output directory was fresh or replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    Created,
    Recreated,
}

/// Create `dir`, deleting whatever is already there first
///
/// Existing contents are removed recursively; nothing is merged.
pub async fn recreate_dir(dir: &Path) -> anyhow::Result<DirState> {
    let state = match tokio::fs::symlink_metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => {
            tokio::fs::remove_dir_all(dir)
                .await
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
            DirState::Recreated
        }
        Ok(_) => {
            tokio::fs::remove_file(dir)
                .await
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
            DirState::Recreated
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => DirState::Created,
        Err(e) => return Err(e).with_context(|| format!("Failed to inspect {}", dir.display())),
    };

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    Ok(state)
}

/// Recursively copy a directory tree
///
/// `dst` must not exist yet, matching a fresh copy of a geodatabase folder.
pub fn copy_directory(src: PathBuf, dst: PathBuf) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> {
    Box::pin(async move {
        if tokio::fs::try_exists(&dst).await? {
            anyhow::bail!("Copy destination already exists: {}", dst.display());
        }
        tokio::fs::create_dir_all(&dst).await?;

        let mut entries = tokio::fs::read_dir(&src)
            .await
            .with_context(|| format!("Failed to read {}", src.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let dst_path = dst.join(entry.file_name());

            // Follows links, so a linked directory is copied as a real one
            let metadata = tokio::fs::metadata(entry.path())
                .await
                .with_context(|| format!("Failed to inspect {}", entry.path().display()))?;
            if metadata.is_dir() {
                copy_directory(entry.path(), dst_path).await?;
            } else {
                tokio::fs::copy(entry.path(), &dst_path)
                    .await
                    .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            }
        }

        Ok(())
    })
}
