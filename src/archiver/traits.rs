// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait Archiver: Send + Sync {
    /// Compress a directory tree into an archive
    ///
    /// When `archive_path` is `None` the archive is written next to the
    /// directory, named after it with a `.zip` suffix. Returns the path of the
    /// finished archive.
    async fn archive_dir(
        &self,
        source_dir: PathBuf,
        archive_path: Option<PathBuf>,
        include_root: bool,
    ) -> anyhow::Result<PathBuf>;
}
