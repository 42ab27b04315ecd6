// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archiver::error::ArchiveError;
use crate::archiver::traits::Archiver;

/// Directory being archived and how its entries are named
struct ArchiveSource {
    root: PathBuf,
    root_name: Option<String>,
}

impl ArchiveSource {
    fn new(root: PathBuf, include_root: bool) -> Self {
        let root_name = if include_root {
            root.file_name().map(|n| n.to_string_lossy().into_owned())
        } else {
            None
        };
        Self { root, root_name }
    }

    /// Archive name for a path under the root, `/`-separated.
    /// Returns `None` for the root itself when its name is not kept.
    fn entry_name(&self, path: &Path) -> Result<Option<String>, ArchiveError> {
        let relative = path.strip_prefix(&self.root)?;

        let mut parts: Vec<String> = self.root_name.iter().cloned().collect();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                _ => return Err(ArchiveError::OutsideRoot(path.to_path_buf())),
            }
        }

        if parts.is_empty() {
            return Ok(None);
        }

        Ok(Some(normalize_case(parts.join("/"))))
    }
}

#[derive(Debug, Default)]
struct ArchiveStats {
    files: usize,
    empty_dirs: usize,
    linked_dirs: usize,
}

#[cfg(windows)]
fn normalize_case(name: String) -> String {
    name.to_lowercase()
}

#[cfg(not(windows))]
fn normalize_case(name: String) -> String {
    name
}

/// `<dir>.zip` next to the directory
fn default_archive_path(source_dir: &Path) -> PathBuf {
    // Re-collecting drops a trailing separator so the suffix lands on the name
    let normalized: PathBuf = source_dir.components().collect();
    let mut archive = normalized.into_os_string();
    archive.push(".zip");
    PathBuf::from(archive)
}

/// Create a deflate-compressed ZIP archive from a directory tree
///
/// Every file found by a depth-first walk becomes one entry; every directory
/// with neither files nor subdirectories becomes a zero-length `name/` marker.
/// With `include_root` the directory's own name prefixes every entry, otherwise
/// entries are rooted at its contents. An existing file at `archive_path` is
/// overwritten.
pub fn dir_zip(
    source_dir: &Path,
    archive_path: Option<&Path>,
    include_root: bool,
) -> Result<PathBuf, ArchiveError> {
    if !source_dir.is_dir() {
        return Err(ArchiveError::NotADirectory(source_dir.to_path_buf()));
    }

    let archive_path = archive_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_archive_path(source_dir));

    let source = ArchiveSource::new(source_dir.canonicalize()?, include_root);

    let file = File::create(&archive_path)?;
    // The archive may live inside the tree it is built from
    let own_path = archive_path.canonicalize().ok();

    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut stats = ArchiveStats::default();

    write_dir(&mut writer, &source, &source.root, options, own_path.as_deref(), &mut stats)?;
    writer.finish()?;

    debug!(
        archive = %archive_path.display(),
        files = stats.files,
        empty_dirs = stats.empty_dirs,
        linked_dirs = stats.linked_dirs,
        "Archive finalized"
    );
    Ok(archive_path)
}

fn write_dir<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    source: &ArchiveSource,
    dir: &Path,
    options: FileOptions,
    skip: Option<&Path>,
    stats: &mut ArchiveStats,
) -> Result<(), ArchiveError> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    let mut linked_dirs = 0;
    for entry in entries {
        let path = entry.path();
        if skip == Some(path.as_path()) {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_symlink() && path.is_dir() {
            // Linked directories count as children but are never descended into
            debug!(link = %path.display(), "Skipping linked directory");
            linked_dirs += 1;
        } else {
            files.push(path);
        }
    }
    stats.linked_dirs += linked_dirs;

    for path in &files {
        let Some(name) = source.entry_name(path)? else {
            continue;
        };
        writer.start_file(name, options)?;
        let mut input = File::open(path)?;
        std::io::copy(&mut input, writer)?;
        stats.files += 1;
    }

    if files.is_empty() && subdirs.is_empty() && linked_dirs == 0 {
        if let Some(name) = source.entry_name(dir)? {
            writer.add_directory(name, options)?;
            stats.empty_dirs += 1;
        }
    }

    for path in &subdirs {
        write_dir(writer, source, path, options, skip, stats)?;
    }

    Ok(())
}

pub struct ZipArchiver;

impl ZipArchiver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn archive_dir(
        &self,
        source_dir: PathBuf,
        archive_path: Option<PathBuf>,
        include_root: bool,
    ) -> anyhow::Result<PathBuf> {
        info!(source = %source_dir.display(), "Creating ZIP archive");

        let archive = tokio::task::spawn_blocking(move || {
            dir_zip(&source_dir, archive_path.as_deref(), include_root)
        })
        .await??;

        info!(archive = %archive.display(), "ZIP archive created");
        Ok(archive)
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new()
    }
}
