// SPDX-License-Identifier: GPL-3.0-only
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("source must point to a directory, '{0}' does not")]
    NotADirectory(PathBuf),

    #[error("entry '{0}' is not inside the archive root")]
    OutsideRoot(PathBuf),

    #[error("I/O error while archiving: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("path prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),
}
