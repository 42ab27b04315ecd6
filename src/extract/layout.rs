// SPDX-License-Identifier: GPL-3.0-only
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Where one request's outputs land
///
/// `<root>/<folder>/<gdb>_<YYYYMMDD>.gdb` and the matching `.zip`; shapefiles go
/// straight into the folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub folder: PathBuf,
    pub gdb: PathBuf,
    pub zip: PathBuf,
}

impl OutputLayout {
    pub fn new(output_root: &Path, folder_name: &str, gdb_name: &str, date: NaiveDate) -> Self {
        let folder = output_root.join(folder_name);
        let stem = format!("{}_{}", gdb_name, date.format("%Y%m%d"));

        Self {
            gdb: folder.join(format!("{}.gdb", stem)),
            zip: folder.join(format!("{}.zip", stem)),
            folder,
        }
    }
}
