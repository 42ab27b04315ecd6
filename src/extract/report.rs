// SPDX-License-Identifier: GPL-3.0-only
use serde::Serialize;
use std::path::PathBuf;

use crate::extract::request::OutputFormat;

/// What a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub format: OutputFormat,
    pub output_folder: PathBuf,
    /// Feature classes clipped into the working geodatabase
    pub clipped: Vec<String>,
    pub cama_joined: bool,
    pub contours_derived: bool,
    pub geodatabase: Option<PathBuf>,
    pub archive: Option<PathBuf>,
    pub shapefiles: Vec<String>,
}

impl ExtractionReport {
    pub fn new(format: OutputFormat, output_folder: PathBuf) -> Self {
        Self {
            format,
            output_folder,
            clipped: Vec::new(),
            cama_joined: false,
            contours_derived: false,
            geodatabase: None,
            archive: None,
            shapefiles: Vec::new(),
        }
    }
}
