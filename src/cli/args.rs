// SPDX-License-Identifier: GPL-3.0-only
use clap::Parser;
use std::path::PathBuf;

use crate::engine::BufferDistance;
use crate::extract::{parse_cama_flag, split_feature_list, ExtractionRequest, OutputFormat, RequestError};

/// Clip county data to a buffered boundary and package it for delivery
#[derive(Debug, Parser)]
#[command(name = "DataExtractor", version)]
pub struct Args {
    /// Output format: "File Geodatabase", "Shapefile" or "Both"
    pub output_format: OutputFormat,

    /// Feature class holding the clip boundary
    pub clip_feature: PathBuf,

    /// Attribute filter selecting the clip features
    pub filter: String,

    /// Buffer distance, optionally with a linear unit ("500 Feet")
    #[arg(allow_hyphen_values = true)]
    pub buffer_distance: BufferDistance,

    /// Semicolon-delimited feature classes to clip
    pub features: String,

    /// Output subfolder created under the output root
    pub folder_name: String,

    /// Base name of the output geodatabase
    pub gdb_name: String,

    /// File geodatabase version
    pub gdb_version: String,

    /// "true" joins CAMA records to the extracted parcels
    pub include_cama: String,

    /// Configuration file (defaults to EXTRACTOR_CONFIG, then extractor.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn into_request(self) -> Result<ExtractionRequest, RequestError> {
        let request = ExtractionRequest {
            format: self.output_format,
            clip_feature: self.clip_feature,
            filter: self.filter,
            buffer_distance: self.buffer_distance,
            features: split_feature_list(&self.features),
            folder_name: self.folder_name,
            gdb_name: self.gdb_name,
            gdb_version: self.gdb_version,
            include_cama: parse_cama_flag(&self.include_cama),
        };
        request.validate()?;
        Ok(request)
    }
}
