// SPDX-License-Identifier: GPL-3.0-only
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::engine::BufferDistance;
use crate::utils::{feature_name, is_single_component};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Unknown output format '{0}' (expected \"File Geodatabase\", \"Shapefile\" or \"Both\")")]
    UnknownFormat(String),

    #[error("Output folder name '{0}' must be a single folder name")]
    InvalidFolderName(String),

    #[error("Geodatabase name '{0}' must be a single file name")]
    InvalidGdbName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputFormat {
    #[serde(rename = "File Geodatabase")]
    FileGeodatabase,
    Shapefile,
    Both,
}

/// Which output branches run for a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPlan {
    /// Copy the working geodatabase out, join CAMA records and zip the copy
    pub publish_gdb: bool,
    pub export_shapefiles: bool,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileGeodatabase => "File Geodatabase",
            Self::Shapefile => "Shapefile",
            Self::Both => "Both",
        }
    }

    pub fn plan(&self) -> FormatPlan {
        FormatPlan {
            publish_gdb: matches!(self, Self::FileGeodatabase | Self::Both),
            export_shapefiles: matches!(self, Self::Shapefile | Self::Both),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "File Geodatabase" => Ok(Self::FileGeodatabase),
            "Shapefile" => Ok(Self::Shapefile),
            "Both" => Ok(Self::Both),
            other => Err(RequestError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the exact string `true` turns the CAMA join on
pub fn parse_cama_flag(flag: &str) -> bool {
    flag == "true"
}

/// One extraction run's parameters
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub format: OutputFormat,
    /// Feature class holding the clip boundary
    pub clip_feature: PathBuf,
    /// Attribute filter selecting the region of interest
    pub filter: String,
    pub buffer_distance: BufferDistance,
    /// Source feature identifiers, as given (possibly fully qualified)
    pub features: Vec<String>,
    pub folder_name: String,
    pub gdb_name: String,
    pub gdb_version: String,
    pub include_cama: bool,
}

impl ExtractionRequest {
    /// Check the names that end up in output paths
    pub fn validate(&self) -> Result<(), RequestError> {
        if !is_single_component(&self.folder_name) {
            return Err(RequestError::InvalidFolderName(self.folder_name.clone()));
        }
        if !is_single_component(&self.gdb_name) {
            return Err(RequestError::InvalidGdbName(self.gdb_name.clone()));
        }
        Ok(())
    }

    /// Feature class names to clip; identifiers without a usable name are skipped
    pub fn feature_names(&self) -> Vec<String> {
        self.features
            .iter()
            .filter_map(|id| feature_name(id))
            .map(str::to_string)
            .collect()
    }
}

/// Split a semicolon-delimited feature list
pub fn split_feature_list(list: &str) -> Vec<String> {
    list.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
