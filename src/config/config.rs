// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::schema::default_cama_fields;
use crate::engine::FieldVisibility;
use crate::logging::LogFormat;

const DEFAULT_CONFIG_PATH: &str = "extractor.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory that receives one subfolder per extraction request
    pub output_root: PathBuf,

    /// Scratch file geodatabase rebuilt at the start of every run
    pub working_gdb: PathBuf,

    /// Enterprise workspace holding the source feature classes and the CAMA table
    pub source_workspace: PathBuf,

    /// Base URL of the geoprocessing service
    pub engine_url: String,

    /// Optional bearer token for the geoprocessing service
    pub engine_api_key: Option<String>,

    /// Per-operation timeout in seconds
    pub engine_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log_format: LogFormat,

    /// Name of the layer holding the selected clip features
    pub selection_layer: String,

    pub cama: CamaConfig,

    pub contours: ContourConfig,
}

/// Assessment-record join and relationship class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CamaConfig {
    /// CAMA table name inside the source workspace
    pub table: String,
    pub view_name: String,
    /// Parcel feature class that gates the join
    pub parcels: String,
    pub records: String,
    pub relationship: String,
    pub join_key: String,
    pub relationship_key: String,
    pub fields: Vec<FieldVisibility>,
}

/// Index-contour subset derived from the clipped two-foot contours
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    pub source: String,
    pub output: String,
    pub layer_name: String,
    pub filter: String,
}

impl Config {
    /// Load configuration from a TOML file with environment variable overrides
    ///
    /// The file is `explicit` when given, else `EXTRACTOR_CONFIG`, else
    /// `extractor.toml`. Only an explicitly named file must exist.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("EXTRACTOR_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else if explicit.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `EXTRACTOR_*` overrides using `lookup` to resolve variables
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("EXTRACTOR_OUTPUT_ROOT") {
            self.output_root = PathBuf::from(val);
        }
        if let Some(val) = lookup("EXTRACTOR_WORKING_GDB") {
            self.working_gdb = PathBuf::from(val);
        }
        if let Some(val) = lookup("EXTRACTOR_SOURCE_WORKSPACE") {
            self.source_workspace = PathBuf::from(val);
        }
        if let Some(val) = lookup("EXTRACTOR_ENGINE_URL") {
            self.engine_url = val;
        }
        if let Some(val) = lookup("EXTRACTOR_ENGINE_API_KEY") {
            self.engine_api_key = Some(val);
        }
        if let Some(val) = lookup("EXTRACTOR_ENGINE_TIMEOUT_SECS") {
            self.engine_timeout_secs = val
                .parse()
                .with_context(|| format!("Invalid EXTRACTOR_ENGINE_TIMEOUT_SECS: {}", val))?;
        }
        if let Some(val) = lookup("EXTRACTOR_LOG_LEVEL") {
            self.log_level = val;
        }
        if let Some(val) = lookup("EXTRACTOR_LOG_FORMAT") {
            self.log_format = val.parse()?;
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("extracts"),
            working_gdb: PathBuf::from("scratch/Extractor.gdb"),
            source_workspace: PathBuf::from("GIS.sde"),
            engine_url: String::from("http://localhost:8399/geoprocessing"),
            engine_api_key: None,
            engine_timeout_secs: 3600,
            log_level: String::from("info"),
            log_format: LogFormat::Text,
            selection_layer: String::from("Feature_Select"),
            cama: CamaConfig::default(),
            contours: ContourConfig::default(),
        }
    }
}

impl Default for CamaConfig {
    fn default() -> Self {
        Self {
            table: String::from("GIS.Land_Base_CAMA"),
            view_name: String::from("GIS.Land_Base_CAMA_View"),
            parcels: String::from("Parcels"),
            records: String::from("CAMA_Records"),
            relationship: String::from("CAMA_Records_Parcels"),
            join_key: String::from("PIDN"),
            relationship_key: String::from("OBJECTID"),
            fields: default_cama_fields(),
        }
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            source: String::from("Contours_2FT"),
            output: String::from("Contours_10FT"),
            layer_name: String::from("Contours_Index"),
            filter: String::from("CONT_TYPE = 'INDEX DEPRESSION' OR CONT_TYPE = 'INDEX CONTOUR'"),
        }
    }
}
