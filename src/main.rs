// SPDX-License-Identifier: GPL-3.0-only
mod archiver;
mod cli;
mod config;
mod engine;
mod extract;
mod logging;
mod utils;

#[cfg(test)]
mod test_helpers;

use clap::Parser;
use std::sync::Arc;
use tracing::info;

use archiver::{Archiver, ZipArchiver};
use cli::Args;
use config::Config;
use engine::{HttpSpatialEngine, SpatialEngine};
use extract::{ExtractionService, ExtractionSettings};
use logging::setup_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    // Initialize logging
    setup_logging(&config.log_level, config.log_format)?;

    info!("Starting DataExtractor v{}", env!("CARGO_PKG_VERSION"));

    let request = args.into_request()?;
    info!(
        format = %request.format,
        clip = %request.clip_feature.display(),
        features = request.features.len(),
        "Extraction requested"
    );

    let engine: Arc<dyn SpatialEngine> = Arc::new(HttpSpatialEngine::new(
        &config.engine_url,
        config.engine_api_key.clone(),
        config.engine_timeout_secs,
    )?);
    info!(url = %config.engine_url, "Geoprocessing engine configured");

    let archiver: Arc<dyn Archiver> = Arc::new(ZipArchiver::new());
    let service = ExtractionService::new(engine, archiver, ExtractionSettings::from(&config));

    let today = chrono::Local::now().date_naive();
    let report = service.run(&request, today).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!("Data extractor complete");
    Ok(())
}
