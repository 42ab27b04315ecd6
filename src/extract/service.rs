// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::archiver::Archiver;
use crate::config::{CamaConfig, Config, ContourConfig};
use crate::engine::models::{Cardinality, MessageDirection};
use crate::engine::{JoinType, RelationshipClass, SpatialEngine};
use crate::extract::layout::OutputLayout;
use crate::extract::report::ExtractionReport;
use crate::extract::request::ExtractionRequest;
use crate::utils::{copy_directory, last_segment, recreate_dir, DirState};

const BUFFER_NAME: &str = "Buffered_Area";
const BOUNDARY_NAME: &str = "Boundary";

/// Deployment settings the extraction workflow runs against
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub output_root: PathBuf,
    pub working_gdb: PathBuf,
    pub source_workspace: PathBuf,
    pub selection_layer: String,
    pub cama: CamaConfig,
    pub contours: ContourConfig,
}

impl From<&Config> for ExtractionSettings {
    fn from(config: &Config) -> Self {
        Self {
            output_root: config.output_root.clone(),
            working_gdb: config.working_gdb.clone(),
            source_workspace: config.source_workspace.clone(),
            selection_layer: config.selection_layer.clone(),
            cama: config.cama.clone(),
            contours: config.contours.clone(),
        }
    }
}

/// Drives the spatial engine through one extraction request
pub struct ExtractionService {
    engine: Arc<dyn SpatialEngine>,
    archiver: Arc<dyn Archiver>,
    settings: ExtractionSettings,
}

impl ExtractionService {
    pub fn new(
        engine: Arc<dyn SpatialEngine>,
        archiver: Arc<dyn Archiver>,
        settings: ExtractionSettings,
    ) -> Self {
        Self {
            engine,
            archiver,
            settings,
        }
    }

    /// Run every stage of the extraction; the first failure aborts the run
    ///
    /// `date` stamps the output geodatabase and archive names. A failed run can
    /// leave the output folder partially populated; the next run with the same
    /// folder name replaces it.
    pub async fn run(
        &self,
        request: &ExtractionRequest,
        date: NaiveDate,
    ) -> anyhow::Result<ExtractionReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("extraction", run_id = %run_id, format = %request.format);
        self.run_stages(request, date).instrument(span).await
    }

    async fn run_stages(
        &self,
        request: &ExtractionRequest,
        date: NaiveDate,
    ) -> anyhow::Result<ExtractionReport> {
        request.validate()?;

        self.prepare_working_gdb(&request.gdb_version).await?;
        self.select_clip_area(request).await?;
        let buffer = self.build_buffer(request).await?;
        let clipped = self.clip_features(request, &buffer).await?;

        self.engine
            .select(&self.settings.selection_layer, &self.working(BOUNDARY_NAME))
            .await
            .context("Failed to create boundary feature class")?;

        let layout = OutputLayout::new(
            &self.settings.output_root,
            &request.folder_name,
            &request.gdb_name,
            date,
        );
        match recreate_dir(&layout.folder).await? {
            DirState::Created => {
                info!(folder = %layout.folder.display(), "Created extract workspace")
            }
            DirState::Recreated => {
                info!(folder = %layout.folder.display(), "Overwrote existing extract workspace")
            }
        }

        let plan = request.format.plan();
        let mut report = ExtractionReport::new(request.format, layout.folder.clone());
        report.clipped = clipped;

        if plan.publish_gdb {
            report.cama_joined = self.join_cama(request.include_cama).await?;
        }

        report.contours_derived = self.derive_contours().await?;

        if plan.publish_gdb {
            info!(
                source = %self.settings.working_gdb.display(),
                dest = %layout.gdb.display(),
                "Copying extract geodatabase"
            );
            copy_directory(self.settings.working_gdb.clone(), layout.gdb.clone())
                .await
                .context("Failed to copy working geodatabase")?;
            report.geodatabase = Some(layout.gdb.clone());
        }

        if plan.export_shapefiles {
            report.shapefiles = self.export_shapefiles(&layout.folder).await?;
        }

        if plan.publish_gdb {
            let archive = self
                .archiver
                .archive_dir(layout.gdb.clone(), Some(layout.zip.clone()), true)
                .await
                .context("Failed to archive extract geodatabase")?;
            report.archive = Some(archive);
        }

        info!(folder = %layout.folder.display(), "Extraction complete");
        Ok(report)
    }

    fn working(&self, name: &str) -> PathBuf {
        self.settings.working_gdb.join(name)
    }

    /// Delete and recreate the scratch geodatabase
    async fn prepare_working_gdb(&self, version: &str) -> anyhow::Result<()> {
        let working = &self.settings.working_gdb;
        let name = working
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Working geodatabase path has no name: {}", working.display()))?;
        let parent = working.parent().unwrap_or(Path::new(""));

        info!(gdb = %working.display(), "Preparing working geodatabase");

        self.engine
            .delete_workspace(working)
            .await
            .context("Failed to delete working geodatabase")?;
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.engine
            .create_file_gdb(parent, name, version)
            .await
            .context("Failed to create working geodatabase")?;

        Ok(())
    }

    async fn select_clip_area(&self, request: &ExtractionRequest) -> anyhow::Result<()> {
        let layer = &self.settings.selection_layer;

        self.engine
            .make_feature_layer(&request.clip_feature, layer, None)
            .await
            .context("Failed to create clip feature layer")?;
        self.engine
            .select_layer_by_attribute(layer, &request.filter)
            .await
            .context("Failed to select clip features")?;

        Ok(())
    }

    async fn build_buffer(&self, request: &ExtractionRequest) -> anyhow::Result<PathBuf> {
        let buffer = self.working(BUFFER_NAME);

        info!(distance = %request.buffer_distance, "Creating buffer feature from clip selection");
        if request.buffer_distance.is_zero() {
            info!("Zero buffer distance, buffer follows the selection outline");
        }
        self.engine
            .buffer(&self.settings.selection_layer, &buffer, &request.buffer_distance)
            .await
            .context("Failed to buffer clip features")?;

        Ok(buffer)
    }

    /// Clip every requested feature class to the buffer
    ///
    /// A zero buffer distance takes the same path as any other distance.
    async fn clip_features(
        &self,
        request: &ExtractionRequest,
        buffer: &Path,
    ) -> anyhow::Result<Vec<String>> {
        let clip_feature = request.clip_feature.to_string_lossy();
        let clip_name = last_segment(&clip_feature);

        let mut clipped = Vec::new();
        for name in request.feature_names() {
            info!(feature = %name, clip = %clip_name, "Clipping feature class");

            let input = self.settings.source_workspace.join(&name);
            self.engine
                .clip(&input, buffer, &self.working(&name))
                .await
                .with_context(|| format!("Failed to clip {}", name))?;

            info!(feature = %name, "Clipped feature class");
            clipped.push(name);
        }

        Ok(clipped)
    }

    /// Join CAMA records to the clipped parcels and relate them
    ///
    /// Runs only when requested and a parcel feature class was extracted.
    async fn join_cama(&self, include_cama: bool) -> anyhow::Result<bool> {
        let cama = &self.settings.cama;
        let parcels = self.working(&cama.parcels);

        if !include_cama {
            info!("CAMA records not requested");
            return Ok(false);
        }
        if !self.engine.exists(&parcels).await? {
            info!(parcels = %parcels.display(), "No parcels extracted, skipping CAMA records");
            return Ok(false);
        }

        info!("Adding CAMA records and relationship class");

        let records = self.working(&cama.records);
        let view = &cama.view_name;

        self.engine
            .make_table_view(&self.settings.source_workspace.join(&cama.table), view, &cama.fields)
            .await
            .context("Failed to create CAMA table view")?;
        self.engine
            .add_join(view, &cama.join_key, &parcels, &cama.join_key, JoinType::KeepCommon)
            .await
            .context("Failed to join CAMA records to parcels")?;
        self.engine
            .table_select(view, &records, None)
            .await
            .context("Failed to copy CAMA records")?;

        let relationship = RelationshipClass {
            origin: records,
            destination: parcels,
            output: self.working(&cama.relationship),
            forward_label: cama.parcels.clone(),
            backward_label: cama.records.clone(),
            message_direction: MessageDirection::Both,
            cardinality: Cardinality::OneToOne,
            origin_primary_key: cama.relationship_key.clone(),
            origin_foreign_key: cama.relationship_key.clone(),
        };
        self.engine
            .create_relationship_class(&relationship)
            .await
            .context("Failed to create CAMA relationship class")?;

        self.engine
            .remove_join(view)
            .await
            .context("Failed to remove CAMA join")?;

        Ok(true)
    }

    /// Derive the index-contour subset when two-foot contours were extracted
    async fn derive_contours(&self) -> anyhow::Result<bool> {
        let contours = &self.settings.contours;
        let source = self.working(&contours.source);

        if !self.engine.exists(&source).await? {
            return Ok(false);
        }

        let output = self.working(&contours.output);
        info!(output = %output.display(), "Selecting index contours");

        self.engine
            .make_feature_layer(&source, &contours.layer_name, Some(&contours.filter))
            .await
            .context("Failed to create contour layer")?;
        self.engine
            .select(&contours.layer_name, &output)
            .await
            .context("Failed to select index contours")?;
        self.engine
            .delete_layer(&contours.layer_name)
            .await
            .context("Failed to release contour layer")?;

        Ok(true)
    }

    async fn export_shapefiles(&self, folder: &Path) -> anyhow::Result<Vec<String>> {
        let working = &self.settings.working_gdb;
        let feature_classes = self
            .engine
            .list_feature_classes(working)
            .await
            .context("Failed to list working feature classes")?;

        info!(count = feature_classes.len(), "Converting feature classes to shapefiles");
        for name in &feature_classes {
            info!(feature = %name, "Converting feature class to shapefile");
            self.engine
                .feature_class_to_shapefile(&working.join(name), folder)
                .await
                .with_context(|| format!("Failed to convert {} to shapefile", name))?;
        }

        Ok(feature_classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archiver::ZipArchiver;
    use crate::extract::request::OutputFormat;
    use crate::test_helpers::{self, read_entries, sample_request, test_settings, FakeEngine};
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn setup_service(engine: Arc<FakeEngine>) -> (ExtractionService, TempDir) {
        let temp_dir = test_helpers::create_temp_dir();
        let service = ExtractionService::new(
            engine,
            Arc::new(ZipArchiver::new()),
            test_settings(temp_dir.path()),
        );
        (service, temp_dir)
    }

    fn request_folder(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join("requests").join("Smith_Request")
    }

    #[tokio::test]
    async fn test_file_geodatabase_produces_archive() {
        let engine = Arc::new(FakeEngine::new());
        let (service, temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(
            OutputFormat::FileGeodatabase,
            &[r"GIS.sde\County.GIS.Parcels", "County.GIS.Roads"],
            false,
        );

        let report = service.run(&request, date()).await.unwrap();

        let folder = request_folder(&temp_dir);
        let zip = folder.join("County_20240315.zip");
        assert_eq!(report.archive, Some(zip.clone()));
        assert_eq!(report.geodatabase, Some(folder.join("County_20240315.gdb")));
        assert!(report.shapefiles.is_empty());
        assert!(!engine.called("feature_class_to_shapefile"));

        let names: Vec<String> = read_entries(&zip)
            .unwrap()
            .into_iter()
            .filter(|e| !e.is_dir())
            .map(|e| e.path)
            .collect();
        assert_eq!(
            names,
            vec![
                "County_20240315.gdb/Boundary".to_string(),
                "County_20240315.gdb/Buffered_Area".to_string(),
                "County_20240315.gdb/Parcels".to_string(),
                "County_20240315.gdb/Roads".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_shapefile_produces_no_archive() {
        let engine = Arc::new(FakeEngine::new());
        let (service, temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::Shapefile, &["County.GIS.Roads"], true);

        let report = service.run(&request, date()).await.unwrap();

        let folder = request_folder(&temp_dir);
        assert_eq!(report.archive, None);
        assert_eq!(report.geodatabase, None);
        assert!(!folder.join("County_20240315.zip").exists());
        assert!(!folder.join("County_20240315.gdb").exists());
        assert_eq!(report.shapefiles, vec!["Boundary", "Buffered_Area", "Roads"]);
        assert!(folder.join("Roads.shp").is_file());
        assert!(folder.join("Boundary.shp").is_file());
        // CAMA only rides along with the geodatabase output
        assert!(!report.cama_joined);
        assert!(!engine.called("add_join"));
    }

    #[tokio::test]
    async fn test_both_produces_archive_and_shapefiles() {
        let engine = Arc::new(FakeEngine::new());
        let (service, temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::Both, &["County.GIS.Hydrants"], false);

        let report = service.run(&request, date()).await.unwrap();

        let folder = request_folder(&temp_dir);
        assert!(folder.join("County_20240315.zip").is_file());
        assert!(folder.join("County_20240315.gdb").join("Hydrants").is_file());
        assert!(folder.join("Hydrants.shp").is_file());
        assert_eq!(report.shapefiles.len(), 3);

        let ops = engine.ops();
        let last_shapefile = ops.iter().rposition(|op| *op == "feature_class_to_shapefile");
        assert_eq!(last_shapefile, Some(ops.len() - 1));
    }

    #[tokio::test]
    async fn test_stage_order_and_explicit_paths() {
        let engine = Arc::new(FakeEngine::new());
        let (service, temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::FileGeodatabase, &[r"GIS.sde\County.GIS.Parcels"], false);

        service.run(&request, date()).await.unwrap();

        let working = temp_dir.path().join("scratch").join("Extractor.gdb");
        let calls = engine.calls();
        let ops: Vec<_> = calls.iter().map(|c| c.op).collect();
        assert_eq!(
            &ops[..6],
            &[
                "delete_workspace",
                "create_file_gdb",
                "make_feature_layer",
                "select_layer_by_attribute",
                "buffer",
                "clip",
            ]
        );
        assert_eq!(calls[3].args, vec!["Feature_Select", "MUNI_NAME = 'York City'"]);
        assert_eq!(calls[4].args[2], "500 Feet");
        assert_eq!(
            calls[5].args,
            vec![
                Path::new("GIS.sde").join("Parcels").display().to_string(),
                working.join("Buffered_Area").display().to_string(),
                working.join("Parcels").display().to_string(),
            ]
        );
        assert_eq!(calls[6].op, "select");
        assert_eq!(calls[6].args[1], working.join("Boundary").display().to_string());
    }

    #[tokio::test]
    async fn test_zero_buffer_still_buffers_and_clips() {
        let engine = Arc::new(FakeEngine::new());
        let (service, _temp_dir) = setup_service(Arc::clone(&engine));
        let mut request = sample_request(OutputFormat::Shapefile, &["County.GIS.Roads"], false);
        request.buffer_distance = "0".parse().unwrap();

        let report = service.run(&request, date()).await.unwrap();

        assert!(engine.called("buffer"));
        assert_eq!(report.clipped, vec!["Roads"]);
    }

    #[tokio::test]
    async fn test_cama_join_when_requested_and_parcels_extracted() {
        let engine = Arc::new(FakeEngine::new());
        let (service, temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::FileGeodatabase, &["County.GIS.Parcels"], true);

        let report = service.run(&request, date()).await.unwrap();

        assert!(report.cama_joined);
        let ops = engine.ops();
        let join_ops: Vec<_> = ops
            .iter()
            .filter(|op| {
                matches!(
                    **op,
                    "make_table_view" | "add_join" | "table_select" | "create_relationship_class" | "remove_join"
                )
            })
            .collect();
        assert_eq!(
            join_ops,
            vec![
                &"make_table_view",
                &"add_join",
                &"table_select",
                &"create_relationship_class",
                &"remove_join",
            ]
        );

        let add_join = engine.calls().into_iter().find(|c| c.op == "add_join").unwrap();
        assert_eq!(add_join.args[1], "PIDN");
        assert_eq!(add_join.args[4], "KeepCommon");

        let gdb = request_folder(&temp_dir).join("County_20240315.gdb");
        assert!(gdb.join("CAMA_Records").is_file());
        assert!(gdb.join("CAMA_Records_Parcels").is_file());
    }

    #[tokio::test]
    async fn test_cama_skipped_without_flag() {
        let engine = Arc::new(FakeEngine::new());
        let (service, _temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::Both, &["County.GIS.Parcels"], false);

        let report = service.run(&request, date()).await.unwrap();

        assert!(!report.cama_joined);
        assert!(!engine.called("make_table_view"));
    }

    #[tokio::test]
    async fn test_cama_skipped_without_parcels() {
        let engine = Arc::new(FakeEngine::new());
        let (service, _temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::FileGeodatabase, &["County.GIS.Roads"], true);

        let report = service.run(&request, date()).await.unwrap();

        assert!(!report.cama_joined);
        assert!(!engine.called("add_join"));
    }

    #[tokio::test]
    async fn test_contour_subset_derived_when_present() {
        let engine = Arc::new(FakeEngine::new());
        let (service, temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::FileGeodatabase, &["County.GIS.Contours_2FT"], false);

        let report = service.run(&request, date()).await.unwrap();

        assert!(report.contours_derived);
        let layer = engine
            .calls()
            .into_iter()
            .find(|c| c.op == "make_feature_layer" && c.args[1] == "Contours_Index")
            .unwrap();
        assert_eq!(
            layer.args[2],
            "CONT_TYPE = 'INDEX DEPRESSION' OR CONT_TYPE = 'INDEX CONTOUR'"
        );
        assert!(engine.called("delete_layer"));
        let gdb = request_folder(&temp_dir).join("County_20240315.gdb");
        assert!(gdb.join("Contours_10FT").is_file());
    }

    #[tokio::test]
    async fn test_contour_subset_skipped_when_absent() {
        let engine = Arc::new(FakeEngine::new());
        let (service, _temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::Shapefile, &["County.GIS.Roads"], false);

        let report = service.run(&request, date()).await.unwrap();

        assert!(!report.contours_derived);
        assert!(!engine.called("delete_layer"));
    }

    #[tokio::test]
    async fn test_rerun_replaces_output_folder() {
        let engine = Arc::new(FakeEngine::new());
        let (service, temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(OutputFormat::FileGeodatabase, &["County.GIS.Roads"], false);

        service.run(&request, date()).await.unwrap();
        let folder = request_folder(&temp_dir);
        std::fs::write(folder.join("stale.txt"), "left over").unwrap();

        service.run(&request, date()).await.unwrap();

        assert!(!folder.join("stale.txt").exists());
        assert!(folder.join("County_20240315.zip").is_file());
    }

    #[tokio::test]
    async fn test_engine_failure_aborts_run() {
        let engine = Arc::new(FakeEngine::failing_on("clip"));
        let (service, temp_dir) = setup_service(Arc::clone(&engine));
        let request = sample_request(
            OutputFormat::Both,
            &["County.GIS.Parcels", "County.GIS.Roads"],
            true,
        );

        let result = service.run(&request, date()).await;

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to clip Parcels"));
        assert!(message.contains("simulated engine error"));
        assert_eq!(engine.ops().iter().filter(|op| **op == "clip").count(), 1);
        assert!(!request_folder(&temp_dir).exists());
    }

    #[tokio::test]
    async fn test_invalid_folder_name_rejected_before_engine_calls() {
        let engine = Arc::new(FakeEngine::new());
        let (service, _temp_dir) = setup_service(Arc::clone(&engine));
        let mut request = sample_request(OutputFormat::Both, &["County.GIS.Roads"], false);
        request.folder_name = "..".to_string();

        let result = service.run(&request, date()).await;

        assert!(result.is_err());
        assert!(engine.calls().is_empty());
    }
}
