// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Mutex;
use zip::ZipArchive;

use crate::config::Config;
use crate::engine::{BufferDistance, FieldVisibility, JoinType, RelationshipClass, SpatialEngine};
use crate::extract::{ExtractionRequest, ExtractionSettings, OutputFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub op: &'static str,
    pub args: Vec<String>,
}

/// In-process engine that records every call
///
/// Geodatabases are plain directories and every derived dataset is a small
/// file inside one, so the filesystem steps around the engine see real data.
#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<EngineCall>>,
    fail_on: Option<&'static str>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose `op` calls fail
    pub fn failing_on(op: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(op),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|c| c.op).collect()
    }

    pub fn called(&self, op: &str) -> bool {
        self.calls().iter().any(|c| c.op == op)
    }

    fn record(&self, op: &'static str, args: Vec<String>) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(EngineCall { op, args });
        if self.fail_on == Some(op) {
            anyhow::bail!("{} failed: simulated engine error", op);
        }
        Ok(())
    }
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

fn write_dataset(path: &Path, origin: &str) -> anyhow::Result<()> {
    std::fs::write(path, origin)?;
    Ok(())
}

#[async_trait]
impl SpatialEngine for FakeEngine {
    async fn create_file_gdb(&self, parent: &Path, name: &str, version: &str) -> anyhow::Result<()> {
        self.record("create_file_gdb", vec![arg(parent), name.to_string(), version.to_string()])?;
        std::fs::create_dir_all(parent.join(name))?;
        Ok(())
    }

    async fn delete_workspace(&self, workspace: &Path) -> anyhow::Result<()> {
        self.record("delete_workspace", vec![arg(workspace)])?;
        if workspace.exists() {
            std::fs::remove_dir_all(workspace)?;
        }
        Ok(())
    }

    async fn delete_layer(&self, layer: &str) -> anyhow::Result<()> {
        self.record("delete_layer", vec![layer.to_string()])
    }

    async fn exists(&self, dataset: &Path) -> anyhow::Result<bool> {
        self.record("exists", vec![arg(dataset)])?;
        Ok(dataset.exists())
    }

    async fn make_feature_layer(
        &self,
        source: &Path,
        layer: &str,
        filter: Option<&str>,
    ) -> anyhow::Result<()> {
        self.record(
            "make_feature_layer",
            vec![arg(source), layer.to_string(), filter.unwrap_or_default().to_string()],
        )
    }

    async fn select_layer_by_attribute(&self, layer: &str, predicate: &str) -> anyhow::Result<()> {
        self.record("select_layer_by_attribute", vec![layer.to_string(), predicate.to_string()])
    }

    async fn buffer(
        &self,
        layer: &str,
        output: &Path,
        distance: &BufferDistance,
    ) -> anyhow::Result<()> {
        self.record("buffer", vec![layer.to_string(), arg(output), distance.to_string()])?;
        write_dataset(output, &format!("buffer of {}", layer))
    }

    async fn clip(&self, input: &Path, clip_features: &Path, output: &Path) -> anyhow::Result<()> {
        self.record("clip", vec![arg(input), arg(clip_features), arg(output)])?;
        write_dataset(output, &format!("clip of {}", input.display()))
    }

    async fn select(&self, layer: &str, output: &Path) -> anyhow::Result<()> {
        self.record("select", vec![layer.to_string(), arg(output)])?;
        write_dataset(output, &format!("selection of {}", layer))
    }

    async fn make_table_view(
        &self,
        source: &Path,
        view: &str,
        fields: &[FieldVisibility],
    ) -> anyhow::Result<()> {
        self.record(
            "make_table_view",
            vec![arg(source), view.to_string(), fields.len().to_string()],
        )
    }

    async fn add_join(
        &self,
        view: &str,
        key: &str,
        join_table: &Path,
        join_key: &str,
        join_type: JoinType,
    ) -> anyhow::Result<()> {
        self.record(
            "add_join",
            vec![
                view.to_string(),
                key.to_string(),
                arg(join_table),
                join_key.to_string(),
                format!("{:?}", join_type),
            ],
        )
    }

    async fn table_select(
        &self,
        view: &str,
        output: &Path,
        predicate: Option<&str>,
    ) -> anyhow::Result<()> {
        self.record(
            "table_select",
            vec![view.to_string(), arg(output), predicate.unwrap_or_default().to_string()],
        )?;
        write_dataset(output, &format!("rows of {}", view))
    }

    async fn create_relationship_class(&self, relationship: &RelationshipClass) -> anyhow::Result<()> {
        self.record(
            "create_relationship_class",
            vec![
                arg(&relationship.origin),
                arg(&relationship.destination),
                arg(&relationship.output),
            ],
        )?;
        write_dataset(&relationship.output, "relationship class")
    }

    async fn remove_join(&self, view: &str) -> anyhow::Result<()> {
        self.record("remove_join", vec![view.to_string()])
    }

    async fn list_feature_classes(&self, workspace: &Path) -> anyhow::Result<Vec<String>> {
        self.record("list_feature_classes", vec![arg(workspace)])?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(workspace)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn feature_class_to_shapefile(&self, input: &Path, output_folder: &Path) -> anyhow::Result<()> {
        self.record("feature_class_to_shapefile", vec![arg(input), arg(output_folder)])?;
        let name = input
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Feature class without a name"))?;
        let mut shapefile = output_folder.join(name);
        shapefile.set_extension("shp");
        write_dataset(&shapefile, &format!("shapefile of {}", input.display()))
    }
}

/// Request clipping `features` from the municipal boundary of York City
pub fn sample_request(
    format: OutputFormat,
    features: &[&str],
    include_cama: bool,
) -> ExtractionRequest {
    ExtractionRequest {
        format,
        clip_feature: "GIS.sde/County.GIS.Municipalities".into(),
        filter: "MUNI_NAME = 'York City'".to_string(),
        buffer_distance: "500 Feet".parse().expect("valid buffer distance"),
        features: features.iter().map(|f| f.to_string()).collect(),
        folder_name: "Smith_Request".to_string(),
        gdb_name: "County".to_string(),
        gdb_version: "CURRENT".to_string(),
        include_cama,
    }
}

/// Settings whose output root and working geodatabase live under `root`
pub fn test_settings(root: &Path) -> ExtractionSettings {
    let config = Config {
        output_root: root.join("requests"),
        working_gdb: root.join("scratch").join("Extractor.gdb"),
        source_workspace: "GIS.sde".into(),
        log_level: "error".to_string(),
        ..Config::default()
    };
    ExtractionSettings::from(&config)
}

/// One entry of a finished archive; `contents` is `None` for directory markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub contents: Option<Vec<u8>>,
}

impl ArchiveEntry {
    pub fn is_dir(&self) -> bool {
        self.contents.is_none()
    }
}

/// Read every entry of an archive in stored order
pub fn read_entries(archive_path: &Path) -> anyhow::Result<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(archive_path)?))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let path = file.name().to_string();
        let contents = if file.is_dir() {
            None
        } else {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Some(buf)
        };
        entries.push(ArchiveEntry { path, contents });
    }

    Ok(entries)
}

/// Create a temporary directory for tests
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("Failed to create temp directory")
}
