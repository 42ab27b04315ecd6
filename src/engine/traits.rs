// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::path::Path;

use crate::engine::models::{BufferDistance, FieldVisibility, JoinType, RelationshipClass};

/// Operations the extraction workflow needs from a spatial analysis engine
///
/// Datasets are always addressed by full path (workspace joined with dataset
/// name). Layers and table views are named, engine-side handles that live for
/// the duration of the run.
#[async_trait]
pub trait SpatialEngine: Send + Sync {
    /// Create a file geodatabase named `name` inside `parent`
    async fn create_file_gdb(&self, parent: &Path, name: &str, version: &str) -> anyhow::Result<()>;

    /// Delete a workspace and everything in it. Missing workspaces are not an error.
    async fn delete_workspace(&self, workspace: &Path) -> anyhow::Result<()>;

    /// Release a layer or table view
    async fn delete_layer(&self, layer: &str) -> anyhow::Result<()>;

    /// Check whether a dataset exists
    async fn exists(&self, dataset: &Path) -> anyhow::Result<bool>;

    async fn make_feature_layer(
        &self,
        source: &Path,
        layer: &str,
        filter: Option<&str>,
    ) -> anyhow::Result<()>;

    /// Replace the layer's selection with the rows matching `predicate`
    async fn select_layer_by_attribute(&self, layer: &str, predicate: &str) -> anyhow::Result<()>;

    async fn buffer(
        &self,
        layer: &str,
        output: &Path,
        distance: &BufferDistance,
    ) -> anyhow::Result<()>;

    /// Clip `input` to the boundary of `clip_features`, writing `output`
    async fn clip(&self, input: &Path, clip_features: &Path, output: &Path) -> anyhow::Result<()>;

    /// Copy the selected features of a layer into a new feature class
    async fn select(&self, layer: &str, output: &Path) -> anyhow::Result<()>;

    async fn make_table_view(
        &self,
        source: &Path,
        view: &str,
        fields: &[FieldVisibility],
    ) -> anyhow::Result<()>;

    async fn add_join(
        &self,
        view: &str,
        key: &str,
        join_table: &Path,
        join_key: &str,
        join_type: JoinType,
    ) -> anyhow::Result<()>;

    /// Copy the rows of a table view into a new table
    async fn table_select(
        &self,
        view: &str,
        output: &Path,
        predicate: Option<&str>,
    ) -> anyhow::Result<()>;

    async fn create_relationship_class(&self, relationship: &RelationshipClass) -> anyhow::Result<()>;

    async fn remove_join(&self, view: &str) -> anyhow::Result<()>;

    /// Names of the feature classes stored in a workspace
    async fn list_feature_classes(&self, workspace: &Path) -> anyhow::Result<Vec<String>>;

    /// Export a feature class as a shapefile into `output_folder`
    async fn feature_class_to_shapefile(&self, input: &Path, output_folder: &Path) -> anyhow::Result<()>;
}
