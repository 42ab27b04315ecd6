// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::engine::models::{
    field_info, BufferDistance, FieldVisibility, JoinType, RelationshipClass,
};
use crate::engine::traits::SpatialEngine;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Invalid engine URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported engine URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Engine returned {status} for {operation}: {body}")]
    Status {
        operation: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{operation} failed: {message}")]
    Failed { operation: String, message: String },

    #[error("Unexpected result for {operation}: {result}")]
    UnexpectedResult { operation: String, result: Value },
}

#[derive(Serialize)]
struct OperationRequest<'a> {
    operation: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum OperationStatus {
    Succeeded,
    Failed,
}

#[derive(Deserialize)]
struct OperationResponse {
    status: OperationStatus,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    messages: Vec<String>,
}

/// Spatial engine backed by a remote geoprocessing service
///
/// Each operation is one `POST <base>/execute` carrying
/// `{"operation": ..., "params": {...}}`.
#[derive(Debug, Clone)]
pub struct HttpSpatialEngine {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl HttpSpatialEngine {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self, EngineError> {
        let base = Url::parse(base_url)?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(EngineError::UnsupportedScheme(base.scheme().to_string()));
        }
        let endpoint = Url::parse(&format!("{}/execute", base.as_str().trim_end_matches('/')))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("DataExtractor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    async fn execute(&self, operation: &str, params: Value) -> Result<Value, EngineError> {
        debug!(operation, "Submitting geoprocessing operation");

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&OperationRequest { operation, params });

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(operation, status = %status, body = %body, "Geoprocessing request rejected");
            return Err(EngineError::Status {
                operation: operation.to_string(),
                status,
                body,
            });
        }

        let response: OperationResponse = response.json().await?;
        for message in &response.messages {
            debug!(operation, message = %message, "Engine message");
        }

        match response.status {
            OperationStatus::Succeeded => Ok(response.result),
            OperationStatus::Failed => Err(EngineError::Failed {
                operation: operation.to_string(),
                message: response.messages.join("; "),
            }),
        }
    }

    async fn run(&self, operation: &str, params: Value) -> anyhow::Result<()> {
        self.execute(operation, params).await?;
        Ok(())
    }
}

#[async_trait]
impl SpatialEngine for HttpSpatialEngine {
    async fn create_file_gdb(&self, parent: &Path, name: &str, version: &str) -> anyhow::Result<()> {
        self.run(
            "create_file_gdb",
            json!({ "parent": path_str(parent), "name": name, "version": version }),
        )
        .await
    }

    async fn delete_workspace(&self, workspace: &Path) -> anyhow::Result<()> {
        self.run(
            "delete",
            json!({ "dataset": path_str(workspace), "data_type": "Workspace" }),
        )
        .await
    }

    async fn delete_layer(&self, layer: &str) -> anyhow::Result<()> {
        self.run("delete", json!({ "dataset": layer })).await
    }

    async fn exists(&self, dataset: &Path) -> anyhow::Result<bool> {
        let result = self
            .execute("exists", json!({ "dataset": path_str(dataset) }))
            .await?;

        result.as_bool().ok_or_else(|| {
            EngineError::UnexpectedResult {
                operation: "exists".to_string(),
                result,
            }
            .into()
        })
    }

    async fn make_feature_layer(
        &self,
        source: &Path,
        layer: &str,
        filter: Option<&str>,
    ) -> anyhow::Result<()> {
        self.run(
            "make_feature_layer",
            json!({ "source": path_str(source), "layer": layer, "where": filter }),
        )
        .await
    }

    async fn select_layer_by_attribute(&self, layer: &str, predicate: &str) -> anyhow::Result<()> {
        self.run(
            "select_layer_by_attribute",
            json!({ "layer": layer, "selection_type": "NEW_SELECTION", "where": predicate }),
        )
        .await
    }

    async fn buffer(
        &self,
        layer: &str,
        output: &Path,
        distance: &BufferDistance,
    ) -> anyhow::Result<()> {
        self.run(
            "buffer",
            json!({ "input": layer, "output": path_str(output), "distance": distance.to_string() }),
        )
        .await
    }

    async fn clip(&self, input: &Path, clip_features: &Path, output: &Path) -> anyhow::Result<()> {
        self.run(
            "clip",
            json!({
                "input": path_str(input),
                "clip_features": path_str(clip_features),
                "output": path_str(output),
            }),
        )
        .await
    }

    async fn select(&self, layer: &str, output: &Path) -> anyhow::Result<()> {
        self.run("select", json!({ "input": layer, "output": path_str(output) }))
            .await
    }

    async fn make_table_view(
        &self,
        source: &Path,
        view: &str,
        fields: &[FieldVisibility],
    ) -> anyhow::Result<()> {
        self.run(
            "make_table_view",
            json!({ "source": path_str(source), "view": view, "field_info": field_info(fields) }),
        )
        .await
    }

    async fn add_join(
        &self,
        view: &str,
        key: &str,
        join_table: &Path,
        join_key: &str,
        join_type: JoinType,
    ) -> anyhow::Result<()> {
        self.run(
            "add_join",
            json!({
                "view": view,
                "key": key,
                "join_table": path_str(join_table),
                "join_key": join_key,
                "join_type": join_type,
            }),
        )
        .await
    }

    async fn table_select(
        &self,
        view: &str,
        output: &Path,
        predicate: Option<&str>,
    ) -> anyhow::Result<()> {
        self.run(
            "table_select",
            json!({ "view": view, "output": path_str(output), "where": predicate }),
        )
        .await
    }

    async fn create_relationship_class(&self, relationship: &RelationshipClass) -> anyhow::Result<()> {
        let params = serde_json::to_value(relationship)?;
        self.run("create_relationship_class", params).await
    }

    async fn remove_join(&self, view: &str) -> anyhow::Result<()> {
        self.run("remove_join", json!({ "view": view })).await
    }

    async fn list_feature_classes(&self, workspace: &Path) -> anyhow::Result<Vec<String>> {
        let result = self
            .execute("list_feature_classes", json!({ "workspace": path_str(workspace) }))
            .await?;

        serde_json::from_value(result.clone()).map_err(|_| {
            EngineError::UnexpectedResult {
                operation: "list_feature_classes".to_string(),
                result,
            }
            .into()
        })
    }

    async fn feature_class_to_shapefile(&self, input: &Path, output_folder: &Path) -> anyhow::Result<()> {
        self.run(
            "feature_class_to_shapefile",
            json!({ "input": path_str(input), "output_folder": path_str(output_folder) }),
        )
        .await
    }
}
