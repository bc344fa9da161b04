//! JSON-file gateway.
//!
//! Stores each portal as `<root>/<profile_id>/<job_id>.json`. Ids are
//! escaped so that distinct ids never share a file, and each document
//! records its own context, which is checked on load.
//!
//! Writes go to a timestamped temp file that is fsynced and renamed over the
//! target, so a crash mid-save never leaves a truncated document behind.

use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::{through_json, PersistenceGateway, SaveContext, SaveRequest, SavedLayout};
use crate::collection::SectionCollection;
use crate::error::GatewayError;
use crate::layout::LayoutConfig;

/// Current on-disk schema version.
const SCHEMA_VERSION: u32 = 1;

/// On-disk document.
#[derive(Debug, Serialize, Deserialize)]
struct StoredLayout {
    schema_version: u32,
    /// RFC 3339 timestamp of the last save.
    saved_at: String,
    context: SaveContext,
    #[serde(default)]
    layout_config: LayoutConfig,
    sections: SectionCollection,
}

/// Gateway persisting layouts as pretty-printed JSON under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    root: PathBuf,
}

impl JsonFileGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `context`.
    pub fn document_path(&self, context: &SaveContext) -> PathBuf {
        self.root
            .join(path_component(&context.profile_id))
            .join(format!("{}.json", path_component(&context.job_id)))
    }

    async fn read(&self, context: &SaveContext) -> Result<Option<SavedLayout>, GatewayError> {
        let path = self.document_path(context);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No stored layout at {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(GatewayError::io(path, e)),
        };
        let stored: StoredLayout =
            serde_json::from_str(&content).map_err(|e| GatewayError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
        if stored.schema_version > SCHEMA_VERSION {
            return Err(GatewayError::Parse {
                path,
                message: format!("unsupported schema version {}", stored.schema_version),
            });
        }
        if stored.context != *context {
            return Err(GatewayError::Parse {
                path,
                message: format!(
                    "document belongs to profile {:?} job {:?}",
                    stored.context.profile_id, stored.context.job_id
                ),
            });
        }
        Ok(Some(SavedLayout {
            collection: stored.sections,
            layout_config: stored.layout_config,
        }))
    }

    async fn write(&self, request: SaveRequest) -> Result<SavedLayout, GatewayError> {
        let saved = through_json(&request)?;
        let path = self.document_path(&request.context);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GatewayError::io(parent, e))?;
        }

        let now = Utc::now();
        let stored = StoredLayout {
            schema_version: SCHEMA_VERSION,
            saved_at: now.to_rfc3339(),
            context: request.context,
            layout_config: saved.layout_config,
            sections: saved.collection.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| GatewayError::Encode(e.to_string()))?;

        let temp_path = path.with_extension(format!("json.tmp.{}", now.format("%Y%m%d-%H%M%S%f")));
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| GatewayError::io(&temp_path, e))?;

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| GatewayError::io(&temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| GatewayError::io(&temp_path, e))?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(GatewayError::io(&path, e));
        }
        tracing::debug!("Stored {} sections at {:?}", saved.collection.len(), path);
        Ok(saved)
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn load<'a>(
        &'a self,
        context: &'a SaveContext,
    ) -> BoxFuture<'a, Result<Option<SavedLayout>, GatewayError>> {
        self.read(context).boxed()
    }

    fn save(&self, request: SaveRequest) -> BoxFuture<'_, Result<SavedLayout, GatewayError>> {
        self.write(request).boxed()
    }
}

/// Maps an id to a single path component.
///
/// ASCII letters, digits and `-` pass through; every other byte (including
/// `_`) becomes `_xx` in lowercase hex. The mapping is injective, and the
/// empty id maps to a lone `_`, which no escaped id can produce.
fn path_component(id: &str) -> String {
    if id.is_empty() {
        return "_".to_string();
    }
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}
