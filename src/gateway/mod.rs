//! Persistence gateway boundary.
//!
//! The engine never talks to storage directly. It hands the full collection
//! and layout to a [`PersistenceGateway`] and adopts whatever copy the
//! gateway returns as authoritative.
//!
//! Two implementations ship with the crate:
//! - [`MemoryGateway`]: in-process store with failure injection, for tests
//!   and embedding.
//! - [`JsonFileGateway`]: one JSON document per portal on local disk.

mod file;
mod memory;

pub use file::JsonFileGateway;
pub use memory::{MemoryGateway, SaveGate};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::collection::SectionCollection;
use crate::error::GatewayError;
use crate::layout::LayoutConfig;

/// Identifies which portal a layout belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaveContext {
    pub job_id: String,
    pub profile_id: String,
}

impl SaveContext {
    pub fn new(job_id: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            profile_id: profile_id.into(),
        }
    }
}

/// Everything that is persisted for one portal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedLayout {
    pub collection: SectionCollection,
    #[serde(default)]
    pub layout_config: LayoutConfig,
}

/// Payload of a single save call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub collection: SectionCollection,
    pub layout_config: LayoutConfig,
    pub context: SaveContext,
}

/// Durable storage for portal layouts.
///
/// Implementations must be shareable across tasks. Futures are boxed so the
/// trait stays object safe and can be injected as `Arc<dyn PersistenceGateway>`.
pub trait PersistenceGateway: Send + Sync {
    /// Fetch the stored layout for a portal. `Ok(None)` when nothing has
    /// been saved yet.
    fn load<'a>(
        &'a self,
        context: &'a SaveContext,
    ) -> BoxFuture<'a, Result<Option<SavedLayout>, GatewayError>>;

    /// Store a layout and return the authoritative copy.
    fn save(&self, request: SaveRequest) -> BoxFuture<'_, Result<SavedLayout, GatewayError>>;
}

/// Re-encodes a request through JSON, the way it would cross a wire.
///
/// Drops transient section status and normalizes orders.
pub(crate) fn through_json(request: &SaveRequest) -> Result<SavedLayout, GatewayError> {
    let value = serde_json::to_value(SavedLayout {
        collection: request.collection.clone(),
        layout_config: request.layout_config,
    })
    .map_err(|e| GatewayError::Encode(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| GatewayError::Encode(e.to_string()))
}
