//! Events the engine emits to its host.
//!
//! Events are broadcast synchronously right after the state transition that
//! caused them, before any save. Hosts subscribe with
//! [`SectionLayoutEngine::subscribe`](super::SectionLayoutEngine::subscribe).

use serde_json::Value;

use super::state::EngineStatus;
use crate::collection::SectionCollection;
use crate::layout::LayoutConfig;
use crate::section::SectionId;

/// Notification of an engine state change.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Section order or membership changed (move, add, delete, reset, discard).
    SectionsReordered {
        /// The collection after the change.
        collection: SectionCollection,
    },
    /// A section was shown or hidden.
    SectionToggled { id: SectionId, visible: bool },
    /// A section's data payload was replaced.
    SectionEdited { id: SectionId, data: Value },
    /// An operation on a section was rejected, or its renderer failed.
    SectionError { id: SectionId, error: String },
    /// Layout preferences changed.
    LayoutChanged { layout_config: LayoutConfig },
    /// The engine moved between Clean, Dirty and Saving.
    StatusChanged { status: EngineStatus },
}
