//! Engine state snapshot and status.

use std::fmt;

use serde::Serialize;

use crate::collection::SectionCollection;
use crate::error::PersistError;
use crate::layout::LayoutConfig;

/// Persistence status of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineStatus {
    /// Local state matches the last save.
    Clean,
    /// Local state has unsaved changes.
    Dirty,
    /// A save is in flight.
    Saving,
}

impl EngineStatus {
    pub(crate) fn from_flags(dirty: bool, saving: bool) -> Self {
        if saving {
            EngineStatus::Saving
        } else if dirty {
            EngineStatus::Dirty
        } else {
            EngineStatus::Clean
        }
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineStatus::Clean => "clean",
            EngineStatus::Dirty => "dirty",
            EngineStatus::Saving => "saving",
        };
        write!(f, "{}", s)
    }
}

/// Read-only snapshot of the engine.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub collection: SectionCollection,
    pub layout_config: LayoutConfig,
    /// Unsaved changes exist.
    pub dirty: bool,
    /// A save is in flight.
    pub saving: bool,
    /// Failure of the most recent save, cleared by the next success.
    pub last_error: Option<PersistError>,
}

impl EngineState {
    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_flags(self.dirty, self.saving)
    }
}
