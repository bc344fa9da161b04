//! Error types for section operations and the save flow.
//!
//! Nothing in the engine panics on bad input: collection operations return
//! [`SectionError`], saves return [`SaveError`], and gateway implementations
//! report [`GatewayError`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::registry::SectionType;
use crate::section::SectionId;

/// Rejected collection operation. The collection is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionError {
    /// Attempt to hide or delete a required section.
    #[error("Section '{id}' ({section_type}) is required and cannot be hidden or deleted")]
    RequiredSection {
        /// The protected section.
        id: SectionId,
        /// Its type.
        section_type: SectionType,
    },

    /// The operation referenced a section id that is not in the collection.
    #[error("Section not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: SectionId,
    },

    /// A second section of a single-instance type was requested.
    #[error("A {section_type} section already exists")]
    DuplicateType {
        /// The type that already exists.
        section_type: SectionType,
    },

    /// Two sections in a loaded collection share an id.
    #[error("Duplicate section id: {id}")]
    DuplicateId {
        /// The repeated id.
        id: SectionId,
    },
}

impl SectionError {
    /// Id of the section the error is about, if any.
    pub fn section_id(&self) -> Option<&SectionId> {
        match self {
            SectionError::RequiredSection { id, .. }
            | SectionError::NotFound { id }
            | SectionError::DuplicateId { id } => Some(id),
            SectionError::DuplicateType { .. } => None,
        }
    }
}

/// Failure reported by a [`PersistenceGateway`](crate::gateway::PersistenceGateway).
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Storage I/O failed.
    #[error("Storage I/O failed at {path}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Stored document could not be parsed.
    #[error("Invalid stored layout at {path}: {message}")]
    Parse {
        /// Path of the document.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The layout could not be encoded for storage.
    #[error("Failed to encode layout: {0}")]
    Encode(String),

    /// The remote side refused or could not be reached.
    #[error("Persistence unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GatewayError::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// A save reached the gateway and did not succeed. Local edits are kept.
#[derive(Debug, Clone, Error)]
pub enum PersistError {
    /// The gateway returned an error.
    #[error("Save failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The gateway did not answer within the configured timeout.
    #[error("Save timed out after {}", humantime::format_duration(*after))]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },
}

/// Result of a rejected or failed [`save`](crate::engine::SectionLayoutEngine::save).
#[derive(Debug, Clone, Error)]
pub enum SaveError {
    /// Another save is already in flight.
    #[error("A save is already in progress")]
    ConcurrentSave,

    /// The in-flight save failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Operation refused because a save is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot discard changes while a save is in progress")]
pub struct SaveInFlight;
