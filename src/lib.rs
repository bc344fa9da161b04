//! Section layout engine for candidate portals.
//!
//! A portal is an ordered list of typed content sections (header, summary,
//! experience, skills, ...) plus layout preferences. This crate keeps that
//! list consistent while a user reorders, hides, adds, deletes and edits
//! sections, and pushes the result to a persistence backend.
//!
//! - [`registry`]: section type metadata and the required-section rule
//! - [`collection`]: pure, order-preserving collection operations
//! - [`layout`]: portal-wide layout preferences
//! - [`engine`]: the `Clean` / `Dirty` / `Saving` state machine and events
//! - [`gateway`]: the persistence boundary and its two implementations
//! - [`dnd`]: drag-and-drop adapter
//! - [`render`]: text rendering of a portal
//! - [`config`] and [`logging`]: ambient setup for the CLI

pub mod collection;
pub mod config;
pub mod dnd;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod layout;
pub mod logging;
pub mod registry;
pub mod render;
pub mod section;

pub use collection::SectionCollection;
pub use engine::{Change, EngineEvent, EngineOptions, EngineState, EngineStatus, SectionLayoutEngine};
pub use error::{GatewayError, PersistError, SaveError, SaveInFlight, SectionError};
pub use gateway::{JsonFileGateway, MemoryGateway, PersistenceGateway, SaveContext, SavedLayout};
pub use layout::{LayoutConfig, LayoutConfigPatch, LayoutKind, Spacing};
pub use registry::{SectionType, SectionTypeConfig, SectionTypeRegistry};
pub use section::{Section, SectionId, SectionStatus};
