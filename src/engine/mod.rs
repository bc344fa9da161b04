//! Section layout engine.
//!
//! Owns the editor's working copy of a portal (sections plus layout
//! preferences) and its persistence status. All editing goes through the
//! engine, which applies the pure [`SectionCollection`] operations, tracks
//! the `Clean` / `Dirty` / `Saving` state machine, and pushes changes to a
//! [`PersistenceGateway`] on explicit [`save`](SectionLayoutEngine::save).
//!
//! The engine is a cheap `Clone` handle around shared state, so an editor
//! can keep applying edits while a save future is still pending. The state
//! lock is only taken for synchronous sections and never held across an
//! `.await`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use portal_sections::engine::{EngineOptions, EngineStatus, SectionLayoutEngine};
//! use portal_sections::gateway::MemoryGateway;
//! use portal_sections::registry::SectionType;
//!
//! #[tokio::main]
//! async fn main() {
//!     let gateway = Arc::new(MemoryGateway::new());
//!     let engine = SectionLayoutEngine::open(gateway, EngineOptions::default())
//!         .await
//!         .expect("memory gateway never fails to load");
//!     engine.add_section(SectionType::Projects).expect("projects is new");
//!     assert_eq!(engine.status(), EngineStatus::Dirty);
//!     engine.save().await.expect("save succeeds");
//!     assert_eq!(engine.status(), EngineStatus::Clean);
//! }
//! ```

mod events;
mod state;

#[cfg(test)]
mod tests;

pub use events::EngineEvent;
pub use state::{EngineState, EngineStatus};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;

use crate::collection::SectionCollection;
use crate::error::{GatewayError, PersistError, SaveError, SaveInFlight, SectionError};
use crate::gateway::{PersistenceGateway, SaveContext, SaveRequest, SavedLayout};
use crate::layout::{LayoutConfig, LayoutConfigPatch};
use crate::registry::{SectionType, SectionTypeRegistry};
use crate::section::{SectionId, SectionStatus};

/// Capacity of the event broadcast channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Whether an operation changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// State changed and the engine is now dirty.
    Applied,
    /// The request was a no-op.
    Unchanged,
}

/// Construction options for [`SectionLayoutEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Section type metadata and required-section policy.
    pub registry: SectionTypeRegistry,
    /// Which portal is being edited.
    pub context: SaveContext,
    /// Layout used for new portals and by [`reset`](SectionLayoutEngine::reset).
    pub default_layout: LayoutConfig,
    /// Upper bound on a single gateway save. `None` waits indefinitely.
    pub save_timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            registry: SectionTypeRegistry::builtin(),
            context: SaveContext::default(),
            default_layout: LayoutConfig::default(),
            save_timeout: None,
        }
    }
}

struct Inner {
    collection: SectionCollection,
    layout_config: LayoutConfig,
    dirty: bool,
    saving: bool,
    last_error: Option<PersistError>,
    /// Last state known to be persisted. Restored by `discard`.
    baseline: SavedLayout,
}

impl Inner {
    fn status(&self) -> EngineStatus {
        EngineStatus::from_flags(self.dirty, self.saving)
    }

    fn snapshot(&self) -> EngineState {
        EngineState {
            collection: self.collection.clone(),
            layout_config: self.layout_config,
            dirty: self.dirty,
            saving: self.saving,
            last_error: self.last_error.clone(),
        }
    }

    fn replace_collection(&mut self, collection: SectionCollection) {
        self.collection = collection;
        self.dirty = true;
    }
}

/// Orchestrates section edits, dirty tracking and saves for one portal.
#[derive(Clone)]
pub struct SectionLayoutEngine {
    inner: Arc<Mutex<Inner>>,
    gateway: Arc<dyn PersistenceGateway>,
    options: Arc<EngineOptions>,
    events: broadcast::Sender<EngineEvent>,
}

impl std::fmt::Debug for SectionLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SectionLayoutEngine")
            .field("context", &self.options.context)
            .field("status", &inner.status())
            .field("sections", &inner.collection.len())
            .field("subscriber_count", &self.events.receiver_count())
            .finish()
    }
}

impl SectionLayoutEngine {
    /// Creates an engine in the `Clean` state.
    ///
    /// `seed` is the layout fetched for the portal. `None` or an empty
    /// collection starts from the registry's default sections.
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        options: EngineOptions,
        seed: Option<SavedLayout>,
    ) -> Self {
        let seed = match seed {
            Some(saved) if !saved.collection.is_empty() => saved,
            Some(saved) => SavedLayout {
                collection: SectionCollection::defaults(&options.registry),
                layout_config: saved.layout_config,
            },
            None => SavedLayout {
                collection: SectionCollection::defaults(&options.registry),
                layout_config: options.default_layout,
            },
        };
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);
        let inner = Inner {
            collection: seed.collection.clone(),
            layout_config: seed.layout_config,
            dirty: false,
            saving: false,
            last_error: None,
            baseline: seed,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            gateway,
            options: Arc::new(options),
            events,
        }
    }

    /// Loads the stored layout through the gateway and creates an engine.
    pub async fn open(
        gateway: Arc<dyn PersistenceGateway>,
        options: EngineOptions,
    ) -> Result<Self, GatewayError> {
        let seed = gateway.load(&options.context).await?;
        match &seed {
            Some(saved) => tracing::debug!(
                "Loaded {} sections for {:?}",
                saved.collection.len(),
                options.context
            ),
            None => tracing::debug!("No stored layout for {:?}, using defaults", options.context),
        }
        Ok(Self::new(gateway, options, seed))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of the current state.
    pub fn state(&self) -> EngineState {
        self.lock().snapshot()
    }

    pub fn status(&self) -> EngineStatus {
        self.lock().status()
    }

    pub fn collection(&self) -> SectionCollection {
        self.lock().collection.clone()
    }

    pub fn layout_config(&self) -> LayoutConfig {
        self.lock().layout_config
    }

    pub fn registry(&self) -> &SectionTypeRegistry {
        &self.options.registry
    }

    pub fn context(&self) -> &SaveContext {
        &self.options.context
    }

    /// Subscribe to [`EngineEvent`]s emitted after each state change.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Section operations
    // -----------------------------------------------------------------------

    /// Moves a visible section from `drag_index` to `hover_index`.
    ///
    /// Out-of-range or equal indices are a no-op.
    pub fn move_section(&self, drag_index: usize, hover_index: usize) -> Change {
        self.transact(|inner, events| match inner.collection.try_move(drag_index, hover_index) {
            Some(next) => {
                inner.replace_collection(next);
                events.push(EngineEvent::SectionsReordered {
                    collection: inner.collection.clone(),
                });
                Change::Applied
            }
            None => {
                tracing::trace!("Ignoring move {} -> {}", drag_index, hover_index);
                Change::Unchanged
            }
        })
    }

    /// Shows or hides a section. Required sections cannot be hidden.
    pub fn toggle_visibility(&self, id: &SectionId, visible: bool) -> Result<Change, SectionError> {
        let result = self.transact(|inner, events| {
            let next = inner
                .collection
                .toggle_visibility(&self.options.registry, id, visible)?;
            if next.same_content(&inner.collection) {
                return Ok(Change::Unchanged);
            }
            inner.replace_collection(next);
            events.push(EngineEvent::SectionToggled {
                id: id.clone(),
                visible,
            });
            Ok(Change::Applied)
        });
        self.report("toggle_visibility", result)
    }

    /// Appends a new section of `section_type` and returns its id.
    pub fn add_section(&self, section_type: SectionType) -> Result<SectionId, SectionError> {
        let result = self.transact(|inner, events| {
            let (next, id) = inner.collection.add_section(section_type)?;
            inner.replace_collection(next);
            events.push(EngineEvent::SectionsReordered {
                collection: inner.collection.clone(),
            });
            Ok(id)
        });
        self.report("add_section", result)
    }

    /// Deletes a section. Required sections cannot be deleted.
    pub fn delete_section(&self, id: &SectionId) -> Result<Change, SectionError> {
        let result = self.transact(|inner, events| {
            let (next, removed) = inner
                .collection
                .delete_section(&self.options.registry, id)?;
            tracing::debug!("Deleted {} section {}", removed.section_type, removed.id);
            inner.replace_collection(next);
            events.push(EngineEvent::SectionsReordered {
                collection: inner.collection.clone(),
            });
            Ok(Change::Applied)
        });
        self.report("delete_section", result)
    }

    /// Replaces a section's data payload.
    pub fn edit_section_data(&self, id: &SectionId, data: Value) -> Result<Change, SectionError> {
        let result = self.transact(|inner, events| {
            let current = inner
                .collection
                .get(id)
                .ok_or_else(|| SectionError::NotFound { id: id.clone() })?;
            if current.data == data {
                return Ok(Change::Unchanged);
            }
            let next = inner.collection.edit_section_data(id, data.clone());
            inner.replace_collection(next);
            events.push(EngineEvent::SectionEdited {
                id: id.clone(),
                data,
            });
            Ok(Change::Applied)
        });
        self.report("edit_section_data", result)
    }

    /// Replaces a section's customization payload.
    pub fn edit_section_customization(
        &self,
        id: &SectionId,
        customization: Value,
    ) -> Result<Change, SectionError> {
        let result = self.transact(|inner, _| {
            let current = inner
                .collection
                .get(id)
                .ok_or_else(|| SectionError::NotFound { id: id.clone() })?;
            if current.customization == customization {
                return Ok(Change::Unchanged);
            }
            let next = inner.collection.edit_section_customization(id, customization);
            inner.replace_collection(next);
            Ok(Change::Applied)
        });
        self.report("edit_section_customization", result)
    }

    /// Sets the user label of a section. `None` or a blank name restores the
    /// registry display name.
    pub fn rename_section(&self, id: &SectionId, name: Option<String>) -> Result<Change, SectionError> {
        let result = self.transact(|inner, _| {
            if !inner.collection.contains(id) {
                return Err(SectionError::NotFound { id: id.clone() });
            }
            let next = inner.collection.rename_section(id, name);
            if next.same_content(&inner.collection) {
                return Ok(Change::Unchanged);
            }
            inner.replace_collection(next);
            Ok(Change::Applied)
        });
        self.report("rename_section", result)
    }

    /// Applies a partial layout update.
    pub fn set_layout_config(&self, patch: LayoutConfigPatch) -> Change {
        self.transact(|inner, events| {
            let next = inner.layout_config.apply(patch);
            if next == inner.layout_config {
                return Change::Unchanged;
            }
            inner.layout_config = next;
            inner.dirty = true;
            events.push(EngineEvent::LayoutChanged {
                layout_config: next,
            });
            Change::Applied
        })
    }

    // -----------------------------------------------------------------------
    // Transient render status
    // -----------------------------------------------------------------------

    /// Marks a section as loading or done. Does not dirty the engine.
    pub fn set_section_loading(&self, id: &SectionId, loading: bool) -> Result<(), SectionError> {
        self.transact(|inner, _| {
            let error = inner.collection.get(id).and_then(|s| s.status.error.clone());
            let status = SectionStatus { loading, error };
            if inner.collection.set_status(id, status) {
                Ok(())
            } else {
                Err(SectionError::NotFound { id: id.clone() })
            }
        })
    }

    /// Records (or clears, with `None`) a render failure for a section.
    /// Does not dirty the engine.
    pub fn report_section_error(
        &self,
        id: &SectionId,
        error: Option<String>,
    ) -> Result<(), SectionError> {
        self.transact(|inner, events| {
            let status = SectionStatus {
                loading: false,
                error: error.clone(),
            };
            if !inner.collection.set_status(id, status) {
                return Err(SectionError::NotFound { id: id.clone() });
            }
            if let Some(error) = error {
                events.push(EngineEvent::SectionError {
                    id: id.clone(),
                    error,
                });
            }
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Whole-state operations
    // -----------------------------------------------------------------------

    /// Replaces everything with the registry defaults and default layout.
    ///
    /// Allowed in any state; the result is an unsaved change.
    pub fn reset(&self) {
        self.transact(|inner, events| {
            inner.collection = SectionCollection::defaults(&self.options.registry);
            inner.layout_config = self.options.default_layout;
            inner.dirty = true;
            events.push(EngineEvent::SectionsReordered {
                collection: inner.collection.clone(),
            });
            events.push(EngineEvent::LayoutChanged {
                layout_config: inner.layout_config,
            });
        });
        tracing::info!("Reset portal {:?} to defaults", self.options.context);
    }

    /// Drops unsaved changes and returns to the last saved state.
    pub fn discard(&self) -> Result<Change, SaveInFlight> {
        self.transact(|inner, events| {
            if inner.saving {
                return Err(SaveInFlight);
            }
            if !inner.dirty {
                return Ok(Change::Unchanged);
            }
            let baseline = inner.baseline.clone();
            let reordered = !baseline.collection.same_content(&inner.collection);
            let relaid = baseline.layout_config != inner.layout_config;
            inner.collection = baseline.collection;
            inner.layout_config = baseline.layout_config;
            inner.dirty = false;
            inner.last_error = None;
            if reordered {
                events.push(EngineEvent::SectionsReordered {
                    collection: inner.collection.clone(),
                });
            }
            if relaid {
                events.push(EngineEvent::LayoutChanged {
                    layout_config: inner.layout_config,
                });
            }
            Ok(Change::Applied)
        })
    }

    /// Persists the current state through the gateway.
    ///
    /// - `Clean`: returns the current state without calling the gateway.
    /// - `Saving`: rejected with [`SaveError::ConcurrentSave`].
    /// - `Dirty`: sends a snapshot. On success the gateway's copy becomes the
    ///   local state, unless edits arrived while the save was in flight, in
    ///   which case those edits are kept and the engine stays dirty. On
    ///   failure local edits are kept, the engine returns to `Dirty`, and
    ///   `last_error` is set.
    ///
    /// When edits arrived during the save, the local collection keeps its own
    /// ids even if the gateway assigned new ones. The gateway's copy only
    /// becomes the [`discard`](Self::discard) baseline. The next save sends the
    /// local ids and the gateway's answer to that save is adopted as usual.
    pub async fn save(&self) -> Result<EngineState, SaveError> {
        let request = self.transact(|inner, _| {
            if inner.saving {
                return Err(SaveError::ConcurrentSave);
            }
            if !inner.dirty {
                return Ok(None);
            }
            inner.saving = true;
            Ok(Some(SaveRequest {
                collection: inner.collection.clone(),
                layout_config: inner.layout_config,
                context: self.options.context.clone(),
            }))
        });
        let request = match request {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!("Nothing to save");
                return Ok(self.state());
            }
            Err(err) => {
                tracing::debug!("Save rejected: {}", err);
                return Err(err);
            }
        };

        let sent = SavedLayout {
            collection: request.collection.clone(),
            layout_config: request.layout_config,
        };
        let guard = InFlight::new(self);
        let outcome = self.call_gateway(request).await;
        guard.disarm();

        self.transact(|inner, events| {
            inner.saving = false;
            match outcome {
                Ok(saved) => {
                    inner.last_error = None;
                    let unchanged = inner.collection.same_content(&sent.collection)
                        && inner.layout_config == sent.layout_config;
                    if unchanged {
                        let adopted = carry_status(&inner.collection, saved.collection.clone());
                        if !adopted.same_content(&inner.collection) {
                            events.push(EngineEvent::SectionsReordered {
                                collection: adopted.clone(),
                            });
                        }
                        inner.collection = adopted;
                        inner.layout_config = saved.layout_config;
                        inner.dirty = false;
                        tracing::info!(
                            "Saved {} sections for {:?}",
                            inner.collection.len(),
                            self.options.context
                        );
                    } else {
                        inner.dirty = true;
                        tracing::info!("Saved; edits made during the save remain unsaved");
                    }
                    inner.baseline = saved;
                    Ok(inner.snapshot())
                }
                Err(err) => {
                    tracing::warn!("Save failed for {:?}: {}", self.options.context, err);
                    inner.dirty = true;
                    inner.last_error = Some(err.clone());
                    Err(SaveError::Persist(err))
                }
            }
        })
    }

    async fn call_gateway(&self, request: SaveRequest) -> Result<SavedLayout, PersistError> {
        let save = self.gateway.save(request);
        match self.options.save_timeout {
            Some(after) => match tokio::time::timeout(after, save).await {
                Ok(result) => result.map_err(PersistError::from),
                Err(_) => Err(PersistError::Timeout { after }),
            },
            None => save.await.map_err(PersistError::from),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    /// Runs `f` under the state lock, then broadcasts the events it queued
    /// followed by a status change if there was one.
    fn transact<R>(&self, f: impl FnOnce(&mut Inner, &mut Vec<EngineEvent>) -> R) -> R {
        let mut events = Vec::new();
        let result = {
            let mut inner = self.lock();
            let before = inner.status();
            let result = f(&mut inner, &mut events);
            let after = inner.status();
            if before != after {
                events.push(EngineEvent::StatusChanged { status: after });
            }
            result
        };
        for event in events {
            self.emit(event);
        }
        result
    }

    fn emit(&self, event: EngineEvent) {
        match self.events.send(event) {
            Ok(count) => tracing::trace!("Engine event sent to {} subscribers", count),
            Err(_) => tracing::trace!("No subscribers for engine event"),
        }
    }

    /// Logs a rejected section operation and emits `SectionError` for it.
    fn report<T>(&self, op: &str, result: Result<T, SectionError>) -> Result<T, SectionError> {
        if let Err(err) = &result {
            tracing::debug!("{} rejected: {}", op, err);
            if let Some(id) = err.section_id() {
                self.emit(EngineEvent::SectionError {
                    id: id.clone(),
                    error: err.to_string(),
                });
            }
        }
        result
    }
}

/// Returns the engine to `Dirty` if a save future is dropped before
/// finishing, and tells subscribers.
struct InFlight<'a> {
    engine: &'a SectionLayoutEngine,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(engine: &'a SectionLayoutEngine) -> Self {
        Self {
            engine,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.engine.transact(|inner, _| {
                inner.saving = false;
                inner.dirty = true;
            });
            tracing::debug!("Save abandoned before completion");
        }
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Copies transient render status from `local` onto matching ids in `saved`.
fn carry_status(local: &SectionCollection, mut saved: SectionCollection) -> SectionCollection {
    for section in local {
        if section.status != SectionStatus::default() {
            saved.set_status(&section.id, section.status.clone());
        }
    }
    saved
}
