//! In-memory gateway with failure injection.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::Notify;

use super::{through_json, PersistenceGateway, SaveContext, SaveRequest, SavedLayout};
use crate::error::GatewayError;

/// Gateway that keeps layouts in a map keyed by [`SaveContext`].
///
/// Besides storing, it counts save calls, can fail upcoming saves on
/// demand, and can hold saves open until released through a [`SaveGate`].
#[derive(Default)]
pub struct MemoryGateway {
    stored: Mutex<HashMap<SaveContext, SavedLayout>>,
    failures: Mutex<VecDeque<GatewayError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    save_calls: AtomicUsize,
    load_calls: AtomicUsize,
}

/// Handle that releases saves held by [`MemoryGateway::hold_saves`].
#[derive(Debug, Clone)]
pub struct SaveGate {
    notify: Arc<Notify>,
}

impl SaveGate {
    /// Let one held (or the next) save proceed.
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway that already holds a layout for `context`.
    pub fn with_layout(context: SaveContext, layout: SavedLayout) -> Self {
        let gateway = Self::new();
        lock(&gateway.stored).insert(context, layout);
        gateway
    }

    /// Make the next save fail with `error`. Calls queue up.
    pub fn fail_next_save(&self, error: GatewayError) {
        lock(&self.failures).push_back(error);
    }

    /// Hold every following save until the returned gate is released.
    pub fn hold_saves(&self) -> SaveGate {
        let notify = Arc::new(Notify::new());
        *lock(&self.gate) = Some(Arc::clone(&notify));
        SaveGate { notify }
    }

    /// Stop holding saves. Saves already waiting still need a release.
    pub fn stop_holding(&self) {
        *lock(&self.gate) = None;
    }

    /// Number of save calls received, including failed ones.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// The layout currently stored for `context`.
    pub fn stored(&self, context: &SaveContext) -> Option<SavedLayout> {
        lock(&self.stored).get(context).cloned()
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load<'a>(
        &'a self,
        context: &'a SaveContext,
    ) -> BoxFuture<'a, Result<Option<SavedLayout>, GatewayError>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let stored = self.stored(context);
        async move { Ok(stored) }.boxed()
    }

    fn save(&self, request: SaveRequest) -> BoxFuture<'_, Result<SavedLayout, GatewayError>> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.gate).clone();
        async move {
            if let Some(notify) = gate {
                notify.notified().await;
            }
            if let Some(error) = lock(&self.failures).pop_front() {
                tracing::debug!("Injected save failure: {}", error);
                return Err(error);
            }
            let saved = through_json(&request)?;
            lock(&self.stored).insert(request.context, saved.clone());
            Ok(saved)
        }
        .boxed()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::SectionCollection;
    use crate::layout::LayoutConfig;
    use crate::registry::SectionTypeRegistry;

    fn request() -> SaveRequest {
        SaveRequest {
            collection: SectionCollection::defaults(&SectionTypeRegistry::builtin()),
            layout_config: LayoutConfig::default(),
            context: SaveContext::new("job-1", "profile-1"),
        }
    }

    #[tokio::test]
    async fn test_load_empty_returns_none() {
        let gw = MemoryGateway::new();
        let loaded = gw
            .load(&SaveContext::new("job", "profile"))
            .await
            .expect("load should succeed");
        assert!(loaded.is_none());
        assert_eq!(gw.load_calls(), 1);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let gw = MemoryGateway::new();
        let req = request();
        let saved = gw.save(req.clone()).await.expect("save should succeed");
        assert!(saved.collection.same_content(&req.collection));
        let loaded = gw.load(&req.context).await.expect("load").expect("stored");
        assert_eq!(loaded, saved);
        assert_eq!(gw.save_calls(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let gw = MemoryGateway::new();
        gw.fail_next_save(GatewayError::Unavailable("down".to_string()));
        assert!(gw.save(request()).await.is_err());
        assert!(gw.save(request()).await.is_ok());
        assert_eq!(gw.save_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_save_does_not_store() {
        let gw = MemoryGateway::new();
        gw.fail_next_save(GatewayError::Unavailable("down".to_string()));
        let req = request();
        let _ = gw.save(req.clone()).await;
        assert!(gw.stored(&req.context).is_none());
    }

    #[tokio::test]
    async fn test_held_save_waits_for_release() {
        let gw = MemoryGateway::new();
        let gate = gw.hold_saves();
        gate.release();
        // A permit stored before the save starts lets it through.
        let saved = tokio::time::timeout(std::time::Duration::from_secs(1), gw.save(request()))
            .await
            .expect("released save should finish");
        assert!(saved.is_ok());
    }
}
