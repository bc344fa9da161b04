//! Save state machine tests.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{context, engine, ids, options, seed};
use crate::collection::SectionCollection;
use crate::engine::{EngineEvent, EngineOptions, EngineStatus, SectionLayoutEngine};
use crate::error::{GatewayError, PersistError, SaveError};
use crate::gateway::{MemoryGateway, PersistenceGateway, SaveContext, SaveRequest, SavedLayout};
use crate::layout::{LayoutConfigPatch, Spacing};
use crate::registry::SectionType;
use crate::section::{Section, SectionId};

#[tokio::test]
async fn test_save_when_clean_skips_gateway() {
    let (engine, gateway) = engine();
    let state = engine.save().await.expect("clean save is a no-op");
    assert_eq!(state.status(), EngineStatus::Clean);
    assert_eq!(gateway.save_calls(), 0);
}

#[tokio::test]
async fn test_save_dirty_persists_and_cleans() {
    let (engine, gateway) = engine();
    engine.move_section(0, 2);
    let state = engine.save().await.expect("save succeeds");
    assert_eq!(state.status(), EngineStatus::Clean);
    assert_eq!(gateway.save_calls(), 1);
    let stored = gateway.stored(&context()).expect("stored layout");
    assert!(stored.collection.same_content(&engine.collection()));
    assert_eq!(ids(&engine), vec!["experience", "skills", "header"]);
}

#[tokio::test]
async fn test_save_includes_layout_config() {
    let (engine, gateway) = engine();
    engine.set_layout_config(LayoutConfigPatch {
        spacing: Some(Spacing::Relaxed),
        ..Default::default()
    });
    engine.save().await.expect("save succeeds");
    let stored = gateway.stored(&context()).expect("stored layout");
    assert_eq!(stored.layout_config.spacing, Spacing::Relaxed);
}

#[tokio::test]
async fn test_failed_save_retains_edits() {
    let (engine, gateway) = engine();
    engine.move_section(0, 2);
    engine
        .toggle_visibility(&"skills".into(), false)
        .expect("skills is optional");
    let edited = engine.collection();

    gateway.fail_next_save(GatewayError::Unavailable("offline".to_string()));
    let err = engine.save().await.expect_err("gateway fails");
    assert!(matches!(
        err,
        SaveError::Persist(PersistError::Gateway(GatewayError::Unavailable(_)))
    ));

    let state = engine.state();
    assert_eq!(state.collection, edited);
    assert_ne!(state.collection, seed().collection);
    assert_eq!(state.status(), EngineStatus::Dirty);
    assert!(state.last_error.is_some());
}

#[tokio::test]
async fn test_retry_after_failure_clears_error() {
    let (engine, gateway) = engine();
    engine.move_section(0, 1);
    gateway.fail_next_save(GatewayError::Unavailable("offline".to_string()));
    assert!(engine.save().await.is_err());

    let state = engine.save().await.expect("retry succeeds");
    assert_eq!(state.status(), EngineStatus::Clean);
    assert!(state.last_error.is_none());
    assert_eq!(gateway.save_calls(), 2);
}

#[tokio::test]
async fn test_second_save_while_in_flight_is_rejected() {
    let (engine, gateway) = engine();
    engine.move_section(0, 2);
    let gate = gateway.hold_saves();

    let (first, second) = tokio::join!(engine.save(), async {
        assert_eq!(engine.status(), EngineStatus::Saving);
        let second = engine.save().await;
        gate.release();
        second
    });

    assert!(matches!(second, Err(SaveError::ConcurrentSave)));
    assert_eq!(first.expect("first save succeeds").status(), EngineStatus::Clean);
    assert_eq!(gateway.save_calls(), 1);
}

#[tokio::test]
async fn test_edits_during_save_stay_dirty() {
    let (engine, gateway) = engine();
    engine.move_section(0, 2);
    let gate = gateway.hold_saves();

    let (result, added) = tokio::join!(engine.save(), async {
        let id = engine.add_section(SectionType::Projects).expect("projects");
        gate.release();
        id
    });

    let state = result.expect("save succeeds");
    assert_eq!(state.status(), EngineStatus::Dirty);
    assert!(state.collection.contains(&added));
    let stored = gateway.stored(&context()).expect("first save stored");
    assert!(!stored.collection.contains(&added));

    gateway.stop_holding();
    let state = engine.save().await.expect("second save succeeds");
    assert_eq!(state.status(), EngineStatus::Clean);
    let stored = gateway.stored(&context()).expect("second save stored");
    assert!(stored.collection.contains(&added));
}

#[tokio::test]
async fn test_edit_reverted_during_save_ends_clean() {
    let (engine, gateway) = engine();
    engine.move_section(0, 2);
    let gate = gateway.hold_saves();

    let (result, _) = tokio::join!(engine.save(), async {
        engine.move_section(2, 0);
        engine.move_section(0, 2);
        gate.release();
    });
    assert_eq!(result.expect("save").status(), EngineStatus::Clean);
}

#[tokio::test]
async fn test_failure_with_edits_during_save_keeps_both() {
    let (engine, gateway) = engine();
    engine.move_section(0, 2);
    gateway.fail_next_save(GatewayError::Unavailable("offline".to_string()));
    let gate = gateway.hold_saves();

    let (result, added) = tokio::join!(engine.save(), async {
        let id = engine.add_section(SectionType::Languages).expect("languages");
        gate.release();
        id
    });
    assert!(result.is_err());
    let state = engine.state();
    assert_eq!(state.status(), EngineStatus::Dirty);
    assert!(state.collection.contains(&added));
    assert_eq!(
        state.collection.iter().next().map(|s| s.id.as_str()),
        Some("experience")
    );
}

#[tokio::test]
async fn test_reset_and_discard_during_save() {
    let (engine, gateway) = engine();
    engine.move_section(0, 2);
    let gate = gateway.hold_saves();

    let (result, discard) = tokio::join!(engine.save(), async {
        engine.reset();
        let discard = engine.discard();
        gate.release();
        discard
    });
    assert!(discard.is_err(), "discard is refused while saving");
    assert_eq!(result.expect("save").status(), EngineStatus::Dirty);
}

#[tokio::test]
async fn test_save_timeout_keeps_edits() {
    let gateway = Arc::new(MemoryGateway::new());
    let opts = EngineOptions {
        save_timeout: Some(Duration::from_millis(20)),
        ..options()
    };
    let engine = SectionLayoutEngine::new(gateway.clone(), opts, Some(seed()));
    engine.move_section(0, 2);
    let _gate = gateway.hold_saves();

    let err = engine.save().await.expect_err("held save times out");
    assert!(matches!(
        err,
        SaveError::Persist(PersistError::Timeout { .. })
    ));
    assert_eq!(engine.status(), EngineStatus::Dirty);
    assert_eq!(ids(&engine), vec!["experience", "skills", "header"]);
}

#[tokio::test]
async fn test_dropped_save_returns_to_dirty() {
    let (engine, gateway) = engine();
    engine.move_section(0, 2);
    let _gate = gateway.hold_saves();
    let mut rx = engine.subscribe();

    let abandoned = tokio::time::timeout(Duration::from_millis(20), engine.save()).await;
    assert!(abandoned.is_err(), "held save should not finish");
    assert_eq!(engine.status(), EngineStatus::Dirty);

    let mut statuses = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let EngineEvent::StatusChanged { status } = event {
            statuses.push(status);
        }
    }
    assert_eq!(statuses, vec![EngineStatus::Saving, EngineStatus::Dirty]);

    gateway.stop_holding();
    let state = engine.save().await.expect("later save succeeds");
    assert_eq!(state.status(), EngineStatus::Clean);
}

/// Gateway that assigns its own ids, like a server would.
struct ReassigningGateway;

impl PersistenceGateway for ReassigningGateway {
    fn load<'a>(
        &'a self,
        _context: &'a SaveContext,
    ) -> BoxFuture<'a, Result<Option<SavedLayout>, GatewayError>> {
        async { Ok(None) }.boxed()
    }

    fn save(&self, request: SaveRequest) -> BoxFuture<'_, Result<SavedLayout, GatewayError>> {
        async move {
            tokio::task::yield_now().await;
            let sections: Vec<Section> = request
                .collection
                .iter()
                .map(|s| {
                    let mut s = s.clone();
                    s.id = SectionId::from(format!("srv-{}", s.order));
                    s
                })
                .collect();
            Ok(SavedLayout {
                collection: SectionCollection::from_sections(sections)
                    .map_err(|e| GatewayError::Unavailable(e.to_string()))?,
                layout_config: request.layout_config,
            })
        }
        .boxed()
    }
}

#[tokio::test]
async fn test_authoritative_copy_replaces_local() {
    let engine = SectionLayoutEngine::new(Arc::new(ReassigningGateway), options(), Some(seed()));
    engine
        .report_section_error(&"header".into(), Some("slow avatar".to_string()))
        .expect("header exists");
    engine.move_section(0, 2);
    engine.save().await.expect("save succeeds");
    assert_eq!(ids(&engine), vec!["srv-0", "srv-1", "srv-2"]);
    assert_eq!(engine.status(), EngineStatus::Clean);

    // After a save the baseline is the authoritative copy.
    engine.move_section(0, 1);
    engine.discard().expect("not saving");
    assert_eq!(ids(&engine), vec!["srv-0", "srv-1", "srv-2"]);
}

#[tokio::test]
async fn test_edits_during_save_keep_local_ids() {
    let engine = SectionLayoutEngine::new(Arc::new(ReassigningGateway), options(), Some(seed()));
    engine.move_section(0, 2);

    let (saved, _) = tokio::join!(engine.save(), async {
        engine.move_section(0, 1);
    });
    let state = saved.expect("save succeeds");
    assert_eq!(state.status(), EngineStatus::Dirty);
    assert_eq!(ids(&engine), vec!["skills", "experience", "header"]);

    engine.discard().expect("not saving");
    assert_eq!(ids(&engine), vec!["srv-0", "srv-1", "srv-2"]);
    assert_eq!(
        engine.collection().iter().map(|s| s.section_type).collect::<Vec<_>>(),
        vec![SectionType::Experience, SectionType::Skills, SectionType::Header]
    );
}

#[tokio::test]
async fn test_open_loads_stored_layout() {
    let gateway = Arc::new(MemoryGateway::with_layout(context(), seed()));
    let engine = SectionLayoutEngine::open(gateway.clone(), options())
        .await
        .expect("load succeeds");
    assert_eq!(ids(&engine), vec!["header", "experience", "skills"]);
    assert_eq!(gateway.load_calls(), 1);
    assert_eq!(engine.status(), EngineStatus::Clean);
}

#[tokio::test]
async fn test_open_without_stored_layout_uses_defaults() {
    let gateway = Arc::new(MemoryGateway::new());
    let engine = SectionLayoutEngine::open(gateway, options())
        .await
        .expect("load succeeds");
    assert_eq!(
        engine.collection().iter().next().map(|s| s.section_type),
        Some(SectionType::Header)
    );
}
