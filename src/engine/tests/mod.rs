//! Tests for SectionLayoutEngine.
//!
//! - `mutations`: section operations and dirty tracking
//! - `save_flow`: the Clean / Dirty / Saving state machine
//! - `events`: broadcast notifications

mod save_flow;

use std::sync::Arc;

use super::{EngineOptions, SectionLayoutEngine};
use crate::collection::SectionCollection;
use crate::gateway::{MemoryGateway, SaveContext, SavedLayout};
use crate::layout::LayoutConfig;
use crate::registry::SectionType;
use crate::section::{Section, SectionId};

pub(super) fn context() -> SaveContext {
    SaveContext::new("job-1", "profile-1")
}

pub(super) fn options() -> EngineOptions {
    EngineOptions {
        context: context(),
        ..EngineOptions::default()
    }
}

fn section(id: &str, section_type: SectionType, order: u32) -> Section {
    let mut s = Section::new(section_type, order);
    s.id = SectionId::from(id);
    s
}

/// header / experience / skills, all visible.
pub(super) fn seed() -> SavedLayout {
    SavedLayout {
        collection: SectionCollection::from_sections(vec![
            section("header", SectionType::Header, 0),
            section("experience", SectionType::Experience, 1),
            section("skills", SectionType::Skills, 2),
        ])
        .expect("valid seed"),
        layout_config: LayoutConfig::default(),
    }
}

/// A clean engine over `seed()` backed by a fresh memory gateway.
pub(super) fn engine() -> (SectionLayoutEngine, Arc<MemoryGateway>) {
    let gateway = Arc::new(MemoryGateway::new());
    let engine = SectionLayoutEngine::new(gateway.clone(), options(), Some(seed()));
    (engine, gateway)
}

pub(super) fn ids(engine: &SectionLayoutEngine) -> Vec<String> {
    engine
        .collection()
        .iter()
        .map(|s| s.id.as_str().to_string())
        .collect()
}
