//! Tests for SectionCollection.
//!
//! - `ordering`: move semantics, recompaction, tie-breaks
//! - `visibility`: toggle and required-section protection
//! - `lifecycle`: add, delete and payload edits


use super::SectionCollection;
use crate::registry::SectionType;
use crate::section::{Section, SectionId};

/// Builds a visible section with a readable id and the given order.
pub(super) fn section(id: &str, section_type: SectionType, order: u32) -> Section {
    let mut s = Section::new(section_type, order);
    s.id = SectionId::from(id);
    s
}

/// Builds a hidden section with a readable id and the given order.
pub(super) fn hidden(id: &str, section_type: SectionType, order: u32) -> Section {
    let mut s = section(id, section_type, order);
    s.visible = false;
    s
}

/// Builds a collection from sections, panicking on invalid input.
pub(super) fn collection(sections: Vec<Section>) -> SectionCollection {
    SectionCollection::from_sections(sections).expect("test sections should be valid")
}

/// Section ids in order sequence.
pub(super) fn ids(collection: &SectionCollection) -> Vec<&str> {
    collection.iter().map(|s| s.id.as_str()).collect()
}

/// Orders in the collection's iteration sequence.
pub(super) fn orders(collection: &SectionCollection) -> Vec<u32> {
    collection.iter().map(|s| s.order).collect()
}

/// The header / experience / skills fixture used across tests.
pub(super) fn three_sections() -> SectionCollection {
    collection(vec![
        section("header", SectionType::Header, 0),
        section("experience", SectionType::Experience, 1),
        section("skills", SectionType::Skills, 2),
    ])
}
