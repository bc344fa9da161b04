//! Ordered section collection with pure editing operations.
//!
//! Every editing operation takes `&self` and returns a new collection (or an
//! error), so callers can compare before/after states freely. Sections are
//! kept sorted by `order`, and `order` values always form the dense sequence
//! `0..len`.
//!
//! # Example
//!
//! ```
//! use portal_sections::collection::SectionCollection;
//! use portal_sections::registry::{SectionType, SectionTypeRegistry};
//!
//! let registry = SectionTypeRegistry::builtin();
//! let sections = SectionCollection::defaults(&registry);
//! let (sections, id) = sections.add_section(SectionType::Projects).expect("projects is new");
//! assert!(sections.get(&id).is_some());
//! assert!(sections.orders_are_dense());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SectionError;
use crate::registry::{SectionType, SectionTypeRegistry};
use crate::section::{Section, SectionId, SectionStatus};

#[cfg(test)]
mod tests;

/// Sections of one portal, sorted by `order`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Section>", into = "Vec<Section>")]
pub struct SectionCollection {
    sections: Vec<Section>,
}

impl TryFrom<Vec<Section>> for SectionCollection {
    type Error = SectionError;

    fn try_from(sections: Vec<Section>) -> Result<Self, Self::Error> {
        Self::from_sections(sections)
    }
}

impl From<SectionCollection> for Vec<Section> {
    fn from(collection: SectionCollection) -> Self {
        collection.sections
    }
}

impl SectionCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from sections in any order.
    ///
    /// Orders are recompacted to `0..len`; sections sharing an `order`
    /// keep their relative input position. Duplicate ids are rejected.
    pub fn from_sections(sections: Vec<Section>) -> Result<Self, SectionError> {
        for (i, section) in sections.iter().enumerate() {
            if sections[..i].iter().any(|s| s.id == section.id) {
                return Err(SectionError::DuplicateId {
                    id: section.id.clone(),
                });
            }
        }
        Ok(Self {
            sections: recompact(sections),
        })
    }

    /// The default section set: one section per `default_visible` registry
    /// entry, in declaration order.
    pub fn defaults(registry: &SectionTypeRegistry) -> Self {
        let sections = registry
            .default_types()
            .enumerate()
            .map(|(i, t)| Section::new(t, i as u32))
            .collect();
        Self { sections }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All sections in `order` sequence.
    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    /// Visible sections in `order` sequence. Drag indices refer to this list.
    pub fn visible(&self) -> impl Iterator<Item = &Section> + '_ {
        self.sections.iter().filter(|s| s.visible)
    }

    /// Hidden sections in `order` sequence.
    pub fn hidden(&self) -> impl Iterator<Item = &Section> + '_ {
        self.sections.iter().filter(|s| !s.visible)
    }

    pub fn visible_len(&self) -> usize {
        self.visible().count()
    }

    pub fn get(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SectionId) -> bool {
        self.get(id).is_some()
    }

    /// First section of the given type.
    pub fn find_type(&self, section_type: SectionType) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_type == section_type)
    }

    /// Returns `true` if `order` values are exactly `0..len`.
    pub fn orders_are_dense(&self) -> bool {
        let mut orders: Vec<u32> = self.sections.iter().map(|s| s.order).collect();
        orders.sort_unstable();
        orders.iter().enumerate().all(|(i, &o)| o as usize == i)
    }

    /// Compare persisted content, ignoring transient render status.
    pub fn same_content(&self, other: &SectionCollection) -> bool {
        self.sections.len() == other.sections.len()
            && self
                .sections
                .iter()
                .zip(&other.sections)
                .all(|(a, b)| a.same_content(b))
    }

    // -----------------------------------------------------------------------
    // Pure operations
    // -----------------------------------------------------------------------

    /// Moves the visible section at `drag_index` to `hover_index`.
    ///
    /// Both indices address the visible, order-sorted sequence. Afterwards
    /// the visible sections take orders `0..v` in their new sequence and
    /// hidden sections follow in their previous relative order. Equal or
    /// out-of-range indices return the collection unchanged.
    pub fn move_section(&self, drag_index: usize, hover_index: usize) -> Self {
        self.try_move(drag_index, hover_index)
            .unwrap_or_else(|| self.clone())
    }

    /// Like [`move_section`](Self::move_section) but returns `None` for a no-op.
    pub fn try_move(&self, drag_index: usize, hover_index: usize) -> Option<Self> {
        let mut visible: Vec<Section> = self.visible().cloned().collect();
        if drag_index == hover_index || drag_index >= visible.len() || hover_index >= visible.len()
        {
            return None;
        }
        let dragged = visible.remove(drag_index);
        visible.insert(hover_index, dragged);

        let mut sections = visible;
        sections.extend(self.hidden().cloned());
        for (i, section) in sections.iter_mut().enumerate() {
            section.order = i as u32;
        }
        Some(Self { sections })
    }

    /// Sets the visibility of one section.
    ///
    /// Hiding a required section fails with [`SectionError::RequiredSection`].
    pub fn toggle_visibility(
        &self,
        registry: &SectionTypeRegistry,
        id: &SectionId,
        visible: bool,
    ) -> Result<Self, SectionError> {
        let target = self.require(id)?;
        if !visible && registry.is_required(target.section_type) {
            return Err(SectionError::RequiredSection {
                id: id.clone(),
                section_type: target.section_type,
            });
        }
        Ok(self.update(id, |s| s.visible = visible))
    }

    /// Appends a new visible section of `section_type` after every existing
    /// one and returns it with its fresh id.
    ///
    /// Only [`SectionType::Custom`] may appear more than once; asking for a
    /// second instance of any other type fails with
    /// [`SectionError::DuplicateType`].
    pub fn add_section(&self, section_type: SectionType) -> Result<(Self, SectionId), SectionError> {
        if !section_type.allows_multiple() && self.find_type(section_type).is_some() {
            return Err(SectionError::DuplicateType { section_type });
        }
        let order = self
            .sections
            .iter()
            .map(|s| s.order)
            .max()
            .map_or(0, |max| max + 1);
        let section = Section::new(section_type, order);
        let id = section.id.clone();
        let mut sections = self.sections.clone();
        sections.push(section);
        Ok((Self { sections }, id))
    }

    /// Removes a section and recompacts orders. Returns the removed section.
    ///
    /// Required sections cannot be deleted.
    pub fn delete_section(
        &self,
        registry: &SectionTypeRegistry,
        id: &SectionId,
    ) -> Result<(Self, Section), SectionError> {
        let target = self.require(id)?;
        if registry.is_required(target.section_type) {
            return Err(SectionError::RequiredSection {
                id: id.clone(),
                section_type: target.section_type,
            });
        }
        let mut sections = self.sections.clone();
        let index = sections
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| SectionError::NotFound { id: id.clone() })?;
        let removed = sections.remove(index);
        Ok((
            Self {
                sections: recompact(sections),
            },
            removed,
        ))
    }

    /// Replaces the `data` payload of one section. Unknown ids are a no-op.
    pub fn edit_section_data(&self, id: &SectionId, data: Value) -> Self {
        self.update(id, |s| s.data = data)
    }

    /// Replaces the `customization` payload of one section. Unknown ids are a no-op.
    pub fn edit_section_customization(&self, id: &SectionId, customization: Value) -> Self {
        self.update(id, |s| s.customization = customization)
    }

    /// Sets or clears (`None` or blank) the user label. Unknown ids are a no-op.
    pub fn rename_section(&self, id: &SectionId, name: Option<String>) -> Self {
        let name = name.filter(|n| !n.trim().is_empty());
        self.update(id, |s| s.name = name)
    }

    /// Records transient render status in place. Returns `false` for an
    /// unknown id.
    pub fn set_status(&mut self, id: &SectionId, status: SectionStatus) -> bool {
        match self.sections.iter_mut().find(|s| &s.id == id) {
            Some(section) => {
                section.status = status;
                true
            }
            None => false,
        }
    }

    fn require(&self, id: &SectionId) -> Result<&Section, SectionError> {
        self.get(id)
            .ok_or_else(|| SectionError::NotFound { id: id.clone() })
    }

    fn update(&self, id: &SectionId, f: impl FnOnce(&mut Section)) -> Self {
        let mut next = self.clone();
        if let Some(section) = next.sections.iter_mut().find(|s| &s.id == id) {
            f(section);
        }
        next
    }
}

impl<'a> IntoIterator for &'a SectionCollection {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

/// Sorts by `order`, keeping input position for ties, and renumbers `0..len`.
fn recompact(mut sections: Vec<Section>) -> Vec<Section> {
    sections.sort_by_key(|s| s.order);
    for (i, section) in sections.iter_mut().enumerate() {
        section.order = i as u32;
    }
    sections
}
