//! Section records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::registry::{SectionType, SectionTypeRegistry};

/// Opaque section identifier, stable for the section's lifetime.
///
/// Generated ids are ULIDs rendered as `section_<ulid>`, but any string
/// coming back from storage is accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Generate a fresh, unique id.
    pub fn generate() -> Self {
        Self(format!("section_{}", Ulid::new()))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for SectionId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transient render status owned by the render capability.
///
/// Never persisted and ignored when comparing saved content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionStatus {
    /// The renderer is still fetching or preparing content.
    pub loading: bool,
    /// Last render failure, if any.
    pub error: Option<String>,
}

/// One content block of a portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    /// User-chosen label; `None` falls back to the registry display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Renderer-owned payload. The engine never looks inside.
    #[serde(default = "empty_object")]
    pub data: Value,
    pub visible: bool,
    pub order: u32,
    /// Renderer-owned styling payload.
    #[serde(default = "empty_object")]
    pub customization: Value,
    #[serde(skip)]
    pub status: SectionStatus,
}

pub(crate) fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Section {
    /// Creates a visible section with a fresh id and empty payloads.
    pub fn new(section_type: SectionType, order: u32) -> Self {
        Self {
            id: SectionId::generate(),
            section_type,
            name: None,
            data: empty_object(),
            visible: true,
            order,
            customization: empty_object(),
            status: SectionStatus::default(),
        }
    }

    /// Label to show for this section.
    pub fn label<'a>(&'a self, registry: &SectionTypeRegistry) -> &'a str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => registry.display_name(self.section_type),
        }
    }

    /// Compare everything that is persisted, ignoring transient status.
    pub fn same_content(&self, other: &Section) -> bool {
        self.id == other.id
            && self.section_type == other.section_type
            && self.name == other.name
            && self.data == other.data
            && self.visible == other.visible
            && self.order == other.order
            && self.customization == other.customization
    }
}
