//! Section type registry.
//!
//! Static metadata for every section type a portal can contain: display
//! name, icon, description, whether a fresh portal shows it, and whether it
//! is required. Required types can never be hidden or deleted; the
//! collection operations consult the registry for that rule.
//!
//! # Example
//!
//! ```
//! use portal_sections::registry::{SectionType, SectionTypeRegistry};
//!
//! let registry = SectionTypeRegistry::builtin();
//! let header = registry.lookup(SectionType::Header).expect("header is registered");
//! assert!(header.required);
//! assert!(!registry.is_required(SectionType::Skills));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Icon used when a type has no registry entry.
pub const DEFAULT_ICON: &str = "layout";

/// Closed set of section types a portal can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionType {
    /// Name, headline and avatar block.
    Header,
    /// Short professional summary.
    Summary,
    /// Work history.
    Experience,
    /// Schools and degrees.
    Education,
    /// Skill list.
    Skills,
    /// Project showcase.
    Projects,
    /// Awards and notable results.
    Achievements,
    /// Professional certifications.
    Certifications,
    /// Spoken languages.
    Languages,
    /// Quotes from colleagues or clients.
    Testimonials,
    /// Contact details.
    Contact,
    /// Media gallery.
    Portfolio,
    /// Social profile links.
    Social,
    /// Free-form user section; may appear more than once.
    Custom,
}

impl SectionType {
    /// Every section type in declaration order.
    pub const ALL: [SectionType; 14] = [
        SectionType::Header,
        SectionType::Summary,
        SectionType::Experience,
        SectionType::Education,
        SectionType::Skills,
        SectionType::Projects,
        SectionType::Achievements,
        SectionType::Certifications,
        SectionType::Languages,
        SectionType::Testimonials,
        SectionType::Contact,
        SectionType::Portfolio,
        SectionType::Social,
        SectionType::Custom,
    ];

    /// Kebab-case identifier used in storage and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Header => "header",
            SectionType::Summary => "summary",
            SectionType::Experience => "experience",
            SectionType::Education => "education",
            SectionType::Skills => "skills",
            SectionType::Projects => "projects",
            SectionType::Achievements => "achievements",
            SectionType::Certifications => "certifications",
            SectionType::Languages => "languages",
            SectionType::Testimonials => "testimonials",
            SectionType::Contact => "contact",
            SectionType::Portfolio => "portfolio",
            SectionType::Social => "social",
            SectionType::Custom => "custom",
        }
    }

    /// Returns `true` if more than one section of this type may coexist.
    pub fn allows_multiple(self) -> bool {
        matches!(self, SectionType::Custom)
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing a [`SectionType`] from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSectionTypeError(pub String);

impl fmt::Display for ParseSectionTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown section type: {}", self.0)
    }
}

impl std::error::Error for ParseSectionTypeError {}

impl FromStr for SectionType {
    type Err = ParseSectionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SectionType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ParseSectionTypeError(s.to_string()))
    }
}

/// Registry entry describing one section type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTypeConfig {
    /// The type this entry describes.
    pub section_type: SectionType,
    /// Label shown when the section has no user-chosen name.
    pub display_name: &'static str,
    /// Icon identifier for editor chrome.
    pub icon: &'static str,
    /// One-line description for the "add section" picker.
    pub description: &'static str,
    /// Whether a freshly created portal includes this section.
    pub default_visible: bool,
    /// Required sections can never be hidden or deleted.
    pub required: bool,
}

impl SectionTypeConfig {
    /// Degraded entry for a type the registry does not know about:
    /// non-required, hidden by default, default icon.
    pub fn fallback(section_type: SectionType) -> Self {
        Self {
            section_type,
            display_name: "Custom Section",
            icon: DEFAULT_ICON,
            description: "Free-form content",
            default_visible: false,
            required: false,
        }
    }
}

/// Lookup table from [`SectionType`] to [`SectionTypeConfig`].
///
/// Entries keep their declaration order, which is also the order of the
/// default section set for a new portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTypeRegistry {
    entries: Vec<SectionTypeConfig>,
}

impl SectionTypeRegistry {
    /// Creates a registry from explicit entries.
    ///
    /// A later entry for the same type replaces the earlier one in place.
    pub fn new(entries: impl IntoIterator<Item = SectionTypeConfig>) -> Self {
        let mut reg = Self {
            entries: Vec::new(),
        };
        for entry in entries {
            reg.register(entry);
        }
        reg
    }

    /// The built-in registry covering every [`SectionType`].
    pub fn builtin() -> Self {
        Self::new(builtin_entries())
    }

    /// Register or replace the entry for `entry.section_type`.
    pub fn register(&mut self, entry: SectionTypeConfig) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.section_type == entry.section_type)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Look up the entry for a type. `None` if the type is unregistered.
    pub fn lookup(&self, section_type: SectionType) -> Option<&SectionTypeConfig> {
        self.entries.iter().find(|e| e.section_type == section_type)
    }

    /// Look up the entry for a type, degrading unregistered types to
    /// [`SectionTypeConfig::fallback`].
    pub fn resolve(&self, section_type: SectionType) -> SectionTypeConfig {
        self.lookup(section_type)
            .cloned()
            .unwrap_or_else(|| SectionTypeConfig::fallback(section_type))
    }

    /// Returns `true` if sections of this type may not be hidden or deleted.
    pub fn is_required(&self, section_type: SectionType) -> bool {
        self.lookup(section_type).is_some_and(|e| e.required)
    }

    /// Display name for a type, falling back for unregistered types.
    pub fn display_name(&self, section_type: SectionType) -> &'static str {
        self.resolve(section_type).display_name
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[SectionTypeConfig] {
        &self.entries
    }

    /// Types whose entry has `default_visible`, in declaration order.
    pub fn default_types(&self) -> impl Iterator<Item = SectionType> + '_ {
        self.entries
            .iter()
            .filter(|e| e.default_visible)
            .map(|e| e.section_type)
    }
}

impl Default for SectionTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn entry(
    section_type: SectionType,
    display_name: &'static str,
    icon: &'static str,
    description: &'static str,
    default_visible: bool,
) -> SectionTypeConfig {
    SectionTypeConfig {
        section_type,
        display_name,
        icon,
        description,
        default_visible,
        required: false,
    }
}

fn builtin_entries() -> Vec<SectionTypeConfig> {
    vec![
        SectionTypeConfig {
            required: true,
            ..entry(
                SectionType::Header,
                "Header",
                "user",
                "Name, headline and profile photo",
                true,
            )
        },
        entry(
            SectionType::Summary,
            "Professional Summary",
            "file-text",
            "A short overview of who you are",
            true,
        ),
        entry(
            SectionType::Experience,
            "Work Experience",
            "briefcase",
            "Roles, companies and responsibilities",
            true,
        ),
        entry(
            SectionType::Education,
            "Education",
            "graduation-cap",
            "Schools, degrees and courses",
            true,
        ),
        entry(
            SectionType::Skills,
            "Skills",
            "zap",
            "Technical and soft skills",
            true,
        ),
        entry(
            SectionType::Projects,
            "Projects",
            "folder",
            "Things you have built",
            false,
        ),
        entry(
            SectionType::Achievements,
            "Achievements",
            "trophy",
            "Awards and notable results",
            false,
        ),
        entry(
            SectionType::Certifications,
            "Certifications",
            "award",
            "Professional certifications",
            false,
        ),
        entry(
            SectionType::Languages,
            "Languages",
            "globe",
            "Languages you speak",
            false,
        ),
        entry(
            SectionType::Testimonials,
            "Testimonials",
            "message-square",
            "What others say about you",
            false,
        ),
        entry(
            SectionType::Contact,
            "Contact",
            "mail",
            "How to reach you",
            true,
        ),
        entry(
            SectionType::Portfolio,
            "Portfolio",
            "image",
            "Images and media from your work",
            false,
        ),
        entry(
            SectionType::Social,
            "Social Links",
            "share-2",
            "Links to your social profiles",
            false,
        ),
        entry(
            SectionType::Custom,
            "Custom Section",
            DEFAULT_ICON,
            "Free-form content",
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_type() {
        let reg = SectionTypeRegistry::builtin();
        for t in SectionType::ALL {
            assert!(reg.lookup(t).is_some(), "missing entry for '{t}'");
        }
        assert_eq!(reg.entries().len(), SectionType::ALL.len());
    }

    #[test]
    fn test_only_header_is_required() {
        let reg = SectionTypeRegistry::builtin();
        let required: Vec<SectionType> = reg
            .entries()
            .iter()
            .filter(|e| e.required)
            .map(|e| e.section_type)
            .collect();
        assert_eq!(required, vec![SectionType::Header]);
    }

    #[test]
    fn test_default_types_in_declaration_order() {
        let reg = SectionTypeRegistry::builtin();
        let defaults: Vec<SectionType> = reg.default_types().collect();
        assert_eq!(
            defaults,
            vec![
                SectionType::Header,
                SectionType::Summary,
                SectionType::Experience,
                SectionType::Education,
                SectionType::Skills,
                SectionType::Contact,
            ]
        );
    }

    #[test]
    fn test_resolve_unregistered_type_degrades() {
        let reg = SectionTypeRegistry::new(vec![]);
        assert!(reg.lookup(SectionType::Header).is_none());
        let cfg = reg.resolve(SectionType::Header);
        assert_eq!(cfg.section_type, SectionType::Header);
        assert!(!cfg.required);
        assert_eq!(cfg.icon, DEFAULT_ICON);
        assert!(!reg.is_required(SectionType::Header));
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut reg = SectionTypeRegistry::builtin();
        let mut skills = reg.resolve(SectionType::Skills);
        skills.required = true;
        reg.register(skills);
        assert!(reg.is_required(SectionType::Skills));
        assert_eq!(reg.entries().len(), SectionType::ALL.len());
        assert_eq!(reg.entries()[4].section_type, SectionType::Skills);
    }

    #[test]
    fn test_section_type_from_str() {
        assert_eq!("skills".parse::<SectionType>(), Ok(SectionType::Skills));
        assert_eq!(" Header ".parse::<SectionType>(), Ok(SectionType::Header));
        assert!("blog".parse::<SectionType>().is_err());
    }

    #[test]
    fn test_section_type_display_matches_serde() {
        for t in SectionType::ALL {
            let json = serde_json::to_string(&t).expect("serialize type");
            assert_eq!(json, format!("\"{t}\""));
        }
    }

    #[test]
    fn test_only_custom_allows_multiple() {
        for t in SectionType::ALL {
            assert_eq!(t.allows_multiple(), t == SectionType::Custom);
        }
    }
}
