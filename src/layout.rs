//! Portal layout preferences.
//!
//! Spacing, arrangement and animation settings that apply to the portal as a
//! whole. They are orthogonal to section content and are saved together
//! with the section collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Longest accepted animation duration.
pub const MAX_ANIMATION_DURATION_MS: u32 = 10_000;

/// How sections are arranged on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    /// Single column, top to bottom.
    #[default]
    Vertical,
    /// Single row, left to right.
    Horizontal,
    /// Fixed grid cells.
    Grid,
    /// Staggered columns.
    Masonry,
}

/// Gap between sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Spacing {
    Compact,
    #[default]
    Normal,
    Relaxed,
}

impl Spacing {
    /// Blank lines between sections in text renderings.
    pub fn gap_lines(self) -> usize {
        match self {
            Spacing::Compact => 0,
            Spacing::Normal => 1,
            Spacing::Relaxed => 2,
        }
    }
}

/// Section transition animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Animation {
    pub enabled: bool,
    pub duration_ms: u32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 300,
        }
    }
}

/// Complete layout preferences for a portal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub layout: LayoutKind,
    pub spacing: Spacing,
    pub animation: Animation,
}

/// Partial update to a [`LayoutConfig`]. `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutConfigPatch {
    pub layout: Option<LayoutKind>,
    pub spacing: Option<Spacing>,
    pub animation_enabled: Option<bool>,
    pub animation_duration_ms: Option<u32>,
}

impl LayoutConfigPatch {
    /// Returns `true` if the patch sets nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl LayoutConfig {
    /// Returns a copy with `patch` applied.
    ///
    /// An animation duration above [`MAX_ANIMATION_DURATION_MS`] is a
    /// caller bug: it trips a debug assertion and is clamped in release.
    pub fn apply(self, patch: LayoutConfigPatch) -> Self {
        let mut next = self;
        if let Some(layout) = patch.layout {
            next.layout = layout;
        }
        if let Some(spacing) = patch.spacing {
            next.spacing = spacing;
        }
        if let Some(enabled) = patch.animation_enabled {
            next.animation.enabled = enabled;
        }
        if let Some(ms) = patch.animation_duration_ms {
            debug_assert!(
                ms <= MAX_ANIMATION_DURATION_MS,
                "animation duration {ms}ms exceeds {MAX_ANIMATION_DURATION_MS}ms"
            );
            next.animation.duration_ms = ms.min(MAX_ANIMATION_DURATION_MS);
        }
        next
    }
}

// ---------------------------------------------------------------------------
// String parsing for CLI and config
// ---------------------------------------------------------------------------

/// Error for layout values outside their closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLayoutError {
    /// Which setting was being parsed.
    pub field: &'static str,
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for ParseLayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.value)
    }
}

impl std::error::Error for ParseLayoutError {}

impl FromStr for LayoutKind {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vertical" => Ok(LayoutKind::Vertical),
            "horizontal" => Ok(LayoutKind::Horizontal),
            "grid" => Ok(LayoutKind::Grid),
            "masonry" => Ok(LayoutKind::Masonry),
            _ => Err(ParseLayoutError {
                field: "layout",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Spacing {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Spacing::Compact),
            "normal" => Ok(Spacing::Normal),
            "relaxed" => Ok(Spacing::Relaxed),
            _ => Err(ParseLayoutError {
                field: "spacing",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LayoutKind::Vertical => "vertical",
            LayoutKind::Horizontal => "horizontal",
            LayoutKind::Grid => "grid",
            LayoutKind::Masonry => "masonry",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Spacing::Compact => "compact",
            Spacing::Normal => "normal",
            Spacing::Relaxed => "relaxed",
        };
        write!(f, "{}", s)
    }
}
