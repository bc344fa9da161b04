//! Text rendering of a portal.
//!
//! Each section type gets a [`SectionRenderer`] that turns a section into
//! styled ratatui [`Line`]s. The [`RendererRegistry`] maps section types to
//! renderer factories; types without a dedicated renderer use the outline
//! renderer, which prints the title and a one-line data summary.
//!
//! [`render_portal`] lays out the visible sections of a collection in
//! order, honouring the portal's [`LayoutConfig`].
//!
//! # Example
//!
//! ```
//! use portal_sections::collection::SectionCollection;
//! use portal_sections::layout::LayoutConfig;
//! use portal_sections::registry::SectionTypeRegistry;
//! use portal_sections::render::{render_portal, RendererRegistry};
//!
//! let types = SectionTypeRegistry::builtin();
//! let sections = SectionCollection::defaults(&types);
//! let lines = render_portal(&sections, &LayoutConfig::default(), &types, &RendererRegistry::new(), 60);
//! assert!(!lines.is_empty());
//! ```

use std::collections::HashMap;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::collection::SectionCollection;
use crate::layout::{LayoutConfig, LayoutKind};
use crate::registry::{SectionType, SectionTypeRegistry};
use crate::section::Section;

/// Renders one section as styled text.
///
/// Renderers must be thread-safe so a host can render from any task.
pub trait SectionRenderer: Send + Sync {
    /// Body lines for `section`, excluding the title line.
    fn render_body(&self, section: &Section, width: u16) -> Vec<Line<'static>>;
}

/// Factory function type for creating renderer instances.
pub type RendererFactory = fn() -> Box<dyn SectionRenderer>;

/// Registry mapping section types to renderer factories.
pub struct RendererRegistry {
    factories: HashMap<SectionType, RendererFactory>,
}

impl RendererRegistry {
    /// Creates a registry with the built-in renderers.
    ///
    /// `header` and `contact` use the field renderer; list-shaped types use
    /// the item renderer; everything else falls back to the outline.
    pub fn new() -> Self {
        let mut reg = Self {
            factories: HashMap::new(),
        };
        reg.register(SectionType::Header, FieldRenderer::create);
        reg.register(SectionType::Contact, FieldRenderer::create);
        for section_type in [
            SectionType::Experience,
            SectionType::Education,
            SectionType::Skills,
            SectionType::Projects,
            SectionType::Achievements,
            SectionType::Certifications,
            SectionType::Languages,
            SectionType::Testimonials,
            SectionType::Portfolio,
            SectionType::Social,
        ] {
            reg.register(section_type, ItemsRenderer::create);
        }
        reg
    }

    /// Register a renderer factory for `section_type`.
    ///
    /// Overwrites any existing factory for the same type.
    pub fn register(&mut self, section_type: SectionType, factory: RendererFactory) {
        self.factories.insert(section_type, factory);
    }

    /// Create the renderer for `section_type`, falling back to the outline.
    pub fn create(&self, section_type: SectionType) -> Box<dyn SectionRenderer> {
        match self.factories.get(&section_type) {
            Some(factory) => factory(),
            None => OutlineRenderer::create(),
        }
    }

    /// Returns `true` if a dedicated renderer is registered for the type.
    pub fn has_renderer(&self, section_type: SectionType) -> bool {
        self.factories.contains_key(&section_type)
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the visible sections of `collection` in order.
///
/// Each section gets a bold title line followed by its body (or a loading
/// or error marker from its transient status). Sections are separated by
/// [`Spacing::gap_lines`](crate::layout::Spacing::gap_lines) blank lines.
/// A horizontal layout collapses to a single line of titles; grid and
/// masonry render as a vertical list in text form.
pub fn render_portal(
    collection: &SectionCollection,
    layout_config: &LayoutConfig,
    types: &SectionTypeRegistry,
    renderers: &RendererRegistry,
    width: u16,
) -> Vec<Line<'static>> {
    if collection.visible_len() == 0 {
        return vec![Line::styled(
            "(no visible sections)",
            Style::default().add_modifier(Modifier::DIM),
        )];
    }

    if layout_config.layout == LayoutKind::Horizontal {
        let mut spans = Vec::new();
        for (i, section) in collection.visible().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
            }
            spans.push(Span::styled(section.label(types).to_string(), title_style()));
        }
        return vec![Line::from(spans)];
    }

    let gap = layout_config.spacing.gap_lines();
    let mut lines = Vec::new();
    for (i, section) in collection.visible().enumerate() {
        if i > 0 {
            lines.extend(std::iter::repeat_with(Line::default).take(gap));
        }
        lines.push(title_line(section, types));
        if let Some(error) = &section.status.error {
            lines.push(Line::styled(
                format!("  ! {}", error),
                Style::default().fg(Color::Red),
            ));
        } else if section.status.loading {
            lines.push(Line::styled(
                "  loading…",
                Style::default().add_modifier(Modifier::DIM),
            ));
        } else {
            let renderer = renderers.create(section.section_type);
            lines.extend(renderer.render_body(section, width));
        }
    }
    lines
}

fn title_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn title_line(section: &Section, types: &SectionTypeRegistry) -> Line<'static> {
    let icon = types.resolve(section.section_type).icon;
    Line::from(vec![
        Span::styled(format!("[{}] ", icon), Style::default().fg(Color::DarkGray)),
        Span::styled(section.label(types).to_string(), title_style()),
    ])
}

/// Indents `text` by two columns and truncates it to `width`.
fn body_line(text: &str, width: u16) -> Line<'static> {
    Line::raw(truncate(&format!("  {}", text), width as usize))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 1 {
        return "…".chars().take(width).collect();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

/// Short human form of a JSON scalar or object.
fn describe(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(format!("{} items", items.len())),
        Value::Object(map) => ["title", "name", "label"]
            .iter()
            .find_map(|key| map.get(*key).and_then(describe)),
    }
}

// ---------------------------------------------------------------------------
// Built-in renderers
// ---------------------------------------------------------------------------

/// Fallback renderer: a single summary line of the data payload.
struct OutlineRenderer;

impl OutlineRenderer {
    fn create() -> Box<dyn SectionRenderer> {
        Box::new(Self)
    }
}

impl SectionRenderer for OutlineRenderer {
    fn render_body(&self, section: &Section, width: u16) -> Vec<Line<'static>> {
        let summary = match &section.data {
            Value::Object(map) if map.is_empty() => None,
            Value::Object(map) => {
                let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
                keys.sort_unstable();
                Some(keys.join(", "))
            }
            other => describe(other),
        };
        match summary {
            Some(summary) => vec![body_line(&summary, width)],
            None => vec![Line::styled(
                "  (empty)",
                Style::default().add_modifier(Modifier::DIM),
            )],
        }
    }
}

/// Renders the scalar fields of an object payload as `key: value` lines.
struct FieldRenderer;

impl FieldRenderer {
    fn create() -> Box<dyn SectionRenderer> {
        Box::new(Self)
    }
}

impl SectionRenderer for FieldRenderer {
    fn render_body(&self, section: &Section, width: u16) -> Vec<Line<'static>> {
        let Value::Object(map) = &section.data else {
            return OutlineRenderer.render_body(section, width);
        };
        let mut fields: Vec<(&String, String)> = map
            .iter()
            .filter(|(_, v)| !v.is_array() && !v.is_object())
            .filter_map(|(k, v)| describe(v).map(|text| (k, text)))
            .collect();
        if fields.is_empty() {
            return OutlineRenderer.render_body(section, width);
        }
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
            .into_iter()
            .map(|(key, text)| body_line(&format!("{}: {}", key, text), width))
            .collect()
    }
}

/// Renders `data.items` as a bulleted list.
struct ItemsRenderer;

impl ItemsRenderer {
    fn create() -> Box<dyn SectionRenderer> {
        Box::new(Self)
    }
}

impl SectionRenderer for ItemsRenderer {
    fn render_body(&self, section: &Section, width: u16) -> Vec<Line<'static>> {
        let items = match section.data.get("items").and_then(Value::as_array) {
            Some(items) if !items.is_empty() => items,
            _ => return OutlineRenderer.render_body(section, width),
        };
        items
            .iter()
            .map(|item| {
                let text = describe(item).unwrap_or_else(|| "(untitled)".to_string());
                body_line(&format!("• {}", text), width)
            })
            .collect()
    }
}
