//! Drag-and-drop adapter.
//!
//! The host's drag library reports hover events as `(drag_index,
//! hover_index)` pairs over the visible section list. This module turns
//! those events into engine moves.
//!
//! # Hover rule
//!
//! A sortable list should not swap the moment the pointer enters a
//! neighbour, or items flicker back and forth. [`crosses_midpoint`] only
//! allows a move once the pointer has passed the middle of the hovered
//! item in the direction of travel.
//!
//! [`DragSession`] keeps the dragged item's current index across hover
//! events, so each event moves from where the item is now rather than
//! where the drag started.

use crate::engine::{Change, SectionLayoutEngine};

/// Anything that can move an item within an ordered visible list.
pub trait Reorder {
    /// Move the item at `from` to `to`. Returns `true` if the order changed.
    fn move_item(&self, from: usize, to: usize) -> bool;
}

impl Reorder for SectionLayoutEngine {
    fn move_item(&self, from: usize, to: usize) -> bool {
        self.move_section(from, to) == Change::Applied
    }
}

/// Vertical extent of the hovered item, in the host's coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverRect {
    pub top: f32,
    pub bottom: f32,
}

impl HoverRect {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }

    pub fn middle(&self) -> f32 {
        self.top + (self.bottom - self.top) / 2.0
    }
}

/// Returns `true` if a drag from `drag_index` over `hover_index` with the
/// pointer at `pointer_y` should move the item.
///
/// Dragging down moves only once the pointer is at or below the hovered
/// item's middle; dragging up, at or above it.
pub fn crosses_midpoint(
    drag_index: usize,
    hover_index: usize,
    rect: HoverRect,
    pointer_y: f32,
) -> bool {
    if drag_index == hover_index {
        return false;
    }
    let middle = rect.middle();
    if drag_index < hover_index {
        pointer_y >= middle
    } else {
        pointer_y <= middle
    }
}

/// One drag gesture, from pickup to drop or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    origin: usize,
    current: usize,
}

impl DragSession {
    /// Starts dragging the visible item at `index`.
    pub fn begin(index: usize) -> Self {
        tracing::trace!("Drag started at {}", index);
        Self {
            origin: index,
            current: index,
        }
    }

    /// Index the drag started from.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Index the dragged item occupies now.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Returns `true` if the item is away from where it started.
    pub fn has_moved(&self) -> bool {
        self.origin != self.current
    }

    /// Moves the dragged item onto `hover_index`. Returns `true` if it moved.
    pub fn hover<R: Reorder + ?Sized>(&mut self, target: &R, hover_index: usize) -> bool {
        if hover_index == self.current {
            return false;
        }
        if target.move_item(self.current, hover_index) {
            self.current = hover_index;
            true
        } else {
            false
        }
    }

    /// Like [`hover`](Self::hover), but applies the midpoint rule first.
    pub fn hover_at<R: Reorder + ?Sized>(
        &mut self,
        target: &R,
        hover_index: usize,
        rect: HoverRect,
        pointer_y: f32,
    ) -> bool {
        if !crosses_midpoint(self.current, hover_index, rect, pointer_y) {
            return false;
        }
        self.hover(target, hover_index)
    }

    /// Abandons the drag and moves the item back to its origin.
    ///
    /// Only the visible order is restored. Every move places hidden sections
    /// after the visible ones, so a hidden section that sat between visible
    /// ones before the drag ends up at the end. The engine stays dirty until
    /// saved or discarded; use `discard` to get the saved order back exactly.
    pub fn cancel<R: Reorder + ?Sized>(self, target: &R) -> bool {
        if !self.has_moved() {
            return false;
        }
        tracing::debug!("Drag cancelled, {} -> {}", self.current, self.origin);
        target.move_item(self.current, self.origin)
    }

    /// Ends the drag. Returns `(origin, final_index)` if the item moved.
    pub fn finish(self) -> Option<(usize, usize)> {
        self.has_moved().then_some((self.origin, self.current))
    }
}
