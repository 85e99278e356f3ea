//! Viewport-aware placement of floating overlays
//!
//! Overlays (row action menus, the advanced filter popover) are anchored to
//! the cell that opened them and drawn over the whole frame, so they are
//! never clipped by the table body. Placement is computed when the overlay
//! opens and thrown away when it closes.

use ratatui::layout::{Position, Rect};

/// Rows between the trigger and the overlay
pub const OVERLAY_GAP: u16 = 0;

/// Which trigger edge the overlay lines up with horizontally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Overlay's left edge on the trigger's left edge (filter popover)
    Left,
    /// Overlay's right edge on the trigger's right edge (action menus)
    Right,
}

/// Computed placement of an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayPosition {
    pub top: u16,
    pub left: u16,
    pub show_above: bool,
}

impl OverlayPosition {
    /// Screen area for an overlay of `width`×`height`, clipped to `viewport`
    pub fn area(&self, width: u16, height: u16, viewport: Rect) -> Rect {
        Rect::new(self.left, self.top, width, height).intersection(viewport)
    }
}

/// Place an overlay of `width`×`height` next to `trigger` inside `viewport`
///
/// The overlay goes above the trigger only when the space below is smaller
/// than its height and the space above is larger; otherwise it goes below.
pub fn compute_position(
    trigger: Rect,
    viewport: Rect,
    width: u16,
    height: u16,
    anchor: Anchor,
    gap: u16,
) -> OverlayPosition {
    let space_below = viewport.bottom().saturating_sub(trigger.bottom());
    let space_above = trigger.top().saturating_sub(viewport.top());
    let show_above = space_below < height && space_above > height;

    let top = if show_above {
        // Bottom edge sits `gap` rows above the trigger
        let bottom = viewport.bottom().saturating_sub(trigger.top()) + gap;
        viewport.bottom().saturating_sub(bottom + height)
    } else {
        trigger.bottom() + gap
    };

    let left = match anchor {
        Anchor::Left => trigger.left(),
        Anchor::Right => trigger.right().saturating_sub(width),
    };
    let max_left = viewport.right().saturating_sub(width).max(viewport.left());
    let left = left.clamp(viewport.left(), max_left);

    OverlayPosition {
        top,
        left,
        show_above,
    }
}

/// What an open overlay belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayKind {
    /// Action menu of the row with this key
    RowActions { row_key: String },
    /// Advanced filter popover
    FilterPopover,
}

/// The single open overlay of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOverlay {
    pub kind: OverlayKind,
    pub trigger: Rect,
    pub position: OverlayPosition,
    pub area: Rect,
    /// Area of a nested selection dropdown shown inside the overlay
    pub nested: Option<Rect>,
}

impl OpenOverlay {
    pub fn open(
        kind: OverlayKind,
        trigger: Rect,
        viewport: Rect,
        width: u16,
        height: u16,
        anchor: Anchor,
    ) -> Self {
        let position = compute_position(trigger, viewport, width, height, anchor, OVERLAY_GAP);
        Self {
            kind,
            trigger,
            position,
            area: position.area(width, height, viewport),
            nested: None,
        }
    }

    /// Whether a pointer-down at (`column`, `row`) should close the overlay
    pub fn is_outside(&self, column: u16, row: u16) -> bool {
        let at = Position::new(column, row);
        !self.area.contains(at)
            && !self.trigger.contains(at)
            && !self.nested.is_some_and(|n| n.contains(at))
    }
}
