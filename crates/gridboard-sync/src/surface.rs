//! The black-box contract with the external layout surface.
//!
//! The core talks to the surface through exactly these operations, and the
//! surface talks back through [`SurfaceEvent`]s. Nothing else about the
//! surface (its node tree, its internal geometry cache, its animation state)
//! is visible here.
//!
//! The `contains_node`/`purge_node` pair exists because some surface
//! implementations are unreliable on removal: they can drop an id from their
//! bookkeeping while leaving the node itself behind. The reconciler verifies
//! every removal with a direct query and sweeps stragglers by id.

use std::fmt;

use gridboard_core::{GridRect, LayoutItem, WidgetId};

/// Full overwrite of a surface entry's geometry and interaction flags.
///
/// This is deliberately not a partial patch: stale geometry must never
/// survive an update, so every field is always written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryPatch {
    /// Grid position and span.
    pub rect: GridRect,
    /// Whether the widget is locked.
    pub locked: bool,
    /// Whether the surface must refuse user moves.
    pub no_move: bool,
    /// Whether the surface must refuse user resizes.
    pub no_resize: bool,
}

impl GeometryPatch {
    /// Derive the patch from a layout item. A locked item implies both
    /// `no_move` and `no_resize` regardless of the item's own flags.
    #[must_use]
    pub fn from_item(item: &LayoutItem) -> Self {
        Self {
            rect: item.rect(),
            locked: item.locked,
            no_move: item.no_move || item.locked,
            no_resize: item.no_resize || item.locked,
        }
    }
}

/// Surface-native descriptor for adding one widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceItem {
    /// Widget id; the surface must track its node under this key.
    pub id: WidgetId,
    /// Widget kind tag, so the surface can mount the right renderer.
    pub kind: String,
    /// Initial geometry and flags.
    pub patch: GeometryPatch,
    /// Minimum width the surface may resize to.
    pub min_w: Option<u32>,
    /// Minimum height the surface may resize to.
    pub min_h: Option<u32>,
    /// Maximum width the surface may resize to.
    pub max_w: Option<u32>,
    /// Maximum height the surface may resize to.
    pub max_h: Option<u32>,
}

impl SurfaceItem {
    /// Build a descriptor from a layout item and its instance's kind.
    #[must_use]
    pub fn from_parts(item: &LayoutItem, kind: &str) -> Self {
        Self {
            id: item.id,
            kind: kind.to_string(),
            patch: GeometryPatch::from_item(item),
            min_w: item.min_w,
            min_h: item.min_h,
            max_w: item.max_w,
            max_h: item.max_h,
        }
    }
}

/// An operation the surface refused.
#[derive(Debug)]
pub struct SurfaceError {
    /// The widget the operation targeted.
    pub id: WidgetId,
    /// The surface's stated reason.
    pub reason: String,
}

impl SurfaceError {
    /// Build an error for `id`.
    #[must_use]
    pub fn new(id: WidgetId, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface rejected operation on {}: {}", self.id, self.reason)
    }
}

impl std::error::Error for SurfaceError {}

/// Event stream raised by the surface on user-driven interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The user dragged or resized a widget.
    ///
    /// `gesture` carries a key identifying one continuous gesture; events
    /// sharing the key coalesce into a single undo step. `None` marks a
    /// discrete, stand-alone adjustment.
    ItemMoved {
        /// The widget that moved.
        id: WidgetId,
        /// Its new geometry, in the surface's own bookkeeping.
        rect: GridRect,
        /// Continuous-gesture key, if any.
        gesture: Option<u64>,
    },
}

/// The five-operation contract consumed from the external layout surface,
/// plus the stale-node sweep hooks.
///
/// Implementations own their node tree exclusively; only the reconciler may
/// call the mutating methods.
pub trait LayoutSurface {
    /// Ids the surface currently tracks.
    fn current_ids(&self) -> Vec<WidgetId>;

    /// Mount a new widget.
    fn add(&mut self, item: SurfaceItem) -> Result<(), SurfaceError>;

    /// Unmount a widget.
    fn remove(&mut self, id: WidgetId) -> Result<(), SurfaceError>;

    /// Overwrite a widget's geometry and flags.
    fn update(&mut self, id: WidgetId, patch: GeometryPatch) -> Result<(), SurfaceError>;

    /// Direct query: does a node for `id` still exist, regardless of what
    /// the surface's own bookkeeping says?
    fn contains_node(&self, id: WidgetId) -> bool;

    /// Force-remove any leftover node for `id`.
    fn purge_node(&mut self, id: WidgetId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_item_implies_frozen_flags() {
        let mut item = LayoutItem::new(WidgetId::new(), GridRect::new(0, 0, 2, 2));
        item.locked = true;
        let patch = GeometryPatch::from_item(&item);
        assert!(patch.no_move);
        assert!(patch.no_resize);
    }

    #[test]
    fn unlocked_flags_pass_through() {
        let mut item = LayoutItem::new(WidgetId::new(), GridRect::new(0, 0, 2, 2));
        item.no_resize = true;
        let patch = GeometryPatch::from_item(&item);
        assert!(!patch.locked);
        assert!(!patch.no_move);
        assert!(patch.no_resize);
    }

    #[test]
    fn surface_item_carries_constraints() {
        let mut item = LayoutItem::new(WidgetId::new(), GridRect::new(1, 2, 3, 4));
        item.min_w = Some(2);
        item.max_h = Some(6);
        let descriptor = SurfaceItem::from_parts(&item, "chart");
        assert_eq!(descriptor.kind, "chart");
        assert_eq!(descriptor.min_w, Some(2));
        assert_eq!(descriptor.max_h, Some(6));
        assert_eq!(descriptor.patch.rect, GridRect::new(1, 2, 3, 4));
    }
}
