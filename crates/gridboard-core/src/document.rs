//! The authoritative dashboard document and its transition functions.
//!
//! A [`DashboardDocument`] is a normalized entity graph: widget instances
//! keyed by id, plus an ordered list of [`LayoutItem`]s carrying grid
//! geometry for exactly those ids. Transitions are methods taking `&mut self`
//! and an injected `now_ms` timestamp; the undo layer snapshots the document
//! before applying one.
//!
//! # Invariants
//!
//! 1. **Bijection**: after every completed transition,
//!    `instances.keys() == {item.id for item in layout}`. It may only be
//!    broken transiently inside a single transition body.
//! 2. **Totality**: every transition is a silent no-op when its target id is
//!    absent — races like delete-then-edit degrade gracefully instead of
//!    erroring.
//! 3. **Serializable props**: widget props are JSON object trees, so they
//!    round-trip through text without loss (serde_json has no NaN/inf or
//!    cyclic values to lose).
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Transition on missing id | No-op, returns `false`/`None` |
//! | `set_layout` with unknown ids | Unknown entries dropped, missing ones kept |
//! | Duplicate at right grid edge | `x` wraps modulo [`GRID_COLUMNS`] |

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::{DashboardId, WidgetId};

/// Schema version written into every document and export file.
pub const SCHEMA_VERSION: u32 = 1;

/// Column count of the placement grid. Duplication offsets wrap at this.
pub const GRID_COLUMNS: u32 = 12;

/// Name given to freshly created documents.
pub const DEFAULT_DASHBOARD_NAME: &str = "Untitled Dashboard";

/// A widget's configuration tree: string-keyed, arbitrarily nested JSON.
pub type PropsMap = Map<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Position and span of one widget on the grid, in whole cells.
///
/// Coordinates are non-negative by construction (`u32`); spans are expected
/// to be at least 1 and are validated at import boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    /// Column of the left edge.
    pub x: u32,
    /// Row of the top edge.
    pub y: u32,
    /// Width in cells (≥ 1).
    pub w: u32,
    /// Height in cells (≥ 1).
    pub h: u32,
}

impl GridRect {
    /// Create a rect. Spans of zero are lifted to 1 so a rect built from
    /// arbitrary input is always drawable.
    #[must_use]
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w: w.max(1),
            h: h.max(1),
        }
    }
}

/// Grid placement record for exactly one widget instance.
///
/// `id` equals the owning [`WidgetInstance`]'s id — it is a foreign key, not
/// a separate identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    /// Owning widget's id.
    pub id: WidgetId,
    /// Column of the left edge.
    pub x: u32,
    /// Row of the top edge.
    pub y: u32,
    /// Width in cells.
    pub w: u32,
    /// Height in cells.
    pub h: u32,
    /// Minimum width the surface may resize to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    /// Minimum height the surface may resize to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    /// Maximum width the surface may resize to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    /// Maximum height the surface may resize to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
    /// Locked widgets can neither move nor resize.
    #[serde(default)]
    pub locked: bool,
    /// Surface-level resize opt-out, independent of `locked`.
    #[serde(default)]
    pub no_resize: bool,
    /// Surface-level move opt-out, independent of `locked`.
    #[serde(default)]
    pub no_move: bool,
}

impl LayoutItem {
    /// Create a plain item at `rect` with no constraints or flags.
    #[must_use]
    pub fn new(id: WidgetId, rect: GridRect) -> Self {
        Self {
            id,
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            min_w: None,
            min_h: None,
            max_w: None,
            max_h: None,
            locked: false,
            no_resize: false,
            no_move: false,
        }
    }

    /// Current geometry as a rect.
    #[must_use]
    pub fn rect(&self) -> GridRect {
        GridRect {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    /// Overwrite geometry fields from `rect`. Flags and constraints are
    /// untouched.
    pub fn set_rect(&mut self, rect: GridRect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    /// Clamp a requested geometry to this item's min/max span constraints.
    ///
    /// Position is passed through unchanged; only spans are clamped. Used
    /// when surface-originated geometry events are translated into
    /// transitions.
    #[must_use]
    pub fn clamp_to_constraints(&self, rect: GridRect) -> GridRect {
        let mut w = rect.w.max(1);
        let mut h = rect.h.max(1);
        if let Some(min_w) = self.min_w {
            w = w.max(min_w);
        }
        if let Some(max_w) = self.max_w {
            w = w.min(max_w.max(1));
        }
        if let Some(min_h) = self.min_h {
            h = h.max(min_h);
        }
        if let Some(max_h) = self.max_h {
            h = h.min(max_h.max(1));
        }
        GridRect {
            x: rect.x,
            y: rect.y,
            w,
            h,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entities
// ─────────────────────────────────────────────────────────────────────────────

/// One configured widget, independent of its placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WidgetInstance {
    /// Globally unique, immutable primary key.
    pub id: WidgetId,
    /// Widget kind tag from the registry's closed set (e.g. `"chart"`).
    pub kind: String,
    /// Configuration tree handed to the kind's renderer.
    #[serde(default)]
    pub props: PropsMap,
    /// Creation time, milliseconds since epoch.
    pub created_at: u64,
    /// Last modification time, milliseconds since epoch.
    pub updated_at: u64,
}

/// Document-level bookkeeping timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Creation time, milliseconds since epoch.
    pub created_at: u64,
    /// Last transition time, milliseconds since epoch.
    pub updated_at: u64,
    /// Stamped when the document is exported to a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<u64>,
}

/// The aggregate root: everything the dashboard builder persists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardDocument {
    /// Schema version, [`SCHEMA_VERSION`] for documents built here.
    pub version: u32,
    /// Document identity. Replaced wholesale by import/reset.
    pub id: DashboardId,
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Widget instances keyed by id. Insertion order is irrelevant.
    #[serde(default)]
    pub instances: HashMap<WidgetId, WidgetInstance>,
    /// Grid placements, one per instance. Order is semantically irrelevant
    /// but preserved for stability.
    #[serde(default)]
    pub layout: Vec<LayoutItem>,
    /// Bookkeeping timestamps.
    pub meta: DocumentMeta,
}

impl DashboardDocument {
    /// Create a fresh, empty document with a new id.
    #[must_use]
    pub fn new(now_ms: u64) -> Self {
        Self {
            version: SCHEMA_VERSION,
            id: DashboardId::new(),
            name: DEFAULT_DASHBOARD_NAME.to_string(),
            description: None,
            instances: HashMap::new(),
            layout: Vec::new(),
            meta: DocumentMeta {
                created_at: now_ms,
                updated_at: now_ms,
                exported_at: None,
            },
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// Whether a widget with `id` exists.
    #[must_use]
    pub fn contains_widget(&self, id: WidgetId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Look up a widget instance.
    #[must_use]
    pub fn instance(&self, id: WidgetId) -> Option<&WidgetInstance> {
        self.instances.get(&id)
    }

    /// Look up the layout item for a widget.
    #[must_use]
    pub fn layout_item(&self, id: WidgetId) -> Option<&LayoutItem> {
        self.layout.iter().find(|item| item.id == id)
    }

    fn layout_item_mut(&mut self, id: WidgetId) -> Option<&mut LayoutItem> {
        self.layout.iter_mut().find(|item| item.id == id)
    }

    /// All widget ids, ordered. This is the target set reconciliation diffs
    /// against, so the ordering must be deterministic.
    #[must_use]
    pub fn widget_ids(&self) -> BTreeSet<WidgetId> {
        self.instances.keys().copied().collect()
    }

    /// Number of widgets.
    #[must_use]
    pub fn widget_count(&self) -> usize {
        self.instances.len()
    }

    /// Check the instance/layout bijection. True for every document produced
    /// by the transitions below; import validation rejects documents where
    /// this fails.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.instances.len() != self.layout.len() {
            return false;
        }
        let layout_ids: BTreeSet<WidgetId> = self.layout.iter().map(|item| item.id).collect();
        layout_ids.len() == self.layout.len() && layout_ids == self.widget_ids()
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    /// Insert a new widget and its layout item atomically.
    ///
    /// Both timestamps are stamped equal. The generated id is returned
    /// out-of-band so callers can chain a "select the new widget" step.
    pub fn add_widget(
        &mut self,
        kind: impl Into<String>,
        rect: GridRect,
        props: PropsMap,
        now_ms: u64,
    ) -> WidgetId {
        let id = WidgetId::new();
        self.instances.insert(
            id,
            WidgetInstance {
                id,
                kind: kind.into(),
                props,
                created_at: now_ms,
                updated_at: now_ms,
            },
        );
        self.layout.push(LayoutItem::new(id, rect));
        self.touch(now_ms);
        id
    }

    /// Shallow-merge `partial` into the widget's props.
    ///
    /// Top-level keys in `partial` overwrite existing keys wholesale; nested
    /// objects are replaced, not merged. Returns `false` (no-op) if the id is
    /// absent.
    pub fn update_widget_props(&mut self, id: WidgetId, partial: PropsMap, now_ms: u64) -> bool {
        let Some(instance) = self.instances.get_mut(&id) else {
            return false;
        };
        for (key, value) in partial {
            instance.props.insert(key, value);
        }
        instance.updated_at = now_ms;
        self.touch(now_ms);
        true
    }

    /// Overwrite only the geometry fields of the widget's layout item.
    ///
    /// The instance (and its `updated_at`) is untouched: geometry is surface
    /// state, not widget configuration. Returns `false` if the id is absent.
    pub fn move_resize_widget(&mut self, id: WidgetId, rect: GridRect, now_ms: u64) -> bool {
        let Some(item) = self.layout_item_mut(id) else {
            return false;
        };
        item.set_rect(rect);
        self.touch(now_ms);
        true
    }

    /// Delete both the instance and its layout entry. Returns `false` if the
    /// id is absent.
    pub fn remove_widget(&mut self, id: WidgetId, now_ms: u64) -> bool {
        if self.instances.remove(&id).is_none() {
            return false;
        }
        self.layout.retain(|item| item.id != id);
        self.touch(now_ms);
        true
    }

    /// Clone a widget under a new id with fresh timestamps.
    ///
    /// The copy lands at `x = (x+1) % GRID_COLUMNS`, `y = y+1` — a
    /// deterministic offset so it never exactly overlaps the original.
    /// Returns the new id, or `None` if the source id is absent.
    pub fn duplicate_widget(&mut self, id: WidgetId, now_ms: u64) -> Option<WidgetId> {
        let source = self.instances.get(&id)?;
        let source_item = self.layout_item(id)?.clone();

        let new_id = WidgetId::new();
        let clone = WidgetInstance {
            id: new_id,
            kind: source.kind.clone(),
            props: source.props.clone(),
            created_at: now_ms,
            updated_at: now_ms,
        };

        let mut item = source_item;
        item.id = new_id;
        item.x = (item.x + 1) % GRID_COLUMNS;
        item.y += 1;

        self.instances.insert(new_id, clone);
        self.layout.push(item);
        self.touch(now_ms);
        Some(new_id)
    }

    /// Insert a pre-built widget and placement, keeping their ids.
    ///
    /// Used when pasting a single-widget import. No-op returning `false` if
    /// the ids disagree or the id already exists (callers remap first).
    pub fn insert_widget(&mut self, widget: WidgetInstance, item: LayoutItem, now_ms: u64) -> bool {
        if widget.id != item.id || self.instances.contains_key(&widget.id) {
            return false;
        }
        self.instances.insert(widget.id, widget);
        self.layout.push(item);
        self.touch(now_ms);
        true
    }

    /// Flip the `locked` flag. Returns `false` if the id is absent.
    pub fn toggle_widget_lock(&mut self, id: WidgetId, now_ms: u64) -> bool {
        let Some(item) = self.layout_item_mut(id) else {
            return false;
        };
        item.locked = !item.locked;
        self.touch(now_ms);
        true
    }

    /// Wholesale replace the layout list (bulk reorder). Instances are not
    /// modified.
    ///
    /// To keep the bijection total: entries for unknown ids are dropped, and
    /// instances missing from `items` retain their previous layout entry
    /// (appended in prior order).
    pub fn set_layout(&mut self, items: Vec<LayoutItem>, now_ms: u64) {
        let offered = items.len();
        let mut seen: BTreeSet<WidgetId> = BTreeSet::new();
        let mut next: Vec<LayoutItem> = Vec::with_capacity(self.instances.len());
        for item in items {
            if self.instances.contains_key(&item.id) && seen.insert(item.id) {
                next.push(item);
            }
        }
        if next.len() < offered {
            tracing::debug!(
                offered,
                kept = next.len(),
                "set_layout dropped entries for unknown or duplicate ids"
            );
        }
        for item in &self.layout {
            if self.instances.contains_key(&item.id) && seen.insert(item.id) {
                next.push(item.clone());
            }
        }
        self.layout = next;
        self.touch(now_ms);
    }

    /// Wholesale replace this document with `doc`, re-stamping `updated_at`.
    pub fn import(&mut self, doc: DashboardDocument, now_ms: u64) {
        *self = doc;
        self.touch(now_ms);
    }

    /// Replace this document with a freshly created empty one (new id).
    pub fn reset(&mut self, now_ms: u64) {
        *self = DashboardDocument::new(now_ms);
    }

    fn touch(&mut self, now_ms: u64) {
        self.meta.updated_at = now_ms;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
