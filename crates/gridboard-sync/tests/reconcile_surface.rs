//! Reconciliation behavior against a scripted fake surface.
//!
//! The fake records every operation, can be told to misbehave (leave stale
//! nodes behind on remove, reject specific adds), and exposes its retained
//! state for equality checks.
//!
//! # Invariants exercised
//!
//! 1. After any pass, surface ids equal document ids and geometry matches.
//! 2. Removals are issued before additions within one pass.
//! 3. A second pass with no intervening transition changes nothing.
//! 4. Stale nodes left by an unreliable remove are swept by id.
//! 5. A rejected operation does not abort the pass.

use std::collections::{BTreeMap, BTreeSet};

use gridboard_core::{DashboardDocument, GridRect, PropsMap, WidgetId};
use gridboard_sync::{GeometryPatch, LayoutSurface, SurfaceError, SurfaceItem, reconcile};

const T0: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Add(WidgetId),
    Remove(WidgetId),
    Update(WidgetId),
    Purge(WidgetId),
}

#[derive(Default)]
struct RecordingSurface {
    tracked: BTreeMap<WidgetId, (String, GeometryPatch)>,
    nodes: BTreeSet<WidgetId>,
    ops: Vec<Op>,
    sloppy_remove: bool,
    reject_adds: BTreeSet<WidgetId>,
    reject_updates: BTreeSet<WidgetId>,
}

impl RecordingSurface {
    fn state(&self) -> (BTreeMap<WidgetId, (String, GeometryPatch)>, BTreeSet<WidgetId>) {
        (self.tracked.clone(), self.nodes.clone())
    }
}

impl LayoutSurface for RecordingSurface {
    fn current_ids(&self) -> Vec<WidgetId> {
        self.tracked.keys().copied().collect()
    }

    fn add(&mut self, item: SurfaceItem) -> Result<(), SurfaceError> {
        if self.reject_adds.contains(&item.id) {
            return Err(SurfaceError::new(item.id, "invalid geometry"));
        }
        self.ops.push(Op::Add(item.id));
        self.nodes.insert(item.id);
        self.tracked.insert(item.id, (item.kind, item.patch));
        Ok(())
    }

    fn remove(&mut self, id: WidgetId) -> Result<(), SurfaceError> {
        self.ops.push(Op::Remove(id));
        self.tracked.remove(&id);
        if !self.sloppy_remove {
            self.nodes.remove(&id);
        }
        Ok(())
    }

    fn update(&mut self, id: WidgetId, patch: GeometryPatch) -> Result<(), SurfaceError> {
        if self.reject_updates.contains(&id) {
            return Err(SurfaceError::new(id, "update refused"));
        }
        self.ops.push(Op::Update(id));
        if let Some(entry) = self.tracked.get_mut(&id) {
            entry.1 = patch;
        }
        Ok(())
    }

    fn contains_node(&self, id: WidgetId) -> bool {
        self.nodes.contains(&id)
    }

    fn purge_node(&mut self, id: WidgetId) {
        self.ops.push(Op::Purge(id));
        self.nodes.remove(&id);
    }
}

fn doc_with_widgets(count: usize) -> (DashboardDocument, Vec<WidgetId>) {
    let mut doc = DashboardDocument::new(T0);
    let ids = (0..count)
        .map(|i| {
            doc.add_widget(
                "chart",
                GridRect::new((i as u32) % 12, i as u32, 2, 2),
                PropsMap::new(),
                T0,
            )
        })
        .collect();
    (doc, ids)
}

fn assert_surface_matches(doc: &DashboardDocument, surface: &RecordingSurface) {
    let surface_ids: BTreeSet<WidgetId> = surface.current_ids().into_iter().collect();
    assert_eq!(surface_ids, doc.widget_ids(), "id sets diverged");
    for item in &doc.layout {
        let (kind, patch) = &surface.tracked[&item.id];
        assert_eq!(kind, &doc.instance(item.id).unwrap().kind);
        assert_eq!(patch, &GeometryPatch::from_item(item), "geometry diverged");
    }
}

#[test]
fn initial_pass_mounts_everything() {
    let (doc, _) = doc_with_widgets(3);
    let mut surface = RecordingSurface::default();

    let report = reconcile(&doc, &mut surface);
    assert_eq!(report.added, 3);
    assert_eq!(report.removed, 0);
    assert!(report.is_clean());
    assert_surface_matches(&doc, &surface);
}

#[test]
fn pass_is_idempotent() {
    let (doc, _) = doc_with_widgets(4);
    let mut surface = RecordingSurface::default();

    reconcile(&doc, &mut surface);
    let after_first = surface.state();

    let report = reconcile(&doc, &mut surface);
    assert_eq!(surface.state(), after_first, "second pass must be a no-op");
    assert_eq!(report.added, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(report.updated, 4);
    assert!(report.is_clean());
}

#[test]
fn removals_precede_additions() {
    let (mut doc, ids) = doc_with_widgets(2);
    let mut surface = RecordingSurface::default();
    reconcile(&doc, &mut surface);

    doc.remove_widget(ids[0], T0 + 1);
    doc.add_widget("table", GridRect::new(5, 5, 3, 3), PropsMap::new(), T0 + 1);
    surface.ops.clear();
    reconcile(&doc, &mut surface);

    let first_add = surface
        .ops
        .iter()
        .position(|op| matches!(op, Op::Add(_)))
        .expect("one add expected");
    let last_remove = surface
        .ops
        .iter()
        .rposition(|op| matches!(op, Op::Remove(_)))
        .expect("one remove expected");
    assert!(last_remove < first_add, "removals must run first: {:?}", surface.ops);
    assert_surface_matches(&doc, &surface);
}

#[test]
fn stale_nodes_are_swept_by_id() {
    let (mut doc, ids) = doc_with_widgets(2);
    let mut surface = RecordingSurface::default();
    reconcile(&doc, &mut surface);

    surface.sloppy_remove = true;
    doc.remove_widget(ids[0], T0 + 1);
    let report = reconcile(&doc, &mut surface);

    assert_eq!(report.removed, 1);
    assert_eq!(report.swept, 1);
    assert!(
        !surface.contains_node(ids[0]),
        "leftover node must be purged"
    );
    assert!(surface.ops.contains(&Op::Purge(ids[0])));
    assert_surface_matches(&doc, &surface);
}

#[test]
fn rejected_add_does_not_abort_pass() {
    let (doc, ids) = doc_with_widgets(3);
    let mut surface = RecordingSurface::default();
    surface.reject_adds.insert(ids[1]);

    let report = reconcile(&doc, &mut surface);
    assert_eq!(report.added, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.is_clean());

    let surface_ids: BTreeSet<WidgetId> = surface.current_ids().into_iter().collect();
    assert!(surface_ids.contains(&ids[0]));
    assert!(surface_ids.contains(&ids[2]));
    assert!(!surface_ids.contains(&ids[1]));

    // Once the surface stops rejecting, the next pass converges.
    surface.reject_adds.clear();
    let report = reconcile(&doc, &mut surface);
    assert!(report.is_clean());
    assert_surface_matches(&doc, &surface);
}

#[test]
fn rejected_update_leaves_other_widgets_synced() {
    let (mut doc, ids) = doc_with_widgets(2);
    let mut surface = RecordingSurface::default();
    reconcile(&doc, &mut surface);

    doc.move_resize_widget(ids[0], GridRect::new(9, 9, 1, 1), T0 + 1);
    doc.move_resize_widget(ids[1], GridRect::new(4, 4, 2, 2), T0 + 1);
    surface.reject_updates.insert(ids[0]);
    let report = reconcile(&doc, &mut surface);

    assert_eq!(report.failed, 1);
    assert_eq!(
        surface.tracked[&ids[1]].1.rect,
        GridRect::new(4, 4, 2, 2),
        "healthy widget must still be updated"
    );
}

#[test]
fn update_overwrites_lock_flags() {
    let (mut doc, ids) = doc_with_widgets(1);
    let mut surface = RecordingSurface::default();
    reconcile(&doc, &mut surface);

    doc.toggle_widget_lock(ids[0], T0 + 1);
    reconcile(&doc, &mut surface);
    let patch = surface.tracked[&ids[0]].1;
    assert!(patch.locked && patch.no_move && patch.no_resize);

    doc.toggle_widget_lock(ids[0], T0 + 2);
    reconcile(&doc, &mut surface);
    let patch = surface.tracked[&ids[0]].1;
    assert!(!patch.locked && !patch.no_move && !patch.no_resize);
}

#[test]
fn wholesale_replace_uses_the_same_diff() {
    let (doc_a, _) = doc_with_widgets(3);
    let (doc_b, _) = doc_with_widgets(2);
    let mut surface = RecordingSurface::default();

    reconcile(&doc_a, &mut surface);
    let report = reconcile(&doc_b, &mut surface);

    assert_eq!(report.removed, 3);
    assert_eq!(report.added, 2);
    assert_surface_matches(&doc_b, &surface);
}

#[test]
fn self_originated_geometry_is_harmlessly_overwritten() {
    let (mut doc, ids) = doc_with_widgets(1);
    let mut surface = RecordingSurface::default();
    reconcile(&doc, &mut surface);

    // The surface already holds the post-drag geometry (it originated the
    // event); the document catches up, then reconciliation re-overwrites.
    let dragged = GridRect::new(7, 3, 4, 2);
    if let Some(entry) = surface.tracked.get_mut(&ids[0]) {
        entry.1.rect = dragged;
    }
    doc.move_resize_widget(ids[0], dragged, T0 + 1);

    let before = surface.state();
    let report = reconcile(&doc, &mut surface);
    assert_eq!(surface.state(), before, "redundant update must be harmless");
    assert_eq!(report.updated, 1);
}
