//! Full-loop test through the process-wide surface handle.
//!
//! The handle is process-global state, so this file contains exactly one
//! test: parallel tests in the same binary would reconcile into each other's
//! surfaces.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use gridboard::{
    Action, DashboardStore, GeometryPatch, GridRect, LayoutSurface, MemoryStore, SurfaceError,
    SurfaceEvent, SurfaceItem, StoreConfig, WidgetId, WidgetRegistry, register_surface,
    unregister_surface,
};

#[derive(Default)]
struct FakeSurface {
    tracked: BTreeMap<WidgetId, GeometryPatch>,
}

impl LayoutSurface for FakeSurface {
    fn current_ids(&self) -> Vec<WidgetId> {
        self.tracked.keys().copied().collect()
    }

    fn add(&mut self, item: SurfaceItem) -> Result<(), SurfaceError> {
        self.tracked.insert(item.id, item.patch);
        Ok(())
    }

    fn remove(&mut self, id: WidgetId) -> Result<(), SurfaceError> {
        self.tracked.remove(&id);
        Ok(())
    }

    fn update(&mut self, id: WidgetId, patch: GeometryPatch) -> Result<(), SurfaceError> {
        if let Some(entry) = self.tracked.get_mut(&id) {
            *entry = patch;
        }
        Ok(())
    }

    fn contains_node(&self, id: WidgetId) -> bool {
        self.tracked.contains_key(&id)
    }

    fn purge_node(&mut self, id: WidgetId) {
        self.tracked.remove(&id);
    }
}

fn assert_in_sync(store: &DashboardStore, surface: &Arc<Mutex<FakeSurface>>) {
    let guard = surface.lock().unwrap();
    let surface_ids: Vec<WidgetId> = guard.current_ids();
    let mut doc_ids: Vec<WidgetId> = store.document().widget_ids().into_iter().collect();
    doc_ids.sort_unstable();
    assert_eq!(surface_ids, doc_ids, "surface ids diverged from document");
    for item in &store.document().layout {
        assert_eq!(
            guard.tracked[&item.id],
            GeometryPatch::from_item(item),
            "surface geometry diverged for {}",
            item.id
        );
    }
}

#[test]
fn every_transition_keeps_the_registered_surface_in_sync() {
    let surface = Arc::new(Mutex::new(FakeSurface::default()));
    register_surface(surface.clone());

    let mut store = DashboardStore::new_at(
        WidgetRegistry::with_basic_kinds(),
        Box::new(MemoryStore::new()),
        StoreConfig::default(),
        1_000,
    );
    let t0 = Instant::now();

    // Add two widgets.
    let a = store
        .dispatch_at(
            Action::AddWidget {
                kind: "chart".to_string(),
                rect: GridRect::new(0, 0, 6, 4),
                props: None,
            },
            t0,
            2_000,
        )
        .created()
        .unwrap();
    let b = store
        .dispatch_at(
            Action::AddWidget {
                kind: "text".to_string(),
                rect: GridRect::new(6, 0, 3, 2),
                props: None,
            },
            t0,
            2_001,
        )
        .created()
        .unwrap();
    assert_in_sync(&store, &surface);

    // Programmatic move.
    store.dispatch_at(
        Action::MoveResizeWidget {
            id: a,
            rect: GridRect::new(2, 3, 6, 4),
            gesture: None,
        },
        t0,
        2_002,
    );
    assert_in_sync(&store, &surface);

    // Surface-originated drag: the surface already holds the new geometry;
    // the re-overwrite must be harmless.
    {
        let mut guard = surface.lock().unwrap();
        let entry = guard.tracked.get_mut(&b).unwrap();
        entry.rect = GridRect::new(8, 2, 3, 2);
    }
    store.apply_surface_event_at(
        SurfaceEvent::ItemMoved {
            id: b,
            rect: GridRect::new(8, 2, 3, 2),
            gesture: None,
        },
        t0,
        2_003,
    );
    assert_in_sync(&store, &surface);

    // Lock flows through to the surface flags.
    store.dispatch_at(Action::ToggleWidgetLock { id: a }, t0, 2_004);
    assert_in_sync(&store, &surface);
    assert!(surface.lock().unwrap().tracked[&a].no_move);

    // Remove, then undo it back — both directions reconcile.
    store.dispatch_at(Action::RemoveWidget { id: b }, t0, 2_005);
    assert_in_sync(&store, &surface);
    assert!(!surface.lock().unwrap().contains_node(b));

    assert!(store.undo_at(t0));
    assert_in_sync(&store, &surface);
    assert!(surface.lock().unwrap().contains_node(b));

    // Wholesale replace via reset, then undo back to the full document.
    store.dispatch_at(Action::ResetDashboard, t0, 2_006);
    assert_in_sync(&store, &surface);
    assert!(surface.lock().unwrap().current_ids().is_empty());

    assert!(store.undo_at(t0));
    assert_in_sync(&store, &surface);
    assert_eq!(surface.lock().unwrap().current_ids().len(), 2);

    unregister_surface();
}
