//! The id-set diff pass.
//!
//! Given the authoritative document and the surface's currently tracked ids,
//! compute and apply the minimal operation set:
//!
//! 1. `current \ target` → remove (verified, with stale-node sweep),
//! 2. `target \ current` → add,
//! 3. `target ∩ current` → full geometry/flag overwrite.
//!
//! Removals run before additions so a transient id collision is impossible
//! within one pass. Iteration is over ordered sets, so the operation sequence
//! is deterministic for a given document/surface pair.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Surface rejects an op | Logged, counted in `failed`, pass continues |
//! | Stale node after remove | Logged, swept by id, counted in `swept` |
//! | Id in both sets, item vanished mid-pass | Skipped (cannot happen single-threaded) |

use std::collections::BTreeSet;

use gridboard_core::{DashboardDocument, WidgetId};
use tracing::{debug, warn};

use crate::surface::{GeometryPatch, LayoutSurface, SurfaceItem};

/// Counters describing what one reconciliation pass did.
///
/// `updated` counts every id in the intersection — an unchanged widget still
/// receives its (idempotent) overwrite, by design.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Widgets mounted.
    pub added: usize,
    /// Widgets unmounted.
    pub removed: usize,
    /// Geometry overwrites issued.
    pub updated: usize,
    /// Stale nodes force-removed after an unreliable `remove`.
    pub swept: usize,
    /// Operations the surface rejected.
    pub failed: usize,
}

impl ReconcileReport {
    /// Whether every issued operation succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Make `surface` match `doc`. See the module docs for the algorithm.
///
/// Never panics and never propagates surface errors; partial reconciliation
/// is preferable to none.
pub fn reconcile(doc: &DashboardDocument, surface: &mut dyn LayoutSurface) -> ReconcileReport {
    let current: BTreeSet<WidgetId> = surface.current_ids().into_iter().collect();
    let target = doc.widget_ids();
    let mut report = ReconcileReport::default();

    // Removals first, so additions below can never collide with an id that
    // is on its way out.
    for &id in current.difference(&target) {
        match surface.remove(id) {
            Ok(()) => report.removed += 1,
            Err(err) => {
                warn!(id = %id, error = %err, "surface remove failed");
                report.failed += 1;
            }
        }
        // The surface's removal API is not always reliable: verify by direct
        // query and sweep anything it left behind.
        if surface.contains_node(id) {
            warn!(id = %id, "stale surface node after remove, sweeping");
            surface.purge_node(id);
            report.swept += 1;
        }
    }

    for &id in target.difference(&current) {
        let Some(instance) = doc.instance(id) else {
            continue;
        };
        let Some(item) = doc.layout_item(id) else {
            continue;
        };
        match surface.add(SurfaceItem::from_parts(item, &instance.kind)) {
            Ok(()) => report.added += 1,
            Err(err) => {
                warn!(id = %id, error = %err, "surface add failed");
                report.failed += 1;
            }
        }
    }

    for &id in target.intersection(&current) {
        let Some(item) = doc.layout_item(id) else {
            continue;
        };
        match surface.update(id, GeometryPatch::from_item(item)) {
            Ok(()) => report.updated += 1,
            Err(err) => {
                warn!(id = %id, error = %err, "surface update failed");
                report.failed += 1;
            }
        }
    }

    debug!(
        added = report.added,
        removed = report.removed,
        updated = report.updated,
        swept = report.swept,
        failed = report.failed,
        "reconcile pass complete"
    );
    report
}
