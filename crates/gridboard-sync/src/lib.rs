#![forbid(unsafe_code)]

//! One-directional reconciliation between the authoritative document and an
//! external, imperative layout surface.
//!
//! The surface (a grid engine owning its own DOM nodes and geometry
//! bookkeeping) is treated strictly as a cache: its internal state is never
//! read as truth. After every committed transition — including undo/redo and
//! transitions that originated *from* the surface — the [`reconcile`] pass
//! diffs the surface's id set against the document's and applies the minimal
//! add/remove/update operations to close the gap.
//!
//! The pass is idempotent: running it twice with no intervening transition
//! leaves the surface byte-identical after the second run. Surface-originated
//! geometry is simply overwritten with the value the surface already holds,
//! which keeps the algorithm uniform and loop-free.

pub mod handle;
pub mod reconciler;
pub mod surface;

pub use handle::{SharedSurface, active_surface, register_surface, unregister_surface};
pub use reconciler::{ReconcileReport, reconcile};
pub use surface::{GeometryPatch, LayoutSurface, SurfaceError, SurfaceEvent, SurfaceItem};
