//! Process-wide handle to the live layout surface.
//!
//! Many independent call sites (the store's dispatch path, undo/redo, import)
//! need the one live surface without threading it through every layer. This
//! is an explicit register/unregister lifecycle tied to the surface's own
//! create/destroy — not a general-purpose service locator: only the
//! reconciliation path reads it.

use std::sync::{Arc, LazyLock, Mutex, RwLock};

use crate::surface::LayoutSurface;

/// Shared ownership of the registered surface.
pub type SharedSurface = Arc<Mutex<dyn LayoutSurface + Send>>;

static ACTIVE_SURFACE: LazyLock<RwLock<Option<SharedSurface>>> =
    LazyLock::new(|| RwLock::new(None));

/// Register the live surface. Replaces any previous registration.
pub fn register_surface(surface: SharedSurface) {
    if let Ok(mut guard) = ACTIVE_SURFACE.write() {
        *guard = Some(surface);
    }
}

/// Fetch the registered surface, if one is live.
#[must_use]
pub fn active_surface() -> Option<SharedSurface> {
    ACTIVE_SURFACE
        .read()
        .ok()
        .and_then(|guard| guard.clone())
}

/// Drop the registration. Call when the surface is destroyed.
pub fn unregister_surface() {
    if let Ok(mut guard) = ACTIVE_SURFACE.write() {
        *guard = None;
    }
}
