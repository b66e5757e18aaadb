#![forbid(unsafe_code)]

//! Gridboard public facade crate.
//!
//! Re-exports the stable surface area from the internal crates and provides
//! [`DashboardStore`], the single entry point a host application drives:
//! dispatch transitions, forward surface events, call [`DashboardStore::tick`]
//! from the event loop, and read the document back out.

use std::fmt;

mod action;
mod store;

pub use action::{Action, DispatchOutcome};
pub use store::{DEFAULT_STORAGE_KEY, DashboardStore, StoreConfig};

// --- Core re-exports -------------------------------------------------------

pub use gridboard_core::{
    DEFAULT_DASHBOARD_NAME, DashboardDocument, DashboardId, DocumentMeta, ExportFile, GRID_COLUMNS,
    GridRect, Import, ImportError, LayoutItem, PropsMap, SCHEMA_VERSION, WidgetId, WidgetInstance,
    WidgetKind, WidgetRegistry,
};

// --- History re-exports ----------------------------------------------------

pub use gridboard_history::{DEFAULT_HISTORY_LIMIT, EntryKind, GroupKey, History};

// --- Sync re-exports -------------------------------------------------------

pub use gridboard_sync::{
    GeometryPatch, LayoutSurface, ReconcileReport, SharedSurface, SurfaceError, SurfaceEvent,
    SurfaceItem, active_surface, reconcile, register_surface, unregister_surface,
};

// --- Persistence re-exports ------------------------------------------------

pub use gridboard_persist::{
    DocumentStore, FileStore, MemoryStore, SaveScheduler, SaveState, SaveStatus, SchedulerConfig,
    StorageError,
};

// --- Errors ----------------------------------------------------------------

/// Top-level error type for facade operations.
#[derive(Debug)]
pub enum Error {
    /// An import payload was rejected.
    Import(ImportError),
    /// The durable store failed.
    Storage(StorageError),
    /// Snapshot (de)serialization failed.
    Serialize(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Import(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<ImportError> for Error {
    fn from(err: ImportError) -> Self {
        Self::Import(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}

/// Convenience prelude for host applications.
pub mod prelude {
    pub use crate::{
        Action, DashboardDocument, DashboardStore, DispatchOutcome, GridRect, LayoutSurface,
        MemoryStore, SaveState, StoreConfig, SurfaceEvent, WidgetId, WidgetKind, WidgetRegistry,
        register_surface, unregister_surface,
    };
}
