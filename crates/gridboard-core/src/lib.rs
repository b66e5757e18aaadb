#![forbid(unsafe_code)]

//! Core document model for the Gridboard dashboard builder.
//!
//! This crate owns the authoritative, serializable state: widget instances,
//! their grid placement, and the aggregate [`DashboardDocument`]. It exposes
//! total transition functions (silent no-ops on missing ids), the closed
//! [`WidgetRegistry`] of constructible widget kinds, and the versioned
//! export/import codec with pre-mutation validation.
//!
//! Everything here is pure data plus transitions: no clocks (callers inject
//! `now_ms`), no I/O, no rendering. Undo/redo, surface reconciliation, and
//! persistence live in the sibling crates and consume this one.

pub mod codec;
pub mod document;
pub mod id;
pub mod registry;

pub use codec::{ExportFile, Import, ImportError, export_document, export_widget, parse_export};
pub use document::{
    DEFAULT_DASHBOARD_NAME, DashboardDocument, DocumentMeta, GRID_COLUMNS, GridRect, LayoutItem,
    PropsMap, SCHEMA_VERSION, WidgetInstance,
};
pub use id::{DashboardId, WidgetId};
pub use registry::{WidgetKind, WidgetRegistry};
