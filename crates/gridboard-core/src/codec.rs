//! Versioned export/import file codec.
//!
//! An export file carries either a full [`DashboardDocument`] or a single
//! widget envelope (instance + layout item), tagged by a `format` string and
//! stamped with the schema version. Import is validate-then-accept: nothing
//! is mutated until the payload has passed every check, and rejections carry
//! a human-readable reason.
//!
//! # Validation Rules
//!
//! | Check | Rejection |
//! |-------|-----------|
//! | JSON parses | [`ImportError::Parse`] |
//! | `format` tag is known | [`ImportError::UnknownFormat`] |
//! | `version` ≤ [`SCHEMA_VERSION`] | [`ImportError::UnsupportedVersion`] (never coerced) |
//! | Every widget kind registered | [`ImportError::UnknownKind`] |
//! | Spans ≥ 1, min ≤ max | [`ImportError::InvalidGeometry`] |
//! | Instance/layout bijection | [`ImportError::Inconsistent`] |
//!
//! Ids are typed [`WidgetId`]s, so "required id format" is enforced by the
//! deserializer itself: a malformed id fails UUID parsing and surfaces as
//! [`ImportError::Parse`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{DashboardDocument, LayoutItem, SCHEMA_VERSION, WidgetInstance};
use crate::id::WidgetId;
use crate::registry::WidgetRegistry;

/// `format` tag for full-document export files.
pub const DASHBOARD_FORMAT: &str = "gridboard/dashboard";

/// `format` tag for single-widget export files.
pub const WIDGET_FORMAT: &str = "gridboard/widget";

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Why an import was rejected. The current document is untouched in every
/// case.
#[derive(Debug)]
pub enum ImportError {
    /// The payload is not valid JSON, or a field failed to decode.
    Parse(String),
    /// The `format` tag names no known file kind.
    UnknownFormat(String),
    /// The file's schema version is newer than this build understands.
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Newest version this build accepts.
        supported: u32,
    },
    /// A widget references a kind absent from the registry.
    UnknownKind(String),
    /// A layout item carries an unusable geometry.
    InvalidGeometry {
        /// Offending widget id.
        id: WidgetId,
        /// What is wrong with it.
        reason: String,
    },
    /// The instance/layout bijection does not hold.
    Inconsistent(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Parse(msg) => write!(f, "import payload failed to parse: {msg}"),
            ImportError::UnknownFormat(tag) => write!(f, "unknown export format {tag:?}"),
            ImportError::UnsupportedVersion { found, supported } => write!(
                f,
                "file schema version {found} is newer than supported version {supported}"
            ),
            ImportError::UnknownKind(kind) => write!(f, "unregistered widget kind {kind:?}"),
            ImportError::InvalidGeometry { id, reason } => {
                write!(f, "invalid geometry for widget {id}: {reason}")
            }
            ImportError::Inconsistent(msg) => {
                write!(f, "instance/layout mismatch: {msg}")
            }
        }
    }
}

impl std::error::Error for ImportError {}

// ─────────────────────────────────────────────────────────────────────────────
// File shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Full-document export payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardExport {
    /// Schema version at export time.
    pub version: u32,
    /// The complete document, with `meta.exported_at` stamped.
    pub document: DashboardDocument,
}

/// Single-widget export payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WidgetExport {
    /// Schema version at export time.
    pub version: u32,
    /// The widget's kind tag, duplicated for cheap inspection.
    pub widget_kind: String,
    /// The widget instance.
    pub widget: WidgetInstance,
    /// Its grid placement.
    pub layout: LayoutItem,
    /// Export time, milliseconds since epoch.
    pub exported_at: u64,
}

/// A structured export file at a stable schema version.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "format")]
pub enum ExportFile {
    /// A whole dashboard.
    #[serde(rename = "gridboard/dashboard")]
    Dashboard(DashboardExport),
    /// One widget with its placement.
    #[serde(rename = "gridboard/widget")]
    Widget(WidgetExport),
}

/// Validated result of parsing an export file.
#[derive(Clone, Debug)]
pub enum Import {
    /// A full document, ready to replace the current one.
    Dashboard(DashboardDocument),
    /// A single widget to insert into the current document.
    Widget {
        /// The widget instance (id may collide with an existing one; the
        /// caller remaps in that case).
        widget: WidgetInstance,
        /// Its grid placement.
        layout: LayoutItem,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Export
// ─────────────────────────────────────────────────────────────────────────────

/// Build a full-document export file, stamping `exported_at`.
#[must_use]
pub fn export_document(doc: &DashboardDocument, now_ms: u64) -> ExportFile {
    let mut document = doc.clone();
    document.meta.exported_at = Some(now_ms);
    ExportFile::Dashboard(DashboardExport {
        version: SCHEMA_VERSION,
        document,
    })
}

/// Build a single-widget export file, or `None` if the id is absent.
#[must_use]
pub fn export_widget(doc: &DashboardDocument, id: WidgetId, now_ms: u64) -> Option<ExportFile> {
    let widget = doc.instance(id)?.clone();
    let layout = doc.layout_item(id)?.clone();
    Some(ExportFile::Widget(WidgetExport {
        version: SCHEMA_VERSION,
        widget_kind: widget.kind.clone(),
        widget,
        layout,
        exported_at: now_ms,
    }))
}

/// Serialize an export file to pretty-printed JSON.
pub fn to_json(file: &ExportFile) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(file)
}

// ─────────────────────────────────────────────────────────────────────────────
// Import
// ─────────────────────────────────────────────────────────────────────────────

/// Parse and fully validate an export file.
///
/// Runs the cheap structural probes (format tag, version) before the full
/// typed decode so version rejections work even when the payload's body uses
/// fields this build has never heard of.
pub fn parse_export(json: &str, registry: &WidgetRegistry) -> Result<Import, ImportError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ImportError::Parse(e.to_string()))?;

    let format = value
        .get("format")
        .and_then(Value::as_str)
        .ok_or_else(|| ImportError::Parse("missing \"format\" tag".to_string()))?;
    if format != DASHBOARD_FORMAT && format != WIDGET_FORMAT {
        return Err(ImportError::UnknownFormat(format.to_string()));
    }

    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| ImportError::Parse("missing \"version\" field".to_string()))?;
    check_version(version)?;

    let file: ExportFile =
        serde_json::from_value(value).map_err(|e| ImportError::Parse(e.to_string()))?;

    match file {
        ExportFile::Dashboard(export) => {
            validate_document(&export.document, registry)?;
            Ok(Import::Dashboard(export.document))
        }
        ExportFile::Widget(export) => {
            if export.widget_kind != export.widget.kind {
                return Err(ImportError::Inconsistent(format!(
                    "envelope kind {:?} does not match widget kind {:?}",
                    export.widget_kind, export.widget.kind
                )));
            }
            if export.widget.id != export.layout.id {
                return Err(ImportError::Inconsistent(format!(
                    "widget id {} does not match layout id {}",
                    export.widget.id, export.layout.id
                )));
            }
            if !registry.is_registered(&export.widget.kind) {
                return Err(ImportError::UnknownKind(export.widget.kind.clone()));
            }
            validate_item_geometry(&export.layout)?;
            Ok(Import::Widget {
                widget: export.widget,
                layout: export.layout,
            })
        }
    }
}

/// Validate a bare document (also used for the durable-storage snapshot read
/// on startup, which stores the document without the file envelope).
pub fn validate_document(
    doc: &DashboardDocument,
    registry: &WidgetRegistry,
) -> Result<(), ImportError> {
    check_version(u64::from(doc.version))?;

    if !doc.is_consistent() {
        return Err(ImportError::Inconsistent(format!(
            "{} instances vs {} layout items",
            doc.instances.len(),
            doc.layout.len()
        )));
    }

    for instance in doc.instances.values() {
        if !registry.is_registered(&instance.kind) {
            return Err(ImportError::UnknownKind(instance.kind.clone()));
        }
    }

    for item in &doc.layout {
        validate_item_geometry(item)?;
    }

    Ok(())
}

fn check_version(found: u64) -> Result<(), ImportError> {
    if found > u64::from(SCHEMA_VERSION) {
        return Err(ImportError::UnsupportedVersion {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            supported: SCHEMA_VERSION,
        });
    }
    Ok(())
}

fn validate_item_geometry(item: &LayoutItem) -> Result<(), ImportError> {
    if item.w == 0 || item.h == 0 {
        return Err(ImportError::InvalidGeometry {
            id: item.id,
            reason: format!("span {}x{} must be at least 1x1", item.w, item.h),
        });
    }
    if let (Some(min_w), Some(max_w)) = (item.min_w, item.max_w)
        && min_w > max_w
    {
        return Err(ImportError::InvalidGeometry {
            id: item.id,
            reason: format!("min_w {min_w} exceeds max_w {max_w}"),
        });
    }
    if let (Some(min_h), Some(max_h)) = (item.min_h, item.max_h)
        && min_h > max_h
    {
        return Err(ImportError::InvalidGeometry {
            id: item.id,
            reason: format!("min_h {min_h} exceeds max_h {max_h}"),
        });
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
