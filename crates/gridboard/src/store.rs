//! The dashboard store: one dispatch loop tying the triad together.
//!
//! Data flow per transition:
//!
//! ```text
//! Action ──▶ validate target ──▶ History::apply (snapshot + mutate)
//!                                      │
//!                        ┌─────────────┴─────────────┐
//!                        ▼                           ▼
//!              reconcile registered           SaveScheduler::note_transition
//!              layout surface                 (debounced snapshot write)
//! ```
//!
//! Undo/redo run the same tail: they re-reconcile the surface and qualify
//! for persistence like any other transition. Everything is synchronous and
//! single-threaded; the host calls [`DashboardStore::tick`] from its event
//! loop to let the debounce deadline fire.
//!
//! Real-time entry points (`dispatch`, `undo`, `tick`, …) read the clocks
//! once and delegate to `_at` variants taking explicit `Instant`/epoch-ms
//! values, which is what tests drive.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use gridboard_core::codec;
use gridboard_core::{DashboardDocument, WidgetId, WidgetRegistry};
use gridboard_history::History;
use gridboard_persist::{
    DocumentStore, SaveScheduler, SaveStatus, SchedulerConfig, StorageError,
};
use gridboard_sync::{ReconcileReport, SurfaceEvent, active_surface, reconcile};
use tracing::{debug, warn};

use crate::action::{Action, DispatchOutcome};
use crate::Error;

/// Default durable-storage key for the document snapshot.
pub const DEFAULT_STORAGE_KEY: &str = "gridboard.dashboard";

/// Store construction options.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Durable-storage key the snapshot is written under.
    pub storage_key: String,
    /// Debounce tuning for the persistence scheduler.
    pub scheduler: SchedulerConfig,
    /// Bound on the undo stack.
    pub history_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            scheduler: SchedulerConfig::default(),
            history_limit: gridboard_history::DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl StoreConfig {
    /// Override the storage key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Override the scheduler tuning.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Override the undo-stack bound.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

/// Authoritative state holder and transition dispatcher.
pub struct DashboardStore {
    registry: WidgetRegistry,
    history: History<DashboardDocument>,
    storage: Box<dyn DocumentStore>,
    scheduler: SaveScheduler,
    storage_key: String,
}

impl DashboardStore {
    /// Create a store around a fresh empty document.
    #[must_use]
    pub fn new(registry: WidgetRegistry, storage: Box<dyn DocumentStore>, config: StoreConfig) -> Self {
        Self::new_at(registry, storage, config, now_epoch_ms())
    }

    /// Deterministic constructor with an injected creation timestamp.
    #[must_use]
    pub fn new_at(
        registry: WidgetRegistry,
        storage: Box<dyn DocumentStore>,
        config: StoreConfig,
        now_ms: u64,
    ) -> Self {
        Self {
            registry,
            history: History::with_limit(DashboardDocument::new(now_ms), config.history_limit),
            storage,
            scheduler: SaveScheduler::new(config.scheduler),
            storage_key: config.storage_key,
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────────

    /// The authoritative current document.
    #[must_use]
    pub fn document(&self) -> &DashboardDocument {
        self.history.present()
    }

    /// The registered widget kinds.
    #[must_use]
    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    /// Persistence status for UI feedback.
    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.scheduler.status()
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    /// Dispatch a transition at the current wall-clock time.
    pub fn dispatch(&mut self, action: Action) -> DispatchOutcome {
        self.dispatch_at(action, Instant::now(), now_epoch_ms())
    }

    /// Dispatch a transition with explicit clocks.
    pub fn dispatch_at(&mut self, action: Action, now: Instant, now_ms: u64) -> DispatchOutcome {
        if !self.is_applicable(&action) {
            return DispatchOutcome::Ignored;
        }
        let kind = action.entry_kind();
        let action = self.resolve_defaults(action);
        let created = self
            .history
            .apply(kind, |doc| apply_to_document(doc, action, now_ms));
        self.after_transition(now);
        DispatchOutcome::Applied { created }
    }

    /// Undo the latest step. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.undo_at(Instant::now())
    }

    /// Undo with an explicit scheduler clock.
    pub fn undo_at(&mut self, now: Instant) -> bool {
        if !self.history.undo() {
            return false;
        }
        self.after_transition(now);
        true
    }

    /// Redo the latest undone step. Returns `false` when there is nothing to
    /// redo.
    pub fn redo(&mut self) -> bool {
        self.redo_at(Instant::now())
    }

    /// Redo with an explicit scheduler clock.
    pub fn redo_at(&mut self, now: Instant) -> bool {
        if !self.history.redo() {
            return false;
        }
        self.after_transition(now);
        true
    }

    /// Translate a surface-originated geometry event into a transition.
    ///
    /// The requested geometry is clamped to the item's min/max constraints
    /// first. The reconciliation that follows re-overwrites the surface with
    /// the geometry it already holds — harmless by idempotence, and it keeps
    /// the pipeline free of self-origination special cases.
    pub fn apply_surface_event(&mut self, event: SurfaceEvent) -> DispatchOutcome {
        self.apply_surface_event_at(event, Instant::now(), now_epoch_ms())
    }

    /// [`apply_surface_event`](Self::apply_surface_event) with explicit
    /// clocks.
    pub fn apply_surface_event_at(
        &mut self,
        event: SurfaceEvent,
        now: Instant,
        now_ms: u64,
    ) -> DispatchOutcome {
        match event {
            SurfaceEvent::ItemMoved { id, rect, gesture } => {
                let Some(item) = self.document().layout_item(id) else {
                    debug!(id = %id, "surface event for untracked widget ignored");
                    return DispatchOutcome::Ignored;
                };
                let rect = item.clamp_to_constraints(rect);
                self.dispatch_at(Action::MoveResizeWidget { id, rect, gesture }, now, now_ms)
            }
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────────

    /// Drive the debounce deadline from the host event loop.
    ///
    /// Returns the post-write status when a snapshot was due and written
    /// (successfully or not), `None` otherwise.
    pub fn tick(&mut self) -> Option<SaveStatus> {
        self.tick_at(Instant::now(), now_epoch_ms())
    }

    /// [`tick`](Self::tick) with explicit clocks.
    pub fn tick_at(&mut self, now: Instant, now_ms: u64) -> Option<SaveStatus> {
        if !self.scheduler.poll(now) {
            return None;
        }
        let result = self.write_snapshot();
        self.scheduler.complete(result, now_ms);
        Some(self.scheduler.status())
    }

    /// One-shot startup read of the persisted snapshot.
    ///
    /// On success the whole envelope is replaced (loading is not undoable)
    /// and the surface is reconciled. Corrupt, invalid, or missing snapshots
    /// leave the fresh document in place; failures are logged, never raised.
    pub fn load_persisted(&mut self) -> bool {
        let payload = match self.storage.load(&self.storage_key) {
            Ok(Some(payload)) => payload,
            Ok(None) => return false,
            Err(err) => {
                warn!(error = %err, "failed to read persisted snapshot");
                return false;
            }
        };
        let doc: DashboardDocument = match serde_json::from_str(&payload) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(error = %err, "persisted snapshot is corrupt, starting fresh");
                return false;
            }
        };
        if let Err(err) = codec::validate_document(&doc, &self.registry) {
            warn!(error = %err, "persisted snapshot rejected, starting fresh");
            return false;
        }
        self.history.replace_all(doc);
        self.reconcile_active_surface();
        true
    }

    // ── Export / import ─────────────────────────────────────────────────────

    /// Export the current document as a pretty-printed file payload.
    pub fn export_document_json(&self) -> Result<String, Error> {
        self.export_document_json_at(now_epoch_ms())
    }

    /// [`export_document_json`](Self::export_document_json) with an explicit
    /// export timestamp.
    pub fn export_document_json_at(&self, now_ms: u64) -> Result<String, Error> {
        Ok(codec::to_json(&codec::export_document(
            self.document(),
            now_ms,
        ))?)
    }

    /// Export one widget as a file payload. `Ok(None)` when the id is
    /// absent.
    pub fn export_widget_json(&self, id: WidgetId) -> Result<Option<String>, Error> {
        self.export_widget_json_at(id, now_epoch_ms())
    }

    /// [`export_widget_json`](Self::export_widget_json) with an explicit
    /// export timestamp.
    pub fn export_widget_json_at(
        &self,
        id: WidgetId,
        now_ms: u64,
    ) -> Result<Option<String>, Error> {
        match codec::export_widget(self.document(), id, now_ms) {
            Some(file) => Ok(Some(codec::to_json(&file)?)),
            None => Ok(None),
        }
    }

    /// Validate and apply an export-file payload.
    ///
    /// A dashboard payload replaces the whole document (one standalone undo
    /// step). A widget payload inserts that widget, remapping its id when it
    /// collides with an existing one.
    pub fn import_json(&mut self, json: &str) -> Result<DispatchOutcome, Error> {
        self.import_json_at(json, Instant::now(), now_epoch_ms())
    }

    /// [`import_json`](Self::import_json) with explicit clocks.
    pub fn import_json_at(
        &mut self,
        json: &str,
        now: Instant,
        now_ms: u64,
    ) -> Result<DispatchOutcome, Error> {
        match codec::parse_export(json, &self.registry)? {
            codec::Import::Dashboard(document) => {
                Ok(self.dispatch_at(Action::ImportDashboard { document }, now, now_ms))
            }
            codec::Import::Widget {
                mut widget,
                mut layout,
            } => {
                if self.document().contains_widget(widget.id) {
                    let fresh = WidgetId::new();
                    debug!(old = %widget.id, new = %fresh, "imported widget id collides, remapping");
                    widget.id = fresh;
                    layout.id = fresh;
                }
                Ok(self.dispatch_at(Action::InsertWidget { widget, layout }, now, now_ms))
            }
        }
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn after_transition(&mut self, now: Instant) {
        self.reconcile_active_surface();
        self.scheduler.note_transition(now);
    }

    fn reconcile_active_surface(&self) -> Option<ReconcileReport> {
        let surface = active_surface()?;
        let Ok(mut guard) = surface.lock() else {
            warn!("layout surface handle poisoned, skipping reconcile");
            return None;
        };
        Some(reconcile(self.history.present(), &mut *guard))
    }

    fn write_snapshot(&self) -> Result<(), StorageError> {
        let payload = serde_json::to_string(self.history.present())
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.storage.save(&self.storage_key, &payload)
    }

    /// Pre-check a transition's target so ignored actions never touch the
    /// history (an ignored action must not create an undo step).
    fn is_applicable(&self, action: &Action) -> bool {
        let doc = self.history.present();
        match action {
            Action::AddWidget { kind, .. } => {
                let ok = self.registry.is_registered(kind);
                if !ok {
                    debug!(kind = %kind, "add ignored: unregistered kind");
                }
                ok
            }
            Action::UpdateWidgetProps { id, .. }
            | Action::MoveResizeWidget { id, .. }
            | Action::RemoveWidget { id }
            | Action::DuplicateWidget { id }
            | Action::ToggleWidgetLock { id } => {
                let ok = doc.contains_widget(*id);
                if !ok {
                    debug!(id = %id, "transition ignored: unknown widget");
                }
                ok
            }
            Action::InsertWidget { widget, layout } => {
                widget.id == layout.id
                    && self.registry.is_registered(&widget.kind)
                    && !doc.contains_widget(widget.id)
            }
            Action::ImportDashboard { document } => {
                match codec::validate_document(document, &self.registry) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(error = %err, "import rejected before mutation");
                        false
                    }
                }
            }
            Action::SetLayout { .. } | Action::ResetDashboard => true,
        }
    }

    /// Fill in registry defaults the action left open.
    fn resolve_defaults(&self, action: Action) -> Action {
        match action {
            Action::AddWidget {
                kind,
                rect,
                props: None,
            } => {
                let props = self.registry.get(&kind).map(|k| k.default_props());
                Action::AddWidget { kind, rect, props }
            }
            other => other,
        }
    }
}

fn apply_to_document(
    doc: &mut DashboardDocument,
    action: Action,
    now_ms: u64,
) -> Option<WidgetId> {
    match action {
        Action::AddWidget { kind, rect, props } => {
            Some(doc.add_widget(kind, rect, props.unwrap_or_default(), now_ms))
        }
        Action::UpdateWidgetProps { id, props } => {
            doc.update_widget_props(id, props, now_ms);
            None
        }
        Action::MoveResizeWidget { id, rect, .. } => {
            doc.move_resize_widget(id, rect, now_ms);
            None
        }
        Action::RemoveWidget { id } => {
            doc.remove_widget(id, now_ms);
            None
        }
        Action::DuplicateWidget { id } => doc.duplicate_widget(id, now_ms),
        Action::ToggleWidgetLock { id } => {
            doc.toggle_widget_lock(id, now_ms);
            None
        }
        Action::SetLayout { items } => {
            doc.set_layout(items, now_ms);
            None
        }
        Action::InsertWidget { widget, layout } => {
            let id = widget.id;
            doc.insert_widget(widget, layout, now_ms).then_some(id)
        }
        Action::ImportDashboard { document } => {
            doc.import(document, now_ms);
            None
        }
        Action::ResetDashboard => {
            doc.reset(now_ms);
            None
        }
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
