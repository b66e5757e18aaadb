//! Transition requests dispatched to the store.
//!
//! Every user-facing edit is one [`Action`]. The store validates the target,
//! applies the matching document transition through the history layer,
//! reconciles the surface, and arms the persistence scheduler — or returns
//! [`DispatchOutcome::Ignored`] for a stale target, without touching
//! anything.

use gridboard_core::{DashboardDocument, GridRect, LayoutItem, PropsMap, WidgetId, WidgetInstance};
use gridboard_history::{EntryKind, GroupKey};

/// One transition request.
#[derive(Clone, Debug)]
pub enum Action {
    /// Create a widget of a registered kind at `rect`. When `props` is
    /// `None`, the kind's default props are used.
    AddWidget {
        /// Registered kind tag.
        kind: String,
        /// Initial placement.
        rect: GridRect,
        /// Explicit props, or `None` for the kind's defaults.
        props: Option<PropsMap>,
    },
    /// Shallow-merge `props` into the widget's configuration.
    UpdateWidgetProps {
        /// Target widget.
        id: WidgetId,
        /// Keys to overwrite.
        props: PropsMap,
    },
    /// Overwrite a widget's geometry.
    MoveResizeWidget {
        /// Target widget.
        id: WidgetId,
        /// New geometry.
        rect: GridRect,
        /// Continuous-gesture key: consecutive dispatches sharing it
        /// coalesce into one undo step.
        gesture: Option<u64>,
    },
    /// Delete a widget and its placement.
    RemoveWidget {
        /// Target widget.
        id: WidgetId,
    },
    /// Clone a widget with a deterministic placement offset.
    DuplicateWidget {
        /// Source widget.
        id: WidgetId,
    },
    /// Flip a widget's `locked` flag.
    ToggleWidgetLock {
        /// Target widget.
        id: WidgetId,
    },
    /// Wholesale layout replace (bulk reorder).
    SetLayout {
        /// The new layout list.
        items: Vec<LayoutItem>,
    },
    /// Insert a pre-built widget (single-widget import / paste).
    InsertWidget {
        /// The widget instance.
        widget: WidgetInstance,
        /// Its placement.
        layout: LayoutItem,
    },
    /// Replace the whole document (validated import).
    ImportDashboard {
        /// The incoming document.
        document: DashboardDocument,
    },
    /// Replace the whole document with a fresh empty one.
    ResetDashboard,
}

impl Action {
    /// How this action participates in undo grouping: geometry dispatches
    /// carrying a gesture key coalesce; wholesale replacements stand alone.
    #[must_use]
    pub fn entry_kind(&self) -> EntryKind {
        match self {
            Action::MoveResizeWidget {
                gesture: Some(key), ..
            } => EntryKind::Grouped(GroupKey(*key)),
            Action::ImportDashboard { .. } | Action::ResetDashboard => EntryKind::Standalone,
            _ => EntryKind::Normal,
        }
    }
}

/// What a dispatch did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DispatchOutcome {
    /// The transition was applied.
    Applied {
        /// Id of a widget the transition created, if any.
        created: Option<WidgetId>,
    },
    /// The target was missing or invalid; the document is unchanged.
    Ignored,
}

impl DispatchOutcome {
    /// Whether the transition was applied.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { .. })
    }

    /// Id of a widget the transition created, if any.
    #[must_use]
    pub fn created(&self) -> Option<WidgetId> {
        match self {
            DispatchOutcome::Applied { created } => *created,
            DispatchOutcome::Ignored => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gestured_move_groups_by_key() {
        let action = Action::MoveResizeWidget {
            id: WidgetId::new(),
            rect: GridRect::new(0, 0, 1, 1),
            gesture: Some(7),
        };
        assert_eq!(action.entry_kind(), EntryKind::Grouped(GroupKey(7)));
    }

    #[test]
    fn discrete_move_is_normal() {
        let action = Action::MoveResizeWidget {
            id: WidgetId::new(),
            rect: GridRect::new(0, 0, 1, 1),
            gesture: None,
        };
        assert_eq!(action.entry_kind(), EntryKind::Normal);
    }

    #[test]
    fn replacements_are_standalone() {
        assert_eq!(Action::ResetDashboard.entry_kind(), EntryKind::Standalone);
    }
}
