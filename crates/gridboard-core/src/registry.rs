//! The closed set of constructible widget kinds.
//!
//! The core never inspects kind-specific rendering; it only needs two things
//! from a kind when constructing a widget: a default grid size and a default
//! props tree. Kinds are registered up front by the embedding application,
//! and import validation rejects documents referencing unregistered kinds.

use std::collections::HashMap;
use std::fmt;

use crate::document::{GridRect, PropsMap};

/// Factory producing a fresh default props tree for a kind.
pub type PropsFactory = Box<dyn Fn() -> PropsMap + Send + Sync>;

/// Registration record for one widget kind.
pub struct WidgetKind {
    name: String,
    default_w: u32,
    default_h: u32,
    default_props: PropsFactory,
}

impl WidgetKind {
    /// Register a kind with its default span. Default props start empty.
    #[must_use]
    pub fn new(name: impl Into<String>, default_w: u32, default_h: u32) -> Self {
        Self {
            name: name.into(),
            default_w: default_w.max(1),
            default_h: default_h.max(1),
            default_props: Box::new(PropsMap::new),
        }
    }

    /// Attach a default-props factory.
    #[must_use]
    pub fn with_default_props<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> PropsMap + Send + Sync + 'static,
    {
        self.default_props = Box::new(factory);
        self
    }

    /// The kind's tag, as stored in `WidgetInstance::kind`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default placement span at the origin; callers reposition as needed.
    #[must_use]
    pub fn default_rect(&self) -> GridRect {
        GridRect::new(0, 0, self.default_w, self.default_h)
    }

    /// Produce a fresh default props tree.
    #[must_use]
    pub fn default_props(&self) -> PropsMap {
        (self.default_props)()
    }
}

impl fmt::Debug for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetKind")
            .field("name", &self.name)
            .field("default_w", &self.default_w)
            .field("default_h", &self.default_h)
            .finish_non_exhaustive()
    }
}

/// Lookup table from kind tag to [`WidgetKind`].
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    kinds: HashMap<String, WidgetKind>,
}

impl WidgetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the four basic content kinds.
    #[must_use]
    pub fn with_basic_kinds() -> Self {
        let mut registry = Self::new();
        registry.register(WidgetKind::new("chart", 6, 4));
        registry.register(WidgetKind::new("table", 6, 4));
        registry.register(WidgetKind::new("list", 3, 4));
        registry.register(WidgetKind::new("text", 3, 2));
        registry
    }

    /// Register a kind. Re-registering a tag replaces the previous record.
    pub fn register(&mut self, kind: WidgetKind) {
        self.kinds.insert(kind.name.clone(), kind);
    }

    /// Whether `name` names a registered kind.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Look up a kind record.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&WidgetKind> {
        self.kinds.get(name)
    }

    /// Registered kind tags, sorted for stable output.
    #[must_use]
    pub fn kind_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kinds are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn basic_kinds_are_registered() {
        let registry = WidgetRegistry::with_basic_kinds();
        assert_eq!(registry.kind_names(), vec!["chart", "list", "table", "text"]);
        assert!(registry.is_registered("chart"));
        assert!(!registry.is_registered("gauge"));
    }

    #[test]
    fn default_props_factory_runs_per_call() {
        let mut registry = WidgetRegistry::new();
        registry.register(WidgetKind::new("chart", 6, 4).with_default_props(|| {
            let mut props = PropsMap::new();
            props.insert("title".to_string(), json!("New chart"));
            props
        }));

        let kind = registry.get("chart").unwrap();
        let a = kind.default_props();
        let b = kind.default_props();
        assert_eq!(a, b);
        assert_eq!(a["title"], json!("New chart"));
    }

    #[test]
    fn default_rect_has_positive_span() {
        let kind = WidgetKind::new("degenerate", 0, 0);
        let rect = kind.default_rect();
        assert_eq!((rect.w, rect.h), (1, 1));
    }

    #[test]
    fn reregistering_replaces() {
        let mut registry = WidgetRegistry::new();
        registry.register(WidgetKind::new("chart", 6, 4));
        registry.register(WidgetKind::new("chart", 2, 2));
        assert_eq!(registry.len(), 1);
        let rect = registry.get("chart").unwrap().default_rect();
        assert_eq!((rect.w, rect.h), (2, 2));
    }
}
