//! Documents
//!
//! A [`Document`] creates host nodes, keeps the registry of element classes
//! and counts every mutation made to nodes it created. The counters make
//! "this render touched nothing" observable to tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::class::ElementClass;
use super::node::{ElementData, HostNode, NodeKind, HTML_NAMESPACE};

/// Mutation counters of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationStats {
    pub created: u64,
    pub inserted: u64,
    pub moved: u64,
    pub removed: u64,
    pub attribute_writes: u64,
    pub property_writes: u64,
    pub style_writes: u64,
    pub text_writes: u64,
    pub listeners_added: u64,
    pub listeners_removed: u64,
}

impl MutationStats {
    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.created
            + self.inserted
            + self.moved
            + self.removed
            + self.attribute_writes
            + self.property_writes
            + self.style_writes
            + self.text_writes
            + self.listeners_added
            + self.listeners_removed
    }

    /// Counters accumulated since an earlier snapshot.
    pub fn since(&self, earlier: &MutationStats) -> MutationStats {
        MutationStats {
            created: self.created - earlier.created,
            inserted: self.inserted - earlier.inserted,
            moved: self.moved - earlier.moved,
            removed: self.removed - earlier.removed,
            attribute_writes: self.attribute_writes - earlier.attribute_writes,
            property_writes: self.property_writes - earlier.property_writes,
            style_writes: self.style_writes - earlier.style_writes,
            text_writes: self.text_writes - earlier.text_writes,
            listeners_added: self.listeners_added - earlier.listeners_added,
            listeners_removed: self.listeners_removed - earlier.listeners_removed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Mutation {
    Created,
    Inserted,
    Moved,
    Removed,
    Attribute,
    Property,
    Style,
    Text,
    ListenerAdded,
    ListenerRemoved,
}

#[derive(Default)]
struct Counters {
    created: AtomicU64,
    inserted: AtomicU64,
    moved: AtomicU64,
    removed: AtomicU64,
    attribute_writes: AtomicU64,
    property_writes: AtomicU64,
    style_writes: AtomicU64,
    text_writes: AtomicU64,
    listeners_added: AtomicU64,
    listeners_removed: AtomicU64,
}

#[derive(Default)]
pub(crate) struct DocumentShared {
    classes: DashMap<String, Arc<ElementClass>>,
    counters: Counters,
}

impl DocumentShared {
    pub(crate) fn record(&self, mutation: Mutation) {
        let c = &self.counters;
        let counter = match mutation {
            Mutation::Created => &c.created,
            Mutation::Inserted => &c.inserted,
            Mutation::Moved => &c.moved,
            Mutation::Removed => &c.removed,
            Mutation::Attribute => &c.attribute_writes,
            Mutation::Property => &c.property_writes,
            Mutation::Style => &c.style_writes,
            Mutation::Text => &c.text_writes,
            Mutation::ListenerAdded => &c.listeners_added,
            Mutation::ListenerRemoved => &c.listeners_removed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// The host environment nodes are created in.
#[derive(Clone, Default)]
pub struct Document {
    shared: Arc<DocumentShared>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_shared(shared: Arc<DocumentShared>) -> Self {
        Self { shared }
    }

    /// Create an HTML element. A class registered under `tag` is constructed.
    pub fn create_element(&self, tag: &str) -> HostNode {
        self.create_element_is(tag, None)
    }

    /// Create an HTML element, constructing the class registered under `is`
    /// (a customized built-in) or under `tag`.
    pub fn create_element_is(&self, tag: &str, is: Option<&str>) -> HostNode {
        let class = is.or(Some(tag)).and_then(|name| self.get_class(name));
        let node = self.alloc_element(tag, HTML_NAMESPACE, class.clone());
        if let Some(class) = class {
            class.run_construct_hooks(&node);
        }
        node
    }

    /// Create an element in an explicit namespace. No class lookup happens.
    pub fn create_element_ns(&self, namespace: &str, tag: &str) -> HostNode {
        self.alloc_element(tag, namespace, None)
    }

    pub fn create_text(&self, text: &str) -> HostNode {
        HostNode::alloc(&self.shared, NodeKind::Text, text.to_owned(), None)
    }

    /// Create a zero-width marker node.
    pub fn create_marker(&self) -> HostNode {
        HostNode::alloc(&self.shared, NodeKind::Marker, String::new(), None)
    }

    pub(crate) fn alloc_element(
        &self,
        tag: &str,
        namespace: &str,
        class: Option<Arc<ElementClass>>,
    ) -> HostNode {
        HostNode::alloc(
            &self.shared,
            NodeKind::Element,
            String::new(),
            Some(ElementData::new(tag, namespace, class)),
        )
    }

    /// Register a class under its tag name, replacing any previous one.
    pub fn define(&self, class: Arc<ElementClass>) {
        tracing::debug!(tag = class.tag(), "defining element class");
        self.shared.classes.insert(class.tag().to_owned(), class);
    }

    pub fn get_class(&self, tag: &str) -> Option<Arc<ElementClass>> {
        self.shared.classes.get(tag).map(|entry| entry.value().clone())
    }

    /// Snapshot of the mutation counters.
    pub fn stats(&self) -> MutationStats {
        let c = &self.shared.counters;
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MutationStats {
            created: load(&c.created),
            inserted: load(&c.inserted),
            moved: load(&c.moved),
            removed: load(&c.removed),
            attribute_writes: load(&c.attribute_writes),
            property_writes: load(&c.property_writes),
            style_writes: load(&c.style_writes),
            text_writes: load(&c.text_writes),
            listeners_added: load(&c.listeners_added),
            listeners_removed: load(&c.listeners_removed),
        }
    }

    /// Whether two handles refer to the same document.
    pub fn same(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("classes", &self.shared.classes.len())
            .field("stats", &self.stats())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SVG_NAMESPACE;

    #[test]
    fn test_stats_track_creation_and_insertion() {
        let doc = Document::new();
        let start = doc.stats();

        let div = doc.create_element("div");
        div.append_child(&doc.create_text("x")).unwrap();
        div.set_attribute("id", "main").unwrap();

        let delta = doc.stats().since(&start);
        assert_eq!(delta.created, 2);
        assert_eq!(delta.inserted, 1);
        assert_eq!(delta.attribute_writes, 1);
        assert_eq!(delta.total(), 4);
    }

    #[test]
    fn test_svg_elements() {
        let doc = Document::new();
        let svg = doc.create_element_ns(SVG_NAMESPACE, "svg");
        assert_eq!(svg.namespace().as_deref(), Some(SVG_NAMESPACE));
        assert!(!svg.has_property("className"));
    }

    #[test]
    fn test_registry_constructs_classes() {
        let doc = Document::new();
        let class = ElementClass::new("x-counter").with_property("count").build();
        doc.define(class.clone());

        let node = doc.create_element("x-counter");
        assert!(class.is_instance(&node));
        assert!(node.has_property("count"));
        assert!(node.document().same(&doc));

        let fancy = ElementClass::new("fancy-button").build();
        doc.define(fancy.clone());
        let button = doc.create_element_is("button", Some("fancy-button"));
        assert_eq!(button.local_name().as_deref(), Some("button"));
        assert!(fancy.is_instance(&button));
    }

    #[test]
    fn test_stats_serialize() {
        let doc = Document::new();
        doc.create_marker();
        let json = serde_json::to_value(doc.stats()).unwrap();
        assert_eq!(json["created"], 1);
    }
}
