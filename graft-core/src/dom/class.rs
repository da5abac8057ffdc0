//! Element Classes
//!
//! An [`ElementClass`] plays the part a custom-element constructor plays in
//! a browser: it has its own identity, declares properties that become
//! native fields of its instances, can extend another class, and can run
//! setup code on every instance it constructs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use super::document::Document;
use super::node::{HostNode, HTML_NAMESPACE};

/// Unique identifier for an element class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

type ConstructHook = Arc<dyn Fn(&HostNode) + Send + Sync>;

/// A constructor-like element identity.
pub struct ElementClass {
    id: ClassId,
    tag: String,
    properties: SmallVec<[String; 4]>,
    parent: Option<Arc<ElementClass>>,
    on_construct: Option<ConstructHook>,
}

impl ElementClass {
    /// Start describing a class whose instances use `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            id: ClassId::next(),
            tag: tag.into(),
            properties: SmallVec::new(),
            parent: None,
            on_construct: None,
        }
    }

    /// Declare a property instances expose as a native field.
    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    /// Inherit properties and construct hooks from `parent`.
    pub fn extends(mut self, parent: Arc<ElementClass>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Run `hook` on every constructed instance, after the parent's hooks.
    pub fn on_construct<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HostNode) + Send + Sync + 'static,
    {
        self.on_construct = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn parent(&self) -> Option<&Arc<ElementClass>> {
        self.parent.as_ref()
    }

    fn ancestry(&self) -> impl Iterator<Item = &ElementClass> {
        std::iter::successors(Some(self), |class| class.parent.as_deref())
    }

    /// Whether this class or an ancestor declares `name`.
    pub fn defines_property(&self, name: &str) -> bool {
        self.ancestry()
            .any(|class| class.properties.iter().any(|p| p == name))
    }

    /// Whether this class is `other` or extends it.
    pub fn is_subclass_of(&self, other: &ElementClass) -> bool {
        self.ancestry().any(|class| class.id == other.id)
    }

    /// Whether `node` was constructed from this class or a subclass of it.
    pub fn is_instance(&self, node: &HostNode) -> bool {
        node.element_class()
            .is_some_and(|class| class.is_subclass_of(self))
    }

    /// Construct a fresh instance.
    pub fn construct(self: &Arc<Self>, document: &Document) -> HostNode {
        let node = document.alloc_element(&self.tag, HTML_NAMESPACE, Some(self.clone()));
        self.run_construct_hooks(&node);
        node
    }

    pub(crate) fn run_construct_hooks(&self, node: &HostNode) {
        let hooks: SmallVec<[ConstructHook; 4]> = self
            .ancestry()
            .filter_map(|class| class.on_construct.clone())
            .collect();
        for hook in hooks.iter().rev() {
            hook(node);
        }
    }
}

impl fmt::Debug for ElementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementClass")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("properties", &self.properties)
            .field("parent", &self.parent.as_ref().map(|p| p.tag.as_str()))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_instance_of_walks_the_chain() {
        let doc = Document::new();
        let base = ElementClass::new("x-base").with_property("label").build();
        let derived = ElementClass::new("x-derived")
            .extends(base.clone())
            .with_property("count")
            .build();

        let node = derived.construct(&doc);
        assert!(derived.is_instance(&node));
        assert!(base.is_instance(&node));
        assert!(!base.is_subclass_of(&derived));
        assert!(derived.defines_property("label"));
        assert!(node.has_property("count"));

        let plain = doc.create_element("x-derived");
        assert!(!derived.is_instance(&plain));
    }

    #[test]
    fn test_construct_hooks_run_parent_first() {
        let doc = Document::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let base_order = order.clone();
        let base = ElementClass::new("x-a")
            .on_construct(move |_| base_order.lock().push("base"))
            .build();
        let derived_order = order.clone();
        let derived = ElementClass::new("x-b")
            .extends(base)
            .on_construct(move |node| {
                node.set_attribute("ready", "").unwrap();
                derived_order.lock().push("derived");
            })
            .build();

        let node = derived.construct(&doc);
        assert_eq!(*order.lock(), vec!["base", "derived"]);
        assert!(node.has_attribute("ready"));
    }
}
