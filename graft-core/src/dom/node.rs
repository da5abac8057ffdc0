//! Host Nodes
//!
//! [`HostNode`] is a shared handle to one node of the host tree. Cloning the
//! handle is cheap and never copies the node; equality and hashing are by
//! identity.
//!
//! # Kinds
//!
//! - Elements carry a tag name, a namespace, attributes, native properties,
//!   inline style and listeners, and may host a shadow root.
//! - Text nodes carry character data.
//! - Markers are zero-width placeholders that serialize to nothing. The
//!   children reconciler uses them to delimit the region it owns.
//! - Shadow roots are detached containers attached to exactly one element.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::class::ElementClass;
use super::document::{Document, DocumentShared, Mutation};
use super::event::{Event, EventListener, EventPhase, ListenerOptions};
use super::native::{self, NativeProp};
use super::style::CssStyle;
use crate::error::{DomError, DomResult};
use crate::vdom::PropValue;

/// Namespace of HTML elements.
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Namespace of SVG elements.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Unique identifier for a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one renderer's private state on shared host nodes.
///
/// Two renderers with different contexts can reconcile into the same node
/// without seeing each other's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// The context used when none is chosen explicitly.
    pub const ROOT: ContextId = ContextId(0);

    /// Generate a new unique context.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

/// The kind of a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Marker,
    ShadowRoot,
}

pub(super) struct ElementData {
    pub(super) local_name: String,
    pub(super) namespace: String,
    pub(super) class: Option<Arc<ElementClass>>,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, PropValue>,
    style: CssStyle,
}

impl ElementData {
    pub(super) fn new(local_name: &str, namespace: &str, class: Option<Arc<ElementClass>>) -> Self {
        Self {
            local_name: local_name.to_owned(),
            namespace: namespace.to_owned(),
            class,
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            style: CssStyle::new(),
        }
    }

    fn is_html(&self) -> bool {
        self.namespace == HTML_NAMESPACE
    }

    fn class_defines(&self, name: &str) -> bool {
        self.class
            .as_ref()
            .is_some_and(|class| class.defines_property(name))
    }

    fn native(&self, name: &str) -> Option<NativeProp> {
        if self.is_html() && !self.class_defines(name) {
            native::lookup(&self.local_name, name)
        } else {
            None
        }
    }

    fn sync_style_attribute(&mut self) {
        if self.style.is_empty() {
            self.attributes.shift_remove("style");
        } else {
            self.attributes.insert("style".to_owned(), self.style.css_text());
        }
    }
}

#[derive(Clone)]
struct Registration {
    event_type: String,
    listener: EventListener,
    options: ListenerOptions,
}

impl Registration {
    fn matches(&self, event_type: &str, listener: &EventListener, capture: bool) -> bool {
        self.event_type == event_type && self.listener == *listener && self.options.capture == capture
    }
}

#[derive(Default)]
struct NodeData {
    parent: Weak<NodeCell>,
    children: Vec<HostNode>,
    text: String,
    element: Option<ElementData>,
    shadow_root: Option<HostNode>,
    shadow_host: Weak<NodeCell>,
    listeners: SmallVec<[Registration; 2]>,
}

pub(super) struct NodeCell {
    id: NodeId,
    kind: NodeKind,
    document: Arc<DocumentShared>,
    data: RwLock<NodeData>,
    slots: DashMap<ContextId, Arc<dyn Any + Send + Sync>>,
    /// Last known index in the parent's child list. May be stale.
    index_hint: AtomicUsize,
}

/// A shared handle to one node of the host tree.
#[derive(Clone)]
pub struct HostNode(Arc<NodeCell>);

/// A non-owning handle to a host node.
#[derive(Clone, Default)]
pub struct WeakHostNode(Weak<NodeCell>);

impl WeakHostNode {
    /// Get the node if it is still alive.
    pub fn upgrade(&self) -> Option<HostNode> {
        self.0.upgrade().map(HostNode)
    }
}

impl fmt::Debug for WeakHostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(node) => write!(f, "WeakHostNode({node:?})"),
            None => f.write_str("WeakHostNode(<dropped>)"),
        }
    }
}

impl HostNode {
    pub(super) fn alloc(
        document: &Arc<DocumentShared>,
        kind: NodeKind,
        text: String,
        element: Option<ElementData>,
    ) -> Self {
        document.record(Mutation::Created);
        Self(Arc::new(NodeCell {
            id: NodeId::next(),
            kind,
            document: document.clone(),
            data: RwLock::new(NodeData {
                text,
                element,
                ..NodeData::default()
            }),
            slots: DashMap::new(),
            index_hint: AtomicUsize::new(0),
        }))
    }

    fn record(&self, mutation: Mutation) {
        self.0.document.record(mutation);
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn is_element(&self) -> bool {
        self.0.kind == NodeKind::Element
    }

    pub fn is_text(&self) -> bool {
        self.0.kind == NodeKind::Text
    }

    pub fn is_marker(&self) -> bool {
        self.0.kind == NodeKind::Marker
    }

    /// The document that created this node.
    pub fn document(&self) -> Document {
        Document::from_shared(self.0.document.clone())
    }

    /// Get a non-owning handle to this node.
    pub fn downgrade(&self) -> WeakHostNode {
        WeakHostNode(Arc::downgrade(&self.0))
    }

    /// Tag name of an element.
    pub fn local_name(&self) -> Option<String> {
        self.0.data.read().element.as_ref().map(|e| e.local_name.clone())
    }

    /// Namespace URI of an element.
    pub fn namespace(&self) -> Option<String> {
        self.0.data.read().element.as_ref().map(|e| e.namespace.clone())
    }

    /// The class this element was constructed from, if any.
    pub fn element_class(&self) -> Option<Arc<ElementClass>> {
        self.0.data.read().element.as_ref().and_then(|e| e.class.clone())
    }

    /// Character data of a text node. Other nodes have none.
    pub fn data(&self) -> Option<String> {
        match self.kind() {
            NodeKind::Text => Some(self.0.data.read().text.clone()),
            _ => None,
        }
    }

    /// Replace the character data of a text node. Ignored on other kinds.
    pub fn set_data(&self, text: &str) {
        if self.is_text() {
            self.0.data.write().text = text.to_owned();
            self.record(Mutation::Text);
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn parent(&self) -> Option<HostNode> {
        self.0.data.read().parent.upgrade().map(HostNode)
    }

    /// Snapshot of the child list.
    pub fn children(&self) -> Vec<HostNode> {
        self.0.data.read().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.data.read().children.len()
    }

    pub fn first_child(&self) -> Option<HostNode> {
        self.0.data.read().children.first().cloned()
    }

    pub fn last_child(&self) -> Option<HostNode> {
        self.0.data.read().children.last().cloned()
    }

    pub fn next_sibling(&self) -> Option<HostNode> {
        self.sibling(1)
    }

    pub fn previous_sibling(&self) -> Option<HostNode> {
        self.sibling(-1)
    }

    fn sibling(&self, offset: isize) -> Option<HostNode> {
        let parent = self.parent()?;
        let data = parent.0.data.read();
        let index = self.index_in(&data.children)?;
        let target = index.checked_add_signed(offset)?;
        data.children.get(target).cloned()
    }

    /// Position of this node in `children`. Tries the cached index and its
    /// neighbours first, since one insertion or removal shifts it by one.
    fn index_in(&self, children: &[HostNode]) -> Option<usize> {
        let hint = self.0.index_hint.load(Ordering::Relaxed);
        let near = [hint, hint.wrapping_add(1), hint.wrapping_sub(1)]
            .into_iter()
            .find(|&i| children.get(i).is_some_and(|c| c == self));
        let index = near.or_else(|| children.iter().position(|c| c == self))?;
        self.0.index_hint.store(index, Ordering::Relaxed);
        Some(index)
    }

    /// Whether `other` is this node or one of its descendants. Shadow trees
    /// are not descended into.
    pub fn contains(&self, other: &HostNode) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    fn check_insert(&self, child: &HostNode) -> DomResult<()> {
        let valid_parent = matches!(self.kind(), NodeKind::Element | NodeKind::ShadowRoot);
        if !valid_parent || child.kind() == NodeKind::ShadowRoot || child.contains(self) {
            return Err(DomError::HierarchyRequest {
                parent: self.id(),
                child: child.id(),
            });
        }
        Ok(())
    }

    fn check_child(&self, child: &HostNode) -> DomResult<()> {
        if child.parent().as_ref() != Some(self) {
            return Err(DomError::NotAChild {
                parent: self.id(),
                child: child.id(),
            });
        }
        Ok(())
    }

    /// Unlink from the current parent. Returns whether the node had one.
    fn detach(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        {
            let mut data = parent.0.data.write();
            if let Some(index) = self.index_in(&data.children) {
                data.children.remove(index);
            }
        }
        self.0.data.write().parent = Weak::new();
        true
    }

    /// Insert `child` before `reference`, or at the end when `reference` is
    /// `None`. A child that is already in a tree is moved.
    pub fn insert_before(&self, child: &HostNode, reference: Option<&HostNode>) -> DomResult<()> {
        self.check_insert(child)?;
        let mut reference = reference.cloned();
        if let Some(node) = &reference {
            self.check_child(node)?;
            if node == child {
                reference = child.next_sibling();
            }
        }

        let moved = child.detach();
        {
            let mut data = self.0.data.write();
            let index = reference
                .as_ref()
                .and_then(|r| r.index_in(&data.children))
                .unwrap_or(data.children.len());
            data.children.insert(index, child.clone());
            child.0.index_hint.store(index, Ordering::Relaxed);
        }
        child.0.data.write().parent = Arc::downgrade(&self.0);

        self.record(if moved { Mutation::Moved } else { Mutation::Inserted });
        Ok(())
    }

    pub fn append_child(&self, child: &HostNode) -> DomResult<()> {
        self.insert_before(child, None)
    }

    pub fn prepend_child(&self, child: &HostNode) -> DomResult<()> {
        let first = self.first_child();
        self.insert_before(child, first.as_ref())
    }

    /// Put `new` where `old` is. `old` ends up detached.
    pub fn replace_child(&self, new: &HostNode, old: &HostNode) -> DomResult<()> {
        self.check_child(old)?;
        self.check_insert(new)?;
        if new == old {
            return Ok(());
        }

        let moved = new.detach();
        {
            let mut data = self.0.data.write();
            let Some(index) = old.index_in(&data.children) else {
                return Err(DomError::NotAChild {
                    parent: self.id(),
                    child: old.id(),
                });
            };
            data.children[index] = new.clone();
            new.0.index_hint.store(index, Ordering::Relaxed);
        }
        new.0.data.write().parent = Arc::downgrade(&self.0);
        old.0.data.write().parent = Weak::new();

        self.record(if moved { Mutation::Moved } else { Mutation::Inserted });
        self.record(Mutation::Removed);
        Ok(())
    }

    pub fn remove_child(&self, child: &HostNode) -> DomResult<()> {
        self.check_child(child)?;
        child.detach();
        self.record(Mutation::Removed);
        Ok(())
    }

    /// Remove this node from its parent. A detached node is left alone.
    pub fn remove(&self) -> DomResult<()> {
        match self.parent() {
            Some(parent) => parent.remove_child(self),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    fn not_an_element(&self) -> DomError {
        DomError::NotAnElement(self.id())
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.0
            .data
            .read()
            .element
            .as_ref()
            .and_then(|e| e.attributes.get(name).cloned())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.0
            .data
            .read()
            .element
            .as_ref()
            .is_some_and(|e| e.attributes.contains_key(name))
    }

    /// Attribute names in the order they were first set.
    pub fn attribute_names(&self) -> Vec<String> {
        self.0
            .data
            .read()
            .element
            .as_ref()
            .map(|e| e.attributes.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Set an attribute. Setting `style` replaces the inline style.
    pub fn set_attribute(&self, name: &str, value: &str) -> DomResult<()> {
        {
            let mut data = self.0.data.write();
            let element = data.element.as_mut().ok_or_else(|| self.not_an_element())?;
            if name == "style" {
                element.style.set_css_text(value);
                element.sync_style_attribute();
            } else {
                element.attributes.insert(name.to_owned(), value.to_owned());
            }
        }
        self.record(Mutation::Attribute);
        Ok(())
    }

    pub fn remove_attribute(&self, name: &str) -> DomResult<()> {
        let removed = {
            let mut data = self.0.data.write();
            let element = data.element.as_mut().ok_or_else(|| self.not_an_element())?;
            if name == "style" {
                element.style = CssStyle::new();
            }
            element.attributes.shift_remove(name).is_some()
        };
        if removed {
            self.record(Mutation::Attribute);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    /// Whether `name` is a settable field of this element: a native property
    /// of its tag, a property declared by its class, or an expando written
    /// earlier through [`set_property`](Self::set_property).
    pub fn has_property(&self, name: &str) -> bool {
        let data = self.0.data.read();
        let Some(element) = data.element.as_ref() else {
            return false;
        };
        element.properties.contains_key(name)
            || element.class_defines(name)
            || element.native(name).is_some()
    }

    /// Read a property. Reflected properties read their attribute; live
    /// properties fall back to the same-named attribute until written.
    pub fn property(&self, name: &str) -> Option<PropValue> {
        let data = self.0.data.read();
        let element = data.element.as_ref()?;
        if let Some(value) = element.properties.get(name) {
            return Some(value.clone());
        }
        if element.class_defines(name) {
            return Some(PropValue::Null);
        }
        let attribute = |attr: &str| element.attributes.get(attr).cloned();
        let value = match element.native(name)? {
            NativeProp::Text(attr) => PropValue::String(attribute(attr).unwrap_or_default()),
            NativeProp::Flag(attr) => PropValue::Bool(element.attributes.contains_key(attr)),
            NativeProp::Number(attr) => PropValue::Number(
                attribute(attr)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0.0),
            ),
            NativeProp::LiveText => PropValue::String(attribute(name).unwrap_or_default()),
            NativeProp::LiveFlag => PropValue::Bool(element.attributes.contains_key(name)),
            NativeProp::LiveNumber => PropValue::Number(0.0),
            NativeProp::ReadOnly => PropValue::Null,
        };
        Some(value)
    }

    /// Assign a property.
    ///
    /// Reflected properties write through to their attribute (`Null` removes
    /// it, flags are set or removed by truthiness). Live properties are
    /// coerced to their native type. Read-only properties ignore the write.
    /// Everything else is stored as given.
    pub fn set_property(&self, name: &str, value: PropValue) -> DomResult<()> {
        {
            let mut data = self.0.data.write();
            let element = data.element.as_mut().ok_or_else(|| self.not_an_element())?;
            match element.native(name) {
                Some(NativeProp::Text(attr)) | Some(NativeProp::Number(attr)) => {
                    if value.is_null() {
                        element.attributes.shift_remove(attr);
                    } else {
                        element
                            .attributes
                            .insert(attr.to_owned(), value.to_attribute_string());
                    }
                }
                Some(NativeProp::Flag(attr)) => {
                    if value.is_truthy() {
                        element.attributes.insert(attr.to_owned(), String::new());
                    } else {
                        element.attributes.shift_remove(attr);
                    }
                }
                Some(NativeProp::LiveText) => {
                    let text = if value.is_null() {
                        String::new()
                    } else {
                        value.to_attribute_string()
                    };
                    element.properties.insert(name.to_owned(), PropValue::String(text));
                }
                Some(NativeProp::LiveFlag) => {
                    let flag = value.is_truthy();
                    element.properties.insert(name.to_owned(), PropValue::Bool(flag));
                }
                Some(NativeProp::LiveNumber) => {
                    let number = match &value {
                        PropValue::Number(n) => *n,
                        PropValue::String(s) => s.trim().parse().unwrap_or(0.0),
                        _ => 0.0,
                    };
                    element.properties.insert(name.to_owned(), PropValue::Number(number));
                }
                Some(NativeProp::ReadOnly) => {
                    tracing::trace!(node = %self.id(), property = name, "ignoring read-only property");
                    return Ok(());
                }
                None => {
                    element.properties.insert(name.to_owned(), value);
                }
            }
        }
        self.record(Mutation::Property);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Style
    // ------------------------------------------------------------------------

    pub fn style_property(&self, name: &str) -> Option<String> {
        self.0
            .data
            .read()
            .element
            .as_ref()
            .and_then(|e| e.style.get(name).map(str::to_owned))
    }

    /// Set one style declaration. `None` or an empty value removes it.
    pub fn set_style_property(&self, name: &str, value: Option<&str>) -> DomResult<()> {
        {
            let mut data = self.0.data.write();
            let element = data.element.as_mut().ok_or_else(|| self.not_an_element())?;
            match value {
                Some(value) => element.style.set(name, value),
                None => {
                    element.style.remove(name);
                }
            }
            element.sync_style_attribute();
        }
        self.record(Mutation::Style);
        Ok(())
    }

    pub fn css_text(&self) -> String {
        self.0
            .data
            .read()
            .element
            .as_ref()
            .map(|e| e.style.css_text())
            .unwrap_or_default()
    }

    pub fn set_css_text(&self, text: &str) -> DomResult<()> {
        {
            let mut data = self.0.data.write();
            let element = data.element.as_mut().ok_or_else(|| self.not_an_element())?;
            element.style.set_css_text(text);
            element.sync_style_attribute();
        }
        self.record(Mutation::Style);
        Ok(())
    }

    /// Snapshot of the inline style.
    pub fn style(&self) -> CssStyle {
        self.0
            .data
            .read()
            .element
            .as_ref()
            .map(|e| e.style.clone())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Register a listener. Returns `false` when the same listener is already
    /// registered for this event type and capture flag.
    pub fn add_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener,
        options: ListenerOptions,
    ) -> bool {
        {
            let mut data = self.0.data.write();
            if data
                .listeners
                .iter()
                .any(|r| r.matches(event_type, listener, options.capture))
            {
                return false;
            }
            data.listeners.push(Registration {
                event_type: event_type.to_owned(),
                listener: listener.clone(),
                options,
            });
        }
        self.record(Mutation::ListenerAdded);
        true
    }

    /// Deregister a listener. Returns whether it was registered.
    pub fn remove_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener,
        capture: bool,
    ) -> bool {
        let removed = {
            let mut data = self.0.data.write();
            let before = data.listeners.len();
            data.listeners
                .retain(|r| !r.matches(event_type, listener, capture));
            data.listeners.len() != before
        };
        if removed {
            self.record(Mutation::ListenerRemoved);
        }
        removed
    }

    /// Number of listeners registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.0
            .data
            .read()
            .listeners
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }

    fn has_registration(&self, registration: &Registration) -> bool {
        self.0.data.read().listeners.iter().any(|r| {
            r.matches(
                &registration.event_type,
                &registration.listener,
                registration.options.capture,
            )
        })
    }

    /// Dispatch an event at this node. Returns `false` if a listener
    /// cancelled it.
    pub fn dispatch_event(&self, event: Event) -> bool {
        // (node, target as seen from that node)
        let mut path: SmallVec<[(HostNode, HostNode); 8]> = SmallVec::new();
        let mut target = self.clone();
        let mut current = Some(self.clone());
        while let Some(node) = current {
            path.push((node.clone(), target.clone()));
            current = match node.parent() {
                Some(parent) => Some(parent),
                None => node.shadow_host().inspect(|host| target = host.clone()),
            };
        }

        for (node, target) in path.iter().skip(1).rev() {
            node.invoke_listeners(&event, target, EventPhase::Capturing, Some(true));
            if event.propagation_stopped() {
                return !event.default_prevented();
            }
        }

        self.invoke_listeners(&event, self, EventPhase::AtTarget, Some(true));
        self.invoke_listeners(&event, self, EventPhase::AtTarget, Some(false));

        if event.does_bubble() {
            for (node, target) in path.iter().skip(1) {
                if event.propagation_stopped() {
                    break;
                }
                node.invoke_listeners(&event, target, EventPhase::Bubbling, Some(false));
            }
        }

        !event.default_prevented()
    }

    fn invoke_listeners(
        &self,
        event: &Event,
        target: &HostNode,
        phase: EventPhase,
        capture: Option<bool>,
    ) {
        let registrations: SmallVec<[Registration; 4]> = self
            .0
            .data
            .read()
            .listeners
            .iter()
            .filter(|r| r.event_type == event.event_type())
            .filter(|r| capture.map_or(true, |c| r.options.capture == c))
            .cloned()
            .collect();

        for registration in registrations {
            // An earlier listener may have removed this one.
            if !self.has_registration(&registration) {
                continue;
            }
            if registration.options.once {
                self.remove_event_listener(
                    &registration.event_type,
                    &registration.listener,
                    registration.options.capture,
                );
            }
            let event = event.retarget(target, self, phase);
            event.set_passive(registration.options.passive);
            registration.listener.call(&event);
            event.set_passive(false);
        }
    }

    // ------------------------------------------------------------------------
    // Shadow roots
    // ------------------------------------------------------------------------

    /// Attach a shadow root to this element.
    pub fn attach_shadow(&self) -> DomResult<HostNode> {
        {
            let data = self.0.data.read();
            if data.element.is_none() {
                return Err(self.not_an_element());
            }
            if data.shadow_root.is_some() {
                return Err(DomError::ShadowRootExists(self.id()));
            }
        }
        let root = HostNode::alloc(&self.0.document, NodeKind::ShadowRoot, String::new(), None);
        root.0.data.write().shadow_host = Arc::downgrade(&self.0);
        self.0.data.write().shadow_root = Some(root.clone());
        Ok(root)
    }

    pub fn shadow_root(&self) -> Option<HostNode> {
        self.0.data.read().shadow_root.clone()
    }

    /// The element a shadow root is attached to.
    pub fn shadow_host(&self) -> Option<HostNode> {
        self.0.data.read().shadow_host.upgrade().map(HostNode)
    }

    // ------------------------------------------------------------------------
    // Render slots
    // ------------------------------------------------------------------------

    /// Opaque state stored on this node by the renderer owning `context`.
    pub fn render_slot(&self, context: ContextId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.0.slots.get(&context).map(|entry| entry.value().clone())
    }

    pub fn set_render_slot(&self, context: ContextId, value: Arc<dyn Any + Send + Sync>) {
        self.0.slots.insert(context, value);
    }

    pub fn clear_render_slot(&self, context: ContextId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.0.slots.remove(&context).map(|(_, value)| value)
    }

    // ------------------------------------------------------------------------
    // Cloning and serialization
    // ------------------------------------------------------------------------

    /// Copy this node. Attributes, style, properties, class and text are
    /// copied; listeners, render slots and shadow roots are not.
    pub fn clone_node(&self, deep: bool) -> HostNode {
        let (text, element) = {
            let data = self.0.data.read();
            let element = data.element.as_ref().map(|e| ElementData {
                local_name: e.local_name.clone(),
                namespace: e.namespace.clone(),
                class: e.class.clone(),
                attributes: e.attributes.clone(),
                properties: e.properties.clone(),
                style: e.style.clone(),
            });
            (data.text.clone(), element)
        };
        let copy = HostNode::alloc(&self.0.document, self.kind(), text, element);
        if deep {
            for child in self.children() {
                let child = child.clone_node(true);
                {
                    let mut data = copy.0.data.write();
                    child.0.index_hint.store(data.children.len(), Ordering::Relaxed);
                    data.children.push(child.clone());
                }
                child.0.data.write().parent = Arc::downgrade(&copy.0);
            }
        }
        copy
    }

    /// Concatenated character data of all descendant text nodes.
    pub fn text_content(&self) -> String {
        match self.kind() {
            NodeKind::Text => self.0.data.read().text.clone(),
            NodeKind::Marker => String::new(),
            _ => self.children().iter().map(HostNode::text_content).collect(),
        }
    }

    /// Markup for this node and its light-tree descendants.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Markup for this node's light-tree children.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        match self.kind() {
            NodeKind::Text => escape_into(out, &self.0.data.read().text, false),
            NodeKind::Marker => {}
            NodeKind::ShadowRoot => out.push_str(&self.inner_html()),
            NodeKind::Element => {
                let (tag, attributes) = {
                    let data = self.0.data.read();
                    let Some(element) = data.element.as_ref() else {
                        return;
                    };
                    (element.local_name.clone(), element.attributes.clone())
                };
                out.push('<');
                out.push_str(&tag);
                for (name, value) in &attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(out, value, true);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in self.children() {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

impl PartialEq for HostNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for HostNode {}

impl Hash for HostNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.data.read();
        match (self.kind(), data.element.as_ref()) {
            (NodeKind::Element, Some(element)) => {
                write!(f, "HostNode({} <{}>)", self.id(), element.local_name)
            }
            (NodeKind::Text, _) => write!(f, "HostNode({} {:?})", self.id(), data.text),
            (kind, _) => write!(f, "HostNode({} {:?})", self.id(), kind),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn list(doc: &Document, parent: &HostNode, names: &[&str]) -> Vec<HostNode> {
        names
            .iter()
            .map(|name| {
                let node = doc.create_text(name);
                parent.append_child(&node).unwrap();
                node
            })
            .collect()
    }

    #[test]
    fn test_insert_and_navigate() {
        let doc = Document::new();
        let parent = doc.create_element("ul");
        let nodes = list(&doc, &parent, &["a", "b", "c"]);

        assert_eq!(parent.child_count(), 3);
        assert_eq!(nodes[0].next_sibling(), Some(nodes[1].clone()));
        assert_eq!(nodes[2].previous_sibling(), Some(nodes[1].clone()));
        assert_eq!(nodes[2].next_sibling(), None);
        assert_eq!(nodes[1].parent(), Some(parent.clone()));
        assert_eq!(parent.text_content(), "abc");
    }

    #[test]
    fn test_insert_before_moves_existing_child() {
        let doc = Document::new();
        let parent = doc.create_element("div");
        let nodes = list(&doc, &parent, &["a", "b", "c"]);
        let before = doc.stats();

        parent.insert_before(&nodes[2], Some(&nodes[0])).unwrap();

        assert_eq!(parent.text_content(), "cab");
        let delta = doc.stats().since(&before);
        assert_eq!(delta.moved, 1);
        assert_eq!(delta.inserted, 0);
    }

    #[test]
    fn test_siblings_after_index_shifts() {
        let doc = Document::new();
        let parent = doc.create_element("div");
        let nodes = list(&doc, &parent, &["a", "b", "c", "d", "e"]);

        // Shift every cached index by more than one.
        let front: Vec<HostNode> = ["x", "y", "z"].iter().map(|t| doc.create_text(t)).collect();
        for node in &front {
            parent.prepend_child(node).unwrap();
        }
        assert_eq!(nodes[3].next_sibling(), Some(nodes[4].clone()));
        assert_eq!(nodes[0].previous_sibling(), Some(front[0].clone()));

        front[1].remove().unwrap();
        nodes[1].remove().unwrap();
        assert_eq!(nodes[0].next_sibling(), Some(nodes[2].clone()));
        assert_eq!(nodes[4].previous_sibling(), Some(nodes[3].clone()));
        assert_eq!(parent.text_content(), "zxacde");
    }

    #[test]
    fn test_insert_before_self_is_noop_move() {
        let doc = Document::new();
        let parent = doc.create_element("div");
        let nodes = list(&doc, &parent, &["a", "b"]);

        parent.insert_before(&nodes[0], Some(&nodes[0])).unwrap();
        assert_eq!(parent.text_content(), "ab");
    }

    #[test]
    fn test_hierarchy_errors() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        outer.append_child(&inner).unwrap();

        assert_eq!(
            inner.append_child(&outer),
            Err(DomError::HierarchyRequest {
                parent: inner.id(),
                child: outer.id()
            })
        );
        let text = doc.create_text("x");
        assert!(text.append_child(&doc.create_text("y")).is_err());

        let stranger = doc.create_element("p");
        assert_eq!(
            outer.remove_child(&stranger),
            Err(DomError::NotAChild {
                parent: outer.id(),
                child: stranger.id()
            })
        );
    }

    #[test]
    fn test_replace_child() {
        let doc = Document::new();
        let parent = doc.create_element("div");
        let nodes = list(&doc, &parent, &["a", "b", "c"]);
        let fresh = doc.create_text("z");

        parent.replace_child(&fresh, &nodes[1]).unwrap();

        assert_eq!(parent.text_content(), "azc");
        assert_eq!(nodes[1].parent(), None);
        assert_eq!(fresh.parent(), Some(parent));
    }

    #[test]
    fn test_style_reflects_into_attribute() {
        let doc = Document::new();
        let div = doc.create_element("div");

        div.set_style_property("backgroundColor", Some("red")).unwrap();
        assert_eq!(div.get_attribute("style").as_deref(), Some("background-color: red;"));

        div.set_attribute("style", "color: blue").unwrap();
        assert_eq!(div.style_property("color").as_deref(), Some("blue"));
        assert_eq!(div.style_property("background-color"), None);

        div.set_style_property("color", None).unwrap();
        assert!(!div.has_attribute("style"));
    }

    #[test]
    fn test_reflected_and_live_properties() {
        let doc = Document::new();
        let input = doc.create_element("input");

        assert!(input.has_property("value"));
        assert!(input.has_property("className"));
        assert!(!input.has_property("colSpan"));

        input.set_attribute("value", "initial").unwrap();
        assert_eq!(input.property("value"), Some(PropValue::from("initial")));

        input.set_property("value", PropValue::from("typed")).unwrap();
        assert_eq!(input.property("value"), Some(PropValue::from("typed")));
        assert_eq!(input.get_attribute("value").as_deref(), Some("initial"));

        input.set_property("className", PropValue::from("big")).unwrap();
        assert_eq!(input.get_attribute("class").as_deref(), Some("big"));
        input.set_property("className", PropValue::Null).unwrap();
        assert!(!input.has_attribute("class"));

        input.set_property("disabled", PropValue::Bool(true)).unwrap();
        assert_eq!(input.get_attribute("disabled").as_deref(), Some(""));
        input.set_property("disabled", PropValue::Bool(false)).unwrap();
        assert!(!input.has_attribute("disabled"));
    }

    #[test]
    fn test_expando_property_becomes_known() {
        let doc = Document::new();
        let div = doc.create_element("div");

        assert!(!div.has_property("payload"));
        div.set_property("payload", PropValue::from(3.0)).unwrap();
        assert!(div.has_property("payload"));
        assert_eq!(div.property("payload"), Some(PropValue::Number(3.0)));
    }

    #[test]
    fn test_dispatch_phases() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("button");
        outer.append_child(&inner).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let capture_log = log.clone();
        let capture = EventListener::new(move |e: &Event| {
            capture_log.lock().push(format!("capture:{:?}", e.phase()))
        });
        let bubble_log = log.clone();
        let bubble = EventListener::new(move |e: &Event| {
            bubble_log.lock().push(format!("bubble:{:?}", e.phase()))
        });
        let target_log = log.clone();
        let at_target = EventListener::new(move |e: &Event| {
            target_log.lock().push(format!("target:{:?}", e.phase()))
        });

        outer.add_event_listener(
            "click",
            &capture,
            ListenerOptions { capture: true, ..Default::default() },
        );
        outer.add_event_listener("click", &bubble, ListenerOptions::default());
        inner.add_event_listener("click", &at_target, ListenerOptions::default());

        inner.dispatch_event(Event::new("click").bubbles(true));

        assert_eq!(
            *log.lock(),
            vec!["capture:Capturing", "target:AtTarget", "bubble:Bubbling"]
        );
    }

    #[test]
    fn test_once_and_passive_listeners() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let listener = EventListener::new(move |e: &Event| {
            counter.fetch_add(1, Ordering::SeqCst);
            e.prevent_default();
        });

        let options = ListenerOptions { once: true, passive: true, capture: false };
        assert!(node.add_event_listener("wheel", &listener, options));
        assert!(!node.add_event_listener("wheel", &listener, options));

        assert!(node.dispatch_event(Event::new("wheel")));
        assert!(node.dispatch_event(Event::new("wheel")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(node.listener_count("wheel"), 0);
    }

    #[test]
    fn test_events_cross_shadow_boundary() {
        let doc = Document::new();
        let host = doc.create_element("my-widget");
        let root = host.attach_shadow().unwrap();
        let button = doc.create_element("button");
        root.append_child(&button).unwrap();

        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        host.add_event_listener(
            "press",
            &EventListener::new(move |e: &Event| *sink.lock() = e.target().cloned()),
            ListenerOptions::default(),
        );

        button.dispatch_event(Event::new("press").bubbles(true));
        assert_eq!(*seen.lock(), Some(host.clone()));
        assert_eq!(host.attach_shadow(), Err(DomError::ShadowRootExists(host.id())));
    }

    #[test]
    fn test_serialization() {
        let doc = Document::new();
        let div = doc.create_element("div");
        div.set_attribute("title", "a \"quote\"").unwrap();
        div.append_child(&doc.create_marker()).unwrap();
        div.append_child(&doc.create_text("1 < 2")).unwrap();
        div.append_child(&doc.create_element("br")).unwrap();

        assert_eq!(
            div.outer_html(),
            "<div title=\"a &quot;quote&quot;\">1 &lt; 2<br></div>"
        );
    }

    #[test]
    fn test_clone_node_deep() {
        let doc = Document::new();
        let div = doc.create_element("div");
        div.set_attribute("id", "x").unwrap();
        div.append_child(&doc.create_text("hi")).unwrap();
        div.add_event_listener("click", &EventListener::new(|_| {}), ListenerOptions::default());

        let copy = div.clone_node(true);
        assert_ne!(copy, div);
        assert_eq!(copy.outer_html(), div.outer_html());
        assert_eq!(copy.listener_count("click"), 0);
        assert_eq!(div.clone_node(false).child_count(), 0);
    }

    #[test]
    fn test_render_slots_are_per_context() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let a = ContextId::new();
        let b = ContextId::new();

        node.set_render_slot(a, Arc::new(1u32));
        assert!(node.render_slot(b).is_none());
        let value = node.render_slot(a).unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&1));
        assert!(node.clear_render_slot(a).is_some());
        assert!(node.render_slot(a).is_none());
    }
}
