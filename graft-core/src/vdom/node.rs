//! Virtual Nodes
//!
//! A [`VirtualNode`] is an immutable description of one node to render. It
//! is a cheap handle: cloning shares the description, and every node built
//! gets a fresh [`BuildId`] so "is this the exact node I rendered last time"
//! is a single integer comparison.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use super::value::{Callback, NodeRef, PropValue};
use crate::dom::{ElementClass, HostNode, WeakHostNode};

/// Ordered prop entries.
pub type PropMap = IndexMap<String, PropValue>;

/// Shared props. "Props changed" means "not the same `Arc`".
pub type Props = Arc<PropMap>;

/// Shared children. "Children changed" means "not the same `Arc`".
pub type Children = Arc<[Child]>;

/// The shared empty props map.
pub fn empty_props() -> Props {
    static EMPTY: OnceLock<Props> = OnceLock::new();
    EMPTY.get_or_init(|| Arc::new(PropMap::new())).clone()
}

/// The shared empty child list.
pub fn empty_children() -> Children {
    static EMPTY: OnceLock<Children> = OnceLock::new();
    EMPTY.get_or_init(|| Arc::from(Vec::new())).clone()
}

/// One entry of a child list.
#[derive(Debug, Clone)]
pub enum Child {
    Node(VirtualNode),
    Text(String),
    Number(f64),
    /// Renders nothing.
    Bool(bool),
    /// Renders nothing.
    Null,
    /// Renders nothing.
    Callback(Callback),
    /// Flattened into the surrounding list.
    List(Vec<Child>),
    /// Some other value that is not a node. Renders nothing.
    Opaque(serde_json::Value),
}

impl From<VirtualNode> for Child {
    fn from(node: VirtualNode) -> Self {
        Child::Node(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_owned())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<f64> for Child {
    fn from(n: f64) -> Self {
        Child::Number(n)
    }
}

impl From<i32> for Child {
    fn from(n: i32) -> Self {
        Child::Number(n.into())
    }
}

impl From<bool> for Child {
    fn from(b: bool) -> Self {
        Child::Bool(b)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Child::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(item: Option<T>) -> Self {
        item.map_or(Child::Null, Into::into)
    }
}

/// Identity of a child among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Text(String),
    Int(i64),
}

impl Key {
    fn from_prop(value: &PropValue) -> Option<Key> {
        match value {
            PropValue::String(s) => Some(Key::Text(s.clone())),
            PropValue::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(Key::Int(*n as i64)),
            PropValue::Number(n) => Some(Key::Text(super::value::format_number(*n))),
            PropValue::Bool(b) => Some(Key::Text(b.to_string())),
            _ => None,
        }
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Key::Text(key.to_owned())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key::Text(key)
    }
}

impl From<i64> for Key {
    fn from(key: i64) -> Self {
        Key::Int(key)
    }
}

impl From<i32> for Key {
    fn from(key: i32) -> Self {
        Key::Int(key.into())
    }
}

impl From<Key> for PropValue {
    fn from(key: Key) -> Self {
        match key {
            Key::Text(s) => PropValue::String(s),
            Key::Int(n) => PropValue::Number(n as f64),
        }
    }
}

/// What a virtual node renders as.
#[derive(Clone)]
pub enum NodeType {
    /// An element created by tag name. The tag `host` means "the node being
    /// rendered into".
    Tag(String),
    /// A specific host node, used as-is.
    Node(HostNode),
    /// Instances of an element class.
    Class(Arc<ElementClass>),
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            NodeType::Node(node) => f.debug_tuple("Node").field(node).finish(),
            NodeType::Class(class) => f.debug_tuple("Class").field(&class.tag()).finish(),
        }
    }
}

impl From<&str> for NodeType {
    fn from(tag: &str) -> Self {
        NodeType::Tag(tag.to_owned())
    }
}

impl From<String> for NodeType {
    fn from(tag: String) -> Self {
        NodeType::Tag(tag)
    }
}

impl From<HostNode> for NodeType {
    fn from(node: HostNode) -> Self {
        NodeType::Node(node)
    }
}

impl From<Arc<ElementClass>> for NodeType {
    fn from(class: Arc<ElementClass>) -> Self {
        NodeType::Class(class)
    }
}

/// How the reconciler decides whether an existing node can be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VNodeKind {
    /// Same tag name.
    IntrinsicTag,
    /// Same node.
    LiteralNode,
    /// Instance of the class.
    Constructor,
}

/// Unique, monotonically increasing identifier of a built virtual node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildId(u64);

impl BuildId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct VNodeInner {
    build: BuildId,
    node_type: NodeType,
    props: Props,
    children: Children,
    key: Option<Key>,
    shadow: bool,
    once: bool,
    is: Option<String>,
    instance: OnceLock<WeakHostNode>,
}

/// An immutable description of a node to render.
#[derive(Clone)]
pub struct VirtualNode(Arc<VNodeInner>);

/// Build a virtual node.
///
/// Children come from `props.children` when it is present and not null,
/// otherwise from `children`. `key`, `shadowDom`, `renderOnce` and `is` are
/// read from the props.
pub fn h(node_type: impl Into<NodeType>, props: PropMap, children: Vec<Child>) -> VirtualNode {
    let children = match props.get("children") {
        Some(PropValue::Children(list)) => list.clone(),
        Some(PropValue::Null) | None if children.is_empty() => empty_children(),
        Some(PropValue::Null) | None => Children::from(children),
        Some(other) => Arc::from(vec![prop_as_child(other)]),
    };
    let props = if props.is_empty() {
        empty_props()
    } else {
        Arc::new(props)
    };
    VirtualNode::from_parts(node_type.into(), props, children)
}

fn prop_as_child(value: &PropValue) -> Child {
    match value {
        PropValue::Null => Child::Null,
        PropValue::Bool(b) => Child::Bool(*b),
        PropValue::Number(n) => Child::Number(*n),
        PropValue::String(s) => Child::Text(s.clone()),
        PropValue::Function(callback) => Child::Callback(callback.clone()),
        PropValue::Json(value) => Child::Opaque(value.clone()),
        PropValue::Ref(_) => Child::Opaque(serde_json::Value::Null),
        PropValue::Children(list) => Child::List(list.to_vec()),
    }
}

impl VirtualNode {
    /// Start building a node with the [`VNodeBuilder`].
    pub fn builder(node_type: impl Into<NodeType>) -> VNodeBuilder {
        VNodeBuilder {
            node_type: node_type.into(),
            props: PropMap::new(),
            children: Vec::new(),
        }
    }

    fn from_parts(node_type: NodeType, props: Props, children: Children) -> Self {
        let flag = |name: &str| props.get(name).is_some_and(PropValue::is_truthy);
        let key = props.get("key").and_then(Key::from_prop);
        let shadow = flag("shadowDom");
        let once = flag("renderOnce");
        let is = match props.get("is") {
            Some(PropValue::String(is)) => Some(is.clone()),
            _ => None,
        };
        Self(Arc::new(VNodeInner {
            build: BuildId::next(),
            node_type,
            props,
            children,
            key,
            shadow,
            once,
            is,
            instance: OnceLock::new(),
        }))
    }

    /// Rebuild this description with new props, keeping the children.
    pub fn with_props(&self, props: Props) -> Self {
        Self::from_parts(self.0.node_type.clone(), props, self.0.children.clone())
    }

    /// Rebuild this description with new children, keeping the props.
    pub fn with_children(&self, children: Children) -> Self {
        Self::from_parts(self.0.node_type.clone(), self.0.props.clone(), children)
    }

    pub fn build_id(&self) -> BuildId {
        self.0.build
    }

    /// Whether both handles come from the same build.
    pub fn same(&self, other: &VirtualNode) -> bool {
        self.0.build == other.0.build
    }

    pub fn node_type(&self) -> &NodeType {
        &self.0.node_type
    }

    pub fn kind(&self) -> VNodeKind {
        match self.0.node_type {
            NodeType::Tag(_) => VNodeKind::IntrinsicTag,
            NodeType::Node(_) => VNodeKind::LiteralNode,
            NodeType::Class(_) => VNodeKind::Constructor,
        }
    }

    /// Tag name of an intrinsic-tag node.
    pub fn tag(&self) -> Option<&str> {
        match &self.0.node_type {
            NodeType::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    pub fn children(&self) -> &Children {
        &self.0.children
    }

    pub fn key(&self) -> Option<&Key> {
        self.0.key.as_ref()
    }

    /// Children render into a shadow root.
    pub fn shadow(&self) -> bool {
        self.0.shadow
    }

    /// Only the first render touches props and children.
    pub fn once(&self) -> bool {
        self.0.once
    }

    /// Customized built-in name.
    pub fn is(&self) -> Option<&str> {
        self.0.is.as_deref()
    }

    /// The host node first created for this description, while it is alive.
    pub fn instance(&self) -> Option<HostNode> {
        self.0.instance.get().and_then(WeakHostNode::upgrade)
    }

    pub(crate) fn remember_instance(&self, node: &HostNode) {
        let _ = self.0.instance.set(node.downgrade());
    }
}

impl fmt::Debug for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualNode")
            .field("build", &self.0.build)
            .field("type", &self.0.node_type)
            .field("key", &self.0.key)
            .field("props", &self.0.props.len())
            .field("children", &self.0.children.len())
            .finish()
    }
}

/// Builder for [`VirtualNode`].
#[must_use]
pub struct VNodeBuilder {
    node_type: NodeType,
    props: PropMap,
    children: Vec<Child>,
}

impl VNodeBuilder {
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn key(self, key: impl Into<Key>) -> Self {
        let key: Key = key.into();
        self.prop("key", key)
    }

    /// Render children into a shadow root.
    pub fn shadow(self) -> Self {
        self.prop("shadowDom", true)
    }

    /// Skip every render after the first.
    pub fn once(self) -> Self {
        self.prop("renderOnce", true)
    }

    /// Attach an event handler, e.g. `on("click", ..)` sets `onclick`.
    pub fn on(self, event: &str, callback: Callback) -> Self {
        self.prop(format!("on{event}"), callback)
    }

    pub fn node_ref(self, node_ref: &NodeRef) -> Self {
        self.prop("ref", node_ref.clone())
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> VirtualNode {
        h(self.node_type, self.props, self.children)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
