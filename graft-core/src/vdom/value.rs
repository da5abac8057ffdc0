//! Property Values
//!
//! [`PropValue`] is what a virtual node's props map holds. Data values
//! compare by value; callables and refs compare by identity, so a closure
//! rebuilt on every render is a change and a closure kept across renders is
//! not.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::node::{Child, Children};
use crate::dom::{Event, HostNode, ListenerOptions, WeakHostNode};

/// An event handler carried in props, with the listener options it wants
/// when it is first registered.
#[derive(Clone)]
pub struct Callback {
    func: Arc<dyn Fn(&Event) + Send + Sync>,
    options: ListenerOptions,
}

impl Callback {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            options: ListenerOptions::default(),
        }
    }

    /// Listen during the capture phase.
    pub fn capture(mut self) -> Self {
        self.options.capture = true;
        self
    }

    /// Deregister the underlying listener after one event.
    pub fn once(mut self) -> Self {
        self.options.once = true;
        self
    }

    /// Ignore `prevent_default` calls.
    pub fn passive(mut self) -> Self {
        self.options.passive = true;
        self
    }

    pub fn options(&self) -> ListenerOptions {
        self.options
    }

    pub fn call(&self, event: &Event) {
        (self.func)(event)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func) && self.options == other.options
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A cell that receives the host node rendered for a `ref` prop.
///
/// The cell does not keep the node alive.
#[derive(Clone, Default)]
pub struct NodeRef(Arc<RwLock<WeakHostNode>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node last assigned, if it is still alive.
    pub fn current(&self) -> Option<HostNode> {
        self.0.read().upgrade()
    }

    pub(crate) fn set(&self, node: &HostNode) {
        *self.0.write() = node.downgrade();
    }

    pub fn clear(&self) {
        *self.0.write() = WeakHostNode::default();
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.current()).finish()
    }
}

/// A property value.
#[derive(Debug, Clone, Default)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Objects and arrays. An object is a mapping (see [`as_mapping`](Self::as_mapping)).
    Json(serde_json::Value),
    Function(Callback),
    Ref(NodeRef),
    /// Only meaningful under the `children` key.
    Children(Children),
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            // NaN is never equal to itself, so a NaN prop is always rewritten.
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::String(a), PropValue::String(b)) => a == b,
            (PropValue::Json(a), PropValue::Json(b)) => a == b,
            (PropValue::Function(a), PropValue::Function(b)) => a == b,
            (PropValue::Ref(a), PropValue::Ref(b)) => a == b,
            (PropValue::Children(a), PropValue::Children(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PropValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, PropValue::Function(_))
    }

    /// Truthiness in the usual scripting sense: `false`, `0`, `NaN`, `""`
    /// and `Null` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(b) => *b,
            PropValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PropValue::String(s) => !s.is_empty(),
            PropValue::Json(serde_json::Value::Null) => false,
            _ => true,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            PropValue::Function(callback) => Some(callback),
            _ => None,
        }
    }

    pub fn as_node_ref(&self) -> Option<&NodeRef> {
        match self {
            PropValue::Ref(node_ref) => Some(node_ref),
            _ => None,
        }
    }

    /// The entries of an object value.
    pub fn as_mapping(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        match self {
            PropValue::Json(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Serialize for an attribute or a reflected property. Objects and
    /// arrays become JSON; values with no textual form become empty strings.
    pub fn to_attribute_string(&self) -> String {
        match self {
            PropValue::Null => "null".to_owned(),
            PropValue::Bool(b) => b.to_string(),
            PropValue::Number(n) => format_number(*n),
            PropValue::String(s) => s.clone(),
            PropValue::Json(serde_json::Value::String(s)) => s.clone(),
            PropValue::Json(value) => json_text(value),
            PropValue::Function(_) | PropValue::Ref(_) | PropValue::Children(_) => String::new(),
        }
    }
}

fn json_text(value: &serde_json::Value) -> String {
    match serde_json::to_string(value) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(%err, "failed to serialize prop value");
            String::new()
        }
    }
}

/// Render a number the way a script engine stringifies it: integers without
/// a fractional part, `NaN`, `Infinity` and `-Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_owned()
    } else if n == 0.0 {
        "0".to_owned()
    } else {
        format!("{n}")
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value.into())
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::String(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::String(value)
    }
}

impl From<Callback> for PropValue {
    fn from(value: Callback) -> Self {
        PropValue::Function(value)
    }
}

impl From<NodeRef> for PropValue {
    fn from(value: NodeRef) -> Self {
        PropValue::Ref(value)
    }
}

impl From<Vec<Child>> for PropValue {
    fn from(value: Vec<Child>) -> Self {
        PropValue::Children(value.into())
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

/// Scalars map onto their native variants; objects and arrays stay JSON.
impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropValue::Null,
            serde_json::Value::Bool(b) => PropValue::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(PropValue::Null, PropValue::Number),
            serde_json::Value::String(s) => PropValue::String(s),
            other => PropValue::Json(other),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_callables_compare_by_identity() {
        let a = Callback::new(|_| {});
        let b = Callback::new(|_| {});

        assert_eq!(PropValue::from(a.clone()), PropValue::from(a.clone()));
        assert_ne!(PropValue::from(a), PropValue::from(b));
    }

    #[test]
    fn test_json_values() {
        let value = PropValue::from(json!({"a": 1, "b": [true]}));
        assert!(value.as_mapping().is_some());
        assert_eq!(value.to_attribute_string(), r#"{"a":1,"b":[true]}"#);

        assert_eq!(PropValue::from(json!(2)), PropValue::Number(2.0));
        assert_eq!(PropValue::from(json!([1, 2])).to_attribute_string(), "[1,2]");
    }

    #[test]
    fn test_truthiness() {
        assert!(!PropValue::Null.is_truthy());
        assert!(!PropValue::from(0.0).is_truthy());
        assert!(!PropValue::from("").is_truthy());
        assert!(PropValue::from("no").is_truthy());
        assert!(PropValue::from(json!({})).is_truthy());
    }
}
