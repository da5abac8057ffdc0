//! Property Differ
//!
//! Applies the difference between two prop maps to one host node. Every key
//! lands in exactly one of these channels, checked in order:
//!
//! 1. internal keys (`children`, `key`, `shadowDom`, `renderOnce`, anything
//!    starting with `_`) are skipped;
//! 2. unchanged values are skipped;
//! 3. `on*` keys with a callable on either side become event handlers;
//! 4. `ref` receives the node;
//! 5. `style` diffs declarations or replaces the style text;
//! 6. everything else is a host property or an attribute. A leading `$`
//!    forces the attribute.

use crate::dom::HostNode;
use crate::error::DomResult;
use crate::vdom::{format_number, PropMap, PropValue};

use super::events::Handlers;

const INTERNAL_PROPS: &[&str] = &["shadowDom", "renderOnce", "children", "key"];

/// Props whose previous value is read back from the node, since the user
/// can change them without a render.
const LIVE_PROPS: &[&str] = &["id", "className", "checked", "value", "selected"];

/// Props written as attributes even when the node has a same-named property.
const PROPS_AS_ATTRS: &[&str] = &[
    "list", "type", "size", "form", "width", "height", "src", "href", "slot",
];

/// Apply `old` → `new` to `node`.
pub(crate) fn diff_props(
    node: &HostNode,
    old: &PropMap,
    new: &PropMap,
    handlers: &Handlers,
    svg: bool,
) {
    for (key, value) in old {
        if !new.contains_key(key) {
            set_prop(node, key, value, &PropValue::Null, handlers, svg);
        }
    }
    for (key, value) in new {
        let prev = old.get(key).unwrap_or(&PropValue::Null);
        set_prop(node, key, prev, value, handlers, svg);
    }
}

fn set_prop(
    node: &HostNode,
    key: &str,
    prev: &PropValue,
    next: &PropValue,
    handlers: &Handlers,
    svg: bool,
) {
    let key = if key == "class" && !svg { "className" } else { key };
    if INTERNAL_PROPS.contains(&key) || key.starts_with('_') {
        return;
    }

    if LIVE_PROPS.contains(&key) && node.has_property(key) {
        let live = node.property(key).unwrap_or_default();
        if same_live_value(&live, next) {
            return;
        }
    } else if prev == next {
        return;
    }

    let result = if key.starts_with("on") && (prev.is_callable() || next.is_callable()) {
        handlers.set(node, &key[2..], next.as_callback());
        Ok(())
    } else if key == "ref" {
        if let Some(node_ref) = next.as_node_ref() {
            node_ref.set(node);
        }
        Ok(())
    } else if key == "style" {
        set_style(node, prev, next)
    } else {
        let (attr, forced) = match key.strip_prefix('$') {
            Some(attr) => (attr, true),
            None => (key, false),
        };
        let native = !svg && !PROPS_AS_ATTRS.contains(&key) && node.has_property(key);
        if !forced && (native || prev.is_callable() || next.is_callable()) {
            node.set_property(key, next.clone())
        } else if next.is_null() {
            node.remove_attribute(attr)
        } else {
            node.set_attribute(attr, &next.to_attribute_string())
        }
    };

    if let Err(err) = result {
        tracing::error!(node = %node.id(), prop = key, %err, "failed to apply prop");
    }
}

/// Compare a value read back from the node with the value being rendered.
/// Nodes report absent values as empty strings or `false`.
fn same_live_value(live: &PropValue, next: &PropValue) -> bool {
    match (live, next) {
        (_, PropValue::Null) => !live.is_truthy(),
        (PropValue::String(text), PropValue::Number(_) | PropValue::Bool(_)) => {
            *text == next.to_attribute_string()
        }
        _ => live == next,
    }
}

fn set_style(node: &HostNode, prev: &PropValue, next: &PropValue) -> DomResult<()> {
    let Some(next_map) = next.as_mapping() else {
        return node.set_css_text(&style_text(next));
    };
    let prev_map = prev.as_mapping();

    if let Some(prev_map) = prev_map {
        for name in prev_map.keys() {
            if !next_map.contains_key(name) {
                node.set_style_property(name, None)?;
            }
        }
    }
    for (name, value) in next_map {
        if prev_map.and_then(|prev| prev.get(name)) == Some(value) {
            continue;
        }
        node.set_style_property(name, style_value(value).as_deref())?;
    }
    Ok(())
}

fn style_text(value: &PropValue) -> String {
    match value {
        PropValue::Null => String::new(),
        other => other.to_attribute_string(),
    }
}

fn style_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(n) => n.as_f64().map(format_number),
        other => Some(other.to_string()),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
