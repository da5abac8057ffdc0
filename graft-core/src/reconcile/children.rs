//! Keyed Children Reconciler
//!
//! A node's rendered children live in a [`Fragment`]: the region between two
//! persistent marker nodes. The reconciler walks the new child list with a
//! cursor that starts at the opening marker and, for each child, settles
//! the node that belongs right after the cursor. Whatever is left between
//! the cursor and the closing marker afterwards is stale and removed.
//!
//! Nodes outside the markers are never created, moved or removed, so a
//! renderer can share its parent with content it does not own.
//!
//! # Matching
//!
//! A keyed child first looks for the node recorded under its key in the
//! previous pass. Otherwise the node right after the cursor is a positional
//! candidate, unless it is the closing marker, was recorded under a key
//! last pass, or was already used in this pass.

use std::borrow::Cow;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;

use crate::dom::{ContextId, Document, HostNode};
use crate::vdom::{format_number, Child, Key, VirtualNode};

use super::render::render_node;

/// The region of a parent owned by one rendered child list.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    start: HostNode,
    end: HostNode,
    keys: Option<IndexMap<Key, HostNode>>,
}

impl Fragment {
    fn create(document: &Document, parent: &HostNode, hydrate: bool) -> Self {
        let start = document.create_marker();
        let end = document.create_marker();
        let placed = if hydrate {
            parent.prepend_child(&start)
        } else {
            parent.append_child(&start)
        };
        if let Err(err) = placed.and_then(|_| parent.append_child(&end)) {
            tracing::error!(parent = %parent.id(), %err, "failed to place fragment markers");
        }
        tracing::debug!(parent = %parent.id(), hydrate, "created fragment");
        Self {
            start,
            end,
            keys: None,
        }
    }

    /// Both markers are children of `parent`, start before end.
    fn is_intact(&self, parent: &HostNode) -> bool {
        if self.start.parent().as_ref() != Some(parent) || self.end.parent().as_ref() != Some(parent)
        {
            return false;
        }
        let mut next = self.start.next_sibling();
        while let Some(node) = next {
            if node == self.end {
                return true;
            }
            next = node.next_sibling();
        }
        false
    }

    /// Nodes strictly between the markers.
    pub(crate) fn nodes(&self) -> Vec<HostNode> {
        let mut nodes = Vec::new();
        let mut next = self.start.next_sibling();
        while let Some(node) = next {
            if node == self.end {
                break;
            }
            next = node.next_sibling();
            nodes.push(node);
        }
        nodes
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.as_ref().map_or(0, IndexMap::len)
    }
}

enum Item<'a> {
    Node(&'a VirtualNode),
    Text(Cow<'a, str>),
}

fn flatten<'a>(children: &'a [Child], out: &mut SmallVec<[Item<'a>; 16]>) {
    for child in children {
        match child {
            Child::Node(vnode) => out.push(Item::Node(vnode)),
            Child::Text(text) => out.push(Item::Text(Cow::Borrowed(text))),
            Child::Number(n) => out.push(Item::Text(Cow::Owned(format_number(*n)))),
            Child::List(list) => flatten(list, out),
            Child::Bool(_) | Child::Null | Child::Callback(_) | Child::Opaque(_) => {}
        }
    }
}

fn log_failure(parent: &HostNode, operation: &str, result: crate::error::DomResult<()>) {
    if let Err(err) = result {
        tracing::error!(parent = %parent.id(), operation, %err, "children reconciliation failed");
    }
}

/// Reconcile `children` into the region `fragment` owns under `parent`,
/// creating the region on first use.
pub(crate) fn reconcile_children(
    document: &Document,
    children: &[Child],
    fragment: Option<Fragment>,
    parent: &HostNode,
    context: ContextId,
    hydrate: bool,
    svg: bool,
) -> Fragment {
    let fragment = match fragment {
        Some(fragment) if fragment.is_intact(parent) => fragment,
        Some(broken) => {
            tracing::warn!(parent = %parent.id(), "fragment markers moved or missing, recreating");
            for marker in [&broken.start, &broken.end] {
                if marker.parent().as_ref() == Some(parent) {
                    log_failure(parent, "remove marker", marker.remove());
                }
            }
            Fragment::create(document, parent, hydrate)
        }
        None => Fragment::create(document, parent, hydrate),
    };

    let mut items = SmallVec::<[Item<'_>; 16]>::new();
    flatten(children, &mut items);

    let Fragment {
        start,
        end,
        keys: old_keys,
    } = fragment;
    let old_keys = old_keys.unwrap_or_default();
    let old_keyed: IndexSet<HostNode> = old_keys.values().cloned().collect();
    let region: IndexSet<HostNode> = if old_keys.is_empty() {
        IndexSet::new()
    } else {
        Fragment {
            start: start.clone(),
            end: end.clone(),
            keys: None,
        }
        .nodes()
        .into_iter()
        .collect()
    };

    let mut claimed: IndexSet<HostNode> = IndexSet::with_capacity(items.len());
    let mut new_keys: IndexMap<Key, HostNode> = IndexMap::new();
    let mut cursor = start.clone();

    for item in items {
        let next = cursor.next_sibling().unwrap_or_else(|| end.clone());
        let key = match &item {
            Item::Node(vnode) => vnode.key(),
            Item::Text(_) => None,
        };
        let duplicate = key.is_some_and(|key| new_keys.contains_key(key));
        if duplicate {
            tracing::warn!(parent = %parent.id(), ?key, "duplicate key in child list");
        }

        let matched = key
            .filter(|_| !duplicate)
            .and_then(|key| old_keys.get(key))
            .filter(|node| !claimed.contains(*node) && region.contains(*node))
            .cloned();
        let in_order = Some(next.clone())
            .filter(|node| *node != end && !old_keyed.contains(node) && !claimed.contains(node));
        let candidate = if duplicate {
            None
        } else {
            matched.or_else(|| in_order.clone())
        };

        let result = match item {
            Item::Text(text) => match candidate.as_ref().filter(|node| node.is_text()) {
                Some(node) => {
                    if node.data().as_deref() != Some(text.as_ref()) {
                        node.set_data(&text);
                    }
                    node.clone()
                }
                None => document.create_text(&text),
            },
            Item::Node(vnode) => {
                render_node(document, vnode, candidate.as_ref(), context, hydrate, svg)
            }
        };

        if result != next {
            match &in_order {
                Some(in_order) if candidate.as_ref() == Some(in_order) => {
                    log_failure(parent, "replace_child", parent.replace_child(&result, in_order));
                }
                _ => {
                    log_failure(parent, "insert_before", parent.insert_before(&result, Some(&next)));
                }
            }
        }

        // A node that could not be placed stays out of the region.
        if result.parent().as_ref() != Some(parent) {
            continue;
        }
        if let (Some(key), false) = (key, duplicate) {
            new_keys.insert(key.clone(), result.clone());
        }
        claimed.insert(result.clone());
        cursor = result;
    }

    let mut next = cursor.next_sibling();
    while let Some(node) = next {
        if node == end {
            break;
        }
        next = node.next_sibling();
        log_failure(parent, "remove stale child", parent.remove_child(&node));
    }

    for node in old_keys.values() {
        if !claimed.contains(node)
            && region.contains(node)
            && node.parent().as_ref() == Some(parent)
        {
            log_failure(parent, "remove stale keyed child", parent.remove_child(node));
        }
    }

    Fragment {
        start,
        end,
        keys: (!new_keys.is_empty()).then_some(new_keys),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
