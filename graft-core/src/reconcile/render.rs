//! Tree Reconciler
//!
//! Reconciles one virtual node against one host node and recurses into the
//! children. What it learns about a node is stored on that node, in the
//! render slot of the renderer's [`ContextId`], so the next pass can diff
//! against it.

use std::sync::Arc;

use crate::dom::{ContextId, Document, HostNode, NodeKind, SVG_NAMESPACE};
use crate::vdom::{empty_children, empty_props, BuildId, Children, NodeType, Props, VirtualNode};

use super::children::{reconcile_children, Fragment};
use super::events::Handlers;
use super::props::diff_props;

/// Bookkeeping left on a host node by the last reconciliation.
#[derive(Debug)]
pub(crate) struct RenderState {
    /// Build of the virtual node last reconciled here.
    pub(crate) build: BuildId,
    pub(crate) props: Props,
    pub(crate) children: Children,
    pub(crate) handlers: Handlers,
    pub(crate) fragment: Option<Fragment>,
    /// Completed reconciliations of this node.
    pub(crate) generation: u64,
}

impl RenderState {
    pub(crate) fn load(node: &HostNode, context: ContextId) -> Option<Arc<RenderState>> {
        node.render_slot(context)?.downcast::<RenderState>().ok()
    }

    fn store(self, node: &HostNode, context: ContextId) {
        node.set_render_slot(context, Arc::new(self));
    }
}

/// Reconcile `vnode` against `host` and return the node that now represents
/// it. That is `host` when it could be reused, otherwise a new node the
/// caller has to put in place of `host`.
///
/// `hydrate` adopts the existing children of a node on its first
/// reconciliation instead of appending after them. `svg` creates new tags
/// in the SVG namespace.
pub fn reconcile(
    document: &Document,
    vnode: &VirtualNode,
    host: Option<&HostNode>,
    context: ContextId,
    hydrate: bool,
    svg: bool,
) -> HostNode {
    render_node(document, vnode, host, context, hydrate, svg)
}

/// How many times `node` has been reconciled by the renderer owning
/// `context`.
pub fn generation(node: &HostNode, context: ContextId) -> u64 {
    RenderState::load(node, context).map_or(0, |state| state.generation)
}

fn can_reuse(vnode: &VirtualNode, node: &HostNode) -> bool {
    match vnode.node_type() {
        NodeType::Tag(tag) if tag == "host" => {
            matches!(node.kind(), NodeKind::Element | NodeKind::ShadowRoot)
        }
        NodeType::Tag(tag) => node.local_name().as_deref() == Some(tag.as_str()),
        NodeType::Node(literal) => literal == node,
        NodeType::Class(class) => class.is_instance(node),
    }
}

fn create(document: &Document, vnode: &VirtualNode, svg: bool) -> HostNode {
    match vnode.node_type() {
        NodeType::Tag(tag) if svg => document.create_element_ns(SVG_NAMESPACE, tag),
        NodeType::Tag(tag) => document.create_element_is(tag, vnode.is()),
        NodeType::Node(literal) => literal.clone(),
        NodeType::Class(class) => class.construct(document),
    }
}

pub(crate) fn render_node(
    document: &Document,
    vnode: &VirtualNode,
    host: Option<&HostNode>,
    context: ContextId,
    hydrate: bool,
    svg: bool,
) -> HostNode {
    if let Some(node) = host {
        let unchanged = RenderState::load(node, context)
            .is_some_and(|state| state.build == vnode.build_id());
        if unchanged {
            tracing::trace!(node = %node.id(), "virtual node unchanged, skipping subtree");
            return node.clone();
        }
    }

    let svg = svg || vnode.tag() == Some("svg");

    let node = match host.filter(|node| can_reuse(vnode, node)) {
        Some(node) => node.clone(),
        None => match vnode.instance() {
            Some(instance) => {
                let copy = instance.clone_node(true);
                tracing::trace!(instance = %instance.id(), copy = %copy.id(), "cloning cached instance");
                // The copy carries no render state, so its first pass adopts
                // the cloned children in place of the markers it copied.
                strip_markers(&copy);
                return update_node(document, vnode, copy, context, true, svg);
            }
            None => {
                let node = create(document, vnode, svg);
                tracing::trace!(node = %node.id(), kind = ?vnode.kind(), "created node");
                vnode.remember_instance(&node);
                node
            }
        },
    };

    update_node(document, vnode, node, context, hydrate, svg)
}

fn strip_markers(node: &HostNode) {
    for child in node.children() {
        if child.is_marker() {
            if let Err(err) = node.remove_child(&child) {
                tracing::error!(node = %node.id(), %err, "failed to drop cloned marker");
            }
        } else {
            strip_markers(&child);
        }
    }
}

/// Diff props and children of a node already chosen for `vnode`.
fn update_node(
    document: &Document,
    vnode: &VirtualNode,
    node: HostNode,
    context: ContextId,
    hydrate: bool,
    svg: bool,
) -> HostNode {
    let state = RenderState::load(&node, context);
    let generation = state.as_ref().map_or(0, |state| state.generation);
    if vnode.once() && generation > 0 {
        tracing::trace!(node = %node.id(), "render-once node already rendered");
        return node;
    }

    let (old_props, old_children, handlers, mut fragment) = match state {
        Some(state) => (
            state.props.clone(),
            state.children.clone(),
            state.handlers.clone(),
            state.fragment.clone(),
        ),
        None => (empty_props(), empty_children(), Handlers::default(), None),
    };

    if vnode.shadow() && node.shadow_root().is_none() {
        if let Err(err) = node.attach_shadow() {
            tracing::error!(node = %node.id(), %err, "failed to attach shadow root");
        }
    }

    if !Arc::ptr_eq(&old_props, vnode.props()) {
        diff_props(&node, &old_props, vnode.props(), &handlers, svg);
    }

    if !Arc::ptr_eq(&old_children, vnode.children()) {
        let parent = match vnode.shadow().then(|| node.shadow_root()).flatten() {
            Some(root) => root,
            None => node.clone(),
        };
        let child_svg = svg && vnode.tag() != Some("foreignObject");
        fragment = Some(reconcile_children(
            document,
            vnode.children(),
            fragment,
            &parent,
            context,
            hydrate && generation == 0,
            child_svg,
        ));
    }

    RenderState {
        build: vnode.build_id(),
        props: vnode.props().clone(),
        children: vnode.children().clone(),
        handlers,
        fragment,
        generation: generation + 1,
    }
    .store(&node, context);

    node
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementClass;
    use crate::vdom::{h, Child, PropMap};

    fn render(doc: &Document, vnode: &VirtualNode, host: Option<&HostNode>) -> HostNode {
        reconcile(doc, vnode, host, ContextId::ROOT, false, false)
    }

    #[test]
    fn test_same_vnode_is_skipped() {
        let doc = Document::new();
        let vnode = VirtualNode::builder("div").prop("id", "a").child("x").build();
        let node = render(&doc, &vnode, None);
        let before = doc.stats();

        let again = render(&doc, &vnode, Some(&node));
        assert_eq!(again, node);
        assert_eq!(doc.stats().since(&before).total(), 0);
        assert_eq!(generation(&node, ContextId::ROOT), 1);
    }

    #[test]
    fn test_tag_mismatch_creates_new_node() {
        let doc = Document::new();
        let div = render(&doc, &h("div", PropMap::new(), vec![]), None);
        let span = render(&doc, &h("span", PropMap::new(), vec![]), Some(&div));

        assert_ne!(span, div);
        assert_eq!(span.local_name().as_deref(), Some("span"));
    }

    #[test]
    fn test_host_tag_reuses_any_element() {
        let doc = Document::new();
        let container = doc.create_element("section");
        let vnode = h("host", PropMap::new(), vec![Child::from("inside")]);

        let result = render(&doc, &vnode, Some(&container));
        assert_eq!(result, container);
        assert_eq!(container.text_content(), "inside");

        let detached = render(&doc, &h("host", PropMap::new(), vec![]), None);
        assert_eq!(detached.local_name().as_deref(), Some("host"));
    }

    #[test]
    fn test_class_nodes_reuse_instances() {
        let doc = Document::new();
        let class = ElementClass::new("x-card").build();
        let first = render(&doc, &h(class.clone(), PropMap::new(), vec![]), None);
        let second = render(&doc, &h(class.clone(), PropMap::new(), vec![]), Some(&first));

        assert_eq!(first, second);
        assert!(class.is_instance(&first));
    }

    #[test]
    fn test_cached_instance_is_cloned() {
        let doc = Document::new();
        let vnode = VirtualNode::builder("b").child("bold").build();
        let first = render(&doc, &vnode, None);
        let elsewhere = doc.create_element("i");

        let copy = render(&doc, &vnode, Some(&elsewhere));
        assert_ne!(copy, first);
        assert_eq!(copy.outer_html(), "<b>bold</b>");
    }

    #[test]
    fn test_svg_namespace_and_foreign_object() {
        let doc = Document::new();
        let vnode = VirtualNode::builder("svg")
            .child(VirtualNode::builder("circle").build())
            .child(
                VirtualNode::builder("foreignObject")
                    .child(VirtualNode::builder("div").build())
                    .build(),
            )
            .build();

        let svg = render(&doc, &vnode, None);
        let elements: Vec<HostNode> = svg.children().into_iter().filter(HostNode::is_element).collect();
        assert_eq!(svg.namespace().as_deref(), Some(SVG_NAMESPACE));
        assert_eq!(elements[0].namespace().as_deref(), Some(SVG_NAMESPACE));
        assert_eq!(elements[1].namespace().as_deref(), Some(SVG_NAMESPACE));

        let div = elements[1]
            .children()
            .into_iter()
            .find(HostNode::is_element)
            .unwrap();
        assert_eq!(div.namespace().as_deref(), Some(crate::dom::HTML_NAMESPACE));
    }
}
