//! Renderer
//!
//! [`Renderer`] bundles what every render needs: the document new nodes are
//! created in, the [`ContextId`] the renderer's bookkeeping is stored under,
//! and its [`RendererConfig`].

use crate::config::RendererConfig;
use crate::dom::{ContextId, Document, HostNode};
use crate::reconcile::reconcile;
use crate::vdom::{h, Child, PropMap, VirtualNode};

/// Renders virtual nodes into a document.
#[derive(Debug, Clone)]
pub struct Renderer {
    document: Document,
    context: ContextId,
    config: RendererConfig,
}

impl Renderer {
    /// A renderer with a fresh context and the default configuration.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            context: ContextId::new(),
            config: RendererConfig::default(),
        }
    }

    /// Share bookkeeping with other renderers using `context`.
    pub fn with_context(mut self, context: ContextId) -> Self {
        self.context = context;
        self
    }

    pub fn with_config(mut self, config: RendererConfig) -> Self {
        self.config = config;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Reconcile `vnode` against `host`, returning the node that represents
    /// it afterwards.
    pub fn render(&self, vnode: &VirtualNode, host: Option<&HostNode>) -> HostNode {
        let _span = tracing::debug_span!("render", context = %self.context).entered();
        reconcile(
            &self.document,
            vnode,
            host,
            self.context,
            self.config.hydrate,
            self.config.svg,
        )
    }

    /// Render an arbitrary child value. Anything but a virtual node leaves
    /// `host` untouched.
    pub fn render_child(&self, child: &Child, host: &HostNode) -> HostNode {
        match child {
            Child::Node(vnode) => self.render(vnode, Some(host)),
            other => {
                tracing::debug!(host = %host.id(), child = ?other, "ignoring non-node render root");
                host.clone()
            }
        }
    }

    /// Render `children` as the content of `container`, leaving the
    /// container's other children alone.
    pub fn render_into(&self, children: Vec<Child>, container: &HostNode) -> HostNode {
        self.render(&h("host", PropMap::new(), children), Some(container))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_into_container() {
        let doc = Document::new();
        let container = doc.create_element("main");
        let renderer = Renderer::new(doc.clone());

        let result = renderer.render_into(vec![Child::from("hello")], &container);
        assert_eq!(result, container);
        assert_eq!(container.inner_html(), "hello");

        renderer.render_into(vec![Child::from("bye")], &container);
        assert_eq!(container.inner_html(), "bye");
    }

    #[test]
    fn test_render_child_ignores_non_nodes() {
        let doc = Document::new();
        let host = doc.create_element("div");
        let renderer = Renderer::new(doc.clone());
        let before = doc.stats();

        let result = renderer.render_child(&Child::Opaque(serde_json::json!({"x": 1})), &host);
        assert_eq!(result, host);
        assert_eq!(doc.stats().since(&before).total(), 0);
    }

    #[test]
    fn test_svg_config_applies_to_root() {
        let doc = Document::new();
        let renderer = Renderer::new(doc).with_config(RendererConfig::default().with_svg(true));

        let node = renderer.render(&VirtualNode::builder("g").build(), None);
        assert_eq!(node.namespace().as_deref(), Some(crate::dom::SVG_NAMESPACE));
    }
}
