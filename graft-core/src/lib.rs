//! Graft Core
//!
//! An incremental renderer for DOM-shaped trees. Callers describe the tree
//! they want as [`VirtualNode`]s; the reconciler mutates an existing host
//! tree in place until it matches, keeping node identity wherever it can.
//!
//! The crate implements:
//!
//! - An in-memory host tree with DOM semantics (`dom`)
//! - Virtual node construction (`vdom`)
//! - The reconciler: node reuse, keyed children, prop diffing and
//!   delegated events (`reconcile`)
//! - Slot-based hook state with two-tier effect cleanup (`hooks`)
//!
//! # Example
//!
//! ```rust
//! use graft_core::{Document, Renderer, VirtualNode};
//!
//! let document = Document::new();
//! let renderer = Renderer::new(document.clone());
//!
//! let view = |items: &[&str]| {
//!     VirtualNode::builder("ul")
//!         .children(items.iter().map(|item| {
//!             VirtualNode::builder("li").key(*item).child(*item).build()
//!         }))
//!         .build()
//! };
//!
//! let list = renderer.render(&view(&["a", "b", "c"]), None);
//! let first = list.children()[1].clone();
//!
//! renderer.render(&view(&["c", "b", "a"]), Some(&list));
//! assert_eq!(list.text_content(), "cba");
//! assert_eq!(list.children()[3], first);
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod hooks;
pub mod reconcile;
pub mod renderer;
pub mod vdom;

pub use config::RendererConfig;
pub use dom::{ContextId, Document, HostNode};
pub use error::{DomError, DomResult};
pub use hooks::{HookStore, Hooks};
pub use reconcile::reconcile;
pub use renderer::Renderer;
pub use vdom::{h, Child, Key, NodeRef, PropValue, VirtualNode};
