//! Virtual Node Model
//!
//! Immutable descriptions of the tree to render.
//!
//! # Building nodes
//!
//! ```
//! use graft_core::vdom::{h, Child, PropMap, VirtualNode};
//!
//! let list = VirtualNode::builder("ul")
//!     .prop("class", "items")
//!     .children(["a", "b"].map(|key| {
//!         VirtualNode::builder("li").key(key).child(key).build()
//!     }))
//!     .build();
//!
//! let same = h("ul", PropMap::new(), vec![Child::from("text")]);
//! assert!(!list.same(&same));
//! ```

mod node;
mod value;

pub use node::{
    empty_children, empty_props, h, BuildId, Child, Children, Key, NodeType, PropMap, Props,
    VNodeBuilder, VNodeKind, VirtualNode,
};
pub use value::{format_number, Callback, NodeRef, PropValue};
