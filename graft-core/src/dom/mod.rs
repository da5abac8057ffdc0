//! Host Tree
//!
//! An in-memory, DOM-shaped tree that the reconciler mutates. It plays the
//! role a browser document plays for a web renderer: the reconciler does not
//! own it, other code may mutate it between renders, and the reconciler only
//! relies on the operations exposed here.
//!
//! # Structure
//!
//! - [`Document`]: creates nodes, holds the element class registry and
//!   counts every mutation in [`MutationStats`].
//! - [`HostNode`]: a shared handle to one node. Equality is identity.
//! - [`ElementClass`]: a constructor-like identity with its own property
//!   names and an instance-of relation.
//! - [`Event`] / [`EventListener`]: capture, target and bubble dispatch.
//!
//! # Locking
//!
//! Node data sits behind a `parking_lot::RwLock`. Every method takes the lock
//! for the duration of one primitive operation and releases it before
//! touching another node or calling user code, so listeners and hooks can
//! mutate the tree from inside callbacks.

mod class;
mod document;
mod event;
mod native;
mod node;
mod style;

pub use class::{ClassId, ElementClass};
pub use document::{Document, MutationStats};
pub use event::{Event, EventListener, EventPhase, ListenerOptions};
pub use node::{
    ContextId, HostNode, NodeId, NodeKind, WeakHostNode, HTML_NAMESPACE, SVG_NAMESPACE,
};
pub use style::CssStyle;
