//! Reconciliation Engine
//!
//! Turns a [`VirtualNode`](crate::vdom::VirtualNode) description into
//! mutations of the host tree.
//!
//! # Layers
//!
//! - `render`: one virtual node against one host node. Decides between
//!   reuse and creation and keeps the per-node render state.
//! - `children`: an ordered, possibly keyed child list against the
//!   marker-delimited region a node owns.
//! - `props` and `events`: prop maps against attributes, properties,
//!   style and delegated listeners of a single node.
//!
//! Host tree errors never escape from here. They are logged through
//! `tracing` and the pass carries on with the rest of the tree.

mod children;
mod events;
mod props;
mod render;

pub use render::{generation, reconcile};
