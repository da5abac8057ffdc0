//! Host Tree Errors
//!
//! Structural operations on the host tree can fail the same way DOM
//! operations do: a node cannot become its own ancestor, a reference node
//! must actually be a child of the parent it is used with, and so on.
//!
//! The reconciler never surfaces these as panics. It logs them and keeps
//! going, so a host tree that was tampered with between renders degrades to
//! a partially updated tree instead of taking the renderer down.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised by [`HostNode`](crate::dom::HostNode) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The child cannot be placed under the parent: it is an ancestor of the
    /// parent (or the parent itself), it is a shadow root, or the parent is
    /// a leaf node.
    #[error("cannot insert node {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// A node passed as a reference or removal target is not a child of the
    /// parent it was used with.
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Element-only operation attempted on a text, marker or shadow root node.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// `attach_shadow` called on a node that already has a shadow root.
    #[error("node {0} already hosts a shadow root")]
    ShadowRootExists(NodeId),
}

/// Result alias for host tree operations.
pub type DomResult<T> = Result<T, DomError>;
