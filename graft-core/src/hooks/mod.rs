//! Hooks
//!
//! Slot-based component state. A component owns one [`HookStore`]; every
//! render runs inside [`HookStore::load`], which hands the render an explicit
//! [`Hooks`] context. Hooks claim slots in call order, so a component must
//! call the same hooks in the same order on every render.
//!
//! After the host tree has been updated the component calls
//! [`HookStore::clean_effects`]: layout effects run right away, the returned
//! closure runs the remaining effects whenever the caller decides.

mod builtin;
mod store;

pub use builtin::{Cleanup, HookRef, StateSetter};
pub use store::{CleanEffect, HookStore, Hooks, RenderTrigger};
