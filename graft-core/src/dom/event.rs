//! Events
//!
//! Events dispatched through the host tree follow the DOM's three phases:
//! capture listeners on ancestors (outermost first), every listener on the
//! target, then non-capture listeners on ancestors (innermost first) when the
//! event bubbles. Shadow roots forward to their host element.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::node::HostNode;

/// Options snapshotted when a listener is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Deregister after the first invocation.
    pub once: bool,
    /// `prevent_default` is ignored while this listener runs.
    pub passive: bool,
}

/// A registered event listener. Identity is a unique id, so clones of one
/// listener register and deregister as the same listener.
#[derive(Clone)]
pub struct EventListener {
    id: u64,
    func: Arc<dyn Fn(&Event) + Send + Sync>,
}

impl EventListener {
    /// Wrap a function as a listener with a fresh identity.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);
        Self {
            id: LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            func: Arc::new(func),
        }
    }

    /// The listener's identity.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Invoke the listener.
    pub fn call(&self, event: &Event) {
        (self.func)(event)
    }
}

impl PartialEq for EventListener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventListener {}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventListener").field(&self.id).finish()
    }
}

/// Which phase a listener is being invoked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

#[derive(Debug, Default)]
struct EventFlags {
    default_prevented: AtomicBool,
    propagation_stopped: AtomicBool,
    in_passive_listener: AtomicBool,
}

/// An event travelling through the host tree.
///
/// Clones share their cancellation flags, so a listener calling
/// [`prevent_default`](Event::prevent_default) is observed by the dispatcher.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    detail: serde_json::Value,
    target: Option<HostNode>,
    current_target: Option<HostNode>,
    phase: EventPhase,
    flags: Arc<EventFlags>,
}

impl Event {
    /// A non-bubbling, cancelable event with no detail.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: false,
            cancelable: true,
            detail: serde_json::Value::Null,
            target: None,
            current_target: None,
            phase: EventPhase::None,
            flags: Arc::default(),
        }
    }

    /// Set whether the event bubbles.
    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Set whether `prevent_default` has any effect.
    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// Attach a payload, like a `CustomEvent` detail.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn detail(&self) -> &serde_json::Value {
        &self.detail
    }

    pub fn does_bubble(&self) -> bool {
        self.bubbles
    }

    /// The node the event was dispatched on.
    pub fn target(&self) -> Option<&HostNode> {
        self.target.as_ref()
    }

    /// The node whose listener is currently running.
    pub fn current_target(&self) -> Option<&HostNode> {
        self.current_target.as_ref()
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Cancel the default action, unless the event is not cancelable or the
    /// running listener is passive.
    pub fn prevent_default(&self) {
        if self.cancelable && !self.flags.in_passive_listener.load(Ordering::SeqCst) {
            self.flags.default_prevented.store(true, Ordering::SeqCst);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.flags.default_prevented.load(Ordering::SeqCst)
    }

    /// Stop the event from reaching further nodes. Remaining listeners on the
    /// current node still run.
    pub fn stop_propagation(&self) {
        self.flags.propagation_stopped.store(true, Ordering::SeqCst);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.flags.propagation_stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn retarget(&self, target: &HostNode, current: &HostNode, phase: EventPhase) -> Self {
        let mut event = self.clone();
        event.target = Some(target.clone());
        event.current_target = Some(current.clone());
        event.phase = phase;
        event
    }

    pub(crate) fn set_passive(&self, passive: bool) {
        self.flags.in_passive_listener.store(passive, Ordering::SeqCst);
    }
}
