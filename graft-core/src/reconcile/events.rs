//! Delegated Event Handlers
//!
//! Each rendered node gets at most one low-level listener, shared by every
//! event name it handles. The listener looks up the current handler for
//! the event in a table owned by the node's render state, so swapping a
//! handler between renders is a table write, not a listener round trip.

use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::dom::{Event, EventListener, HostNode, ListenerOptions};
use crate::vdom::Callback;

struct HandlerEntry {
    callback: Callback,
    /// Options the low-level listener was registered with.
    options: ListenerOptions,
}

type HandlerTable = Arc<RwLock<IndexMap<String, HandlerEntry>>>;

#[derive(Default)]
struct HandlersInner {
    table: HandlerTable,
    delegate: OnceLock<EventListener>,
}

/// The handler table of one rendered node.
#[derive(Clone, Default)]
pub(crate) struct Handlers {
    inner: Arc<HandlersInner>,
}

impl Handlers {
    fn delegate(&self) -> &EventListener {
        self.inner.delegate.get_or_init(|| {
            let table = self.inner.table.clone();
            EventListener::new(move |event: &Event| {
                let callback = table
                    .read()
                    .get(event.event_type())
                    .map(|entry| entry.callback.clone());
                if let Some(callback) = callback {
                    callback.call(event);
                }
            })
        })
    }

    /// Install, replace or (with `None`) remove the handler for `event`.
    pub(crate) fn set(&self, node: &HostNode, event: &str, callback: Option<&Callback>) {
        match callback {
            Some(callback) => {
                let options = {
                    let mut table = self.inner.table.write();
                    if let Some(entry) = table.get_mut(event) {
                        entry.callback = callback.clone();
                        return;
                    }
                    let options = callback.options();
                    table.insert(
                        event.to_owned(),
                        HandlerEntry {
                            callback: callback.clone(),
                            options,
                        },
                    );
                    options
                };
                tracing::trace!(node = %node.id(), event, "registering delegated listener");
                node.add_event_listener(event, self.delegate(), options);
            }
            None => {
                let removed = self.inner.table.write().shift_remove(event);
                if let Some(entry) = removed {
                    tracing::trace!(node = %node.id(), event, "removing delegated listener");
                    node.remove_event_listener(event, self.delegate(), entry.options.capture);
                }
            }
        }
    }

    /// Number of event names with a handler.
    pub(crate) fn len(&self) -> usize {
        self.inner.table.read().len()
    }

    pub(crate) fn contains(&self, event: &str) -> bool {
        self.inner.table.read().contains_key(event)
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.inner.table.read().keys())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = count.clone();
        let callback = Callback::new(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_replacing_a_handler_keeps_one_listener() {
        let doc = Document::new();
        let node = doc.create_element("button");
        let handlers = Handlers::default();
        let (first_count, first) = counter();
        let (second_count, second) = counter();

        handlers.set(&node, "click", Some(&first));
        handlers.set(&node, "click", Some(&second));
        assert_eq!(node.listener_count("click"), 1);

        node.dispatch_event(Event::new("click"));
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);

        handlers.set(&node, "click", None);
        assert_eq!(node.listener_count("click"), 0);
        assert!(!handlers.contains("click"));
    }

    #[test]
    fn test_one_delegate_serves_many_events() {
        let doc = Document::new();
        let node = doc.create_element("input");
        let handlers = Handlers::default();
        let (count, callback) = counter();

        handlers.set(&node, "input", Some(&callback));
        handlers.set(&node, "change", Some(&callback));
        assert_eq!(handlers.len(), 2);

        node.dispatch_event(Event::new("input"));
        node.dispatch_event(Event::new("change"));
        node.dispatch_event(Event::new("focus"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_capture_option_is_snapshotted() {
        let doc = Document::new();
        let node = doc.create_element("div");
        let handlers = Handlers::default();
        let (_, capturing) = counter();
        let (_, bubbling) = counter();

        handlers.set(&node, "focus", Some(&capturing.capture()));
        handlers.set(&node, "focus", Some(&bubbling));
        handlers.set(&node, "focus", None);

        assert_eq!(node.listener_count("focus"), 0);
    }
}
