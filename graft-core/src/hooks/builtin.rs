//! Built-in Hooks
//!
//! The usual component hooks, implemented on top of
//! [`Hooks::use_hook`]. Effects run in the cleanup tiers of the store:
//! [`use_layout_effect`](Hooks::use_layout_effect) in the layout tier,
//! [`use_effect`](Hooks::use_effect) in the deferred tier.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::store::{CleanEffect, Hooks, RenderTrigger};
use crate::dom::HostNode;
use crate::vdom::Callback;

/// A mutable cell that survives renders.
pub struct HookRef<T>(Arc<Mutex<T>>);

impl<T> Clone for HookRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> HookRef<T> {
    pub fn set(&self, value: T) {
        *self.0.lock() = value;
    }

    /// Run `f` with access to the value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.lock())
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &HookRef<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> HookRef<T> {
    pub fn get(&self) -> T {
        self.0.lock().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for HookRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HookRef").field(&*self.0.lock()).finish()
    }
}

/// Writes a [`use_state`](Hooks::use_state) value and requests a render.
pub struct StateSetter<T> {
    cell: HookRef<T>,
    trigger: RenderTrigger,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            trigger: self.trigger.clone(),
        }
    }
}

impl<T> StateSetter<T> {
    pub fn set(&self, value: T) {
        self.cell.set(value);
        (self.trigger)();
    }

    /// Derive the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.cell.with(|value| *value = f(value));
        (self.trigger)();
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter").finish_non_exhaustive()
    }
}

/// Cleanup returned by an effect.
pub type Cleanup = Box<dyn FnOnce() + Send>;

type PendingEffect = Box<dyn FnOnce() -> Option<Cleanup> + Send>;

struct EffectCell<D> {
    deps: Option<D>,
    pending: Option<PendingEffect>,
    cleanup: Option<Cleanup>,
}

type EffectState<D> = Arc<Mutex<EffectCell<D>>>;

fn run_effect<D>(cell: EffectState<D>, unmounted: bool) -> EffectState<D> {
    let (pending, cleanup) = {
        let mut inner = cell.lock();
        if unmounted {
            inner.pending = None;
            (None, inner.cleanup.take())
        } else {
            match inner.pending.take() {
                Some(pending) => (Some(pending), inner.cleanup.take()),
                None => (None, None),
            }
        }
    };
    if let Some(cleanup) = cleanup {
        cleanup();
    }
    if let Some(pending) = pending {
        let cleanup = pending();
        cell.lock().cleanup = cleanup;
    }
    cell
}

impl<'a> Hooks<'a> {
    /// A cell initialised once and kept across renders.
    pub fn use_ref<T>(&mut self, init: impl FnOnce() -> T) -> HookRef<T>
    where
        T: Send + 'static,
    {
        self.use_hook(
            |prev: Option<HookRef<T>>| prev.unwrap_or_else(|| HookRef(Arc::new(Mutex::new(init())))),
            None,
            None,
        )
    }

    /// A value and a setter that stores a new value and requests a render.
    pub fn use_state<T>(&mut self, init: impl FnOnce() -> T) -> (T, StateSetter<T>)
    where
        T: Clone + Send + 'static,
    {
        let cell = self.use_ref(init);
        let value = cell.get();
        let setter = StateSetter {
            cell,
            trigger: self.trigger(),
        };
        (value, setter)
    }

    /// Recompute a value only when `deps` changes.
    pub fn use_memo<D, T>(&mut self, deps: D, compute: impl FnOnce() -> T) -> T
    where
        D: PartialEq + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
    {
        let memo = self.use_hook(
            |prev: Option<Arc<(D, T)>>| match prev {
                Some(prev) if prev.0 == deps => prev,
                _ => Arc::new((deps, compute())),
            },
            None,
            None,
        );
        memo.1.clone()
    }

    /// Keep the same callback identity while `deps` is unchanged, so the
    /// property differ sees no change.
    pub fn use_callback<D>(&mut self, deps: D, callback: Callback) -> Callback
    where
        D: PartialEq + Send + Sync + 'static,
    {
        self.use_memo(deps, move || callback)
    }

    /// Run `effect` in the layout tier whenever `deps` changes. The cleanup
    /// it returns runs before the next effect and on unmount.
    pub fn use_layout_effect<D, F>(&mut self, deps: D, effect: F)
    where
        D: PartialEq + Send + 'static,
        F: FnOnce() -> Option<Cleanup> + Send + 'static,
    {
        let clean: CleanEffect<EffectState<D>> = Arc::new(run_effect::<D>);
        self.use_effect_in(deps, effect, Some(clean), None);
    }

    /// Run `effect` in the deferred tier whenever `deps` changes.
    pub fn use_effect<D, F>(&mut self, deps: D, effect: F)
    where
        D: PartialEq + Send + 'static,
        F: FnOnce() -> Option<Cleanup> + Send + 'static,
    {
        let clean: CleanEffect<EffectState<D>> = Arc::new(run_effect::<D>);
        self.use_effect_in(deps, effect, None, Some(clean));
    }

    fn use_effect_in<D, F>(
        &mut self,
        deps: D,
        effect: F,
        layout: Option<CleanEffect<EffectState<D>>>,
        deferred: Option<CleanEffect<EffectState<D>>>,
    ) where
        D: PartialEq + Send + 'static,
        F: FnOnce() -> Option<Cleanup> + Send + 'static,
    {
        self.use_hook(
            move |prev: Option<EffectState<D>>| {
                let cell = prev.unwrap_or_else(|| {
                    Arc::new(Mutex::new(EffectCell {
                        deps: None,
                        pending: None,
                        cleanup: None,
                    }))
                });
                {
                    let mut inner = cell.lock();
                    if inner.deps.as_ref() != Some(&deps) {
                        inner.deps = Some(deps);
                        inner.pending = Some(Box::new(effect));
                    }
                }
                cell
            },
            layout,
            deferred,
        );
    }

    /// The host node of the store.
    pub fn use_host(&mut self) -> Option<HostNode> {
        let host = self.host().cloned();
        self.use_hook(move |_: Option<Option<HostNode>>| host, None, None)
    }

    /// A handle that requests a render when called.
    pub fn use_update(&mut self) -> RenderTrigger {
        let trigger = self.trigger();
        self.use_hook(move |prev: Option<RenderTrigger>| prev.unwrap_or(trigger), None, None)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::super::HookStore;
    use super::*;
    use crate::dom::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_use_state_setter_triggers_update() {
        let renders = Arc::new(AtomicUsize::new(0));
        let sink = renders.clone();
        let store = HookStore::new(move || {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        let (value, setter) = store.load(|hooks| hooks.use_state(|| 1));
        assert_eq!(value, 1);
        setter.set(5);
        assert_eq!(renders.load(Ordering::SeqCst), 1);

        let (value, setter) = store.load(|hooks| hooks.use_state(|| 1));
        assert_eq!(value, 5);
        setter.update(|n| n * 2);
        let (value, _) = store.load(|hooks| hooks.use_state(|| 1));
        assert_eq!(value, 10);
    }

    #[test]
    fn test_use_ref_keeps_identity() {
        let store = HookStore::new(|| {});
        let first = store.load(|hooks| hooks.use_ref(|| 0u8));
        let second = store.load(|hooks| hooks.use_ref(|| 0u8));

        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn test_use_memo_recomputes_on_dep_change() {
        let store = HookStore::new(|| {});
        let computed = Arc::new(AtomicUsize::new(0));
        let memo = |deps: u32| {
            let computed = computed.clone();
            store.load(move |hooks| {
                hooks.use_memo(deps, move || {
                    computed.fetch_add(1, Ordering::SeqCst);
                    deps * 2
                })
            })
        };

        assert_eq!(memo(1), 2);
        assert_eq!(memo(1), 2);
        assert_eq!(memo(3), 6);
        assert_eq!(computed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_use_callback_keeps_identity() {
        let store = HookStore::new(|| {});
        let first = store.load(|hooks| hooks.use_callback((), Callback::new(|_| {})));
        let second = store.load(|hooks| hooks.use_callback((), Callback::new(|_| {})));

        assert_eq!(first, second);
    }

    #[test]
    fn test_effects_run_in_their_tier_with_cleanup() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let store = HookStore::new(|| {});
        let render = |deps: u32| {
            let layout_log = log.clone();
            let effect_log = log.clone();
            store.load(move |hooks| {
                hooks.use_layout_effect(deps, move || {
                    layout_log.lock().push(format!("layout {deps}"));
                    let cleanup_log = layout_log.clone();
                    Some(Box::new(move || cleanup_log.lock().push(format!("undo layout {deps}"))) as Cleanup)
                });
                hooks.use_effect(deps, move || {
                    effect_log.lock().push(format!("effect {deps}"));
                    None
                });
            });
        };

        render(1);
        let deferred = store.clean_effects(false);
        assert_eq!(*log.lock(), vec!["layout 1"]);
        deferred();
        assert_eq!(*log.lock(), vec!["layout 1", "effect 1"]);

        render(1);
        store.clean_effects(false)();
        assert_eq!(log.lock().len(), 2);

        render(2);
        store.clean_effects(false)();
        assert_eq!(
            log.lock()[2..],
            ["undo layout 1", "layout 2", "effect 2"].map(String::from)
        );

        store.clean_effects(true)();
        assert_eq!(log.lock().last().map(String::as_str), Some("undo layout 2"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_use_host() {
        let doc = Document::new();
        let host = doc.create_element("x-app");
        let store = HookStore::new(|| {}).with_host(host.clone());

        assert_eq!(store.load(|hooks| hooks.use_host()), Some(host));
    }
}
