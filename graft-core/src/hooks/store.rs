//! Hook Slot Store
//!
//! A [`HookStore`] holds the state of one component's hooks. Hooks are
//! identified by call order: the n-th `use_hook` call of a render always
//! gets the n-th slot.
//!
//! # Cleanup tiers
//!
//! Every slot may carry two cleanup callbacks, replaced on each render:
//! a layout callback, run synchronously by
//! [`clean_effects`](HookStore::clean_effects), and an effect callback, run
//! when the caller invokes the closure `clean_effects` returns. Each callback
//! receives the slot's state and returns its new state.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dom::HostNode;

/// Requests a new render of the component owning a store.
pub type RenderTrigger = Arc<dyn Fn() + Send + Sync>;

/// A cleanup callback. Receives the slot state and whether the component is
/// being unmounted, returns the new slot state.
pub type CleanEffect<S> = Arc<dyn Fn(S, bool) -> S + Send + Sync>;

type AnyState = Box<dyn Any + Send>;
type ErasedClean = Arc<dyn Fn(AnyState, bool) -> AnyState + Send + Sync>;

#[derive(Default)]
struct HookSlot {
    state: Option<AnyState>,
    layout: Option<ErasedClean>,
    effect: Option<ErasedClean>,
}

type Slots = Arc<Mutex<Vec<HookSlot>>>;

#[derive(Debug, Clone, Copy)]
enum Tier {
    Layout,
    Effect,
}

fn erase<S: Send + 'static>(clean: CleanEffect<S>) -> ErasedClean {
    Arc::new(move |state: AnyState, unmounted: bool| -> AnyState {
        match state.downcast::<S>() {
            Ok(state) => Box::new(clean(*state, unmounted)),
            // A slot reused by a hook of another type keeps its state.
            Err(state) => state,
        }
    })
}

fn run_tier(slots: &Slots, tier: Tier, unmounted: bool) {
    let len = slots.lock().len();
    for index in 0..len {
        let taken = {
            let mut slots = slots.lock();
            let Some(slot) = slots.get_mut(index) else {
                break;
            };
            let clean = match tier {
                Tier::Layout => slot.layout.clone(),
                Tier::Effect => slot.effect.clone(),
            };
            clean.and_then(|clean| slot.state.take().map(|state| (clean, state)))
        };
        let Some((clean, state)) = taken else {
            continue;
        };
        let state = clean(state, unmounted);
        if let Some(slot) = slots.lock().get_mut(index) {
            slot.state = Some(state);
        }
    }
}

/// Hook state of one component instance.
#[derive(Clone)]
pub struct HookStore {
    slots: Slots,
    trigger: RenderTrigger,
    host: Option<HostNode>,
}

impl HookStore {
    /// Create a store whose hooks call `trigger` to request a render.
    pub fn new<F>(trigger: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            slots: Arc::default(),
            trigger: Arc::new(trigger),
            host: None,
        }
    }

    /// Expose `host` to hooks through [`Hooks::host`].
    pub fn with_host(mut self, host: HostNode) -> Self {
        self.host = Some(host);
        self
    }

    /// Run one render pass. Hooks called through the [`Hooks`] context claim
    /// slots in call order.
    pub fn load<R>(&self, render: impl FnOnce(&mut Hooks<'_>) -> R) -> R {
        let mut hooks = Hooks {
            store: self,
            cursor: 0,
        };
        render(&mut hooks)
    }

    /// Run the layout tier now and return the effect tier.
    ///
    /// With `unmounted`, callbacks are told the component is going away and
    /// every slot is discarded once the effect tier has run.
    pub fn clean_effects(&self, unmounted: bool) -> impl FnOnce() + Send + 'static {
        run_tier(&self.slots, Tier::Layout, unmounted);
        let slots = self.slots.clone();
        move || {
            run_tier(&slots, Tier::Effect, unmounted);
            if unmounted {
                slots.lock().clear();
            }
        }
    }

    /// Number of claimed slots.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HookStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookStore")
            .field("slots", &self.len())
            .field("host", &self.host)
            .finish()
    }
}

/// The context hooks run in during one [`HookStore::load`] pass.
pub struct Hooks<'a> {
    store: &'a HookStore,
    cursor: usize,
}

impl<'a> Hooks<'a> {
    /// Claim the next slot.
    ///
    /// `render` receives the state the slot held after the previous pass
    /// (or `None` on the first) and returns the new state. The cleanup
    /// callbacks replace the slot's previous ones.
    pub fn use_hook<S, R>(
        &mut self,
        render: R,
        layout: Option<CleanEffect<S>>,
        effect: Option<CleanEffect<S>>,
    ) -> S
    where
        S: Clone + Send + 'static,
        R: FnOnce(Option<S>) -> S,
    {
        let index = self.cursor;
        self.cursor += 1;

        let previous = {
            let mut slots = self.store.slots.lock();
            if slots.len() <= index {
                slots.resize_with(index + 1, HookSlot::default);
            }
            slots[index]
                .state
                .take()
                .and_then(|state| state.downcast::<S>().ok())
                .map(|state| *state)
        };

        let state = render(previous);

        let mut slots = self.store.slots.lock();
        if slots.len() <= index {
            slots.resize_with(index + 1, HookSlot::default);
        }
        let slot = &mut slots[index];
        slot.state = Some(Box::new(state.clone()));
        slot.layout = layout.map(erase);
        slot.effect = effect.map(erase);
        state
    }

    /// Request a new render.
    pub fn update(&self) {
        (self.store.trigger)()
    }

    pub fn trigger(&self) -> RenderTrigger {
        self.store.trigger.clone()
    }

    /// The host node the store was created for.
    pub fn host(&self) -> Option<&HostNode> {
        self.store.host.as_ref()
    }

    /// Index of the next slot to be claimed.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
