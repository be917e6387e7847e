//! Signal<T>: the reactive memory cell.
//!
//! A signal stores a value and a subscriber set. Reads inside a running
//! effect or computed install a bidirectional edge; writes notify through
//! the scheduler. A write that compares equal to the stored value never
//! notifies; [`Signal::notify`] bypasses that check for containers mutated
//! in place through other means.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use super::runtime::{SignalId, SignalSlot, RUNTIME};
use super::scheduler::notify_subscribers;

/// Create a reactive signal with the given initial value.
///
/// Returns a `Copy` handle; reading inside an effect or computed
/// automatically subscribes that subscriber to changes.
pub fn create_signal<T: 'static>(initial: T) -> Signal<T> {
    let id = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let id = SignalId(rt.signals.len());
        rt.signals.push(SignalSlot {
            value: Box::new(initial),
            subscribers: HashSet::new(),
        });
        id
    });
    Signal {
        id,
        _marker: PhantomData,
    }
}

/// Handle to a signal slot. `Copy` — only stores an id.
pub struct Signal<T: 'static> {
    id: SignalId,
    _marker: PhantomData<T>,
}

// Manual impls so we don't require T: Copy/Clone for the handle itself.
impl<T: 'static> Copy for Signal<T> {}
impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("id", &self.id.0).finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Read the current value, subscribing the running subscriber (if any).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(|v| v.clone())
    }

    /// Read by reference without cloning. Still subscribes.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        RUNTIME.with(|rt| {
            rt.borrow_mut().track_signal(self.id);
            let rt = rt.borrow();
            let value = &rt.signals[self.id.0].value;
            f(value.downcast_ref::<T>().expect("signal type mismatch"))
        })
    }

    /// Read without creating an edge.
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.with_untracked(|v| v.clone())
    }

    /// Read by reference without creating an edge.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        RUNTIME.with(|rt| {
            let rt = rt.borrow();
            let value = &rt.signals[self.id.0].value;
            f(value.downcast_ref::<T>().expect("signal type mismatch"))
        })
    }

    /// Overwrite the value and notify subscribers.
    ///
    /// A write equal to the stored value is a no-op: zero notifications.
    pub fn set(&self, value: T)
    where
        T: PartialEq,
    {
        let subs = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            let slot = &mut rt.signals[self.id.0];
            let current = slot
                .value
                .downcast_mut::<T>()
                .expect("signal type mismatch");
            if *current == value {
                return None;
            }
            *current = value;
            Some(slot.subscribers.iter().copied().collect::<Vec<_>>())
        });
        if let Some(subs) = subs {
            notify_subscribers(subs);
        }
    }

    /// Mutate the value in place and notify subscribers. Always notifies.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let subs = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            let slot = &mut rt.signals[self.id.0];
            let value = slot
                .value
                .downcast_mut::<T>()
                .expect("signal type mismatch");
            f(value);
            slot.subscribers.iter().copied().collect::<Vec<_>>()
        });
        notify_subscribers(subs);
    }

    /// Force subscriber notification without changing the stored value.
    ///
    /// For containers mutated outside the signal's knowledge.
    pub fn notify(&self) {
        let subs = RUNTIME.with(|rt| {
            let rt = rt.borrow();
            rt.signals[self.id.0]
                .subscribers
                .iter()
                .copied()
                .collect::<Vec<_>>()
        });
        notify_subscribers(subs);
    }
}
