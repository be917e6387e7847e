//! Computed<T>: cached, lazily-recomputed derivations.
//!
//! A computed holds a derivation function, a cached value, and a
//! [`ComputedState`]. It is created `Dirty` and recomputes on pull. On a
//! notify from a source it marks itself `Dirty` once and forwards the
//! notification to its own subscribers — a computed reachable via several
//! paths of a diamond is still recomputed exactly once.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use super::runtime::{
    ComputedSlot, ComputedState, SubscriberId, SubscriberKind, SubscriberSlot, TrackingRestore,
    RUNTIME,
};

/// Create a lazy memoized derivation.
///
/// The function runs on first read and again whenever the computed is read
/// while dirty. The cached value is only replaced when the new result
/// differs (`PartialEq`).
pub fn create_computed<T, F>(mut f: F) -> Computed<T>
where
    T: Clone + PartialEq + 'static,
    F: FnMut() -> T + 'static,
{
    let derive: Box<dyn FnMut() -> Box<dyn Any>> = Box::new(move || Box::new(f()) as Box<dyn Any>);
    let id = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let id = SubscriberId(rt.subscribers.len());
        rt.subscribers.push(SubscriberSlot {
            kind: SubscriberKind::Computed(ComputedSlot {
                derive: Some(derive),
                value: None,
                state: ComputedState::Dirty,
                equals: equals_any::<T>,
                subscribers: HashSet::new(),
            }),
            sources: HashSet::new(),
        });
        id
    });
    Computed {
        id,
        _marker: PhantomData,
    }
}

fn equals_any<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Handle to a computed slot. `Copy` — only stores an id.
pub struct Computed<T: 'static> {
    id: SubscriberId,
    _marker: PhantomData<T>,
}

impl<T: 'static> Copy for Computed<T> {}
impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id.0)
            .field("state", &self.state())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Read the current value, recomputing first if dirty. Subscribes the
    /// running subscriber (if any).
    pub fn get(&self) -> T {
        self.with(|v| v.clone())
    }

    /// Read by reference without cloning. Still subscribes and still
    /// recomputes if dirty.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        RUNTIME.with(|rt| rt.borrow_mut().track_computed(self.id));
        ensure_clean(self.id);
        RUNTIME.with(|rt| {
            let rt = rt.borrow();
            let SubscriberKind::Computed(slot) = &rt.subscribers[self.id.0].kind else {
                unreachable!("computed handle points at a computed slot");
            };
            let value = slot.value.as_ref().expect("clean computed has a value");
            f(value.downcast_ref::<T>().expect("computed type mismatch"))
        })
    }
}

impl<T: 'static> Computed<T> {
    /// Current state machine position. Mostly useful in tests and debugging.
    pub fn state(&self) -> ComputedState {
        RUNTIME.with(|rt| {
            let rt = rt.borrow();
            match &rt.subscribers[self.id.0].kind {
                SubscriberKind::Computed(slot) => slot.state,
                SubscriberKind::Effect(_) => unreachable!("computed handle points at an effect"),
            }
        })
    }
}

/// Bring a computed to `Clean`, recomputing if needed.
///
/// # Panics
///
/// Panics when the computed is already `Computing`: the read closes a
/// dependency cycle, which this runtime rejects instead of recursing.
fn ensure_clean(id: SubscriberId) {
    let state = RUNTIME.with(|rt| {
        let rt = rt.borrow();
        match &rt.subscribers[id.0].kind {
            SubscriberKind::Computed(slot) => slot.state,
            SubscriberKind::Effect(_) => unreachable!("computed handle points at an effect"),
        }
    });
    match state {
        ComputedState::Clean => {}
        ComputedState::Computing => {
            panic!("dependency cycle: computed read while computing its own value")
        }
        ComputedState::Dirty => recompute(id),
    }
}

/// Re-run the derivation under tracking. Source edges from the previous run
/// are dropped first, so dependencies not re-read this pass are gone.
fn recompute(id: SubscriberId) {
    let mut derive = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        rt.clear_sources(id);
        let SubscriberKind::Computed(slot) = &mut rt.subscribers[id.0].kind else {
            unreachable!("computed handle points at a computed slot");
        };
        slot.state = ComputedState::Computing;
        slot.derive
            .take()
            .expect("computed derivation present outside recompute")
    });

    let prev = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        std::mem::replace(&mut rt.tracking, Some(id))
    });
    let new_value = {
        let _restore = TrackingRestore(prev);
        derive()
    };

    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let SubscriberKind::Computed(slot) = &mut rt.subscribers[id.0].kind else {
            unreachable!("computed handle points at a computed slot");
        };
        let changed = match &slot.value {
            Some(old) => !(slot.equals)(old.as_ref(), new_value.as_ref()),
            None => true,
        };
        if changed {
            slot.value = Some(new_value);
        }
        slot.state = ComputedState::Clean;
        slot.derive = Some(derive);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect::create_effect;
    use crate::reactive::runtime::reset_runtime;
    use crate::reactive::signal::create_signal;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() {
        reset_runtime();
    }

    #[test]
    fn lazy_until_first_read() {
        setup();
        let calls = Rc::new(Cell::new(0_u32));
        let calls_c = calls.clone();
        let c = create_computed(move || {
            calls_c.set(calls_c.get() + 1);
            42
        });
        assert_eq!(calls.get(), 0);
        assert_eq!(c.state(), ComputedState::Dirty);
        assert_eq!(c.get(), 42);
        assert_eq!(calls.get(), 1);
        assert_eq!(c.state(), ComputedState::Clean);
    }

    #[test]
    fn caches_while_clean() {
        setup();
        let calls = Rc::new(Cell::new(0_u32));
        let calls_c = calls.clone();
        let c = create_computed(move || {
            calls_c.set(calls_c.get() + 1);
            42
        });
        assert_eq!(c.get(), 42);
        assert_eq!(c.get(), 42);
        assert_eq!(c.get(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn recomputes_after_source_change() {
        setup();
        let s = create_signal(3);
        let doubled = create_computed(move || s.get() * 2);
        assert_eq!(doubled.get(), 6);
        s.set(5);
        assert_eq!(doubled.state(), ComputedState::Dirty);
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn chain() {
        setup();
        let s = create_signal(1);
        let doubled = create_computed(move || s.get() * 2);
        let quadrupled = create_computed(move || doubled.get() * 2);
        assert_eq!(quadrupled.get(), 4);
        s.set(3);
        assert_eq!(quadrupled.get(), 12);
    }

    #[test]
    fn conditional_sources_dropped() {
        setup();
        let flag = create_signal(true);
        let a = create_signal(1);
        let b = create_signal(2);
        let calls = Rc::new(Cell::new(0_u32));
        let calls_c = calls.clone();
        let c = create_computed(move || {
            calls_c.set(calls_c.get() + 1);
            if flag.get() {
                a.get()
            } else {
                b.get()
            }
        });
        assert_eq!(c.get(), 1);
        flag.set(false);
        assert_eq!(c.get(), 2);
        assert_eq!(calls.get(), 2);

        // a was not read on the last pass; changing it leaves c clean.
        a.set(99);
        assert_eq!(c.state(), ComputedState::Clean);
        assert_eq!(c.get(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn diamond_recomputes_sink_once() {
        setup();
        let a = create_signal(1);
        let b = create_computed(move || a.get() * 10);
        let c = create_computed(move || a.get() * 100);
        let sink_calls = Rc::new(Cell::new(0_u32));
        let sink_calls_c = sink_calls.clone();
        let d = create_computed(move || {
            sink_calls_c.set(sink_calls_c.get() + 1);
            b.get() + c.get()
        });
        assert_eq!(d.get(), 110);
        assert_eq!(sink_calls.get(), 1);

        a.set(2);
        assert_eq!(d.get(), 220);
        assert_eq!(sink_calls.get(), 2);
    }

    #[test]
    fn diamond_reruns_effect_once() {
        setup();
        let a = create_signal(1);
        let b = create_computed(move || a.get() + 1);
        let c = create_computed(move || a.get() * 2);
        let d = create_computed(move || b.get() + c.get());
        let runs = Rc::new(Cell::new(0_u32));
        let runs_c = runs.clone();
        create_effect(move || {
            let _ = d.get();
            runs_c.set(runs_c.get() + 1);
        });
        assert_eq!(runs.get(), 1);
        a.set(5);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn unchanged_result_keeps_cache() {
        setup();
        let s = create_signal(3);
        let clamped = create_computed(move || s.get().min(10));
        assert_eq!(clamped.get(), 3);
        s.set(5);
        assert_eq!(clamped.get(), 5);
        s.set(15);
        assert_eq!(clamped.get(), 10);
        s.set(20);
        // Result unchanged; the cached box is retained.
        assert_eq!(clamped.get(), 10);
    }

    #[test]
    #[should_panic(expected = "dependency cycle")]
    fn self_referential_computed_rejected() {
        setup();
        let cell: Rc<Cell<Option<Computed<i32>>>> = Rc::new(Cell::new(None));
        let cell_c = cell.clone();
        let c = create_computed(move || match cell_c.get() {
            Some(me) => me.get() + 1,
            None => 0,
        });
        cell.set(Some(c));
        // First read enters Computing, then the derivation reads the
        // computed itself: a true cycle, rejected.
        let _ = c.get();
    }

    #[test]
    fn debug_format() {
        setup();
        let c = create_computed(|| 1);
        let dbg = format!("{c:?}");
        assert!(dbg.contains("Computed"));
        assert!(dbg.contains("Dirty"));
    }
}
