//! Batching and ordered flush of pending notifications.
//!
//! Computed subscribers are always notified synchronously so that dirtiness
//! propagates before anything else runs in the same tick. Effect subscribers
//! are queued (deduplicated by id) while a batch is open and flushed when the
//! outermost batch ends. Every signal write wraps its own notification in a
//! batch, so even an ungrouped write settles all reachable computeds before
//! any effect observes them.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::runtime::{ComputedState, SubscriberId, SubscriberKind, TrackingRestore, RUNTIME};

/// Group multiple signal writes so that effects run only once.
///
/// Batches nest; only the outermost one flushes. The flush loops until the
/// queue is empty — an effect's own writes may enqueue further effects — so
/// acyclic graphs stabilize before `batch` returns.
///
/// ```ignore
/// batch(|| {
///     set_a.set(1);
///     set_b.set(2);
/// });
/// // Effects that depend on a and/or b have run exactly once here.
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    struct DepthGuard;
    impl Drop for DepthGuard {
        fn drop(&mut self) {
            RUNTIME.with(|rt| rt.borrow_mut().batch_depth -= 1);
        }
    }

    RUNTIME.with(|rt| rt.borrow_mut().batch_depth += 1);
    let result = {
        let _guard = DepthGuard;
        f()
    };
    let should_flush = RUNTIME.with(|rt| {
        let rt = rt.borrow();
        rt.batch_depth == 0 && !rt.pending.is_empty()
    });
    if should_flush {
        flush();
    }
    result
}

/// Run `f` with the tracking context cleared: signal and computed reads
/// inside do not subscribe the currently-running subscriber.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let prev = RUNTIME.with(|rt| rt.borrow_mut().tracking.take());
    let _restore = TrackingRestore(prev);
    f()
}

/// Notify a set of direct subscribers of a changed source. Wraps itself in a
/// batch so the flush runs after the whole set has been walked.
pub(crate) fn notify_subscribers(subs: Vec<SubscriberId>) {
    if subs.is_empty() {
        return;
    }
    batch(|| {
        for id in subs {
            notify_one(id);
        }
    });
}

enum Action {
    Nothing,
    /// Computed went Clean -> Dirty; forward to its own subscribers.
    Forward(Vec<SubscriberId>),
    Queue,
    Run,
}

fn notify_one(id: SubscriberId) {
    let action = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let deferred = rt.batch_depth > 0 || rt.flushing;
        match &mut rt.subscribers[id.0].kind {
            SubscriberKind::Computed(slot) => {
                if slot.state == ComputedState::Dirty {
                    // Diamond dedup: a computed reachable via multiple paths
                    // is marked dirty once.
                    Action::Nothing
                } else {
                    slot.state = ComputedState::Dirty;
                    Action::Forward(slot.subscribers.iter().copied().collect())
                }
            }
            SubscriberKind::Effect(slot) => {
                if !slot.active {
                    Action::Nothing
                } else if deferred {
                    Action::Queue
                } else {
                    Action::Run
                }
            }
        }
    });

    match action {
        Action::Nothing => {}
        Action::Forward(subs) => {
            for sub in subs {
                notify_one(sub);
            }
        }
        Action::Queue => {
            RUNTIME.with(|rt| {
                let mut rt = rt.borrow_mut();
                if rt.pending_set.insert(id) {
                    rt.pending.push(id);
                }
            });
        }
        Action::Run => run_effect(id),
    }
}

/// Run a single effect: clear old source edges, set the tracking context,
/// execute the callback, restore.
pub(crate) fn run_effect(id: SubscriberId) {
    let maybe_cb = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        match &rt.subscribers[id.0].kind {
            SubscriberKind::Effect(slot) if slot.active => {}
            _ => return None,
        }
        rt.clear_sources(id);
        let SubscriberKind::Effect(slot) = &mut rt.subscribers[id.0].kind else {
            unreachable!("checked above");
        };
        slot.callback.take()
    });
    let Some(mut cb) = maybe_cb else { return };

    let prev = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        std::mem::replace(&mut rt.tracking, Some(id))
    });
    {
        let _restore = TrackingRestore(prev);
        cb();
    }

    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        if let SubscriberKind::Effect(slot) = &mut rt.subscribers[id.0].kind {
            if slot.active {
                slot.callback = Some(cb);
            }
        }
    });
}

/// Drain the pending-effect queue until it is empty.
///
/// Each effect runs through an unwind boundary: a failing effect is reported
/// and the flush continues with the remaining queue (per-effect isolation).
/// A panicked effect loses its callback and never re-runs.
pub(crate) fn flush() {
    let proceed = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        if rt.flushing || rt.batch_depth > 0 {
            false
        } else {
            rt.flushing = true;
            true
        }
    });
    if !proceed {
        return;
    }

    loop {
        let next = RUNTIME.with(|rt| {
            let mut rt = rt.borrow_mut();
            if rt.pending.is_empty() {
                None
            } else {
                let id = rt.pending.remove(0);
                rt.pending_set.remove(&id);
                Some(id)
            }
        });
        let Some(id) = next else { break };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| run_effect(id))) {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                effect = id.0,
                %message,
                "effect failed during flush; continuing with remaining queue"
            );
        }
    }

    RUNTIME.with(|rt| rt.borrow_mut().flushing = false);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
