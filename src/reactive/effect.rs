//! Effects: eagerly-run, re-run-on-change leaf subscribers.
//!
//! An effect runs once at creation to seed its subscriptions, then re-runs
//! whenever a tracked source changes. Each re-run clears the old source
//! edges before re-tracking, so switching a conditional branch inside the
//! body correctly drops stale dependencies.

use std::collections::HashSet;

use super::runtime::{EffectSlot, SubscriberId, SubscriberKind, SubscriberSlot, RUNTIME};
use super::scheduler::run_effect;
use super::scope::register_disposer;

/// Handle to an effect. `Copy`; disposal through it is idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle(pub(crate) SubscriberId);

impl EffectHandle {
    /// Stop future re-runs and detach from every source. Idempotent.
    pub fn dispose(self) {
        dispose_effect(self);
    }
}

/// Create a side effect that auto-tracks signal and computed reads.
///
/// The closure runs immediately once. If a disposal scope is active, the
/// effect's disposer is registered with it automatically.
pub fn create_effect(f: impl FnMut() + 'static) -> EffectHandle {
    let id = RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let id = SubscriberId(rt.subscribers.len());
        rt.subscribers.push(SubscriberSlot {
            kind: SubscriberKind::Effect(EffectSlot {
                callback: Some(Box::new(f)),
                active: true,
            }),
            sources: HashSet::new(),
        });
        id
    });
    run_effect(id);
    let handle = EffectHandle(id);
    register_disposer(handle);
    handle
}

/// Deactivate an effect and drop all of its edges. Idempotent.
pub fn dispose_effect(handle: EffectHandle) {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        let id = handle.0;
        if id.0 >= rt.subscribers.len() {
            return;
        }
        rt.clear_sources(id);
        if let SubscriberKind::Effect(slot) = &mut rt.subscribers[id.0].kind {
            slot.active = false;
            slot.callback = None;
        }
    });
}
