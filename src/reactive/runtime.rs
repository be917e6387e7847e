//! Thread-local reactive runtime: arena slots for signals and subscribers.
//!
//! All reactive state lives in a single [`Runtime`] stored in a thread-local
//! (single-threaded, synchronous, Leptos-style). Public handles
//! ([`Signal`](super::signal::Signal), [`Computed`](super::computed::Computed),
//! [`EffectHandle`](super::effect::EffectHandle)) are `Copy` ids into these
//! arenas, so edge removal is O(1) set removal by handle and no shared
//! mutable references cross the API boundary.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;

use super::scope::Scope;

/// Identifies a signal slot inside the [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalId(pub(crate) usize);

/// Identifies a subscriber slot (an effect or a computed).
///
/// Ids are monotonic: the pending-effect queue deduplicates by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) usize);

/// One endpoint of an upstream dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SourceId {
    Signal(SignalId),
    Computed(SubscriberId),
}

/// State machine for a computed node.
///
/// A computed's cached value is valid only while `Clean`. `Computing` is a
/// reentrancy guard: reading a computed that is currently computing its own
/// value is a dependency cycle and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedState {
    Clean,
    Dirty,
    Computing,
}

pub(crate) struct SignalSlot {
    pub value: Box<dyn Any>,
    pub subscribers: HashSet<SubscriberId>,
}

pub(crate) struct EffectSlot {
    /// Taken out while running so the user callback can re-borrow the
    /// runtime (same discipline for the computed derivation below).
    pub callback: Option<Box<dyn FnMut()>>,
    pub active: bool,
}

pub(crate) struct ComputedSlot {
    pub derive: Option<Box<dyn FnMut() -> Box<dyn Any>>>,
    pub value: Option<Box<dyn Any>>,
    pub state: ComputedState,
    /// Type-erased `PartialEq` over the cached value; skips replacing the
    /// cache (and any spurious downstream notification) when a recompute
    /// produces an equal value.
    pub equals: fn(&dyn Any, &dyn Any) -> bool,
    /// Downstream subscribers of this computed.
    pub subscribers: HashSet<SubscriberId>,
}

pub(crate) enum SubscriberKind {
    Effect(EffectSlot),
    Computed(ComputedSlot),
}

/// An effect or a computed. The kind decides scheduling: computeds are
/// notified synchronously, effects are queued.
pub(crate) struct SubscriberSlot {
    pub kind: SubscriberKind,
    /// Upstream edges. Rebuilt on every re-run: dependencies not re-read on
    /// a pass (untaken branches) are dropped.
    pub sources: HashSet<SourceId>,
}

pub(crate) struct Runtime {
    pub signals: Vec<SignalSlot>,
    pub subscribers: Vec<SubscriberSlot>,
    /// The subscriber currently executing (for auto-tracking).
    pub tracking: Option<SubscriberId>,
    /// When > 0 we are inside a `batch()` call — effects are deferred.
    pub batch_depth: usize,
    /// Effects pending a flush, in notification order.
    pub pending: Vec<SubscriberId>,
    /// Dedup set over `pending`, keyed by subscriber id.
    pub pending_set: HashSet<SubscriberId>,
    /// Guard against starting a second flush from inside the first.
    pub flushing: bool,
    /// Stack of active disposal scopes (innermost last).
    pub scopes: Vec<Scope>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            signals: Vec::new(),
            subscribers: Vec::new(),
            tracking: None,
            batch_depth: 0,
            pending: Vec::new(),
            pending_set: HashSet::new(),
            flushing: false,
            scopes: Vec::new(),
        }
    }

    /// Record an edge from a signal to the currently-tracking subscriber,
    /// bidirectionally.
    pub fn track_signal(&mut self, id: SignalId) {
        if let Some(sub) = self.tracking {
            self.signals[id.0].subscribers.insert(sub);
            self.subscribers[sub.0].sources.insert(SourceId::Signal(id));
        }
    }

    /// Record an edge from a computed to the currently-tracking subscriber,
    /// bidirectionally. Self-reads are ignored; the `Computing` guard
    /// rejects them before this point.
    pub fn track_computed(&mut self, id: SubscriberId) {
        let Some(sub) = self.tracking else { return };
        if sub == id {
            return;
        }
        if let SubscriberKind::Computed(slot) = &mut self.subscribers[id.0].kind {
            slot.subscribers.insert(sub);
        }
        self.subscribers[sub.0].sources.insert(SourceId::Computed(id));
    }

    /// Drop every upstream edge of `id` (both directions).
    pub fn clear_sources(&mut self, id: SubscriberId) {
        let sources: Vec<SourceId> = self.subscribers[id.0].sources.drain().collect();
        for source in sources {
            match source {
                SourceId::Signal(s) => {
                    self.signals[s.0].subscribers.remove(&id);
                }
                SourceId::Computed(c) => {
                    if let SubscriberKind::Computed(slot) = &mut self.subscribers[c.0].kind {
                        slot.subscribers.remove(&id);
                    }
                }
            }
        }
    }
}

thread_local! {
    pub(crate) static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

/// Restores the tracking context on drop, including during unwinding, so a
/// panicking subscriber never wedges the ambient context.
pub(crate) struct TrackingRestore(pub(crate) Option<SubscriberId>);

impl Drop for TrackingRestore {
    fn drop(&mut self) {
        let prev = self.0.take();
        RUNTIME.with(|rt| rt.borrow_mut().tracking = prev);
    }
}

/// Reset the thread-local runtime. Unit tests share a thread; each test
/// starts from a clean graph.
#[cfg(test)]
pub(crate) fn reset_runtime() {
    RUNTIME.with(|rt| {
        *rt.borrow_mut() = Runtime::new();
    });
}
