//! Reactive core: signals, computeds, effects, scopes, scheduling.
//!
//! Fine-grained reactivity with a push/pull hybrid: writes push dirtiness
//! through the graph synchronously, values are pulled lazily on read, and
//! effects flush in batches.
//!
//! - [`create_signal`] — reactive memory cell.
//! - [`create_computed`] — cached, lazily-recomputed derivation.
//! - [`create_effect`] — auto-tracking side effect.
//! - [`batch`] — coalesce multiple writes into one notification pass.
//! - [`push_scope`] / [`pop_scope`] / [`on_cleanup`] — scoped disposal.

pub mod computed;
pub mod effect;
pub mod runtime;
pub mod scheduler;
pub mod scope;
pub mod signal;

pub use computed::{create_computed, Computed};
pub use effect::{create_effect, dispose_effect, EffectHandle};
pub use runtime::ComputedState;
pub use scheduler::{batch, untrack};
pub use scope::{
    on_cleanup, pop_scope, push_scope, run_cleanups, Scope, ScopeError, ScopeGuard,
};
pub use signal::{create_signal, Signal};
