//! Disposal scopes: bracketed extents collecting cleanup callbacks.
//!
//! Scopes nest via a stack. [`on_cleanup`] registers into the innermost
//! active scope and fails with [`ScopeError::NoActiveScope`] when none is
//! active; the crate-internal silent variant is used by primitives that
//! register opportunistically. Cleanups run in reverse (LIFO) registration
//! order.

use super::effect::EffectHandle;
use super::runtime::RUNTIME;

/// Errors from cleanup registration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("cleanup registered outside of any disposal scope")]
    NoActiveScope,
}

type CleanupFn = Box<dyn FnOnce()>;

/// An ordered list of cleanup callbacks tied to a dynamic extent.
///
/// Produced by [`pop_scope`]; consumed by [`run_cleanups`]. Holding a
/// `Scope` keeps its callbacks pending; dropping one without running it
/// abandons them.
#[derive(Default)]
pub struct Scope {
    cleanups: Vec<CleanupFn>,
}

impl Scope {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cleanups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cleanups.is_empty()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("cleanups", &self.cleanups.len())
            .finish()
    }
}

/// Open a new innermost disposal scope.
pub fn push_scope() {
    RUNTIME.with(|rt| rt.borrow_mut().scopes.push(Scope::new()));
}

/// Close the innermost scope and hand it to the caller.
///
/// An unbalanced pop is tolerated: it logs and returns an empty scope.
pub fn pop_scope() -> Scope {
    RUNTIME
        .with(|rt| rt.borrow_mut().scopes.pop())
        .unwrap_or_else(|| {
            tracing::debug!("pop_scope without a matching push_scope");
            Scope::new()
        })
}

/// Register a cleanup with the innermost active scope.
///
/// Fails fast when no scope is active — a silently dropped cleanup is a
/// leak waiting to happen.
pub fn on_cleanup(f: impl FnOnce() + 'static) -> Result<(), ScopeError> {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        match rt.scopes.last_mut() {
            Some(scope) => {
                scope.cleanups.push(Box::new(f));
                Ok(())
            }
            None => Err(ScopeError::NoActiveScope),
        }
    })
}

/// Silent variant of [`on_cleanup`]: registers when a scope is active,
/// otherwise does nothing. Returns whether the cleanup was registered.
pub(crate) fn on_cleanup_silent(f: impl FnOnce() + 'static) -> bool {
    RUNTIME.with(|rt| {
        let mut rt = rt.borrow_mut();
        match rt.scopes.last_mut() {
            Some(scope) => {
                scope.cleanups.push(Box::new(f));
                true
            }
            None => false,
        }
    })
}

/// Auto-register an effect's disposer with the ambient scope, if any.
pub(crate) fn register_disposer(handle: EffectHandle) {
    on_cleanup_silent(move || handle.dispose());
}

/// Execute a scope's cleanups in reverse registration order.
pub fn run_cleanups(mut scope: Scope) {
    while let Some(f) = scope.cleanups.pop() {
        f();
    }
}

/// RAII bracket around a scope.
///
/// [`ScopeGuard::enter`] pushes a scope; [`ScopeGuard::finish`] pops and
/// returns it. If the guard is dropped without `finish` — a construction
/// callback panicked — the scope is popped and its cleanups run, so a
/// partially-built extent never leaks subscriptions.
pub struct ScopeGuard {
    armed: bool,
}

impl ScopeGuard {
    pub fn enter() -> Self {
        push_scope();
        Self { armed: true }
    }

    pub fn finish(mut self) -> Scope {
        self.armed = false;
        pop_scope()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.armed {
            run_cleanups(pop_scope());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect::create_effect;
    use crate::reactive::runtime::reset_runtime;
    use crate::reactive::signal::create_signal;
    use std::cell::{Cell, RefCell};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    fn setup() {
        reset_runtime();
    }

    #[test]
    fn on_cleanup_outside_scope_fails() {
        setup();
        let err = on_cleanup(|| {}).unwrap_err();
        assert_eq!(err, ScopeError::NoActiveScope);
    }

    #[test]
    fn cleanups_run_in_reverse_order() {
        setup();
        let order = Rc::new(RefCell::new(Vec::new()));
        push_scope();
        for i in 0..3 {
            let order_c = order.clone();
            on_cleanup(move || order_c.borrow_mut().push(i)).unwrap();
        }
        let scope = pop_scope();
        assert_eq!(scope.len(), 3);
        run_cleanups(scope);
        assert_eq!(*order.borrow(), vec![2, 1, 0]);
    }

    #[test]
    fn nested_scopes_register_innermost() {
        setup();
        let hits = Rc::new(RefCell::new(Vec::new()));
        push_scope();
        {
            let hits_c = hits.clone();
            on_cleanup(move || hits_c.borrow_mut().push("outer")).unwrap();
        }
        push_scope();
        {
            let hits_c = hits.clone();
            on_cleanup(move || hits_c.borrow_mut().push("inner")).unwrap();
        }
        let inner = pop_scope();
        run_cleanups(inner);
        assert_eq!(*hits.borrow(), vec!["inner"]);

        let outer = pop_scope();
        run_cleanups(outer);
        assert_eq!(*hits.borrow(), vec!["inner", "outer"]);
    }

    #[test]
    fn unbalanced_pop_returns_empty_scope() {
        setup();
        let scope = pop_scope();
        assert!(scope.is_empty());
    }

    #[test]
    fn effect_auto_registers_disposer() {
        setup();
        let s = create_signal(0_i32);
        let runs = Rc::new(Cell::new(0_u32));
        let runs_c = runs.clone();

        push_scope();
        create_effect(move || {
            let _ = s.get();
            runs_c.set(runs_c.get() + 1);
        });
        let scope = pop_scope();
        assert_eq!(scope.len(), 1);

        s.set(1);
        assert_eq!(runs.get(), 2);

        // Disposing the scope disposes the effect.
        run_cleanups(scope);
        s.set(2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn silent_variant_is_noop_without_scope() {
        setup();
        assert!(!on_cleanup_silent(|| panic!("must never run")));
    }

    #[test]
    fn guard_finish_hands_back_scope() {
        setup();
        let hit = Rc::new(Cell::new(false));
        let guard = ScopeGuard::enter();
        let hit_c = hit.clone();
        on_cleanup(move || hit_c.set(true)).unwrap();
        let scope = guard.finish();
        assert!(!hit.get());
        run_cleanups(scope);
        assert!(hit.get());
    }

    #[test]
    fn guard_disposes_partial_scope_on_panic() {
        setup();
        let disposed = Rc::new(Cell::new(false));
        let disposed_c = disposed.clone();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = ScopeGuard::enter();
            on_cleanup(move || disposed_c.set(true)).unwrap();
            panic!("construction failed");
        }));
        assert!(result.is_err());
        assert!(disposed.get());
        // Stack is balanced again.
        assert!(pop_scope().is_empty());
    }
}
