//! Conditional rendering: one mounted branch at a time, swapped in place.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{NodeId, RenderTarget};
use crate::hydrate::Hydrator;
use crate::reactive::{create_effect, dispose_effect, run_cleanups, EffectHandle, Scope, ScopeGuard};
use crate::reconcile::BuildCx;

struct ConditionalState {
    anchor: Option<NodeId>,
    current: Option<NodeId>,
    scope: Option<Scope>,
}

/// Handle to a mounted conditional region.
pub struct Conditional {
    state: Rc<RefCell<ConditionalState>>,
    effect: EffectHandle,
}

impl Conditional {
    /// The stable comment marking where branches mount.
    pub fn anchor(&self) -> Option<NodeId> {
        self.state.borrow().anchor
    }

    /// The currently mounted branch root.
    pub fn node(&self) -> Option<NodeId> {
        self.state.borrow().current
    }

    /// Stop reacting and run the mounted branch's cleanups. The nodes stay
    /// in the tree; removing them is the caller's decision.
    pub fn dispose(&self) {
        dispose_effect(self.effect);
        let scope = self.state.borrow_mut().scope.take();
        if let Some(scope) = scope {
            run_cleanups(scope);
        }
    }
}

/// Mount a reactive branch under `parent`. The `render` callback is tracked:
/// whenever a dependency changes it runs again, and if it returns a
/// different root node the old branch is replaced in place. Returning the
/// same node leaves the tree untouched.
///
/// A comment anchor is appended to `parent` (or claimed during hydration)
/// so the branch keeps a stable position even while unmounted. The
/// hydration walker is consulted only on the first run.
pub fn conditional<R, F>(
    target: Rc<RefCell<R>>,
    parent: NodeId,
    hydrator: Option<Rc<RefCell<Hydrator>>>,
    mut render: F,
) -> Conditional
where
    R: RenderTarget + 'static,
    F: FnMut(&mut BuildCx<'_, R>) -> NodeId + 'static,
{
    let state = Rc::new(RefCell::new(ConditionalState {
        anchor: None,
        current: None,
        scope: None,
    }));

    let effect_state = Rc::clone(&state);
    let mut hydrator = hydrator;
    let effect = create_effect(move || {
        let previous_scope = effect_state.borrow_mut().scope.take();
        if let Some(scope) = previous_scope {
            run_cleanups(scope);
        }

        let mut hy_borrow = hydrator.as_ref().map(|hy| hy.borrow_mut());
        let mut tgt = target.borrow_mut();

        if effect_state.borrow().anchor.is_none() {
            let anchor = hy_borrow
                .as_deref_mut()
                .and_then(|hy| hy.claim_comment(&*tgt))
                .unwrap_or_else(|| {
                    let anchor = tgt.create_comment("|");
                    tgt.append_child(parent, anchor);
                    anchor
                });
            effect_state.borrow_mut().anchor = Some(anchor);
        }

        let guard = ScopeGuard::enter();
        let node = {
            let mut cx = BuildCx::new(&mut *tgt, hy_borrow.as_deref_mut());
            render(&mut cx)
        };
        let scope = guard.finish();

        let previous = effect_state.borrow().current;
        match previous {
            Some(old) if old != node => {
                tgt.replace(old, node);
            }
            Some(_) => {}
            None => {
                // First mount: a hydration-claimed node is already in
                // place, a fresh one slots in after the anchor.
                if tgt.parent(node).is_none() {
                    let anchor = effect_state.borrow().anchor.unwrap_or(parent);
                    tgt.insert_after(anchor, node);
                }
            }
        }

        let mut st = effect_state.borrow_mut();
        st.current = Some(node);
        st.scope = Some(scope);
        drop(st);
        drop(tgt);
        drop(hy_borrow);
        // Later runs reconcile live state; only the first may adopt.
        hydrator = None;
    });

    Conditional { state, effect }
}
