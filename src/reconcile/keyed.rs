//! Keyed list rendering: per-key node identity across reorders.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

use crate::dom::{NodeId, RenderTarget};
use crate::hydrate::Hydrator;
use crate::reactive::{create_effect, dispose_effect, run_cleanups, EffectHandle, Scope, ScopeGuard};
use crate::reconcile::BuildCx;

struct Entry {
    node: NodeId,
    scope: Option<Scope>,
}

struct ListState<K> {
    entries: HashMap<K, Entry>,
    order: Vec<K>,
}

/// Handle to a mounted keyed list.
pub struct KeyedList<K> {
    state: Rc<RefCell<ListState<K>>>,
    effect: EffectHandle,
}

impl<K: Clone + Eq + Hash> KeyedList<K> {
    pub fn len(&self) -> usize {
        self.state.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().order.is_empty()
    }

    /// The node currently owned by `key`, if mounted.
    pub fn node_for(&self, key: &K) -> Option<NodeId> {
        self.state.borrow().entries.get(key).map(|e| e.node)
    }

    /// Current keys in mounted order.
    pub fn keys(&self) -> Vec<K> {
        self.state.borrow().order.clone()
    }

    /// Stop reacting and run every row's cleanups. Rows stay in the tree.
    pub fn dispose(&self) {
        dispose_effect(self.effect);
        let scopes: Vec<Scope> = {
            let mut st = self.state.borrow_mut();
            st.entries.values_mut().filter_map(|e| e.scope.take()).collect()
        };
        for scope in scopes {
            run_cleanups(scope);
        }
    }
}

/// Mount a reactive list of keyed rows under `container`.
///
/// The `keys` callback is tracked; each run its result is diffed against
/// the mounted rows by key. Vanished rows are removed and their cleanups
/// run, new rows are rendered once through `render`, and surviving rows
/// keep their node identity and are repositioned rather than rebuilt.
/// Duplicate keys keep the first occurrence and are reported.
///
/// During the first run a hydration walker, if provided, adopts existing
/// children of `container` in order; the server's order is trusted, so no
/// repositioning happens on that pass.
pub fn keyed_list<R, K, KF, RF>(
    target: Rc<RefCell<R>>,
    container: NodeId,
    hydrator: Option<Rc<RefCell<Hydrator>>>,
    mut keys: KF,
    mut render: RF,
) -> KeyedList<K>
where
    R: RenderTarget + 'static,
    K: Clone + Eq + Hash + std::fmt::Debug + 'static,
    KF: FnMut() -> Vec<K> + 'static,
    RF: FnMut(&mut BuildCx<'_, R>, &K) -> NodeId + 'static,
{
    let state = Rc::new(RefCell::new(ListState {
        entries: HashMap::new(),
        order: Vec::new(),
    }));

    let effect_state = Rc::clone(&state);
    let mut hydrator = hydrator;
    let effect = create_effect(move || {
        let raw = keys();
        let mut desired = Vec::with_capacity(raw.len());
        let mut seen = HashSet::with_capacity(raw.len());
        for key in raw {
            if seen.insert(key.clone()) {
                desired.push(key);
            } else {
                tracing::warn!(?key, "keyed list: duplicate key dropped");
            }
        }

        let mut hy_borrow = hydrator.as_ref().map(|hy| hy.borrow_mut());
        let mut tgt = target.borrow_mut();
        let mut st = effect_state.borrow_mut();
        let mut retired: Vec<Scope> = Vec::new();

        // Drop rows whose keys vanished.
        let keep: HashSet<&K> = desired.iter().collect();
        let removed: Vec<K> = st
            .entries
            .keys()
            .filter(|k| !keep.contains(*k))
            .cloned()
            .collect();
        for key in removed {
            if let Some(mut entry) = st.entries.remove(&key) {
                tgt.remove(entry.node);
                if let Some(scope) = entry.scope.take() {
                    retired.push(scope);
                }
            }
        }

        let hydrating = hy_borrow
            .as_deref_mut()
            .map(|hy| {
                hy.enter_children(&*tgt, container);
                hy.is_active()
            })
            .unwrap_or(false);

        // Render rows missing from the mounted set, in order.
        for key in &desired {
            if st.entries.contains_key(key) {
                continue;
            }
            let guard = ScopeGuard::enter();
            let node = {
                let mut cx = BuildCx::new(&mut *tgt, hy_borrow.as_deref_mut());
                render(&mut cx, key)
            };
            let scope = guard.finish();
            if tgt.parent(node).is_none() {
                tgt.append_child(container, node);
            }
            st.entries.insert(
                key.clone(),
                Entry {
                    node,
                    scope: Some(scope),
                },
            );
        }

        if let Some(hy) = hy_borrow.as_deref_mut() {
            hy.exit_children();
        }

        if !hydrating {
            // Positional pass: nudge each surviving row to its slot.
            for (index, key) in desired.iter().enumerate() {
                let node = st.entries[key].node;
                if tgt.children_of(container).get(index) != Some(&node) {
                    tgt.move_to_index(container, node, index);
                }
            }
        }

        st.order = desired;
        drop(st);
        drop(tgt);
        drop(hy_borrow);
        hydrator = None;
        for scope in retired {
            run_cleanups(scope);
        }
    });

    KeyedList { state, effect }
}
