//! RenderTarget: capability trait over the node model.
//!
//! The graph, the hydration walker, and the reconciling primitives only
//! need node construction, navigation, and structural mutation. Describing
//! those as a trait decouples them from [`Dom`] so any adapter — a browser
//! binding, a server-side emulation — can host the same reactivity.

use super::node::{NodeId, NodeKind};
use super::tree::Dom;

/// The minimal operations a render target must supply.
pub trait RenderTarget {
    // construction
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text(&mut self, data: &str) -> NodeId;
    fn create_comment(&mut self, data: &str) -> NodeId;
    fn create_fragment(&mut self) -> NodeId;

    // navigation
    fn kind(&self, id: NodeId) -> Option<NodeKind>;
    fn tag(&self, id: NodeId) -> Option<String>;
    fn parent(&self, id: NodeId) -> Option<NodeId>;
    fn first_child(&self, id: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, id: NodeId) -> Option<NodeId>;
    fn children_of(&self, id: NodeId) -> Vec<NodeId>;

    // mutation
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    fn insert_after(&mut self, anchor: NodeId, node: NodeId);
    fn move_to_index(&mut self, parent: NodeId, child: NodeId, index: usize);
    fn replace(&mut self, old: NodeId, new: NodeId);
    fn remove(&mut self, id: NodeId);
    fn set_text(&mut self, id: NodeId, data: &str);
}

impl RenderTarget for Dom {
    fn create_element(&mut self, tag: &str) -> NodeId {
        Dom::create_element(self, tag)
    }

    fn create_text(&mut self, data: &str) -> NodeId {
        Dom::create_text(self, data)
    }

    fn create_comment(&mut self, data: &str) -> NodeId {
        Dom::create_comment(self, data)
    }

    fn create_fragment(&mut self) -> NodeId {
        Dom::create_fragment(self)
    }

    fn kind(&self, id: NodeId) -> Option<NodeKind> {
        Dom::kind(self, id)
    }

    fn tag(&self, id: NodeId) -> Option<String> {
        Dom::get(self, id)
            .and_then(|data| data.tag())
            .map(str::to_owned)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        Dom::parent(self, id)
    }

    fn first_child(&self, id: NodeId) -> Option<NodeId> {
        Dom::first_child(self, id)
    }

    fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        Dom::next_sibling(self, id)
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        Dom::children(self, id).to_vec()
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        Dom::append_child(self, parent, child);
    }

    fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        Dom::insert_after(self, anchor, node);
    }

    fn move_to_index(&mut self, parent: NodeId, child: NodeId, index: usize) {
        Dom::move_to_index(self, parent, child, index);
    }

    fn replace(&mut self, old: NodeId, new: NodeId) {
        Dom::replace(self, old, new);
    }

    fn remove(&mut self, id: NodeId) {
        Dom::remove(self, id);
    }

    fn set_text(&mut self, id: NodeId, data: &str) {
        Dom::set_text(self, id, data);
    }
}
