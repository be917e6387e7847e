//! Tree operations: insert, remove, replace, reorder, walk.

use std::collections::VecDeque;
use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId, NodeKind};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// Event listener attached to an element.
pub type ListenerFn = Rc<dyn Fn()>;

/// The in-crate render target: a slotmap-backed node arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are
/// stored in secondary maps so removal is O(subtree size) and lookup is
/// O(1). Listeners are kept out of [`NodeData`] in their own secondary map.
pub struct Dom {
    nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    listeners: SecondaryMap<NodeId, Vec<(String, ListenerFn)>>,
    root: Option<NodeId>,
}

impl Dom {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            listeners: SecondaryMap::new(),
            root: None,
        }
    }

    // -- construction -------------------------------------------------------

    /// Insert a parentless node. The first inserted node becomes the root.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert a node as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics (debug) if `parent` does not exist.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        debug_assert!(self.nodes.contains_key(parent), "parent node does not exist");
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        self.children
            .get_mut(parent)
            .expect("parent must have a children vec")
            .push(id);
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_detached(NodeData::element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.create_detached(NodeData::text(data))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.create_detached(NodeData::comment(data))
    }

    /// Create a detached fragment node.
    pub fn create_fragment(&mut self) -> NodeId {
        self.create_detached(NodeData::fragment())
    }

    fn create_detached(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    // -- navigation ---------------------------------------------------------

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Empty slice if none or nonexistent.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// The sibling immediately after `id` under its parent.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.get(index + 1).copied()
    }

    /// Position of `child` among its parent's children.
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    // -- mutation -----------------------------------------------------------

    /// Detach `id` from its parent, keeping its subtree intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|&c| c != id);
            }
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first if
    /// it is attached elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes.contains_key(parent), "parent node does not exist");
        debug_assert!(self.nodes.contains_key(child), "child node does not exist");
        self.detach(child);
        self.parent.insert(child, parent);
        self.children
            .get_mut(parent)
            .expect("parent must have a children vec")
            .push(child);
    }

    /// Insert `node` as the sibling immediately after `anchor`.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        self.detach(node);
        self.parent.insert(node, parent);
        let siblings = self
            .children
            .get_mut(parent)
            .expect("parent must have a children vec");
        let index = siblings
            .iter()
            .position(|&c| c == anchor)
            .map(|i| i + 1)
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
    }

    /// Move `child` to `index` among `parent`'s children. Positions past the
    /// end clamp to the end.
    pub fn move_to_index(&mut self, parent: NodeId, child: NodeId, index: usize) {
        self.detach(child);
        self.parent.insert(child, parent);
        let siblings = self
            .children
            .get_mut(parent)
            .expect("parent must have a children vec");
        let index = index.min(siblings.len());
        siblings.insert(index, child);
    }

    /// Replace `old` with `new` in place, dropping `old`'s subtree.
    ///
    /// `new` takes `old`'s exact position. A parentless `old` is removed
    /// without attaching `new`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        match self.parent(old) {
            Some(parent) => {
                self.detach(new);
                let siblings = self
                    .children
                    .get_mut(parent)
                    .expect("parent must have a children vec");
                let index = siblings
                    .iter()
                    .position(|&c| c == old)
                    .expect("old is a child of its parent");
                siblings[index] = new;
                self.parent.insert(new, parent);
                self.parent.remove(old);
                self.drop_subtree(old);
            }
            None => {
                self.remove(old);
            }
        }
    }

    /// Remove a node and all its descendants.
    ///
    /// Returns the removed node's data, or `None` if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        self.detach(id);
        self.drop_subtree(id)
    }

    fn drop_subtree(&mut self, id: NodeId) -> Option<NodeData> {
        if self.root == Some(id) {
            self.root = None;
        }
        let mut queue = VecDeque::new();
        queue.push_back(id);
        let mut removed_root_data = None;
        while let Some(current) = queue.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                queue.extend(kids);
            }
            self.parent.remove(current);
            self.listeners.remove(current);
            let data = self.nodes.remove(current);
            if current == id {
                removed_root_data = data;
            }
        }
        removed_root_data
    }

    /// Overwrite the character data of a text or comment node. No-op on
    /// other kinds.
    pub fn set_text(&mut self, id: NodeId, new_data: &str) {
        match self.nodes.get_mut(id) {
            Some(NodeData::Text { data }) | Some(NodeData::Comment { data }) => {
                new_data.clone_into(data);
            }
            _ => {}
        }
    }

    /// Set an attribute on an element node. No-op on other kinds.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element { attributes, .. }) = self.nodes.get_mut(id) {
            attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    // -- listeners ----------------------------------------------------------

    /// Attach an event listener to a node.
    pub fn add_listener(&mut self, id: NodeId, event: &str, handler: ListenerFn) {
        self.listeners
            .entry(id)
            .expect("node must exist to take a listener")
            .or_default()
            .push((event.to_owned(), handler));
    }

    /// Invoke every listener registered for `event` on `id`. Returns how
    /// many ran.
    pub fn dispatch(&self, id: NodeId, event: &str) -> usize {
        let Some(listeners) = self.listeners.get(id) else {
            return 0;
        };
        let matching: Vec<ListenerFn> = listeners
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for handler in &matching {
            handler();
        }
        matching.len()
    }

    // -- inspection ---------------------------------------------------------

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id).map(NodeData::kind)
    }

    /// The current root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Explicitly set the root node.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
