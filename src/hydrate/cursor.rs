//! Hydration cursor: a stateful matcher over a pre-rendered sibling sequence.
//!
//! The walker claims existing nodes from a tree produced by a server-side
//! render pass so that the reactive graph attaches to them instead of
//! rebuilding them. It tolerates structural drift: foreign nodes are
//! logged and skipped, missing nodes degrade to fresh construction by the
//! caller. Claims must happen in the exact order the server emitted
//! matching nodes — the matcher guarantees nothing stronger than kind/tag
//! matching, so out-of-order calls silently misalign.

use crate::dom::{NodeId, NodeKind, RenderTarget};

/// Errors from starting a hydration pass.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HydrateError {
    #[error("a hydration pass is already active")]
    AlreadyActive,
}

/// Walker state for one hydration pass.
///
/// An explicit context value threaded through calls rather than a global:
/// Inactive → Active(cursor, stack) → (optionally) Paused → Active →
/// Inactive. Active for exactly one pass between [`Hydrator::start`] and
/// [`Hydrator::end`].
#[derive(Debug, Default)]
pub struct Hydrator {
    active: bool,
    paused: bool,
    /// Next unclaimed node in the current sibling sequence.
    cursor: Option<NodeId>,
    /// Saved cursor positions for nested descent.
    stack: Vec<Option<NodeId>>,
}

impl Hydrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a pass over `root`'s children. Re-entrant starts fail.
    pub fn start<R: RenderTarget>(&mut self, target: &R, root: NodeId) -> Result<(), HydrateError> {
        if self.active {
            return Err(HydrateError::AlreadyActive);
        }
        self.active = true;
        self.paused = false;
        self.cursor = target.first_child(root);
        self.stack.clear();
        Ok(())
    }

    /// Whether claims currently adopt nodes.
    pub fn is_active(&self) -> bool {
        self.active && !self.paused
    }

    /// Claim the next element with the given tag.
    pub fn claim_element<R: RenderTarget>(&mut self, target: &R, tag: &str) -> Option<NodeId> {
        self.claim(target, NodeKind::Element, Some(tag))
    }

    /// Claim the next text node.
    pub fn claim_text<R: RenderTarget>(&mut self, target: &R) -> Option<NodeId> {
        self.claim(target, NodeKind::Text, None)
    }

    /// Claim the next comment node.
    pub fn claim_comment<R: RenderTarget>(&mut self, target: &R) -> Option<NodeId> {
        self.claim(target, NodeKind::Comment, None)
    }

    /// Scan forward from the cursor for a node of the wanted kind (and tag,
    /// for elements). On a match the cursor advances past it and the node
    /// is returned for adoption; mismatching nodes along the way are logged
    /// and skipped, untouched. Exhausting the siblings returns `None` with
    /// the cursor restored, and the caller constructs a fresh node.
    fn claim<R: RenderTarget>(
        &mut self,
        target: &R,
        want: NodeKind,
        tag: Option<&str>,
    ) -> Option<NodeId> {
        if !self.is_active() {
            return None;
        }
        let start = self.cursor;
        let mut current = self.cursor;
        while let Some(node) = current {
            let kind = target.kind(node);
            let matches = kind == Some(want)
                && match (want, tag) {
                    (NodeKind::Element, Some(tag)) => target.tag(node).as_deref() == Some(tag),
                    _ => true,
                };
            if matches {
                self.cursor = target.next_sibling(node);
                return Some(node);
            }
            match kind {
                Some(NodeKind::Element) => tracing::warn!(
                    ?node,
                    found = ?target.tag(node),
                    expected = ?want,
                    "hydration: skipping foreign node"
                ),
                _ => tracing::debug!(?node, found = ?kind, expected = ?want, "hydration: skipping node"),
            }
            current = target.next_sibling(node);
        }
        self.cursor = start;
        tracing::debug!(expected = ?want, "hydration: no matching sibling, falling back to fresh construction");
        None
    }

    /// Descend into a claimed container's children. The current cursor is
    /// saved and restored by [`Hydrator::exit_children`].
    pub fn enter_children<R: RenderTarget>(&mut self, target: &R, container: NodeId) {
        if !self.active {
            return;
        }
        self.stack.push(self.cursor);
        self.cursor = target.first_child(container);
    }

    /// Return from a nested descent. An unbalanced exit is tolerated: it
    /// logs and resets the cursor.
    pub fn exit_children(&mut self) {
        if !self.active {
            return;
        }
        match self.stack.pop() {
            Some(saved) => self.cursor = saved,
            None => {
                tracing::warn!("hydration: exit_children without matching enter_children");
                self.cursor = None;
            }
        }
    }

    /// Temporarily leave claiming mode without losing stack state. Content
    /// built while paused is constructed fresh.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume claiming after a [`Hydrator::pause`].
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Finish the pass and clear all state. Leftover cursor or stack
    /// entries signal a server/client output mismatch and are reported.
    pub fn end(&mut self) {
        if self.active && (self.cursor.is_some() || !self.stack.is_empty()) {
            tracing::warn!(
                leftover_cursor = self.cursor.is_some(),
                leftover_stack = self.stack.len(),
                "hydration ended with unconsumed nodes: server/client output mismatch"
            );
        }
        self.active = false;
        self.paused = false;
        self.cursor = None;
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Dom, NodeData};

    /// Server output: <div> <p> "hi" <!--m--> <span> </div>
    fn server_tree() -> (Dom, NodeId, [NodeId; 4]) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        let p = dom.insert_child(root, NodeData::element("p"));
        let t = dom.insert_child(root, NodeData::text("hi"));
        let m = dom.insert_child(root, NodeData::comment("m"));
        let span = dom.insert_child(root, NodeData::element("span"));
        (dom, root, [p, t, m, span])
    }

    #[test]
    fn claims_in_emission_order() {
        let (dom, root, [p, t, m, span]) = server_tree();
        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        assert_eq!(hy.claim_element(&dom, "p"), Some(p));
        assert_eq!(hy.claim_text(&dom), Some(t));
        assert_eq!(hy.claim_comment(&dom), Some(m));
        assert_eq!(hy.claim_element(&dom, "span"), Some(span));
        hy.end();
    }

    #[test]
    fn claiming_does_not_mutate_tree() {
        let (dom, root, _) = server_tree();
        let before = dom.walk_depth_first(root);
        let len = dom.len();
        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        let _ = hy.claim_element(&dom, "p");
        let _ = hy.claim_text(&dom);
        hy.end();
        assert_eq!(dom.walk_depth_first(root), before);
        assert_eq!(dom.len(), len);
    }

    #[test]
    fn reentrant_start_fails() {
        let (dom, root, _) = server_tree();
        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        assert_eq!(hy.start(&dom, root), Err(HydrateError::AlreadyActive));
        hy.end();
        // After ending, a new pass may begin.
        assert!(hy.start(&dom, root).is_ok());
    }

    #[test]
    fn foreign_node_is_skipped_not_removed() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        let first = dom.insert_child(root, NodeData::element("span"));
        let foreign = dom.insert_child(root, NodeData::element("script"));
        let second = dom.insert_child(root, NodeData::element("span"));

        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        assert_eq!(hy.claim_element(&dom, "span"), Some(first));
        // The foreign <script> sits between the two expected nodes.
        assert_eq!(hy.claim_element(&dom, "span"), Some(second));
        hy.end();
        assert!(dom.contains(foreign));
        assert_eq!(dom.children(root), &[first, foreign, second]);
    }

    #[test]
    fn exhausted_siblings_return_none_and_restore_cursor() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        let t = dom.insert_child(root, NodeData::text("only"));

        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        // No <p> anywhere: no match, cursor unchanged.
        assert_eq!(hy.claim_element(&dom, "p"), None);
        // The text node is still claimable.
        assert_eq!(hy.claim_text(&dom), Some(t));
        hy.end();
    }

    #[test]
    fn tag_mismatch_falls_back() {
        let (dom, root, [_, t, ..]) = server_tree();
        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        assert_eq!(hy.claim_element(&dom, "h1"), None);
        assert_eq!(hy.claim_text(&dom), Some(t));
        hy.end();
    }

    #[test]
    fn nested_descent() {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("div"));
        let ul = dom.insert_child(root, NodeData::element("ul"));
        let li1 = dom.insert_child(ul, NodeData::element("li"));
        let li2 = dom.insert_child(ul, NodeData::element("li"));
        let after = dom.insert_child(root, NodeData::element("footer"));

        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        let claimed_ul = hy.claim_element(&dom, "ul").unwrap();
        assert_eq!(claimed_ul, ul);

        hy.enter_children(&dom, claimed_ul);
        assert_eq!(hy.claim_element(&dom, "li"), Some(li1));
        assert_eq!(hy.claim_element(&dom, "li"), Some(li2));
        hy.exit_children();

        // Back at the outer level, after the ul.
        assert_eq!(hy.claim_element(&dom, "footer"), Some(after));
        hy.end();
    }

    #[test]
    fn unbalanced_exit_resets_cursor() {
        let (dom, root, _) = server_tree();
        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        hy.exit_children();
        assert_eq!(hy.claim_element(&dom, "p"), None);
        hy.end();
    }

    #[test]
    fn paused_claims_return_none() {
        let (dom, root, [p, t, ..]) = server_tree();
        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        assert_eq!(hy.claim_element(&dom, "p"), Some(p));

        hy.pause();
        assert!(!hy.is_active());
        assert_eq!(hy.claim_text(&dom), None);

        hy.resume();
        assert_eq!(hy.claim_text(&dom), Some(t));
        hy.end();
    }

    #[test]
    fn end_clears_state() {
        let (dom, root, _) = server_tree();
        let mut hy = Hydrator::new();
        hy.start(&dom, root).unwrap();
        let _ = hy.claim_element(&dom, "p");
        hy.end();
        assert!(!hy.is_active());
        // Claims after the pass construct fresh (None).
        assert_eq!(hy.claim_text(&dom), None);
    }
}
