//! Reactive view primitives that reconcile a render target in place.
//!
//! Both primitives own an effect whose body diffs the desired shape against
//! what is currently mounted, touching only the nodes that changed. On the
//! very first run they may consult a hydration walker to adopt pre-rendered
//! nodes; every later run mutates the tree directly.

pub mod keyed;
pub mod switch;

pub use keyed::{keyed_list, KeyedList};
pub use switch::{conditional, Conditional};

use crate::dom::{NodeId, RenderTarget};
use crate::hydrate::Hydrator;

/// What a render callback sees: the mutable target plus, on the first pass
/// only, the hydration walker. Construction helpers claim an existing node
/// when one matches and fall back to building a detached fresh one.
pub struct BuildCx<'a, R: RenderTarget> {
    pub target: &'a mut R,
    pub hydrator: Option<&'a mut Hydrator>,
}

impl<'a, R: RenderTarget> BuildCx<'a, R> {
    pub fn new(target: &'a mut R, hydrator: Option<&'a mut Hydrator>) -> Self {
        Self { target, hydrator }
    }

    /// Claim or create an element with the given tag.
    pub fn element(&mut self, tag: &str) -> NodeId {
        if let Some(hy) = self.hydrator.as_deref_mut() {
            if let Some(node) = hy.claim_element(&*self.target, tag) {
                return node;
            }
        }
        self.target.create_element(tag)
    }

    /// Claim or create a text node carrying `data`. A claimed node keeps
    /// its server-rendered content unless it disagrees.
    pub fn text(&mut self, data: &str) -> NodeId {
        if let Some(hy) = self.hydrator.as_deref_mut() {
            if let Some(node) = hy.claim_text(&*self.target) {
                self.target.set_text(node, data);
                return node;
            }
        }
        self.target.create_text(data)
    }

    /// Claim or create a comment node.
    pub fn comment(&mut self, data: &str) -> NodeId {
        if let Some(hy) = self.hydrator.as_deref_mut() {
            if let Some(node) = hy.claim_comment(&*self.target) {
                return node;
            }
        }
        self.target.create_comment(data)
    }

    /// Whether this pass is adopting pre-rendered nodes.
    pub fn hydrating(&self) -> bool {
        self.hydrator.as_ref().is_some_and(|hy| hy.is_active())
    }
}
