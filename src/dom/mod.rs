//! Node arena: slotmap-backed tree with a render-target capability trait.

pub mod node;
pub mod target;
pub mod tree;

pub use node::{NodeData, NodeId, NodeKind};
pub use target::RenderTarget;
pub use tree::{Dom, ListenerFn};
