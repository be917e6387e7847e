//! # weft
//!
//! A fine-grained reactive rendering core: signals, derived values, and
//! effects drive in-place reconciliation of a retained node tree, with
//! first-class hydration of pre-rendered output.
//!
//! weft is renderer-agnostic. Views are built against the
//! [`dom::RenderTarget`] trait over an abstract node model of elements,
//! text, comments, and fragments; the bundled [`dom::Dom`] arena is one
//! implementation, suitable for servers and tests.
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: signals, computeds, effects, batching, disposal scopes
//! - **[`dom`]**: slotmap-backed node arena and the `RenderTarget` seam
//! - **[`hydrate`]**: cursor walker that adopts pre-rendered trees
//! - **[`reconcile`]**: conditional and keyed-list primitives that patch
//!   the tree minimally on change
//!
//! ## Quick taste
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use weft::dom::{Dom, NodeData};
//! use weft::reactive::create_signal;
//! use weft::reconcile::conditional;
//!
//! let count = create_signal(0);
//! let dom = Rc::new(RefCell::new(Dom::new()));
//! let root = dom.borrow_mut().insert(NodeData::element("div"));
//!
//! let view = conditional(Rc::clone(&dom), root, None, move |cx| {
//!     if count.get() < 10 {
//!         cx.element("p")
//!     } else {
//!         cx.element("h1")
//!     }
//! });
//! let small = view.node().unwrap();
//!
//! count.set(42);
//! assert_ne!(view.node(), Some(small));
//! ```

pub mod dom;
pub mod hydrate;
pub mod reactive;
pub mod reconcile;
