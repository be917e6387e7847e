//! Adopting pre-rendered trees instead of rebuilding them.

pub mod cursor;

pub use cursor::{HydrateError, Hydrator};
