//! Fiber engine - the arena-backed fiber tree.
//!
//! The engine owns the persistent data structure the scheduler walks:
//! - Fiber: one node (kind, props, output handle, hook slots, effect tag)
//! - FiberVersion: immutable snapshot a re-render reads its old state from
//! - FiberTree: slotmap arena with parent/child/sibling links as ids
//!
//! # Architecture
//!
//! Fibers are NOT reference-counted objects pointing at each other. They are
//! entries of one arena, linked by id:
//!
//! ```text
//! root ──child──► A ──sibling──► B
//!                 │
//!                 └──child──► A1 ──sibling──► A2     (parent links point back up)
//! ```
//!
//! "Current" and "work-in-progress" are two generations of the same slots:
//! the committed state is frozen into a `FiberVersion` when a pass first
//! touches a node, and the slot itself becomes the work-in-progress node.

mod fiber;
mod tree;

pub use fiber::*;
pub use tree::*;

slotmap::new_key_type! {
    /// Stable, generational identifier of a fiber.
    pub struct FiberId;
}
