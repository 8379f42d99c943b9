//! Reconciler engine - the fiber arena and child matching.
//!
//! # Architecture
//!
//! ```text
//! Element tree ──► perform unit of work ──► reconcile_children ──► fibers
//!                   (one fiber at a time)     (ChildMatcher)        (FiberTree)
//! ```
//!
//! The work loop itself lives in [`crate::pipeline`]; this module owns the
//! data it walks.

mod fiber;
mod reconcile;

pub use fiber::{Fiber, FiberId, FiberTree, ROOT_TAG};
pub use reconcile::{ChildMatcher, Matching, PositionalMatcher};

pub(crate) use reconcile::reconcile_children;
