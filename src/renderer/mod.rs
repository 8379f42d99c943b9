//! Commit engine - applies a finished work-in-progress tree to the host.
//!
//! The render phase never touches attached host nodes. Everything visible
//! happens here, in one synchronous pass:
//!
//! 1. Deletions: the topmost host nodes of each deleted subtree are
//!    detached from their host parent.
//! 2. Placements and updates, in pre-order: props are diffed against what
//!    was applied last time, text is rewritten only when it changed, and
//!    nodes not yet under their host parent are inserted before the next
//!    attached host sibling.

mod commit;
mod report;

pub use commit::commit_root;
pub use report::RenderReport;

pub(crate) use commit::apply_initial_props;
