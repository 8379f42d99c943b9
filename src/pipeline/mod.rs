//! Render Pipeline
//!
//! Connects element trees to the host through the fiber engine.
//!
//! # Pipeline Architecture
//!
//! ```text
//! render(element) ─► work_loop ─► perform_unit_of_work ─► ... ─► commit_root
//!        ▲             (Deadline)     (one fiber per unit)         (host)
//!        │
//!   RenderTrigger ◄── setters / settled resources
//! ```
//!
//! ## Data Flow
//!
//! 1. **render / trigger** - start (or restart) a pass from the root element
//! 2. **work loop** - one unit of work at a time until the deadline runs low
//! 3. **commit** - once no units remain, apply the finished tree in one go

pub mod mount;
pub mod scheduler;
pub mod trigger;

// Re-exports
pub use mount::{Root, WorkStatus, mount};
pub use scheduler::{Deadline, Exhausted, FrameBudget, IdleScheduler, ImmediateFallback, TimeSlice, Unbounded};
pub use trigger::RenderTrigger;
