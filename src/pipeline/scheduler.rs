//! Scheduler shim - idle-time slices that pace the work loop.
//!
//! The work loop performs one unit of work at a time and checks the
//! [`Deadline`] in between. Once `time_remaining()` drops under the
//! configured threshold it yields; the next slice resumes where it left off.
//!
//! Hosts with a native idle callback hand out [`TimeSlice`]s. Without one,
//! [`Exhausted`] (zero time remaining) is the fallback: exactly one unit of
//! work per tick.

use std::time::{Duration, Instant};

/// Time left in the current idle slice.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// Wall-clock idle slice.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    started: Instant,
    budget: Duration,
}

impl TimeSlice {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }
}

impl Deadline for TimeSlice {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

/// A slice that is already used up: one unit of work, then yield.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhausted;

impl Deadline for Exhausted {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

/// A slice that never runs out; the loop only stops when work is done.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

// =============================================================================
// Idle Schedulers
// =============================================================================

/// Source of idle slices (the host's idle-callback primitive).
pub trait IdleScheduler {
    type Slice: Deadline;

    /// Produce the slice for the next callback.
    fn next_slice(&mut self) -> Self::Slice;
}

/// Emulated idle callback: every tick gets a fixed wall-clock budget.
#[derive(Debug, Clone, Copy)]
pub struct FrameBudget {
    pub budget: Duration,
}

impl FrameBudget {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }
}

impl Default for FrameBudget {
    fn default() -> Self {
        // Roughly the idle part of a 60fps frame.
        Self::new(Duration::from_millis(8))
    }
}

impl IdleScheduler for FrameBudget {
    type Slice = TimeSlice;

    fn next_slice(&mut self) -> TimeSlice {
        TimeSlice::new(self.budget)
    }
}

/// Fallback for hosts without idle callbacks: zero time per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateFallback;

impl IdleScheduler for ImmediateFallback {
    type Slice = Exhausted;

    fn next_slice(&mut self) -> Exhausted {
        Exhausted
    }
}
