//! Slice deadlines and host resumption.
//!
//! The work loop checks a [`Deadline`] after every unit of work and hands
//! control back once less than `yield_threshold` remains. The host decides
//! when the loop runs again, through [`IdleHost`].

use std::cell::Cell;
use std::time::{Duration, Instant};

/// "How much time is left in this slice?"
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// Wall-clock slice of a fixed length.
#[derive(Debug, Clone, Copy)]
pub struct FrameDeadline {
    start: Instant,
    budget: Duration,
}

impl FrameDeadline {
    /// Slice starting now.
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }
}

impl Deadline for FrameDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Deterministic slice that allows exactly `n` unit steps.
#[derive(Debug)]
pub struct UnitBudget(Cell<usize>);

impl UnitBudget {
    pub fn new(units: usize) -> Self {
        Self(Cell::new(units))
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        let left = self.0.get().saturating_sub(1);
        self.0.set(left);
        if left > 0 { Duration::MAX } else { Duration::ZERO }
    }
}

/// Host idle/frame scheduling primitive.
pub trait IdleHost {
    /// Block until the host grants the next slice.
    ///
    /// `None` means the host cannot tell how long the slice is; the loop
    /// then falls back to its configured frame budget.
    fn wait_for_idle(&mut self) -> Option<Box<dyn Deadline>>;
}

/// Host that is always idle and never reports slice length.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateHost;

impl IdleHost for ImmediateHost {
    fn wait_for_idle(&mut self) -> Option<Box<dyn Deadline>> {
        None
    }
}
