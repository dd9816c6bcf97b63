//! Scheduler configuration.

use std::time::Duration;

/// Tuning knobs for the work loop.
///
/// ```ignore
/// let config = SchedulerConfig::default()
///     .with_frame_budget(Duration::from_millis(16))
///     .with_yield_threshold(Duration::from_millis(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Slice length used when the host cannot report remaining idle time.
    pub frame_budget: Duration,
    /// The loop yields once less than this remains in the current slice.
    pub yield_threshold: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_budget: Duration::from_millis(50),
            yield_threshold: Duration::from_millis(1),
        }
    }
}

impl SchedulerConfig {
    /// Set the fallback slice length.
    pub fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.frame_budget = budget;
        self
    }

    /// Set the remaining-time threshold below which the loop yields.
    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.frame_budget, Duration::from_millis(50));
        assert_eq!(config.yield_threshold, Duration::from_millis(1));
    }

    #[test]
    fn test_builders() {
        let config = SchedulerConfig::default()
            .with_frame_budget(Duration::from_millis(16))
            .with_yield_threshold(Duration::ZERO);
        assert_eq!(config.frame_budget, Duration::from_millis(16));
        assert_eq!(config.yield_threshold, Duration::ZERO);
    }
}
