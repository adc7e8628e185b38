//! Delay sources for service and inter-arrival times

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An inclusive range of durations.
///
/// A fixed duration is a range whose bounds are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Shortest delay
    pub min: Duration,
    /// Longest delay
    pub max: Duration,
}

impl DelayRange {
    /// Create a range, swapping the bounds if given in the wrong order
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A range that always yields `duration`
    pub fn fixed(duration: Duration) -> Self {
        Self {
            min: duration,
            max: duration,
        }
    }

    /// Range in milliseconds
    pub fn from_millis(min: u64, max: u64) -> Self {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    /// Whether both bounds are equal
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Whether `duration` lies within the range
    pub fn contains(&self, duration: Duration) -> bool {
        duration >= self.min && duration <= self.max
    }
}

/// Supplies delays for simulated work and arrivals.
///
/// Implementations must return a value within `[min, max]`.
pub trait DelaySource: Send + Sync {
    /// Pick a delay between `min` and `max` inclusive
    fn random_delay(&self, min: Duration, max: Duration) -> Duration;

    /// Pick a delay within `range`
    fn delay_in(&self, range: DelayRange) -> Duration {
        self.random_delay(range.min, range.max)
    }
}

/// Uniformly random delays backed by `fastrand`
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDelay;

impl DelaySource for RandomDelay {
    fn random_delay(&self, min: Duration, max: Duration) -> Duration {
        if min >= max {
            return min;
        }
        let span = (max - min).as_micros().min(u128::from(u64::MAX)) as u64;
        min + Duration::from_micros(fastrand::u64(0..=span))
    }
}

/// Always returns the lower bound. Useful for deterministic runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinimumDelay;

impl DelaySource for MinimumDelay {
    fn random_delay(&self, min: Duration, _max: Duration) -> Duration {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_orders_bounds() {
        let range = DelayRange::from_millis(200, 50);
        assert_eq!(range.min, Duration::from_millis(50));
        assert_eq!(range.max, Duration::from_millis(200));
        assert!(!range.is_fixed());
        assert!(DelayRange::fixed(Duration::from_secs(1)).is_fixed());
    }

    #[test]
    fn test_random_delay_within_range() {
        let range = DelayRange::from_millis(10, 20);
        for _ in 0..1000 {
            let d = RandomDelay.delay_in(range);
            assert!(range.contains(d), "{:?} outside {:?}", d, range);
        }
    }

    #[test]
    fn test_random_delay_fixed() {
        let d = Duration::from_millis(5);
        assert_eq!(RandomDelay.random_delay(d, d), d);
        assert_eq!(MinimumDelay.delay_in(DelayRange::from_millis(3, 9)), Duration::from_millis(3));
    }
}
