//! Facility-wide counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate counts for a facility's day.
///
/// Every counter is only ever touched through atomic increments, so any
/// thread may record into it without further locking.
#[derive(Debug, Default)]
pub struct FacilityStats {
    arrived: AtomicU64,
    seated: AtomicU64,
    turned_away_full: AtomicU64,
    turned_away_closed: AtomicU64,
    served: AtomicU64,
}

impl FacilityStats {
    /// Create zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_arrival(&self) {
        self.arrived.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_seated(&self) {
        self.seated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_turned_away_full(&self) {
        self.turned_away_full.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_turned_away_closed(&self) {
        self.turned_away_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_served(&self) {
        self.served.fetch_add(1, Ordering::Relaxed);
    }

    /// Clients that walked in, admitted or not
    pub fn arrived(&self) -> u64 {
        self.arrived.load(Ordering::Relaxed)
    }

    /// Clients that got a seat
    pub fn seated(&self) -> u64 {
        self.seated.load(Ordering::Relaxed)
    }

    /// Clients turned away for any reason
    pub fn turned_away(&self) -> u64 {
        self.turned_away_full.load(Ordering::Relaxed)
            + self.turned_away_closed.load(Ordering::Relaxed)
    }

    /// Clients whose service completed
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    /// Copy the counters into a plain value
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            arrived: self.arrived(),
            seated: self.seated(),
            turned_away_full: self.turned_away_full.load(Ordering::Relaxed),
            turned_away_closed: self.turned_away_closed.load(Ordering::Relaxed),
            served: self.served(),
        }
    }
}

/// Point-in-time copy of [`FacilityStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Clients that walked in
    pub arrived: u64,
    /// Clients that got a seat
    pub seated: u64,
    /// Clients turned away because every seat was taken
    pub turned_away_full: u64,
    /// Clients turned away because the facility was closing or closed
    pub turned_away_closed: u64,
    /// Clients whose service completed
    pub served: u64,
}

impl StatsSnapshot {
    /// Clients turned away for any reason
    pub fn turned_away(&self) -> u64 {
        self.turned_away_full + self.turned_away_closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_snapshot_totals() {
        let stats = FacilityStats::new();
        stats.record_arrival();
        stats.record_arrival();
        stats.record_arrival();
        stats.record_seated();
        stats.record_turned_away_full();
        stats.record_turned_away_closed();
        stats.record_served();

        let snap = stats.snapshot();
        assert_eq!(snap.arrived, 3);
        assert_eq!(snap.seated, 1);
        assert_eq!(snap.turned_away(), 2);
        assert_eq!(stats.turned_away(), 2);
        assert_eq!(snap.served, 1);
    }

    #[test]
    fn test_concurrent_increments() {
        let stats = Arc::new(FacilityStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_arrival();
                        stats.record_served();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.arrived(), 8000);
        assert_eq!(stats.served(), 8000);
    }
}
