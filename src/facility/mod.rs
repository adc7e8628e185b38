//! The facility controller and its collaborators.
//!
//! A [`Facility`] owns the waiting room and the workers. It admits clients
//! while open and closes for the day in a fixed order:
//!
//! 1. stop the arrival generator and wait until it has seen the signal,
//! 2. close the waiting room (exactly once),
//! 3. wait for one termination acknowledgment per worker.
//!
//! ```rust
//! use service_facility::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = FacilityConfig::new(2)
//!     .with_capacity(4)
//!     .with_service_time(DelayRange::fixed(Duration::from_millis(5)));
//! let facility = Facility::open(config)?;
//!
//! facility.add_client(Client::new(1))?;
//! facility.add_client(Client::new(2))?;
//!
//! let report = facility.close_for_day()?;
//! assert_eq!(report.acknowledgments.len(), 2);
//! assert_eq!(report.stats.served, 2);
//! assert!(facility.add_client(Client::new(3)).is_err());
//! # Ok(())
//! # }
//! ```

mod arrivals;
mod config;
mod controller;
mod stats;

pub use arrivals::{Admission, ArrivalGenerator};
pub use config::{ArrivalConfig, FacilityConfig};
pub use controller::{Facility, FacilityBuilder, ShutdownReport};
pub use stats::{FacilityStats, StatsSnapshot};

use serde::Serialize;
use std::fmt;

/// Lifecycle of a facility. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum FacilityState {
    /// Admitting clients
    Open = 0,
    /// Close for the day in progress
    Closing = 1,
    /// Every worker has gone home
    Closed = 2,
}

impl FacilityState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => FacilityState::Open,
            1 => FacilityState::Closing,
            _ => FacilityState::Closed,
        }
    }
}

impl fmt::Display for FacilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityState::Open => write!(f, "open"),
            FacilityState::Closing => write!(f, "closing"),
            FacilityState::Closed => write!(f, "closed"),
        }
    }
}
