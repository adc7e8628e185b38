//! # Service Facility
//!
//! A bounded-capacity service facility on OS threads: clients arrive, wait in
//! a capacity-limited room, are served by a pool of workers, and the facility
//! closes for the day without losing track of any worker.
//!
//! ## Features
//!
//! - **Waiting Room**: Bounded FIFO that rejects instead of blocking when full
//! - **Sleeping Workers**: Workers nap on an empty room and report their state
//! - **Ordered Shutdown**: Stop arrivals, close the room once, collect one
//!   acknowledgment per worker
//! - **Arrival Generator**: Timed arrivals that a stop signal always preempts
//! - **Statistics**: Arrived, seated, turned away and served counters
//! - **Events**: Typed status events rendered through `log` or recorded
//!
//! ## Quick Start
//!
//! ```rust
//! use service_facility::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = FacilityConfig::new(3)
//!     .with_capacity(10)
//!     .with_service_time(DelayRange::from_millis(1, 5));
//! let facility = Facility::open(config)?;
//!
//! for id in 1..=5 {
//!     match facility.add_client(Client::new(id)) {
//!         Ok(()) => {}
//!         Err(e) if e.is_rejection() => println!("{}", e),
//!         Err(e) => return Err(e),
//!     }
//! }
//!
//! let report = facility.close_for_day()?;
//! assert_eq!(report.acknowledgments.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Timed Day With Generated Arrivals
//!
//! ```rust
//! use service_facility::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = FacilityConfig::default()
//!     .with_worker_names(["Saha", "Aditya", "Khetan"])
//!     .with_service_time(DelayRange::fixed(Duration::from_millis(10)));
//! let facility = Arc::new(Facility::open(config)?);
//!
//! facility.start_arrivals(ArrivalConfig::new(DelayRange::from_millis(0, 5)))?;
//! let closer = facility.close_after(Duration::from_millis(50))?;
//!
//! let report = closer.join().expect("closer panicked")?;
//! println!("{} served, {} turned away", report.stats.served, report.stats.turned_away());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod events;
pub mod facility;
pub mod pool;
pub mod prelude;
pub mod room;

pub use crate::core::{
    Client, DelayRange, DelaySource, FacilityError, MinimumDelay, RandomDelay, RejectReason,
    Result,
};
pub use events::{EventSink, FacilityEvent, LogSink, RecordingSink};
pub use facility::{
    Admission, ArrivalConfig, ArrivalGenerator, Facility, FacilityBuilder, FacilityConfig,
    FacilityState, FacilityStats, ShutdownReport, StatsSnapshot,
};
pub use pool::{Worker, WorkerAck, WorkerState, WorkerStats};
pub use room::{RoomError, WaitingRoom};
