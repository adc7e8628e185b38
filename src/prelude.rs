//! Convenient re-exports for common types and traits

pub use crate::core::{Client, DelayRange, DelaySource, FacilityError, RejectReason, Result};
pub use crate::events::{EventSink, FacilityEvent};
pub use crate::facility::{
    Admission, ArrivalConfig, Facility, FacilityConfig, FacilityState, ShutdownReport,
};
pub use crate::pool::WorkerState;
pub use crate::room::{RoomError, WaitingRoom};
