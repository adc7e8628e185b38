//! Core types shared by the waiting room, workers and the facility

pub mod client;
pub mod delay;
pub mod error;

pub use client::Client;
pub use delay::{DelayRange, DelaySource, MinimumDelay, RandomDelay};
pub use error::{FacilityError, RejectReason, Result};
