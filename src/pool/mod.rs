//! Worker implementation

pub mod worker;

pub use worker::{Worker, WorkerAck, WorkerContext, WorkerState, WorkerStats};
