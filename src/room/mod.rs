//! Bounded waiting room shared by the front desk and the workers.
//!
//! The [`WaitingRoom`] is the only shared mutable resource in the facility.
//! Admission never blocks, removal blocks until a client arrives or the room
//! has been closed and drained:
//!
//! ```rust
//! use service_facility::room::{RoomError, WaitingRoom};
//! use service_facility::Client;
//!
//! let room = WaitingRoom::new(1);
//! room.try_enqueue(Client::new(1)).unwrap();
//!
//! // Full: the client is handed back rather than queued
//! match room.try_enqueue(Client::new(2)) {
//!     Err(RoomError::Full(client)) => assert_eq!(client.id(), 2),
//!     _ => panic!("expected Full"),
//! }
//!
//! room.close();
//! assert_eq!(room.dequeue().map(|c| c.id()), Some(1));
//! assert!(room.dequeue().is_none());
//! ```

mod waiting_room;

pub use waiting_room::WaitingRoom;

use crate::core::{Client, RejectReason};
use std::fmt;

/// Admission failure, handing the client back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Every seat was taken
    Full(Client),
    /// The room was closed before the client got in
    Closed(Client),
}

impl RoomError {
    /// Recover the client that was not admitted
    pub fn into_client(self) -> Client {
        match self {
            RoomError::Full(client) | RoomError::Closed(client) => client,
        }
    }

    /// The client that was not admitted
    pub fn client(&self) -> &Client {
        match self {
            RoomError::Full(client) | RoomError::Closed(client) => client,
        }
    }

    /// Map to the reason recorded in statistics and errors
    pub fn reason(&self) -> RejectReason {
        match self {
            RoomError::Full(_) => RejectReason::RoomFull,
            RoomError::Closed(_) => RejectReason::Closed,
        }
    }
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not admitted: {}", self.client(), self.reason())
    }
}

impl std::error::Error for RoomError {}

/// Result type for room admission
pub type RoomResult<T> = std::result::Result<T, RoomError>;
