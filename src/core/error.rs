//! Error types for the service facility

use crate::facility::FacilityState;
use std::fmt;

/// Result type for facility operations
pub type Result<T> = std::result::Result<T, FacilityError>;

/// Why an admission attempt was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RejectReason {
    /// Every seat in the waiting room was taken
    RoomFull,
    /// The facility (or its waiting room) was no longer admitting clients
    Closed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::RoomFull => write!(f, "waiting room is full"),
            RejectReason::Closed => write!(f, "facility is closed"),
        }
    }
}

/// Errors that can occur in the service facility
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FacilityError {
    /// Client turned away at admission. Expected and counted, never retried.
    #[error("Client #{client_id} turned away: {reason}")]
    Rejected {
        /// Sequence number of the rejected client
        client_id: u64,
        /// Why the client was turned away
        reason: RejectReason,
    },

    /// The close-for-day ordering contract was broken. Fatal.
    #[error("Shutdown protocol violation: {message}")]
    ProtocolViolation {
        /// What was observed
        message: String,
    },

    /// Operation requires an open facility
    #[error("Facility is not open (currently {state})")]
    NotOpen {
        /// State the facility was in
        state: FacilityState,
    },

    /// The arrival generator was already started
    #[error("Arrival generator is already running")]
    ArrivalsAlreadyRunning,

    /// Failed to spawn a facility thread
    #[error("Failed to spawn thread '{name}': {message}")]
    SpawnError {
        /// Name of the thread that failed to spawn
        name: String,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a facility thread
    #[error("Failed to join thread '{name}': {message}")]
    JoinError {
        /// Name of the thread that failed to join
        name: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },
}

impl FacilityError {
    /// Create a rejection error
    pub fn rejected(client_id: u64, reason: RejectReason) -> Self {
        FacilityError::Rejected { client_id, reason }
    }

    /// Create a protocol violation error
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        FacilityError::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Create a not open error
    pub fn not_open(state: FacilityState) -> Self {
        FacilityError::NotOpen { state }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        name: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        FacilityError::SpawnError {
            name: name.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(name: impl Into<String>, message: impl Into<String>) -> Self {
        FacilityError::JoinError {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        FacilityError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Whether this is an expected admission rejection rather than a failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, FacilityError::Rejected { .. })
    }

    /// Whether this error means the shutdown ordering was broken
    pub fn is_fatal(&self) -> bool {
        matches!(self, FacilityError::ProtocolViolation { .. })
    }
}
