//! Client type admitted to the waiting room

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A client visiting the facility.
///
/// Immutable once created. A client is either delivered to exactly one
/// worker or handed back by the waiting room on rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    id: u64,
    arrived_at: DateTime<Utc>,
}

impl Client {
    /// Create a client arriving now
    pub fn new(id: u64) -> Self {
        Self::arriving_at(id, Utc::now())
    }

    /// Create a client with an explicit arrival timestamp
    pub fn arriving_at(id: u64, arrived_at: DateTime<Utc>) -> Self {
        Self { id, arrived_at }
    }

    /// Sequence number of this client
    pub fn id(&self) -> u64 {
        self.id
    }

    /// When the client arrived at the facility
    pub fn arrived_at(&self) -> DateTime<Utc> {
        self.arrived_at
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client #{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_client_display() {
        let client = Client::new(12);
        assert_eq!(client.id(), 12);
        assert_eq!(client.to_string(), "Client #12");
    }

    #[test]
    fn test_client_serializes_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let client = Client::arriving_at(1, at);

        let json = serde_json::to_string(&client).unwrap();
        assert!(json.contains("2024-03-01T09:30:00Z"));

        let back: Client = serde_json::from_str(&json).unwrap();
        assert_eq!(back, client);
    }
}
