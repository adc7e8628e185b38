//! Status events emitted by the facility.
//!
//! Events are purely observational: nothing a sink does feeds back into
//! admission, service or shutdown. The default [`LogSink`] renders each
//! event as a human-readable line through the `log` facade.
//!
//! ```rust
//! use service_facility::events::{EventSink, FacilityEvent, RecordingSink};
//!
//! let sink = RecordingSink::new();
//! sink.on_event(&FacilityEvent::Arrived { client: 1 });
//! assert_eq!(sink.events().len(), 1);
//! ```

use crate::core::RejectReason;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Something observable that happened in the facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FacilityEvent {
    /// The facility opened its doors
    Opened {
        /// Seats in the waiting room
        capacity: usize,
        /// Workers on shift
        workers: usize,
    },
    /// A worker started its shift
    WorkerStarted {
        /// Worker name
        worker: String,
    },
    /// A client walked in
    Arrived {
        /// Client sequence number
        client: u64,
    },
    /// A client took a seat in the waiting room
    Seated {
        /// Client sequence number
        client: u64,
    },
    /// A client left without being seated
    TurnedAway {
        /// Client sequence number
        client: u64,
        /// Why the client could not be seated
        reason: RejectReason,
    },
    /// A worker found the room empty and is waiting for a client
    Napping {
        /// Worker name
        worker: String,
    },
    /// A napping worker was woken by a client
    WokeUp {
        /// Worker name
        worker: String,
        /// Client sequence number
        client: u64,
    },
    /// A worker began serving a client
    Serving {
        /// Worker name
        worker: String,
        /// Client sequence number
        client: u64,
    },
    /// A worker finished serving a client
    Finished {
        /// Worker name
        worker: String,
        /// Client sequence number
        client: u64,
    },
    /// A worker observed the closed, drained room and left
    WentHome {
        /// Worker name
        worker: String,
    },
    /// Close for the day has started
    Closing,
    /// Every worker has acknowledged and the facility is closed
    Closed {
        /// Clients served during the day
        served: u64,
        /// Clients turned away during the day
        turned_away: u64,
    },
}

impl fmt::Display for FacilityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityEvent::Opened { capacity, workers } => write!(
                f,
                "The facility is open with {} seats and {} workers",
                capacity, workers
            ),
            FacilityEvent::WorkerStarted { worker } => {
                write!(f, "{} goes to the waiting room to check for clients", worker)
            }
            FacilityEvent::Arrived { client } => write!(f, "*** Client #{} arrives", client),
            FacilityEvent::Seated { client } => {
                write!(f, "Client #{} takes a seat in the waiting room", client)
            }
            FacilityEvent::TurnedAway { client, reason } => {
                write!(f, "Client #{} leaves: {}", client, reason)
            }
            FacilityEvent::Napping { worker } => {
                write!(f, "No client to serve, {} takes a nap", worker)
            }
            FacilityEvent::WokeUp { worker, client } => {
                write!(f, "Client #{} wakes up {}", client, worker)
            }
            FacilityEvent::Serving { worker, client } => {
                write!(f, "{} is serving Client #{}", worker, client)
            }
            FacilityEvent::Finished { worker, client } => {
                write!(f, "{} is finished serving Client #{}", worker, client)
            }
            FacilityEvent::WentHome { worker } => write!(f, "{} is going home", worker),
            FacilityEvent::Closing => write!(f, "Closing for the day"),
            FacilityEvent::Closed {
                served,
                turned_away,
            } => write!(
                f,
                "The facility is closed for the day ({} served, {} turned away) and everyone has gone home",
                served, turned_away
            ),
        }
    }
}

/// Receives facility events
pub trait EventSink: Send + Sync {
    /// Called for every event, from whichever thread produced it
    fn on_event(&self, event: &FacilityEvent);
}

/// Writes events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_event(&self, event: &FacilityEvent) {
        match event {
            FacilityEvent::TurnedAway { .. } => log::warn!("{}", event),
            FacilityEvent::Napping { .. } | FacilityEvent::WokeUp { .. } => {
                log::debug!("{}", event)
            }
            _ => log::info!("{}", event),
        }
    }
}

/// Keeps every event in memory, in the order received
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FacilityEvent>>,
    recorded: Condvar,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<FacilityEvent> {
        self.events.lock().clone()
    }

    /// Count recorded events matching `predicate`
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&FacilityEvent) -> bool,
    {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    /// Block until an event matching `predicate` has been recorded.
    ///
    /// Returns `false` if none shows up within `timeout`.
    pub fn wait_for<F>(&self, predicate: F, timeout: Duration) -> bool
    where
        F: Fn(&FacilityEvent) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock();
        loop {
            if events.iter().any(&predicate) {
                return true;
            }
            if self.recorded.wait_until(&mut events, deadline).timed_out() {
                return events.iter().any(&predicate);
            }
        }
    }
}

impl EventSink for RecordingSink {
    fn on_event(&self, event: &FacilityEvent) {
        self.events.lock().push(event.clone());
        self.recorded.notify_all();
    }
}
