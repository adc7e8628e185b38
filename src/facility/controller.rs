//! Facility controller implementation

use super::arrivals::{Admission, ArrivalGenerator};
use super::{ArrivalConfig, FacilityConfig, FacilityState, FacilityStats, StatsSnapshot};
use crate::core::{Client, DelaySource, FacilityError, RandomDelay, RejectReason, Result};
use crate::events::{EventSink, FacilityEvent, LogSink};
use crate::pool::{Worker, WorkerAck, WorkerContext, WorkerState, WorkerStats};
use crate::room::WaitingRoom;
use chrono::{DateTime, Utc};
use crossbeam_channel::{self as channel, Receiver, Sender};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Admission side of the facility, shared with the arrival generator.
struct FrontDesk {
    state: AtomicU8,
    room: Arc<WaitingRoom>,
    stats: Arc<FacilityStats>,
    sink: Arc<dyn EventSink>,
}

impl FrontDesk {
    fn state(&self) -> FacilityState {
        FacilityState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn begin_closing(&self) -> Result<()> {
        self.state
            .compare_exchange(
                FacilityState::Open as u8,
                FacilityState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|current| FacilityError::not_open(FacilityState::from_u8(current)))
    }

    fn mark_closed(&self) {
        self.state
            .store(FacilityState::Closed as u8, Ordering::Release);
    }

    fn turn_away(&self, client: &Client, reason: RejectReason) -> FacilityError {
        match reason {
            RejectReason::RoomFull => self.stats.record_turned_away_full(),
            RejectReason::Closed => self.stats.record_turned_away_closed(),
        }
        self.sink.on_event(&FacilityEvent::TurnedAway {
            client: client.id(),
            reason,
        });
        FacilityError::rejected(client.id(), reason)
    }
}

impl Admission for FrontDesk {
    fn add_client(&self, client: Client) -> Result<()> {
        self.stats.record_arrival();
        self.sink
            .on_event(&FacilityEvent::Arrived { client: client.id() });

        if self.state() != FacilityState::Open {
            return Err(self.turn_away(&client, RejectReason::Closed));
        }

        let id = client.id();
        match self.room.try_enqueue(client) {
            Ok(()) => {
                self.stats.record_seated();
                self.sink.on_event(&FacilityEvent::Seated { client: id });
                Ok(())
            }
            Err(e) => Err(self.turn_away(e.client(), e.reason())),
        }
    }
}

/// Workers plus the sender half their acknowledgments are cloned from.
///
/// Kept under one lock so that a worker added while open is always counted by
/// a concurrent close.
struct Crew {
    workers: Vec<Worker>,
    acks: Option<Sender<WorkerAck>>,
}

/// Outcome of closing for the day
#[derive(Debug, Clone, Serialize)]
pub struct ShutdownReport {
    /// When the last acknowledgment was collected
    pub closed_at: DateTime<Utc>,
    /// One acknowledgment per worker, in the order received
    pub acknowledgments: Vec<WorkerAck>,
    /// Clients produced by the arrival generator, if one was running
    pub arrivals_generated: Option<u64>,
    /// Final counters
    pub stats: StatsSnapshot,
}

impl ShutdownReport {
    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builder for a [`Facility`] with custom collaborators
pub struct FacilityBuilder {
    config: FacilityConfig,
    sink: Arc<dyn EventSink>,
    delays: Arc<dyn DelaySource>,
}

impl FacilityBuilder {
    /// Start from a configuration, logging events and using random delays
    pub fn new(config: FacilityConfig) -> Self {
        Self {
            config,
            sink: Arc::new(LogSink),
            delays: Arc::new(RandomDelay),
        }
    }

    /// Send events to `sink` instead of the log
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Draw service and arrival delays from `delays`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn delay_source(mut self, delays: Arc<dyn DelaySource>) -> Self {
        self.delays = delays;
        self
    }

    /// Open the facility, spawning one worker per configured name
    pub fn open(self) -> Result<Facility> {
        Facility::open_with(self.config, self.sink, self.delays)
    }
}

/// A bounded waiting room served by a pool of worker threads.
///
/// # Shutdown Mechanism
///
/// [`close_for_day`](Self::close_for_day) is an explicit ordered sequence:
/// stop arrivals, close the room, collect exactly one acknowledgment per
/// worker. Clients seated before the room closes are still served.
pub struct Facility {
    config: FacilityConfig,
    desk: Arc<FrontDesk>,
    delays: Arc<dyn DelaySource>,
    crew: Mutex<Crew>,
    acks: Receiver<WorkerAck>,
    arrivals: Mutex<Option<ArrivalGenerator>>,
}

impl std::fmt::Debug for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Facility")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("room", &self.desk.room)
            .finish()
    }
}

impl Facility {
    /// Open a facility with default collaborators
    pub fn open(config: FacilityConfig) -> Result<Self> {
        FacilityBuilder::new(config).open()
    }

    /// Customize collaborators before opening
    pub fn builder(config: FacilityConfig) -> FacilityBuilder {
        FacilityBuilder::new(config)
    }

    fn open_with(
        config: FacilityConfig,
        sink: Arc<dyn EventSink>,
        delays: Arc<dyn DelaySource>,
    ) -> Result<Self> {
        config.validate()?;

        let desk = Arc::new(FrontDesk {
            state: AtomicU8::new(FacilityState::Open as u8),
            room: Arc::new(WaitingRoom::new(config.capacity)),
            stats: Arc::new(FacilityStats::new()),
            sink,
        });
        let (ack_tx, acks) = channel::unbounded();

        let facility = Self {
            config,
            desk,
            delays,
            crew: Mutex::new(Crew {
                workers: Vec::new(),
                acks: Some(ack_tx),
            }),
            acks,
            arrivals: Mutex::new(None),
        };

        for name in facility.config.worker_names.clone() {
            if let Err(e) = facility.add_worker(name) {
                // Drop runs the normal close, so workers already spawned go home
                log::error!("failed to staff facility: {}", e);
                return Err(e);
            }
        }

        facility.desk.sink.on_event(&FacilityEvent::Opened {
            capacity: facility.config.capacity,
            workers: facility.num_workers(),
        });
        log::debug!(
            "facility open: {} seats, {} workers",
            facility.config.capacity,
            facility.num_workers()
        );

        Ok(facility)
    }

    fn worker_context(&self, acks: Sender<WorkerAck>) -> WorkerContext {
        WorkerContext {
            room: Arc::clone(&self.desk.room),
            service_time: self.config.service_time,
            delays: Arc::clone(&self.delays),
            sink: Arc::clone(&self.desk.sink),
            stats: Arc::clone(&self.desk.stats),
            acks,
        }
    }

    /// Put another worker on shift.
    ///
    /// Only possible while open. Close for the day waits for this worker's
    /// acknowledgment as well.
    pub fn add_worker(&self, name: impl Into<String>) -> Result<()> {
        let mut crew = self.crew.lock();
        let state = self.state();
        if state != FacilityState::Open {
            return Err(FacilityError::not_open(state));
        }
        let Some(acks) = crew.acks.clone() else {
            return Err(FacilityError::not_open(state));
        };

        let id = crew.workers.len();
        let worker = Worker::spawn(id, name, self.worker_context(acks))?;
        crew.workers.push(worker);
        Ok(())
    }

    /// Try to seat a client.
    ///
    /// Never blocks. A full room or a facility that is no longer open turns
    /// the client away with [`FacilityError::Rejected`]; the client is lost.
    pub fn add_client(&self, client: Client) -> Result<()> {
        self.desk.add_client(client)
    }

    /// Start generating arrivals on a dedicated thread.
    ///
    /// The generator is stopped as the first step of
    /// [`close_for_day`](Self::close_for_day).
    pub fn start_arrivals(&self, config: ArrivalConfig) -> Result<()> {
        let mut arrivals = self.arrivals.lock();
        let state = self.state();
        if state != FacilityState::Open {
            return Err(FacilityError::not_open(state));
        }
        if arrivals.is_some() {
            return Err(FacilityError::ArrivalsAlreadyRunning);
        }

        let target: Arc<dyn Admission> = self.desk.clone();
        *arrivals = Some(ArrivalGenerator::spawn(
            target,
            config,
            Arc::clone(&self.delays),
        )?);
        Ok(())
    }

    /// Close for the day and wait until every worker has gone home.
    ///
    /// # Ordering
    ///
    /// 1. The arrival generator is stopped and joined.
    /// 2. The waiting room is closed; seated clients are still served.
    /// 3. Exactly one acknowledgment per worker is collected.
    ///
    /// # Errors
    ///
    /// [`FacilityError::NotOpen`] if closing already started.
    /// [`FacilityError::ProtocolViolation`] if the room was closed behind the
    /// controller's back, a worker vanished without acknowledging, or an
    /// unexpected acknowledgment showed up. The facility still ends up
    /// closed in that case.
    pub fn close_for_day(&self) -> Result<ShutdownReport> {
        self.desk.begin_closing()?;
        self.desk.sink.on_event(&FacilityEvent::Closing);

        let mut violations = Vec::new();

        let generator = self.arrivals.lock().take();
        let arrivals_generated = match generator {
            Some(generator) => match generator.stop() {
                Ok(generated) => Some(generated),
                Err(e) => {
                    log::error!("arrival generator did not stop cleanly: {}", e);
                    None
                }
            },
            None => None,
        };

        if !self.desk.room.close() {
            violations.push("waiting room was already closed".to_string());
        }

        let workers = {
            let mut crew = self.crew.lock();
            // Only the workers hold senders from here on
            crew.acks = None;
            std::mem::take(&mut crew.workers)
        };
        let expected = workers.len();

        let mut acknowledgments = Vec::with_capacity(expected);
        while acknowledgments.len() < expected {
            match self.acks.recv() {
                Ok(ack) => {
                    log::debug!(
                        "{} acknowledged ({}/{})",
                        ack.name,
                        acknowledgments.len() + 1,
                        expected
                    );
                    acknowledgments.push(ack);
                }
                Err(_) => {
                    violations.push(format!(
                        "acknowledgments stopped after {}/{} workers",
                        acknowledgments.len(),
                        expected
                    ));
                    break;
                }
            }
        }

        for worker in workers {
            if let Err(e) = worker.join() {
                violations.push(e.to_string());
            }
        }

        // Every sender is gone now, so anything left over is an extra acknowledgment
        while let Ok(extra) = self.acks.try_recv() {
            violations.push(format!("unexpected acknowledgment from {}", extra.name));
        }

        self.desk.mark_closed();
        let stats = self.desk.stats.snapshot();
        self.desk.sink.on_event(&FacilityEvent::Closed {
            served: stats.served,
            turned_away: stats.turned_away(),
        });

        if !violations.is_empty() {
            let message = violations.join("; ");
            log::error!("close for the day broke protocol: {}", message);
            return Err(FacilityError::protocol_violation(message));
        }

        Ok(ShutdownReport {
            closed_at: Utc::now(),
            acknowledgments,
            arrivals_generated,
            stats,
        })
    }

    /// Close for the day from a separate thread once `delay` has passed.
    pub fn close_after(
        self: &Arc<Self>,
        delay: Duration,
    ) -> Result<thread::JoinHandle<Result<ShutdownReport>>> {
        let facility = Arc::clone(self);
        thread::Builder::new()
            .name("closer".to_string())
            .spawn(move || {
                thread::sleep(delay);
                facility.close_for_day()
            })
            .map_err(|e| FacilityError::spawn_with_source("closer", "Cannot create closer thread", e))
    }

    /// Close for the day once the configured `time_open` has passed.
    pub fn close_after_time_open(
        self: &Arc<Self>,
    ) -> Result<thread::JoinHandle<Result<ShutdownReport>>> {
        self.close_after(self.config.time_open)
    }

    /// Current lifecycle state
    pub fn state(&self) -> FacilityState {
        self.desk.state()
    }

    /// Check if the facility is admitting clients
    pub fn is_open(&self) -> bool {
        self.state() == FacilityState::Open
    }

    /// Configuration the facility was opened with
    pub fn config(&self) -> &FacilityConfig {
        &self.config
    }

    /// Seats in the waiting room
    pub fn capacity(&self) -> usize {
        self.desk.room.capacity()
    }

    /// Clients currently seated (approximate)
    ///
    /// The value may change between checking and using it.
    pub fn waiting(&self) -> usize {
        self.desk.room.len()
    }

    /// Workers currently on shift
    pub fn num_workers(&self) -> usize {
        self.crew.lock().workers.len()
    }

    /// Name and state of every worker on shift
    pub fn worker_states(&self) -> Vec<(String, WorkerState)> {
        self.crew
            .lock()
            .workers
            .iter()
            .map(|w| (w.name().to_string(), w.state()))
            .collect()
    }

    /// Get statistics for all workers on shift
    pub fn worker_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.crew.lock().workers.iter().map(|w| w.stats()).collect()
    }

    /// Snapshot of the facility-wide counters
    pub fn stats(&self) -> StatsSnapshot {
        self.desk.stats.snapshot()
    }
}

impl Admission for Facility {
    fn add_client(&self, client: Client) -> Result<()> {
        self.desk.add_client(client)
    }
}

impl Drop for Facility {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close_for_day() {
                log::error!("failed to close facility during drop: {}", e);
            }
        }
    }
}
