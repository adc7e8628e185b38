//! Worker thread implementation

use crate::core::{DelayRange, DelaySource, FacilityError, Result};
use crate::events::{EventSink, FacilityEvent};
use crate::facility::FacilityStats;
use crate::room::WaitingRoom;
use crossbeam_channel::Sender;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// What a worker is doing right now.
///
/// Derived from the worker's own loop and never set from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum WorkerState {
    /// Between clients, possibly asleep on an empty room
    WaitingForClient = 0,
    /// In the middle of a service
    Serving = 1,
    /// Saw the closed, drained room and left
    Terminated = 2,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::WaitingForClient,
            1 => WorkerState::Serving,
            _ => WorkerState::Terminated,
        }
    }
}

/// Termination acknowledgment, sent exactly once when a worker stops for good
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerAck {
    /// Worker index
    pub worker_id: usize,
    /// Worker name
    pub name: String,
    /// Clients this worker served
    pub clients_served: u64,
}

/// Statistics for a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of clients served
    pub clients_served: AtomicU64,
    /// Total time spent serving (microseconds)
    pub total_service_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    fn record_service(&self, elapsed: Duration) {
        self.clients_served.fetch_add(1, Ordering::Relaxed);
        self.total_service_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Get total clients served
    pub fn get_clients_served(&self) -> u64 {
        self.clients_served.load(Ordering::Relaxed)
    }

    /// Get average service time per client in microseconds
    pub fn get_average_service_time_us(&self) -> f64 {
        let total = self.total_service_time_us.load(Ordering::Relaxed);
        let count = self.clients_served.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// Everything a worker thread needs from its facility
#[derive(Clone)]
pub struct WorkerContext {
    /// Room to take clients from
    pub room: Arc<WaitingRoom>,
    /// How long one service takes
    pub service_time: DelayRange,
    /// Picks each service duration from `service_time`
    pub delays: Arc<dyn DelaySource>,
    /// Receives status events
    pub sink: Arc<dyn EventSink>,
    /// Facility-wide counters
    pub stats: Arc<FacilityStats>,
    /// Where the termination acknowledgment goes
    pub acks: Sender<WorkerAck>,
}

impl std::fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContext")
            .field("room", &self.room)
            .field("service_time", &self.service_time)
            .finish_non_exhaustive()
    }
}

/// A worker thread that serves clients from the waiting room
#[derive(Debug)]
pub struct Worker {
    id: usize,
    name: String,
    state: Arc<AtomicU8>,
    stats: Arc<WorkerStats>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker thread.
    ///
    /// The worker starts in [`WorkerState::WaitingForClient`] and keeps
    /// serving until the room is closed and drained. It then sends exactly
    /// one [`WorkerAck`] on `ctx.acks` and exits.
    pub fn spawn(id: usize, name: impl Into<String>, ctx: WorkerContext) -> Result<Self> {
        let name = name.into();
        let state = Arc::new(AtomicU8::new(WorkerState::WaitingForClient as u8));
        let stats = Arc::new(WorkerStats::new());

        let thread_name = name.clone();
        let thread_state = Arc::clone(&state);
        let thread_stats = Arc::clone(&stats);
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || Self::run(id, thread_name, thread_state, thread_stats, ctx))
            .map_err(|e| {
                FacilityError::spawn_with_source(&name, "Cannot create worker thread", e)
            })?;

        Ok(Self {
            id,
            name,
            state,
            stats,
            thread: Some(thread),
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| FacilityError::join(&self.name, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop
    fn run(
        id: usize,
        name: String,
        state: Arc<AtomicU8>,
        stats: Arc<WorkerStats>,
        ctx: WorkerContext,
    ) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("worker", id = id, name = %name).entered();

        ctx.sink.on_event(&FacilityEvent::WorkerStarted {
            worker: name.clone(),
        });

        let mut napping = false;
        loop {
            // Display only: the room may fill or empty before dequeue runs
            if ctx.room.is_empty() {
                ctx.sink.on_event(&FacilityEvent::Napping {
                    worker: name.clone(),
                });
                napping = true;
            }

            let Some(client) = ctx.room.dequeue() else {
                break;
            };

            if napping {
                ctx.sink.on_event(&FacilityEvent::WokeUp {
                    worker: name.clone(),
                    client: client.id(),
                });
                napping = false;
            }

            state.store(WorkerState::Serving as u8, Ordering::Release);
            ctx.sink.on_event(&FacilityEvent::Serving {
                worker: name.clone(),
                client: client.id(),
            });

            let service = ctx.delays.delay_in(ctx.service_time);
            thread::sleep(service);

            stats.record_service(service);
            ctx.stats.record_served();
            ctx.sink.on_event(&FacilityEvent::Finished {
                worker: name.clone(),
                client: client.id(),
            });
            state.store(WorkerState::WaitingForClient as u8, Ordering::Release);
        }

        state.store(WorkerState::Terminated as u8, Ordering::Release);
        ctx.sink.on_event(&FacilityEvent::WentHome {
            worker: name.clone(),
        });

        let ack = WorkerAck {
            worker_id: id,
            name,
            clients_served: stats.get_clients_served(),
        };
        log::debug!(
            "worker {} acknowledging termination after {} clients",
            ack.name,
            ack.clients_served
        );
        if ctx.acks.send(ack).is_err() {
            log::error!("worker {} could not acknowledge: nobody is listening", id);
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if !thread.is_finished() {
                // Joining here would hang while the room is still open
                log::warn!(
                    "worker {} dropped while still running; detaching thread",
                    self.name
                );
                return;
            }
            if thread.join().is_err() {
                log::error!("worker {} panicked before shutdown", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Client, MinimumDelay};
    use crate::events::RecordingSink;
    use crossbeam_channel::{unbounded, Receiver};

    fn context(
        room: &Arc<WaitingRoom>,
        service_ms: u64,
    ) -> (WorkerContext, Receiver<WorkerAck>, Arc<RecordingSink>) {
        let (acks, ack_rx) = unbounded();
        let sink = Arc::new(RecordingSink::new());
        let ctx = WorkerContext {
            room: Arc::clone(room),
            service_time: DelayRange::fixed(Duration::from_millis(service_ms)),
            delays: Arc::new(MinimumDelay),
            sink: sink.clone(),
            stats: Arc::new(FacilityStats::new()),
            acks,
        };
        (ctx, ack_rx, sink)
    }

    #[test]
    fn test_worker_acknowledges_once_on_close() {
        let room = Arc::new(WaitingRoom::new(4));
        let (ctx, ack_rx, _sink) = context(&room, 1);

        let worker = Worker::spawn(0, "Saha", ctx).expect("Failed to spawn worker");
        assert_eq!(worker.name(), "Saha");

        room.close();
        let ack = ack_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("no acknowledgment");
        assert_eq!(ack.worker_id, 0);
        assert_eq!(ack.clients_served, 0);

        worker.join().expect("Failed to join worker");
        // The only sender went away with the thread
        assert!(ack_rx.recv().is_err());
    }

    #[test]
    fn test_worker_serves_then_terminates() {
        let room = Arc::new(WaitingRoom::new(4));
        let (ctx, ack_rx, sink) = context(&room, 5);
        let facility_stats = Arc::clone(&ctx.stats);

        let worker = Worker::spawn(1, "Aditya", ctx).expect("Failed to spawn worker");
        let stats = worker.stats();

        room.try_enqueue(Client::new(1)).unwrap();
        room.try_enqueue(Client::new(2)).unwrap();
        room.close();

        let ack = ack_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("no acknowledgment");
        assert_eq!(ack.clients_served, 2);
        assert_eq!(worker.state(), WorkerState::Terminated);
        worker.join().expect("Failed to join worker");

        assert_eq!(stats.get_clients_served(), 2);
        assert!(stats.get_average_service_time_us() >= 5000.0);
        assert_eq!(facility_stats.served(), 2);

        let events = sink.events();
        assert_eq!(
            sink.count(|e| matches!(e, FacilityEvent::Finished { .. })),
            2
        );
        assert!(matches!(events.last(), Some(FacilityEvent::WentHome { .. })));
    }

    #[test]
    fn test_worker_state_while_serving() {
        let room = Arc::new(WaitingRoom::new(1));
        let (ctx, ack_rx, sink) = context(&room, 200);

        let worker = Worker::spawn(2, "Khetan", ctx).expect("Failed to spawn worker");
        assert_ne!(worker.state(), WorkerState::Terminated);

        room.try_enqueue(Client::new(1)).unwrap();
        // State is stored before the event goes out
        assert!(sink.wait_for(
            |e| matches!(e, FacilityEvent::Serving { client: 1, .. }),
            Duration::from_secs(2)
        ));
        assert_eq!(worker.state(), WorkerState::Serving);

        room.close();
        ack_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("no acknowledgment");
        worker.join().expect("Failed to join worker");
    }

    #[test]
    fn test_napping_then_woken() {
        let room = Arc::new(WaitingRoom::new(2));
        let (ctx, ack_rx, sink) = context(&room, 1);

        let worker = Worker::spawn(0, "Saha", ctx).expect("Failed to spawn worker");
        assert!(sink.wait_for(
            |e| matches!(e, FacilityEvent::Napping { .. }),
            Duration::from_secs(2)
        ));
        room.try_enqueue(Client::new(7)).unwrap();
        room.close();
        ack_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("no acknowledgment");
        worker.join().expect("Failed to join worker");

        assert!(sink.events().contains(&FacilityEvent::WokeUp {
            worker: "Saha".to_string(),
            client: 7,
        }));
        assert!(sink.count(|e| matches!(e, FacilityEvent::Napping { .. })) >= 1);
    }
}
