//! Arrival generator thread

use super::ArrivalConfig;
use crate::core::{Client, DelaySource, FacilityError, Result};
use crossbeam_channel::{self as channel, select, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Anything clients can be admitted to
pub trait Admission: Send + Sync {
    /// Try to admit `client`. Rejections are final.
    fn add_client(&self, client: Client) -> Result<()>;
}

/// Produces clients on its own thread until stopped.
///
/// The stop signal is a zero-capacity channel: [`stop`](Self::stop) returns
/// only once the generator has received it (or has already finished), and the
/// generator never admits another client after that point.
#[derive(Debug)]
pub struct ArrivalGenerator {
    stop: Option<Sender<()>>,
    thread: Option<thread::JoinHandle<u64>>,
}

impl ArrivalGenerator {
    /// Spawn the generator thread, admitting clients into `target`
    pub fn spawn<A>(target: Arc<A>, config: ArrivalConfig, delays: Arc<dyn DelaySource>) -> Result<Self>
    where
        A: Admission + ?Sized + 'static,
    {
        let (stop, stop_rx) = channel::bounded(0);
        let thread = thread::Builder::new()
            .name("arrivals".to_string())
            .spawn(move || Self::run(target, config, delays, stop_rx))
            .map_err(|e| {
                FacilityError::spawn_with_source("arrivals", "Cannot create arrival thread", e)
            })?;

        Ok(Self {
            stop: Some(stop),
            thread: Some(thread),
        })
    }

    /// Whether the generator has stopped on its own or been stopped
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Deliver the stop signal, wait for the thread and return how many
    /// clients it generated.
    pub fn stop(mut self) -> Result<u64> {
        if let Some(stop) = self.stop.take() {
            // Err only means the generator already ran out of arrivals
            let _ = stop.send(());
        }
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| FacilityError::join("arrivals", "Arrival generator panicked")),
            None => Ok(0),
        }
    }

    fn run<A>(
        target: Arc<A>,
        config: ArrivalConfig,
        delays: Arc<dyn DelaySource>,
        stop: Receiver<()>,
    ) -> u64
    where
        A: Admission + ?Sized,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("arrivals").entered();

        let mut generated = 0u64;
        let mut next_id = config.first_id;

        loop {
            if config.max_arrivals.is_some_and(|max| generated >= max) {
                log::debug!("arrival generator finished after {} clients", generated);
                break;
            }

            let wait = delays.delay_in(config.interval);
            select! {
                recv(stop) -> _ => break,
                recv(channel::after(wait)) -> _ => {
                    // A stop that became ready together with the timer wins
                    match stop.try_recv() {
                        Err(TryRecvError::Empty) => {}
                        _ => break,
                    }
                    let client = Client::new(next_id);
                    next_id += 1;
                    generated += 1;
                    // Rejections are counted by the target; nothing to retry
                    let _ = target.add_client(client);
                }
            }
        }

        generated
    }
}

impl Drop for ArrivalGenerator {
    fn drop(&mut self) {
        // Disconnecting the stop channel ends the loop at its next wait
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("arrival generator panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DelayRange, MinimumDelay, RejectReason};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        ids: Mutex<Vec<u64>>,
        stopped: AtomicBool,
    }

    impl Admission for Recorder {
        fn add_client(&self, client: Client) -> Result<()> {
            assert!(
                !self.stopped.load(Ordering::SeqCst),
                "client admitted after stop"
            );
            self.ids.lock().push(client.id());
            Ok(())
        }
    }

    #[test]
    fn test_generator_stops_at_max() {
        let target = Arc::new(Recorder::default());
        let config = ArrivalConfig::new(DelayRange::from_millis(1, 1))
            .with_max_arrivals(5)
            .with_first_id(10);

        let generator =
            ArrivalGenerator::spawn(Arc::clone(&target), config, Arc::new(MinimumDelay)).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(generator.is_finished());

        // Stopping a finished generator must not block
        assert_eq!(generator.stop().unwrap(), 5);
        assert_eq!(*target.ids.lock(), vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_no_arrivals_after_stop() {
        let target = Arc::new(Recorder::default());
        let config = ArrivalConfig::new(DelayRange::from_millis(1, 2));

        let generator =
            ArrivalGenerator::spawn(Arc::clone(&target), config, Arc::new(MinimumDelay)).unwrap();
        thread::sleep(Duration::from_millis(30));

        let generated = generator.stop().unwrap();
        target.stopped.store(true, Ordering::SeqCst);

        assert_eq!(generated as usize, target.ids.lock().len());
        thread::sleep(Duration::from_millis(20));
        assert_eq!(generated as usize, target.ids.lock().len());
    }

    #[test]
    fn test_stop_preempts_long_wait() {
        let target = Arc::new(Recorder::default());
        let config = ArrivalConfig::new(DelayRange::fixed(Duration::from_secs(60)));

        let generator =
            ArrivalGenerator::spawn(Arc::clone(&target), config, Arc::new(MinimumDelay)).unwrap();
        let start = std::time::Instant::now();
        assert_eq!(generator.stop().unwrap(), 0);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(target.ids.lock().is_empty());
    }

    #[test]
    fn test_rejections_do_not_stop_generator() {
        struct AlwaysFull;
        impl Admission for AlwaysFull {
            fn add_client(&self, client: Client) -> Result<()> {
                Err(FacilityError::rejected(client.id(), RejectReason::RoomFull))
            }
        }

        let config = ArrivalConfig::new(DelayRange::from_millis(1, 1)).with_max_arrivals(3);
        let generator =
            ArrivalGenerator::spawn(Arc::new(AlwaysFull), config, Arc::new(MinimumDelay)).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(generator.stop().unwrap(), 3);
    }
}
