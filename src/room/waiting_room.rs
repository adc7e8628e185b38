//! Bounded FIFO waiting room with close-and-drain semantics.

use super::{RoomError, RoomResult};
use crate::core::Client;
use crossbeam_channel::{self as channel, Receiver, Sender, TrySendError};
use parking_lot::RwLock;

/// A bounded FIFO of clients waiting for a worker.
///
/// Admission goes through the sender half of a bounded crossbeam channel held
/// behind a lock. Closing takes the sender out and drops it, so the channel
/// disconnects only after every already-seated client has been received.
/// Admission holds the read lock for the duration of its `try_send`, which
/// makes "enqueue after close" impossible rather than merely unlikely.
pub struct WaitingRoom {
    sender: RwLock<Option<Sender<Client>>>,
    receiver: Receiver<Client>,
    capacity: usize,
}

impl WaitingRoom {
    /// Creates a new waiting room with the given number of seats.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        let (sender, receiver) = channel::bounded(capacity);
        Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity,
        }
    }

    /// Number of seats.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Seat a client without blocking.
    ///
    /// Fails with [`RoomError::Full`] when every seat is taken and with
    /// [`RoomError::Closed`] once [`close`](Self::close) has run. The client is
    /// handed back in both cases.
    pub fn try_enqueue(&self, client: Client) -> RoomResult<()> {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            return Err(RoomError::Closed(client));
        };
        sender.try_send(client).map_err(|e| match e {
            TrySendError::Full(client) => RoomError::Full(client),
            TrySendError::Disconnected(client) => RoomError::Closed(client),
        })
    }

    /// Take the next client, blocking until one is seated.
    ///
    /// Returns `None` only when the room is closed and every seated client
    /// has already been handed out.
    pub fn dequeue(&self) -> Option<Client> {
        self.receiver.recv().ok()
    }

    /// Stop admitting clients.
    ///
    /// Returns `true` if this call closed the room, `false` if it was already
    /// closed. Seated clients stay retrievable until drained.
    pub fn close(&self) -> bool {
        self.sender.write().take().is_some()
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Number of seated clients.
    ///
    /// Display only: the value may change before the caller acts on it, so it
    /// must never stand in for [`try_enqueue`](Self::try_enqueue) or
    /// [`dequeue`](Self::dequeue).
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no client is seated (display only, see [`len`](Self::len)).
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl std::fmt::Debug for WaitingRoom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitingRoom")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_enqueue_dequeue_fifo() {
        let room = WaitingRoom::new(10);
        for id in 1..=5 {
            room.try_enqueue(Client::new(id)).unwrap();
        }
        let ids: Vec<u64> = (0..5).map(|_| room.dequeue().unwrap().id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _ = WaitingRoom::new(0);
    }

    #[test]
    fn test_capacity_one_rejects_second_and_third() {
        let room = WaitingRoom::new(1);
        assert!(room.try_enqueue(Client::new(1)).is_ok());

        match room.try_enqueue(Client::new(2)) {
            Err(RoomError::Full(client)) => assert_eq!(client.id(), 2),
            other => panic!("expected Full, got {:?}", other),
        }
        assert!(matches!(
            room.try_enqueue(Client::new(3)),
            Err(RoomError::Full(_))
        ));
        assert_eq!(room.len(), 1);
    }

    #[test]
    fn test_enqueue_after_close_rejected() {
        let room = WaitingRoom::new(4);
        assert!(room.close());
        assert!(room.is_closed());

        match room.try_enqueue(Client::new(9)) {
            Err(RoomError::Closed(client)) => assert_eq!(client.id(), 9),
            other => panic!("expected Closed, got {:?}", other),
        }
        assert!(room.is_empty());
    }

    #[test]
    fn test_close_reports_first_call_only() {
        let room = WaitingRoom::new(2);
        assert!(room.close());
        assert!(!room.close());
    }

    #[test]
    fn test_close_drains_before_signal() {
        let room = WaitingRoom::new(4);
        room.try_enqueue(Client::new(1)).unwrap();
        room.try_enqueue(Client::new(2)).unwrap();
        room.close();

        assert_eq!(room.dequeue().map(|c| c.id()), Some(1));
        assert_eq!(room.dequeue().map(|c| c.id()), Some(2));
        assert!(room.dequeue().is_none());
        assert!(room.dequeue().is_none());
        assert!(room.is_empty());
    }

    #[test]
    fn test_close_wakes_blocked_consumers() {
        let room = Arc::new(WaitingRoom::new(2));
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let room = Arc::clone(&room);
                thread::spawn(move || room.dequeue())
            })
            .collect();

        // Give the consumers a chance to block
        thread::sleep(Duration::from_millis(20));
        room.close();

        for handle in handles {
            assert!(handle.join().unwrap().is_none());
        }
    }

    #[test]
    fn test_concurrent_enqueue_and_close() {
        for _ in 0..50 {
            let room = Arc::new(WaitingRoom::new(64));
            let accepted = Arc::new(AtomicUsize::new(0));

            let producers: Vec<_> = (0..4)
                .map(|p| {
                    let room = Arc::clone(&room);
                    let accepted = Arc::clone(&accepted);
                    thread::spawn(move || {
                        for i in 0..16u64 {
                            if room.try_enqueue(Client::new(p * 100 + i)).is_ok() {
                                accepted.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                    })
                })
                .collect();

            room.close();
            // Nothing may get in once close has returned
            assert!(matches!(
                room.try_enqueue(Client::new(999)),
                Err(RoomError::Closed(_))
            ));

            for producer in producers {
                producer.join().unwrap();
            }

            let mut drained = 0;
            while room.dequeue().is_some() {
                drained += 1;
            }
            assert_eq!(drained, accepted.load(Ordering::SeqCst));
        }
    }
}
