//! Broadcast publish/subscribe with independently sized bounded queues.
//!
//! Every [`Receiver`] owns its own [`RingQueue`] behind its own [`Mutex`].
//! A [`Sender`] pushes a copy of each value into every receiver registered on
//! the bus, so a slow or overflowing receiver never affects another one.
//!
//! Locking: a send holds the read side of the bus's receiver list for its
//! whole duration and, inside it, takes each receiver's queue mutex one at a
//! time. Registering a receiver takes the write side, so it waits for sends
//! in flight and a send never sees half a registration.
//!
//! Ordering: values sent through one sender are observed by each receiver in
//! send order (minus anything lost to drop-oldest). Nothing is guaranteed
//! across two different senders.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ring::RingQueue;
use crate::sync::Mutex;

struct Endpoint<T> {
    queue: Mutex<RingQueue<T>>,
    capacity: usize,
}

struct Shared<T> {
    // Append-only. Registration is expected to finish before traffic starts,
    // after which senders only ever take the read side.
    endpoints: RwLock<Vec<Arc<Endpoint<T>>>>,
}

impl<T> Shared<T> {
    fn broadcast(&self, value: T)
    where
        T: Clone,
    {
        let endpoints = self.endpoints.read();
        let Some((last, rest)) = endpoints.split_last() else {
            return;
        };

        for endpoint in rest {
            endpoint.queue.lock().push(value.clone());
        }
        last.queue.lock().push(value);
    }
}

/// A broadcast channel for values of type `T`.
///
/// The bus only creates handles. Its state lives as long as any handle does,
/// so the `Bus` itself may be dropped once wiring is complete.
pub struct Bus<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Bus<T> {
    /// Create a bus with no receivers.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                endpoints: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Create a producer handle.
    pub fn sender(&self) -> Sender<T> {
        Sender {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Register a new receiver with its own queue of `capacity` values.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn receiver(&self, capacity: usize) -> Receiver<T> {
        let endpoint = Arc::new(Endpoint {
            queue: Mutex::new(RingQueue::new(capacity)),
            capacity,
        });

        let mut endpoints = self.shared.endpoints.write();
        endpoints.push(Arc::clone(&endpoint));
        tracing::trace!(capacity, receivers = endpoints.len(), "receiver registered");

        Receiver { endpoint }
    }

    /// Number of receivers registered so far.
    pub fn receiver_count(&self) -> usize {
        self.shared.endpoints.read().len()
    }
}

impl<T> Default for Bus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Bus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

/// Producer handle. Cheap to clone; every clone feeds the same receivers.
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone> Sender<T> {
    /// Deliver a copy of `value` to every receiver. Never fails.
    ///
    /// Takes two locks: the receiver list's read lock, held throughout, and
    /// each receiver's queue mutex in turn. It blocks only while a receiver is
    /// being registered or another thread is inside one of those queues.
    pub fn send(&self, value: T) {
        self.shared.broadcast(value);
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("receivers", &self.shared.endpoints.read().len())
            .finish()
    }
}

/// Consumer handle bound to one queue.
pub struct Receiver<T> {
    endpoint: Arc<Endpoint<T>>,
}

impl<T> Receiver<T> {
    /// Pop the oldest pending value without blocking.
    pub fn try_receive(&self) -> Option<T> {
        self.endpoint.queue.lock().pop()
    }

    /// Drain the queue and return only the newest value.
    pub fn try_receive_last(&self) -> Option<T> {
        let mut queue = self.endpoint.queue.lock();
        let mut last = None;
        while let Some(value) = queue.pop() {
            last = Some(value);
        }
        last
    }

    /// Number of pending values.
    pub fn count(&self) -> usize {
        self.endpoint.queue.lock().count()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoint.queue.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.endpoint.capacity
    }

    /// Values this receiver lost to drop-oldest overflow.
    pub fn dropped(&self) -> u64 {
        self.endpoint.queue.lock().dropped()
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("capacity", &self.endpoint.capacity)
            .field("count", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_receiver_returns_none() {
        let bus = Bus::<i32>::new();
        let _tx = bus.sender();
        let rx = bus.receiver(5);

        assert_eq!(rx.count(), 0);
        assert!(rx.is_empty());
        assert_eq!(rx.try_receive(), None);
    }

    #[test]
    fn single_producer_single_consumer() {
        let bus = Bus::new();
        let tx = bus.sender();
        let rx = bus.receiver(5);

        tx.send(1);
        assert_eq!(rx.count(), 1);
        assert_eq!(rx.try_receive(), Some(1));
        assert_eq!(rx.try_receive(), None);

        for i in 0..10 {
            tx.send(i);
            assert_eq!(rx.try_receive(), Some(i));
        }
        assert_eq!(rx.try_receive(), None);
    }

    #[test]
    fn receiver_wraps_when_full() {
        let bus = Bus::new();
        let tx = bus.sender();
        let rx = bus.receiver(5);

        for i in 0..10 {
            tx.send(i);
        }
        for i in 5..10 {
            assert_eq!(rx.try_receive(), Some(i));
        }
        assert_eq!(rx.try_receive(), None);
        assert_eq!(rx.dropped(), 5);
    }

    #[test]
    fn multiple_producers_share_receivers() {
        let bus = Bus::new();
        let tx1 = bus.sender();
        let tx2 = tx1.clone();
        let rx = bus.receiver(5);

        tx1.send(1);
        tx2.send(2);

        assert_eq!(rx.count(), 2);
        assert_eq!(rx.try_receive(), Some(1));
        assert_eq!(rx.try_receive(), Some(2));
        assert_eq!(rx.try_receive(), None);
    }

    #[test]
    fn every_consumer_gets_a_copy() {
        let bus = Bus::new();
        let tx = bus.sender();
        let rxs: Vec<_> = (1..=4).map(|cap| bus.receiver(cap)).collect();

        tx.send(String::from("stage-sep"));

        for rx in &rxs {
            assert_eq!(rx.try_receive().as_deref(), Some("stage-sep"));
            assert_eq!(rx.try_receive(), None);
        }
    }

    #[test]
    fn overflow_is_isolated_per_consumer() {
        let bus = Bus::new();
        let tx = bus.sender();
        let rx1 = bus.receiver(5);
        let rx2 = bus.receiver(3);

        for i in 0..5 {
            tx.send(i);
        }

        assert_eq!(rx1.count(), 5);
        assert_eq!(rx2.count(), 3);
        for i in 0..5 {
            assert_eq!(rx1.try_receive(), Some(i));
        }
        for i in 2..5 {
            assert_eq!(rx2.try_receive(), Some(i));
        }
        assert_eq!(rx1.try_receive(), None);
        assert_eq!(rx2.try_receive(), None);
    }

    #[test]
    fn two_consumers_with_capacities_two_and_five() {
        let bus = Bus::<u8>::new();
        let tx = bus.sender();
        let a = bus.receiver(2);
        let b = bus.receiver(5);

        for v in 1..=4 {
            tx.send(v);
        }

        let drained_a: Vec<u8> = std::iter::from_fn(|| a.try_receive()).collect();
        let drained_b: Vec<u8> = std::iter::from_fn(|| b.try_receive()).collect();
        assert_eq!(drained_a, vec![3, 4]);
        assert_eq!(drained_b, vec![1, 2, 3, 4]);
        assert_eq!(a.try_receive(), None);
        assert_eq!(b.try_receive(), None);
    }

    #[test]
    fn state_outlives_bus() {
        let (tx, rx) = {
            let bus = Bus::new();
            (bus.sender(), bus.receiver(2))
        };

        tx.send(42u16);
        assert_eq!(rx.try_receive(), Some(42));
    }

    #[test]
    fn send_without_receivers_is_a_noop() {
        let bus = Bus::new();
        let tx = bus.sender();
        tx.send(1u8);
        assert_eq!(bus.receiver_count(), 0);
    }

    #[test]
    fn late_receiver_sees_only_later_values() {
        let bus = Bus::new();
        let tx = bus.sender();
        let early = bus.receiver(4);
        tx.send(1);
        let late = bus.receiver(4);
        tx.send(2);

        assert_eq!(early.count(), 2);
        assert_eq!(late.try_receive(), Some(2));
        assert_eq!(late.try_receive(), None);
    }

    #[test]
    fn receive_last_drains_queue() {
        let bus = Bus::new();
        let tx = bus.sender();
        let rx = bus.receiver(8);
        for i in 0..6 {
            tx.send(i);
        }

        assert_eq!(rx.try_receive_last(), Some(5));
        assert!(rx.is_empty());
        assert_eq!(rx.try_receive_last(), None);
    }

    #[test]
    fn cross_thread_producer_keeps_fifo() {
        let bus = Bus::new();
        let tx = bus.sender();
        let rx = bus.receiver(1000);

        let producer = std::thread::spawn(move || {
            for i in 0..1000u32 {
                tx.send(i);
            }
        });
        producer.join().unwrap();

        let drained: Vec<u32> = std::iter::from_fn(|| rx.try_receive()).collect();
        assert_eq!(drained, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn registration_waits_for_sends_in_flight() {
        let bus = Bus::<u32>::new();
        let early = bus.receiver(2000);
        let tx = bus.sender();

        let late = std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..1000 {
                    tx.send(i);
                }
            });
            (0..8).map(|_| bus.receiver(2000)).collect::<Vec<_>>()
        });

        assert_eq!(early.count(), 1000);
        for rx in &late {
            let got: Vec<u32> = std::iter::from_fn(|| rx.try_receive()).collect();
            if let Some(&first) = got.first() {
                assert_eq!(got, (first..1000).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    #[should_panic(expected = "capacity must be nonzero")]
    fn zero_capacity_receiver_panics() {
        let bus = Bus::<u8>::new();
        let _ = bus.receiver(0);
    }
}
