/// Fixed-capacity circular buffer with a drop-oldest overflow policy.
///
/// `push` always succeeds. When the queue is full the logically oldest value
/// is overwritten, so a slow consumer loses history instead of stalling the
/// producer.
#[derive(Debug)]
pub struct RingQueue<T> {
    slots: Box<[Option<T>]>,
    /// Next slot to write.
    head: usize,
    /// Oldest unread slot.
    tail: usize,
    empty: bool,
    dropped: u64,
}

impl<T> RingQueue<T> {
    /// Create a queue holding at most `capacity` values.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingQueue capacity must be nonzero");

        let slots = std::iter::repeat_with(|| None).take(capacity).collect();
        Self {
            slots,
            head: 0,
            tail: 0,
            empty: true,
            dropped: 0,
        }
    }

    /// Push a value, evicting the oldest unread value if the queue is full.
    pub fn push(&mut self, value: T) {
        let full = !self.empty && self.head == self.tail;

        self.slots[self.head] = Some(value);
        if full {
            self.tail = self.advance(self.tail);
            self.dropped = self.dropped.wrapping_add(1);
        }

        self.empty = false;
        self.head = self.advance(self.head);
    }

    /// Pop the oldest unread value.
    pub fn pop(&mut self) -> Option<T> {
        if self.empty {
            return None;
        }

        let value = self.slots[self.tail].take();
        self.tail = self.advance(self.tail);
        self.empty = self.tail == self.head;

        value
    }

    /// Number of unread values.
    pub fn count(&self) -> usize {
        if self.empty {
            0
        } else {
            ((self.head + self.capacity() - self.tail - 1) % self.capacity()) + 1
        }
    }

    /// Maximum number of values held at once.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_full(&self) -> bool {
        self.count() == self.capacity()
    }

    /// Total number of values evicted by overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_queue_pops_none() {
        let mut q = RingQueue::<u32>::new(3);
        assert!(q.is_empty());
        assert_eq!(q.count(), 0);
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn fifo_without_overflow() {
        let mut q = RingQueue::new(4);
        q.push(1);
        q.push(2);
        q.push(3);

        assert_eq!(q.count(), 3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
        assert_eq!(q.dropped(), 0);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut q = RingQueue::new(5);
        for i in 0..10 {
            q.push(i);
        }

        assert!(q.is_full());
        assert_eq!(q.count(), 5);
        assert_eq!(q.dropped(), 5);
        for i in 5..10 {
            assert_eq!(q.pop(), Some(i));
        }
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn capacity_one_keeps_latest() {
        let mut q = RingQueue::new(1);
        q.push("a");
        q.push("b");
        assert_eq!(q.count(), 1);
        assert_eq!(q.pop(), Some("b"));
        assert!(q.is_empty());
    }

    #[test]
    fn interleaved_push_pop_wraps_indices() {
        let mut q = RingQueue::new(3);
        for i in 0..20 {
            q.push(i);
            q.push(i + 100);
            assert_eq!(q.pop(), Some(i));
            assert_eq!(q.pop(), Some(i + 100));
            assert!(q.is_empty());
        }
    }

    #[test]
    fn non_clone_values_are_moved_out() {
        let mut q = RingQueue::new(2);
        q.push(String::from("x"));
        q.push(String::from("y"));
        q.push(String::from("z"));
        assert_eq!(q.pop().as_deref(), Some("y"));
        assert_eq!(q.pop().as_deref(), Some("z"));
    }

    #[test]
    #[should_panic(expected = "capacity must be nonzero")]
    fn zero_capacity_panics() {
        let _ = RingQueue::<u8>::new(0);
    }

    proptest! {
        #[test]
        fn keeps_last_n_in_order(capacity in 1usize..16, pushes in 0usize..64) {
            let mut q = RingQueue::new(capacity);
            for i in 0..pushes {
                q.push(i);
            }

            prop_assert_eq!(q.count(), pushes.min(capacity));

            let drained: Vec<usize> = std::iter::from_fn(|| q.pop()).collect();
            let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).collect();
            prop_assert_eq!(drained, expected);
        }
    }
}
