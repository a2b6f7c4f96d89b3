//! Wait-free bounded single-producer / single-consumer ring buffer.
//!
//! One thread pushes, one thread pops, no locks, no allocation after
//! construction. The ring has `capacity` slots and holds at most
//! `capacity - 1` elements: "next head equals tail" encodes full. Cursors
//! advance with a wraparound increment, each on its own cache line.
//!
//! Memory ordering is the minimal discipline that makes a pushed value
//! visible to the consumer and a freed slot visible to the producer: each
//! side reads its own cursor relaxed, loads the other side's cursor with
//! acquire, and publishes its own advance with release.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

#[repr(align(64))]
struct CacheAligned<T>(T);

pub struct SpscQueue<T> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    capacity: usize,
    /// Producer's write cursor.
    head: CacheAligned<AtomicUsize>,
    /// Consumer's read cursor.
    tail: CacheAligned<AtomicUsize>,
}

unsafe impl<T: Send> Send for SpscQueue<T> {}
unsafe impl<T: Send> Sync for SpscQueue<T> {}

impl<T> SpscQueue<T> {
    /// Construct a queue with storage for `capacity` slots (usable
    /// occupancy `capacity - 1`).
    ///
    /// # Panics
    /// Panics if `capacity < 2`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "SPSC queue needs at least 2 slots");
        let buf = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        Self {
            buf,
            capacity,
            head: CacheAligned(AtomicUsize::new(0)),
            tail: CacheAligned(AtomicUsize::new(0)),
        }
    }

    #[inline]
    fn advance(&self, cursor: usize) -> usize {
        let next = cursor + 1;
        if next == self.capacity {
            0
        } else {
            next
        }
    }

    /// Enqueue a value. Must be called from the single producer thread.
    ///
    /// Returns the value back on a full queue; never blocks.
    #[inline]
    pub fn push(&self, value: T) -> Result<(), T> {
        let head = self.head.0.load(Ordering::Relaxed);
        let next = self.advance(head);
        if next == self.tail.0.load(Ordering::Acquire) {
            return Err(value);
        }
        unsafe { (*self.buf[head].get()).write(value) };
        self.head.0.store(next, Ordering::Release);
        Ok(())
    }

    /// Dequeue a value. Must be called from the single consumer thread.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.0.load(Ordering::Relaxed);
        if tail == self.head.0.load(Ordering::Acquire) {
            return None;
        }
        let value = unsafe { (*self.buf[tail].get()).assume_init_read() };
        self.tail.0.store(self.advance(tail), Ordering::Release);
        Some(value)
    }

    /// Snapshot emptiness check, meaningful on the consumer thread.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tail.0.load(Ordering::Relaxed) == self.head.0.load(Ordering::Acquire)
    }

    /// Snapshot fullness check, meaningful on the producer thread.
    #[inline]
    pub fn is_full(&self) -> bool {
        let head = self.head.0.load(Ordering::Relaxed);
        self.advance(head) == self.tail.0.load(Ordering::Acquire)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Drop for SpscQueue<T> {
    fn drop(&mut self) {
        // Sole owner here; release any undelivered elements.
        while self.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn push_pop_roundtrip() {
        let q = SpscQueue::new(4);
        assert!(q.is_empty());
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn holds_capacity_minus_one() {
        let q = SpscQueue::new(4);
        q.push(1).unwrap();
        q.push(2).unwrap();
        q.push(3).unwrap();
        assert!(q.is_full());
        assert_eq!(q.push(4), Err(4));

        assert_eq!(q.pop(), Some(1));
        q.push(4).unwrap();
        assert!(q.is_full());
    }

    #[test]
    fn wraps_around() {
        let q = SpscQueue::new(3);
        for round in 0..10 {
            q.push(round * 2).unwrap();
            q.push(round * 2 + 1).unwrap();
            assert_eq!(q.pop(), Some(round * 2));
            assert_eq!(q.pop(), Some(round * 2 + 1));
        }
        assert!(q.is_empty());
    }

    #[test]
    #[should_panic]
    fn rejects_degenerate_capacity() {
        let _ = SpscQueue::<u64>::new(1);
    }

    #[test]
    fn drop_releases_undelivered_elements() {
        let q = SpscQueue::new(8);
        for i in 0..5 {
            q.push(Arc::new(i)).unwrap();
        }
        let probe = Arc::new(99);
        q.push(Arc::clone(&probe)).unwrap();
        drop(q);
        assert_eq!(Arc::strong_count(&probe), 1);
    }

    #[test]
    fn cross_thread_order_preserved() {
        const N: u64 = 100_000;
        let q = Arc::new(SpscQueue::new(64));

        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..N {
                    let mut item = i;
                    loop {
                        match q.push(item) {
                            Ok(()) => break,
                            Err(back) => {
                                item = back;
                                thread::yield_now();
                            }
                        }
                    }
                }
            })
        };

        let mut expected = 0u64;
        while expected < N {
            match q.pop() {
                Some(v) => {
                    assert_eq!(v, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();
        assert!(q.is_empty());
    }
}
