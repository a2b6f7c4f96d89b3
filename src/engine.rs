//! Feed/engine coupling: a producer thread pushing timestamped events
//! through the SPSC queue into the consumer loop that owns the book.
//!
//! The producer stamps each event with a sequence id and a monotonic
//! enqueue time, yielding when the queue is full. The consumer pops,
//! records enqueue-to-processed latency by sequence id, and dispatches to
//! the book; it exits on the `End` sentinel or once the producer-done flag
//! is up and the queue has drained.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use crate::event::Event;
use crate::order_book::OrderBook;
use crate::spsc::SpscQueue;

/// Sequence id carried by the `End` sentinel.
pub const END_SEQ: u64 = u64::MAX;

/// An event as it travels through the queue.
#[derive(Clone, Copy, Debug)]
pub struct TimedEvent {
    pub event: Event,
    /// Producer-assigned sequence number (0-based), `END_SEQ` for `End`.
    pub seq: u64,
    /// Monotonic timestamp taken just before the push.
    pub enqueued_at: Instant,
}

/// Tuning for [`run_pipeline`].
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    /// SPSC ring size in slots.
    pub queue_capacity: usize,
    /// Number of latency samples to record, indexed by sequence id.
    /// Zero disables latency capture.
    pub latency_capacity: usize,
    /// Pin the consumer to the last CPU core.
    pub pin_consumer: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 4096,
            latency_capacity: 0,
            pin_consumer: false,
        }
    }
}

/// What came out of one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Events the producer pushed (excluding the sentinel).
    pub produced: usize,
    /// Events the consumer dispatched to the book.
    pub processed: usize,
    /// Enqueue-to-processed latency per sequence id, nanoseconds.
    pub latencies_ns: Vec<u64>,
    pub elapsed: Duration,
}

/// Apply one event to the book. Returns false for `End`.
///
/// Adds with id 0 take the engine-assigned-id path; adds carrying an
/// upstream id go through the deterministic replay path.
#[inline]
pub fn apply_event(book: &mut OrderBook, event: &Event) -> bool {
    match *event {
        Event::Add {
            side,
            price,
            qty,
            id,
        } => {
            if id == 0 {
                book.add_limit(side, price, qty);
            } else {
                book.add_limit_with_id(id, side, price, qty);
            }
            true
        }
        Event::Market { side, qty } => {
            book.execute_market(side, qty);
            true
        }
        Event::Cancel { id } => {
            book.cancel(id);
            true
        }
        Event::End => false,
    }
}

fn push_yielding<T>(queue: &SpscQueue<T>, mut item: T) {
    loop {
        match queue.push(item) {
            Ok(()) => return,
            Err(back) => {
                item = back;
                thread::yield_now();
            }
        }
    }
}

/// Pin the current thread to the last available core, which is the one
/// most likely to be isolated from OS interrupts.
pub fn pin_to_last_core() {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(last) = core_ids.last() {
            core_affinity::set_for_current(*last);
        }
    }
}

/// Drive `events` through the SPSC queue into `book`.
///
/// The producer runs on a spawned thread; the consumer loop runs on the
/// calling thread, which keeps the book single-writer. The iterator may
/// yield its own `End`; if it runs dry without one, the sentinel is pushed
/// on its behalf.
pub fn run_pipeline<I>(
    book: &mut OrderBook,
    events: I,
    config: &PipelineConfig,
) -> PipelineReport
where
    I: Iterator<Item = Event> + Send,
{
    let queue = SpscQueue::new(config.queue_capacity);
    let producer_done = AtomicBool::new(false);
    let mut latencies_ns = vec![0u64; config.latency_capacity];
    let mut processed = 0usize;

    let started = Instant::now();

    let produced = thread::scope(|s| {
        let queue = &queue;
        let producer_done = &producer_done;

        let producer = s.spawn(move || {
            let mut produced = 0usize;
            let mut seq = 0u64;
            for event in events {
                let is_end = matches!(event, Event::End);
                let timed = TimedEvent {
                    event,
                    seq: if is_end { END_SEQ } else { seq },
                    enqueued_at: Instant::now(),
                };
                push_yielding(queue, timed);
                if is_end {
                    producer_done.store(true, Ordering::Release);
                    return produced;
                }
                seq += 1;
                produced += 1;
            }
            push_yielding(
                queue,
                TimedEvent {
                    event: Event::End,
                    seq: END_SEQ,
                    enqueued_at: Instant::now(),
                },
            );
            producer_done.store(true, Ordering::Release);
            produced
        });

        if config.pin_consumer {
            pin_to_last_core();
        }

        loop {
            let Some(timed) = queue.pop() else {
                if producer_done.load(Ordering::Acquire) && queue.is_empty() {
                    break;
                }
                thread::yield_now();
                continue;
            };

            if matches!(timed.event, Event::End) {
                break;
            }

            if (timed.seq as usize) < latencies_ns.len() {
                latencies_ns[timed.seq as usize] =
                    timed.enqueued_at.elapsed().as_nanos() as u64;
            }

            apply_event(book, &timed.event);
            processed += 1;
        }

        producer.join().expect("producer thread panicked")
    });

    let elapsed = started.elapsed();
    info!(produced, processed, ?elapsed, "pipeline drained");

    PipelineReport {
        produced,
        processed,
        latencies_ns,
        elapsed,
    }
}
