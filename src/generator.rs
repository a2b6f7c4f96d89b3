//! Seeded synthetic event stream for replay files and pipeline benchmarks.
//!
//! Mix: 60% adds, 30% market orders, 10% cancels, with an add forced
//! whenever no order is live so cancels always have a target. Prices are
//! uniform in 95..=105 and quantities in 1..=10, which keeps the two sides
//! overlapping enough to trade. Cancel targets are drawn uniformly from
//! the live-id set and swap-removed so no id is cancelled twice.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::event::Event;
use crate::types::{OrderId, Side};

pub struct EventGenerator {
    num_events: usize,
    emitted: usize,
    end_sent: bool,
    rng: ChaCha8Rng,
    next_id: OrderId,
    live_ids: Vec<OrderId>,
}

impl EventGenerator {
    pub fn new(num_events: usize, seed: u64) -> Self {
        Self {
            num_events,
            emitted: 0,
            end_sent: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_id: 1,
            live_ids: Vec::with_capacity(num_events),
        }
    }

    pub fn num_events(&self) -> usize {
        self.num_events
    }

    fn random_side(&mut self) -> Side {
        if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    fn random_add(&mut self) -> Event {
        let side = self.random_side();
        let price = self.rng.gen_range(95..=105);
        let qty = self.rng.gen_range(1..=10);
        let id = self.next_id;
        self.next_id += 1;
        self.live_ids.push(id);
        Event::Add {
            side,
            price,
            qty,
            id,
        }
    }
}

impl Iterator for EventGenerator {
    type Item = Event;

    /// Yields exactly `num_events` events followed by one `End`.
    fn next(&mut self) -> Option<Event> {
        if self.emitted >= self.num_events {
            if self.end_sent {
                return None;
            }
            self.end_sent = true;
            return Some(Event::End);
        }
        self.emitted += 1;

        let roll = self.rng.gen_range(0..100);
        let event = if self.live_ids.is_empty() || roll < 60 {
            self.random_add()
        } else if roll < 90 {
            Event::Market {
                side: self.random_side(),
                qty: self.rng.gen_range(1..=10),
            }
        } else {
            let pick = self.rng.gen_range(0..self.live_ids.len());
            let id = self.live_ids.swap_remove(pick);
            Event::Cancel { id }
        };

        Some(event)
    }
}
