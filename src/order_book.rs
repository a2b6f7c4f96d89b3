//! The limit order book for a single instrument.
//!
//! Two ordered price maps hold the resting liquidity: bids keyed ascending
//! with the best (highest) at the back, asks with the best (lowest) at the
//! front. Each level is a FIFO of arena slot indices and an `FxHashMap`
//! gives O(1) id -> slot lookup for cancels. The book is owned by exactly
//! one thread; nothing in here is synchronized.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::arena::{Arena, SlotIndex};
use crate::price_level::Level;
use crate::types::{LevelInfo, OrderId, Price, Qty, Side, REJECTED_ID};

pub struct OrderBook {
    pub(crate) bids: BTreeMap<Price, Level>,
    pub(crate) asks: BTreeMap<Price, Level>,
    pub(crate) arena: Arena,
    pub(crate) index: FxHashMap<OrderId, SlotIndex>,
    next_id: OrderId,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            arena: Arena::new(),
            index: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Pre-reserve the arena and id index for `orders` resting orders.
    pub fn with_capacity(orders: usize) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            arena: Arena::with_capacity(orders),
            index: FxHashMap::with_capacity_and_hasher(orders, Default::default()),
            next_id: 1,
        }
    }

    // ========================================================================
    // Submissions
    // ========================================================================

    /// Submit a limit order with an engine-assigned id.
    ///
    /// The order first takes against the opposite book; only the residual
    /// rests. A fresh id is drawn for every valid submission and returned
    /// whether or not anything ends up resident, so callers must consult
    /// the book, not the id, for residency. Non-positive qty (or a negative
    /// price) performs no mutation and returns [`REJECTED_ID`].
    pub fn add_limit(&mut self, side: Side, price: Price, qty: Qty) -> OrderId {
        if qty <= 0 || price < 0 {
            return REJECTED_ID;
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut trades = Vec::new();
        let residual = self.match_incoming_limit(side, price, qty, &mut trades);
        if residual > 0 {
            self.insert_resting(id, side, price, residual);
        }
        id
    }

    /// Submit a limit order under a caller-supplied id (replay path).
    ///
    /// If `id` is already resident the old order is evicted before the new
    /// one is processed. Returns `id` unconditionally; as with
    /// [`add_limit`], a fully crossed order leaves nothing resident.
    pub fn add_limit_with_id(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Qty,
    ) -> OrderId {
        if qty <= 0 || price < 0 {
            return id;
        }

        if let Some(&old_idx) = self.index.get(&id) {
            self.evict(id, old_idx);
        }

        let mut trades = Vec::new();
        let residual = self.match_incoming_limit(side, price, qty, &mut trades);
        if residual > 0 {
            self.insert_resting(id, side, price, residual);
        }
        id
    }

    /// Remove the resting order with the given id.
    ///
    /// Returns true iff an active order was found and removed; cancelling
    /// an unknown (or already cancelled) id is not an error.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        let Some(&idx) = self.index.get(&id) else {
            return false;
        };

        let slot = self.arena.get(idx);
        if !slot.active || slot.qty <= 0 {
            self.index.remove(&id);
            return false;
        }

        self.evict(id, idx);
        true
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Best bid level: highest price with resting buy interest, with the
    /// aggregate quantity at that price.
    pub fn best_bid(&self) -> Option<LevelInfo> {
        let (&price, level) = self.bids.iter().next_back()?;
        let qty = level.depth(&self.arena);
        (qty > 0).then_some(LevelInfo { price, qty })
    }

    /// Best ask level: lowest price with resting sell interest.
    pub fn best_ask(&self) -> Option<LevelInfo> {
        let (&price, level) = self.asks.iter().next()?;
        let qty = level.depth(&self.arena);
        (qty > 0).then_some(LevelInfo { price, qty })
    }

    /// True iff neither side has resting orders.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Number of resident orders.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True iff the order with this id is resident.
    #[inline]
    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.arena.clear();
        self.index.clear();
        self.next_id = 1;
    }

    // ========================================================================
    // Internal bookkeeping
    // ========================================================================

    fn insert_resting(&mut self, id: OrderId, side: Side, price: Price, qty: Qty) {
        let idx = self.arena.alloc();
        let slot = self.arena.get_mut(idx);
        slot.id = id;
        slot.side = side;
        slot.price = price;
        slot.qty = qty;
        slot.active = true;

        self.index.insert(id, idx);

        let book = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        book.entry(price).or_insert_with(Level::new).push_back(idx);
    }

    /// Deactivate a resident order, unlink it from its level, and erase the
    /// level if it empties.
    fn evict(&mut self, id: OrderId, idx: SlotIndex) {
        let slot = self.arena.get(idx);
        let (side, price) = (slot.side, slot.price);
        self.arena.release(idx);
        self.index.remove(&id);

        let book = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = book.get_mut(&price) {
            level.remove(idx);
            if level.is_empty() {
                book.remove(&price);
            }
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("orders", &self.index.len())
            .finish()
    }
}
