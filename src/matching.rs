//! The matching sweep: price-time priority consumption of resting liquidity.
//!
//! One sweep serves both aggressive paths. Market orders cross every level
//! until filled or the opposite book is empty; an incoming limit crosses
//! only while the top of the opposite book satisfies its price, and the
//! residual rests. Within a level the index list is walked front to back
//! and compacted in place: surviving indices shift forward, consumed ones
//! drop out, and an emptied level is erased from its price map.

use crate::order_book::OrderBook;
use crate::types::{MatchResult, Price, Qty, Side, Trade};

impl OrderBook {
    /// Execute a market order against the opposite book.
    ///
    /// Consumes up to `qty` units starting at the best price. Never creates
    /// resting orders; whatever cannot be filled is reported in
    /// `remaining`. `qty <= 0` returns a zero-filled result.
    pub fn execute_market(&mut self, side: Side, qty: Qty) -> MatchResult {
        if qty <= 0 {
            return MatchResult::unfilled(qty);
        }

        let mut trades = Vec::new();
        let remaining = self.sweep(side, qty, None, &mut trades);
        MatchResult {
            requested: qty,
            filled: qty - remaining,
            remaining,
            trades,
        }
    }

    /// Taker phase of an incoming limit order. Returns the residual
    /// quantity that should rest at (side, price).
    pub(crate) fn match_incoming_limit(
        &mut self,
        side: Side,
        price: Price,
        qty: Qty,
        trades: &mut Vec<Trade>,
    ) -> Qty {
        if qty <= 0 {
            return 0;
        }
        self.sweep(side, qty, Some(price), trades)
    }

    /// Walk the book opposite `taker_side` from the best level outward,
    /// consuming quantity in strict price-then-time order.
    ///
    /// `limit` is the taker's price bound: `None` always crosses (market),
    /// `Some(p)` crosses asks at prices `<= p` for a buyer and bids at
    /// prices `>= p` for a seller. Returns the unconsumed quantity.
    fn sweep(
        &mut self,
        taker_side: Side,
        mut qty: Qty,
        limit: Option<Price>,
        trades: &mut Vec<Trade>,
    ) -> Qty {
        let maker_side = taker_side.opposite();
        let OrderBook {
            bids,
            asks,
            arena,
            index,
            ..
        } = self;
        let book = match maker_side {
            Side::Buy => bids,
            Side::Sell => asks,
        };

        while qty > 0 {
            // Best maker level: highest bid or lowest ask.
            let level_price = match maker_side {
                Side::Buy => match book.iter().next_back() {
                    Some((&p, _)) => p,
                    None => break,
                },
                Side::Sell => match book.iter().next() {
                    Some((&p, _)) => p,
                    None => break,
                },
            };

            let crosses = match limit {
                None => true,
                Some(bound) => match maker_side {
                    Side::Sell => level_price <= bound,
                    Side::Buy => level_price >= bound,
                },
            };
            if !crosses {
                break;
            }

            let level = book.get_mut(&level_price).expect("best level present");
            let orders = level.orders_mut();

            let mut write = 0usize;
            let mut read = 0usize;
            while read < orders.len() && qty > 0 {
                let idx = orders[read];
                read += 1;

                let slot = arena.get_mut(idx);
                if !slot.active || slot.qty <= 0 {
                    continue;
                }

                let traded = qty.min(slot.qty);
                qty -= traded;
                slot.qty -= traded;
                trades.push(Trade {
                    maker_id: slot.id,
                    taker_side,
                    price: level_price,
                    qty: traded,
                });

                if slot.qty == 0 {
                    let maker_id = slot.id;
                    arena.release(idx);
                    index.remove(&maker_id);
                } else {
                    orders[write] = idx;
                    write += 1;
                }
            }

            // Shift any unvisited tail forward over the consumed prefix so
            // a mid-level stop never drops live orders.
            let tail = orders.len() - read;
            orders.copy_within(read.., write);
            orders.truncate(write + tail);

            if orders.is_empty() {
                book.remove(&level_price);
            }
        }

        qty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LevelInfo;

    #[test]
    fn market_on_empty_book_fills_nothing() {
        let mut book = OrderBook::new();
        let r = book.execute_market(Side::Buy, 5);
        assert_eq!(r.requested, 5);
        assert_eq!(r.filled, 0);
        assert_eq!(r.remaining, 5);
        assert!(r.trades.is_empty());
    }

    #[test]
    fn market_nonpositive_qty_is_noop() {
        let mut book = OrderBook::new();
        book.add_limit(Side::Sell, 100, 5);
        let r = book.execute_market(Side::Buy, 0);
        assert_eq!(r.filled, 0);
        assert_eq!(book.best_ask(), Some(LevelInfo { price: 100, qty: 5 }));
    }

    #[test]
    fn market_sweeps_across_levels() {
        let mut book = OrderBook::new();
        let a = book.add_limit(Side::Sell, 100, 5);
        let b = book.add_limit(Side::Sell, 101, 3);

        let r = book.execute_market(Side::Buy, 12);
        assert_eq!(r.requested, 12);
        assert_eq!(r.filled, 8);
        assert_eq!(r.remaining, 4);
        assert_eq!(
            r.trades,
            vec![
                Trade { maker_id: a, taker_side: Side::Buy, price: 100, qty: 5 },
                Trade { maker_id: b, taker_side: Side::Buy, price: 101, qty: 3 },
            ]
        );
        assert_eq!(book.best_ask(), None);
        assert!(book.is_empty());
    }

    #[test]
    fn market_partial_fill_leaves_maker_remainder() {
        let mut book = OrderBook::new();
        let maker = book.add_limit(Side::Sell, 100, 10);

        let r = book.execute_market(Side::Buy, 4);
        assert_eq!(r.filled, 4);
        assert_eq!(r.remaining, 0);
        assert_eq!(r.trades.len(), 1);
        assert_eq!(r.trades[0].maker_id, maker);
        assert_eq!(book.best_ask(), Some(LevelInfo { price: 100, qty: 6 }));
        assert!(book.contains(maker));
    }

    #[test]
    fn sell_market_hits_bids_from_the_top() {
        let mut book = OrderBook::new();
        book.add_limit(Side::Buy, 99, 5);
        let best = book.add_limit(Side::Buy, 101, 5);

        let r = book.execute_market(Side::Sell, 6);
        assert_eq!(r.filled, 6);
        assert_eq!(r.trades[0].maker_id, best);
        assert_eq!(r.trades[0].price, 101);
        assert_eq!(r.trades[1].price, 99);
        assert_eq!(book.best_bid(), Some(LevelInfo { price: 99, qty: 4 }));
    }

    #[test]
    fn buy_market_prices_non_decreasing() {
        let mut book = OrderBook::new();
        book.add_limit(Side::Sell, 102, 2);
        book.add_limit(Side::Sell, 100, 2);
        book.add_limit(Side::Sell, 101, 2);

        let r = book.execute_market(Side::Buy, 6);
        let prices: Vec<_> = r.trades.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![100, 101, 102]);
    }

    #[test]
    fn fifo_within_level() {
        let mut book = OrderBook::new();
        let first = book.add_limit(Side::Sell, 100, 4);
        let second = book.add_limit(Side::Sell, 100, 4);
        let third = book.add_limit(Side::Sell, 100, 4);

        let r = book.execute_market(Side::Buy, 6);
        assert_eq!(r.trades.len(), 2);
        assert_eq!(r.trades[0].maker_id, first);
        assert_eq!(r.trades[0].qty, 4);
        assert_eq!(r.trades[1].maker_id, second);
        assert_eq!(r.trades[1].qty, 2);

        // second keeps its time priority with the remaining 2
        let r = book.execute_market(Side::Buy, 3);
        assert_eq!(r.trades[0].maker_id, second);
        assert_eq!(r.trades[0].qty, 2);
        assert_eq!(r.trades[1].maker_id, third);
        assert_eq!(r.trades[1].qty, 1);
    }

    #[test]
    fn mid_level_stop_keeps_unvisited_tail() {
        let mut book = OrderBook::new();
        let a = book.add_limit(Side::Sell, 100, 5);
        let b = book.add_limit(Side::Sell, 100, 5);
        let c = book.add_limit(Side::Sell, 100, 5);

        // exhausts inside the level after consuming a and part of b
        let r = book.execute_market(Side::Buy, 7);
        assert_eq!(r.filled, 7);
        assert!(!book.contains(a));
        assert!(book.contains(b));
        assert!(book.contains(c));
        assert_eq!(book.best_ask(), Some(LevelInfo { price: 100, qty: 8 }));
    }

    #[test]
    fn crossing_limit_fully_consumed_is_not_inserted() {
        let mut book = OrderBook::new();
        book.add_limit(Side::Sell, 100, 10);

        let id = book.add_limit(Side::Buy, 101, 4);
        assert_ne!(id, 0, "id is emitted even for a never-resident order");
        assert!(!book.contains(id));
        assert_eq!(book.best_ask(), Some(LevelInfo { price: 100, qty: 6 }));
        assert_eq!(book.best_bid(), None);
    }

    #[test]
    fn crossing_limit_residual_rests_at_its_price() {
        let mut book = OrderBook::new();
        book.add_limit(Side::Sell, 100, 3);

        let id = book.add_limit(Side::Buy, 100, 5);
        assert!(book.contains(id));
        assert_eq!(book.best_bid(), Some(LevelInfo { price: 100, qty: 2 }));
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn limit_stops_at_its_price_bound() {
        let mut book = OrderBook::new();
        book.add_limit(Side::Sell, 100, 2);
        book.add_limit(Side::Sell, 103, 2);

        // crosses 100 but not 103; residual rests at 101
        let id = book.add_limit(Side::Buy, 101, 5);
        assert!(book.contains(id));
        assert_eq!(book.best_bid(), Some(LevelInfo { price: 101, qty: 3 }));
        assert_eq!(book.best_ask(), Some(LevelInfo { price: 103, qty: 2 }));
    }

    #[test]
    fn sell_limit_crosses_down_to_its_bound() {
        let mut book = OrderBook::new();
        book.add_limit(Side::Buy, 105, 2);
        book.add_limit(Side::Buy, 103, 2);
        book.add_limit(Side::Buy, 101, 2);

        let id = book.add_limit(Side::Sell, 103, 5);
        // takes 105 then 103, never 101; residual 1 rests at ask 103
        assert!(book.contains(id));
        assert_eq!(book.best_bid(), Some(LevelInfo { price: 101, qty: 2 }));
        assert_eq!(book.best_ask(), Some(LevelInfo { price: 103, qty: 1 }));
    }

    #[test]
    fn book_never_crossed_after_adds() {
        let mut book = OrderBook::new();
        book.add_limit(Side::Buy, 100, 5);
        book.add_limit(Side::Sell, 100, 5); // fully crosses, nothing rests
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);

        book.add_limit(Side::Buy, 100, 5);
        book.add_limit(Side::Sell, 99, 8); // takes 5 at 100, rests 3 at 99
        let (bb, ba) = (book.best_bid(), book.best_ask());
        assert_eq!(bb, None);
        assert_eq!(ba, Some(LevelInfo { price: 99, qty: 3 }));
    }

    #[test]
    fn conservation_over_random_markets() {
        let mut book = OrderBook::new();
        for i in 0..50 {
            book.add_limit(
                if i % 2 == 0 { Side::Buy } else { Side::Sell },
                if i % 2 == 0 { 95 + (i % 5) } else { 105 + (i % 5) },
                1 + (i % 7),
            );
        }
        for qty in [1, 3, 10, 40, 500] {
            for side in [Side::Buy, Side::Sell] {
                let r = book.execute_market(side, qty);
                assert_eq!(r.requested, r.filled + r.remaining);
                assert_eq!(r.filled, r.trades.iter().map(|t| t.qty).sum::<Qty>());
            }
        }
    }
}
