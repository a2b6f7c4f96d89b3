//! Replay statistics: counters and book observations accumulated while
//! feeding a recorded event stream through the engine, plus the summary
//! report the replay front end prints.

use std::fmt;

use crate::event::Event;
use crate::order_book::OrderBook;
use crate::types::{Price, Qty, Side};

#[derive(Debug, Default)]
pub struct ReplayStats {
    pub add_count: usize,
    pub mkt_count: usize,
    pub cancel_count: usize,
    /// Lines that failed to parse and were dropped.
    pub skipped: usize,

    pub added_buy: Qty,
    pub added_sell: Qty,

    pub mkt_req_buy: Qty,
    pub mkt_req_sell: Qty,
    pub mkt_fill_buy: Qty,
    pub mkt_fill_sell: Qty,

    pub full_fills: usize,
    pub partial_fills: usize,
    pub zero_fills: usize,

    pub cancel_hit: usize,
    pub cancel_miss: usize,

    // price * qty over aggressive trades, by taker side
    notional_buy: f64,
    notional_sell: f64,

    bid_range: Option<(Price, Price)>,
    ask_range: Option<(Price, Price)>,
    max_bid_depth: Qty,
    max_ask_depth: Qty,

    spread_sum: f64,
    spread_min: f64,
    spread_max: f64,
    spread_count: usize,
}

impl ReplayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch one event to the book and fold its outcome into the stats.
    pub fn apply(&mut self, book: &mut OrderBook, event: &Event) {
        match *event {
            Event::Add {
                side,
                price,
                qty,
                id,
            } => {
                self.add_count += 1;
                match side {
                    Side::Buy => self.added_buy += qty.max(0),
                    Side::Sell => self.added_sell += qty.max(0),
                }
                if id == 0 {
                    book.add_limit(side, price, qty);
                } else {
                    book.add_limit_with_id(id, side, price, qty);
                }
            }
            Event::Market { side, qty } => {
                self.mkt_count += 1;
                match side {
                    Side::Buy => self.mkt_req_buy += qty.max(0),
                    Side::Sell => self.mkt_req_sell += qty.max(0),
                }

                let result = book.execute_market(side, qty);
                if result.filled == 0 {
                    self.zero_fills += 1;
                } else if result.remaining == 0 {
                    self.full_fills += 1;
                } else {
                    self.partial_fills += 1;
                }
                match side {
                    Side::Buy => self.mkt_fill_buy += result.filled,
                    Side::Sell => self.mkt_fill_sell += result.filled,
                }

                for trade in &result.trades {
                    let notional = trade.price as f64 * trade.qty as f64;
                    match trade.taker_side {
                        Side::Buy => self.notional_buy += notional,
                        Side::Sell => self.notional_sell += notional,
                    }
                }
            }
            Event::Cancel { id } => {
                self.cancel_count += 1;
                if book.cancel(id) {
                    self.cancel_hit += 1;
                } else {
                    self.cancel_miss += 1;
                }
            }
            Event::End => {}
        }
    }

    /// Record the current top of book into the running ranges.
    pub fn observe(&mut self, book: &OrderBook) {
        let bid = book.best_bid();
        let ask = book.best_ask();

        if let Some(b) = bid {
            self.bid_range = Some(match self.bid_range {
                Some((lo, hi)) => (lo.min(b.price), hi.max(b.price)),
                None => (b.price, b.price),
            });
            self.max_bid_depth = self.max_bid_depth.max(b.qty);
        }
        if let Some(a) = ask {
            self.ask_range = Some(match self.ask_range {
                Some((lo, hi)) => (lo.min(a.price), hi.max(a.price)),
                None => (a.price, a.price),
            });
            self.max_ask_depth = self.max_ask_depth.max(a.qty);
        }

        if let (Some(b), Some(a)) = (bid, ask) {
            let spread = (a.price - b.price) as f64;
            if self.spread_count == 0 {
                self.spread_min = spread;
                self.spread_max = spread;
            } else {
                self.spread_min = self.spread_min.min(spread);
                self.spread_max = self.spread_max.max(spread);
            }
            self.spread_sum += spread;
            self.spread_count += 1;
        }
    }

    /// Volume-weighted average price of aggressive buys, if any traded.
    pub fn vwap_buy(&self) -> Option<f64> {
        (self.mkt_fill_buy > 0).then(|| self.notional_buy / self.mkt_fill_buy as f64)
    }

    /// Volume-weighted average price of aggressive sells, if any traded.
    pub fn vwap_sell(&self) -> Option<f64> {
        (self.mkt_fill_sell > 0).then(|| self.notional_sell / self.mkt_fill_sell as f64)
    }

    /// Render the replay summary against the final book state.
    pub fn summary<'a>(&'a self, book: &'a OrderBook) -> ReplaySummary<'a> {
        ReplaySummary { stats: self, book }
    }
}

/// Displayable replay report.
pub struct ReplaySummary<'a> {
    stats: &'a ReplayStats,
    book: &'a OrderBook,
}

fn fill_ratio(req: Qty, filled: Qty) -> String {
    if req > 0 {
        format!(" ({:.2}%)", filled as f64 / req as f64 * 100.0)
    } else {
        " (n/a)".to_string()
    }
}

impl fmt::Display for ReplaySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.stats;

        writeln!(f, "=== Replay summary ===")?;
        writeln!(f)?;
        writeln!(f, "Events:")?;
        writeln!(f, "  ADD    : {}", st.add_count)?;
        writeln!(f, "  MARKET : {}", st.mkt_count)?;
        writeln!(f, "  CANCEL : {}", st.cancel_count)?;
        writeln!(f, "  skipped: {}", st.skipped)?;
        writeln!(f)?;

        writeln!(f, "Added volume:")?;
        writeln!(f, "  Buy  : {}", st.added_buy)?;
        writeln!(f, "  Sell : {}", st.added_sell)?;
        writeln!(f)?;

        writeln!(f, "Aggressive (market) volume:")?;
        writeln!(
            f,
            "  Buy requested : {}, filled: {}{}",
            st.mkt_req_buy,
            st.mkt_fill_buy,
            fill_ratio(st.mkt_req_buy, st.mkt_fill_buy)
        )?;
        writeln!(
            f,
            "  Sell requested: {}, filled: {}{}",
            st.mkt_req_sell,
            st.mkt_fill_sell,
            fill_ratio(st.mkt_req_sell, st.mkt_fill_sell)
        )?;
        writeln!(f)?;

        writeln!(f, "Aggressive VWAP (based on trades):")?;
        match st.vwap_buy() {
            Some(v) => writeln!(f, "  Buy  VWAP: {v:.2}")?,
            None => writeln!(f, "  Buy  VWAP: n/a")?,
        }
        match st.vwap_sell() {
            Some(v) => writeln!(f, "  Sell VWAP: {v:.2}")?,
            None => writeln!(f, "  Sell VWAP: n/a")?,
        }
        writeln!(f)?;

        writeln!(f, "Market order outcomes:")?;
        writeln!(f, "  full fills   : {}", st.full_fills)?;
        writeln!(f, "  partial fills: {}", st.partial_fills)?;
        writeln!(f, "  zero fills   : {}", st.zero_fills)?;
        writeln!(f)?;

        writeln!(f, "Cancel stats:")?;
        writeln!(f, "  success: {}", st.cancel_hit)?;
        writeln!(f, "  fail   : {}", st.cancel_miss)?;
        writeln!(f)?;

        writeln!(f, "Order book stats (over replay):")?;
        match st.bid_range {
            Some((lo, hi)) => {
                writeln!(f, "  Best bid price range : [{lo}, {hi}]")?;
                writeln!(f, "  Max best bid depth   : {}", st.max_bid_depth)?;
            }
            None => writeln!(f, "  No best bid observed")?,
        }
        match st.ask_range {
            Some((lo, hi)) => {
                writeln!(f, "  Best ask price range : [{lo}, {hi}]")?;
                writeln!(f, "  Max best ask depth   : {}", st.max_ask_depth)?;
            }
            None => writeln!(f, "  No best ask observed")?,
        }
        writeln!(f)?;

        writeln!(f, "Spread stats (ask - bid):")?;
        if st.spread_count > 0 {
            writeln!(f, "  mean : {:.2}", st.spread_sum / st.spread_count as f64)?;
            writeln!(f, "  min  : {}", st.spread_min)?;
            writeln!(f, "  max  : {}", st.spread_max)?;
            writeln!(f, "  count: {}", st.spread_count)?;
        } else {
            writeln!(f, "  not enough data (no simultaneous best bid & ask)")?;
        }
        writeln!(f)?;

        match self.book.best_bid() {
            Some(b) => writeln!(f, "Final best bid: {} x {}", b.price, b.qty)?,
            None => writeln!(f, "Final best bid: none")?,
        }
        match self.book.best_ask() {
            Some(a) => writeln!(f, "Final best ask: {} x {}", a.price, a.qty)?,
            None => writeln!(f, "Final best ask: none")?,
        }

        Ok(())
    }
}
