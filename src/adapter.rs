//! Market-data adapter boundary: decimal feed rows -> engine events.
//!
//! External feeds quote decimal prices and sizes; the engine speaks integer
//! ticks. A [`Scale`] fixes the conversion per deployment; the engine
//! itself never interprets it. Rows that do not map to an engine event are
//! dropped, not errors.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::event::Event;
use crate::types::{Price, Qty, Side};

/// Fixed-point scale factors applied to feed decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scale {
    /// Ticks per unit price (e.g. 100 stores cents).
    pub price: i64,
    /// Size units per unit quantity.
    pub qty: i64,
}

impl Scale {
    /// Price in cents, quantity in thousandths.
    pub const CENTS: Scale = Scale {
        price: 100,
        qty: 1_000,
    };

    /// Price in tenths, quantity in millionths (crypto-spot style).
    pub const TENTHS: Scale = Scale {
        price: 10,
        qty: 1_000_000,
    };

    fn price_ticks(&self, value: Decimal) -> Option<Price> {
        (value * Decimal::from(self.price)).trunc().to_i64()
    }

    fn qty_units(&self, value: Decimal) -> Option<Qty> {
        (value * Decimal::from(self.qty)).trunc().to_i64()
    }
}

/// One row of a depth/trade feed, as decoded from the transport layer.
#[derive(Clone, Debug, Deserialize)]
pub struct FeedRow {
    /// Row kind: `add`/`open`, `trade`/`market`, `cancel`/`done`.
    #[serde(rename = "type")]
    pub kind: String,
    pub side: Option<String>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub order_id: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl FeedRow {
    /// Convert to an engine event under the given scale.
    ///
    /// Returns `None` for rows the engine has no use for: unknown kinds,
    /// missing or unparsable sides, and adds/trades whose scaled quantity
    /// truncates to zero or below. Cancels without an order id map to the
    /// anonymous id 0, a defined no-op downstream.
    pub fn to_event(&self, scale: Scale) -> Option<Event> {
        match self.kind.as_str() {
            "add" | "open" => {
                let side = self.parse_side()?;
                let price = scale.price_ticks(self.price?)?;
                let qty = scale.qty_units(self.amount?)?;
                if price < 0 || qty <= 0 {
                    warn!(price, qty, "dropping add row with degenerate scaled values");
                    return None;
                }
                Some(Event::Add {
                    side,
                    price,
                    qty,
                    id: self.order_id.unwrap_or(0),
                })
            }
            "trade" | "market" => {
                let side = self.parse_side()?;
                let qty = scale.qty_units(self.amount?)?;
                if qty <= 0 {
                    return None;
                }
                Some(Event::Market { side, qty })
            }
            "cancel" | "done" => Some(Event::Cancel {
                id: self.order_id.unwrap_or(0),
            }),
            _ => None,
        }
    }

    fn parse_side(&self) -> Option<Side> {
        match self.side.as_deref() {
            Some("buy") | Some("bid") => Some(Side::Buy),
            Some("sell") | Some("ask") => Some(Side::Sell),
            _ => None,
        }
    }
}
