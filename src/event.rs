//! Event model and the two text grammars at the feed boundary.
//!
//! Producers (generators, file replay, market-data adapters) all speak this
//! one event type; the engine thread consumes it without knowing the source.

use std::num::ParseIntError;

use thiserror::Error;

use crate::types::{OrderId, Price, Qty, Side};

/// One input to the matching engine.
///
/// `Add` with `id == 0` asks the book to assign a fresh id; a non-zero id
/// comes from the upstream stream and goes through the replace-on-collision
/// path. `End` is the stream sentinel pushed exactly once by a producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Add {
        side: Side,
        price: Price,
        qty: Qty,
        id: OrderId,
    },
    Market {
        side: Side,
        qty: Qty,
    },
    Cancel {
        id: OrderId,
    },
    End,
}

/// Why a text line failed to parse into an [`Event`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unknown event type `{0}`")]
    UnknownType(String),
    #[error("unknown side `{0}`")]
    UnknownSide(String),
    #[error("missing `{0}` field")]
    MissingField(&'static str),
    #[error("bad `{field}` field")]
    BadNumber {
        field: &'static str,
        #[source]
        source: ParseIntError,
    },
}

fn parse_side(token: &str) -> Result<Side, ParseError> {
    match token.to_ascii_uppercase().as_str() {
        "BUY" | "B" => Ok(Side::Buy),
        "SELL" | "S" => Ok(Side::Sell),
        other => Err(ParseError::UnknownSide(other.to_string())),
    }
}

fn parse_num<T: std::str::FromStr<Err = ParseIntError>>(
    token: &str,
    field: &'static str,
) -> Result<T, ParseError> {
    token
        .parse()
        .map_err(|source| ParseError::BadNumber { field, source })
}

/// Parse one line of the compact CSV grammar.
///
/// Recognized forms:
/// - `ADD,<side>,<price>,<qty>,<id>`
/// - `MKT,<side>,<qty>` (also `MARKET`)
/// - `CANCEL,<id>` (also `CXL`)
///
/// Comment lines (starting with `#`) and blank lines yield `Ok(None)`.
pub fn parse_csv_line(line: &str) -> Result<Option<Event>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split(',').map(str::trim);
    let kind = fields.next().unwrap_or("").to_ascii_uppercase();
    let mut next = |name: &'static str| fields.next().ok_or(ParseError::MissingField(name));

    let event = match kind.as_str() {
        "ADD" => {
            let side = parse_side(next("side")?)?;
            let price = parse_num(next("price")?, "price")?;
            let qty = parse_num(next("qty")?, "qty")?;
            let id = parse_num(next("id")?, "id")?;
            Event::Add {
                side,
                price,
                qty,
                id,
            }
        }
        "MKT" | "MARKET" => {
            let side = parse_side(next("side")?)?;
            let qty = parse_num(next("qty")?, "qty")?;
            Event::Market { side, qty }
        }
        "CANCEL" | "CXL" => Event::Cancel {
            id: parse_num(next("id")?, "id")?,
        },
        other => return Err(ParseError::UnknownType(other.to_string())),
    };

    Ok(Some(event))
}

/// Parse one line of the timestamped live-feed grammar:
/// `<ts_ns>,<T|A|C>,<side>,<price>,<qty>`.
///
/// `T` maps to a market order, `A` to an add with engine-assigned id, and
/// `C` to `Cancel { id: 0 }`: the grammar carries no order id, so cancels
/// from this stream are a defined no-op. The timestamp is validated and
/// then discarded; the pipeline stamps its own enqueue times.
pub fn parse_feed_line(line: &str) -> Result<Event, ParseError> {
    let mut fields = line.trim().split(',').map(str::trim);
    let mut next = |name: &'static str| fields.next().ok_or(ParseError::MissingField(name));

    let _ts: i64 = parse_num(next("ts_ns")?, "ts_ns")?;
    let kind = next("type")?.to_ascii_uppercase();
    let side_tok = next("side")?;
    let side = if side_tok.starts_with(|c| c == 'B' || c == 'b') {
        Side::Buy
    } else {
        Side::Sell
    };
    let price: Price = parse_num(next("price")?, "price")?;
    let qty: Qty = parse_num(next("qty")?, "qty")?;

    match kind.as_str() {
        "T" => Ok(Event::Market { side, qty }),
        "A" => Ok(Event::Add {
            side,
            price,
            qty,
            id: 0,
        }),
        "C" => Ok(Event::Cancel { id: 0 }),
        other => Err(ParseError::UnknownType(other.to_string())),
    }
}
