//! # tickmatch
//!
//! A single-instrument, in-memory limit order book matching engine with a
//! lock-free SPSC front end for replaying recorded event streams and
//! ingesting live feeds.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: the consumer thread owns the book exclusively; no
//!   locks or fences touch the matching structures
//! - **Price-Time Priority**: ordered price maps plus FIFO levels
//! - **Flat Storage**: resting orders live in a slot arena with a free
//!   list and 32-bit handles; the id index maps straight to slots
//!
//! ## Architecture
//!
//! ```text
//! [Producer Thread] --> [SPSC Ring Buffer] --> [Engine Thread]
//!  (generator, file,                             |
//!   market-data feed)                     [OrderBook + MatchResults]
//! ```

pub mod adapter;
pub mod arena;
pub mod engine;
pub mod event;
pub mod generator;
pub mod matching;
pub mod order_book;
pub mod price_level;
pub mod replay;
pub mod spsc;
pub mod types;

// Re-exports for convenience
pub use adapter::{FeedRow, Scale};
pub use engine::{apply_event, run_pipeline, PipelineConfig, PipelineReport, TimedEvent};
pub use event::{parse_csv_line, parse_feed_line, Event, ParseError};
pub use generator::EventGenerator;
pub use order_book::OrderBook;
pub use replay::ReplayStats;
pub use spsc::SpscQueue;
pub use types::{LevelInfo, MatchResult, OrderId, Price, Qty, Side, Trade, REJECTED_ID};
