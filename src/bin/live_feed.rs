//! Feed timestamped event lines from stdin through the pipeline.
//!
//! Usage: `live_feed [max_events]`
//!
//! Line format: `<ts_ns>,<T|A|C>,<side>,<price>,<qty>`. Unparsable lines
//! are dropped and counted; `max_events` caps how many events are read
//! (0 or absent = unlimited).

use std::env;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use tracing::debug;

use tickmatch::{parse_feed_line, OrderBook, PipelineConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let max_events: usize = match env::args().nth(1) {
        Some(arg) => arg.parse().context("bad [max_events]")?,
        None => 0,
    };

    let read_count = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);

    let stdin = io::stdin();
    let events = std::iter::from_fn(|| loop {
        if max_events > 0 && read_count.load(Ordering::Relaxed) >= max_events {
            return None;
        }

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_feed_line(line) {
            Ok(event) => {
                read_count.fetch_add(1, Ordering::Relaxed);
                return Some(event);
            }
            Err(err) => {
                debug!(%err, "skipping line");
                skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    let mut book = OrderBook::new();
    let report = tickmatch::run_pipeline(&mut book, events, &PipelineConfig::default());

    println!("Live feed summary:");
    println!("  lines read:       {}", read_count.load(Ordering::Relaxed));
    println!("  lines skipped:    {}", skipped.load(Ordering::Relaxed));
    println!("  events processed: {}", report.processed);
    match book.best_bid() {
        Some(b) => println!("  final best bid:   {} x {}", b.price, b.qty),
        None => println!("  final best bid:   none"),
    }
    match book.best_ask() {
        Some(a) => println!("  final best ask:   {} x {}", a.price, a.qty),
        None => println!("  final best ask:   none"),
    }

    Ok(())
}
