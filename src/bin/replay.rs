//! Replay a recorded CSV event file through the book and print a summary.
//!
//! Usage: `replay <events_file>`

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{bail, Context, Result};
use tracing::debug;

use tickmatch::{parse_csv_line, OrderBook, ReplayStats};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: replay <events_file>");
    };

    let file = File::open(&path).with_context(|| format!("failed to open {path}"))?;
    let reader = BufReader::new(file);

    let mut book = OrderBook::new();
    let mut stats = ReplayStats::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read error at line {}", line_no + 1))?;
        let event = match parse_csv_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue, // comment or blank
            Err(err) => {
                debug!(line_no = line_no + 1, %err, "skipping line");
                stats.skipped += 1;
                continue;
            }
        };

        stats.apply(&mut book, &event);
        stats.observe(&book);
    }

    print!("{}", stats.summary(&book));
    Ok(())
}
