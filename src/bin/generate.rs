//! Emit a synthetic CSV event stream to stdout.
//!
//! Usage: `generate <num_events> <seed>`

use std::env;
use std::io::{self, BufWriter, Write};

use anyhow::{bail, Context, Result};

use tickmatch::{Event, EventGenerator, Side};

fn side_str(side: Side) -> &'static str {
    match side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    }
}

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let (Some(num_events), Some(seed)) = (args.next(), args.next()) else {
        bail!("usage: generate <num_events> <seed>");
    };
    let num_events: usize = num_events.parse().context("bad <num_events>")?;
    let seed: u64 = seed.parse().context("bad <seed>")?;

    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);

    // header comment; replay skips it
    writeln!(out, "# type,side,price,qty,id")?;

    for event in EventGenerator::new(num_events, seed) {
        match event {
            Event::Add {
                side,
                price,
                qty,
                id,
            } => writeln!(out, "ADD,{},{price},{qty},{id}", side_str(side))?,
            Event::Market { side, qty } => writeln!(out, "MKT,{},{qty}", side_str(side))?,
            Event::Cancel { id } => writeln!(out, "CANCEL,{id}")?,
            Event::End => break,
        }
    }

    out.flush()?;
    Ok(())
}
