//! Two-thread pipeline benchmark: generator -> SPSC queue -> book.
//!
//! Usage: `mt_bench <num_events> <seed>`
//!
//! Reports throughput and enqueue-to-processed latency percentiles after
//! discarding a warm-up prefix.

use std::env;

use anyhow::{bail, Context, Result};
use hdrhistogram::Histogram;

use tickmatch::{EventGenerator, OrderBook, PipelineConfig};

const QUEUE_CAPACITY: usize = 4096;
const WARMUP_EVENTS: usize = 20_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let (Some(num_events), Some(seed)) = (args.next(), args.next()) else {
        bail!("usage: mt_bench <num_events> <seed>");
    };
    let num_events: usize = num_events.parse().context("bad <num_events>")?;
    let seed: u64 = seed.parse().context("bad <seed>")?;

    let mut book = OrderBook::with_capacity(num_events);
    let config = PipelineConfig {
        queue_capacity: QUEUE_CAPACITY,
        latency_capacity: num_events,
        pin_consumer: true,
    };

    let report = tickmatch::run_pipeline(&mut book, EventGenerator::new(num_events, seed), &config);

    let seconds = report.elapsed.as_secs_f64();
    println!(
        "mt_bench: processed {} events in {seconds:.3} s",
        report.processed
    );
    if seconds > 0.0 && report.processed > 0 {
        println!(
            "  throughput: {:.0} events/s",
            report.processed as f64 / seconds
        );
        println!(
            "  mean:       {:.1} ns/event",
            report.elapsed.as_nanos() as f64 / report.processed as f64
        );
    }

    let samples = report
        .latencies_ns
        .iter()
        .take(report.processed)
        .skip(WARMUP_EVENTS);
    let mut histogram = Histogram::<u64>::new(3).context("histogram init")?;
    for &ns in samples {
        histogram.record(ns.max(1))?;
    }

    if histogram.len() > 0 {
        println!("Latency (enqueue -> processed):");
        println!("  p50: {} ns", histogram.value_at_quantile(0.50));
        println!("  p95: {} ns", histogram.value_at_quantile(0.95));
        println!("  p99: {} ns", histogram.value_at_quantile(0.99));
    }

    match book.best_bid() {
        Some(b) => println!("Final best bid: {} x {}", b.price, b.qty),
        None => println!("Final best bid: none"),
    }
    match book.best_ask() {
        Some(a) => println!("Final best ask: {} x {}", a.price, a.qty),
        None => println!("Final best ask: none"),
    }

    Ok(())
}
