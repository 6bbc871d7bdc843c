//! Example: deduplicating requests with oppobloom
//!
//! Several worker threads receive a stream of request ids containing
//! retries. The filter lets each worker skip requests another worker has
//! already handled. Occasionally a duplicate slips through (a collision
//! evicted the earlier id), but a fresh request is never dropped.
//!
//! Run with `RUST_LOG=debug cargo run --example request_gate`.

use oppobloom::{IndexStrategy, OppoFilter, Options, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== oppobloom Request Gate Example ===\n");

    let options = Options::new().index_strategy(IndexStrategy::Folded);
    let filter = Arc::new(OppoFilter::with_options(50_000, options)?);
    println!("Filter capacity: {} slots", filter.size());

    let processed = Arc::new(AtomicUsize::new(0));
    let skipped = Arc::new(AtomicUsize::new(0));

    let num_workers = 4;
    let requests_per_worker = 20_000;

    let handles: Vec<_> = (0..num_workers)
        .map(|worker| {
            let filter = Arc::clone(&filter);
            let processed = Arc::clone(&processed);
            let skipped = Arc::clone(&skipped);
            thread::spawn(move || {
                for i in 0..requests_per_worker {
                    // Workers overlap on half of their ids to simulate retries.
                    let request = (worker * requests_per_worker / 2 + i) as u64;
                    let id = format!("req-{:010}", request);
                    if filter.contains(id.as_bytes()) {
                        skipped.fetch_add(1, Ordering::Relaxed);
                    } else {
                        processed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let unique = (num_workers + 1) * requests_per_worker / 2;
    let processed = processed.load(Ordering::Relaxed);
    println!("Unique requests:    {}", unique);
    println!("Processed:          {}", processed);
    println!("Skipped duplicates: {}", skipped.load(Ordering::Relaxed));
    println!(
        "Duplicates let through: {}",
        processed.saturating_sub(unique)
    );

    // Forgetting lets a request through again, e.g. after a failed attempt.
    filter.forget(b"req-0000000000");
    println!(
        "\nAfter forget, req-0000000000 seen? {}",
        filter.contains(b"req-0000000000")
    );

    Ok(())
}
