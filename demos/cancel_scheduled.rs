//! # Example: cancel_scheduled
//!
//! Cancels queued work before it comes due, without any async runtime: the
//! host calls [`Worker::on_tick`] itself and time is a [`ManualClock`].
//!
//! Shows how to:
//! - Schedule two items at different due times
//! - Cancel one token before its item is due
//! - Verify the cancelled item never runs, however many ticks follow
//!
//! ## Run
//! ```bash
//! cargo run --example cancel_scheduled
//! ```

use std::sync::Arc;
use std::time::Duration;

use tickflow::{CancelToken, Config, FrameScheduler, ManualClock};

fn main() {
    println!("=== cancel_scheduled example ===\n");

    // 1. Scheduler over a hand-advanced clock
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::with_clock(Config::default(), Arc::new(clock.clone()));
    let worker = scheduler.create_worker(CancelToken::new());

    // 2. Two items: one wanted, one to be cancelled
    let keep = CancelToken::new();
    let drop_it = CancelToken::new();
    worker.schedule_after(Duration::from_millis(50), &keep, || {
        println!("[work] kept item ran at +50ms");
    });
    worker.schedule_after(Duration::from_millis(30), &drop_it, || {
        println!("[work] this line must never print");
    });
    println!("[main] queued 2 items, pending = {}", worker.pending());

    // 3. Cancel the second item before it is due
    drop_it.cancel();
    println!("[main] cancelled the +30ms item");

    // 4. Host-driven frames at +20ms each
    for frame in 1..=4 {
        clock.advance(Duration::from_millis(20));
        println!("[host] frame {frame} at +{}ms", clock.elapsed().as_millis());
        worker.on_tick();
    }

    // 5. The cancelled item was discarded lazily during the drains
    println!("[main] pending after frames = {}", worker.pending());

    println!("\n=== example completed successfully ===");
}
