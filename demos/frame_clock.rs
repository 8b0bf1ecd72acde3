//! # Example: frame_clock
//!
//! Drives a worker from a fixed-rate tick source and derives state from the
//! per-frame time feeds.
//!
//! Shows how to:
//! - Mint a worker with [`FrameScheduler::create_worker`]
//! - Layer [`FrameTimes`] feeds on an [`IntervalTicks`] source
//! - Schedule delayed work and let frames make it due
//! - Shut the driver down within its grace period
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► FrameScheduler + Worker
//!   ├─► FrameTimes::wrap(IntervalTicks @ ~60fps)
//!   ├─► subscribe to frames()/millis() feeds
//!   ├─► schedule work at +50ms and +120ms
//!   ├─► TickDriver::spawn(...)          (frames start flowing)
//!   ├─► sleep 300ms                      (let the loop run)
//!   └─► driver.shutdown()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example frame_clock
//! ```

use std::sync::Arc;
use std::time::Duration;

use tickflow::{
    CancelToken, Clock, Config, FrameScheduler, FrameTimes, IntervalTicks, MonotonicClock,
    TickDriver,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== frame_clock example ===\n");

    // 1. Scheduler and worker
    let scheduler = FrameScheduler::new(Config::default());
    let worker = scheduler.create_worker(CancelToken::new());

    // 2. ~60fps tick source, decorated with frame-time feeds
    let clock: Arc<dyn Clock> = Arc::new(MonotonicClock);
    let (times, ticks) = FrameTimes::wrap(clock, IntervalTicks::new(Duration::from_millis(16)));

    // 3. Subscribe to the feeds (the subscriber sees the current value
    //    immediately, then one update per frame)
    let _frames_sub = times.frames().subscribe(|frame| {
        if frame % 5 == 0 {
            println!("[feed] frame #{frame}");
        }
    });
    let millis = times.millis();

    // 4. Schedule delayed work; it runs on the first frame at or after its
    //    due time
    let token = CancelToken::new();
    {
        let millis = millis.clone();
        worker.schedule_after(Duration::from_millis(50), &token, move || {
            println!("[work] +50ms item ran (feed says {}ms)", millis.get());
        });
    }
    worker.schedule_after(Duration::from_millis(120), &token, || {
        println!("[work] +120ms item ran");
    });

    // 5. Start driving frames into the worker
    let driver = TickDriver::spawn(worker.clone(), ticks, scheduler.config());

    // 6. Let it run for a while
    tokio::time::sleep(Duration::from_millis(300)).await;

    // 7. Stop the loop
    driver.shutdown().await?;
    println!("\n[main] stopped after {} frames", times.frames().get());

    println!("\n=== example completed successfully ===");
    Ok(())
}
