//! # Example: manual_frames
//!
//! A host loop that owns its own timing and pushes one tick per frame, with
//! behavior values logged through the built-in [`ValueLog`].
//!
//! Shows how to:
//! - Feed frames through [`ChannelTicks`] / [`TickSender`]
//! - Broadcast live values with [`Behavior`] and watch them with `ValueLog`
//! - End the drive loop by dropping the sender (host loop finished)
//!
//! ## Run
//! ```bash
//! cargo run --example manual_frames --features logging
//! ```

use std::time::Duration;

use tickflow::{Behavior, CancelToken, ChannelTicks, Config, FrameScheduler, TickDriver, ValueLog};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== manual_frames example ===\n");

    // 1. Scheduler, worker, and a host-fed tick source
    let scheduler = FrameScheduler::new(Config::default());
    let worker = scheduler.create_worker(CancelToken::new());
    let (frames, ticks) = ChannelTicks::channel();
    let driver = TickDriver::spawn(worker.clone(), ticks, scheduler.config());

    // 2. A live value, logged on every push
    let center = Behavior::new((0.0f32, 0.0f32));
    let _log = ValueLog::attach(&center, "center");

    // 3. A chain that nudges the value and re-arms itself. Work scheduled
    //    during a drain waits for the next tick, so the chain advances
    //    exactly one step per frame.
    fn nudge(worker: &tickflow::Worker, token: &CancelToken, center: Behavior<(f32, f32)>) {
        let w = worker.clone();
        let t = token.clone();
        worker.schedule(token, move || {
            let (x, y) = center.get();
            center.push((x + 1.0, y + 0.5));
            nudge(&w, &t, center);
        });
    }
    let token = CancelToken::new();
    nudge(&worker, &token, center.clone());

    // 4. Host loop: five frames, one tick each
    for frame in 1..=5 {
        println!("[host] frame {frame}");
        frames.tick();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // 5. Host loop ends; dropping the sender stops the driver
    token.cancel();
    drop(frames);
    driver.shutdown().await?;

    println!("\n[main] final center = {:?}", center.get());
    println!("\n=== example completed successfully ===");
    Ok(())
}
