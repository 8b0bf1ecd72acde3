//! # tickflow
//!
//! **Tickflow** is a frame-driven reactive scheduling library for Rust.
//!
//! It provides the substrate a reactive composition layer needs to run under
//! a host event loop: a deterministic, cancellable scheduler whose work is
//! drained once per host tick, and a thread-safe latest-value broadcast cell
//! ([`Behavior`]) for composing live data streams. The crate never blocks
//! waiting for time to pass — timed work becomes eligible at the first tick
//! at or after its due time.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  host frame loop                 any thread
//!       │ tick                          │ schedule / schedule_at / cancel
//!       ▼                               ▼
//! ┌──────────────┐  Tick   ┌─────────────────────────────────────────┐
//! │  TickSource  │ ──────► │  Worker                                 │
//! │ (interval /  │         │  - due-ordered queue (mutex-guarded)    │
//! │  channel /   │         │  - lifetime CancelToken                 │
//! │  stream)     │         │  - one drain pass per tick              │
//! └──────┬───────┘         └──────────────┬──────────────────────────┘
//!        │                                │ executed actions
//!   TickDriver                            ▼
//!  (one spawned loop,        ┌─────────────────────────────┐
//!   stop token bridged       │  Behavior<T> (per stream)   │
//!   to worker lifetime)      │  - current value (mutex)    │
//!                            │  - observer fan-out         │
//!                            └──────────────┬──────────────┘
//!                                           ▼
//!                              subscribers (composition layer)
//! ```
//!
//! ### Drain pass (per tick)
//! ```text
//! loop {
//!   ├─ queue empty or lifetime cancelled ──► stop
//!   ├─ front token cancelled ──► discard lazily, continue
//!   ├─ front not yet due ──► stop
//!   ├─ front inserted during this pass ──► defer to next tick
//!   └─ pop, unlock, execute (panic-isolated), repeat
//! }
//! ```
//!
//! ## Features
//! | Area             | Description                                                   | Key types / traits                      |
//! |------------------|---------------------------------------------------------------|-----------------------------------------|
//! | **Scheduling**   | Enqueue cancellable work for "now" or a due time.             | [`Worker`], [`Schedule`], [`CancelToken`] |
//! | **Ticks**        | Bridge a host frame loop into workers.                        | [`TickSource`], [`TickDriver`]          |
//! | **Streams**      | Latest-value broadcast for live data.                         | [`Behavior`]                            |
//! | **Frame time**   | Elapsed-time feeds updated once per frame.                    | [`FrameTimes`]                          |
//! | **Time control** | Injectable clocks, hand-advanced in tests.                    | [`Clock`], [`ManualClock`]              |
//! | **Errors**       | Grace-bounded driver shutdown.                                | [`DriveError`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`ValueLog`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tickflow::{CancelToken, ChannelTicks, Config, FrameScheduler, TickDriver};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = FrameScheduler::new(Config::default());
//!     let worker = scheduler.create_worker(CancelToken::new());
//!
//!     // The host loop pushes one tick per frame.
//!     let (frames, ticks) = ChannelTicks::channel();
//!     let driver = TickDriver::spawn(worker.clone(), ticks, scheduler.config());
//!
//!     let token = CancelToken::new();
//!     worker.schedule(&token, || println!("runs on the next frame"));
//!     worker.schedule_after(Duration::from_millis(100), &token, || {
//!         println!("runs on the first frame at or after +100ms");
//!     });
//!
//!     frames.tick(); // one frame elapsed
//!
//!     driver.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod behavior;
mod clock;
mod core;
mod error;
mod ticks;
mod token;

// ---- Public re-exports ----

pub use behavior::Behavior;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use core::{Config, FrameScheduler, Schedule, Worker};
pub use error::DriveError;
pub use ticks::{
    ChannelTicks, FrameTimes, IntervalTicks, StreamTicks, Tick, TickDriver, TickSender,
    TickSource, TimedTicks,
};
pub use token::{CancelToken, CleanupHandle};

// Optional: expose a simple built-in value logger (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod logging;
#[cfg(feature = "logging")]
pub use logging::ValueLog;
