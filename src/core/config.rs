//! # Global runtime configuration.
//!
//! Provides [`Config`], centralized settings for workers and the tick driver.
//!
//! Config is used in two ways:
//! 1. **Scheduler creation**: `FrameScheduler::new(config)` — workers minted
//!    by the scheduler inherit its compaction settings.
//! 2. **Driver creation**: `TickDriver::spawn(worker, source, &config)` —
//!    the driver takes its shutdown grace from here.
//!
//! ## Sentinel values
//! - `compact_floor = 0` → compaction disabled (cancelled items are only ever
//!   discarded lazily when they reach the queue front)
//! - `grace = 0s` → shutdown does not wait; a still-running drive loop is
//!   reported immediately

use std::time::Duration;

/// Configuration for the scheduling runtime.
///
/// ## Field semantics
/// - `grace`: maximum wait for the drive loop to stop on shutdown
///   (`0s` = report immediately)
/// - `compact_floor`: queue length at which the worker starts rebuilding the
///   queue to shed cancelled items (`0` = never compact)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Maximum time to wait for the drive loop to exit during shutdown.
    ///
    /// When [`TickDriver::shutdown`](crate::TickDriver::shutdown) is called:
    /// - the loop's stop token is cancelled
    /// - the driver waits up to `grace` for the loop task to finish
    /// - if the wait times out, `DriveError::GraceExceeded` is returned
    pub grace: Duration,

    /// Queue-length watermark that triggers a compaction pass after a drain.
    ///
    /// - `0` = never compact (the original lazy-discard-only policy)
    /// - `n > 0` = once the queue holds at least `n` items after a drain,
    ///   rebuild it without cancelled items; the watermark then doubles with
    ///   the surviving length so compaction stays amortized
    pub compact_floor: usize,
}

impl Config {
    /// Returns the compaction watermark as an `Option`.
    ///
    /// - `None` → compaction disabled
    /// - `Some(n)` → compact once the queue holds at least `n` items
    #[inline]
    pub fn compaction_floor(&self) -> Option<usize> {
        if self.compact_floor == 0 {
            None
        } else {
            Some(self.compact_floor)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 5s` (drains are short; a loop that needs longer is stuck)
    /// - `compact_floor = 64` (small queues never pay for compaction)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            compact_floor: 64,
        }
    }
}
