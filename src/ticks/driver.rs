//! # Tick driver: the one subscription between host loop and worker.
//!
//! [`TickDriver`] spawns the single task that forwards frames from a
//! [`TickSource`] into [`Worker::on_tick`]. It is the only place host-side
//! event plumbing is touched; the worker itself never awaits anything.
//!
//! ## Lifecycle
//! ```text
//! spawn(worker, source, cfg)
//!   │
//!   ▼
//! loop {
//!   select! {
//!     stop cancelled ───────────► break     (shutdown() or worker lifetime)
//!     source.next_tick() ─┬─ Some ─► worker.on_tick()
//!                         └─ None ──► break  (host loop ended)
//!   }
//! }
//! ```
//!
//! The worker's lifetime token is bridged into the loop's stop token with a
//! cancellation cleanup, so cancelling the worker also stops the drive loop
//! without a separate call.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::{Config, Worker};
use crate::error::DriveError;
use crate::ticks::source::TickSource;

/// Owns the drive loop task for one worker.
///
/// ### Properties
/// - **One subscription**: created once for the worker's whole lifetime.
/// - **Three stop conditions**: explicit [`shutdown`](TickDriver::shutdown),
///   the tick source running dry, or the worker's lifetime being cancelled.
/// - **Grace-bounded shutdown**: a drive loop stuck inside a drain (a
///   blocking action) is reported as [`DriveError::GraceExceeded`] rather
///   than awaited forever.
pub struct TickDriver {
    stop: CancellationToken,
    handle: JoinHandle<()>,
    grace: Duration,
}

impl TickDriver {
    /// Spawns the drive loop. Must be called within a tokio runtime.
    pub fn spawn<S: TickSource>(worker: Worker, mut source: S, config: &Config) -> Self {
        let stop = CancellationToken::new();

        let bridge = stop.clone();
        worker.lifetime().on_cancel(move || bridge.cancel());

        let loop_stop = stop.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_stop.cancelled() => break,
                    tick = source.next_tick() => match tick {
                        Some(_) => worker.on_tick(),
                        None => break,
                    },
                }
            }
        });

        Self {
            stop,
            handle,
            grace: config.grace,
        }
    }

    /// True once the drive loop has exited (for any of the stop conditions).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the drive loop and waits up to the configured grace for it to
    /// exit.
    pub async fn shutdown(self) -> Result<(), DriveError> {
        self.stop.cancel();
        match time::timeout(self.grace, self.handle).await {
            Ok(_) => Ok(()),
            Err(_elapsed) => Err(DriveError::GraceExceeded { grace: self.grace }),
        }
    }
}

impl std::fmt::Debug for TickDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickDriver")
            .field("finished", &self.is_finished())
            .field("grace", &self.grace)
            .finish()
    }
}
