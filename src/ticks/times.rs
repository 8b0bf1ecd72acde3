//! # Frame time feeds: per-frame elapsed time as behaviors.
//!
//! [`FrameTimes`] decorates a tick source so every frame first publishes the
//! elapsed time (and a frame counter) into [`Behavior`]s, then forwards the
//! tick to the drive loop. Composition layers subscribe to these feeds to
//! derive animation state from time, the same way they would subscribe to
//! any other behavior.
//!
//! ```text
//! host frame ─► TimedTicks::next_tick
//!                 ├─ millis/micros/seconds/frames .push(...)
//!                 └─ forward Tick ─► TickDriver ─► Worker::on_tick
//! ```
//!
//! The feeds update before the worker drains, so work executed during the
//! drain already observes the current frame's times.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;

use crate::behavior::Behavior;
use crate::clock::Clock;
use crate::ticks::source::{Tick, TickSource};

/// Per-frame elapsed-time feeds.
///
/// Cheap to clone; clones share the underlying behaviors.
#[derive(Clone)]
pub struct FrameTimes {
    clock: Arc<dyn Clock>,
    epoch: Instant,
    frame_count: Arc<AtomicU64>,
    millis: Behavior<u64>,
    micros: Behavior<u64>,
    seconds: Behavior<f32>,
    frames: Behavior<u64>,
}

impl FrameTimes {
    /// Decorates `source`: returns the feeds and the wrapped source to hand
    /// to the [`TickDriver`](crate::TickDriver).
    ///
    /// The epoch is the clock reading at the time of the call; all feeds
    /// start at zero.
    pub fn wrap<S: TickSource>(clock: Arc<dyn Clock>, source: S) -> (FrameTimes, TimedTicks<S>) {
        let epoch = clock.now();
        let times = FrameTimes {
            clock,
            epoch,
            frame_count: Arc::new(AtomicU64::new(0)),
            millis: Behavior::new(0),
            micros: Behavior::new(0),
            seconds: Behavior::new(0.0),
            frames: Behavior::new(0),
        };
        let timed = TimedTicks {
            source,
            times: times.clone(),
        };
        (times, timed)
    }

    /// Elapsed whole milliseconds since the epoch, updated once per frame.
    pub fn millis(&self) -> Behavior<u64> {
        self.millis.clone()
    }

    /// Elapsed whole microseconds since the epoch, updated once per frame.
    pub fn micros(&self) -> Behavior<u64> {
        self.micros.clone()
    }

    /// Elapsed seconds as a float, updated once per frame.
    pub fn seconds(&self) -> Behavior<f32> {
        self.seconds.clone()
    }

    /// Frames observed so far (1 on the first frame).
    pub fn frames(&self) -> Behavior<u64> {
        self.frames.clone()
    }

    fn on_frame(&self) {
        let elapsed = self.clock.now().saturating_duration_since(self.epoch);
        let frame = self.frame_count.fetch_add(1, Ordering::AcqRel) + 1;
        self.millis.push(elapsed.as_millis() as u64);
        self.micros.push(elapsed.as_micros() as u64);
        self.seconds.push(elapsed.as_secs_f32());
        self.frames.push(frame);
    }
}

impl std::fmt::Debug for FrameTimes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTimes")
            .field("frames", &self.frame_count.load(Ordering::Relaxed))
            .finish()
    }
}

/// A tick source that publishes frame times before forwarding each tick.
pub struct TimedTicks<S> {
    source: S,
    times: FrameTimes,
}

#[async_trait]
impl<S: TickSource> TickSource for TimedTicks<S> {
    async fn next_tick(&mut self) -> Option<Tick> {
        let tick = self.source.next_tick().await;
        if tick.is_some() {
            self.times.on_frame();
        }
        tick
    }
}
