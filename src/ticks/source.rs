//! # Tick sources: where frames come from.
//!
//! A [`TickSource`] yields one [`Tick`] per host frame. The scheduler needs
//! no payload from a tick beyond "check the clock now", so `Tick` is an
//! opaque marker and a source that runs dry (`None`) simply ends the drive
//! loop.
//!
//! ## Implementations
//! - [`IntervalTicks`] — fixed frame rate off a tokio interval; missed
//!   frames are skipped, not burst, matching a frame loop that drops frames
//!   rather than replaying them.
//! - [`ChannelTicks`] — the host loop owns its own timing and pushes a tick
//!   per frame through the paired [`TickSender`].
//! - [`StreamTicks`] — adapts any `futures::Stream` of ticks.

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

/// One "a frame elapsed" notification. Carries no payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick;

/// Per-frame notification source consumed by the
/// [`TickDriver`](crate::TickDriver).
///
/// Returning `None` means the host loop ended; the drive loop then stops.
#[async_trait]
pub trait TickSource: Send + 'static {
    /// Waits for the next frame.
    async fn next_tick(&mut self) -> Option<Tick>;
}

/// Fixed-rate tick source.
///
/// The first tick fires immediately; subsequent ticks fire once per
/// `period`. Frames the consumer was too slow to observe are skipped.
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    /// Creates a source ticking every `period`.
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> Option<Tick> {
        self.interval.tick().await;
        Some(Tick)
    }
}

/// Sending half paired with [`ChannelTicks`]: the host loop calls
/// [`tick`](TickSender::tick) once per frame.
#[derive(Clone, Debug)]
pub struct TickSender {
    tx: mpsc::UnboundedSender<Tick>,
}

impl TickSender {
    /// Signals that a frame elapsed.
    ///
    /// Returns `false` if the receiving drive loop is gone.
    pub fn tick(&self) -> bool {
        self.tx.send(Tick).is_ok()
    }
}

/// Tick source fed by a host loop through an unbounded channel.
///
/// Dropping every [`TickSender`] ends the source.
pub struct ChannelTicks {
    rx: mpsc::UnboundedReceiver<Tick>,
}

impl ChannelTicks {
    /// Creates a connected `(sender, source)` pair.
    pub fn channel() -> (TickSender, ChannelTicks) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TickSender { tx }, ChannelTicks { rx })
    }
}

#[async_trait]
impl TickSource for ChannelTicks {
    async fn next_tick(&mut self) -> Option<Tick> {
        self.rx.recv().await
    }
}

/// Adapts any stream of ticks into a [`TickSource`].
pub struct StreamTicks<S> {
    stream: S,
}

impl<S> StreamTicks<S>
where
    S: Stream<Item = Tick> + Unpin + Send + 'static,
{
    /// Wraps `stream`; the source ends when the stream does.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> TickSource for StreamTicks<S>
where
    S: Stream<Item = Tick> + Unpin + Send + 'static,
{
    async fn next_tick(&mut self) -> Option<Tick> {
        self.stream.next().await
    }
}
