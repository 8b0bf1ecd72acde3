//! Tick adapter: bridging a host frame loop into workers.
//!
//! This module is the only place host-side event plumbing is touched. Public
//! API:
//! - [`TickSource`] and its implementations ([`IntervalTicks`],
//!   [`ChannelTicks`]/[`TickSender`], [`StreamTicks`]): where frames come
//!   from;
//! - [`TickDriver`]: the one loop forwarding frames into
//!   [`Worker::on_tick`](crate::Worker::on_tick);
//! - [`FrameTimes`]/[`TimedTicks`]: per-frame elapsed-time feeds layered on
//!   any source.

mod driver;
mod source;
mod times;

pub use driver::TickDriver;
pub use source::{ChannelTicks, IntervalTicks, StreamTicks, Tick, TickSender, TickSource};
pub use times::{FrameTimes, TimedTicks};
