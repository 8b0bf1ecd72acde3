//! # Scheduler facade: clock ownership and worker creation.
//!
//! [`FrameScheduler`] pairs a [`Clock`] with a [`Config`] and mints
//! [`Worker`]s bound to both. There is deliberately no process-wide singleton
//! accessor: construct one at startup, inject it by reference into whatever
//! needs to mint workers, and let it drop at shutdown.
//!
//! [`Schedule`] is the capability the rest of a composition layer should
//! depend on — anything that can read a clock and enqueue cancellable work
//! qualifies; no deeper hierarchy is needed.

use std::sync::Arc;
use std::time::Instant;

use crate::clock::{Clock, MonotonicClock};
use crate::core::config::Config;
use crate::core::queue::Action;
use crate::core::worker::Worker;
use crate::token::CancelToken;

/// The two-method scheduling capability: read the clock, enqueue work gated
/// by a cancellation token.
///
/// Object-safe so composition layers can hold `&dyn Schedule` or
/// `Arc<dyn Schedule>` without caring which worker is behind it.
pub trait Schedule: Send + Sync {
    /// Current clock reading.
    fn now(&self) -> Instant;

    /// Enqueues `action` to run on the next tick.
    fn schedule(&self, token: &CancelToken, action: Box<dyn FnOnce() + Send + 'static>);

    /// Enqueues `action` to run at the first tick at or after `due`.
    fn schedule_at(
        &self,
        due: Instant,
        token: &CancelToken,
        action: Box<dyn FnOnce() + Send + 'static>,
    );
}

impl Schedule for Worker {
    fn now(&self) -> Instant {
        Worker::now(self)
    }

    fn schedule(&self, token: &CancelToken, action: Action) {
        self.push_at(Worker::now(self), token, action);
    }

    fn schedule_at(&self, due: Instant, token: &CancelToken, action: Action) {
        self.push_at(due, token, action);
    }
}

/// Creates workers that share one clock and one configuration.
///
/// # Example
/// ```
/// use tickflow::{CancelToken, Config, FrameScheduler};
///
/// let scheduler = FrameScheduler::new(Config::default());
/// let worker = scheduler.create_worker(CancelToken::new());
///
/// let token = CancelToken::new();
/// worker.schedule(&token, || println!("runs on the next tick"));
/// worker.on_tick();
/// ```
#[derive(Clone)]
pub struct FrameScheduler {
    clock: Arc<dyn Clock>,
    config: Config,
}

impl FrameScheduler {
    /// Creates a scheduler over the wall clock.
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    /// Creates a scheduler over an injected clock (tests, host-owned timing).
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self { clock, config }
    }

    /// Current clock reading.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// The configuration workers inherit.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mints a worker whose drains are gated by `lifetime`.
    pub fn create_worker(&self, lifetime: CancelToken) -> Worker {
        Worker::new(Arc::clone(&self.clock), lifetime, &self.config)
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_workers_share_the_scheduler_clock() {
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::with_clock(Config::default(), Arc::new(clock.clone()));
        let worker = scheduler.create_worker(CancelToken::new());

        clock.advance(Duration::from_millis(25));
        assert_eq!(worker.now(), scheduler.now());
    }

    #[test]
    fn test_schedule_capability_through_trait_object() {
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::with_clock(Config::default(), Arc::new(clock.clone()));
        let worker = scheduler.create_worker(CancelToken::new());
        let capability: Arc<dyn Schedule> = Arc::new(worker.clone());

        let token = CancelToken::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = Arc::clone(&log);
        capability.schedule(&token, Box::new(move || l.lock().unwrap().push("now")));
        let l = Arc::clone(&log);
        capability.schedule_at(
            capability.now() + Duration::from_millis(10),
            &token,
            Box::new(move || l.lock().unwrap().push("later")),
        );

        worker.on_tick();
        assert_eq!(*log.lock().unwrap(), vec!["now"]);

        clock.advance(Duration::from_millis(10));
        worker.on_tick();
        assert_eq!(*log.lock().unwrap(), vec!["now", "later"]);
    }
}
