//! # Frame-driven worker: drains due work once per host tick.
//!
//! A [`Worker`] owns a [`DueQueue`](super::queue::DueQueue) behind a mutex and
//! executes everything that has come due each time [`Worker::on_tick`] is
//! invoked. It never blocks waiting for time to pass; eligibility is decided
//! by comparing due times against the injected [`Clock`] at tick time, so an
//! item scheduled between frames runs on the first tick at or after its due
//! time.
//!
//! ## Drain pass
//! ```text
//! on_tick()
//!   │  (skipped if a drain is already in progress — ticks carry no payload)
//!   ▼
//! loop {
//!   lock queue
//!   ├─ queue empty or worker lifetime cancelled ──────────► stop
//!   ├─ front item's token cancelled ──► pop, discard, continue
//!   ├─ front item not yet due ───────────────────────────► stop
//!   ├─ front item inserted during this pass ──► set aside, continue
//!   └─ otherwise: pop, unlock, run the action, repeat
//! }
//! reinsert set-aside items, compact if the queue has grown fat
//! ```
//!
//! ## Rules
//! - Actions run **outside** the queue lock, so an action may schedule more
//!   work on the same worker without deadlocking.
//! - Work inserted while a pass is running is never executed by that same
//!   pass. A chain of actions that each reschedule themselves for "now"
//!   therefore advances exactly one step per tick, at constant stack depth,
//!   while items that were already queued still run the tick they are due.
//! - A panicking action is caught and reported; the remaining due items in
//!   the same pass still execute.
//! - `schedule*` may be called from any thread; only draining is exclusive.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::core::config::Config;
use crate::core::queue::{Action, DueQueue, Entry};
use crate::token::CancelToken;

/// State shared between worker handles and the drive loop.
struct WorkerState {
    queue: Mutex<DueQueue>,
    lifetime: CancelToken,
    /// Insertion counter; doubles as the marker separating items that existed
    /// before a drain pass from items inserted during it.
    seq: AtomicU64,
    /// True while a drain pass is running; passes never overlap.
    draining: AtomicBool,
    /// Queue length that triggers the next compaction pass.
    compact_at: AtomicUsize,
}

impl WorkerState {
    fn lock_queue(&self) -> MutexGuard<'_, DueQueue> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// What the front of the queue asks the drain loop to do.
enum Front {
    Stop,
    Discard,
    Defer,
    Run,
}

/// Executes scheduled, cancellable work on each host tick.
///
/// Cheap to clone; clones share the queue and lifetime. Workers are minted by
/// [`FrameScheduler::create_worker`](crate::FrameScheduler::create_worker).
///
/// ### Properties
/// - **Deterministic order**: due items execute in non-decreasing due-time
///   order; equal due times run in submission order.
/// - **Cancel-safe**: an item whose token is cancelled never executes; its
///   physical removal may be deferred (lazy discard).
/// - **Single-drainer**: drain passes never run concurrently for one worker,
///   regardless of how many threads deliver ticks.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::time::Duration;
/// use tickflow::{CancelToken, Config, FrameScheduler, ManualClock};
///
/// let clock = ManualClock::new();
/// let scheduler = FrameScheduler::with_clock(Config::default(), Arc::new(clock.clone()));
/// let worker = scheduler.create_worker(CancelToken::new());
///
/// let ran = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&ran);
/// let token = CancelToken::new();
/// worker.schedule_after(Duration::from_millis(20), &token, move || {
///     flag.store(true, Ordering::SeqCst);
/// });
///
/// worker.on_tick(); // nothing due yet
/// assert!(!ran.load(Ordering::SeqCst));
///
/// clock.advance(Duration::from_millis(20));
/// worker.on_tick();
/// assert!(ran.load(Ordering::SeqCst));
/// ```
#[derive(Clone)]
pub struct Worker {
    clock: Arc<dyn Clock>,
    state: Arc<WorkerState>,
    compact_floor: Option<usize>,
}

impl Worker {
    pub(crate) fn new(clock: Arc<dyn Clock>, lifetime: CancelToken, config: &Config) -> Self {
        Self {
            clock,
            state: Arc::new(WorkerState {
                queue: Mutex::new(DueQueue::new()),
                lifetime,
                seq: AtomicU64::new(0),
                draining: AtomicBool::new(false),
                compact_at: AtomicUsize::new(config.compact_floor),
            }),
            compact_floor: config.compaction_floor(),
        }
    }

    /// The lifetime governing this worker.
    ///
    /// Cancelling it stops all future drains; anything still queued is
    /// implicitly dead and will never be examined again.
    pub fn lifetime(&self) -> &CancelToken {
        &self.state.lifetime
    }

    /// Current reading of the worker's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Number of physically queued items, dead ones included.
    pub fn pending(&self) -> usize {
        self.state.lock_queue().len()
    }

    /// Enqueues `action` to run on the next tick.
    ///
    /// An already-cancelled `token` is accepted; the item is discarded lazily
    /// when it reaches the queue front instead of being rejected here.
    pub fn schedule(&self, token: &CancelToken, action: impl FnOnce() + Send + 'static) {
        self.push_at(self.clock.now(), token, Box::new(action));
    }

    /// Enqueues `action` to run at the first tick at or after `due`.
    pub fn schedule_at(&self, due: Instant, token: &CancelToken, action: impl FnOnce() + Send + 'static) {
        self.push_at(due, token, Box::new(action));
    }

    /// Enqueues `action` to run once `delay` has elapsed.
    pub fn schedule_after(&self, delay: Duration, token: &CancelToken, action: impl FnOnce() + Send + 'static) {
        self.push_at(self.clock.now() + delay, token, Box::new(action));
    }

    pub(crate) fn push_at(&self, due: Instant, token: &CancelToken, action: Action) {
        let seq = self.state.seq.fetch_add(1, Ordering::AcqRel);
        let mut queue = self.state.lock_queue();
        queue.push(Entry {
            due,
            seq,
            token: token.clone(),
            action,
        });
    }

    /// Runs one drain pass: executes every queued item that is due and still
    /// wanted, in `(due, submission)` order.
    ///
    /// This is the single entry point the tick adapter calls. It is safe to
    /// call from any thread, but a tick arriving while a pass is already
    /// running is a no-op — the running pass re-reads the clock on every
    /// iteration, so a coalesced tick cannot be ahead of it.
    pub fn on_tick(&self) {
        let state = &*self.state;
        if state
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        // Items at or past this sequence number were inserted during the
        // current pass and must wait for the next tick.
        let horizon = state.seq.load(Ordering::Acquire);
        let mut set_aside: Vec<Entry> = Vec::new();

        loop {
            let due_entry = {
                let mut queue = state.lock_queue();
                if !state.lifetime.is_active() {
                    break;
                }
                let now = self.clock.now();
                let front = match queue.peek() {
                    None => Front::Stop,
                    Some(head) if !head.token.is_active() => Front::Discard,
                    Some(head) if head.due > now => Front::Stop,
                    Some(head) if head.seq >= horizon => Front::Defer,
                    Some(_) => Front::Run,
                };
                match front {
                    Front::Stop => break,
                    Front::Discard => {
                        queue.pop();
                        continue;
                    }
                    Front::Defer => {
                        if let Some(entry) = queue.pop() {
                            set_aside.push(entry);
                        }
                        continue;
                    }
                    Front::Run => queue.pop(),
                }
            };
            if let Some(entry) = due_entry {
                execute(entry);
            }
        }

        {
            let mut queue = state.lock_queue();
            for entry in set_aside {
                queue.push(entry);
            }
            self.maybe_compact(&mut queue);
        }

        state.draining.store(false, Ordering::Release);
    }

    /// Sheds cancelled items once the queue crosses the watermark, then moves
    /// the watermark to twice the surviving length (amortizes the rebuild).
    fn maybe_compact(&self, queue: &mut DueQueue) {
        let Some(floor) = self.compact_floor else {
            return;
        };
        let watermark = self.state.compact_at.load(Ordering::Relaxed).max(floor);
        if queue.len() < watermark {
            return;
        }
        queue.retain_active();
        let next = queue.len().saturating_mul(2).max(floor);
        self.state.compact_at.store(next, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("active", &self.state.lifetime.is_active())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Runs one popped item with a final liveness check and panic isolation.
fn execute(entry: Entry) {
    if !entry.token.is_active() {
        return;
    }
    let action = entry.action;
    if let Err(panic_err) = catch_unwind(AssertUnwindSafe(action)) {
        eprintln!("[tickflow] scheduled action panicked: {panic_err:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::AtomicU32;

    fn worker_with_clock(clock: &ManualClock) -> Worker {
        Worker::new(
            Arc::new(clock.clone()),
            CancelToken::new(),
            &Config::default(),
        )
    }

    fn record(log: &Arc<Mutex<Vec<u32>>>, value: u32) -> impl FnOnce() + Send + 'static {
        let log = Arc::clone(log);
        move || log.lock().unwrap().push(value)
    }

    #[test]
    fn test_due_items_run_in_due_order() {
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let base = clock.now();

        worker.schedule_at(base + Duration::from_millis(30), &token, record(&log, 30));
        worker.schedule_at(base + Duration::from_millis(10), &token, record(&log, 10));
        worker.schedule_at(base + Duration::from_millis(20), &token, record(&log, 20));

        clock.advance(Duration::from_millis(100));
        worker.on_tick();

        assert_eq!(*log.lock().unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_nothing_runs_before_its_due_time() {
        // X at 100ms, Y at 50ms; ticks at 40ms, 60ms, 150ms.
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let base = clock.now();

        worker.schedule_at(base + Duration::from_millis(100), &token, record(&log, 100));
        worker.schedule_at(base + Duration::from_millis(50), &token, record(&log, 50));

        clock.set_elapsed(Duration::from_millis(40));
        worker.on_tick();
        assert!(log.lock().unwrap().is_empty());

        clock.set_elapsed(Duration::from_millis(60));
        worker.on_tick();
        assert_eq!(*log.lock().unwrap(), vec![50]);

        clock.set_elapsed(Duration::from_millis(150));
        worker.on_tick();
        assert_eq!(*log.lock().unwrap(), vec![50, 100]);
    }

    #[test]
    fn test_equal_due_times_run_in_submission_order() {
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let due = clock.now() + Duration::from_millis(10);

        for i in 0..5 {
            worker.schedule_at(due, &token, record(&log, i));
        }
        clock.advance(Duration::from_millis(10));
        worker.on_tick();

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancelled_before_due_never_runs() {
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        worker.schedule_after(Duration::from_millis(10), &token, move || {
            flag.store(true, Ordering::SeqCst);
        });
        token.cancel();

        for _ in 0..10 {
            clock.advance(Duration::from_millis(10));
            worker.on_tick();
        }
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_pre_cancelled_token_is_accepted_then_discarded() {
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::cancelled();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        worker.schedule(&token, move || {
            flag.store(true, Ordering::SeqCst);
        });
        assert_eq!(worker.pending(), 1);

        worker.on_tick();
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(worker.pending(), 0);
    }

    #[test]
    fn test_worker_lifetime_cancel_stops_draining() {
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        worker.schedule(&token, move || {
            flag.store(true, Ordering::SeqCst);
        });
        worker.lifetime().cancel();

        worker.on_tick();
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_work_scheduled_during_drain_waits_for_next_tick() {
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let count = Arc::new(AtomicU32::new(0));

        let w = worker.clone();
        let t = token.clone();
        let c = Arc::clone(&count);
        worker.schedule(&token, move || {
            c.fetch_add(1, Ordering::SeqCst);
            let c2 = Arc::clone(&c);
            w.schedule(&t, move || {
                c2.fetch_add(1, Ordering::SeqCst);
            });
        });

        worker.on_tick();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        worker.on_tick();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reschedule_chains_advance_one_step_per_tick() {
        // N chains that each reschedule themselves for "now", driven for K
        // ticks, must execute exactly N×K times with constant stack depth.
        const CHAINS: u32 = 100;
        const TICKS: u32 = 5;

        fn rearm(worker: &Worker, token: &CancelToken, count: Arc<AtomicU32>) {
            let w = worker.clone();
            let t = token.clone();
            worker.schedule(token, move || {
                count.fetch_add(1, Ordering::SeqCst);
                rearm(&w, &t, count);
            });
        }

        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let count = Arc::new(AtomicU32::new(0));

        for _ in 0..CHAINS {
            rearm(&worker, &token, Arc::clone(&count));
        }
        for _ in 0..TICKS {
            worker.on_tick();
        }

        assert_eq!(count.load(Ordering::SeqCst), CHAINS * TICKS);
        token.cancel();
    }

    #[test]
    fn test_deferred_item_does_not_starve_already_due_work() {
        // A runs and schedules B with an already-past due time; C was queued
        // before the pass and is due. C must still run this tick, B on the
        // next one.
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(100));
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let past = clock.now() - Duration::from_millis(50);

        let w = worker.clone();
        let t = token.clone();
        let b = record(&log, 2);
        let log_a = Arc::clone(&log);
        worker.schedule(&token, move || {
            log_a.lock().unwrap().push(1);
            w.schedule_at(past, &t, b);
        });
        worker.schedule(&token, record(&log, 3));

        worker.on_tick();
        assert_eq!(*log.lock().unwrap(), vec![1, 3]);

        worker.on_tick();
        assert_eq!(*log.lock().unwrap(), vec![1, 3, 2]);
    }

    #[test]
    fn test_panicking_action_does_not_stop_the_pass() {
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let ran = Arc::new(AtomicBool::new(false));

        worker.schedule(&token, || panic!("boom"));
        let flag = Arc::clone(&ran);
        worker.schedule(&token, move || {
            flag.store(true, Ordering::SeqCst);
        });

        worker.on_tick();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_submission_from_many_threads() {
        let clock = ManualClock::new();
        let worker = worker_with_clock(&clock);
        let token = CancelToken::new();
        let count = Arc::new(AtomicU32::new(0));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let worker = worker.clone();
                let token = token.clone();
                let count = Arc::clone(&count);
                scope.spawn(move || {
                    for _ in 0..100 {
                        let c = Arc::clone(&count);
                        worker.schedule(&token, move || {
                            c.fetch_add(1, Ordering::SeqCst);
                        });
                    }
                });
            }
        });

        worker.on_tick();
        assert_eq!(count.load(Ordering::SeqCst), 800);
    }

    #[test]
    fn test_compaction_sheds_cancelled_backlog() {
        let clock = ManualClock::new();
        let worker = Worker::new(
            Arc::new(clock.clone()),
            CancelToken::new(),
            &Config {
                compact_floor: 8,
                ..Config::default()
            },
        );
        let token = CancelToken::new();

        // A live, not-yet-due item holds the queue front, so the cancelled
        // items behind it are never peeked and only compaction can shed them.
        worker.schedule_after(Duration::from_secs(1800), &token, || {});
        let doomed = CancelToken::new();
        for _ in 0..100 {
            worker.schedule_after(Duration::from_secs(3600), &doomed, || {});
        }
        doomed.cancel();
        assert_eq!(worker.pending(), 101);

        worker.on_tick();
        assert_eq!(worker.pending(), 1);
    }

    #[test]
    fn test_compaction_disabled_keeps_lazy_policy() {
        let clock = ManualClock::new();
        let worker = Worker::new(
            Arc::new(clock.clone()),
            CancelToken::new(),
            &Config {
                compact_floor: 0,
                ..Config::default()
            },
        );
        let token = CancelToken::new();

        worker.schedule_after(Duration::from_secs(1800), &token, || {});
        let doomed = CancelToken::new();
        for _ in 0..100 {
            worker.schedule_after(Duration::from_secs(3600), &doomed, || {});
        }
        doomed.cancel();

        worker.on_tick();
        assert_eq!(worker.pending(), 101);
    }
}
