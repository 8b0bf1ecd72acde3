//! # Cancellation token: a shared, revocable "still wanted" flag.
//!
//! [`CancelToken`] gates whether a scheduled action or a behavior observer is
//! still wanted. Clones share one state; the transition is one-way:
//!
//! ```text
//! Active ──cancel()──► Cancelled          (terminal)
//!    │
//!    └─ on_cancel(f): stored, runs exactly once on the first cancel()
//! ```
//!
//! ## Rules
//! - `cancel()` is idempotent; concurrent calls never double-run cleanups.
//! - Cleanup actions run **outside** the token's own lock, in unspecified
//!   order, so a cleanup may freely touch other locked structures (e.g. a
//!   worker's queue) without deadlocking against the token.
//! - Registering a cleanup on an already-cancelled token runs it
//!   synchronously instead of storing it.
//! - A panicking cleanup is caught and reported; remaining cleanups still
//!   run.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

type Cleanup = Box<dyn FnOnce() + Send>;

/// Handle returned by [`CancelToken::on_cancel`], usable to drop a registered
/// cleanup without running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupHandle(u64);

/// Reserved id for registrations made after cancellation (the action already
/// ran; the handle is inert).
const SPENT: u64 = 0;

enum State {
    Active {
        next_id: u64,
        cleanups: HashMap<u64, Cleanup>,
    },
    Cancelled,
}

struct Inner {
    state: Mutex<State>,
}

/// Shared cancellation flag with cleanup registration.
///
/// ### Properties
/// - **Cheap to clone**: internally a single `Arc`.
/// - **Thread-safe**: state transitions happen under a lock; liveness checks
///   are non-blocking reads of that lock.
/// - **Infallible**: purely a coordination flag, no operation can fail.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use tickflow::CancelToken;
///
/// let token = CancelToken::new();
/// let ran = Arc::new(AtomicU32::new(0));
///
/// let counter = Arc::clone(&ran);
/// token.on_cancel(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert!(token.is_active());
/// token.cancel();
/// token.cancel(); // idempotent
/// assert!(!token.is_active());
/// assert_eq!(ran.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Creates a fresh, active token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Active {
                    next_id: SPENT + 1,
                    cleanups: HashMap::new(),
                }),
            }),
        }
    }

    /// Creates a token that is already cancelled.
    ///
    /// Used where an operation must hand back an inert subscription (e.g.
    /// subscribing to a closed [`Behavior`](crate::Behavior)).
    pub fn cancelled() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Cancelled),
            }),
        }
    }

    /// Returns `true` while the token has not been cancelled.
    pub fn is_active(&self) -> bool {
        matches!(*self.lock(), State::Active { .. })
    }

    /// Transitions to `Cancelled` and runs every registered cleanup exactly
    /// once. Subsequent calls are no-ops.
    pub fn cancel(&self) {
        let cleanups = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, State::Cancelled) {
                State::Active { cleanups, .. } => cleanups,
                State::Cancelled => return,
            }
        };
        for (_, cleanup) in cleanups {
            run_cleanup(cleanup);
        }
    }

    /// Registers `cleanup` to run when the token is cancelled.
    ///
    /// If the token is already cancelled, `cleanup` runs synchronously and
    /// the returned handle is inert.
    pub fn on_cancel(&self, cleanup: impl FnOnce() + Send + 'static) -> CleanupHandle {
        {
            let mut state = self.lock();
            if let State::Active { next_id, cleanups } = &mut *state {
                let id = *next_id;
                *next_id += 1;
                cleanups.insert(id, Box::new(cleanup));
                return CleanupHandle(id);
            }
        }
        run_cleanup(Box::new(cleanup));
        CleanupHandle(SPENT)
    }

    /// Removes a registered cleanup without running it.
    ///
    /// No-op if the cleanup already ran, was already removed, or the handle
    /// is inert.
    pub fn remove(&self, handle: CleanupHandle) {
        let mut state = self.lock();
        if let State::Active { cleanups, .. } = &mut *state {
            cleanups.remove(&handle.0);
        }
    }

    /// Number of cleanups currently registered (0 once cancelled).
    pub fn cleanup_count(&self) -> usize {
        match &*self.lock() {
            State::Active { cleanups, .. } => cleanups.len(),
            State::Cancelled => 0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("active", &self.is_active())
            .finish()
    }
}

fn run_cleanup(cleanup: Cleanup) {
    if let Err(panic_err) = catch_unwind(AssertUnwindSafe(cleanup)) {
        eprintln!("[tickflow] cancellation cleanup panicked: {panic_err:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_new_token_is_active() {
        let token = CancelToken::new();
        assert!(token.is_active());
    }

    #[test]
    fn test_cancelled_constructor_is_inactive() {
        let token = CancelToken::cancelled();
        assert!(!token.is_active());
    }

    #[test]
    fn test_cancel_is_one_way_and_idempotent() {
        let ran = Arc::new(AtomicU32::new(0));
        let token = CancelToken::new();
        let counter = Arc::clone(&ran);
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        token.cancel();
        token.cancel();

        assert!(!token.is_active());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(!token.is_active());
    }

    #[test]
    fn test_register_after_cancel_runs_immediately() {
        let token = CancelToken::new();
        token.cancel();

        let ran = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ran);
        let handle = token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        // Inert handle; removing it changes nothing.
        token.remove(handle);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_removed_cleanup_never_runs() {
        let token = CancelToken::new();
        let ran = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&ran);
        let handle = token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(token.cleanup_count(), 1);

        token.remove(handle);
        assert_eq!(token.cleanup_count(), 0);

        token.cancel();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_cleanups_run_once_each() {
        let token = CancelToken::new();
        let ran = Arc::new(AtomicU32::new(0));
        for _ in 0..8 {
            let counter = Arc::clone(&ran);
            token.on_cancel(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        token.cancel();
        assert_eq!(ran.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_panicking_cleanup_does_not_block_others() {
        let token = CancelToken::new();
        let ran = Arc::new(AtomicU32::new(0));

        token.on_cancel(|| panic!("boom"));
        let counter = Arc::clone(&ran);
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(!token.is_active());
    }

    #[test]
    fn test_concurrent_cancel_runs_cleanups_once() {
        let token = CancelToken::new();
        let ran = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&ran);
        token.on_cancel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let t = token.clone();
                std::thread::spawn(move || t.cancel())
            })
            .collect();
        for h in handles {
            h.join().expect("cancel thread panicked");
        }

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
