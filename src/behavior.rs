//! # Behavior: a value cell that broadcasts every update.
//!
//! [`Behavior`] holds a current value and a set of observers. New observers
//! synchronously receive the value current at subscribe time, then every
//! subsequent [`push`](Behavior::push). Reads ([`get`](Behavior::get)) only
//! take a short value lock; pushes are serialized on the observer-set lock so
//! each observer sees every push, in push order, none skipped, none
//! duplicated.
//!
//! ## Fan-out
//! ```text
//!    push(v)                      (serialized; one push at a time)
//!      │  set current_value = v
//!      ├────────────► observer 1 ─► notify(&v)
//!      ├────────────► observer 2 ─► notify(&v)
//!      └────────────► observer N ─► notify(&v)
//!                      (cancelled observers are skipped and pruned here)
//! ```
//!
//! ## Rules
//! - A `subscribe` racing a `push` sees either the pre-push value followed by
//!   the pushed value, or the pushed value alone — never neither, never the
//!   pushed value twice. Registration and the initial delivery are atomic
//!   with reading the current value.
//! - Unsubscription is cancelling the returned token; later pushes never
//!   reach that observer. The entry itself is pruned at the next push.
//! - A panicking observer is caught and reported; the remaining observers
//!   are still notified.
//! - Observer callbacks must **not** synchronously push into, subscribe to,
//!   or close the same behavior — that would self-deadlock on the
//!   notification lock. Schedule the call on a [`Worker`](crate::Worker)
//!   instead; handing work back to the frame loop is what it is for.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::token::CancelToken;

struct Observer<T> {
    token: CancelToken,
    notify: Box<dyn FnMut(&T) + Send>,
}

struct Shared<T> {
    lifetime: CancelToken,
    value: Mutex<T>,
    observers: Mutex<Vec<Observer<T>>>,
}

/// Latest-value broadcast cell.
///
/// Cheap to clone; clones share the value, the observer set, and the
/// lifetime.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use tickflow::Behavior;
///
/// let seen_a = Arc::new(Mutex::new(Vec::new()));
/// let seen_b = Arc::new(Mutex::new(Vec::new()));
///
/// let cell = Behavior::new(0);
///
/// let log = Arc::clone(&seen_a);
/// let sub_a = cell.subscribe(move |v| log.lock().unwrap().push(*v));
/// cell.push(1);
///
/// let log = Arc::clone(&seen_b);
/// let _sub_b = cell.subscribe(move |v| log.lock().unwrap().push(*v));
/// cell.push(2);
///
/// sub_a.cancel();
/// cell.push(3);
///
/// assert_eq!(*seen_a.lock().unwrap(), vec![0, 1, 2]);
/// assert_eq!(*seen_b.lock().unwrap(), vec![1, 2, 3]);
/// assert_eq!(cell.get(), 3);
/// ```
pub struct Behavior<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Behavior<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> Behavior<T> {
    /// Creates a behavior seeded with `seed`, owning a fresh lifetime.
    pub fn new(seed: T) -> Self {
        Self::with_lifetime(seed, CancelToken::new())
    }

    /// Creates a behavior whose lifetime is the given token.
    ///
    /// Cancelling the token (or calling [`close`](Behavior::close)) empties
    /// the observer set and makes the behavior ignore further pushes.
    pub fn with_lifetime(seed: T, lifetime: CancelToken) -> Self {
        let behavior = Self {
            shared: Arc::new(Shared {
                lifetime,
                value: Mutex::new(seed),
                observers: Mutex::new(Vec::new()),
            }),
        };
        let weak = Arc::downgrade(&behavior.shared);
        behavior.shared.lifetime.on_cancel(move || {
            if let Some(shared) = weak.upgrade() {
                lock(&shared.observers).clear();
            }
        });
        behavior
    }

    /// Snapshot of the current value.
    ///
    /// Blocks only for the critical section needed to clone it.
    pub fn get(&self) -> T {
        lock(&self.shared.value).clone()
    }

    /// Replaces the current value and notifies every live observer.
    ///
    /// Pushes are serialized: concurrent callers take turns, and every
    /// observer sees their values in that turn order. Ignored once the
    /// behavior is closed.
    pub fn push(&self, value: T) {
        let mut observers = lock(&self.shared.observers);
        if !self.shared.lifetime.is_active() {
            return;
        }
        {
            let mut current = lock(&self.shared.value);
            *current = value.clone();
        }
        observers.retain_mut(|observer| {
            if !observer.token.is_active() {
                return false;
            }
            notify(observer, &value);
            true
        });
    }

    /// Registers `observer`, synchronously delivering the current value
    /// first, and returns the subscription token.
    ///
    /// Cancel the token to unsubscribe. On a closed behavior nothing is
    /// delivered and the returned token is already cancelled.
    pub fn subscribe(&self, observer: impl FnMut(&T) + Send + 'static) -> CancelToken {
        self.subscribe_with(CancelToken::new(), observer)
    }

    /// Like [`subscribe`](Behavior::subscribe), but ties the subscription to
    /// a caller-supplied token (e.g. one shared with scheduled work).
    ///
    /// An already-cancelled token is returned untouched with nothing
    /// delivered.
    pub fn subscribe_with(
        &self,
        token: CancelToken,
        observer: impl FnMut(&T) + Send + 'static,
    ) -> CancelToken {
        let mut observers = lock(&self.shared.observers);
        if !self.shared.lifetime.is_active() {
            return CancelToken::cancelled();
        }
        if !token.is_active() {
            return token;
        }
        let current = lock(&self.shared.value).clone();
        let mut entry = Observer {
            token: token.clone(),
            notify: Box::new(observer),
        };
        notify(&mut entry, &current);
        observers.push(entry);
        token
    }

    /// Ends the behavior's lifetime: observers are dropped, later pushes are
    /// ignored, later subscribes return inactive tokens.
    pub fn close(&self) {
        self.shared.lifetime.cancel();
    }

    /// The token governing this behavior's lifetime.
    pub fn lifetime(&self) -> &CancelToken {
        &self.shared.lifetime
    }

    /// True if at least one live observer is registered.
    pub fn has_observers(&self) -> bool {
        lock(&self.shared.observers)
            .iter()
            .any(|observer| observer.token.is_active())
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        lock(&self.shared.observers)
            .iter()
            .filter(|observer| observer.token.is_active())
            .count()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Behavior<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Behavior")
            .field("value", &*lock(&self.shared.value))
            .field("active", &self.shared.lifetime.is_active())
            .finish()
    }
}

fn lock<G>(mutex: &Mutex<G>) -> MutexGuard<'_, G> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn notify<T>(observer: &mut Observer<T>, value: &T) {
    if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| (observer.notify)(value))) {
        eprintln!("[tickflow] behavior observer panicked: {panic_err:?}");
    }
}
