//! # Simple logging observer for debugging and demos.
//!
//! [`ValueLog`] prints every value a [`Behavior`] pushes to stdout in a
//! human-readable format. This is primarily useful for development,
//! debugging, and examples.
//!
//! ## Output format
//! ```text
//! [center] (120.0, 48.5)
//! [millis] 16
//! [millis] 33
//! ```

use std::fmt::Debug;

use crate::behavior::Behavior;
use crate::token::CancelToken;

/// Simple stdout value logger.
///
/// Enabled via the `logging` feature. Not intended for production use —
/// subscribe your own observer for structured logging or metrics collection.
pub struct ValueLog;

impl ValueLog {
    /// Subscribes a printing observer to `behavior` under `name`.
    ///
    /// The current value is printed immediately, then one line per push.
    /// Cancel the returned token to stop logging.
    pub fn attach<T>(behavior: &Behavior<T>, name: &'static str) -> CancelToken
    where
        T: Clone + Send + Debug + 'static,
    {
        behavior.subscribe(move |value| {
            println!("[{name}] {value:?}");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_subscribes_and_detaches() {
        let cell = Behavior::new(0);
        let sub = ValueLog::attach(&cell, "cell");
        assert!(cell.has_observers());

        sub.cancel();
        cell.push(1);
        assert!(!cell.has_observers());
    }
}
