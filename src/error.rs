//! Error types for the tick-driving runtime.
//!
//! The error surface is deliberately narrow: a stale cancellation is a silent
//! discard, and a runaway zero-delay reschedule is converted into next-tick
//! deferral, so neither surfaces as an error. The one failure the runtime can
//! report is a drive loop that does not stop within its grace period.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the tick driver.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DriveError {
    /// Shutdown grace period was exceeded; the drive loop is stuck inside a
    /// drain (most likely a scheduled action that blocks).
    #[error("tick driver did not stop within {grace:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl DriveError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use tickflow::DriveError;
    ///
    /// let err = DriveError::GraceExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "drive_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DriveError::GraceExceeded { .. } => "drive_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DriveError::GraceExceeded { grace } => {
                format!("grace exceeded after {grace:?}; drive loop still running")
            }
        }
    }
}
