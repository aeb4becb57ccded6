//! Status reporting and cooperative cancellation for long-running algorithms.
//!
//! Algorithms report human-readable progress as whole lines of text through a
//! [`StatusSink`], and poll a [`CancelToken`] at loop boundaries so callers can
//! stop them without tearing down a thread.
//!
//! # Example
//!
//! ```
//! use unfolder::algo::{CancelToken, StatusSink};
//!
//! let status = StatusSink::new(|line| eprintln!("{}", line));
//! status.line("Unfolding mesh...");
//!
//! let cancel = CancelToken::new();
//! let handle = cancel.clone();
//! handle.cancel();
//! assert!(cancel.is_cancelled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{MeshError, Result};

/// A sink receiving status lines ("append a line of text").
#[derive(Clone)]
pub struct StatusSink {
    callback: Arc<dyn Fn(&str) + Send + Sync>,
}

impl StatusSink {
    /// Create a new status sink with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Append one line.
    #[inline]
    pub fn line(&self, message: &str) {
        (self.callback)(message);
    }

    /// Create a sink that discards all lines.
    pub fn none() -> Self {
        Self::new(|_| {})
    }
}

impl Default for StatusSink {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for StatusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSink").finish_non_exhaustive()
    }
}

/// Shared flag used to request cancellation.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Return [`MeshError::Cancelled`] if cancellation was requested.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(MeshError::Cancelled)
        } else {
            Ok(())
        }
    }
}
