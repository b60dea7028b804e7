//! Cancellation token shared between a controller and its background run.
//!
//! Each controller owns exactly one token. Clones handed to the background
//! task observe the same state, and `cancelled()` lets async waits race a
//! sleep against cancellation instead of spinning on a flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cancellation token for cooperative cancellation of async operations.
///
/// This token can be cloned and shared across tasks. When `cancel()` is called
/// on any clone, all clones will observe the cancellation.
///
/// # Example
///
/// ```
/// use steam_fusion::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let run_token = token.clone();
///
/// assert!(token.cancel());
/// assert!(!token.cancel());
/// assert!(run_token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every pending [`cancelled`](Self::cancelled) future.
    ///
    /// Returns `true` only for the call that actually flipped the token, so a
    /// caller can tell the first cancellation apart from repeats.
    pub fn cancel(&self) -> bool {
        let first = !self.state.cancelled.swap(true, Ordering::SeqCst);
        if first {
            self.state.notify.notify_waiters();
        }
        first
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Check cancellation and return an error if cancelled.
    pub fn check(&self) -> Result<(), CancelledError> {
        if self.is_cancelled() {
            Err(CancelledError)
        } else {
            Ok(())
        }
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel() can't
            // slip between the check and the await.
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration` unless cancellation arrives first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), CancelledError> {
        self.check()?;
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancelled() => Err(CancelledError),
        }
    }
}

/// Error returned when an operation is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation was cancelled")
    }
}

impl std::error::Error for CancelledError {}

impl From<CancelledError> for crate::error::FusionError {
    fn from(_: CancelledError) -> Self {
        crate::error::FusionError::Cancelled
    }
}
