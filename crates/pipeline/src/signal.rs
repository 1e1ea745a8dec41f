//! Close-once broadcast signal
//!
//! Wraps a [`CancellationToken`] with an explicit "closed exactly once"
//! contract: the first `close` wins, every later one reports failure so the
//! caller can treat it as a fatal double-close.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Broadcast signal that can be closed exactly once
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl CancelSignal {
    /// Create an open signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the signal and wake every waiter
    ///
    /// Returns false if it was already closed.
    #[must_use = "a second close is an error the caller must handle"]
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Check if the signal has been closed
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the signal is closed
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Token that fires with this signal but cannot close it
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}
