//! Cooperative cancellation for async suspension points
//!
//! Every wait in the routing path (rate-limit wait, dispatch await, backoff
//! sleep) selects against this signal so a shutdown aborts the wait instead
//! of letting it run to expiry. Cloning shares the underlying flag; any clone
//! can cancel, all clones observe it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::info;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Shared cancellation flag, awaitable
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the signal, waking every pending `cancelled()` wait
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            info!("shutdown signal raised");
            self.inner.notify.notify_waiters();
        }
    }

    #[inline(always)]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolve once the signal is cancelled
    ///
    /// Returns immediately if cancellation already happened.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.inner.notify.notified();
            // Re-check after registering so a cancel between the flag read
            // and registration cannot be missed
            if self.is_cancelled() {
                break;
            }
            notified.await;
        }
    }
}
