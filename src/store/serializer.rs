//! Access Serializer
//!
//! One exclusive lock per device, guarding the chain plus the size and
//! geometry fields. Read and write hold it for their full duration; there is
//! no reader/writer distinction.
//!
//! The acquisition wait is the only suspension point in the engine and it is
//! cancellable: waiting is chopped into short timed slices, and a
//! [`CancelToken`] is polled between slices. A cancelled wait surfaces as the
//! distinct `Interrupted` outcome without touching any state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::error::{Result, StoreError};

/// How long one acquisition attempt blocks before the token is re-checked.
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// Cancellation signal for lock waits.
///
/// Cloned tokens share one flag; cancelling any clone cancels them all.
/// Cancellation is observed only while a caller is actually waiting: a
/// token that is already cancelled does not prevent an uncontended
/// acquisition, and it never aborts a transfer already in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every waiter polling this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Has this token been cancelled?
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Exclusive lock with a cancellable acquisition wait.
pub(crate) struct InterruptibleLock<T> {
    inner: Mutex<T>,
}

impl<T> InterruptibleLock<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Acquire the lock, giving up with `Interrupted` if `token` is
    /// cancelled while waiting.
    pub(crate) fn lock(&self, token: &CancelToken) -> Result<MutexGuard<'_, T>> {
        loop {
            if let Some(guard) = self.inner.try_lock_for(WAIT_SLICE) {
                return Ok(guard);
            }
            if token.is_cancelled() {
                return Err(StoreError::Interrupted);
            }
        }
    }

    /// Acquire the lock unconditionally.
    ///
    /// For operations with no interrupted outcome (trim, size snapshots).
    pub(crate) fn lock_uncancellable(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }
}
