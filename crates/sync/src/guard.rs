//! Single in-flight mutating operation guard.

use crate::error::{ErrorKind, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Atomic flag ensuring at most one mutating operation runs at a time.
///
/// There is no queue: a second caller is rejected immediately with
/// [`ErrorKind::SyncInProgress`] and may retry once the first completes.
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicBool);

impl InFlight {
    /// Claim the flag, or fail fast when another operation holds it.
    pub(crate) fn acquire(&self) -> Result<InFlightGuard<'_>> {
        if self.0.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            exn::bail!(ErrorKind::SyncInProgress);
        }
        Ok(InFlightGuard(&self.0))
    }
}

/// Releases the flag on drop, so early returns and errors cannot leave the
/// manager wedged.
#[derive(Debug)]
pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
