use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// ConcurrencyLimiter is a counting permit pool. A logical request holds one permit from before
/// its first attempt until its dispatch reaches a terminal outcome.
#[derive(Clone)]
pub(crate) struct ConcurrencyLimiter {
    permits: Arc<Semaphore>,
    max_in_flight: NonZeroUsize,
}

/// Returns its slot to the pool on drop.
pub(crate) struct InFlightPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    pub(crate) fn new(max_in_flight: NonZeroUsize) -> Self {
        ConcurrencyLimiter {
            permits: Arc::new(Semaphore::new(max_in_flight.get())),
            max_in_flight,
        }
    }

    pub(crate) async fn acquire(&self) -> InFlightPermit {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("Limiter semaphore is never closed");

        InFlightPermit { _permit: permit }
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }

    pub(crate) fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
