//! Admission gate bounding the number of in-flight portal requests
//!
//! Every request issued through a session holds one permit for its whole
//! lifetime, retries included. The permit is released when it is dropped, so
//! early returns and errors cannot leak slots.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Fixed-size pool of request slots shared by every clone of a session
#[derive(Clone, Debug)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    capacity: usize,
    timeout: Option<Duration>,
}

/// One held request slot; dropping it frees the slot
#[derive(Debug)]
pub struct RequestSlot {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Create a gate with `capacity` slots
    ///
    /// `timeout` bounds how long [`acquire`](Self::acquire) waits; `None`
    /// waits until a slot frees up or the caller cancels.
    pub fn new(capacity: usize, timeout: Option<Duration>) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
            timeout,
        }
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Number of slots currently held
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// Wait for a free slot
    ///
    /// A token that has already fired wins over a free slot.
    ///
    /// Fails with [`Error::Cancelled`] if `cancel` fires first, or with
    /// [`Error::AdmissionTimeout`] if the configured timeout elapses first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<RequestSlot> {
        let wait = self.slots.clone().acquire_owned();

        let permit = match self.timeout {
            Some(limit) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                acquired = tokio::time::timeout(limit, wait) => match acquired {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!(
                            waited_ms = limit.as_millis(),
                            capacity = self.capacity,
                            "Timed out waiting for a request slot"
                        );
                        return Err(Error::AdmissionTimeout { waited: limit });
                    }
                },
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                permit = wait => permit,
            },
        };

        // The semaphore is never closed, so acquisition only fails if that changes
        let permit = permit.map_err(|_| Error::Cancelled)?;
        Ok(RequestSlot { _permit: permit })
    }
}
