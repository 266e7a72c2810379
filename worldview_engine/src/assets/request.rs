//! Pending asset results.
//!
//! A streamer hands out an `AssetRequest` immediately and keeps the paired
//! `AssetResolver`. The resolver fills the shared slot later (from a worker
//! thread or a pump on a later frame); holders of the request poll it.
//! Dropping a resolver without resolving fails the request.

use std::sync::{Arc, Mutex, MutexGuard};
use crate::error::{Error, Result};

type Slot<T> = Arc<Mutex<Option<Result<Arc<T>>>>>;

fn lock<T>(slot: &Slot<T>) -> MutexGuard<'_, Option<Result<Arc<T>>>> {
    // A panic while holding the lock cannot leave the Option half-written
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Shared handle on a result that may not be available yet
pub struct AssetRequest<T> {
    slot: Slot<T>,
}

impl<T> Clone for AssetRequest<T> {
    fn clone(&self) -> Self {
        Self { slot: Arc::clone(&self.slot) }
    }
}

impl<T> std::fmt::Debug for AssetRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRequest").field("ready", &self.is_ready()).finish()
    }
}

impl<T> AssetRequest<T> {
    /// A pending request and the resolver that completes it.
    pub fn pending() -> (Self, AssetResolver<T>) {
        let slot: Slot<T> = Arc::new(Mutex::new(None));
        (Self { slot: Arc::clone(&slot) }, AssetResolver { slot: Some(slot) })
    }

    /// A request that is already complete.
    pub fn ready(result: Result<Arc<T>>) -> Self {
        Self { slot: Arc::new(Mutex::new(Some(result))) }
    }

    pub fn is_ready(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// The result if available. Polling does not consume it.
    pub fn poll(&self) -> Option<Result<Arc<T>>> {
        lock(&self.slot).clone()
    }

    /// Number of live handles on this request (requests and resolver).
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.slot)
    }
}

/// Write side of an `AssetRequest`
pub struct AssetResolver<T> {
    slot: Option<Slot<T>>,
}

impl<T> AssetResolver<T> {
    pub fn resolve(mut self, result: Result<Arc<T>>) {
        if let Some(slot) = self.slot.take() {
            *lock(&slot) = Some(result);
        }
    }

    /// True when every request handle was dropped: nobody will read the result.
    pub fn is_abandoned(&self) -> bool {
        self.slot.as_ref().map_or(true, |slot| Arc::strong_count(slot) == 1)
    }
}

impl<T> Drop for AssetResolver<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            let mut guard = lock(&slot);
            if guard.is_none() {
                *guard = Some(Err(Error::AssetLoadFailed("request dropped before completion".to_string())));
            }
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
