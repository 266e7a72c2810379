//! Streaming load states.
//!
//! Every streamed object walks `Unloaded -> Loading -> Loaded | Failed`.
//! `AssetSlot` owns the pending request of one object and reports the
//! transition out of `Loading` exactly once.

use std::sync::Arc;
use crate::assets::AssetRequest;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    /// Terminal: never retried
    Failed,
}

impl LoadState {
    pub fn is_loaded(self) -> bool {
        self == LoadState::Loaded
    }

    pub fn is_failed(self) -> bool {
        self == LoadState::Failed
    }
}

/// Outcome observed by `AssetSlot::poll`
#[derive(Debug, Clone)]
pub enum LoadEvent<T> {
    Loaded(Arc<T>),
    Failed(Error),
}

/// Load state plus the request or asset backing it
#[derive(Debug)]
pub struct AssetSlot<T> {
    state: LoadState,
    request: Option<AssetRequest<T>>,
    asset: Option<Arc<T>>,
}

impl<T> Default for AssetSlot<T> {
    fn default() -> Self {
        Self { state: LoadState::Unloaded, request: None, asset: None }
    }
}

impl<T> AssetSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn asset(&self) -> Option<&Arc<T>> {
        self.asset.as_ref()
    }

    /// Attach a request. Ignored unless the slot is `Unloaded`.
    pub fn start(&mut self, request: AssetRequest<T>) -> bool {
        if self.state != LoadState::Unloaded {
            return false;
        }
        self.request = Some(request);
        self.state = LoadState::Loading;
        true
    }

    /// Move out of `Loading` once the request has resolved.
    pub fn poll(&mut self) -> Option<LoadEvent<T>> {
        if self.state != LoadState::Loading {
            return None;
        }
        let result = self.request.as_ref()?.poll()?;
        self.request = None;
        match result {
            Ok(asset) => {
                self.asset = Some(Arc::clone(&asset));
                self.state = LoadState::Loaded;
                Some(LoadEvent::Loaded(asset))
            }
            Err(error) => {
                self.state = LoadState::Failed;
                Some(LoadEvent::Failed(error))
            }
        }
    }

    /// Mark the slot failed without a request (e.g. a descriptor that
    /// loaded but did not validate).
    pub fn fail(&mut self) {
        self.request = None;
        self.asset = None;
        self.state = LoadState::Failed;
    }
}

#[cfg(test)]
#[path = "load_state_tests.rs"]
mod tests;
