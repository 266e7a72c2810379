//! In-memory asset streamer for headless runs and tests.
//!
//! Assets are registered up front. Each load is queued and resolved on the
//! next `pump`, which the Graph Manager calls at the start of a frame, so a
//! request issued during frame N is observed during frame N + 1. Handles are
//! cheap clones sharing one store: tests keep a clone to register assets,
//! inject failures and read counters while the Graph Manager owns another.

use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use super::descriptors::{BuildingDescriptor, GroupGeometryDescriptor, ModelDescriptor};
use super::request::{AssetRequest, AssetResolver};
use super::streamer::AssetStreamer;

enum Queued {
    Building(String, AssetResolver<BuildingDescriptor>),
    Group(String, AssetResolver<GroupGeometryDescriptor>),
    Model(String, AssetResolver<ModelDescriptor>),
}

#[derive(Default)]
struct StreamerState {
    buildings: FxHashMap<String, Arc<BuildingDescriptor>>,
    groups: FxHashMap<String, Arc<GroupGeometryDescriptor>>,
    models: FxHashMap<String, Arc<ModelDescriptor>>,
    failing: FxHashMap<String, String>,
    queue: Vec<Queued>,
    load_counts: FxHashMap<String, u32>,
    paused: bool,
}

impl StreamerState {
    fn lookup<T>(&self, name: &str, table: &FxHashMap<String, Arc<T>>) -> Result<Arc<T>> {
        if let Some(reason) = self.failing.get(name) {
            return Err(Error::AssetLoadFailed(format!("{}: {}", name, reason)));
        }
        table.get(name).cloned().ok_or_else(|| Error::AssetNotFound(name.to_string()))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStreamer {
    state: Arc<Mutex<StreamerState>>,
}

impl InMemoryStreamer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StreamerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn insert_building(&self, name: &str, descriptor: BuildingDescriptor) {
        self.state().buildings.insert(name.to_string(), Arc::new(descriptor));
    }

    pub fn insert_group(&self, name: &str, descriptor: GroupGeometryDescriptor) {
        self.state().groups.insert(name.to_string(), Arc::new(descriptor));
    }

    pub fn insert_model(&self, name: &str, descriptor: ModelDescriptor) {
        self.state().models.insert(name.to_string(), Arc::new(descriptor));
    }

    /// Make every future resolution of `name` fail with `AssetLoadFailed`.
    pub fn fail(&self, name: &str, reason: &str) {
        self.state().failing.insert(name.to_string(), reason.to_string());
    }

    /// Hold queued requests until `set_paused(false)`.
    pub fn set_paused(&self, paused: bool) {
        self.state().paused = paused;
    }

    /// Number of loads issued for `name`
    pub fn load_count(&self, name: &str) -> u32 {
        self.state().load_counts.get(name).copied().unwrap_or(0)
    }

    pub fn queued(&self) -> usize {
        self.state().queue.len()
    }

    fn enqueue<T>(&self, name: &str, wrap: impl FnOnce(String, AssetResolver<T>) -> Queued) -> AssetRequest<T> {
        let (request, resolver) = AssetRequest::pending();
        let mut state = self.state();
        *state.load_counts.entry(name.to_string()).or_insert(0) += 1;
        state.queue.push(wrap(name.to_string(), resolver));
        request
    }

    /// Resolve every queued request.
    pub fn resolve_all(&self) {
        let mut state = self.state();
        if state.paused {
            return;
        }
        let queue = std::mem::take(&mut state.queue);
        for queued in queue {
            match queued {
                Queued::Building(name, resolver) => {
                    let result = state.lookup(&name, &state.buildings);
                    resolver.resolve(result);
                }
                Queued::Group(name, resolver) => {
                    let result = state.lookup(&name, &state.groups);
                    resolver.resolve(result);
                }
                Queued::Model(name, resolver) => {
                    let result = state.lookup(&name, &state.models);
                    resolver.resolve(result);
                }
            }
        }
    }
}

impl AssetStreamer for InMemoryStreamer {
    fn load_building_main(&mut self, name: &str) -> AssetRequest<BuildingDescriptor> {
        self.enqueue(name, Queued::Building)
    }

    fn load_building_group(&mut self, name: &str) -> AssetRequest<GroupGeometryDescriptor> {
        self.enqueue(name, Queued::Group)
    }

    fn load_model(&mut self, name: &str) -> AssetRequest<ModelDescriptor> {
        self.enqueue(name, Queued::Model)
    }

    fn pump(&mut self) {
        self.resolve_all();
    }
}

#[cfg(test)]
#[path = "memory_streamer_tests.rs"]
mod tests;
