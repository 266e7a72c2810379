//! Cached front of an `AssetStreamer`.

use super::cache::AssetCache;
use super::descriptors::{BuildingDescriptor, GroupGeometryDescriptor, ModelDescriptor};
use super::request::AssetRequest;
use super::streamer::AssetStreamer;

/// Routes every load through a per-kind cache so that each file is fetched
/// once no matter how many placements reference it.
pub struct AssetStore {
    streamer: Box<dyn AssetStreamer>,
    buildings: AssetCache<BuildingDescriptor>,
    groups: AssetCache<GroupGeometryDescriptor>,
    models: AssetCache<ModelDescriptor>,
}

impl AssetStore {
    pub fn new(streamer: Box<dyn AssetStreamer>) -> Self {
        Self {
            streamer,
            buildings: AssetCache::new(),
            groups: AssetCache::new(),
            models: AssetCache::new(),
        }
    }

    pub fn pump(&mut self) {
        self.streamer.pump();
    }

    pub fn request_building(&mut self, name: &str) -> AssetRequest<BuildingDescriptor> {
        let streamer = &mut self.streamer;
        self.buildings.get_or_load(name, |key| streamer.load_building_main(key))
    }

    pub fn request_group(&mut self, name: &str) -> AssetRequest<GroupGeometryDescriptor> {
        let streamer = &mut self.streamer;
        self.groups.get_or_load(name, |key| streamer.load_building_group(key))
    }

    pub fn request_model(&mut self, name: &str) -> AssetRequest<ModelDescriptor> {
        let streamer = &mut self.streamer;
        self.models.get_or_load(name, |key| streamer.load_model(key))
    }

    pub fn release_building(&mut self, name: &str) {
        self.buildings.release(name);
    }

    pub fn release_group(&mut self, name: &str) {
        self.groups.release(name);
    }

    pub fn release_model(&mut self, name: &str) {
        self.models.release(name);
    }

    pub fn buildings(&self) -> &AssetCache<BuildingDescriptor> {
        &self.buildings
    }

    pub fn groups(&self) -> &AssetCache<GroupGeometryDescriptor> {
        &self.groups
    }

    pub fn models(&self) -> &AssetCache<ModelDescriptor> {
        &self.models
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
