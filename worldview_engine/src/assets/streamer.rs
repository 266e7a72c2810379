//! Streaming collaborator interface.

use super::descriptors::{BuildingDescriptor, GroupGeometryDescriptor, ModelDescriptor};
use super::request::AssetRequest;

/// Source of decoded assets.
///
/// Every load returns immediately with a pending request. Requests resolve
/// on a later frame, never inside the call that issued them. A missing
/// asset resolves to `Error::AssetNotFound`; implementations never panic on it.
pub trait AssetStreamer {
    fn load_building_main(&mut self, name: &str) -> AssetRequest<BuildingDescriptor>;

    fn load_building_group(&mut self, name: &str) -> AssetRequest<GroupGeometryDescriptor>;

    fn load_model(&mut self, name: &str) -> AssetRequest<ModelDescriptor>;

    /// Called once at the start of every frame. Streamers that complete
    /// work on the main thread resolve their queued requests here.
    fn pump(&mut self) {}
}
