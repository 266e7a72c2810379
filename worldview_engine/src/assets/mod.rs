//! Asset streaming boundary
//!
//! Decoded descriptors, pending requests, the per-key cache and the
//! streamer trait the scene loads through.

mod cache;
mod descriptors;
mod memory_streamer;
mod request;
mod store;
mod streamer;
pub mod synthetic;

pub use cache::AssetCache;
pub use descriptors::{
    BuildingDescriptor, BuildingPlacementDef, DoodadDef, DoodadSet, GroupFlags,
    GroupGeometryDescriptor, GroupInfo, ModelDescriptor, ModelPlacementDef, ModelSubMesh,
    PortalInfo, PortalRef,
};
pub use memory_streamer::InMemoryStreamer;
pub use request::{AssetRequest, AssetResolver};
pub use store::AssetStore;
pub use streamer::AssetStreamer;
