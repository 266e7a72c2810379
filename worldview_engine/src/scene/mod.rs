//! Scene management module
//!
//! Placed models and buildings, their streaming state, the culling passes
//! and the Graph Manager driving them once per frame.

mod building;
mod depth_occlusion;
mod draw_list;
mod graph_manager;
mod group;
mod instance_manager;
mod load_state;
mod portal;
mod scene_object;
mod visibility;

pub use building::{Building, BuildingEvent, BuildingKey, InteriorLocation};
pub use depth_occlusion::{CoarseDepthBuffer, DEPTH_BLOCK_SIZE};
pub use draw_list::{DrawCommand, DrawList, DrawPass, DrawStage, RenderBackend};
pub use graph_manager::{FrameResult, FrameStats, GraphManager};
pub use group::{select_candidate, Group, GroupCandidate, CONTAINMENT_EPSILON};
pub use instance_manager::{InstanceManager, PLACEMENT_STRIDE};
pub use load_state::{AssetSlot, LoadEvent, LoadState};
pub use portal::{traverse_portals, PortalOutcome, PortalTraversal, PortalVisit};
pub use scene_object::{Renderable, SceneObject, SceneObjectKey};
pub use visibility::{PassResult, VisibilitySet};
