//! Placed model instances.
//!
//! A `SceneObject` is one placement of a streamed model: a map doodad or a
//! doodad of a building. Its bounds are unknown until the model resolves,
//! so every culling entry point fails open while it is still streaming.

use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use slotmap::new_key_type;
use crate::assets::{AssetStore, DoodadDef, ModelDescriptor, ModelPlacementDef};
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::math::{Frustum, Placement, AABB};
use super::building::BuildingKey;
use super::depth_occlusion::CoarseDepthBuffer;
use super::draw_list::{DrawCommand, DrawPass, RenderBackend};
use super::load_state::{AssetSlot, LoadEvent, LoadState};

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a SceneObject within the Graph Manager.
    ///
    /// Keys are versioned: a key kept after its object was removed never
    /// resolves to a newer object reusing the slot.
    pub struct SceneObjectKey;
}

// ===== RENDERABLE =====

/// Capabilities shared by every placed variant (models and buildings).
pub trait Renderable {
    fn load_state(&self) -> LoadState;

    /// World-space bounds, once known.
    fn world_aabb(&self) -> Option<AABB>;

    /// Frustum verdict. Anything not yet loaded is reported visible;
    /// failed assets are never visible.
    fn cull(&self, camera: Vec3, frustum: &Frustum) -> bool;

    fn draw(&self, pass: DrawPass, backend: &mut dyn RenderBackend) -> Result<()>;
}

// ===== SCENE OBJECT =====

#[derive(Debug)]
pub struct SceneObject {
    model_name: Arc<str>,
    placement: Placement,
    model: AssetSlot<ModelDescriptor>,
    /// Meaningful only once loaded
    world_aabb: AABB,
    diameter: f32,
    distance: f32,
    is_rendered: bool,
    /// Building this doodad belongs to (lighting lookup only)
    owner: Option<BuildingKey>,
    use_local_lighting: bool,
    diffuse_color: Vec4,
}

impl SceneObject {
    /// A free-standing model at an arbitrary placement.
    pub fn new(model_name: &str, placement: Placement) -> Self {
        Self {
            model_name: Arc::from(model_name),
            placement,
            model: AssetSlot::new(),
            world_aabb: AABB::default(),
            diameter: 0.0,
            distance: 0.0,
            is_rendered: true,
            owner: None,
            use_local_lighting: false,
            diffuse_color: Vec4::ONE,
        }
    }

    /// A map doodad.
    pub fn from_map_placement(def: &ModelPlacementDef) -> Self {
        Self::new(&def.model_name, Placement::for_map_model(def.position, def.rotation, def.scale))
    }

    /// A doodad of `owner`, placed relative to the building placement.
    pub fn for_building_doodad(def: &DoodadDef, parent: &Placement, owner: BuildingKey) -> Self {
        let placement = Placement::for_building_doodad(parent, def.position, def.rotation, def.scale);
        let [r, g, b, a] = def.color;
        let mut object = Self::new(&def.model_name, placement);
        object.owner = Some(owner);
        object.use_local_lighting = true;
        object.diffuse_color = Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0;
        object
    }

    // ===== ACCESSORS =====

    pub fn model_name(&self) -> &Arc<str> {
        &self.model_name
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Placement origin in world space.
    pub fn position(&self) -> Vec3 {
        self.placement.to_world(Vec3::ZERO)
    }

    pub fn owner(&self) -> Option<BuildingKey> {
        self.owner
    }

    pub fn model(&self) -> Option<&Arc<ModelDescriptor>> {
        self.model.asset()
    }

    pub fn diameter(&self) -> Option<f32> {
        self.model.state().is_loaded().then_some(self.diameter)
    }

    /// Distance to the camera at the last recomputation.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn calc_distance(&mut self, camera: Vec3) -> f32 {
        self.distance = camera.distance(self.position());
        self.distance
    }

    pub fn is_rendered(&self) -> bool {
        self.is_rendered
    }

    pub fn set_is_rendered(&mut self, value: bool) {
        self.is_rendered = value;
    }

    pub fn use_local_lighting(&self) -> bool {
        self.use_local_lighting
    }

    pub fn set_use_local_lighting(&mut self, value: bool) {
        self.use_local_lighting = value;
    }

    /// Doodad color when lit locally, white otherwise.
    pub fn diffuse_color(&self) -> Vec4 {
        if self.use_local_lighting { self.diffuse_color } else { Vec4::ONE }
    }

    pub fn has_pass(&self, pass: DrawPass) -> bool {
        match (self.model.asset(), pass) {
            (Some(model), DrawPass::Opaque) => model.has_opaque(),
            (Some(model), DrawPass::Transparent) => model.has_transparent(),
            (None, _) => false,
        }
    }

    // ===== STREAMING =====

    /// Issue the model request on first reference.
    pub(crate) fn start_loading(&mut self, store: &mut AssetStore) -> bool {
        if self.model.state() != LoadState::Unloaded {
            return false;
        }
        let request = store.request_model(&self.model_name);
        self.model.start(request)
    }

    /// Observe a resolved model. On success the world bounds and diameter
    /// become available and the distance is refreshed from `camera`.
    pub(crate) fn poll(&mut self, camera: Vec3) -> Option<LoadEvent<ModelDescriptor>> {
        let event = self.model.poll()?;
        if let LoadEvent::Loaded(model) = &event {
            self.world_aabb = model.bounding_box.transformed(self.placement.matrix());
            self.diameter = self.world_aabb.diameter();
            self.calc_distance(camera);
        }
        Some(event)
    }

    // ===== CULLING =====

    /// Frustum test, fail-open while the model is streaming.
    pub fn check_frustum_culling(&self, camera: Vec3, frustum: &Frustum) -> bool {
        match self.model.state() {
            LoadState::Unloaded | LoadState::Loading => true,
            LoadState::Failed => false,
            LoadState::Loaded => {
                self.world_aabb.contains_point_strict(camera) || frustum.intersects_aabb(&self.world_aabb)
            }
        }
    }

    /// True when the object should be dropped for being small and far.
    /// Objects with unknown bounds are kept.
    pub fn exceeds_draw_distance(&self, config: &ViewerConfig) -> bool {
        self.model.state().is_loaded() && self.distance > config.distance_threshold(self.diameter)
    }

    /// Occlusion test against last frame's coarse depth, fail-open while
    /// the model is streaming.
    pub fn check_against_depth_buffer(&self, view_projection: &Mat4, depth: &CoarseDepthBuffer) -> bool {
        if !self.model.state().is_loaded() {
            return true;
        }
        depth.is_potentially_visible(&self.world_aabb, view_projection)
    }
}

impl Renderable for SceneObject {
    fn load_state(&self) -> LoadState {
        self.model.state()
    }

    fn world_aabb(&self) -> Option<AABB> {
        self.model.state().is_loaded().then_some(self.world_aabb)
    }

    fn cull(&self, camera: Vec3, frustum: &Frustum) -> bool {
        self.check_frustum_culling(camera, frustum)
    }

    fn draw(&self, pass: DrawPass, backend: &mut dyn RenderBackend) -> Result<()> {
        if !self.has_pass(pass) {
            return Ok(());
        }
        backend.submit(DrawCommand::Model {
            model: Arc::clone(&self.model_name),
            transform: *self.placement.matrix(),
            diffuse: self.diffuse_color(),
            pass,
        })
    }
}

#[cfg(test)]
#[path = "scene_object_tests.rs"]
mod tests;
