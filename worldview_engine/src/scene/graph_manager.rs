//! Graph Manager: owner of every placed object and the per-frame
//! visibility pipeline.
//!
//! One `update` per frame:
//!
//! 1. Stream: observe resolved loads, register building doodads.
//! 2. Mark every scene object provisionally visible.
//! 3. Find the interior group holding the camera (first building wins).
//!    Indoors, cull through the portal graph; outdoors, cull every
//!    building and top-level object against the camera frustum.
//! 4. Drop small distant objects, then optionally test against last
//!    frame's coarse depth.
//! 5. Every `sort_interval_ms`, refresh distances and sort back to front.
//! 6. Every `placement_update_interval_ms`, rebuild instancing buffers.
//! 7. Issue the load requests culling asked for.
//!
//! Each culling pass returns a `PassResult`; the passes are folded into
//! one `VisibilitySet` by conjunction and committed to the objects once.

use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use rdst::{RadixKey, RadixSort};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use crate::assets::{AssetStore, AssetStreamer, BuildingPlacementDef, ModelPlacementDef};
use crate::camera::Camera;
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::math::{Frustum, Placement};
use crate::{engine_debug, engine_trace, engine_warn};
use super::building::{Building, BuildingEvent, BuildingKey, InteriorLocation};
use super::depth_occlusion::CoarseDepthBuffer;
use super::draw_list::{DrawCommand, DrawPass, RenderBackend};
use super::instance_manager::InstanceManager;
use super::load_state::{LoadEvent, LoadState};
use super::scene_object::{Renderable, SceneObject, SceneObjectKey};
use super::visibility::{PassResult, VisibilitySet};

const SOURCE: &str = "worldview::GraphManager";

const MODEL_BOX_COLOR: Vec4 = Vec4::new(0.819, 0.819, 0.058, 1.0);

/// What `update` reports back to the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameResult {
    /// Interior group holding the camera, `-1` outdoors
    pub interior_group: i32,
    /// BSP node the containment descent ended on, `-1` outdoors
    pub bsp_node: i32,
}

impl From<InteriorLocation> for FrameResult {
    fn from(location: InteriorLocation) -> Self {
        Self { interior_group: location.group_id, bsp_node: location.node_id }
    }
}

impl Default for FrameResult {
    fn default() -> Self {
        InteriorLocation::OUTSIDE.into()
    }
}

/// Counters of the last `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub objects: usize,
    pub buildings: usize,
    /// Whether the portal path was taken
    pub portal_culling: bool,
    /// Objects surviving the frustum pass
    pub frustum_visible: usize,
    pub distance_culled: usize,
    pub depth_culled: usize,
    /// Objects marked rendered at the end of the frame
    pub rendered: usize,
    /// Model requests still in flight
    pub pending_loads: usize,
}

/// Radix key ordering objects by descending distance
#[derive(Debug, Clone, Copy)]
struct SortEntry {
    key: SceneObjectKey,
    rank: u32,
}

impl SortEntry {
    fn new(key: SceneObjectKey, distance: f32) -> Self {
        // Non-negative floats order like their bit patterns; invert for far first
        Self { key, rank: !distance.max(0.0).to_bits() }
    }
}

impl RadixKey for SortEntry {
    const LEVELS: usize = 4;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.rank >> (level * 8)) as u8
    }
}

pub struct GraphManager {
    config: ViewerConfig,
    store: AssetStore,
    camera: Camera,
    objects: SlotMap<SceneObjectKey, SceneObject>,
    buildings: SlotMap<BuildingKey, Building>,
    /// Insertion order; the interior scan follows it
    building_order: Vec<BuildingKey>,
    /// Back to front as of the last sort
    draw_order: Vec<SceneObjectKey>,
    visibility: VisibilitySet,
    current: Option<(BuildingKey, InteriorLocation)>,
    instances: FxHashMap<Arc<str>, InstanceManager>,
    depth: Option<CoarseDepthBuffer>,
    since_sort_ms: f32,
    since_placement_ms: f32,
    stats: FrameStats,
    /// Assets already reported, so each failure is logged once
    warned: FxHashSet<String>,
}

impl GraphManager {
    pub fn new(streamer: Box<dyn AssetStreamer>, config: ViewerConfig) -> Self {
        Self {
            config,
            store: AssetStore::new(streamer),
            camera: Camera::default(),
            objects: SlotMap::with_key(),
            buildings: SlotMap::with_key(),
            building_order: Vec::new(),
            draw_order: Vec::new(),
            visibility: VisibilitySet::new(),
            current: None,
            instances: FxHashMap::default(),
            depth: None,
            // First update sorts and builds placements right away
            since_sort_ms: f32::INFINITY,
            since_placement_ms: f32::INFINITY,
            stats: FrameStats::default(),
            warned: FxHashSet::default(),
        }
    }

    // ===== CONFIGURATION & CAMERA =====

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ViewerConfig) {
        self.config = config;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera_position(&mut self, position: Vec3) {
        self.camera.set_position(position);
    }

    pub fn set_view_matrix(&mut self, matrix: Mat4) {
        self.camera.set_view(matrix);
        self.camera.refresh_frustum();
    }

    pub fn set_projection_matrix(&mut self, matrix: Mat4) {
        self.camera.set_projection(matrix);
        self.camera.refresh_frustum();
    }

    /// Coarse depth of the previous frame, used when `depth_culling` is on.
    pub fn set_depth_buffer(&mut self, depth: Option<CoarseDepthBuffer>) {
        self.depth = depth;
    }

    // ===== POPULATION =====

    pub fn add_model(&mut self, def: &ModelPlacementDef) -> SceneObjectKey {
        self.insert_object(SceneObject::from_map_placement(def))
    }

    pub fn add_model_with_placement(&mut self, model_name: &str, placement: Placement) -> SceneObjectKey {
        self.insert_object(SceneObject::new(model_name, placement))
    }

    pub fn add_building(&mut self, def: &BuildingPlacementDef) -> BuildingKey {
        self.insert_building(Building::from_map_placement(def))
    }

    pub fn add_building_with_placement(&mut self, name: &str, placement: Placement, doodad_set: u16) -> BuildingKey {
        self.insert_building(Building::new(name, placement, doodad_set))
    }

    fn insert_object(&mut self, object: SceneObject) -> SceneObjectKey {
        let key = self.objects.insert(object);
        self.draw_order.push(key);
        key
    }

    fn insert_building(&mut self, building: Building) -> BuildingKey {
        let key = self.buildings.insert(building);
        self.building_order.push(key);
        key
    }

    /// Remove a model placement. A pending load is dropped; its result is
    /// ignored when it arrives. Returns false for an unknown key.
    pub fn remove_model(&mut self, key: SceneObjectKey) -> bool {
        let Some(object) = self.objects.remove(key) else {
            return false;
        };
        if let Some(building) = object.owner().and_then(|b| self.buildings.get_mut(b)) {
            building.forget_doodad(key);
        }
        self.forget_object(key, &object);
        true
    }

    /// Remove a building together with its doodads.
    pub fn remove_building(&mut self, key: BuildingKey) -> bool {
        let Some(building) = self.buildings.remove(key) else {
            return false;
        };
        self.building_order.retain(|k| *k != key);
        for doodad in building.doodad_keys() {
            if let Some(object) = self.objects.remove(doodad) {
                self.forget_object(doodad, &object);
            }
        }
        building.release_assets(&mut self.store);
        if self.current.is_some_and(|(k, _)| k == key) {
            self.current = None;
        }
        true
    }

    fn forget_object(&mut self, key: SceneObjectKey, object: &SceneObject) {
        if object.load_state() != LoadState::Unloaded {
            self.store.release_model(object.model_name());
        }
        self.draw_order.retain(|k| *k != key);
        if let Some(manager) = self.instances.get_mut(&**object.model_name()) {
            manager.remove(key);
            if manager.is_empty() {
                self.instances.remove(&**object.model_name());
            }
        }
    }

    // ===== ACCESSORS =====

    pub fn object(&self, key: SceneObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    pub fn building(&self, key: BuildingKey) -> Option<&Building> {
        self.buildings.get(key)
    }

    pub fn objects(&self) -> impl Iterator<Item = (SceneObjectKey, &SceneObject)> {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Building and interior location holding the camera after the last update
    pub fn current_interior(&self) -> Option<(BuildingKey, InteriorLocation)> {
        self.current
    }

    pub fn visibility(&self) -> &VisibilitySet {
        &self.visibility
    }

    pub fn draw_order(&self) -> &[SceneObjectKey] {
        &self.draw_order
    }

    pub fn instance_manager(&self, model_name: &str) -> Option<&InstanceManager> {
        self.instances.get(model_name)
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    // ===== UPDATE =====

    /// Run the visibility pipeline for one frame.
    ///
    /// `delta_ms` is the time since the previous update and drives the
    /// periodic sort and placement rebuild.
    pub fn update(&mut self, delta_ms: f32) -> FrameResult {
        self.stream_in();

        let camera = self.camera.position();
        self.visibility.begin(self.objects.keys());

        let previous = self.current;
        self.current = self.find_interior(camera);
        if previous.map(|(k, l)| (k, l.group_id)) != self.current.map(|(k, l)| (k, l.group_id)) {
            match self.current {
                Some((key, location)) => engine_debug!(SOURCE,
                    "Camera entered group {} of '{}'", location.group_id, self.building_name(key)),
                None => engine_debug!(SOURCE, "Camera is outdoors"),
            }
        }

        let portal_culling = self.config.use_portal_culling && self.current.is_some();
        let current = self.current;
        let frustum_pass = match current {
            Some((key, location)) if self.config.use_portal_culling => {
                self.cull_from_interior(key, location, camera)
            }
            _ => self.cull_direct(camera),
        };
        self.visibility.apply(&frustum_pass);
        let frustum_visible = self.visibility.visible_count();

        let distance_pass = self.distance_pass();
        self.visibility.apply(&distance_pass);
        let after_distance = self.visibility.visible_count();

        if let Some(depth_pass) = self.depth_pass() {
            self.visibility.apply(&depth_pass);
        }
        let rendered = self.visibility.visible_count();

        for (key, object) in self.objects.iter_mut() {
            object.set_is_rendered(self.visibility.is_visible(key));
        }

        self.since_sort_ms += delta_ms;
        if self.since_sort_ms >= self.config.sort_interval_ms {
            self.since_sort_ms = 0.0;
            self.sort_draw_order(camera);
        }

        self.since_placement_ms += delta_ms;
        if self.since_placement_ms >= self.config.placement_update_interval_ms {
            self.since_placement_ms = 0.0;
            self.rebuild_placements();
        }

        self.stream_out();

        self.stats = FrameStats {
            objects: self.objects.len(),
            buildings: self.buildings.len(),
            portal_culling,
            frustum_visible,
            distance_culled: frustum_visible - after_distance,
            depth_culled: after_distance - rendered,
            rendered,
            pending_loads: self.store.models().in_flight(),
        };

        self.current.map_or_else(FrameResult::default, |(_, location)| location.into())
    }

    fn building_name(&self, key: BuildingKey) -> &str {
        self.buildings.get(key).map_or("?", |b| b.name())
    }

    /// Log a failure the first time it is seen for `asset`.
    fn warn_once(&mut self, asset: &str, message: std::fmt::Arguments<'_>) {
        if self.warned.insert(asset.to_string()) {
            engine_warn!(SOURCE, "{}", message);
        }
    }

    // ===== STREAMING =====

    fn stream_in(&mut self) {
        self.store.pump();
        let camera = self.camera.position();

        let mut loaded = Vec::new();
        let mut failed = Vec::new();
        for (key, object) in self.objects.iter_mut() {
            match object.poll(camera) {
                Some(LoadEvent::Loaded(_)) => loaded.push(key),
                Some(LoadEvent::Failed(error)) => failed.push((object.model_name().clone(), error)),
                None => {}
            }
        }
        for (name, error) in failed {
            self.warn_once(&name, format_args!("Model '{}' failed to load: {}", name, error));
        }
        for key in loaded {
            self.register_loaded_object(key);
        }

        for index in 0..self.building_order.len() {
            let key = self.building_order[index];
            let Some(building) = self.buildings.get_mut(key) else {
                continue;
            };
            for event in building.poll() {
                self.handle_building_event(key, event);
            }
        }
    }

    fn register_loaded_object(&mut self, key: SceneObjectKey) {
        let Some(object) = self.objects.get(key) else {
            return;
        };
        let model = object.model_name();
        self.instances
            .entry(Arc::clone(model))
            .or_insert_with(|| InstanceManager::new(Arc::clone(model)))
            .add(key);

        if let (Some(owner), Some(aabb)) = (object.owner(), object.world_aabb()) {
            if let Some(building) = self.buildings.get_mut(owner) {
                building.grow_for_doodad(key, &aabb);
            }
        }
    }

    fn handle_building_event(&mut self, key: BuildingKey, event: BuildingEvent) {
        let name = self.building_name(key).to_string();
        match event {
            BuildingEvent::RootLoaded => {
                let groups = self.buildings.get(key).map_or(0, |b| b.groups().len());
                engine_debug!(SOURCE, "Building '{}' loaded, {} groups", name, groups);
            }
            BuildingEvent::RootFailed(error) => {
                self.warn_once(&name, format_args!("Building '{}' failed to load: {}", name, error));
            }
            BuildingEvent::GroupFailed { group, error } => {
                let file = self
                    .buildings
                    .get(key)
                    .and_then(|b| b.group(group))
                    .map_or_else(String::new, |g| g.file_name().to_string());
                self.warn_once(&file, format_args!("Group '{}' of '{}' failed to load: {}", file, name, error));
            }
            BuildingEvent::MalformedBsp { group, error } => {
                self.warn_once(&format!("{}#bsp", name),
                    format_args!("Building '{}' group {}: {}; interior culling disabled", name, group, error));
            }
            BuildingEvent::GroupLoaded { group, doodads } => self.spawn_doodads(key, group, &doodads),
        }
    }

    /// Create the scene objects of a freshly loaded group. A doodad shared
    /// with an earlier group reuses its object.
    fn spawn_doodads(&mut self, key: BuildingKey, group: usize, doodads: &[u16]) {
        let Some(building) = self.buildings.get_mut(key) else {
            return;
        };
        let world_lit = building.group(group).is_some_and(|g| g.uses_world_lighting());

        for &index in doodads {
            let object_key = match building.doodad_object(index) {
                Some(existing) => existing,
                None => {
                    let Some(def) = building.doodad_def(index) else {
                        continue;
                    };
                    let object = SceneObject::for_building_doodad(def, building.placement(), key);
                    let object_key = self.objects.insert(object);
                    self.draw_order.push(object_key);
                    object_key
                }
            };
            building.bind_doodad(group, index, object_key);

            let Some(object) = self.objects.get_mut(object_key) else {
                continue;
            };
            if world_lit {
                object.set_use_local_lighting(false);
            }
            if let Some(aabb) = object.world_aabb() {
                building.grow_for_doodad(object_key, &aabb);
            }
        }
    }

    /// Issue every request this frame's culling and containment asked for.
    fn stream_out(&mut self) {
        for object in self.objects.values_mut() {
            object.start_loading(&mut self.store);
        }
        for building in self.buildings.values_mut() {
            building.start_loading(&mut self.store);
        }
    }

    // ===== CULLING =====

    /// First building in insertion order whose interior holds the camera.
    ///
    /// Every building is still asked so that each keeps its own location
    /// current. A malformed BSP is reported once and leaves that building
    /// on the exterior path.
    fn find_interior(&mut self, camera: Vec3) -> Option<(BuildingKey, InteriorLocation)> {
        let mut found = None;
        let mut malformed = Vec::new();

        for &key in &self.building_order {
            let Some(building) = self.buildings.get_mut(key) else {
                continue;
            };
            match building.is_inside_interior(camera) {
                Ok(location) if location.is_inside() && found.is_none() => found = Some((key, location)),
                Ok(_) => {}
                Err(error) => malformed.push((building.name().to_string(), error)),
            }
        }

        for (name, error) in malformed {
            self.warn_once(&format!("{}#bsp", name),
                format_args!("Building '{}': {}; interior culling disabled", name, error));
        }
        found
    }

    fn cull_direct(&mut self, camera: Vec3) -> PassResult {
        let frustum = self.camera.frustum();
        let mut pass = PassResult::new();

        for building in self.buildings.values_mut() {
            building.check_frustum_culling(camera, std::slice::from_ref(frustum), &self.objects, &mut pass);
        }
        for (key, object) in self.objects.iter().filter(|(_, o)| o.owner().is_none()) {
            pass.push(key, object.cull(camera, frustum));
        }
        pass
    }

    /// Portal traversal in the current building. Everything outside it is
    /// seen only through the frusta of the exterior portals.
    fn cull_from_interior(&mut self, current: BuildingKey, location: InteriorLocation, camera: Vec3) -> PassResult {
        let frustum = self.camera.frustum();
        let mut pass = PassResult::new();

        let mut exterior: Vec<Frustum> = Vec::new();
        if let (Some(building), Some(group)) = (self.buildings.get_mut(current), location.group()) {
            building.cull_through_portals(group, camera, frustum, &self.objects, &mut pass);
            exterior = building.exterior_frustums().to_vec();
        }

        for (key, building) in self.buildings.iter_mut() {
            if key != current {
                building.check_frustum_culling(camera, &exterior, &self.objects, &mut pass);
            }
        }
        for (key, object) in self.objects.iter().filter(|(_, o)| o.owner().is_none()) {
            let visible = match object.load_state() {
                LoadState::Unloaded | LoadState::Loading => true,
                LoadState::Failed => false,
                LoadState::Loaded => exterior.iter().any(|f| object.cull(camera, f)),
            };
            pass.push(key, visible);
        }
        pass
    }

    /// Small objects far away are dropped even when in view.
    fn distance_pass(&self) -> PassResult {
        let mut pass = PassResult::new();
        for key in self.visibility.visible_keys() {
            if self.objects.get(key).is_some_and(|o| o.exceeds_draw_distance(&self.config)) {
                pass.push(key, false);
            }
        }
        pass
    }

    fn depth_pass(&self) -> Option<PassResult> {
        if !self.config.depth_culling {
            return None;
        }
        let depth = self.depth.as_ref()?;
        let view_projection = self.camera.view_projection_matrix();
        let mut pass = PassResult::new();
        for key in self.visibility.visible_keys() {
            if let Some(object) = self.objects.get(key) {
                pass.push(key, object.check_against_depth_buffer(&view_projection, depth));
            }
        }
        Some(pass)
    }

    // ===== PERIODIC WORK =====

    /// Refresh camera distances and order `draw_order` far to near.
    fn sort_draw_order(&mut self, camera: Vec3) {
        for object in self.objects.values_mut() {
            object.calc_distance(camera);
        }
        let mut entries: Vec<SortEntry> = self
            .draw_order
            .iter()
            .filter_map(|k| self.objects.get(*k).map(|o| SortEntry::new(*k, o.distance())))
            .collect();
        entries.radix_sort_unstable();
        self.draw_order = entries.into_iter().map(|e| e.key).collect();
        engine_trace!(SOURCE, "Sorted {} objects back to front", self.draw_order.len());
    }

    fn rebuild_placements(&mut self) {
        let mut instances = 0;
        for manager in self.instances.values_mut() {
            instances += manager.rebuild(&self.objects);
        }
        self.instances.retain(|_, m| !m.is_empty());
        engine_trace!(SOURCE, "Rebuilt {} placement buffers, {} instances", self.instances.len(), instances);
    }

    // ===== DRAW =====

    /// Submit the frame in fixed order: terrain, buildings, sky, opaque
    /// models, transparent models back to front, debug overlays.
    pub fn draw(&self, backend: &mut dyn RenderBackend) -> Result<()> {
        if self.config.render_terrain {
            backend.submit(DrawCommand::Terrain)?;
        }
        if self.config.render_buildings {
            let buildings = self.building_order.iter().filter_map(|k| self.buildings.get(*k));
            draw_all(buildings, DrawPass::Opaque, backend)?;
        }
        if self.config.render_sky {
            backend.submit(DrawCommand::Sky)?;
        }
        if self.config.render_models {
            self.draw_opaque_models(backend)?;
            let rendered = self
                .draw_order
                .iter()
                .filter_map(|k| self.objects.get(*k))
                .filter(|o| o.is_rendered());
            draw_all(rendered, DrawPass::Transparent, backend)?;
        }
        self.draw_debug(backend)
    }

    /// Opaque models batched per model file, in first-seen draw order.
    ///
    /// With instancing, members covered by the model's placement buffer go
    /// out as one draw; everything else rendered is drawn per object.
    fn draw_opaque_models(&self, backend: &mut dyn RenderBackend) -> Result<()> {
        let mut order: Vec<&Arc<str>> = Vec::new();
        let mut batches: FxHashMap<&str, Vec<(SceneObjectKey, &SceneObject)>> = FxHashMap::default();
        for (key, object) in self.draw_order.iter().filter_map(|k| self.objects.get(*k).map(|o| (*k, o))) {
            if !object.is_rendered() || !object.has_pass(DrawPass::Opaque) {
                continue;
            }
            let batch = batches.entry(&**object.model_name()).or_default();
            if batch.is_empty() {
                order.push(object.model_name());
            }
            batch.push((key, object));
        }

        for model in order {
            let batch = batches.get(&**model).map_or(&[][..], |b| b.as_slice());
            let manager = self.instances.get(&**model).filter(|_| self.config.use_instancing);
            if let Some(command) = manager.and_then(|m| m.draw_command(DrawPass::Opaque, &self.objects)) {
                backend.submit(command)?;
            }
            for (key, object) in batch {
                let instanced = manager.is_some_and(|m| m.covers(*key) && InstanceManager::accepts(object));
                if !instanced {
                    object.draw(DrawPass::Opaque, backend)?;
                }
            }
        }
        Ok(())
    }

    fn draw_debug(&self, backend: &mut dyn RenderBackend) -> Result<()> {
        if self.config.draw_bounding_boxes {
            for object in self.draw_order.iter().filter_map(|k| self.objects.get(*k)) {
                if let Some(aabb) = object.world_aabb().filter(|_| object.is_rendered()) {
                    backend.submit(DrawCommand::BoundingBox { aabb, color: MODEL_BOX_COLOR })?;
                }
            }
        }
        for building in self.building_order.iter().filter_map(|k| self.buildings.get(*k)) {
            building.draw_debug(&self.config, backend)?;
        }
        Ok(())
    }
}

/// Submit `pass` for every item, in iteration order.
fn draw_all<'a, R>(items: impl IntoIterator<Item = &'a R>, pass: DrawPass, backend: &mut dyn RenderBackend) -> Result<()>
where
    R: Renderable + 'a,
{
    for item in items {
        item.draw(pass, backend)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "graph_manager_tests.rs"]
mod tests;
