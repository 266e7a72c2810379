//! Placed buildings.
//!
//! A `Building` owns the groups of one building instance. It answers which
//! interior group holds the camera, culls its groups and doodads against a
//! set of frusta, and runs portal traversal when the camera is inside.

use std::sync::Arc;
use glam::{Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use crate::assets::{AssetStore, BuildingDescriptor, BuildingPlacementDef, DoodadDef};
use crate::config::ViewerConfig;
use crate::error::{Error, Result};
use crate::math::{validate_bsp_tree, Frustum, Placement, AABB};
use super::draw_list::{DrawCommand, DrawPass, RenderBackend};
use super::group::{select_candidate, Group};
use super::load_state::{AssetSlot, LoadEvent, LoadState};
use super::portal::{traverse_portals, PortalOutcome, PortalTraversal};
use super::scene_object::{Renderable, SceneObject, SceneObjectKey};
use super::visibility::PassResult;

const GROUP_BOX_COLOR: Vec4 = Vec4::new(0.058, 0.058, 0.819, 1.0);
const PORTAL_TRAVERSED_COLOR: Vec4 = Vec4::new(0.0, 0.8, 0.0, 0.5);
const PORTAL_OUT_OF_VIEW_COLOR: Vec4 = Vec4::new(0.8, 0.0, 0.0, 0.5);
const PORTAL_BACK_FACING_COLOR: Vec4 = Vec4::new(0.4, 0.4, 0.4, 0.5);
const BSP_LEAF_COLOR: Vec4 = Vec4::new(0.819, 0.058, 0.819, 0.6);

new_key_type! {
    /// Stable key for a Building within the Graph Manager.
    pub struct BuildingKey;
}

/// Interior group and BSP node holding the camera, `-1` for none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InteriorLocation {
    pub group_id: i32,
    pub node_id: i32,
}

impl InteriorLocation {
    pub const OUTSIDE: InteriorLocation = InteriorLocation { group_id: -1, node_id: -1 };

    pub fn is_inside(&self) -> bool {
        self.group_id >= 0
    }

    pub fn group(&self) -> Option<usize> {
        usize::try_from(self.group_id).ok()
    }

    pub fn node(&self) -> Option<usize> {
        usize::try_from(self.node_id).ok()
    }
}

impl Default for InteriorLocation {
    fn default() -> Self {
        Self::OUTSIDE
    }
}

/// Streaming progress reported by `Building::poll`
#[derive(Debug, Clone, PartialEq)]
pub enum BuildingEvent {
    RootLoaded,
    RootFailed(Error),
    /// Group geometry arrived; `doodads` lists its references in the
    /// active doodad sets
    GroupLoaded { group: usize, doodads: Vec<u16> },
    GroupFailed { group: usize, error: Error },
    /// Group geometry arrived with a broken BSP tree. Interior detection
    /// is off for this instance from now on; the group still draws.
    MalformedBsp { group: usize, error: Error },
}

#[derive(Debug)]
pub struct Building {
    name: Arc<str>,
    placement: Placement,
    doodad_set: u16,
    root: AssetSlot<BuildingDescriptor>,
    world_box: AABB,
    groups: Vec<Group>,
    /// Doodad definition index to its scene object
    doodads: FxHashMap<u16, SceneObjectKey>,
    location: InteriorLocation,
    /// Set once a malformed BSP was found: exterior rendering only
    interior_disabled: bool,
    is_rendered: bool,
    traversal: Option<PortalTraversal>,
}

impl Building {
    pub fn new(name: &str, placement: Placement, doodad_set: u16) -> Self {
        Self {
            name: Arc::from(name),
            placement,
            doodad_set,
            root: AssetSlot::new(),
            world_box: AABB::default(),
            groups: Vec::new(),
            doodads: FxHashMap::default(),
            location: InteriorLocation::OUTSIDE,
            interior_disabled: false,
            is_rendered: true,
            traversal: None,
        }
    }

    pub fn from_map_placement(def: &BuildingPlacementDef) -> Self {
        Self::new(
            &def.building_name,
            Placement::for_map_building(def.position, def.rotation),
            def.doodad_set,
        )
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn doodad_set(&self) -> u16 {
        self.doodad_set
    }

    pub fn descriptor(&self) -> Option<&Arc<BuildingDescriptor>> {
        self.root.asset()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    pub fn current_location(&self) -> InteriorLocation {
        self.location
    }

    pub fn is_rendered(&self) -> bool {
        self.is_rendered
    }

    pub fn is_interior_disabled(&self) -> bool {
        self.interior_disabled
    }

    pub fn traversal(&self) -> Option<&PortalTraversal> {
        self.traversal.as_ref()
    }

    /// Frusta looking out of the building from the last portal traversal.
    pub fn exterior_frustums(&self) -> &[Frustum] {
        match &self.traversal {
            Some(traversal) => traversal.exterior_frustums(),
            None => &[],
        }
    }

    pub fn ambient_color(&self) -> Vec4 {
        self.root.asset().map_or(Vec4::ONE, |d| d.ambient_color)
    }

    // ===== DOODADS =====

    /// Doodads of set 0 are always placed; the instance's own set adds to them.
    pub fn is_doodad_active(&self, index: u16) -> bool {
        let Some(descriptor) = self.root.asset() else {
            return false;
        };
        let index = u32::from(index);
        [0usize, self.doodad_set as usize]
            .iter()
            .filter_map(|set| descriptor.doodad_sets.get(*set))
            .any(|set| set.contains(index))
    }

    pub fn doodad_def(&self, index: u16) -> Option<&DoodadDef> {
        self.root.asset()?.doodad_defs.get(index as usize)
    }

    pub fn doodad_object(&self, index: u16) -> Option<SceneObjectKey> {
        self.doodads.get(&index).copied()
    }

    pub fn doodad_keys(&self) -> impl Iterator<Item = SceneObjectKey> + '_ {
        self.doodads.values().copied()
    }

    /// Record the scene object of doodad `index` and attach it to `group`.
    pub(crate) fn bind_doodad(&mut self, group: usize, index: u16, key: SceneObjectKey) {
        self.doodads.insert(index, key);
        if let Some(group) = self.groups.get_mut(group) {
            group.attach_doodad(key);
        }
    }

    /// Grow the visibility box of every group holding `key`.
    pub(crate) fn grow_for_doodad(&mut self, key: SceneObjectKey, aabb: &AABB) {
        for group in self.groups.iter_mut().filter(|g| g.doodads().contains(&key)) {
            group.grow_visibility_box(aabb);
        }
    }

    pub(crate) fn forget_doodad(&mut self, key: SceneObjectKey) {
        self.doodads.retain(|_, k| *k != key);
        for group in &mut self.groups {
            group.detach_doodad(key);
        }
    }

    // ===== STREAMING =====

    /// Request the root file, then any group culling or containment asked for.
    pub(crate) fn start_loading(&mut self, store: &mut AssetStore) {
        if self.root.state() == LoadState::Unloaded {
            let request = store.request_building(&self.name);
            self.root.start(request);
        }
        for group in &mut self.groups {
            group.start_loading(store);
        }
    }

    pub(crate) fn poll(&mut self) -> Vec<BuildingEvent> {
        let mut events = Vec::new();

        match self.root.poll() {
            Some(LoadEvent::Loaded(descriptor)) => match descriptor.validate() {
                Ok(()) => {
                    self.world_box = descriptor.bounding_box.transformed(self.placement.matrix());
                    self.groups = descriptor
                        .groups
                        .iter()
                        .enumerate()
                        .map(|(i, info)| {
                            let file_name = BuildingDescriptor::group_file_name(&self.name, i);
                            Group::new(i, info, file_name, &self.placement)
                        })
                        .collect();
                    events.push(BuildingEvent::RootLoaded);
                }
                Err(error) => {
                    self.root.fail();
                    events.push(BuildingEvent::RootFailed(error));
                }
            },
            Some(LoadEvent::Failed(error)) => events.push(BuildingEvent::RootFailed(error)),
            None => {}
        }

        for index in 0..self.groups.len() {
            match self.groups[index].poll() {
                Some(LoadEvent::Loaded(geometry)) => {
                    if let Err(error) = validate_bsp_tree(&geometry.bsp_nodes) {
                        self.interior_disabled = true;
                        events.push(BuildingEvent::MalformedBsp { group: index, error });
                    }
                    let doodads = geometry
                        .doodad_refs
                        .iter()
                        .copied()
                        .filter(|d| self.is_doodad_active(*d) && self.doodad_def(*d).is_some())
                        .collect();
                    events.push(BuildingEvent::GroupLoaded { group: index, doodads });
                }
                Some(LoadEvent::Failed(error)) => {
                    events.push(BuildingEvent::GroupFailed { group: index, error });
                }
                None => {}
            }
        }

        events
    }

    /// Give back every cache reference this instance took.
    pub(crate) fn release_assets(&self, store: &mut AssetStore) {
        if self.root.state() != LoadState::Unloaded {
            store.release_building(&self.name);
        }
        for group in self.groups.iter().filter(|g| g.load_state() != LoadState::Unloaded) {
            store.release_group(group.file_name());
        }
    }

    // ===== INTERIOR =====

    /// Which interior group and BSP node contain the camera.
    ///
    /// The camera is moved into building space, checked strictly against
    /// the building bounds, and then offered to every group; the tightest
    /// claim wins. A malformed BSP tree disables interior detection for
    /// this instance for good and is returned once as an error.
    pub fn is_inside_interior(&mut self, camera_world: Vec3) -> Result<InteriorLocation> {
        self.location = InteriorLocation::OUTSIDE;
        if self.interior_disabled {
            return Ok(self.location);
        }
        let camera_local = self.placement.to_local(camera_world);
        let inside_bounds = self
            .root
            .asset()
            .is_some_and(|d| d.bounding_box.contains_point_strict(camera_local));
        if !inside_bounds {
            return Ok(self.location);
        }

        let mut candidates = Vec::new();
        for group in &mut self.groups {
            match group.check_if_inside_group(camera_world, camera_local) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(error) => {
                    self.interior_disabled = true;
                    return Err(error);
                }
            }
        }

        if let Some(best) = select_candidate(&candidates) {
            self.location = InteriorLocation {
                group_id: best.group_index as i32,
                node_id: best.node_index as i32,
            };
        }
        Ok(self.location)
    }

    // ===== CULLING =====

    /// Building-level test against any of `frustums`, then groups and doodads.
    ///
    /// Every doodad of the building gets a verdict in `out`: doodads of
    /// groups that are not visible are culled, the others are tested once
    /// each against the frusta. A building whose root is still streaming is
    /// visible with no doodads to judge.
    pub fn check_frustum_culling(
        &mut self,
        camera: Vec3,
        frustums: &[Frustum],
        objects: &SlotMap<SceneObjectKey, SceneObject>,
        out: &mut PassResult,
    ) -> bool {
        self.traversal = None;
        match self.root.state() {
            LoadState::Unloaded | LoadState::Loading => {
                self.is_rendered = true;
                return true;
            }
            LoadState::Failed => {
                self.is_rendered = false;
                return false;
            }
            LoadState::Loaded => {}
        }

        // Inside the bounds counts even with no frustum to test against
        let visible = self.world_box.contains_point_strict(camera)
            || frustums.iter().any(|f| self.cull(camera, f));
        self.is_rendered = visible;

        let mut candidates = FxHashSet::default();
        for group in &mut self.groups {
            let group_visible = visible
                && frustums.iter().any(|f| group.check_group_frustum(camera, f, &mut candidates));
            group.set_is_rendered(group_visible);
        }

        for key in self.doodads.values().copied() {
            let verdict = candidates.contains(&key)
                && objects
                    .get(key)
                    .is_some_and(|o| frustums.iter().any(|f| o.cull(camera, f)));
            out.push(key, verdict);
        }

        visible
    }

    /// Cull from inside `start_group` through the portal graph.
    ///
    /// Groups reached by traversal are tested against the frustum they were
    /// reached through, as are their doodads. Exterior groups not reached
    /// are still tested against the full camera frustum.
    pub fn cull_through_portals(
        &mut self,
        start_group: usize,
        camera: Vec3,
        frustum: &Frustum,
        objects: &SlotMap<SceneObjectKey, SceneObject>,
        out: &mut PassResult,
    ) {
        let Some(descriptor) = self.root.asset() else {
            return;
        };
        let traversal = traverse_portals(descriptor, &self.placement, start_group, camera, frustum);
        self.is_rendered = true;

        let mut verdicts: FxHashMap<SceneObjectKey, bool> = FxHashMap::default();
        for (index, group) in self.groups.iter_mut().enumerate() {
            let view = traversal
                .group_frustum(index)
                .or_else(|| group.is_exterior().then_some(frustum));
            let mut candidates = FxHashSet::default();
            let visible = view.is_some_and(|f| group.check_group_frustum(camera, f, &mut candidates));
            group.set_is_rendered(visible);

            let Some(view) = view else {
                continue;
            };
            for key in candidates {
                let verdict = verdicts.entry(key).or_insert(false);
                if !*verdict {
                    *verdict = objects.get(key).is_some_and(|o| o.cull(camera, view));
                }
            }
        }

        for key in self.doodads.values().copied() {
            out.push(key, verdicts.get(&key).copied().unwrap_or(false));
        }
        self.traversal = Some(traversal);
    }

    // ===== DEBUG =====

    /// Group boxes, portal polygons and the BSP leaf under the camera,
    /// as enabled in `config`.
    pub fn draw_debug(&self, config: &ViewerConfig, backend: &mut dyn RenderBackend) -> Result<()> {
        if config.draw_bounding_boxes {
            for group in self.groups.iter().filter(|g| g.is_rendered()) {
                backend.submit(DrawCommand::BoundingBox {
                    aabb: *group.visibility_box(),
                    color: GROUP_BOX_COLOR,
                })?;
            }
        }

        if config.draw_portals {
            if let (Some(traversal), Some(descriptor)) = (&self.traversal, self.root.asset()) {
                for visit in traversal.visits() {
                    let Some(polygon) = descriptor.portal_polygon(visit.portal_index) else {
                        continue;
                    };
                    let color = match visit.outcome {
                        PortalOutcome::Traversed => PORTAL_TRAVERSED_COLOR,
                        PortalOutcome::OutOfView => PORTAL_OUT_OF_VIEW_COLOR,
                        PortalOutcome::BackFacing => PORTAL_BACK_FACING_COLOR,
                    };
                    backend.submit(DrawCommand::Portal {
                        vertices: polygon.iter().map(|v| self.placement.to_world(*v)).collect(),
                        color,
                    })?;
                }
            }
        }

        if config.draw_bsp_leaf {
            if let (Some(group), Some(node)) = (
                self.location.group().and_then(|g| self.groups.get(g)),
                self.location.node(),
            ) {
                let triangles = group.leaf_triangles(node, &self.placement);
                if !triangles.is_empty() {
                    backend.submit(DrawCommand::BspLeaf { triangles, color: BSP_LEAF_COLOR })?;
                }
            }
        }

        Ok(())
    }
}

impl Renderable for Building {
    fn load_state(&self) -> LoadState {
        self.root.state()
    }

    fn world_aabb(&self) -> Option<AABB> {
        self.root.state().is_loaded().then_some(self.world_box)
    }

    fn cull(&self, camera: Vec3, frustum: &Frustum) -> bool {
        match self.root.state() {
            LoadState::Unloaded | LoadState::Loading => true,
            LoadState::Failed => false,
            LoadState::Loaded => {
                self.world_box.contains_point_strict(camera) || frustum.intersects_aabb(&self.world_box)
            }
        }
    }

    /// Submits the visible, loaded groups. Buildings have no transparent pass.
    fn draw(&self, pass: DrawPass, backend: &mut dyn RenderBackend) -> Result<()> {
        if pass != DrawPass::Opaque || !self.is_rendered {
            return Ok(());
        }
        let ambient = self.ambient_color();
        for group in &self.groups {
            if !group.is_rendered() || group.load_state() != LoadState::Loaded {
                continue;
            }
            backend.submit(DrawCommand::BuildingGroup {
                building: Arc::clone(&self.name),
                group: group.index(),
                transform: *self.placement.matrix(),
                ambient,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "building_tests.rs"]
mod tests;
