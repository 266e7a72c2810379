//! Building groups.
//!
//! A group is one spatial partition of a building. Until its geometry file
//! streams in, a group only knows the flags and bounds listed in the
//! building root; containment needs the BSP tree and therefore waits for
//! the geometry, while frustum tests work from the root bounds alone.

use glam::Vec3;
use rustc_hash::FxHashSet;
use crate::assets::{AssetStore, GroupFlags, GroupGeometryDescriptor, GroupInfo};
use crate::error::Result;
use crate::math::{
    locate_leaf, query_bsp_tree, top_bottom_from_bsp, BspFaces, Frustum, Placement, TopBottom, AABB,
};
use super::load_state::{AssetSlot, LoadEvent, LoadState};
use super::scene_object::SceneObjectKey;

/// Horizontal half-size of the BSP query box around the camera
pub const CONTAINMENT_EPSILON: f32 = 0.4;

/// A group claiming to contain the camera
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCandidate {
    pub group_index: usize,
    /// Last node of the descent towards the camera
    pub node_index: usize,
    /// Vertical bounds after the acceptance rules
    pub bounds: TopBottom,
    /// Nodes visited from the root to `node_index`
    pub path: Vec<usize>,
}

/// Pick the tightest containment claim.
///
/// The smallest resolved `top - bottom` span wins, the first one on ties.
/// A claim without both bounds is kept only until a resolved one shows up.
pub fn select_candidate(candidates: &[GroupCandidate]) -> Option<&GroupCandidate> {
    let mut best: Option<(&GroupCandidate, Option<f32>)> = None;
    for candidate in candidates {
        match candidate.bounds.span() {
            Some(span) => {
                let tighter = match best {
                    Some((_, Some(best_span))) => span < best_span,
                    _ => true,
                };
                if tighter {
                    best = Some((candidate, Some(span)));
                }
            }
            None => {
                if best.is_none() {
                    best = Some((candidate, None));
                }
            }
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[derive(Debug)]
pub struct Group {
    index: usize,
    flags: GroupFlags,
    file_name: String,
    /// Building-local bounds from the root file
    local_box: AABB,
    /// World bounds used for containment
    volume_box: AABB,
    /// World bounds used for visibility, grown by loaded doodads
    visibility_box: AABB,
    geometry: AssetSlot<GroupGeometryDescriptor>,
    wanted: bool,
    doodads: Vec<SceneObjectKey>,
    is_rendered: bool,
}

impl Group {
    pub fn new(index: usize, info: &GroupInfo, file_name: String, placement: &Placement) -> Self {
        let world_box = info.bounding_box.transformed(placement.matrix());
        Self {
            index,
            flags: info.flags,
            file_name,
            local_box: info.bounding_box,
            volume_box: world_box,
            visibility_box: world_box,
            geometry: AssetSlot::new(),
            wanted: false,
            doodads: Vec::new(),
            is_rendered: false,
        }
    }

    // ===== ACCESSORS =====

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn flags(&self) -> GroupFlags {
        self.flags
    }

    pub fn is_interior(&self) -> bool {
        self.flags.contains(GroupFlags::INTERIOR)
    }

    pub fn is_exterior(&self) -> bool {
        self.flags.contains(GroupFlags::EXTERIOR)
    }

    /// Doodads of exterior and exterior-lit groups take world lighting.
    pub fn uses_world_lighting(&self) -> bool {
        self.flags.intersects(GroupFlags::EXTERIOR | GroupFlags::EXTERIOR_LIT)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn local_box(&self) -> &AABB {
        &self.local_box
    }

    pub fn volume_box(&self) -> &AABB {
        &self.volume_box
    }

    pub fn visibility_box(&self) -> &AABB {
        &self.visibility_box
    }

    pub fn load_state(&self) -> LoadState {
        self.geometry.state()
    }

    pub fn geometry(&self) -> Option<&std::sync::Arc<GroupGeometryDescriptor>> {
        self.geometry.asset()
    }

    pub fn doodads(&self) -> &[SceneObjectKey] {
        &self.doodads
    }

    pub fn is_rendered(&self) -> bool {
        self.is_rendered
    }

    pub fn set_is_rendered(&mut self, value: bool) {
        self.is_rendered = value;
    }

    // ===== STREAMING =====

    /// Ask for the geometry; the request goes out on the next frame.
    pub fn request_load(&mut self) {
        if self.geometry.state() == LoadState::Unloaded {
            self.wanted = true;
        }
    }

    pub fn is_wanted(&self) -> bool {
        self.wanted && self.geometry.state() == LoadState::Unloaded
    }

    pub(crate) fn start_loading(&mut self, store: &mut AssetStore) -> bool {
        if !self.is_wanted() {
            return false;
        }
        let request = store.request_group(&self.file_name);
        self.geometry.start(request)
    }

    pub(crate) fn poll(&mut self) -> Option<LoadEvent<GroupGeometryDescriptor>> {
        self.geometry.poll()
    }

    pub(crate) fn attach_doodad(&mut self, key: SceneObjectKey) {
        if !self.doodads.contains(&key) {
            self.doodads.push(key);
        }
    }

    pub(crate) fn detach_doodad(&mut self, key: SceneObjectKey) {
        self.doodads.retain(|k| *k != key);
    }

    /// Enclose a doodad's world bounds in the visibility box.
    pub(crate) fn grow_visibility_box(&mut self, aabb: &AABB) {
        self.visibility_box = self.visibility_box.merged(aabb);
    }

    // ===== CULLING =====

    /// Two verdicts from two boxes. The group itself is drawn when the
    /// camera is strictly inside its volume box or that box meets the
    /// frustum; the return value is this verdict. Its doodads become
    /// `candidates` by the same test on the visibility box, which also
    /// encloses doodads hanging outside the walls.
    pub fn check_group_frustum(
        &mut self,
        camera: Vec3,
        frustum: &Frustum,
        candidates: &mut FxHashSet<SceneObjectKey>,
    ) -> bool {
        let draw_doodads = self.visibility_box.contains_point_strict(camera)
            || frustum.intersects_aabb(&self.visibility_box);
        if draw_doodads {
            candidates.extend(self.doodads.iter().copied());
        }

        let draw_group = self.volume_box.contains_point_strict(camera)
            || frustum.intersects_aabb(&self.volume_box);
        if draw_group || draw_doodads {
            self.request_load();
        }
        draw_group
    }

    /// Containment claim of an interior group.
    ///
    /// The camera must lie strictly inside the volume box. The BSP is then
    /// queried with a thin column around the camera spanning the group
    /// height to find the floor below and the ceiling above; the camera
    /// height must fall between them. On acceptance the tree is descended
    /// towards the camera and the descent path recorded.
    ///
    /// Groups whose geometry has not streamed in make no claim and are
    /// queued for loading. Malformed trees are reported as errors.
    pub fn check_if_inside_group(
        &mut self,
        camera_world: Vec3,
        camera_local: Vec3,
    ) -> Result<Option<GroupCandidate>> {
        if !self.is_interior() || !self.volume_box.contains_point_strict(camera_world) {
            return Ok(None);
        }
        if self.geometry.state() != LoadState::Loaded {
            self.request_load();
            return Ok(None);
        }
        let Some(geometry) = self.geometry.asset() else {
            return Ok(None);
        };

        let query = AABB::new(
            Vec3::new(
                camera_local.x - CONTAINMENT_EPSILON,
                camera_local.y - CONTAINMENT_EPSILON,
                self.local_box.min.z - CONTAINMENT_EPSILON,
            ),
            Vec3::new(
                camera_local.x + CONTAINMENT_EPSILON,
                camera_local.y + CONTAINMENT_EPSILON,
                self.local_box.max.z + CONTAINMENT_EPSILON,
            ),
        );

        let nodes = &geometry.bsp_nodes;
        let mut leaves = Vec::new();
        query_bsp_tree(&query, 0, nodes, &mut leaves)?;

        let faces = BspFaces {
            vertices: &geometry.vertices,
            indices: &geometry.indices,
            face_refs: &geometry.bsp_face_refs,
        };
        let Some(bounds) = top_bottom_from_bsp(camera_local, &faces, nodes, &leaves)?.accept(camera_local.z)
        else {
            return Ok(None);
        };

        let path = locate_leaf(camera_local, nodes)?;
        let node_index = path.last().copied().unwrap_or(0);

        Ok(Some(GroupCandidate { group_index: self.index, node_index, bounds, path }))
    }

    /// World-space triangles referenced by one BSP leaf.
    pub fn leaf_triangles(&self, node_index: usize, placement: &Placement) -> Vec<[Vec3; 3]> {
        let Some(geometry) = self.geometry.asset() else {
            return Vec::new();
        };
        let Some(node) = geometry.bsp_nodes.get(node_index).filter(|n| n.is_leaf()) else {
            return Vec::new();
        };
        let first = node.first_face as usize;
        let refs = geometry.bsp_face_refs.get(first..first + node.face_count as usize).unwrap_or(&[]);

        refs.iter()
            .filter_map(|&triangle| {
                let base = triangle as usize * 3;
                let tri = geometry.indices.get(base..base + 3)?;
                let mut corners = [Vec3::ZERO; 3];
                for (corner, &vertex) in corners.iter_mut().zip(tri) {
                    *corner = placement.to_world(*geometry.vertices.get(vertex as usize)?);
                }
                Some(corners)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
