//! Decoded asset descriptors handed over by the streaming collaborator.
//!
//! These are the parsed forms of building root files, building group files
//! and model files. Binary layouts are the parser's concern; the scene only
//! sees these plain structs.

use bitflags::bitflags;
use glam::{Quat, Vec3, Vec4};
use crate::error::Result;
use crate::math::{AABB, BspNode};

bitflags! {
    /// Building group flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GroupFlags: u32 {
        /// Group is outdoors (courtyards, balconies); seen through exterior portals
        const EXTERIOR = 0x8;
        /// Doodads in this group use world lighting instead of the building's
        const EXTERIOR_LIT = 0x40;
        /// Group is an enclosed interior; only these take part in containment
        const INTERIOR = 0x2000;
    }
}

/// Per-group entry of a building root file
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInfo {
    pub flags: GroupFlags,
    /// Group bounds in building-local space
    pub bounding_box: AABB,
    /// Range of `BuildingDescriptor::portal_refs` leaving this group
    pub portal_ref_start: u32,
    pub portal_ref_count: u32,
}

/// A portal polygon shared by two groups
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalInfo {
    /// First vertex in `BuildingDescriptor::portal_vertices`
    pub base_index: u32,
    pub vertex_count: u32,
    /// Portal plane in building-local space (unit normal, distance)
    pub plane: Vec4,
}

/// One traversal direction of a portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalRef {
    pub portal_index: u16,
    /// Group on the far side
    pub group_index: u16,
    /// Side of the portal plane the owning group lies on (+1 / -1)
    pub side: i16,
}

/// A named range of doodad definitions
#[derive(Debug, Clone, PartialEq)]
pub struct DoodadSet {
    pub name: String,
    pub first_instance: u32,
    pub count: u32,
}

impl DoodadSet {
    pub fn contains(&self, index: u32) -> bool {
        index >= self.first_instance && u64::from(index) < self.end()
    }

    /// One past the last definition index, widened so a corrupt range
    /// cannot wrap.
    pub fn end(&self) -> u64 {
        u64::from(self.first_instance) + u64::from(self.count)
    }
}

/// A model instance placed inside a building
#[derive(Debug, Clone, PartialEq)]
pub struct DoodadDef {
    pub model_name: String,
    /// Building-local position
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    /// Local lighting color (RGBA, 0-255)
    pub color: [u8; 4],
}

/// Decoded building root file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildingDescriptor {
    /// Building bounds in building-local space
    pub bounding_box: AABB,
    pub groups: Vec<GroupInfo>,
    pub portal_vertices: Vec<Vec3>,
    pub portals: Vec<PortalInfo>,
    pub portal_refs: Vec<PortalRef>,
    pub doodad_sets: Vec<DoodadSet>,
    pub doodad_defs: Vec<DoodadDef>,
    /// Ambient color applied to interior groups
    pub ambient_color: Vec4,
}

impl BuildingDescriptor {
    /// Check every cross-reference before the scene relies on it.
    pub fn validate(&self) -> Result<()> {
        for (i, group) in self.groups.iter().enumerate() {
            let end = group.portal_ref_start as usize + group.portal_ref_count as usize;
            if end > self.portal_refs.len() {
                crate::engine_bail!("worldview::assets",
                    "Group {} portal refs {}..{} exceed {}", i, group.portal_ref_start, end, self.portal_refs.len());
            }
        }
        for (i, portal_ref) in self.portal_refs.iter().enumerate() {
            if portal_ref.portal_index as usize >= self.portals.len() {
                crate::engine_bail!("worldview::assets",
                    "Portal ref {} names portal {} of {}", i, portal_ref.portal_index, self.portals.len());
            }
            if portal_ref.group_index as usize >= self.groups.len() {
                crate::engine_bail!("worldview::assets",
                    "Portal ref {} names group {} of {}", i, portal_ref.group_index, self.groups.len());
            }
        }
        for (i, portal) in self.portals.iter().enumerate() {
            let end = portal.base_index as usize + portal.vertex_count as usize;
            if end > self.portal_vertices.len() {
                crate::engine_bail!("worldview::assets",
                    "Portal {} vertices {}..{} exceed {}", i, portal.base_index, end, self.portal_vertices.len());
            }
        }
        for (i, set) in self.doodad_sets.iter().enumerate() {
            if set.end() > self.doodad_defs.len() as u64 {
                crate::engine_bail!("worldview::assets",
                    "Doodad set {} ('{}') exceeds {} definitions", i, set.name, self.doodad_defs.len());
            }
        }
        Ok(())
    }

    /// Vertices of one portal in building-local space.
    pub fn portal_polygon(&self, portal_index: usize) -> Option<&[Vec3]> {
        let portal = self.portals.get(portal_index)?;
        let start = portal.base_index as usize;
        self.portal_vertices.get(start..start + portal.vertex_count as usize)
    }

    /// File name of a group: the root name without extension, `_NNN.wmo`.
    pub fn group_file_name(root_name: &str, group_index: usize) -> String {
        let stem = match root_name.rfind('.') {
            Some(dot) => &root_name[..dot],
            None => root_name,
        };
        format!("{}_{:03}.wmo", stem, group_index)
    }
}

/// Decoded building group file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupGeometryDescriptor {
    pub flags: GroupFlags,
    /// Group bounds in building-local space
    pub bounding_box: AABB,
    pub vertices: Vec<Vec3>,
    /// Three vertex indices per triangle
    pub indices: Vec<u16>,
    /// BSP nodes, root first
    pub bsp_nodes: Vec<BspNode>,
    /// Triangle numbers referenced by BSP leaves
    pub bsp_face_refs: Vec<u16>,
    /// Indices into `BuildingDescriptor::doodad_defs`
    pub doodad_refs: Vec<u16>,
}

/// One draw batch of a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSubMesh {
    pub index_start: u32,
    pub index_count: u32,
    /// 0 opaque, 1 alpha-key, 2+ blended
    pub blend_mode: u16,
}

impl ModelSubMesh {
    pub fn is_transparent(&self) -> bool {
        self.blend_mode >= 2
    }
}

/// Decoded model file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelDescriptor {
    /// Model bounds in model-local space
    pub bounding_box: AABB,
    pub submeshes: Vec<ModelSubMesh>,
}

impl ModelDescriptor {
    pub fn has_opaque(&self) -> bool {
        self.submeshes.iter().any(|s| !s.is_transparent())
    }

    pub fn has_transparent(&self) -> bool {
        self.submeshes.iter().any(|s| s.is_transparent())
    }
}

/// A map model placement (terrain doodad)
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPlacementDef {
    pub model_name: String,
    pub position: Vec3,
    /// Euler angles in degrees
    pub rotation: Vec3,
    /// Fixed point, 1024 = 1.0
    pub scale: u16,
}

/// A map building placement
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingPlacementDef {
    pub building_name: String,
    pub position: Vec3,
    /// Euler angles in degrees
    pub rotation: Vec3,
    pub doodad_set: u16,
}

#[cfg(test)]
#[path = "descriptors_tests.rs"]
mod tests;
