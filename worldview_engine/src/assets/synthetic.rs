//! Procedural descriptors for headless runs.
//!
//! Builds simple rooms (floor and ceiling quads under a single BSP leaf)
//! and a small three-group building so the demo and the tests can exercise
//! containment, portal traversal and doodad streaming without asset files.

use glam::{Quat, Vec3, Vec4};
use crate::math::{AABB, BspNode};
use super::descriptors::{
    BuildingDescriptor, DoodadDef, DoodadSet, GroupFlags, GroupGeometryDescriptor, GroupInfo,
    ModelDescriptor, ModelSubMesh, PortalInfo, PortalRef,
};
use super::memory_streamer::InMemoryStreamer;

/// Room geometry: a floor quad at `bounds.min.z` and a ceiling quad at
/// `bounds.max.z`, all four triangles in one root leaf.
pub fn box_room_group(bounds: AABB, flags: GroupFlags, doodad_refs: Vec<u16>) -> GroupGeometryDescriptor {
    let (lo, hi) = (bounds.min, bounds.max);
    let vertices = vec![
        Vec3::new(lo.x, lo.y, lo.z),
        Vec3::new(hi.x, lo.y, lo.z),
        Vec3::new(hi.x, hi.y, lo.z),
        Vec3::new(lo.x, hi.y, lo.z),
        Vec3::new(lo.x, lo.y, hi.z),
        Vec3::new(hi.x, lo.y, hi.z),
        Vec3::new(hi.x, hi.y, hi.z),
        Vec3::new(lo.x, hi.y, hi.z),
    ];
    let indices = vec![0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6];

    GroupGeometryDescriptor {
        flags,
        bounding_box: bounds,
        vertices,
        indices,
        bsp_nodes: vec![BspNode::leaf(0, 4)],
        bsp_face_refs: vec![0, 1, 2, 3],
        doodad_refs,
    }
}

/// A model whose bounds are a cube of the given half extent around the origin.
pub fn box_model(half_extent: f32, transparent: bool) -> ModelDescriptor {
    let mut submeshes = vec![ModelSubMesh { index_start: 0, index_count: 36, blend_mode: 0 }];
    if transparent {
        submeshes.push(ModelSubMesh { index_start: 36, index_count: 36, blend_mode: 2 });
    }
    ModelDescriptor {
        bounding_box: AABB::new(Vec3::splat(-half_extent), Vec3::splat(half_extent)),
        submeshes,
    }
}

/// Room A of `two_room_building`
pub const ROOM_A: AABB = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 4.0));
/// Room B, sharing the x = 10 wall with room A
pub const ROOM_B: AABB = AABB::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 10.0, 4.0));
/// Exterior porch, sharing the x = 20 wall with room B
pub const PORCH: AABB = AABB::new(Vec3::new(20.0, 0.0, 0.0), Vec3::new(26.0, 10.0, 4.0));

fn door(x: f32) -> [Vec3; 4] {
    [
        Vec3::new(x, 3.0, 0.0),
        Vec3::new(x, 7.0, 0.0),
        Vec3::new(x, 7.0, 3.0),
        Vec3::new(x, 3.0, 3.0),
    ]
}

/// Two interior rooms and an exterior porch laid out along +X, joined by
/// doors at x = 10 and x = 20. Each group references one doodad of
/// `doodad_model`; the porch doodad sits in doodad set 1.
pub fn two_room_building(doodad_model: &str) -> BuildingDescriptor {
    let groups = vec![
        GroupInfo { flags: GroupFlags::INTERIOR, bounding_box: ROOM_A, portal_ref_start: 0, portal_ref_count: 1 },
        GroupInfo { flags: GroupFlags::INTERIOR, bounding_box: ROOM_B, portal_ref_start: 1, portal_ref_count: 2 },
        GroupInfo { flags: GroupFlags::EXTERIOR, bounding_box: PORCH, portal_ref_start: 3, portal_ref_count: 1 },
    ];

    let mut portal_vertices = Vec::new();
    portal_vertices.extend_from_slice(&door(10.0));
    portal_vertices.extend_from_slice(&door(20.0));

    let portals = vec![
        PortalInfo { base_index: 0, vertex_count: 4, plane: Vec4::new(1.0, 0.0, 0.0, -10.0) },
        PortalInfo { base_index: 4, vertex_count: 4, plane: Vec4::new(1.0, 0.0, 0.0, -20.0) },
    ];

    let portal_refs = vec![
        PortalRef { portal_index: 0, group_index: 1, side: -1 },
        PortalRef { portal_index: 0, group_index: 0, side: 1 },
        PortalRef { portal_index: 1, group_index: 2, side: -1 },
        PortalRef { portal_index: 1, group_index: 1, side: 1 },
    ];

    let doodad = |position: Vec3| DoodadDef {
        model_name: doodad_model.to_string(),
        position,
        rotation: Quat::IDENTITY,
        scale: 1.0,
        color: [200, 180, 160, 255],
    };

    BuildingDescriptor {
        bounding_box: ROOM_A.merged(&ROOM_B).merged(&PORCH),
        groups,
        portal_vertices,
        portals,
        portal_refs,
        doodad_sets: vec![
            DoodadSet { name: "Set_$DefaultGlobal".to_string(), first_instance: 0, count: 2 },
            DoodadSet { name: "Set_Porch".to_string(), first_instance: 2, count: 1 },
        ],
        doodad_defs: vec![
            doodad(Vec3::new(5.0, 5.0, 1.0)),
            doodad(Vec3::new(15.0, 5.0, 1.0)),
            doodad(Vec3::new(23.0, 5.0, 1.0)),
        ],
        ambient_color: Vec4::new(0.5, 0.5, 0.5, 1.0),
    }
}

/// Register `two_room_building` and its groups under `name`, plus a
/// half-unit box for `doodad_model`.
pub fn register_two_room_building(streamer: &InMemoryStreamer, name: &str, doodad_model: &str) {
    let descriptor = two_room_building(doodad_model);
    let rooms = [(ROOM_A, vec![0]), (ROOM_B, vec![1]), (PORCH, vec![2])];
    for (index, (bounds, doodads)) in rooms.into_iter().enumerate() {
        let flags = descriptor.groups[index].flags;
        streamer.insert_group(
            &BuildingDescriptor::group_file_name(name, index),
            box_room_group(bounds, flags, doodads),
        );
    }
    streamer.insert_building(name, descriptor);
    streamer.insert_model(doodad_model, box_model(0.5, false));
}

#[cfg(test)]
#[path = "synthetic_tests.rs"]
mod tests;
