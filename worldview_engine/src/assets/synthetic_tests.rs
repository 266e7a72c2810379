use glam::Vec3;
use crate::math::{locate_leaf, query_bsp_tree, top_bottom_from_bsp, BspFaces};
use super::*;

// ============================================================================
// Tests: box_room_group
// ============================================================================

#[test]
fn test_box_room_bounds_camera_between_floor_and_ceiling() {
    let group = box_room_group(ROOM_A, GroupFlags::INTERIOR, vec![]);
    let camera = Vec3::new(5.0, 5.0, 1.7);

    let mut leaves = Vec::new();
    query_bsp_tree(&group.bounding_box, 0, &group.bsp_nodes, &mut leaves).unwrap();
    let faces = BspFaces {
        vertices: &group.vertices,
        indices: &group.indices,
        face_refs: &group.bsp_face_refs,
    };
    let bounds = top_bottom_from_bsp(camera, &faces, &group.bsp_nodes, &leaves).unwrap();

    assert_eq!(bounds.bottom, Some(0.0));
    assert_eq!(bounds.top, Some(4.0));
    assert_eq!(locate_leaf(camera, &group.bsp_nodes).unwrap(), vec![0]);
}

// ============================================================================
// Tests: two_room_building
// ============================================================================

#[test]
fn test_two_room_building_validates() {
    let building = two_room_building("chair.m2");
    assert!(building.validate().is_ok());
    assert_eq!(building.groups.len(), 3);
    assert_eq!(building.portal_polygon(1).map(|p| p.len()), Some(4));
}

#[test]
fn test_register_two_room_building() {
    let streamer = InMemoryStreamer::new();
    register_two_room_building(&streamer, "inn.wmo", "chair.m2");

    let mut streamer_handle = streamer.clone();
    let group = crate::assets::AssetStreamer::load_building_group(&mut streamer_handle, "inn_002.wmo");
    streamer.resolve_all();
    let group = group.poll().unwrap().unwrap();
    assert!(group.flags.contains(GroupFlags::EXTERIOR));
    assert_eq!(group.doodad_refs, vec![2]);
}

#[test]
fn test_box_model_transparency() {
    assert!(!box_model(1.0, false).has_transparent());
    let glass = box_model(1.0, true);
    assert!(glass.has_opaque() && glass.has_transparent());
}
