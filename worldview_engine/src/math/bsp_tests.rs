use glam::Vec3;
use crate::error::Error;
use super::*;

/// Root splits X at 0 into two leaves.
fn two_leaf_tree() -> Vec<BspNode> {
    vec![
        BspNode::split(BspAxis::X, 0.0, 1, 2),
        BspNode::leaf(0, 0),
        BspNode::leaf(0, 0),
    ]
}

/// Root splits X at 0; the upper side splits Y at 10.
fn three_leaf_tree() -> Vec<BspNode> {
    vec![
        BspNode::split(BspAxis::X, 0.0, 1, 2),
        BspNode::leaf(0, 0),
        BspNode::split(BspAxis::Y, 10.0, 3, 4),
        BspNode::leaf(0, 0),
        BspNode::leaf(0, 0),
    ]
}

fn point_box(p: Vec3, r: f32) -> AABB {
    AABB::new(p - Vec3::splat(r), p + Vec3::splat(r))
}

// ============================================================================
// BspNode
// ============================================================================

#[test]
fn test_node_flags() {
    let leaf = BspNode::leaf(3, 2);
    assert!(leaf.is_leaf());
    assert_eq!(leaf.axis(), None);

    let split = BspNode::split(BspAxis::Z, 4.0, 1, -1);
    assert!(!split.is_leaf());
    assert_eq!(split.axis(), Some(2));

    let bogus = BspNode { plane_type: 3, ..split };
    assert_eq!(bogus.axis(), None);
}

// ============================================================================
// query_bsp_tree
// ============================================================================

#[test]
fn test_query_selects_one_side() {
    let nodes = two_leaf_tree();
    let mut leaves = Vec::new();
    query_bsp_tree(&point_box(Vec3::new(5.0, 0.0, 0.0), 0.4), 0, &nodes, &mut leaves).unwrap();
    assert_eq!(leaves, vec![2]);

    leaves.clear();
    query_bsp_tree(&point_box(Vec3::new(-5.0, 0.0, 0.0), 0.4), 0, &nodes, &mut leaves).unwrap();
    assert_eq!(leaves, vec![1]);
}

#[test]
fn test_query_straddling_box_collects_both_sides() {
    let nodes = three_leaf_tree();
    let mut leaves = Vec::new();
    query_bsp_tree(&point_box(Vec3::new(0.0, 10.0, 0.0), 1.0), 0, &nodes, &mut leaves).unwrap();
    leaves.sort_unstable();
    assert_eq!(leaves, vec![1, 3, 4]);
}

#[test]
fn test_query_skips_empty_children() {
    let nodes = vec![
        BspNode::split(BspAxis::Z, 0.0, BSP_NO_CHILD, 1),
        BspNode::leaf(0, 0),
    ];
    let mut leaves = Vec::new();
    query_bsp_tree(&point_box(Vec3::ZERO, 1.0), 0, &nodes, &mut leaves).unwrap();
    assert_eq!(leaves, vec![1]);
}

#[test]
fn test_query_detects_cycle() {
    // Node 2 points back at the root
    let nodes = vec![
        BspNode::split(BspAxis::X, 0.0, 1, 2),
        BspNode::leaf(0, 0),
        BspNode::split(BspAxis::Y, 0.0, 0, 1),
    ];
    let mut leaves = Vec::new();
    let result = query_bsp_tree(&point_box(Vec3::new(5.0, -5.0, 0.0), 0.4), 0, &nodes, &mut leaves);
    assert!(matches!(result, Err(Error::MalformedBsp(_))));
}

#[test]
fn test_query_detects_self_loop() {
    let nodes = vec![BspNode::split(BspAxis::X, 0.0, 0, 0)];
    let mut leaves = Vec::new();
    let result = query_bsp_tree(&point_box(Vec3::ZERO, 1.0), 0, &nodes, &mut leaves);
    assert!(matches!(result, Err(Error::MalformedBsp(_))));
}

#[test]
fn test_query_detects_out_of_range_child() {
    let nodes = vec![BspNode::split(BspAxis::X, 0.0, 1, 9), BspNode::leaf(0, 0)];
    let mut leaves = Vec::new();
    let result = query_bsp_tree(&point_box(Vec3::new(5.0, 0.0, 0.0), 0.4), 0, &nodes, &mut leaves);
    assert!(matches!(result, Err(Error::MalformedBsp(_))));
}

#[test]
fn test_query_visits_each_node_once() {
    // Balanced tree of depth 4 over X: every leaf overlapped by a huge box
    let mut nodes = Vec::new();
    nodes.push(BspNode::split(BspAxis::X, 0.0, 1, 2));
    nodes.push(BspNode::split(BspAxis::Y, 0.0, 3, 4));
    nodes.push(BspNode::split(BspAxis::Y, 0.0, 5, 6));
    for _ in 0..4 {
        nodes.push(BspNode::leaf(0, 0));
    }
    let mut leaves = Vec::new();
    query_bsp_tree(&point_box(Vec3::ZERO, 100.0), 0, &nodes, &mut leaves).unwrap();
    leaves.sort_unstable();
    assert_eq!(leaves, vec![3, 4, 5, 6]);
}

#[test]
fn test_query_empty_tree() {
    let mut leaves = Vec::new();
    query_bsp_tree(&point_box(Vec3::ZERO, 1.0), 0, &[], &mut leaves).unwrap();
    assert!(leaves.is_empty());
}

// ============================================================================
// locate_leaf / validate_bsp_tree
// ============================================================================

#[test]
fn test_locate_leaf_descends_right_of_split() {
    let path = locate_leaf(Vec3::new(5.0, 0.0, 0.0), &two_leaf_tree()).unwrap();
    assert_eq!(path, vec![0, 2]);
    assert_eq!(path.last(), Some(&2));
}

#[test]
fn test_locate_leaf_split_value_goes_to_second_child() {
    let path = locate_leaf(Vec3::new(0.0, 0.0, 0.0), &two_leaf_tree()).unwrap();
    assert_eq!(path, vec![0, 2]);
    let path = locate_leaf(Vec3::new(-0.001, 0.0, 0.0), &two_leaf_tree()).unwrap();
    assert_eq!(path, vec![0, 1]);
}

#[test]
fn test_locate_leaf_multi_level() {
    let nodes = three_leaf_tree();
    assert_eq!(locate_leaf(Vec3::new(3.0, 12.0, 0.0), &nodes).unwrap(), vec![0, 2, 4]);
    assert_eq!(locate_leaf(Vec3::new(3.0, 2.0, 0.0), &nodes).unwrap(), vec![0, 2, 3]);
}

#[test]
fn test_locate_leaf_stops_at_empty_side() {
    let nodes = vec![BspNode::split(BspAxis::X, 0.0, BSP_NO_CHILD, 1), BspNode::leaf(0, 0)];
    assert_eq!(locate_leaf(Vec3::new(-1.0, 0.0, 0.0), &nodes).unwrap(), vec![0]);
}

#[test]
fn test_locate_leaf_root_leaf() {
    assert_eq!(locate_leaf(Vec3::ZERO, &[BspNode::leaf(0, 0)]).unwrap(), vec![0]);
}

#[test]
fn test_locate_leaf_detects_cycle() {
    let nodes = vec![BspNode::split(BspAxis::X, 0.0, 1, 1), BspNode::split(BspAxis::X, 0.0, 0, 0)];
    assert!(matches!(locate_leaf(Vec3::ZERO, &nodes), Err(Error::MalformedBsp(_))));
}

#[test]
fn test_validate_bsp_tree() {
    assert!(validate_bsp_tree(&three_leaf_tree()).is_ok());
    assert!(validate_bsp_tree(&[]).is_ok());

    // Shared child: node 1 reachable twice
    let shared = vec![BspNode::split(BspAxis::X, 0.0, 1, 1), BspNode::leaf(0, 0)];
    assert!(validate_bsp_tree(&shared).is_err());

    let bad_type = vec![BspNode { plane_type: 3, ..BspNode::split(BspAxis::X, 0.0, -1, -1) }];
    assert!(validate_bsp_tree(&bad_type).is_err());
}

// ============================================================================
// top_bottom_from_bsp / TopBottom::accept
// ============================================================================

/// A floor quad at z = 0 and a ceiling quad at z = 4, both covering [-5, 5]².
fn room_geometry() -> (Vec<Vec3>, Vec<u16>, Vec<u16>) {
    let vertices = vec![
        Vec3::new(-5.0, -5.0, 0.0), Vec3::new(5.0, -5.0, 0.0),
        Vec3::new(5.0, 5.0, 0.0), Vec3::new(-5.0, 5.0, 0.0),
        Vec3::new(-5.0, -5.0, 4.0), Vec3::new(5.0, -5.0, 4.0),
        Vec3::new(5.0, 5.0, 4.0), Vec3::new(-5.0, 5.0, 4.0),
        // A wall: vertical triangles never count
        Vec3::new(0.0, -5.0, 0.0), Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 5.0, 4.0),
    ];
    let indices = vec![0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6, 8, 9, 10];
    let face_refs = vec![0, 1, 2, 3, 4];
    (vertices, indices, face_refs)
}

#[test]
fn test_top_bottom_inside_room() {
    let (vertices, indices, face_refs) = room_geometry();
    let faces = BspFaces { vertices: &vertices, indices: &indices, face_refs: &face_refs };
    let nodes = vec![BspNode::leaf(0, 5)];

    let tb = top_bottom_from_bsp(Vec3::new(1.0, 1.0, 1.7), &faces, &nodes, &[0]).unwrap();
    assert_eq!(tb.bottom, Some(0.0));
    assert_eq!(tb.top, Some(4.0));
    assert_eq!(tb.span(), Some(4.0));
}

#[test]
fn test_top_bottom_outside_footprint() {
    let (vertices, indices, face_refs) = room_geometry();
    let faces = BspFaces { vertices: &vertices, indices: &indices, face_refs: &face_refs };
    let nodes = vec![BspNode::leaf(0, 5)];

    let tb = top_bottom_from_bsp(Vec3::new(20.0, 0.0, 1.0), &faces, &nodes, &[0]).unwrap();
    assert_eq!(tb, TopBottom::default());
    assert_eq!(tb.span(), None);
}

#[test]
fn test_top_bottom_above_roof_has_no_top() {
    let (vertices, indices, face_refs) = room_geometry();
    let faces = BspFaces { vertices: &vertices, indices: &indices, face_refs: &face_refs };
    let nodes = vec![BspNode::leaf(0, 5)];

    let tb = top_bottom_from_bsp(Vec3::new(0.5, 0.5, 10.0), &faces, &nodes, &[0]).unwrap();
    assert_eq!(tb.bottom, Some(4.0));
    assert_eq!(tb.top, None);
}

#[test]
fn test_top_bottom_bad_face_range() {
    let (vertices, indices, face_refs) = room_geometry();
    let faces = BspFaces { vertices: &vertices, indices: &indices, face_refs: &face_refs };
    let nodes = vec![BspNode::leaf(3, 10)];
    let result = top_bottom_from_bsp(Vec3::ZERO, &faces, &nodes, &[0]);
    assert!(matches!(result, Err(Error::MalformedBsp(_))));
}

#[test]
fn test_accept_within_bounds() {
    let tb = TopBottom { top: Some(4.0), bottom: Some(0.0) };
    assert_eq!(tb.accept(2.0), Some(tb));
    assert_eq!(tb.accept(-0.1), None);
    assert_eq!(tb.accept(4.1), None);
}

#[test]
fn test_accept_rejects_unresolved() {
    assert_eq!(TopBottom::default().accept(0.0), None);
}

#[test]
fn test_accept_one_sided_bounds() {
    let floor_only = TopBottom { top: None, bottom: Some(1.0) };
    assert!(floor_only.accept(50.0).is_some());
    assert!(floor_only.accept(0.5).is_none());

    let ceiling_only = TopBottom { top: Some(3.0), bottom: None };
    assert!(ceiling_only.accept(-50.0).is_some());
    assert!(ceiling_only.accept(3.5).is_none());
}

#[test]
fn test_accept_inverted_bounds_keeps_camera_side() {
    let inverted = TopBottom { top: Some(2.0), bottom: Some(5.0) };

    // Above the floor: the ceiling is dropped
    let above = inverted.accept(6.0).unwrap();
    assert_eq!(above, TopBottom { top: None, bottom: Some(5.0) });

    // Exactly on the floor: the floor is dropped, then the ceiling rejects
    assert_eq!(inverted.accept(5.0), None);

    // Below the floor is rejected before the fallback applies
    assert_eq!(inverted.accept(3.0), None);
}
