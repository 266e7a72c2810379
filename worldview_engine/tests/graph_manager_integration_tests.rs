//! Integration tests for the visibility pipeline
//!
//! Drive the Graph Manager through its public API only: stream a synthetic
//! world in, move the camera, and check what reaches the render backend.
//!
//! Run with: cargo test --test graph_manager_integration_tests

use worldview_engine::glam::{Mat4, Vec3};
use worldview_engine::worldview::assets::synthetic::{box_model, register_two_room_building};
use worldview_engine::worldview::assets::InMemoryStreamer;
use worldview_engine::worldview::math::{
    locate_leaf, query_bsp_tree, BspAxis, BspNode, Frustum, Placement, AABB,
};
use worldview_engine::worldview::scene::{DrawCommand, DrawList, DrawPass, DrawStage, LoadState, Renderable};
use worldview_engine::worldview::{
    run_frame, CameraState, Error, FrameResult, GraphManager, ViewerConfig,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn camera(eye: Vec3, target: Vec3) -> CameraState {
    CameraState::look_at(eye, target, 90f32.to_radians(), 1.0, 0.1, 5000.0)
}

fn at(x: f32, y: f32, z: f32) -> Placement {
    Placement::from_matrix(Mat4::from_translation(Vec3::new(x, y, z)))
}

/// Run `frames` frames, returning the last result and its draw list.
fn run(manager: &mut GraphManager, camera: &CameraState, frames: usize) -> (FrameResult, DrawList) {
    let mut result = FrameResult::default();
    let mut list = DrawList::new();
    for _ in 0..frames {
        list.clear();
        result = run_frame(manager, camera, 16.0, &mut list).expect("draw list never fails");
    }
    (result, list)
}

fn model_commands(list: &DrawList, pass: DrawPass) -> Vec<(String, Vec3)> {
    list.commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Model { model, transform, pass: p, .. } if *p == pass => {
                Some((model.to_string(), transform.w_axis.truncate()))
            }
            _ => None,
        })
        .collect()
}

// ============================================================================
// Frustum and BSP properties
// ============================================================================

#[test]
fn test_frustum_rejects_box_wholly_outside_one_plane() {
    let vp = Mat4::perspective_rh(90f32.to_radians(), 1.0, 0.1, 100.0)
        * Mat4::look_at_rh(Vec3::ZERO, Vec3::X, Vec3::Z);
    let frustum = Frustum::from_view_projection(&vp);

    let ahead = AABB::new(Vec3::new(10.0, -1.0, -1.0), Vec3::new(12.0, 1.0, 1.0));
    let behind = AABB::new(Vec3::new(-12.0, -1.0, -1.0), Vec3::new(-10.0, 1.0, 1.0));
    let beyond_far = AABB::new(Vec3::new(150.0, -1.0, -1.0), Vec3::new(160.0, 1.0, 1.0));
    let straddling = AABB::new(Vec3::new(-5.0, -1.0, -1.0), Vec3::new(5.0, 1.0, 1.0));

    assert!(frustum.intersects_aabb(&ahead));
    assert!(!frustum.intersects_aabb(&behind));
    assert!(!frustum.intersects_aabb(&beyond_far));
    assert!(frustum.intersects_aabb(&straddling));
}

#[test]
fn test_bsp_point_descends_to_upper_leaf() {
    let nodes = vec![
        BspNode::split(BspAxis::X, 0.0, 1, 2),
        BspNode::leaf(0, 0),
        BspNode::leaf(0, 0),
    ];
    assert_eq!(locate_leaf(Vec3::new(5.0, 0.0, 0.0), &nodes).unwrap(), vec![0, 2]);
    assert_eq!(locate_leaf(Vec3::new(-5.0, 0.0, 0.0), &nodes).unwrap(), vec![0, 1]);

    let mut leaves = Vec::new();
    let query_box = AABB::new(Vec3::new(4.6, -0.4, -0.4), Vec3::new(5.4, 0.4, 0.4));
    query_bsp_tree(&query_box, 0, &nodes, &mut leaves).unwrap();
    assert_eq!(leaves, vec![2]);
}

#[test]
fn test_bsp_cycle_terminates_with_error() {
    let nodes = vec![
        BspNode::split(BspAxis::X, 0.0, 1, 1),
        BspNode::split(BspAxis::Y, 0.0, 0, 0),
    ];
    let mut leaves = Vec::new();
    let query_box = AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0));

    assert!(matches!(query_bsp_tree(&query_box, 0, &nodes, &mut leaves), Err(Error::MalformedBsp(_))));
    assert!(matches!(locate_leaf(Vec3::ONE, &nodes), Err(Error::MalformedBsp(_))));
}

// ============================================================================
// Pipeline scenarios
// ============================================================================

#[test]
fn test_outdoor_camera_sees_building_and_model_ahead() {
    let streamer = InMemoryStreamer::new();
    register_two_room_building(&streamer, "inn.wmo", "chair.m2");
    streamer.insert_model("tree.m2", box_model(1.0, false));
    let mut manager = GraphManager::new(Box::new(streamer), ViewerConfig::default());
    manager.add_building_with_placement("inn.wmo", Placement::default(), 0);
    manager.add_model_with_placement("tree.m2", at(-5.0, 5.0, 0.0));

    let (result, list) = run(&mut manager, &camera(Vec3::new(-30.0, 5.0, 2.0), Vec3::new(10.0, 5.0, 2.0)), 5);

    assert_eq!(result, FrameResult { interior_group: -1, bsp_node: -1 });
    assert!(list.count_stage(DrawStage::Buildings) > 0);
    let models = model_commands(&list, DrawPass::Opaque);
    assert!(models.iter().any(|(name, _)| name == "tree.m2"));
    assert!(!manager.stats().portal_culling);
}

#[test]
fn test_camera_inside_tightest_group() {
    let streamer = InMemoryStreamer::new();
    register_two_room_building(&streamer, "inn.wmo", "chair.m2");
    let mut manager = GraphManager::new(Box::new(streamer), ViewerConfig::default());
    let key = manager.add_building_with_placement("inn.wmo", Placement::default(), 0);

    let (result, _) = run(&mut manager, &camera(Vec3::new(15.0, 5.0, 1.5), Vec3::new(0.0, 5.0, 1.5)), 5);

    assert_eq!(result.interior_group, 1);
    assert!(result.bsp_node >= 0);
    let (current, location) = manager.current_interior().unwrap();
    assert_eq!(current, key);
    assert_eq!(location.group_id, 1);
    assert!(manager.stats().portal_culling);
}

#[test]
fn test_containment_is_deterministic() {
    let streamer = InMemoryStreamer::new();
    register_two_room_building(&streamer, "inn.wmo", "chair.m2");
    let mut manager = GraphManager::new(Box::new(streamer), ViewerConfig::default());
    manager.add_building_with_placement("inn.wmo", Placement::default(), 0);
    let view = camera(Vec3::new(4.0, 5.0, 1.5), Vec3::new(20.0, 5.0, 1.5));

    let (first, _) = run(&mut manager, &view, 5);
    for _ in 0..10 {
        let (again, _) = run(&mut manager, &view, 1);
        assert_eq!(again, first);
    }
}

#[test]
fn test_far_small_object_distance_culled() {
    let streamer = InMemoryStreamer::new();
    // Diameter 2 * sqrt(3), culled beyond ~346 units at the default factor
    streamer.insert_model("rock.m2", box_model(1.0, false));
    let mut manager = GraphManager::new(Box::new(streamer), ViewerConfig::default());
    let near = manager.add_model_with_placement("rock.m2", at(100.0, 0.0, 0.0));
    let far = manager.add_model_with_placement("rock.m2", at(1000.0, 0.0, 0.0));

    run(&mut manager, &camera(Vec3::ZERO, Vec3::X), 5);

    assert!(manager.object(near).unwrap().is_rendered());
    assert!(!manager.object(far).unwrap().is_rendered());
    assert_eq!(manager.stats().distance_culled, 1);
}

#[test]
fn test_unloaded_models_fail_open() {
    let streamer = InMemoryStreamer::new();
    streamer.insert_model("rock.m2", box_model(1.0, false));
    streamer.set_paused(true);
    let mut manager = GraphManager::new(Box::new(streamer.clone()), ViewerConfig::default());
    // Placed behind the camera; once loaded it must be culled
    let key = manager.add_model_with_placement("rock.m2", at(-50.0, 0.0, 0.0));
    let view = camera(Vec3::ZERO, Vec3::X);

    run(&mut manager, &view, 4);
    assert!(manager.visibility().is_visible(key));
    assert_eq!(manager.stats().pending_loads, 1);

    streamer.set_paused(false);
    run(&mut manager, &view, 2);
    assert!(!manager.visibility().is_visible(key));
    assert_eq!(manager.stats().pending_loads, 0);
}

#[test]
fn test_failed_model_excluded_without_error() {
    let streamer = InMemoryStreamer::new();
    streamer.fail("statue.m2", "archive truncated");
    let mut manager = GraphManager::new(Box::new(streamer.clone()), ViewerConfig::default());
    let key = manager.add_model_with_placement("statue.m2", at(10.0, 0.0, 0.0));

    let (_, list) = run(&mut manager, &camera(Vec3::ZERO, Vec3::X), 4);

    assert_eq!(manager.object(key).unwrap().load_state(), LoadState::Failed);
    assert!(!manager.visibility().is_visible(key));
    assert!(model_commands(&list, DrawPass::Opaque).is_empty());
    // Never retried
    assert_eq!(streamer.load_count("statue.m2"), 1);
}

#[test]
fn test_transparent_models_drawn_back_to_front() {
    let streamer = InMemoryStreamer::new();
    streamer.insert_model("lantern.m2", box_model(0.5, true));
    let mut manager = GraphManager::new(Box::new(streamer), ViewerConfig::default());
    for x in [20.0, 60.0, 5.0, 40.0] {
        manager.add_model_with_placement("lantern.m2", at(x, 0.0, 0.0));
    }

    let (_, list) = run(&mut manager, &camera(Vec3::ZERO, Vec3::X), 4);

    let xs: Vec<f32> = model_commands(&list, DrawPass::Transparent).iter().map(|(_, p)| p.x).collect();
    assert_eq!(xs, vec![60.0, 40.0, 20.0, 5.0]);
    // The opaque halves are batched, not sorted
    assert_eq!(model_commands(&list, DrawPass::Opaque).len(), 4);
}

#[test]
fn test_portal_culling_hides_room_behind_wall() {
    let streamer = InMemoryStreamer::new();
    register_two_room_building(&streamer, "inn.wmo", "chair.m2");
    let mut manager = GraphManager::new(Box::new(streamer), ViewerConfig::default());
    manager.add_building_with_placement("inn.wmo", Placement::default(), 1);

    // Room A looking away from the door at x = 10
    let (result, list) = run(&mut manager, &camera(Vec3::new(8.0, 5.0, 1.5), Vec3::new(-10.0, 5.0, 1.5)), 6);

    assert_eq!(result.interior_group, 0);
    let groups: Vec<usize> = list
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::BuildingGroup { group, .. } => Some(*group),
            _ => None,
        })
        .collect();
    assert_eq!(groups, vec![0]);
    let chairs = model_commands(&list, DrawPass::Opaque);
    assert_eq!(chairs.len(), 1);
    assert_eq!(chairs[0].1, Vec3::new(5.0, 5.0, 1.0));
}

#[test]
fn test_draw_order_is_fixed() {
    let streamer = InMemoryStreamer::new();
    register_two_room_building(&streamer, "inn.wmo", "chair.m2");
    streamer.insert_model("lantern.m2", box_model(0.5, true));
    let mut manager = GraphManager::new(Box::new(streamer), ViewerConfig::default());
    manager.add_building_with_placement("inn.wmo", Placement::default(), 0);
    manager.add_model_with_placement("lantern.m2", at(-10.0, 5.0, 1.0));

    let (_, list) = run(&mut manager, &camera(Vec3::new(-30.0, 5.0, 2.0), Vec3::new(10.0, 5.0, 2.0)), 5);

    let stages: Vec<DrawStage> = list.commands().iter().map(DrawCommand::stage).collect();
    let mut sorted = stages.clone();
    sorted.sort();
    assert_eq!(stages, sorted);
    assert_eq!(stages.first(), Some(&DrawStage::Terrain));
    assert!(stages.contains(&DrawStage::TransparentModels));
}
