use glam::{Mat4, Vec3};
use crate::math::AABB;
use super::*;

fn camera_matrix() -> Mat4 {
    let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
    let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
    projection * view
}

fn ndc_depth(distance: f32) -> f32 {
    let clip = camera_matrix() * Vec3::new(0.0, 0.0, -distance).extend(1.0);
    clip.z / clip.w
}

// ============================================================================
// Tests: reduction
// ============================================================================

#[test]
fn test_from_depth_rejects_bad_dimensions() {
    assert!(CoarseDepthBuffer::from_depth(&[], 0, 0).is_none());
    assert!(CoarseDepthBuffer::from_depth(&[0.5; 10], 4, 4).is_none());
}

#[test]
fn test_blocks_keep_farthest_depth() {
    let mut depth = vec![0.2f32; 16 * 9];
    depth[3] = 0.9;
    depth[16 * 8 + 15] = 0.7;
    let buffer = CoarseDepthBuffer::from_depth(&depth, 16, 9).unwrap();

    assert_eq!(buffer.block_width(), 2);
    assert_eq!(buffer.block_height(), 2);
    assert_eq!(buffer.block(0, 0), Some(0.9));
    assert_eq!(buffer.block(1, 0), Some(0.2));
    assert_eq!(buffer.block(1, 1), Some(0.7));
    assert_eq!(buffer.block(2, 0), None);
}

// ============================================================================
// Tests: occlusion
// ============================================================================

#[test]
fn test_object_behind_wall_is_occluded() {
    let wall = ndc_depth(5.0);
    let buffer = CoarseDepthBuffer::from_depth(&vec![wall; 64 * 64], 64, 64).unwrap();
    let far_box = AABB::new(Vec3::new(-1.0, -1.0, -21.0), Vec3::new(1.0, 1.0, -19.0));
    assert!(!buffer.is_potentially_visible(&far_box, &camera_matrix()));
}

#[test]
fn test_object_in_front_of_wall_is_visible() {
    let wall = ndc_depth(50.0);
    let buffer = CoarseDepthBuffer::from_depth(&vec![wall; 64 * 64], 64, 64).unwrap();
    let near_box = AABB::new(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0));
    assert!(buffer.is_potentially_visible(&near_box, &camera_matrix()));
}

#[test]
fn test_single_far_block_reveals_object() {
    let wall = ndc_depth(5.0);
    let mut depth = vec![wall; 64 * 64];
    // Hole in the middle of the screen
    for y in 24..40 {
        for x in 24..40 {
            depth[y * 64 + x] = 1.0;
        }
    }
    let buffer = CoarseDepthBuffer::from_depth(&depth, 64, 64).unwrap();
    let far_box = AABB::new(Vec3::new(-1.0, -1.0, -21.0), Vec3::new(1.0, 1.0, -19.0));
    assert!(buffer.is_potentially_visible(&far_box, &camera_matrix()));
}

#[test]
fn test_box_behind_camera_fails_open() {
    let buffer = CoarseDepthBuffer::from_depth(&vec![0.0; 64], 8, 8).unwrap();
    let behind = AABB::new(Vec3::new(-1.0, -1.0, 4.0), Vec3::new(1.0, 1.0, 6.0));
    assert!(buffer.is_potentially_visible(&behind, &camera_matrix()));
}
