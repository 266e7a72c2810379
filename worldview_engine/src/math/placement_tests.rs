use glam::{Mat4, Quat, Vec3};
use super::*;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < 1e-2
}

#[test]
fn test_inverse_round_trip() {
    let placement = Placement::for_map_building(Vec3::new(17000.0, 40.0, 16000.0), Vec3::new(0.0, 37.0, 0.0));
    let local = Vec3::new(3.0, -2.0, 8.0);
    assert!(approx(placement.to_local(placement.to_world(local)), local));
    assert!(approx((*placement.matrix() * *placement.inverse()).transform_point3(local), local));
}

#[test]
fn test_map_building_origin_lands_on_world_position() {
    // The local origin of an unrotated placement maps to the recentered position
    let origin = 32.0 * TILE_SIZE;
    let placement = Placement::for_map_building(Vec3::new(origin - 100.0, 25.0, origin - 200.0), Vec3::ZERO);
    let world = placement.to_world(Vec3::ZERO);
    // rotX(90) * rotY(90) maps (x, y, z) to (z, x, y)
    assert!(approx(world, Vec3::new(200.0, 100.0, 25.0)));
}

#[test]
fn test_map_building_is_rigid() {
    let center = 32.0 * TILE_SIZE;
    let placement = Placement::for_map_building(Vec3::new(center, 2.0, center), Vec3::new(10.0, 20.0, 30.0));
    let a = placement.to_world(Vec3::ZERO);
    let b = placement.to_world(Vec3::new(5.0, 0.0, 0.0));
    assert!(((a - b).length() - 5.0).abs() < 1e-3);
}

#[test]
fn test_map_model_scale() {
    let center = 32.0 * TILE_SIZE;
    let placement = Placement::for_map_model(Vec3::new(center, 0.0, center), Vec3::ZERO, 2048);
    let a = placement.to_world(Vec3::ZERO);
    let b = placement.to_world(Vec3::new(0.0, 0.0, 1.0));
    assert!(((a - b).length() - 2.0).abs() < 1e-3);
}

#[test]
fn test_building_doodad_composes_parent() {
    let parent = Placement::from_matrix(Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0)));
    let doodad = Placement::for_building_doodad(
        &parent,
        Vec3::new(0.0, 10.0, 0.0),
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        0.5,
    );
    // Local +X of the doodad: scaled by 0.5, rotated onto +Y, then offset
    let world = doodad.to_world(Vec3::new(2.0, 0.0, 0.0));
    assert!(approx(world, Vec3::new(100.0, 11.0, 0.0)));
}

#[test]
fn test_default_is_identity() {
    let placement = Placement::default();
    assert_eq!(*placement.matrix(), Mat4::IDENTITY);
    assert_eq!(placement.to_local(Vec3::ONE), Vec3::ONE);
}
