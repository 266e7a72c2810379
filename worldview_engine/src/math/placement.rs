/// Placement transforms for map buildings, map doodads and building doodads.
///
/// Map placements use the map's file coordinates: the position is measured
/// from the map corner and stored with Y up, so the matrix swizzles into the
/// viewer's Z-up world and recenters on the middle of the 64×64 tile grid.

use glam::{Mat4, Quat, Vec3};

/// Edge length of one map tile
pub const TILE_SIZE: f32 = 533.333_33;

/// Map doodad scale is stored as a fixed-point value where 1024 means 1.0
pub const MAP_SCALE_ONE: f32 = 1024.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    matrix: Mat4,
    inverse: Mat4,
}

impl Default for Placement {
    fn default() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }
}

impl Placement {
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix, inverse: matrix.inverse() }
    }

    fn map_base(position: Vec3, rotation_degrees: Vec3) -> Mat4 {
        let origin = 32.0 * TILE_SIZE;
        Mat4::from_rotation_x(90f32.to_radians())
            * Mat4::from_rotation_y(90f32.to_radians())
            * Mat4::from_translation(Vec3::new(origin - position.x, position.y, origin - position.z))
            * Mat4::from_rotation_y((rotation_degrees.y - 270.0).to_radians())
            * Mat4::from_rotation_z((-rotation_degrees.x).to_radians())
            * Mat4::from_rotation_x((rotation_degrees.z - 90.0).to_radians())
    }

    /// Building placed by a map definition (rotation in degrees).
    pub fn for_map_building(position: Vec3, rotation_degrees: Vec3) -> Self {
        Self::from_matrix(Self::map_base(position, rotation_degrees))
    }

    /// Model placed by a map definition; `scale` is fixed point (1024 = 1.0).
    pub fn for_map_model(position: Vec3, rotation_degrees: Vec3, scale: u16) -> Self {
        let scale = f32::from(scale) / MAP_SCALE_ONE;
        Self::from_matrix(Self::map_base(position, rotation_degrees) * Mat4::from_scale(Vec3::splat(scale)))
    }

    /// Model placed inside a building, relative to the building's placement.
    pub fn for_building_doodad(parent: &Placement, position: Vec3, rotation: Quat, scale: f32) -> Self {
        Self::from_matrix(
            parent.matrix
                * Mat4::from_translation(position)
                * Mat4::from_quat(rotation)
                * Mat4::from_scale(Vec3::splat(scale)),
        )
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn inverse(&self) -> &Mat4 {
        &self.inverse
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.matrix.transform_point3(local)
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.inverse.transform_point3(world)
    }
}

#[cfg(test)]
#[path = "placement_tests.rs"]
mod tests;
