/// Camera: low-level passive data container.
///
/// The Camera computes nothing on its own. The caller (render loop or input
/// controller) sets the eye position and the view/projection matrices; the
/// Graph Manager refreshes the frustum from them once per frame.

use glam::{Mat4, Vec3};
use crate::math::Frustum;

#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    frustum: Frustum,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

impl Camera {
    /// Create a camera; the frustum is extracted from `projection * view`.
    pub fn new(position: Vec3, view: Mat4, projection: Mat4) -> Self {
        Self {
            position,
            view_matrix: view,
            projection_matrix: projection,
            frustum: Frustum::from_view_projection(&(projection * view)),
        }
    }

    // ===== GETTERS =====

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Frustum planes for culling.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    // ===== SETTERS (store only) =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }

    /// Re-extract the frustum from the current matrices.
    pub fn refresh_frustum(&mut self) {
        self.frustum = Frustum::from_view_projection(&self.view_projection_matrix());
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
