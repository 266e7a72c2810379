/// Frustum: a convex set of clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed distance
/// - A point P is inside if dot(plane, P_homogeneous) >= 0 for all planes
///
/// A camera frustum has the six Gribb & Hartmann planes. Frustums narrowed
/// through portals carry one plane per portal edge, the portal plane itself,
/// and the planes of the frustum they were narrowed from.

use glam::{Mat4, Vec3, Vec4};
use super::aabb::AABB;

/// Frustum plane indices (camera frustums only)
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Below this distance from the portal plane the eye is treated as standing
/// in the opening: edge planes degenerate, so the parent frustum is kept.
pub const PORTAL_PLANE_EPSILON: f32 = 1e-2;

const DEGENERATE_NORMAL: f32 = 1e-6;

/// Signed distance of a point to a normalized plane.
#[inline]
pub fn signed_distance(plane: Vec4, point: Vec3) -> f32 {
    plane.truncate().dot(point) + plane.w
}

/// Test an AABB against the first `plane_count` planes.
///
/// Uses the "positive vertex" test: for each plane, find the AABB corner
/// most in the direction of the plane normal. If that corner is behind the
/// plane (signed distance < 0), the AABB is fully outside.
///
/// Returns `true` if the AABB is (potentially) inside or intersecting.
/// May return false positives (conservative), never false negatives.
pub fn aabb_intersects_planes(planes: &[Vec4], aabb: &AABB, plane_count: usize) -> bool {
    for plane in planes.iter().take(plane_count) {
        let normal = plane.truncate();

        let p_vertex = Vec3::new(
            if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
            if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
            if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
        );

        if normal.dot(p_vertex) + plane.w < 0.0 {
            return false;
        }
    }

    true
}

/// Normalize a plane so that (A, B, C) is a unit vector.
fn normalize_plane(plane: Vec4) -> Vec4 {
    let normal_len = plane.truncate().length();
    if normal_len > 0.0 { plane / normal_len } else { plane }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    planes: Vec<Vec4>,
}

impl Frustum {
    /// Extract the six camera planes from a view-projection matrix.
    ///
    /// Uses the Gribb & Hartmann method. Works for both perspective
    /// and orthographic projections. Order: left, right, bottom, top, near, far.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        let planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row3 + row2
            Vec4::new(m[0][3] + m[0][2], m[1][3] + m[1][2], m[2][3] + m[2][2], m[3][3] + m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        Self { planes: planes.into_iter().map(normalize_plane).collect() }
    }

    /// Build a frustum from arbitrary planes (normalized on the way in).
    pub fn from_planes(planes: Vec<Vec4>) -> Self {
        Self { planes: planes.into_iter().map(normalize_plane).collect() }
    }

    pub fn planes(&self) -> &[Vec4] {
        &self.planes
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Test if an AABB intersects this frustum (all planes).
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        aabb_intersects_planes(&self.planes, aabb, self.planes.len())
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| signed_distance(*p, point) >= 0.0)
    }

    /// Conservative polygon test: `false` only if every vertex lies behind
    /// one common plane.
    pub fn intersects_polygon(&self, vertices: &[Vec3]) -> bool {
        if vertices.is_empty() {
            return false;
        }
        !self.planes.iter().any(|plane| {
            vertices.iter().all(|v| signed_distance(*plane, *v) < 0.0)
        })
    }

    /// Narrow this frustum to the region seen from `eye` through a convex
    /// portal polygon (world space, consistent winding).
    ///
    /// Returns `None` for polygons with fewer than 3 vertices or zero area.
    /// When the eye lies on the portal plane the result is a copy of `self`.
    pub fn through_portal(&self, eye: Vec3, portal: &[Vec3]) -> Option<Frustum> {
        if portal.len() < 3 {
            return None;
        }

        let centroid = portal.iter().copied().sum::<Vec3>() / portal.len() as f32;

        let portal_plane = polygon_plane(portal)?;
        let eye_distance = signed_distance(portal_plane, eye);
        if eye_distance.abs() < PORTAL_PLANE_EPSILON {
            return Some(self.clone());
        }

        let mut planes = Vec::with_capacity(portal.len() + 1 + self.planes.len());

        for (i, a) in portal.iter().enumerate() {
            let b = portal[(i + 1) % portal.len()];
            let normal = (*a - eye).cross(b - eye);
            if normal.length_squared() < DEGENERATE_NORMAL {
                continue;
            }
            let normal = normal.normalize();
            let mut plane = normal.extend(-normal.dot(eye));
            if signed_distance(plane, centroid) < 0.0 {
                plane = -plane;
            }
            planes.push(plane);
        }

        // Near plane on the portal: keep only what lies beyond the opening
        planes.push(if eye_distance > 0.0 { -portal_plane } else { portal_plane });

        planes.extend_from_slice(&self.planes);
        Some(Frustum { planes })
    }
}

/// Plane through a polygon using Newell's normal. `None` if degenerate.
pub fn polygon_plane(vertices: &[Vec3]) -> Option<Vec4> {
    if vertices.len() < 3 {
        return None;
    }
    let mut normal = Vec3::ZERO;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    if normal.length_squared() < DEGENERATE_NORMAL {
        return None;
    }
    let normal = normal.normalize();
    let centroid = vertices.iter().copied().sum::<Vec3>() / vertices.len() as f32;
    Some(normal.extend(-normal.dot(centroid)))
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
