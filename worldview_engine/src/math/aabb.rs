/// Axis-aligned bounding boxes.

use glam::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
///
/// Used for frustum culling, containment tests, and BSP queries.
/// Computed once from vertex data or transformed from a local box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all points, or `None` for an empty input.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<AABB> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(AABB { min, max })
    }

    /// The 8 corners derived from the min/max pair.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Transform this box by a matrix, returning the enclosing axis-aligned box.
    ///
    /// All 8 corners are transformed: under rotation any corner may become
    /// extremal. Projective matrices are handled by the perspective divide.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let corners = self.corners();
        let first = matrix.project_point3(corners[0]);
        let (min, max) = corners[1..].iter().fold((first, first), |(lo, hi), c| {
            let p = matrix.project_point3(*c);
            (lo.min(p), hi.max(p))
        });
        AABB { min, max }
    }

    /// Test if this AABB fully contains another AABB.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Point inside or on the boundary.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Point strictly inside (boundary excluded).
    ///
    /// Building-level interior rejection uses this form.
    pub fn contains_point_strict(&self, p: Vec3) -> bool {
        p.cmpgt(self.min).all() && p.cmplt(self.max).all()
    }

    /// Test if this AABB intersects (overlaps) another AABB.
    ///
    /// Returns `true` if the two AABBs overlap or touch.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Smallest box enclosing both boxes.
    pub fn merged(&self, other: &AABB) -> AABB {
        AABB { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Box grown by `amount` on every side (per axis).
    pub fn expanded(&self, amount: Vec3) -> AABB {
        AABB { min: self.min - amount, max: self.max + amount }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the min-to-max diagonal.
    pub fn diameter(&self) -> f32 {
        self.size().length()
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
