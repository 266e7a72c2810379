/// Portal polygon helpers.

use glam::{Vec3, Vec4};
use std::cmp::Ordering;

/// Sort polygon vertices counter-clockwise around `plane`'s normal.
///
/// Portal vertex lists are not guaranteed to be wound consistently; edge
/// planes built from them require a convex, ordered loop.
pub fn sort_against_plane(vertices: &mut [Vec3], plane: Vec4) {
    if vertices.len() < 3 {
        return;
    }
    let normal = plane.truncate().normalize_or_zero();
    if normal == Vec3::ZERO {
        return;
    }

    let centroid = vertices.iter().copied().sum::<Vec3>() / vertices.len() as f32;
    let Some(u) = vertices
        .iter()
        .map(|v| (*v - centroid).reject_from_normalized(normal))
        .find(|d| d.length_squared() > 1e-12)
        .map(|d| d.normalize())
    else {
        return;
    };
    let w = normal.cross(u);

    let angle = |v: &Vec3| {
        let d = *v - centroid;
        d.dot(w).atan2(d.dot(u))
    };
    vertices.sort_by(|a, b| angle(a).partial_cmp(&angle(b)).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
#[path = "polygon_tests.rs"]
mod tests;
