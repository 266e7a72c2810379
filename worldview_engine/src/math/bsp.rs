//! BSP tree queries over building group geometry.
//!
//! Nodes are stored in a flat array with node 0 as the root. Internal nodes
//! split space on one axis at `dist`; leaves reference a run of triangle
//! indices through the group's BSP face list. Queries track visited nodes so
//! that cyclic or shared indices are reported as `Error::MalformedBsp`
//! instead of looping.

use glam::Vec3;
use crate::error::{Error, Result};
use super::aabb::AABB;

/// Plane-type bit marking a leaf node
pub const BSP_LEAF_FLAG: u16 = 0x4;
/// Child index meaning "no child on this side"
pub const BSP_NO_CHILD: i16 = -1;

/// Splitting axis of an internal node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BspAxis {
    X = 0,
    Y = 1,
    Z = 2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BspNode {
    /// 0 = X, 1 = Y, 2 = Z, `BSP_LEAF_FLAG` set on leaves
    pub plane_type: u16,
    /// [below split, at or above split]; `BSP_NO_CHILD` when empty
    pub children: [i16; 2],
    pub face_count: u16,
    pub first_face: u32,
    pub dist: f32,
}

impl BspNode {
    pub fn leaf(first_face: u32, face_count: u16) -> Self {
        Self {
            plane_type: BSP_LEAF_FLAG,
            children: [BSP_NO_CHILD, BSP_NO_CHILD],
            face_count,
            first_face,
            dist: 0.0,
        }
    }

    pub fn split(axis: BspAxis, dist: f32, below: i16, above: i16) -> Self {
        Self {
            plane_type: axis as u16,
            children: [below, above],
            face_count: 0,
            first_face: 0,
            dist,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.plane_type & BSP_LEAF_FLAG != 0
    }

    /// Axis index for internal nodes, `None` for leaves or unknown plane types.
    pub fn axis(&self) -> Option<usize> {
        if self.is_leaf() {
            return None;
        }
        match self.plane_type {
            0 => Some(0),
            1 => Some(1),
            2 => Some(2),
            _ => None,
        }
    }
}

/// Triangle data referenced by BSP leaves.
#[derive(Debug, Clone, Copy)]
pub struct BspFaces<'a> {
    pub vertices: &'a [Vec3],
    /// Three vertex indices per triangle
    pub indices: &'a [u16],
    /// Triangle numbers, addressed by `first_face..first_face + face_count`
    pub face_refs: &'a [u16],
}

/// Vertical bounds around a point. `None` means no surface was found on that side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TopBottom {
    pub top: Option<f32>,
    pub bottom: Option<f32>,
}

impl TopBottom {
    /// `top - bottom` when both bounds resolved.
    pub fn span(&self) -> Option<f32> {
        match (self.top, self.bottom) {
            (Some(top), Some(bottom)) => Some(top - bottom),
            _ => None,
        }
    }

    /// Apply the containment rules for a camera height `z`.
    ///
    /// Returns the bounds actually used, or `None` if `z` lies outside them.
    /// Inverted bounds (bottom above top) keep only the bound on the side the
    /// camera is on: above the floor keeps the floor, otherwise the ceiling.
    pub fn accept(mut self, z: f32) -> Option<TopBottom> {
        if self.top.is_none() && self.bottom.is_none() {
            return None;
        }
        if let Some(bottom) = self.bottom {
            if z < bottom {
                return None;
            }
        }
        if let (Some(top), Some(bottom)) = (self.top, self.bottom) {
            if bottom > top {
                if z > bottom {
                    self.top = None;
                } else {
                    self.bottom = None;
                }
            }
        }
        if let Some(top) = self.top {
            if z > top {
                return None;
            }
        }
        Some(self)
    }
}

fn malformed(message: String) -> Error {
    Error::MalformedBsp(message)
}

/// Resolve a raw child index. `Ok(None)` for an empty side.
fn child_index(nodes: &[BspNode], parent: usize, raw: i16) -> Result<Option<usize>> {
    if raw == BSP_NO_CHILD {
        return Ok(None);
    }
    if raw < 0 || raw as usize >= nodes.len() {
        return Err(malformed(format!(
            "node {} references child {} (node count {})", parent, raw, nodes.len()
        )));
    }
    Ok(Some(raw as usize))
}

/// Collect every leaf whose half-space region overlaps `aabb`.
///
/// A box straddling a split descends both sides. Each node is visited at
/// most once; reaching a node twice or following an out-of-range child
/// aborts with `Error::MalformedBsp`.
pub fn query_bsp_tree(
    aabb: &AABB,
    node_index: usize,
    nodes: &[BspNode],
    out_leaves: &mut Vec<usize>,
) -> Result<()> {
    if nodes.is_empty() {
        return Ok(());
    }
    if node_index >= nodes.len() {
        return Err(malformed(format!("start node {} out of range", node_index)));
    }

    let mut visited = vec![false; nodes.len()];
    let mut stack = vec![node_index];

    while let Some(index) = stack.pop() {
        if std::mem::replace(&mut visited[index], true) {
            return Err(malformed(format!("node {} reached twice", index)));
        }
        let node = &nodes[index];
        if node.is_leaf() {
            out_leaves.push(index);
            continue;
        }
        let axis = node.axis().ok_or_else(|| {
            malformed(format!("node {} has plane type {}", index, node.plane_type))
        })?;

        // Push the upper side first so the lower side is expanded first
        if aabb.max[axis] >= node.dist {
            if let Some(child) = child_index(nodes, index, node.children[1])? {
                stack.push(child);
            }
        }
        if aabb.min[axis] <= node.dist {
            if let Some(child) = child_index(nodes, index, node.children[0])? {
                stack.push(child);
            }
        }
    }

    Ok(())
}

/// Descend from the root towards `point`, returning the visited node path.
///
/// At each split `point[axis] < dist` selects the first child, anything else
/// the second. The path ends at a leaf, or at the last internal node when
/// the selected side is empty. An empty tree yields an empty path.
pub fn locate_leaf(point: Vec3, nodes: &[BspNode]) -> Result<Vec<usize>> {
    let mut path = Vec::new();
    if nodes.is_empty() {
        return Ok(path);
    }

    let mut visited = vec![false; nodes.len()];
    let mut current = Some(0usize);

    while let Some(index) = current {
        if std::mem::replace(&mut visited[index], true) {
            return Err(malformed(format!("descent reached node {} twice", index)));
        }
        path.push(index);
        let node = &nodes[index];
        if node.is_leaf() {
            break;
        }
        let axis = node.axis().ok_or_else(|| {
            malformed(format!("node {} has plane type {}", index, node.plane_type))
        })?;
        let side = if point[axis] < node.dist { 0 } else { 1 };
        current = child_index(nodes, index, node.children[side])?;
    }

    Ok(path)
}

/// Check that the nodes reachable from the root form a tree with valid
/// plane types and in-range children.
pub fn validate_bsp_tree(nodes: &[BspNode]) -> Result<()> {
    if nodes.is_empty() {
        return Ok(());
    }
    let mut visited = vec![false; nodes.len()];
    let mut stack = vec![0usize];
    while let Some(index) = stack.pop() {
        if std::mem::replace(&mut visited[index], true) {
            return Err(malformed(format!("node {} reached twice", index)));
        }
        let node = &nodes[index];
        if node.is_leaf() {
            continue;
        }
        if node.axis().is_none() {
            return Err(malformed(format!("node {} has plane type {}", index, node.plane_type)));
        }
        for raw in node.children {
            if let Some(child) = child_index(nodes, index, raw)? {
                stack.push(child);
            }
        }
    }
    Ok(())
}

/// Height of the triangle plane at `point.xy`, if the triangle's horizontal
/// projection contains it. Vertical triangles never match.
fn height_at(point: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let area = (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y);
    if area.abs() < 1e-8 {
        return None;
    }
    let w_b = ((point.x - a.x) * (c.y - a.y) - (c.x - a.x) * (point.y - a.y)) / area;
    let w_c = ((b.x - a.x) * (point.y - a.y) - (point.x - a.x) * (b.y - a.y)) / area;
    let w_a = 1.0 - w_b - w_c;
    const EDGE: f32 = -1e-5;
    if w_a < EDGE || w_b < EDGE || w_c < EDGE {
        return None;
    }
    Some(w_a * a.z + w_b * b.z + w_c * c.z)
}

/// Among the triangles of `leaves` whose XY projection contains `point`,
/// find the highest surface at or below it and the lowest surface above it.
///
/// Face or vertex references outside the geometry are reported as
/// `Error::MalformedBsp`.
pub fn top_bottom_from_bsp(
    point: Vec3,
    faces: &BspFaces<'_>,
    nodes: &[BspNode],
    leaves: &[usize],
) -> Result<TopBottom> {
    let mut result = TopBottom::default();

    for &leaf in leaves {
        let node = nodes.get(leaf).ok_or_else(|| malformed(format!("leaf {} out of range", leaf)))?;
        let first = node.first_face as usize;
        let refs = faces.face_refs
            .get(first..first + node.face_count as usize)
            .ok_or_else(|| malformed(format!("leaf {} face range out of bounds", leaf)))?;

        for &triangle in refs {
            let base = triangle as usize * 3;
            let tri = faces.indices
                .get(base..base + 3)
                .ok_or_else(|| malformed(format!("triangle {} out of bounds", triangle)))?;
            let mut corners = [Vec3::ZERO; 3];
            for (corner, &vertex) in corners.iter_mut().zip(tri) {
                *corner = *faces.vertices
                    .get(vertex as usize)
                    .ok_or_else(|| malformed(format!("vertex {} out of bounds", vertex)))?;
            }

            let Some(z) = height_at(point, corners[0], corners[1], corners[2]) else {
                continue;
            };
            if z <= point.z {
                result.bottom = Some(result.bottom.map_or(z, |b| b.max(z)));
            } else {
                result.top = Some(result.top.map_or(z, |t| t.min(z)));
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
#[path = "bsp_tests.rs"]
mod tests;
