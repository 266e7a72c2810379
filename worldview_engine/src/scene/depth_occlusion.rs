//! Coarse depth occlusion against the previous frame.
//!
//! The full depth buffer is reduced to 8×8 pixel blocks keeping the
//! farthest depth of each block. An object is occluded when every block
//! under its screen rectangle is entirely nearer than the object's nearest
//! point. Depth values follow the `[0, 1]` convention, 0 at the near plane.

use glam::{Mat4, Vec2};
use crate::math::AABB;

/// Edge length in pixels of one coarse block
pub const DEPTH_BLOCK_SIZE: usize = 8;

const MIN_CLIP_W: f32 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub struct CoarseDepthBuffer {
    block_width: usize,
    block_height: usize,
    /// Row-major, row 0 at the top of the screen
    blocks: Vec<f32>,
}

impl CoarseDepthBuffer {
    /// Reduce a row-major depth image. `None` when the dimensions are zero
    /// or do not match the slice length.
    pub fn from_depth(depth: &[f32], width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 || depth.len() != width * height {
            return None;
        }
        let block_width = width.div_ceil(DEPTH_BLOCK_SIZE);
        let block_height = height.div_ceil(DEPTH_BLOCK_SIZE);
        let mut blocks = vec![0.0f32; block_width * block_height];

        for (y, row) in depth.chunks_exact(width).enumerate() {
            let block_row = (y / DEPTH_BLOCK_SIZE) * block_width;
            for (x, &value) in row.iter().enumerate() {
                let block = &mut blocks[block_row + x / DEPTH_BLOCK_SIZE];
                *block = block.max(value);
            }
        }

        Some(Self { block_width, block_height, blocks })
    }

    pub fn block_width(&self) -> usize {
        self.block_width
    }

    pub fn block_height(&self) -> usize {
        self.block_height
    }

    pub fn block(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.block_width {
            return None;
        }
        self.blocks.get(y * self.block_width + x).copied()
    }

    /// Whether any part of `aabb` may be in front of the stored depth.
    ///
    /// Boxes crossing the camera plane or lying off screen are reported
    /// visible; the frustum test stays authoritative for those.
    pub fn is_potentially_visible(&self, aabb: &AABB, view_projection: &Mat4) -> bool {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        let mut nearest = f32::MAX;

        for corner in aabb.corners() {
            let clip = *view_projection * corner.extend(1.0);
            if clip.w <= MIN_CLIP_W {
                return true;
            }
            let ndc = clip.truncate() / clip.w;
            min = min.min(ndc.truncate());
            max = max.max(ndc.truncate());
            nearest = nearest.min(ndc.z);
        }

        if nearest < 0.0 || max.x < -1.0 || min.x > 1.0 || max.y < -1.0 || min.y > 1.0 {
            return true;
        }

        let to_column = |x: f32| {
            let u = (x.clamp(-1.0, 1.0) + 1.0) * 0.5;
            ((u * self.block_width as f32) as usize).min(self.block_width - 1)
        };
        let to_row = |y: f32| {
            let v = (1.0 - y.clamp(-1.0, 1.0)) * 0.5;
            ((v * self.block_height as f32) as usize).min(self.block_height - 1)
        };

        let (x0, x1) = (to_column(min.x), to_column(max.x));
        let (y0, y1) = (to_row(max.y), to_row(min.y));

        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.blocks[y * self.block_width + x] > nearest {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
#[path = "depth_occlusion_tests.rs"]
mod tests;
