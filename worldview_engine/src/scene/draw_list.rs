//! Draw submission boundary.
//!
//! The Graph Manager turns the frame's visibility into `DrawCommand`s and
//! hands them to a `RenderBackend`. A GPU backend records them into its
//! command buffers; `DrawList` simply keeps them for inspection.

use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use crate::error::Result;
use crate::math::AABB;

/// Mesh subset drawn by a model command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawPass {
    Opaque,
    Transparent,
}

/// Position of a command in the frame's fixed draw order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawStage {
    Terrain,
    Buildings,
    Sky,
    OpaqueModels,
    TransparentModels,
    Debug,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Terrain,
    BuildingGroup {
        building: Arc<str>,
        group: usize,
        transform: Mat4,
        ambient: Vec4,
    },
    Sky,
    Model {
        model: Arc<str>,
        transform: Mat4,
        diffuse: Vec4,
        pass: DrawPass,
    },
    /// One draw for every instance in a placement buffer
    /// (`instance_count` column-major `Mat4`s)
    ModelInstances {
        model: Arc<str>,
        pass: DrawPass,
        instance_count: u32,
        placements: Arc<[u8]>,
    },
    BoundingBox {
        aabb: AABB,
        color: Vec4,
    },
    Portal {
        vertices: Vec<Vec3>,
        color: Vec4,
    },
    BspLeaf {
        triangles: Vec<[Vec3; 3]>,
        color: Vec4,
    },
}

impl DrawCommand {
    pub fn stage(&self) -> DrawStage {
        match self {
            DrawCommand::Terrain => DrawStage::Terrain,
            DrawCommand::BuildingGroup { .. } => DrawStage::Buildings,
            DrawCommand::Sky => DrawStage::Sky,
            DrawCommand::Model { pass: DrawPass::Opaque, .. }
            | DrawCommand::ModelInstances { pass: DrawPass::Opaque, .. } => DrawStage::OpaqueModels,
            DrawCommand::Model { pass: DrawPass::Transparent, .. }
            | DrawCommand::ModelInstances { pass: DrawPass::Transparent, .. } => DrawStage::TransparentModels,
            DrawCommand::BoundingBox { .. }
            | DrawCommand::Portal { .. }
            | DrawCommand::BspLeaf { .. } => DrawStage::Debug,
        }
    }
}

/// Consumer of draw commands
pub trait RenderBackend {
    fn submit(&mut self, command: DrawCommand) -> Result<()>;
}

/// Backend that records commands in submission order
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Transforms of the single-model draws of `pass`, in draw order.
    pub fn model_transforms(&self, pass: DrawPass) -> Vec<Mat4> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Model { transform, pass: p, .. } if *p == pass => Some(*transform),
                _ => None,
            })
            .collect()
    }

    pub fn count_stage(&self, stage: DrawStage) -> usize {
        self.commands.iter().filter(|c| c.stage() == stage).count()
    }
}

impl RenderBackend for DrawList {
    fn submit(&mut self, command: DrawCommand) -> Result<()> {
        self.commands.push(command);
        Ok(())
    }
}

#[cfg(test)]
#[path = "draw_list_tests.rs"]
mod tests;
