//! Per-model placement buffers for instanced drawing.
//!
//! Every loaded model gets one `InstanceManager` holding the scene objects
//! placed with it. The Graph Manager rebuilds the buffers on a fixed
//! interval from every loaded member that can share one draw; the buffer is
//! a tightly packed array of column-major `Mat4` world matrices.
//!
//! Culling still applies per frame: `draw_command` submits the cached
//! buffer only when every buffered member is rendered, and packs the
//! rendered subset otherwise. Members loaded after the last rebuild are not
//! covered and are drawn one by one until the next rebuild.

use std::sync::Arc;
use glam::Mat4;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use super::draw_list::{DrawCommand, DrawPass};
use super::load_state::LoadState;
use super::scene_object::{Renderable, SceneObject, SceneObjectKey};

/// Bytes per placement in the buffer
pub const PLACEMENT_STRIDE: usize = std::mem::size_of::<Mat4>();

#[derive(Debug, Clone)]
pub struct InstanceManager {
    model: Arc<str>,
    members: Vec<SceneObjectKey>,
    /// Members packed by the last rebuild, in buffer order
    buffered: Vec<SceneObjectKey>,
    buffered_set: FxHashSet<SceneObjectKey>,
    placements: Arc<[u8]>,
    instance_count: u32,
}

impl InstanceManager {
    pub fn new(model: Arc<str>) -> Self {
        Self {
            model,
            members: Vec::new(),
            buffered: Vec::new(),
            buffered_set: FxHashSet::default(),
            placements: Arc::from(Vec::new()),
            instance_count: 0,
        }
    }

    pub fn model(&self) -> &Arc<str> {
        &self.model
    }

    pub fn members(&self) -> &[SceneObjectKey] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn add(&mut self, key: SceneObjectKey) {
        if !self.members.contains(&key) {
            self.members.push(key);
        }
    }

    /// Returns `true` if `key` was a member.
    pub fn remove(&mut self, key: SceneObjectKey) -> bool {
        let before = self.members.len();
        self.members.retain(|k| *k != key);
        self.members.len() != before
    }

    /// Instances in the last built buffer
    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn placements(&self) -> &Arc<[u8]> {
        &self.placements
    }

    /// Whether `object` can be drawn through the shared buffer.
    ///
    /// Locally lit doodads carry their own diffuse color, which the
    /// instanced draw has no slot for.
    pub fn accepts(object: &SceneObject) -> bool {
        object.load_state() == LoadState::Loaded
            && object.has_pass(DrawPass::Opaque)
            && !object.use_local_lighting()
    }

    /// Whether the last built buffer holds `key`.
    pub fn covers(&self, key: SceneObjectKey) -> bool {
        self.buffered_set.contains(&key)
    }

    /// Rebuild the placement buffer from every member `accepts` admits,
    /// rendered or not. Members that no longer exist are dropped.
    pub fn rebuild(&mut self, objects: &SlotMap<SceneObjectKey, SceneObject>) -> u32 {
        self.members.retain(|k| objects.contains_key(*k));
        self.buffered = self
            .members
            .iter()
            .copied()
            .filter(|k| objects.get(*k).is_some_and(Self::accepts))
            .collect();
        self.buffered_set = self.buffered.iter().copied().collect();

        let matrices = pack(&self.buffered, objects);
        self.instance_count = self.buffered.len() as u32;
        self.placements = matrices;
        self.instance_count
    }

    /// One instanced draw over the buffered members rendered this frame,
    /// `None` when none of them is.
    ///
    /// The cached buffer is shared as is when nothing was culled or removed
    /// since the rebuild.
    pub fn draw_command(
        &self,
        pass: DrawPass,
        objects: &SlotMap<SceneObjectKey, SceneObject>,
    ) -> Option<DrawCommand> {
        let visible: Vec<SceneObjectKey> = self
            .buffered
            .iter()
            .copied()
            .filter(|k| objects.get(*k).is_some_and(|o| o.is_rendered() && Self::accepts(o)))
            .collect();
        if visible.is_empty() {
            return None;
        }
        let placements = if visible.len() == self.buffered.len() {
            Arc::clone(&self.placements)
        } else {
            pack(&visible, objects)
        };
        Some(DrawCommand::ModelInstances {
            model: Arc::clone(&self.model),
            pass,
            instance_count: visible.len() as u32,
            placements,
        })
    }
}

fn pack(keys: &[SceneObjectKey], objects: &SlotMap<SceneObjectKey, SceneObject>) -> Arc<[u8]> {
    let matrices: Vec<Mat4> = keys
        .iter()
        .filter_map(|k| objects.get(*k))
        .map(|o| *o.placement().matrix())
        .collect();
    Arc::from(bytemuck::cast_slice::<Mat4, u8>(&matrices))
}

#[cfg(test)]
#[path = "instance_manager_tests.rs"]
mod tests;
