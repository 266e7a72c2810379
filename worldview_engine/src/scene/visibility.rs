//! Per-frame visibility results.
//!
//! Each culling pass returns a `PassResult` instead of writing flags on the
//! objects. The Graph Manager folds every pass into one `VisibilitySet`
//! by conjunction, so the outcome does not depend on pass order.

use slotmap::SecondaryMap;
use super::scene_object::SceneObjectKey;

/// Verdicts produced by one culling pass
#[derive(Debug, Clone, Default)]
pub struct PassResult {
    entries: Vec<(SceneObjectKey, bool)>,
}

impl PassResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: SceneObjectKey, visible: bool) {
        self.entries.push((key, visible));
    }

    pub fn extend(&mut self, other: PassResult) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (SceneObjectKey, bool)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verdict for `key`, if this pass judged it
    pub fn get(&self, key: SceneObjectKey) -> Option<bool> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

/// Combined visibility of every object for the current frame
#[derive(Debug, Clone, Default)]
pub struct VisibilitySet {
    visible: SecondaryMap<SceneObjectKey, bool>,
}

impl VisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a frame: every listed object is provisionally visible.
    pub fn begin<I: IntoIterator<Item = SceneObjectKey>>(&mut self, keys: I) {
        self.visible.clear();
        for key in keys {
            self.visible.insert(key, true);
        }
    }

    /// AND one verdict into the set. Unknown keys are ignored.
    pub fn combine(&mut self, key: SceneObjectKey, visible: bool) {
        if let Some(flag) = self.visible.get_mut(key) {
            *flag &= visible;
        }
    }

    pub fn apply(&mut self, pass: &PassResult) {
        for (key, visible) in pass.iter() {
            self.combine(key, visible);
        }
    }

    /// Unknown keys read as not visible.
    pub fn is_visible(&self, key: SceneObjectKey) -> bool {
        self.visible.get(key).copied().unwrap_or(false)
    }

    pub fn visible_keys(&self) -> impl Iterator<Item = SceneObjectKey> + '_ {
        self.visible.iter().filter(|(_, v)| **v).map(|(k, _)| k)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.values().filter(|v| **v).count()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

#[cfg(test)]
#[path = "visibility_tests.rs"]
mod tests;
