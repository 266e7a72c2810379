//! Reference-counted asset cache keyed by file name.
//!
//! At most one load per key is ever in flight: a second request for a key
//! attaches to the pending result. Failed results stay cached, so a failed
//! asset is not fetched again while anything still references it.

use rustc_hash::FxHashMap;
use super::request::AssetRequest;

struct CacheEntry<T> {
    request: AssetRequest<T>,
    ref_count: u32,
}

pub struct AssetCache<T> {
    entries: FxHashMap<String, CacheEntry<T>>,
    loads_started: u64,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self { entries: FxHashMap::default(), loads_started: 0 }
    }

    /// Get the shared request for `key`, calling `load` only on a miss.
    pub fn get_or_load<F>(&mut self, key: &str, load: F) -> AssetRequest<T>
    where
        F: FnOnce(&str) -> AssetRequest<T>,
    {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.ref_count += 1;
            return entry.request.clone();
        }
        self.loads_started += 1;
        let request = load(key);
        self.entries.insert(key.to_string(), CacheEntry { request: request.clone(), ref_count: 1 });
        request
    }

    /// Drop one reference; the entry is evicted when none remain.
    ///
    /// Returns `true` if the entry was evicted.
    pub fn release(&mut self, key: &str) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count == 0 {
            self.entries.remove(key);
            return true;
        }
        false
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn ref_count(&self, key: &str) -> u32 {
        self.entries.get(key).map_or(0, |e| e.ref_count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose result has not arrived yet
    pub fn in_flight(&self) -> usize {
        self.entries.values().filter(|e| !e.request.is_ready()).count()
    }

    /// Total number of loads issued through this cache
    pub fn loads_started(&self) -> u64 {
        self.loads_started
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
