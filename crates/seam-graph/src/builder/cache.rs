//! Parsed-module cache carried between builds.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::asset::{Asset, AssetContent};
use crate::module::ModuleBody;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Raw asset content the body was built from.
    pub snapshot: AssetContent,
    pub body: Arc<ModuleBody>,
}

impl CacheEntry {
    /// A cached body is valid when the store has not flagged the asset as
    /// modified and its content is byte-identical to the snapshot.
    pub fn is_valid_for(&self, asset: &Asset) -> bool {
        !asset.modified && asset.content == self.snapshot
    }
}

/// One entry per canonical id.
#[derive(Debug, Clone, Default)]
pub struct ModuleCache {
    entries: FxHashMap<String, CacheEntry>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) fn insert(&mut self, id: String, entry: CacheEntry) {
        self.entries.insert(id, entry);
    }

    pub(crate) fn evict(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
