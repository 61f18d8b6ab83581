//! Asset store abstraction.
//!
//! The store holds every known module's raw content together with a
//! `modified` flag. The resolver only asks whether an id exists; the graph
//! builder reads content and uses the flag (plus a content snapshot) to decide
//! whether a cached parse is still valid.
//!
//! Hosts with a real file system implement [`AssetStore`] themselves.
//! [`MemoryAssetStore`] is the in-process implementation
//! used by the bundler and by every test in the workspace.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

/// Raw content of an asset.
#[derive(Clone, PartialEq, Eq)]
pub enum AssetContent {
    Text(Arc<str>),
    Blob(Arc<[u8]>),
}

impl AssetContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AssetContent::Text(text) => Some(text),
            AssetContent::Blob(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AssetContent::Text(text) => text.len(),
            AssetContent::Blob(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for AssetContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetContent::Text(text) => write!(f, "Text({} bytes)", text.len()),
            AssetContent::Blob(bytes) => write!(f, "Blob({} bytes)", bytes.len()),
        }
    }
}

impl From<&str> for AssetContent {
    fn from(value: &str) -> Self {
        AssetContent::Text(Arc::from(value))
    }
}

impl From<String> for AssetContent {
    fn from(value: String) -> Self {
        AssetContent::Text(Arc::from(value))
    }
}

impl From<Vec<u8>> for AssetContent {
    fn from(value: Vec<u8>) -> Self {
        AssetContent::Blob(Arc::from(value))
    }
}

/// A content-bearing unit known to the store.
#[derive(Debug, Clone)]
pub struct Asset {
    pub content: AssetContent,
    /// Set by the store whenever the content changes; cleared by
    /// [`AssetStore::acknowledge`] once a build has consumed the change.
    pub modified: bool,
}

/// Source of module content for resolution and graph building.
pub trait AssetStore: Send + Sync + fmt::Debug {
    /// Fetch an asset by canonical id.
    fn get(&self, id: &str) -> Option<Asset>;

    /// Check whether an asset exists without reading it.
    fn exists(&self, id: &str) -> bool;

    /// Called by the graph builder after a completed build read `id`.
    fn acknowledge(&self, _id: &str) {}
}

/// In-memory asset store.
///
/// # Example
///
/// ```rust
/// use seam_graph::{AssetStore, MemoryAssetStore};
///
/// let store = MemoryAssetStore::new();
/// store.insert("/src/index.js", "export const answer = 42;");
/// assert!(store.exists("/src/index.js"));
/// assert!(store.get("/src/index.js").unwrap().modified);
///
/// store.acknowledge("/src/index.js");
/// assert!(!store.get("/src/index.js").unwrap().modified);
/// ```
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: RwLock<IndexMap<String, Asset>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(id, text)` pairs.
    pub fn from_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AssetContent>,
    {
        let store = Self::new();
        for (id, content) in files {
            store.insert(id, content);
        }
        store
    }

    /// Insert or replace an asset.
    ///
    /// The `modified` flag is raised when the asset is new or its content
    /// differs from what the store already holds.
    pub fn insert(&self, id: impl Into<String>, content: impl Into<AssetContent>) {
        let id = id.into();
        let content = content.into();
        let mut assets = self.assets.write();
        match assets.get_mut(&id) {
            Some(existing) if existing.content == content => {}
            Some(existing) => {
                existing.content = content;
                existing.modified = true;
            }
            None => {
                assets.insert(
                    id,
                    Asset {
                        content,
                        modified: true,
                    },
                );
            }
        }
    }

    /// Remove an asset, returning it if it existed.
    pub fn remove(&self, id: &str) -> Option<Asset> {
        self.assets.write().shift_remove(id)
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    /// Ids of every stored asset, in insertion order.
    pub fn ids(&self) -> Vec<String> {
        self.assets.read().keys().cloned().collect()
    }
}

impl AssetStore for MemoryAssetStore {
    fn get(&self, id: &str) -> Option<Asset> {
        self.assets.read().get(id).cloned()
    }

    fn exists(&self, id: &str) -> bool {
        self.assets.read().contains_key(id)
    }

    fn acknowledge(&self, id: &str) {
        if let Some(asset) = self.assets.write().get_mut(id) {
            asset.modified = false;
        }
    }
}

impl<S: AssetStore + ?Sized> AssetStore for Arc<S> {
    fn get(&self, id: &str) -> Option<Asset> {
        (**self).get(id)
    }

    fn exists(&self, id: &str) -> bool {
        (**self).exists(id)
    }

    fn acknowledge(&self, id: &str) {
        (**self).acknowledge(id)
    }
}
