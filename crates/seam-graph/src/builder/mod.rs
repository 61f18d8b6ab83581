//! Dependency graph construction.
//!
//! [`GraphBuilder::build`] loads modules concurrently on the tokio runtime.
//! A module's dependencies are spawned as soon as the module itself is done,
//! so a slow load only holds back its own subtree. The build loop is the only
//! writer of the staging map. Ids are claimed before their task is spawned, so
//! a module reached from two branches is loaded once.
//!
//! Once discovery finishes the graph is put in depth-first order from the
//! entry, importers are recomputed, and only then is the cache updated: a
//! build that fails part-way leaves the previous cache untouched.

mod cache;
mod process;

pub use cache::{CacheEntry, ModuleCache};

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use tokio::task::JoinSet;

use crate::asset::AssetStore;
use crate::error::{BuildError, Result};
use crate::graph::{BuildStats, DependencyGraph};
use crate::module::ModuleRecord;
use crate::pipeline::{HookRegistry, HookResolution};
use crate::resolver::Resolver;
use process::{BuildContext, Processed, process_module};

/// Importer reported for the entry specifier.
const ENTRY_IMPORTER: &str = "<entry>";

/// Builds [`DependencyGraph`]s and keeps the module cache between builds.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use seam_graph::{GraphBuilder, MemoryAssetStore, Resolver};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> seam_graph::Result<()> {
/// let store = Arc::new(MemoryAssetStore::from_files([
///     ("/main.js", "import { a } from './a'; console.log(a);"),
///     ("/a.js", "export const a = 1;"),
/// ]));
/// let mut builder = GraphBuilder::new(store, Resolver::default());
///
/// let graph = builder.build("/main.js").await?;
/// assert_eq!(graph.ids().collect::<Vec<_>>(), vec!["/main.js", "/a.js"]);
///
/// let again = builder.build("/main.js").await?;
/// assert_eq!(again.stats().reused.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    store: Arc<dyn AssetStore>,
    resolver: Arc<Resolver>,
    hooks: Arc<HookRegistry>,
    cache: ModuleCache,
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn AssetStore>, resolver: Resolver) -> Self {
        Self {
            store,
            resolver: Arc::new(resolver),
            hooks: Arc::new(HookRegistry::new()),
            cache: ModuleCache::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Drop every cached module.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Build the graph reachable from `entry`.
    pub async fn build(&mut self, entry: &str) -> Result<DependencyGraph> {
        let context = Arc::new(BuildContext {
            store: self.store.clone(),
            resolver: self.resolver.clone(),
            hooks: self.hooks.clone(),
        });

        let entry_id = resolve_entry(&context, entry).await?;
        tracing::debug!(entry, %entry_id, "building graph");

        let mut staged: IndexMap<String, Processed> = IndexMap::new();
        let mut claimed: FxHashSet<String> = FxHashSet::default();
        let mut tasks = JoinSet::new();
        claimed.insert(entry_id.clone());
        tasks.spawn(process_module(
            context.clone(),
            entry_id.clone(),
            self.cache.get(&entry_id).cloned(),
        ));

        // Returning early drops the set, which aborts every pending load.
        while let Some(joined) = tasks.join_next().await {
            let processed = joined.map_err(|error| BuildError::Aborted(error.to_string()))??;
            for dependency in processed.dependency_map.values() {
                if claimed.insert(dependency.clone()) {
                    tasks.spawn(process_module(
                        context.clone(),
                        dependency.clone(),
                        self.cache.get(dependency).cloned(),
                    ));
                }
            }
            staged.insert(processed.id.clone(), processed);
        }

        let graph = self.commit(&entry_id, staged);
        tracing::info!(
            entry = %entry_id,
            modules = graph.len(),
            reused = graph.stats().reused.len(),
            built = graph.stats().built.len(),
            evicted = graph.stats().evicted.len(),
            "graph built"
        );
        Ok(graph)
    }

    /// Order the staged modules, link importers, and update the cache.
    fn commit(&mut self, entry: &str, mut staged: IndexMap<String, Processed>) -> DependencyGraph {
        let order = discovery_order(entry, &staged);

        let mut modules: IndexMap<String, ModuleRecord> = IndexMap::with_capacity(order.len());
        let mut stats = BuildStats::default();
        for id in order {
            let Some(processed) = staged.shift_remove(&id) else {
                continue;
            };
            if processed.reused {
                stats.reused.push(id.clone());
            } else {
                stats.built.push(id.clone());
            }
            match &processed.snapshot {
                Some(snapshot) => self.cache.insert(
                    id.clone(),
                    CacheEntry {
                        snapshot: snapshot.clone(),
                        body: processed.body.clone(),
                    },
                ),
                None => {
                    self.cache.evict(&id);
                }
            }
            modules.insert(
                id.clone(),
                ModuleRecord {
                    source: id,
                    body: processed.body,
                    dependency_map: processed.dependency_map,
                    importers: IndexSet::new(),
                },
            );
        }

        let edges: Vec<(String, String)> = modules
            .values()
            .flat_map(|record| {
                record
                    .dependencies()
                    .map(|dependency| (dependency.to_string(), record.source.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (dependency, importer) in edges {
            if let Some(target) = modules.get_mut(&dependency) {
                target.importers.insert(importer);
            }
        }

        for id in self.cache.ids() {
            if !modules.contains_key(&id) {
                self.cache.evict(&id);
                tracing::debug!(%id, "evicted unreferenced module");
                stats.evicted.push(id);
            }
        }

        for id in modules.keys() {
            self.store.acknowledge(id);
        }

        DependencyGraph::new(entry, modules).with_stats(stats)
    }
}

async fn resolve_entry(context: &BuildContext, entry: &str) -> Result<String> {
    let resolved = match context.hooks.resolve(entry, ENTRY_IMPORTER).await? {
        Some(HookResolution::Resolved(id)) => Some(id),
        Some(HookResolution::Optional) | None => {
            context.resolver.resolve(entry, "/", context.store.as_ref())
        }
    };
    resolved.ok_or_else(|| BuildError::ResolutionFailure {
        specifier: entry.to_string(),
        importer: ENTRY_IMPORTER.to_string(),
    })
}

/// Depth-first pre-order from the entry over each module's dependency map.
fn discovery_order(entry: &str, staged: &IndexMap<String, Processed>) -> Vec<String> {
    let mut order = Vec::with_capacity(staged.len());
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut stack: Vec<&str> = vec![entry];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Some(processed) = staged.get(id) else {
            continue;
        };
        order.push(id.to_string());
        for dependency in processed.dependency_map.values().rev() {
            if !visited.contains(dependency.as_str()) {
                stack.push(dependency);
            }
        }
    }
    order
}
