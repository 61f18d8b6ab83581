//! The dependency graph produced by a build.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::module::{ModuleRecord, ScriptModule};

/// What a build did with each module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Modules taken from the cache without reloading.
    pub reused: Vec<String>,
    /// Modules loaded and parsed by this build.
    pub built: Vec<String>,
    /// Cache entries dropped because no module references them anymore.
    pub evicted: Vec<String>,
}

/// Canonical id → module record, in depth-first discovery order from the
/// entry. Every module appears once; cycles are allowed.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    entry: String,
    modules: IndexMap<String, ModuleRecord>,
    stats: BuildStats,
}

impl DependencyGraph {
    pub fn new(entry: impl Into<String>, modules: IndexMap<String, ModuleRecord>) -> Self {
        Self {
            entry: entry.into(),
            modules,
            stats: BuildStats::default(),
        }
    }

    pub(crate) fn with_stats(mut self, stats: BuildStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn get(&self, id: &str) -> Option<&ModuleRecord> {
        self.modules.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleRecord)> {
        self.modules.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Script modules in graph order.
    pub fn scripts(&self) -> impl Iterator<Item = (&str, &ScriptModule)> {
        self.iter()
            .filter_map(|(id, record)| record.as_script().map(|script| (id, script)))
    }

    /// The module `specifier` resolved to from `importer`.
    pub fn dependency(&self, importer: &str, specifier: &str) -> Option<&ModuleRecord> {
        let target = self.modules.get(importer)?.dependency_map.get(specifier)?;
        self.modules.get(target)
    }

    /// Remove a module and every dependency left without importers.
    ///
    /// The entry is never collected as a side effect. Returns the removed
    /// ids in removal order.
    pub fn remove_module(&mut self, id: &str) -> Vec<String> {
        let mut removed = Vec::new();
        let mut pending = vec![id.to_string()];

        while let Some(current) = pending.pop() {
            let Some(record) = self.modules.shift_remove(&current) else {
                continue;
            };
            for dependency in record.dependencies() {
                let Some(target) = self.modules.get_mut(dependency) else {
                    continue;
                };
                target.importers.shift_remove(&current);
                if target.importers.is_empty() && dependency != self.entry {
                    pending.push(dependency.to_string());
                }
            }
            for other in self.modules.values_mut() {
                other.importers.shift_remove(&current);
            }
            tracing::debug!(id = %current, "removed module");
            removed.push(current);
        }
        removed
    }

    /// Dependencies before dependents: depth-first post-order from the entry,
    /// following each module's dependency map in source order. A back edge of
    /// a cycle is skipped. Modules unreachable from the entry come last, in
    /// graph order.
    pub fn emission_order(&self) -> Vec<&str> {
        let mut order = Vec::with_capacity(self.modules.len());
        let mut visited: FxHashSet<&str> = FxHashSet::default();

        let mut roots: Vec<&str> = Vec::with_capacity(self.modules.len());
        if let Some((entry, _)) = self.modules.get_key_value(self.entry.as_str()) {
            roots.push(entry.as_str());
        }
        roots.extend(self.ids());

        for root in roots {
            if !visited.insert(root) {
                continue;
            }
            // (module, index of the next dependency to visit)
            let mut stack: Vec<(&str, Vec<&str>, usize)> = vec![(root, self.dependencies_of(root), 0)];
            while let Some((module, dependencies, next)) = stack.last_mut() {
                if let Some(dependency) = dependencies.get(*next).copied() {
                    *next += 1;
                    if visited.insert(dependency) {
                        let children = self.dependencies_of(dependency);
                        stack.push((dependency, children, 0));
                    }
                } else {
                    order.push(*module);
                    stack.pop();
                }
            }
        }
        order
    }

    fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.modules
            .get(id)
            .map(|record| {
                record
                    .dependencies()
                    .filter_map(|dependency| {
                        self.modules
                            .get_key_value(dependency)
                            .map(|(key, _)| key.as_str())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexSet;

    use super::*;
    use crate::module::ModuleBody;

    fn record(id: &str, deps: &[&str]) -> ModuleRecord {
        ModuleRecord {
            source: id.to_string(),
            body: Arc::new(ModuleBody::Script(ScriptModule::empty())),
            dependency_map: deps
                .iter()
                .map(|dep| (format!(".{dep}"), dep.to_string()))
                .collect(),
            importers: IndexSet::new(),
        }
    }

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let mut modules: IndexMap<String, ModuleRecord> = edges
            .iter()
            .map(|(id, deps)| (id.to_string(), record(id, deps)))
            .collect();
        for (id, deps) in edges {
            for dep in *deps {
                if let Some(target) = modules.get_mut(*dep) {
                    target.importers.insert(id.to_string());
                }
            }
        }
        DependencyGraph::new(edges[0].0, modules)
    }

    #[test]
    fn emission_order_puts_dependencies_first() {
        let graph = graph(&[
            ("/main.js", &["/a.js", "/b.js"]),
            ("/a.js", &["/shared.js"]),
            ("/shared.js", &[]),
            ("/b.js", &["/shared.js"]),
        ]);
        assert_eq!(
            graph.emission_order(),
            vec!["/shared.js", "/a.js", "/b.js", "/main.js"]
        );
    }

    #[test]
    fn emission_order_breaks_cycles() {
        let graph = graph(&[("/a.js", &["/b.js"]), ("/b.js", &["/a.js"])]);
        assert_eq!(graph.emission_order(), vec!["/b.js", "/a.js"]);
    }

    #[test]
    fn remove_module_cascades_to_orphans_only() {
        let mut graph = graph(&[
            ("/main.js", &["/a.js", "/b.js"]),
            ("/a.js", &["/shared.js", "/only-a.js"]),
            ("/b.js", &["/shared.js"]),
            ("/shared.js", &[]),
            ("/only-a.js", &[]),
        ]);

        let removed = graph.remove_module("/a.js");
        assert_eq!(removed, vec!["/a.js", "/only-a.js"]);
        assert!(graph.contains("/shared.js"));
        assert_eq!(
            graph.get("/shared.js").unwrap().importers.iter().collect::<Vec<_>>(),
            vec!["/b.js"]
        );
    }

    #[test]
    fn remove_module_never_collects_entry() {
        let mut graph = graph(&[("/main.js", &["/a.js"]), ("/a.js", &["/main.js"])]);
        let removed = graph.remove_module("/a.js");
        assert_eq!(removed, vec!["/a.js"]);
        assert!(graph.contains("/main.js"));
    }
}
