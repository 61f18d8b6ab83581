//! Link-time view of a graph's script modules.
//!
//! Every script module gets a private copy of its [`ScopeTable`] that the
//! linker is free to rename in, plus a table of *links*: an import binding
//! linked to another module's binding has no name of its own, it takes the
//! final name of whatever it is linked to.

use rustc_hash::FxHashMap;
use seam_graph::{BindingId, DependencyGraph, ModuleRecord, ScopeTable, ScriptModule};

use crate::error::{LinkError, Result};

/// Index of a script module in link order (graph order, scripts only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdx(u32);

impl ModuleIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A binding anywhere in the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolRef {
    pub module: ModuleIdx,
    pub binding: BindingId,
}

impl SymbolRef {
    pub fn new(module: ModuleIdx, binding: BindingId) -> Self {
        Self { module, binding }
    }
}

#[derive(Debug)]
pub(crate) struct LinkModule<'g> {
    pub id: &'g str,
    pub record: &'g ModuleRecord,
    pub script: &'g ScriptModule,
    pub scope: ScopeTable,
    /// Import binding → the binding it stands for.
    pub links: FxHashMap<BindingId, SymbolRef>,
    /// Synthesized namespace object, when something needs one.
    pub namespace: Option<BindingId>,
    /// Exported name → binding, sorted by name.
    pub namespace_members: Vec<(String, SymbolRef)>,
}

/// Where an import specifier leads.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target<'g> {
    Script(ModuleIdx),
    /// A style or resource module.
    Other(&'g str),
    /// Skipped as optional during the build.
    Unresolved,
}

#[derive(Debug)]
pub(crate) struct LinkGraph<'g> {
    pub graph: &'g DependencyGraph,
    pub modules: Vec<LinkModule<'g>>,
    by_id: FxHashMap<&'g str, ModuleIdx>,
}

impl<'g> LinkGraph<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        let mut modules = Vec::new();
        let mut by_id = FxHashMap::default();
        for (id, record) in graph.iter() {
            let Some(script) = record.as_script() else {
                continue;
            };
            by_id.insert(id, ModuleIdx(modules.len() as u32));
            modules.push(LinkModule {
                id,
                record,
                script,
                scope: script.scope.clone(),
                links: FxHashMap::default(),
                namespace: None,
                namespace_members: Vec::new(),
            });
        }
        Self {
            graph,
            modules,
            by_id,
        }
    }

    pub fn indices(&self) -> impl Iterator<Item = ModuleIdx> + use<> {
        (0..self.modules.len() as u32).map(ModuleIdx)
    }

    pub fn module(&self, idx: ModuleIdx) -> &LinkModule<'g> {
        &self.modules[idx.index()]
    }

    pub fn module_mut(&mut self, idx: ModuleIdx) -> &mut LinkModule<'g> {
        &mut self.modules[idx.index()]
    }

    pub fn lookup(&self, id: &str) -> Option<ModuleIdx> {
        self.by_id.get(id).copied()
    }

    pub fn entry(&self) -> Option<ModuleIdx> {
        self.lookup(self.graph.entry())
    }

    pub fn target(&self, importer: ModuleIdx, specifier: &str) -> Target<'g> {
        let record = self.module(importer).record;
        let Some(id) = record.dependency_map.get(specifier) else {
            return Target::Unresolved;
        };
        match self.lookup(id) {
            Some(idx) => Target::Script(idx),
            None if self.graph.contains(id) => Target::Other(id.as_str()),
            None => Target::Unresolved,
        }
    }

    /// The script module `specifier` leads to, or the reason it cannot be
    /// bound against.
    pub fn script_target(&self, importer: ModuleIdx, specifier: &str) -> Result<ModuleIdx> {
        match self.target(importer, specifier) {
            Target::Script(idx) => Ok(idx),
            Target::Other(target) => Err(LinkError::NonScriptBinding {
                importer: self.module(importer).id.to_string(),
                target: target.to_string(),
            }),
            Target::Unresolved => Err(LinkError::UnresolvedImport {
                importer: self.module(importer).id.to_string(),
                specifier: specifier.to_string(),
            }),
        }
    }

    pub fn link(&mut self, from: SymbolRef, to: SymbolRef) {
        tracing::trace!(
            importer = self.module(from.module).id,
            exporter = self.module(to.module).id,
            binding = %from.binding,
            target = %to.binding,
            "link binding"
        );
        self.module_mut(from.module).links.insert(from.binding, to);
    }

    /// Follow links to the binding that owns the name.
    pub fn canonical(&self, mut symbol: SymbolRef) -> SymbolRef {
        // Links never form cycles: they always point at declarations or
        // synthesized bindings, which are never linked themselves.
        for _ in 0..=self.modules.len() {
            match self.module(symbol.module).links.get(&symbol.binding) {
                Some(next) => symbol = *next,
                None => break,
            }
        }
        symbol
    }

    pub fn final_name(&self, symbol: SymbolRef) -> &str {
        let owner = self.canonical(symbol);
        self.module(owner.module).scope.name(owner.binding)
    }

    /// Script modules, dependencies first.
    pub fn emission_order(&self) -> Vec<ModuleIdx> {
        self.graph
            .emission_order()
            .into_iter()
            .filter_map(|id| self.lookup(id))
            .collect()
    }

    pub fn has_namespaces(&self) -> bool {
        self.modules.iter().any(|module| module.namespace.is_some())
    }
}
