//! Cross-module binding.
//!
//! Every import binding is linked to the binding that actually declares the
//! value: re-export chains are followed to their end, `export *` modules are
//! searched for names the module does not export itself, and namespace
//! imports link to a synthesized namespace object.
//!
//! Re-export resolution keeps the chain of `(module, name)` pairs in
//! progress. Meeting a pair again through an explicit re-export is a cycle
//! with no declaration at its end ([`LinkError::CircularAggregateExport`]);
//! meeting it again through `export *` just means the name is not found
//! along that path. When no path finds the name and an `export *` cycle was
//! met on the way, the lookup fails with that cycle instead of a missing
//! export.

use seam_graph::id::identifier_stem;
use seam_graph::{ExportInfo, ImportKind};

use crate::error::{LinkError, Result};
use crate::symbols::{LinkGraph, ModuleIdx, SymbolRef};

/// State of one export lookup.
#[derive(Debug, Default)]
struct Search {
    /// `(module, name)` pairs in progress.
    chain: Vec<(ModuleIdx, String)>,
    /// First `export *` cycle met, as `id#name` steps.
    star_cycle: Option<Vec<String>>,
}

impl LinkGraph<'_> {
    /// Link every import binding of every module.
    pub(crate) fn bind_imports(&mut self) -> Result<()> {
        for idx in self.indices() {
            let script = self.module(idx).script;
            for import in &script.imports {
                let Some(local) = import.binding else {
                    continue;
                };
                let target = self.script_target(idx, &import.source)?;
                let symbol = match &import.kind {
                    ImportKind::Namespace => self.ensure_namespace(target),
                    ImportKind::Default => self.resolve_import(idx, target, "default")?,
                    ImportKind::Specifier { imported } => {
                        self.resolve_import(idx, target, imported)?
                    }
                    ImportKind::SideEffect => continue,
                };
                self.link(SymbolRef::new(idx, local), symbol);
            }
        }
        Ok(())
    }

    /// The binding `name` of `exporter` stands for, as seen from `importer`.
    pub(crate) fn resolve_import(
        &mut self,
        importer: ModuleIdx,
        exporter: ModuleIdx,
        name: &str,
    ) -> Result<SymbolRef> {
        let mut search = Search::default();
        match self.find_export(exporter, name, false, &mut search)? {
            Some(symbol) => Ok(symbol),
            None => Err(self.not_found(&mut search, importer, exporter, name)),
        }
    }

    fn not_found(
        &self,
        search: &mut Search,
        importer: ModuleIdx,
        exporter: ModuleIdx,
        name: &str,
    ) -> LinkError {
        match search.star_cycle.take() {
            Some(chain) => LinkError::CircularAggregateExport { chain },
            None => LinkError::MissingExport {
                importer: self.module(importer).id.to_string(),
                exporter: self.module(exporter).id.to_string(),
                name: name.to_string(),
            },
        }
    }

    fn find_export(
        &mut self,
        module: ModuleIdx,
        name: &str,
        via_star: bool,
        search: &mut Search,
    ) -> Result<Option<SymbolRef>> {
        if search
            .chain
            .iter()
            .any(|(seen, seen_name)| *seen == module && seen_name == name)
        {
            let mut steps: Vec<String> = search
                .chain
                .iter()
                .map(|(seen, seen_name)| format!("{}#{seen_name}", self.module(*seen).id))
                .collect();
            steps.push(format!("{}#{name}", self.module(module).id));
            if !via_star {
                return Err(LinkError::CircularAggregateExport { chain: steps });
            }
            tracing::trace!(module = self.module(module).id, name, "export * cycle");
            search.star_cycle.get_or_insert(steps);
            return Ok(None);
        }

        search.chain.push((module, name.to_string()));
        let found = self.find_export_in(module, name, search);
        search.chain.pop();
        found
    }

    fn find_export_in(
        &mut self,
        module: ModuleIdx,
        name: &str,
        search: &mut Search,
    ) -> Result<Option<SymbolRef>> {
        let script = self.module(module).script;
        match script.exports.get(name) {
            Some(
                ExportInfo::Declared { binding }
                | ExportInfo::DeclaredDefault { binding }
                | ExportInfo::DeclaredDefaultExpression { binding },
            ) => Ok(Some(SymbolRef::new(module, *binding))),
            Some(ExportInfo::AggregatedName { source, imported }) => {
                let target = self.script_target(module, source)?;
                match self.find_export(target, imported, false, search)? {
                    Some(symbol) => Ok(Some(symbol)),
                    None => Err(self.not_found(search, module, target, imported)),
                }
            }
            Some(ExportInfo::AggregatedNamespace { source }) => {
                let target = self.script_target(module, source)?;
                Ok(Some(self.ensure_namespace(target)))
            }
            // `export *` never forwards a default export.
            None if name == "default" => Ok(None),
            None => {
                for source in &script.star_exports {
                    let target = self.script_target(module, source)?;
                    if let Some(symbol) = self.find_export(target, name, true, search)? {
                        return Ok(Some(symbol));
                    }
                }
                Ok(None)
            }
        }
    }

    /// The namespace object binding of `module`, synthesized on first use.
    pub(crate) fn ensure_namespace(&mut self, module: ModuleIdx) -> SymbolRef {
        let link_module = self.module_mut(module);
        let binding = match link_module.namespace {
            Some(binding) => binding,
            None => {
                let base = format!("{}_exports", identifier_stem(link_module.id));
                let binding = link_module.scope.declare_synthetic(&base);
                link_module.namespace = Some(binding);
                tracing::debug!(
                    module = link_module.id,
                    name = link_module.scope.name(binding),
                    "synthesized namespace object"
                );
                binding
            }
        };
        SymbolRef::new(module, binding)
    }

    /// Exported names of the entry module and the bindings behind them.
    pub(crate) fn entry_symbols(&mut self) -> Result<Vec<(String, SymbolRef)>> {
        let Some(entry) = self.entry() else {
            return Ok(Vec::new());
        };
        let mut symbols = Vec::new();
        for name in self.exported_names(entry)? {
            let symbol = self.resolve_import(entry, entry, &name)?;
            symbols.push((name, symbol));
        }
        Ok(symbols)
    }
}
