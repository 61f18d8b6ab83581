//! Namespace objects.
//!
//! A module whose namespace is needed (`import * as ns`, `export * as ns`)
//! gets a synthesized `<stem>_exports` binding during binding, so the name
//! takes part in deconfliction like any other top-level binding. Its members
//! are resolved once binding is complete, and the object is rendered after
//! deconfliction:
//!
//! ```text
//! var utils_exports = __export({}, {
//!   format: () => format,
//!   parse: () => parse$1
//! });
//! ```
//!
//! Every member is a getter, so later assignments to the exporting binding
//! are observable through the object.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::symbols::{LinkGraph, ModuleIdx, SymbolRef};

/// Name of the runtime helper that populates namespace objects.
pub const EXPORT_HELPER: &str = "__export";

/// The helper's definition, emitted once at the top of a bundle that needs it.
pub const EXPORT_HELPER_SOURCE: &str = "var __export = (target, all) => {\n  for (var name in all)\n    Object.defineProperty(target, name, { get: all[name], enumerable: true });\n  return target;\n};\n";

impl LinkGraph<'_> {
    /// Resolve the members of every namespace object.
    ///
    /// Resolving a member may require another module's namespace
    /// (`export * as ns`), so this runs until no new namespace appears.
    pub(crate) fn materialize_namespaces(&mut self) -> Result<()> {
        let mut done: FxHashSet<ModuleIdx> = FxHashSet::default();
        loop {
            let pending: Vec<ModuleIdx> = self
                .indices()
                .filter(|idx| self.module(*idx).namespace.is_some() && !done.contains(idx))
                .collect();
            if pending.is_empty() {
                return Ok(());
            }
            for idx in pending {
                done.insert(idx);
                let mut members = Vec::new();
                for name in self.exported_names(idx)? {
                    let symbol = self.resolve_import(idx, idx, &name)?;
                    members.push((name, symbol));
                }
                members.sort_by(|a, b| a.0.cmp(&b.0));
                self.module_mut(idx).namespace_members = members;
            }
        }
    }

    /// Every name `module` exports, including names reached through
    /// `export *` (which never forwards `default`).
    pub(crate) fn exported_names(&self, module: ModuleIdx) -> Result<Vec<String>> {
        let mut names = IndexSet::new();
        let mut visited = FxHashSet::default();
        self.collect_names(module, true, &mut names, &mut visited)?;
        Ok(names.into_iter().collect())
    }

    fn collect_names(
        &self,
        module: ModuleIdx,
        include_default: bool,
        names: &mut IndexSet<String>,
        visited: &mut FxHashSet<ModuleIdx>,
    ) -> Result<()> {
        if !visited.insert(module) {
            return Ok(());
        }
        let script = self.module(module).script;
        for name in script.exports.keys() {
            if include_default || name != "default" {
                names.insert(name.clone());
            }
        }
        for source in &script.star_exports {
            let target = self.script_target(module, source)?;
            self.collect_names(target, false, names, visited)?;
        }
        Ok(())
    }

    /// The namespace object declaration of `module`, with final names.
    pub(crate) fn render_namespace(&self, module: ModuleIdx) -> Option<String> {
        let link_module = self.module(module);
        let binding = link_module.namespace?;
        let name = self.final_name(SymbolRef::new(module, binding));
        if link_module.namespace_members.is_empty() {
            return Some(format!("var {name} = {EXPORT_HELPER}({{}}, {{}});\n"));
        }
        let members: Vec<String> = link_module
            .namespace_members
            .iter()
            .map(|(exported, symbol)| {
                format!("  {}: () => {}", property_key(exported), self.final_name(*symbol))
            })
            .collect();
        Some(format!(
            "var {name} = {EXPORT_HELPER}({{}}, {{\n{}\n}});\n",
            members.join(",\n")
        ))
    }
}

fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if valid {
        name.to_string()
    } else {
        format!("{name:?}")
    }
}
