//! Identifier deconfliction.
//!
//! Concatenated modules share one scope, so every top-level binding must end
//! up with a name no other module uses. Modules are visited in graph order,
//! so the entry keeps its names and later modules yield. A binding is renamed
//! when:
//!
//! - another binding already claimed its name,
//! - its name is a global referenced anywhere in the bundle (or the
//!   namespace helper), or
//! - a module that reaches it through an import declares the name in a
//!   nested scope, where the reference would be captured.
//!
//! Linked import bindings are skipped: they take their target's final name.

use rustc_hash::FxHashMap;

use crate::namespace::EXPORT_HELPER;
use crate::symbols::{LinkGraph, ModuleIdx, SymbolRef};
use crate::uid::UidGenerator;

/// Who holds a top-level name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// A global or a runtime helper; never renamed.
    Reserved,
    Binding(SymbolRef),
}

/// Rename colliding top-level bindings. Returns the number of renames.
pub(crate) fn deconflict(graph: &mut LinkGraph<'_>, uid: &mut UidGenerator) -> usize {
    let mut claims: FxHashMap<String, Claim> = FxHashMap::default();
    claims.insert(EXPORT_HELPER.to_string(), Claim::Reserved);
    uid.reserve(EXPORT_HELPER);

    for module in &graph.modules {
        for global in module.scope.globals() {
            claims.insert(global.to_string(), Claim::Reserved);
            uid.reserve(global);
        }
        for name in module.scope.nested_names() {
            uid.reserve(name);
        }
        for (_, binding) in module.scope.iter() {
            uid.reserve(binding.name.as_str());
        }
    }

    let users = users_by_symbol(graph);
    let mut renames = 0;

    for idx in graph.indices() {
        for binding in graph.module(idx).scope.ids() {
            let symbol = SymbolRef::new(idx, binding);
            if graph.canonical(symbol) != symbol {
                continue;
            }
            let current = graph.module(idx).scope.name(binding).to_string();
            let importers = users.get(&symbol).map(Vec::as_slice).unwrap_or_default();

            let mut name = current.clone();
            while conflicts(graph, &claims, &name, symbol, importers) {
                name = uid.fresh(base_name(&current));
            }
            if name != current {
                tracing::trace!(
                    module = graph.module(idx).id,
                    from = %current,
                    to = %name,
                    "deconflict"
                );
                graph.module_mut(idx).scope.rename(binding, name.clone());
                renames += 1;
            }
            claims.insert(name, Claim::Binding(symbol));
        }
    }

    tracing::debug!(renames, "deconflicted top-level bindings");
    renames
}

/// Modules that refer to each symbol through an import.
fn users_by_symbol(graph: &LinkGraph<'_>) -> FxHashMap<SymbolRef, Vec<ModuleIdx>> {
    let mut users: FxHashMap<SymbolRef, Vec<ModuleIdx>> = FxHashMap::default();
    for idx in graph.indices() {
        for target in graph.module(idx).links.values() {
            let owner = graph.canonical(*target);
            if owner.module != idx {
                let entry = users.entry(owner).or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
        }
    }
    users
}

fn conflicts(
    graph: &LinkGraph<'_>,
    claims: &FxHashMap<String, Claim>,
    name: &str,
    symbol: SymbolRef,
    importers: &[ModuleIdx],
) -> bool {
    let claimed = match claims.get(name) {
        Some(Claim::Reserved) => true,
        Some(Claim::Binding(owner)) => *owner != symbol,
        None => false,
    };
    claimed
        || importers
            .iter()
            .any(|idx| graph.module(*idx).scope.is_nested_name(name))
}

/// `foo$3` → `foo`, so fresh names do not stack suffixes.
fn base_name(name: &str) -> &str {
    match name.rsplit_once('$') {
        Some((base, suffix))
            if !base.is_empty()
                && !suffix.is_empty()
                && suffix.bytes().all(|byte| byte.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}
