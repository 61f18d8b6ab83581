//! Finalization: module text with bindings applied and module syntax gone.

use seam_graph::ModuleSyntax;

use crate::bundle::{Bundle, BundleWriter};
use crate::editor::{Rendered, TextEditor};
use crate::namespace::EXPORT_HELPER_SOURCE;
use crate::options::LinkOptions;
use crate::symbols::{LinkGraph, ModuleIdx, SymbolRef};

/// Render one module with final names.
pub(crate) fn render_module(graph: &LinkGraph<'_>, idx: ModuleIdx) -> Rendered {
    let module = graph.module(idx);
    let script = module.script;
    let mut editor = TextEditor::new(&script.content);

    for syntax in &script.syntax {
        match syntax {
            ModuleSyntax::Remove(span) => editor.remove_statement(span.start, span.end),
            ModuleSyntax::StripPrefix(span) => editor.remove(span.start, span.end),
            ModuleSyntax::DefaultExpression {
                prefix,
                binding,
                terminate_at,
            } => {
                let name = graph.final_name(SymbolRef::new(idx, *binding));
                editor.replace(prefix.start, prefix.end, format!("const {name} = "));
                if let Some(at) = terminate_at {
                    editor.insert(*at, ";");
                }
            }
            ModuleSyntax::AnonymousDefault {
                prefix,
                insert_at,
                binding,
            } => {
                let name = graph.final_name(SymbolRef::new(idx, *binding));
                editor.remove(prefix.start, prefix.end);
                editor.insert(*insert_at, format!(" {name}"));
            }
        }
    }

    for (binding, info) in module.scope.iter() {
        let name = graph.final_name(SymbolRef::new(idx, binding));
        if name == info.original {
            continue;
        }
        for site in info.sites() {
            editor.rename(site, &info.original, name);
        }
    }

    editor.render()
}

/// Concatenate every script module, dependencies first.
pub(crate) fn assemble_scripts(graph: &LinkGraph<'_>, options: &LinkOptions) -> Bundle {
    let mut writer = BundleWriter::new(options.source_map);
    if graph.has_namespaces() {
        writer.plain(EXPORT_HELPER_SOURCE);
    }

    for idx in graph.emission_order() {
        let module = graph.module(idx);
        let rendered = render_module(graph, idx);
        let namespace = graph.render_namespace(idx);
        if rendered.code.trim().is_empty() && namespace.is_none() {
            continue;
        }
        if options.module_comments {
            writer.plain(&format!("// {}\n", module.id));
        }
        writer.module(
            module.id,
            &module.script.content,
            module.script.map.as_ref(),
            &rendered,
        );
        if let Some(namespace) = namespace {
            writer.plain(&namespace);
        }
    }

    writer.finish(options.file.as_deref())
}
