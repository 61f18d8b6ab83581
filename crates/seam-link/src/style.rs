//! Stylesheet bundle.
//!
//! Style modules are concatenated dependencies first, so an `@import`ed sheet
//! lands before the sheet that imported it. `@import` rules are dropped;
//! `url()` references are left as written.

use seam_graph::{DependencyGraph, StyleImportKind};

use crate::bundle::{Bundle, BundleWriter};
use crate::editor::TextEditor;
use crate::options::LinkOptions;

pub(crate) fn assemble_styles(graph: &DependencyGraph, options: &LinkOptions) -> Option<Bundle> {
    let styles: Vec<_> = graph
        .emission_order()
        .into_iter()
        .filter_map(|id| graph.get(id)?.as_style().map(|style| (id, style)))
        .collect();
    if styles.is_empty() {
        return None;
    }

    let mut writer = BundleWriter::new(options.source_map);
    for (id, style) in &styles {
        let mut editor = TextEditor::new(&style.content);
        for import in &style.imports {
            if import.kind == StyleImportKind::Rule {
                editor.remove_statement(import.span.start, import.span.end);
            }
        }
        let rendered = editor.render();
        if rendered.code.trim().is_empty() {
            continue;
        }
        if options.module_comments {
            writer.plain(&format!("/* {id} */\n"));
        }
        writer.module(id, &style.content, style.map.as_ref(), &rendered);
    }

    tracing::debug!(modules = styles.len(), "assembled style bundle");
    let file = options.file.as_deref().map(style_file);
    Some(writer.finish(file.as_deref()))
}

/// `bundle.js` → `bundle.css`.
fn style_file(file: &str) -> String {
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() && !stem.ends_with('/') => format!("{stem}.css"),
        _ => format!("{file}.css"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_file_swaps_extension() {
        assert_eq!(style_file("bundle.js"), "bundle.css");
        assert_eq!(style_file("out/app.min.js"), "out/app.min.css");
        assert_eq!(style_file("bundle"), "bundle.css");
    }
}
