//! Emitted bundles and their assembly.

use seam_graph::sourcemap::{SourceMap, compose};

use crate::editor::Rendered;
use crate::merge::SourceMapMerger;

/// One emitted file: its text and, when enabled, its source map.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub content: String,
    pub map: Option<SourceMap>,
}

impl Bundle {
    /// The source map encoded as v3 JSON.
    pub fn map_json(&self) -> Option<String> {
        self.map.as_ref().map(SourceMap::to_json_string)
    }

    /// Map of a later pass over this bundle (a minifier, say), composed so
    /// it points at the original sources. `outer` maps the pass output back
    /// to this bundle's text.
    pub fn compose(&self, outer: &SourceMap) -> Option<SourceMap> {
        self.map.as_ref().map(|map| compose(map, outer))
    }
}

/// Concatenates module output while tracking bundle positions.
#[derive(Debug)]
pub(crate) struct BundleWriter {
    content: String,
    merger: Option<SourceMapMerger>,
}

impl BundleWriter {
    pub fn new(source_map: bool) -> Self {
        Self {
            content: String::new(),
            merger: source_map.then(SourceMapMerger::new),
        }
    }

    /// Text that maps to nothing.
    pub fn plain(&mut self, text: &str) {
        self.content.push_str(text);
        if let Some(merger) = &mut self.merger {
            merger.skip(text);
        }
    }

    pub fn module(&mut self, id: &str, content: &str, map: Option<&SourceMap>, rendered: &Rendered) {
        if let Some(merger) = &mut self.merger {
            merger.add_module(id, content, map, rendered);
        }
        self.content.push_str(&rendered.code);
        if !rendered.code.is_empty() && !rendered.code.ends_with('\n') {
            self.plain("\n");
        }
    }

    pub fn finish(self, file: Option<&str>) -> Bundle {
        Bundle {
            content: self.content,
            map: self.merger.map(|merger| merger.finish(file)),
        }
    }
}
