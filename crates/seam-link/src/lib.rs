//! # seam-link
//!
//! Turns a [`DependencyGraph`] into flat bundles: one script with every
//! module's top-level bindings merged into a single collision-free scope, an
//! optional stylesheet, and a source map for each that points through every
//! transformation back to the original files.
//!
//! ## Phases
//!
//! ```text
//!  DependencyGraph
//!        │
//!        ▼
//!  bind imports ──► namespace objects ──► deconflict ──► render ──► merge maps
//! ```
//!
//! 1. **Bind**: every import binding is linked to the declaration it stands
//!    for, following re-export chains and `export *`.
//! 2. **Namespaces**: modules used as namespaces get a getter-backed object.
//! 3. **Deconflict**: top-level names are made unique across the bundle.
//! 4. **Render**: import/export syntax is stripped and renames applied as
//!    text edits; modules are emitted dependencies first.
//! 5. **Merge**: per-module maps are shifted to their bundle position and
//!    traced through each module's incoming map.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use seam_graph::{GraphBuilder, MemoryAssetStore, Resolver};
//! use seam_link::{LinkOptions, Linker};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryAssetStore::from_files([
//!     ("/main.js", "import { count } from './a';\nconst count2 = count * 2;\nconsole.log(count2);\n"),
//!     ("/a.js", "export const count = 21;"),
//! ]));
//! let graph = GraphBuilder::new(store, Resolver::default()).build("/main.js").await?;
//!
//! let output = Linker::new(LinkOptions::default().module_comments(false)).link(&graph)?;
//! assert_eq!(
//!     output.script.content,
//!     "const count = 21;\nconst count2 = count * 2;\nconsole.log(count2);\n"
//! );
//! assert!(output.script.map.is_some());
//! # Ok(())
//! # }
//! ```

mod binding;
mod bundle;
mod deconflict;
pub mod editor;
pub mod error;
pub mod merge;
mod namespace;
pub mod options;
mod render;
mod style;
mod symbols;
pub mod uid;


pub use bundle::Bundle;
pub use editor::{Rendered, Segment, TextEditor};
pub use error::{LinkError, Result};
pub use merge::SourceMapMerger;
pub use namespace::{EXPORT_HELPER, EXPORT_HELPER_SOURCE};
pub use options::LinkOptions;
pub use symbols::{ModuleIdx, SymbolRef};
pub use uid::UidGenerator;

use indexmap::IndexMap;
use seam_graph::DependencyGraph;

use symbols::LinkGraph;

/// Everything one link run emits.
#[derive(Debug, Clone)]
pub struct LinkOutput {
    pub script: Bundle,
    /// Present when the graph contains style modules.
    pub style: Option<Bundle>,
    /// Names the entry module exports → final identifiers in the script.
    pub entry_exports: IndexMap<String, String>,
}

/// Links graphs into bundles.
///
/// Owns the [`UidGenerator`] for its runs; fresh names start over on every
/// [`link`](Self::link), so linking the same graph twice gives the same
/// output.
#[derive(Debug, Default)]
pub struct Linker {
    options: LinkOptions,
    uid: UidGenerator,
}

impl Linker {
    pub fn new(options: LinkOptions) -> Self {
        Self {
            options,
            uid: UidGenerator::new(),
        }
    }

    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    pub fn link(&mut self, graph: &DependencyGraph) -> Result<LinkOutput> {
        self.uid.reset();
        let mut links = LinkGraph::new(graph);

        links.bind_imports()?;
        let entry_symbols = links.entry_symbols()?;
        links.materialize_namespaces()?;
        let renames = deconflict::deconflict(&mut links, &mut self.uid);

        let entry_exports = entry_symbols
            .into_iter()
            .map(|(name, symbol)| {
                let local = links.final_name(symbol).to_string();
                (name, local)
            })
            .collect();

        let script = render::assemble_scripts(&links, &self.options);
        let style = style::assemble_styles(graph, &self.options);

        tracing::info!(
            entry = graph.entry(),
            modules = links.modules.len(),
            renames,
            script_bytes = script.content.len(),
            style_bytes = style.as_ref().map_or(0, |style| style.content.len()),
            "linked bundle"
        );

        Ok(LinkOutput {
            script,
            style,
            entry_exports,
        })
    }
}

/// Link `graph` with `options` in a one-off run.
pub fn link(graph: &DependencyGraph, options: &LinkOptions) -> Result<LinkOutput> {
    Linker::new(options.clone()).link(graph)
}
