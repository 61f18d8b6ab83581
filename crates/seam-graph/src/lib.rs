//! # seam-graph
//!
//! Specifier resolution, the load/transform pipeline, and dependency graph
//! construction for the seam bundler.
//!
//! ## Overview
//!
//! ```text
//!  entry ──► Resolver ──► HookRegistry (resolve/load/loaders/transform/parsed)
//!                                   │
//!                                   ▼
//!                  extract (imports, exports, ScopeTable)
//!                                   │
//!                                   ▼
//!                  GraphBuilder ──► DependencyGraph
//! ```
//!
//! - [`AssetStore`] supplies module content; [`MemoryAssetStore`] is the
//!   in-process implementation.
//! - [`Resolver`] maps specifiers to canonical ids (aliases, extensions,
//!   `package.json` `main`, fallbacks).
//! - [`HookRegistry`] holds plugin hooks and loaders.
//! - [`GraphBuilder`] loads modules concurrently, caches parsed modules
//!   between builds, and produces a [`DependencyGraph`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use seam_graph::{GraphBuilder, MemoryAssetStore, ModuleKind, ResolveOptions, Resolver};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> seam_graph::Result<()> {
//! let store = Arc::new(MemoryAssetStore::from_files([
//!     ("/src/index.js", "import './theme.css'; import { greet } from '@/greet'; greet();"),
//!     ("/src/greet.js", "export function greet() {}"),
//!     ("/src/theme.css", "body { margin: 0; }"),
//! ]));
//! let resolver = Resolver::new(ResolveOptions::default().alias("@", "/src"));
//!
//! let graph = GraphBuilder::new(store, resolver).build("/src/index.js").await?;
//! assert_eq!(graph.len(), 3);
//! assert_eq!(graph.get("/src/theme.css").map(|m| m.kind()), Some(ModuleKind::Style));
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod builder;
pub mod error;
pub mod extract;
pub mod graph;
pub mod id;
pub mod module;
pub mod pipeline;
pub mod resolver;
pub mod scope;
pub mod sourcemap;

#[cfg(test)]
mod tests;

pub use asset::{Asset, AssetContent, AssetStore, MemoryAssetStore};
pub use builder::{CacheEntry, GraphBuilder, ModuleCache};
pub use error::{BuildError, HookError, HookResult, Result};
pub use graph::{BuildStats, DependencyGraph};
pub use id::{EMPTY_MODULE, VIRTUAL_PREFIX};
pub use module::{
    ExportInfo, ImportInfo, ImportKind, ModuleBody, ModuleKind, ModuleRecord, ModuleSyntax,
    ResourceModule, ScriptModule, StyleImport, StyleImportKind, StyleModule,
};
pub use pipeline::{
    FnLoader, Hook, HookOptions, HookOrder, HookRegistry, HookResolution, JsonLoader, LoadHook,
    LoadOutput, Loader, ModuleInfo, ParseInfo, ParsedHook, ResolveHook, TransformContext,
    TransformHook,
};
pub use resolver::{Fallback, ResolveContext, ResolveOptions, Resolver, resolve};
pub use scope::{Binding, BindingId, BindingKind, ScopeTable, Site};
pub use sourcemap::SourceMap;

// Re-export the oxc types that appear in hook signatures so plugins use the
// same versions as the pipeline.
pub mod oxc {
    //! oxc types re-exported for plugin authors.
    //!
    //! ```ignore
    //! use seam_graph::oxc::{ast::ast::Program, Allocator};
    //! ```

    /// Arena allocator for AST nodes
    pub use oxc_allocator::Allocator;

    /// AST node types
    pub use oxc_ast::{self as ast, AstBuilder};

    /// AST visitor trait
    pub use oxc_ast_visit::{Visit, VisitMut};

    /// Span types for source location tracking
    pub use oxc_span::{GetSpan, SourceType, Span};
}
