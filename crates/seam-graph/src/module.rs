//! Module records stored in the dependency graph.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use oxc_span::Span;

use crate::asset::AssetContent;
use crate::scope::{BindingId, ScopeTable};
use crate::sourcemap::SourceMap;

/// Broad category of a module, derived from its language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Script,
    Style,
    Resource,
}

/// Extensions treated as opaque resources.
pub const RESOURCE_LANGS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp", "woff", "woff2", "ttf",
    "otf", "eot", "mp3", "mp4", "webm", "wav", "ogg", "wasm", "txt",
];

impl ModuleKind {
    /// Kind for a language tag (an extension without the dot).
    pub fn from_lang(lang: &str) -> Option<Self> {
        match lang {
            "js" | "mjs" | "cjs" => Some(ModuleKind::Script),
            "css" => Some(ModuleKind::Style),
            lang if RESOURCE_LANGS.contains(&lang) => Some(ModuleKind::Resource),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Script => "script",
            ModuleKind::Style => "style",
            ModuleKind::Resource => "resource",
        }
    }
}

/// One node of the [`DependencyGraph`](crate::DependencyGraph).
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    /// Canonical id.
    pub source: String,
    pub body: Arc<ModuleBody>,
    /// Raw specifier → canonical id, in source order.
    pub dependency_map: IndexMap<String, String>,
    /// Modules whose dependency map points at this one.
    pub importers: IndexSet<String>,
}

impl ModuleRecord {
    pub fn kind(&self) -> ModuleKind {
        self.body.kind()
    }

    pub fn as_script(&self) -> Option<&ScriptModule> {
        match self.body.as_ref() {
            ModuleBody::Script(script) => Some(script),
            _ => None,
        }
    }

    pub fn as_style(&self) -> Option<&StyleModule> {
        match self.body.as_ref() {
            ModuleBody::Style(style) => Some(style),
            _ => None,
        }
    }

    /// Canonical ids of this module's dependencies, deduplicated, in order.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        let mut seen = IndexSet::new();
        for id in self.dependency_map.values() {
            seen.insert(id.as_str());
        }
        seen.into_iter()
    }
}

/// Parsed content of a module.
#[derive(Debug, Clone)]
pub enum ModuleBody {
    Script(ScriptModule),
    Style(StyleModule),
    Resource(ResourceModule),
}

impl ModuleBody {
    pub fn kind(&self) -> ModuleKind {
        match self {
            ModuleBody::Script(_) => ModuleKind::Script,
            ModuleBody::Style(_) => ModuleKind::Style,
            ModuleBody::Resource(_) => ModuleKind::Resource,
        }
    }

    /// Specifiers in source order, deduplicated.
    pub fn specifiers(&self) -> &[String] {
        match self {
            ModuleBody::Script(script) => &script.specifiers,
            ModuleBody::Style(style) => &style.specifiers,
            ModuleBody::Resource(_) => &[],
        }
    }
}

/// A JavaScript module after load, transform and extraction.
#[derive(Debug, Clone)]
pub struct ScriptModule {
    pub content: Arc<str>,
    /// Maps `content` back to the original source, when the pipeline
    /// changed it.
    pub map: Option<SourceMap>,
    pub imports: Vec<ImportInfo>,
    /// Exported name → export.
    pub exports: IndexMap<String, ExportInfo>,
    /// Sources of `export * from` declarations, in order.
    pub star_exports: Vec<String>,
    /// Module syntax the linker has to strip or rewrite.
    pub syntax: Vec<ModuleSyntax>,
    pub scope: ScopeTable,
    pub specifiers: Vec<String>,
}

impl ScriptModule {
    /// The built-in empty module.
    pub fn empty() -> Self {
        Self {
            content: Arc::from(""),
            map: None,
            imports: Vec::new(),
            exports: IndexMap::new(),
            star_exports: Vec::new(),
            syntax: Vec::new(),
            scope: ScopeTable::new(),
            specifiers: Vec::new(),
        }
    }

    pub fn has_module_syntax(&self) -> bool {
        !self.imports.is_empty() || !self.exports.is_empty() || !self.star_exports.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StyleModule {
    pub content: Arc<str>,
    pub map: Option<SourceMap>,
    pub imports: Vec<StyleImport>,
    pub specifiers: Vec<String>,
}

/// An `@import` rule or `url()` reference in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleImport {
    pub source: String,
    pub kind: StyleImportKind,
    /// Span of the whole rule (`@import`) or of the `url(...)` token.
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleImportKind {
    /// `@import` rule; removed when bundling.
    Rule,
    /// `url()` reference; left in place.
    Url,
}

#[derive(Debug, Clone)]
pub struct ResourceModule {
    pub content: AssetContent,
}

/// One import binding (or a side-effect import).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    /// Specifier as written.
    pub source: String,
    pub kind: ImportKind,
    /// Local binding; `None` for side-effect imports.
    pub binding: Option<BindingId>,
    /// The import declaration this entry came from.
    pub statement: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// `import a from "x"`
    Default,
    /// `import * as a from "x"`
    Namespace,
    /// `import { b as a } from "x"`
    Specifier { imported: String },
    /// `import "x"`
    SideEffect,
}

impl ImportKind {
    /// Name requested from the exporting module, if any.
    pub fn imported_name(&self) -> Option<&str> {
        match self {
            ImportKind::Default => Some("default"),
            ImportKind::Specifier { imported } => Some(imported),
            ImportKind::Namespace | ImportKind::SideEffect => None,
        }
    }
}

/// How an exported name is provided.
///
/// The variant decides how an importer binds to it; every consumer matches
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportInfo {
    /// `export const a = 1`, `export { a }`, `export function a() {}`
    Declared { binding: BindingId },
    /// `export default function a() {}`, `export default class A {}`
    DeclaredDefault { binding: BindingId },
    /// `export default <expr>`; `binding` is the synthesized const.
    DeclaredDefaultExpression { binding: BindingId },
    /// `export { a as b } from "x"`
    AggregatedName { source: String, imported: String },
    /// `export * as ns from "x"`
    AggregatedNamespace { source: String },
}

impl ExportInfo {
    /// Local binding backing this export, for non-aggregated kinds.
    pub fn binding(&self) -> Option<BindingId> {
        match self {
            ExportInfo::Declared { binding }
            | ExportInfo::DeclaredDefault { binding }
            | ExportInfo::DeclaredDefaultExpression { binding } => Some(*binding),
            ExportInfo::AggregatedName { .. } | ExportInfo::AggregatedNamespace { .. } => None,
        }
    }

    pub fn is_aggregated(&self) -> bool {
        self.binding().is_none()
    }
}

/// A piece of module syntax the linker rewrites during finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSyntax {
    /// Delete the whole statement (imports, export lists, re-exports).
    Remove(Span),
    /// Delete `export ` (or `export default `) in front of a declaration.
    StripPrefix(Span),
    /// `export default <expr>` becomes `const <binding> = <expr>`.
    DefaultExpression {
        prefix: Span,
        binding: BindingId,
        /// Where to add a `;` when the statement has none.
        terminate_at: Option<u32>,
    },
    /// `export default function () {}` becomes `function <binding>() {}`.
    AnonymousDefault {
        prefix: Span,
        insert_at: u32,
        binding: BindingId,
    },
}
