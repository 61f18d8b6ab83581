//! Import/export and scope extraction for JavaScript modules.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    AssignmentTargetPropertyIdentifier, BindingProperty, ExportDefaultDeclaration,
    ExportDefaultDeclarationKind, ExportNamedDeclaration, ImportDeclaration,
    ImportDeclarationSpecifier, ModuleDeclaration, ModuleExportName, ObjectProperty, Program,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_semantic::{Semantic, SemanticBuilder, SymbolFlags};
use oxc_span::{GetSpan, SourceType, Span};
use rustc_hash::FxHashSet;

use crate::error::{BuildError, Result};
use crate::id;
use crate::module::{ExportInfo, ImportInfo, ImportKind, ModuleSyntax, ScriptModule};
use crate::scope::{BindingId, BindingKind, ScopeTable, Site};
use crate::sourcemap::SourceMap;

/// Parse `content` and extract everything the linker needs.
pub fn extract_script(id: &str, content: Arc<str>, map: Option<SourceMap>) -> Result<ScriptModule> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, &content, SourceType::mjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(BuildError::ParseFailure {
            id: id.to_string(),
            message: error.to_string(),
        });
    }
    if parsed.panicked {
        return Err(BuildError::ParseFailure {
            id: id.to_string(),
            message: "parser aborted".to_string(),
        });
    }

    let semantic = SemanticBuilder::new().build(&parsed.program).semantic;
    let shorthand = ShorthandSites::collect(&parsed.program);
    let scope = scope_table(&semantic, &shorthand);

    let mut extractor = Extractor::new(id, &content, scope);
    for statement in &parsed.program.body {
        let Some(declaration) = statement.as_module_declaration() else {
            continue;
        };
        extractor.module_declaration(declaration)?;
    }
    let facts = extractor.finish()?;

    tracing::trace!(
        id,
        imports = facts.imports.len(),
        exports = facts.exports.len(),
        bindings = facts.scope.len(),
        "extracted script"
    );

    Ok(ScriptModule {
        content,
        map,
        imports: facts.imports,
        exports: facts.exports,
        star_exports: facts.star_exports,
        syntax: facts.syntax,
        scope: facts.scope,
        specifiers: facts.specifiers.into_iter().collect(),
    })
}

/// Start offsets of identifiers written as object shorthands.
#[derive(Default)]
struct ShorthandSites {
    starts: FxHashSet<u32>,
}

impl ShorthandSites {
    fn collect(program: &Program<'_>) -> Self {
        let mut sites = Self::default();
        sites.visit_program(program);
        sites
    }

    fn contains(&self, start: u32) -> bool {
        self.starts.contains(&start)
    }
}

impl<'a> Visit<'a> for ShorthandSites {
    fn visit_object_property(&mut self, property: &ObjectProperty<'a>) {
        if property.shorthand {
            self.starts.insert(property.key.span().start);
        }
        walk::walk_object_property(self, property);
    }

    fn visit_binding_property(&mut self, property: &BindingProperty<'a>) {
        if property.shorthand {
            self.starts.insert(property.key.span().start);
        }
        walk::walk_binding_property(self, property);
    }

    fn visit_assignment_target_property_identifier(
        &mut self,
        property: &AssignmentTargetPropertyIdentifier<'a>,
    ) {
        self.starts.insert(property.binding.span.start);
        walk::walk_assignment_target_property_identifier(self, property);
    }
}

fn scope_table(semantic: &Semantic<'_>, shorthand: &ShorthandSites) -> ScopeTable {
    let scoping = semantic.scoping();
    let nodes = semantic.nodes();
    let root = scoping.root_scope_id();
    let site = |span: Span| Site::new(span.start, span.end).shorthand(shorthand.contains(span.start));

    let mut table = ScopeTable::new();
    for symbol in scoping.symbol_ids() {
        let name = scoping.symbol_name(symbol);
        if scoping.symbol_scope_id(symbol) != root {
            table.add_nested_name(name);
            continue;
        }

        let kind = if scoping.symbol_flags(symbol).contains(SymbolFlags::Import) {
            BindingKind::Import
        } else {
            BindingKind::Declared
        };
        let binding = table.declare(name, kind);
        table.add_declaration(binding, site(scoping.symbol_span(symbol)));
        for redeclaration in scoping.symbol_redeclarations(symbol) {
            if redeclaration.span != scoping.symbol_span(symbol) {
                table.add_declaration(binding, site(redeclaration.span));
            }
        }
        for &reference_id in scoping.get_resolved_reference_ids(symbol) {
            let node_id = scoping.get_reference(reference_id).node_id();
            let span = nodes.get_node(node_id).kind().span();
            table.add_reference(binding, site(span));
        }
    }

    for name in scoping.root_unresolved_references().keys() {
        table.add_global(&name.to_string());
    }
    table
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}

struct Facts {
    imports: Vec<ImportInfo>,
    exports: IndexMap<String, ExportInfo>,
    star_exports: Vec<String>,
    syntax: Vec<ModuleSyntax>,
    scope: ScopeTable,
    specifiers: IndexSet<String>,
}

/// Header of an anonymous default declaration: from its start up to the
/// parameters (functions) or the heritage clause or body (classes).
#[derive(Debug, Clone, Copy)]
enum NameSlot {
    AfterFunctionKeyword(Span),
    AfterClassKeyword(Span),
}

struct Extractor<'s> {
    id: &'s str,
    text: &'s str,
    stem: String,
    facts: Facts,
    /// `export { local as exported }` lists, resolved once every import is known.
    local_exports: Vec<(String, String)>,
}

impl<'s> Extractor<'s> {
    fn new(id: &'s str, text: &'s str, scope: ScopeTable) -> Self {
        Self {
            id,
            text,
            stem: id::identifier_stem(id),
            facts: Facts {
                imports: Vec::new(),
                exports: IndexMap::new(),
                star_exports: Vec::new(),
                syntax: Vec::new(),
                scope,
                specifiers: IndexSet::new(),
            },
            local_exports: Vec::new(),
        }
    }

    fn module_declaration(&mut self, declaration: &ModuleDeclaration<'_>) -> Result<()> {
        match declaration {
            ModuleDeclaration::ImportDeclaration(import) => self.import(import),
            ModuleDeclaration::ExportAllDeclaration(export) => {
                let source = export.source.value.to_string();
                self.facts.specifiers.insert(source.clone());
                self.facts.syntax.push(ModuleSyntax::Remove(export.span));
                match &export.exported {
                    Some(name) => {
                        self.facts
                            .exports
                            .insert(export_name(name), ExportInfo::AggregatedNamespace { source });
                    }
                    None => self.facts.star_exports.push(source),
                }
            }
            ModuleDeclaration::ExportNamedDeclaration(export) => self.export_named(export),
            ModuleDeclaration::ExportDefaultDeclaration(export) => self.export_default(export)?,
            _ => {}
        }
        Ok(())
    }

    fn import(&mut self, import: &ImportDeclaration<'_>) {
        let source = import.source.value.to_string();
        self.facts.specifiers.insert(source.clone());
        self.facts.syntax.push(ModuleSyntax::Remove(import.span));

        let specifiers: &[ImportDeclarationSpecifier<'_>] = match &import.specifiers {
            Some(specifiers) => specifiers,
            None => &[],
        };
        if specifiers.is_empty() {
            self.facts.imports.push(ImportInfo {
                source,
                kind: ImportKind::SideEffect,
                binding: None,
                statement: import.span,
            });
            return;
        }

        for specifier in specifiers {
            let (kind, local) = match specifier {
                ImportDeclarationSpecifier::ImportSpecifier(specifier) => (
                    ImportKind::Specifier {
                        imported: export_name(&specifier.imported),
                    },
                    &specifier.local,
                ),
                ImportDeclarationSpecifier::ImportDefaultSpecifier(specifier) => {
                    (ImportKind::Default, &specifier.local)
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(specifier) => {
                    (ImportKind::Namespace, &specifier.local)
                }
            };
            self.facts.imports.push(ImportInfo {
                source: source.clone(),
                kind,
                binding: self.facts.scope.lookup(&local.name),
                statement: import.span,
            });
        }
    }

    fn export_named(&mut self, export: &ExportNamedDeclaration<'_>) {
        if let Some(declaration) = &export.declaration {
            let span = declaration.span();
            self.facts
                .syntax
                .push(ModuleSyntax::StripPrefix(Span::new(export.span.start, span.start)));

            let exported: Vec<(String, BindingId)> = self
                .facts
                .scope
                .iter()
                .filter(|(_, binding)| binding.kind == BindingKind::Declared)
                .filter(|(_, binding)| {
                    binding
                        .declarations
                        .iter()
                        .any(|site| site.start >= span.start && site.end <= span.end)
                })
                .map(|(id, binding)| (binding.name.clone(), id))
                .collect();
            for (name, binding) in exported {
                self.facts
                    .exports
                    .insert(name, ExportInfo::Declared { binding });
            }
            return;
        }

        self.facts.syntax.push(ModuleSyntax::Remove(export.span));
        match &export.source {
            Some(source) => {
                let source = source.value.to_string();
                self.facts.specifiers.insert(source.clone());
                for specifier in &export.specifiers {
                    self.facts.exports.insert(
                        export_name(&specifier.exported),
                        ExportInfo::AggregatedName {
                            source: source.clone(),
                            imported: export_name(&specifier.local),
                        },
                    );
                }
            }
            None => {
                for specifier in &export.specifiers {
                    self.local_exports.push((
                        export_name(&specifier.local),
                        export_name(&specifier.exported),
                    ));
                }
            }
        }
    }

    fn export_default(&mut self, export: &ExportDefaultDeclaration<'_>) -> Result<()> {
        let (declaration_span, named, name_slot) = match &export.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                let header_end = function
                    .type_parameters
                    .as_ref()
                    .map_or(function.params.span.start, |parameters| parameters.span.start);
                (
                    function.span,
                    function.id.as_ref().map(|id| id.name.as_str()),
                    NameSlot::AfterFunctionKeyword(Span::new(function.span.start, header_end)),
                )
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                let header_end = [
                    class.type_parameters.as_ref().map(|parameters| parameters.span.start),
                    class.super_class.as_ref().map(|super_class| super_class.span().start),
                ]
                .into_iter()
                .flatten()
                .fold(class.body.span.start, u32::min);
                (
                    class.span,
                    class.id.as_ref().map(|id| id.name.as_str()),
                    NameSlot::AfterClassKeyword(Span::new(class.span.start, header_end)),
                )
            }
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => {
                self.facts.syntax.push(ModuleSyntax::Remove(export.span));
                return Ok(());
            }
            expression => {
                self.default_expression(export, expression.span());
                return Ok(());
            }
        };

        let prefix = Span::new(export.span.start, declaration_span.start);
        let binding = match named {
            Some(name) => {
                self.facts.syntax.push(ModuleSyntax::StripPrefix(prefix));
                self.facts
                    .scope
                    .lookup(name)
                    .ok_or_else(|| self.parse_failure(format!("default export '{name}' has no binding")))?
            }
            None => {
                let binding = self
                    .facts
                    .scope
                    .declare_synthetic(&format!("{}_default", self.stem));
                let insert_at = self.anonymous_name_offset(name_slot);
                self.facts.syntax.push(ModuleSyntax::AnonymousDefault {
                    prefix,
                    insert_at,
                    binding,
                });
                binding
            }
        };
        self.facts
            .exports
            .insert("default".to_string(), ExportInfo::DeclaredDefault { binding });
        Ok(())
    }

    fn default_expression(&mut self, export: &ExportDefaultDeclaration<'_>, expression: Span) {
        let binding = self
            .facts
            .scope
            .declare_synthetic(&format!("{}_default", self.stem));
        let statement = &self.text[export.span.start as usize..export.span.end as usize];
        let terminate_at = (!statement.trim_end().ends_with(';')).then_some(export.span.end);
        self.facts.syntax.push(ModuleSyntax::DefaultExpression {
            prefix: Span::new(export.span.start, expression.start),
            binding,
            terminate_at,
        });
        self.facts.exports.insert(
            "default".to_string(),
            ExportInfo::DeclaredDefaultExpression { binding },
        );
    }

    /// Offset right after `function`, `function*` or `class` in an anonymous
    /// default declaration, where the synthesized name goes.
    fn anonymous_name_offset(&self, slot: NameSlot) -> u32 {
        match slot {
            NameSlot::AfterFunctionKeyword(header) => {
                let text = &self.text[header.start as usize..header.end as usize];
                header.start + text.trim_end().len() as u32
            }
            NameSlot::AfterClassKeyword(header) => {
                let text = &self.text[header.start as usize..header.end as usize];
                let keyword_end = text.rfind("class").map_or(0, |index| index + "class".len());
                header.start + keyword_end as u32
            }
        }
    }

    fn finish(mut self) -> Result<Facts> {
        for (local, exported) in std::mem::take(&mut self.local_exports) {
            let Some(binding) = self.facts.scope.lookup(&local) else {
                return Err(self.parse_failure(format!("export '{local}' is not defined")));
            };
            let export = match self.facts.scope.get(binding).kind {
                BindingKind::Import => self.reexport_of_import(binding),
                BindingKind::Declared | BindingKind::Synthetic => {
                    Some(ExportInfo::Declared { binding })
                }
            };
            let Some(export) = export else {
                return Err(self.parse_failure(format!("export '{local}' has no import")));
            };
            self.facts.exports.insert(exported, export);
        }
        Ok(self.facts)
    }

    /// `import { a } from "x"; export { a }` is an aggregated export of `x`.
    fn reexport_of_import(&self, binding: BindingId) -> Option<ExportInfo> {
        let import = self
            .facts
            .imports
            .iter()
            .find(|import| import.binding == Some(binding))?;
        let source = import.source.clone();
        Some(match &import.kind {
            ImportKind::Namespace => ExportInfo::AggregatedNamespace { source },
            ImportKind::Default => ExportInfo::AggregatedName {
                source,
                imported: "default".to_string(),
            },
            ImportKind::Specifier { imported } => ExportInfo::AggregatedName {
                source,
                imported: imported.clone(),
            },
            ImportKind::SideEffect => return None,
        })
    }

    fn parse_failure(&self, message: String) -> BuildError {
        BuildError::ParseFailure {
            id: self.id.to_string(),
            message,
        }
    }
}
