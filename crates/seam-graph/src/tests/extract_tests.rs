use std::sync::Arc;

use super::super::extract::extract_script;
use super::super::{BindingKind, BuildError, ExportInfo, ImportKind, ModuleSyntax, ScriptModule};

fn extract(source: &str) -> ScriptModule {
    extract_script("/src/main.js", Arc::from(source), None).expect("extraction failed")
}

fn binding_name(module: &ScriptModule, export: &str) -> String {
    let binding = module.exports[export].binding().expect("not a local export");
    module.scope.name(binding).to_string()
}

#[test]
fn classifies_every_import_and_export_shape() {
    let module = extract(
        r#"import def, { a as b, c } from './dep';
import * as ns from './ns';
import './side';
export const { x, y: [z] } = obj;
export function f() { return def + b + c + ns.v; }
export { f as g, b as rb, ns as nsx };
export * from './star';
export * as all from './all';
export { q as r } from './agg';
export default 40 + 2
"#,
    );

    let kinds: Vec<&ImportKind> = module.imports.iter().map(|import| &import.kind).collect();
    assert_eq!(
        kinds,
        vec![
            &ImportKind::Default,
            &ImportKind::Specifier {
                imported: "a".into()
            },
            &ImportKind::Specifier {
                imported: "c".into()
            },
            &ImportKind::Namespace,
            &ImportKind::SideEffect,
        ]
    );
    assert!(module.imports[4].binding.is_none());

    assert_eq!(binding_name(&module, "x"), "x");
    assert_eq!(binding_name(&module, "z"), "z");
    assert!(!module.exports.contains_key("y"));
    assert_eq!(binding_name(&module, "g"), "f");
    assert_eq!(
        module.exports["rb"],
        ExportInfo::AggregatedName {
            source: "./dep".into(),
            imported: "a".into()
        }
    );
    assert_eq!(
        module.exports["nsx"],
        ExportInfo::AggregatedNamespace {
            source: "./ns".into()
        }
    );
    assert_eq!(
        module.exports["all"],
        ExportInfo::AggregatedNamespace {
            source: "./all".into()
        }
    );
    assert_eq!(
        module.exports["r"],
        ExportInfo::AggregatedName {
            source: "./agg".into(),
            imported: "q".into()
        }
    );
    assert!(matches!(
        module.exports["default"],
        ExportInfo::DeclaredDefaultExpression { .. }
    ));
    assert_eq!(binding_name(&module, "default"), "main_default");
    assert_eq!(module.star_exports, vec!["./star".to_string()]);
    assert_eq!(
        module.specifiers,
        vec!["./dep", "./ns", "./side", "./star", "./all", "./agg"]
    );
}

#[test]
fn default_expression_is_terminated_when_needed() {
    let source = "export default 40 + 2\n";
    let module = extract(source);
    let Some(ModuleSyntax::DefaultExpression {
        prefix,
        terminate_at,
        ..
    }) = module.syntax.first()
    else {
        panic!("expected a default expression");
    };
    assert_eq!(&source[prefix.start as usize..prefix.end as usize], "export default ");
    assert_eq!(*terminate_at, Some(21));

    let module = extract("export default 1;");
    assert!(matches!(
        module.syntax.first(),
        Some(ModuleSyntax::DefaultExpression {
            terminate_at: None,
            ..
        })
    ));
}

#[test]
fn named_default_declarations_keep_their_binding() {
    let module = extract("export default class Widget {}\nnew Widget();");
    assert!(matches!(
        module.exports["default"],
        ExportInfo::DeclaredDefault { .. }
    ));
    assert_eq!(binding_name(&module, "default"), "Widget");
    assert!(matches!(module.syntax[0], ModuleSyntax::StripPrefix(_)));
}

#[test]
fn anonymous_defaults_get_a_name_slot() {
    for (source, keyword) in [
        ("export default function () {}", "function"),
        ("export default async function* () {}", "function*"),
        ("export default class {}", "class"),
    ] {
        let module = extract(source);
        let Some(ModuleSyntax::AnonymousDefault {
            prefix, insert_at, ..
        }) = module.syntax.first()
        else {
            panic!("expected an anonymous default in {source}");
        };
        assert_eq!(prefix.start, 0);
        assert!(
            source[..*insert_at as usize].ends_with(keyword),
            "{source}: slot at {insert_at}"
        );
        assert_eq!(binding_name(&module, "default"), "main_default");
    }
}

#[test]
fn synthesized_default_avoids_existing_names() {
    let module = extract("const main_default = 1;\nexport default main_default + 1;");
    assert_eq!(binding_name(&module, "default"), "main_default$1");
    let id = module.exports["default"].binding().unwrap();
    assert_eq!(module.scope.get(id).kind, BindingKind::Synthetic);
}

#[test]
fn records_reference_sites_with_shorthands() {
    let source = "const a = 1;\nconst o = { a };\nlet q;\n({ q } = o);\nconsole.log(a, q);";
    let module = extract(source);

    let a = module.scope.lookup("a").unwrap();
    let binding = module.scope.get(a);
    assert_eq!(binding.declarations.len(), 1);
    assert_eq!(binding.references.len(), 2);
    assert!(binding.references.iter().any(|site| site.shorthand));
    assert!(binding.references.iter().any(|site| !site.shorthand));
    for site in binding.sites() {
        assert_eq!(&source[site.start as usize..site.end as usize], "a");
    }

    let q = module.scope.get(module.scope.lookup("q").unwrap());
    assert!(q.references.iter().any(|site| site.shorthand));
    assert!(module.scope.globals().any(|name| name == "console"));
}

#[test]
fn separates_nested_names_and_redeclarations() {
    let module = extract("var a = 1;\nvar a = 2;\nfunction f(inner) { let local = a; return inner + local; }");
    let a = module.scope.get(module.scope.lookup("a").unwrap());
    assert_eq!(a.declarations.len(), 2);
    assert!(module.scope.is_nested_name("inner"));
    assert!(module.scope.is_nested_name("local"));
    assert!(module.scope.lookup("local").is_none());
    assert_eq!(module.scope.get(module.scope.lookup("f").unwrap()).kind, BindingKind::Declared);
}

#[test]
fn import_bindings_are_marked() {
    let module = extract("import { a } from './a';\nexport const b = a;");
    let a = module.scope.lookup("a").unwrap();
    assert_eq!(module.scope.get(a).kind, BindingKind::Import);
    assert_eq!(module.imports[0].binding, Some(a));
    assert_eq!(module.scope.get(a).references.len(), 1);
}

#[test]
fn dynamic_imports_are_not_dependencies() {
    let module = extract("const lazy = () => import('./lazy.js');");
    assert!(module.specifiers.is_empty());
    assert!(!module.has_module_syntax());
}

#[test]
fn rejects_exports_of_undeclared_names() {
    let error = extract_script("/src/main.js", Arc::from("export { missing };"), None).unwrap_err();
    assert!(matches!(error, BuildError::ParseFailure { .. }));
    assert!(error.to_string().contains("missing"));
}

#[test]
fn rejects_syntax_errors() {
    let error = extract_script("/src/broken.js", Arc::from("const = ;"), None).unwrap_err();
    match error {
        BuildError::ParseFailure { id, .. } => assert_eq!(id, "/src/broken.js"),
        other => panic!("unexpected error: {other}"),
    }
}
