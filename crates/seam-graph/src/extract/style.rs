//! `@import` and `url()` extraction for stylesheets.
//!
//! Stylesheets are not parsed into a tree; dependencies are found with two
//! patterns. Remote (`https://`, `//host`) references, `data:` URIs and
//! fragment-only urls stay external and are not recorded.

use std::sync::{Arc, LazyLock};

use indexmap::IndexSet;
use oxc_span::Span;
use regex::{Captures, Regex};

use crate::id;
use crate::module::{StyleImport, StyleImportKind, StyleModule};
use crate::sourcemap::SourceMap;

static IMPORT_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@import\s+(?:url\(\s*(?:"([^"]*)"|'([^']*)'|([^)\s]*))\s*\)|"([^"]*)"|'([^']*)')[^;]*;?"#,
    )
    .unwrap_or_else(|error| panic!("invalid @import pattern: {error}"))
});

static URL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)\s]*))\s*\)"#)
        .unwrap_or_else(|error| panic!("invalid url() pattern: {error}"))
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)/\*.*?\*/").unwrap_or_else(|error| panic!("invalid comment pattern: {error}"))
});

/// Extract dependencies from a stylesheet.
pub fn extract_style(content: Arc<str>, map: Option<SourceMap>) -> StyleModule {
    let comments: Vec<Span> = COMMENT
        .find_iter(&content)
        .map(|m| Span::new(m.start() as u32, m.end() as u32))
        .collect();
    let in_comment = |start: usize| {
        comments
            .iter()
            .any(|comment| (comment.start as usize) <= start && start < comment.end as usize)
    };

    let mut imports = Vec::new();
    let mut rule_spans = Vec::new();
    for captures in IMPORT_RULE.captures_iter(&content) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if in_comment(whole.start()) {
            continue;
        }
        let span = Span::new(whole.start() as u32, whole.end() as u32);
        rule_spans.push(span);
        if let Some(source) = first_capture(&captures).filter(|source| is_local(source)) {
            imports.push(StyleImport {
                source,
                kind: StyleImportKind::Rule,
                span,
            });
        }
    }

    for captures in URL_TOKEN.captures_iter(&content) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let start = whole.start() as u32;
        if in_comment(whole.start())
            || rule_spans
                .iter()
                .any(|rule| rule.start <= start && start < rule.end)
        {
            continue;
        }
        if let Some(source) = first_capture(&captures).filter(|source| is_local(source)) {
            imports.push(StyleImport {
                source,
                kind: StyleImportKind::Url,
                span: Span::new(start, whole.end() as u32),
            });
        }
    }

    imports.sort_by_key(|import| import.span.start);
    let specifiers: IndexSet<String> = imports.iter().map(|import| import.source.clone()).collect();

    StyleModule {
        content,
        map,
        imports,
        specifiers: specifiers.into_iter().collect(),
    }
}

fn first_capture(captures: &Captures<'_>) -> Option<String> {
    captures
        .iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str().trim().to_string())
}

fn is_local(source: &str) -> bool {
    !(source.is_empty()
        || source.starts_with('#')
        || source.starts_with("//")
        || id::is_opaque(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_imports_and_urls_in_order() {
        let css = r#"@import "./reset.css";
@import url('theme.css') screen;
.logo { background: url(./logo.png); }
.font { src: url("/fonts/a.woff2") format("woff2"); }"#;
        let style = extract_style(Arc::from(css), None);

        let found: Vec<(&str, StyleImportKind)> = style
            .imports
            .iter()
            .map(|import| (import.source.as_str(), import.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                ("./reset.css", StyleImportKind::Rule),
                ("theme.css", StyleImportKind::Rule),
                ("./logo.png", StyleImportKind::Url),
                ("/fonts/a.woff2", StyleImportKind::Url),
            ]
        );
        assert_eq!(&css[style.imports[0].span.start as usize..style.imports[0].span.end as usize], r#"@import "./reset.css";"#);
    }

    #[test]
    fn skips_data_fragments_remote_and_comments() {
        let css = r#"/* @import "./old.css"; */
.a { background: url(data:image/png;base64,AAAA); }
.b { filter: url(#blur); }
@import "https://fonts.example/x.css";
.c { background: url(//cdn.example/x.png); }"#;
        let style = extract_style(Arc::from(css), None);
        assert!(style.imports.is_empty());
        assert!(style.specifiers.is_empty());
    }

    #[test]
    fn dedupes_specifiers() {
        let css = ".a { background: url(./x.png); } .b { background: url('./x.png'); }";
        let style = extract_style(Arc::from(css), None);
        assert_eq!(style.imports.len(), 2);
        assert_eq!(style.specifiers, vec!["./x.png".to_string()]);
    }
}
