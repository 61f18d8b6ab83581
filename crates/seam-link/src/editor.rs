//! Span-based text rewriting with position tracking.
//!
//! Modules are never re-printed: the linker records replacements against the
//! original module text and [`TextEditor::render`] applies them in one pass.
//! While rendering, the editor emits a [`Segment`] at the start of every kept
//! chunk and of every line inside it, and one per renamed identifier, so the
//! output can be mapped back to the input text.

use seam_graph::Site;
use seam_graph::sourcemap::LineIndex;

/// One mapping from rendered output to the edited text.
///
/// Lines are zero-based; columns are UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub generated: (u32, u32),
    pub original: (u32, u32),
    /// Identifier name in the edited text, for renamed identifiers.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub code: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
struct Edit {
    start: u32,
    end: u32,
    text: String,
    name: Option<String>,
}

/// Collects replacements over one text.
///
/// Edits may be added in any order. An edit that starts inside a range an
/// earlier edit already consumed is dropped, so references inside a removed
/// statement need no special casing.
#[derive(Debug)]
pub struct TextEditor<'s> {
    source: &'s str,
    edits: Vec<Edit>,
}

impl<'s> TextEditor<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn replace(&mut self, start: u32, end: u32, text: impl Into<String>) {
        self.edits.push(Edit {
            start,
            end,
            text: text.into(),
            name: None,
        });
    }

    pub fn remove(&mut self, start: u32, end: u32) {
        self.replace(start, end, String::new());
    }

    /// Remove a statement together with the line break that follows it.
    pub fn remove_statement(&mut self, start: u32, end: u32) {
        let rest = self.source.get(end as usize..).unwrap_or_default();
        let trailing = if rest.starts_with("\r\n") {
            2
        } else if rest.starts_with('\n') {
            1
        } else {
            0
        };
        self.remove(start, end + trailing);
    }

    pub fn insert(&mut self, at: u32, text: impl Into<String>) {
        self.replace(at, at, text);
    }

    /// Rewrite one occurrence of an identifier.
    ///
    /// A shorthand property keeps its key: `{ a }` becomes `{ a: b }`.
    pub fn rename(&mut self, site: &Site, original: &str, name: &str) {
        let text = if site.shorthand {
            format!("{original}: {name}")
        } else {
            name.to_string()
        };
        self.edits.push(Edit {
            start: site.start,
            end: site.end,
            text,
            name: Some(original.to_string()),
        });
    }

    pub fn render(self) -> Rendered {
        let index = LineIndex::new(self.source);
        let mut edits = self.edits;
        edits.sort_by_key(|edit| edit.start);

        let mut output = Output::default();
        let mut cursor = 0usize;
        for edit in edits {
            let (start, end) = (edit.start as usize, edit.end as usize);
            if start < cursor || end < start || end > self.source.len() {
                tracing::trace!(start, end, cursor, "dropping overlapped edit");
                continue;
            }
            output.keep(&self.source[cursor..start], cursor, &index);
            if !edit.text.is_empty() {
                if let Some(name) = edit.name {
                    let generated = output.position();
                    output.segments.push(Segment {
                        generated,
                        original: index.position(start),
                        name: Some(name),
                    });
                }
                output.push(&edit.text);
            }
            cursor = end;
        }
        output.keep(&self.source[cursor..], cursor, &index);

        Rendered {
            code: output.code,
            segments: output.segments,
        }
    }
}

#[derive(Debug, Default)]
struct Output {
    code: String,
    segments: Vec<Segment>,
    line: u32,
    column: u32,
}

impl Output {
    fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    fn keep(&mut self, chunk: &str, offset: usize, index: &LineIndex<'_>) {
        let mut local = 0;
        for piece in chunk.split_inclusive('\n') {
            let generated = self.position();
            self.segments.push(Segment {
                generated,
                original: index.position(offset + local),
                name: None,
            });
            self.push(piece);
            local += piece.len();
        }
    }

    fn push(&mut self, text: &str) {
        self.code.push_str(text);
        advance(&mut self.line, &mut self.column, text);
    }
}

/// Move a `(line, utf16 column)` cursor past `text`.
pub(crate) fn advance(line: &mut u32, column: &mut u32, text: &str) {
    match text.rfind('\n') {
        Some(last) => {
            *line += text.matches('\n').count() as u32;
            *column = text[last + 1..].encode_utf16().count() as u32;
        }
        None => *column += text.encode_utf16().count() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_edits_in_position_order() {
        let source = "import a from './a';\nconst x = a;\nexport { x };\n";
        let mut editor = TextEditor::new(source);
        editor.rename(&Site::new(31, 32), "a", "a$1");
        editor.remove_statement(0, 20);
        editor.remove_statement(34, 47);
        assert_eq!(editor.render().code, "const x = a$1;\n");
    }

    #[test]
    fn edits_inside_removed_ranges_are_dropped() {
        let source = "export { a as b };\nuse(a);";
        let mut editor = TextEditor::new(source);
        editor.remove_statement(0, 18);
        editor.rename(&Site::new(9, 10), "a", "z");
        editor.rename(&Site::new(23, 24), "a", "z");
        assert_eq!(editor.render().code, "use(z);");
    }

    #[test]
    fn shorthand_keeps_the_key() {
        let source = "const o = { a, b };";
        let mut editor = TextEditor::new(source);
        editor.rename(&Site::new(12, 13).shorthand(true), "a", "a$1");
        assert_eq!(editor.render().code, "const o = { a: a$1, b };");
    }

    #[test]
    fn segments_track_lines_and_names() {
        let source = "let a = 1;\nlet b = a;\n";
        let mut editor = TextEditor::new(source);
        editor.insert(0, "// head\n");
        editor.rename(&Site::new(19, 20), "a", "alpha");
        let rendered = editor.render();

        assert_eq!(rendered.code, "// head\nlet a = 1;\nlet b = alpha;\n");
        assert!(rendered.segments.contains(&Segment {
            generated: (1, 0),
            original: (0, 0),
            name: None,
        }));
        assert!(rendered.segments.contains(&Segment {
            generated: (2, 8),
            original: (1, 8),
            name: Some("a".to_string()),
        }));
        assert!(rendered.segments.contains(&Segment {
            generated: (2, 13),
            original: (1, 9),
            name: None,
        }));
    }

    #[test]
    fn columns_count_utf16_units() {
        let source = "const s = '😀'; x;";
        let x = source.find("x;").unwrap() as u32;
        let mut editor = TextEditor::new(source);
        editor.rename(&Site::new(x, x + 1), "x", "y");
        let rendered = editor.render();
        let renamed = rendered
            .segments
            .iter()
            .find(|segment| segment.name.is_some())
            .unwrap();
        assert_eq!(renamed.generated, (0, 16));
        assert_eq!(renamed.original, (0, 16));
    }
}
