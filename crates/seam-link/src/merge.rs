//! Source-map merging for assembled bundles.
//!
//! Each module is rendered on its own and then appended to the bundle at a
//! known line/column. The merger shifts the module's [`Segment`]s by that
//! offset and traces them through the module's incoming map, so the output
//! points at the true original file. A module without an incoming map is its
//! own original: its segments map straight onto its text, which is embedded
//! as `sourcesContent`.

use seam_graph::sourcemap::{MapWriter, SourceMap, TokenLookup};

use crate::editor::{Rendered, advance};

#[derive(Debug, Default)]
pub struct SourceMapMerger {
    writer: MapWriter,
    line: u32,
    column: u32,
}

impl SourceMapMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current bundle position, zero-based line and UTF-16 column.
    pub fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    /// Account for bundle text that maps to nothing (helpers, comments,
    /// synthesized objects).
    pub fn skip(&mut self, text: &str) {
        advance(&mut self.line, &mut self.column, text);
    }

    /// Append a rendered module.
    ///
    /// `content` is the text the module was rendered from and `map` traces
    /// that text back to its original source, when the pipeline changed it.
    pub fn add_module(
        &mut self,
        id: &str,
        content: &str,
        map: Option<&SourceMap>,
        rendered: &Rendered,
    ) {
        match map {
            Some(map) => self.add_traced(map, rendered),
            None => self.add_identity(id, content, rendered),
        }
        self.skip(&rendered.code);
    }

    fn bundle_position(&self, generated: (u32, u32)) -> (u32, u32) {
        if generated.0 == 0 {
            (self.line, self.column + generated.1)
        } else {
            (self.line + generated.0, generated.1)
        }
    }

    fn add_identity(&mut self, id: &str, content: &str, rendered: &Rendered) {
        let source = self.writer.add_source(id, Some(content));
        for segment in &rendered.segments {
            let name = segment.name.as_deref().map(|name| self.writer.add_name(name));
            let dst = self.bundle_position(segment.generated);
            self.writer
                .add_mapping(dst, segment.original, Some(source), name);
        }
    }

    fn add_traced(&mut self, map: &SourceMap, rendered: &Rendered) {
        let lookup = TokenLookup::new(map);
        for segment in &rendered.segments {
            let (line, column) = segment.original;
            let Some(origin) = lookup.find(line, column) else {
                continue;
            };
            let src = (origin.src_line, origin.src_col + (column - origin.dst_col));
            let source = origin
                .source
                .and_then(|id| self.writer.import_source(&lookup, id));
            let name = origin
                .name
                .and_then(|id| lookup.name(id))
                .or_else(|| segment.name.clone())
                .map(|name| self.writer.add_name(&name));
            let dst = self.bundle_position(segment.generated);
            self.writer.add_mapping(dst, src, source, name);
        }
    }

    pub fn finish(self, file: Option<&str>) -> SourceMap {
        self.writer.finish(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::TextEditor;

    fn lookup_source(map: &SourceMap, line: u32, column: u32) -> Option<(String, u32, u32)> {
        let lookup = TokenLookup::new(map);
        let token = lookup.find(line, column)?;
        let source = lookup.source(token.source?)?;
        Some((source, token.src_line, token.src_col))
    }

    #[test]
    fn identity_modules_map_line_for_line() {
        let first = "const a = 1;\nconst b = 2;\n";
        let second = "console.log(a);\nconsole.log(b);\n";

        let mut merger = SourceMapMerger::new();
        merger.skip("var helper;\n");
        merger.add_module("/a.js", first, None, &TextEditor::new(first).render());
        merger.skip("// /b.js\n");
        merger.add_module("/b.js", second, None, &TextEditor::new(second).render());
        assert_eq!(merger.position(), (6, 0));
        let map = merger.finish(Some("bundle.js"));

        assert_eq!(lookup_source(&map, 1, 0), Some(("/a.js".to_string(), 0, 0)));
        assert_eq!(lookup_source(&map, 2, 6), Some(("/a.js".to_string(), 1, 0)));
        assert_eq!(lookup_source(&map, 4, 0), Some(("/b.js".to_string(), 0, 0)));
        assert_eq!(lookup_source(&map, 5, 3), Some(("/b.js".to_string(), 1, 0)));
        assert_eq!(lookup_source(&map, 0, 0), None);
        assert_eq!(map.get_source_content(0).map(|c| c.to_string()), Some(first.to_string()));
    }

    #[test]
    fn incoming_maps_are_traced_to_the_original() {
        // The module text is a transform output whose line 0 came from line 4
        // of `/src/app.ts`.
        let mut writer = MapWriter::new();
        let source = writer.add_source("/src/app.ts", Some("...original..."));
        writer.add_mapping((0, 0), (4, 2), Some(source), None);
        let incoming = writer.finish(None);

        let content = "run();\n";
        let mut merger = SourceMapMerger::new();
        merger.skip("// header\n");
        merger.add_module("/src/app.js", content, Some(&incoming), &TextEditor::new(content).render());
        let map = merger.finish(None);

        assert_eq!(lookup_source(&map, 1, 0), Some(("/src/app.ts".to_string(), 4, 2)));
        assert_eq!(lookup_source(&map, 1, 3), Some(("/src/app.ts".to_string(), 4, 2)));
    }

    #[test]
    fn renamed_identifiers_keep_their_original_name() {
        let content = "use(a);";
        let mut editor = TextEditor::new(content);
        editor.rename(&seam_graph::Site::new(4, 5), "a", "a$1");
        let mut merger = SourceMapMerger::new();
        merger.add_module("/m.js", content, None, &editor.render());
        let map = merger.finish(None);

        let lookup = TokenLookup::new(&map);
        let token = lookup.find(0, 4).unwrap();
        assert_eq!(token.name.and_then(|id| lookup.name(id)).as_deref(), Some("a"));
    }
}
