//! Source-map primitives shared by the pipeline and the linker.
//!
//! Maps are stored as [`oxc_sourcemap::SourceMap`]. Everything here works in
//! zero-based lines and UTF-16 columns, which is what the v3 format encodes.

use indexmap::{IndexMap, IndexSet};
pub use oxc_sourcemap::SourceMap;
use oxc_sourcemap::SourceMapBuilder;

/// Byte offset to line/column conversion for one text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(index, _)| index + 1),
        );
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Zero-based `(line, utf16 column)` of a byte offset.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let start = self.line_starts[line];
        let column = self
            .text
            .get(start..offset)
            .map_or(0, |slice| slice.encode_utf16().count());
        (line as u32, column as u32)
    }

    /// Text of a zero-based line, without its terminator.
    pub fn line(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        Some(self.text[start..end].trim_end_matches('\r'))
    }
}

/// A decoded mapping; `source` and `name` index into the owning map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub dst_line: u32,
    pub dst_col: u32,
    pub src_line: u32,
    pub src_col: u32,
    pub source: Option<u32>,
    pub name: Option<u32>,
}

/// Generated-position lookup over one map.
///
/// Finds the mapping in effect at a generated position: the last mapping on
/// the same line whose column is not past the queried column.
#[derive(Debug)]
pub struct TokenLookup<'m> {
    map: &'m SourceMap,
    tokens: Vec<ResolvedToken>,
}

impl<'m> TokenLookup<'m> {
    pub fn new(map: &'m SourceMap) -> Self {
        let mut tokens: Vec<ResolvedToken> = map
            .get_tokens()
            .map(|token| ResolvedToken {
                dst_line: token.get_dst_line(),
                dst_col: token.get_dst_col(),
                src_line: token.get_src_line(),
                src_col: token.get_src_col(),
                source: token.get_source_id(),
                name: token.get_name_id(),
            })
            .collect();
        tokens.sort_by_key(|token| (token.dst_line, token.dst_col));
        Self { map, tokens }
    }

    pub fn find(&self, line: u32, column: u32) -> Option<&ResolvedToken> {
        let index = self
            .tokens
            .partition_point(|token| (token.dst_line, token.dst_col) <= (line, column));
        let token = self.tokens.get(index.checked_sub(1)?)?;
        (token.dst_line == line).then_some(token)
    }

    pub fn tokens(&self) -> &[ResolvedToken] {
        &self.tokens
    }

    pub fn source(&self, id: u32) -> Option<String> {
        self.map.get_source(id).map(|source| source.to_string())
    }

    pub fn source_content(&self, id: u32) -> Option<String> {
        self.map
            .get_source_content(id)
            .map(|content| content.to_string())
    }

    pub fn name(&self, id: u32) -> Option<String> {
        self.map.get_name(id).map(|name| name.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RawToken {
    dst_line: u32,
    dst_col: u32,
    src_line: u32,
    src_col: u32,
    source: Option<u32>,
    name: Option<u32>,
}

/// Accumulates mappings from several inputs into one map.
///
/// Sources and names are deduplicated; tokens may be added in any order and
/// are sorted when the map is finished.
#[derive(Debug, Default)]
pub struct MapWriter {
    sources: IndexMap<String, Option<String>>,
    names: IndexSet<String>,
    tokens: Vec<RawToken>,
}

impl MapWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, returning its index. Content is kept from the first
    /// registration that provides it.
    pub fn add_source(&mut self, source: &str, content: Option<&str>) -> u32 {
        let entry = self.sources.entry(source.to_string());
        let index = entry.index();
        let slot = entry.or_insert(None);
        if slot.is_none() {
            *slot = content.map(str::to_string);
        }
        index as u32
    }

    pub fn add_name(&mut self, name: &str) -> u32 {
        self.names.insert_full(name.to_string()).0 as u32
    }

    pub fn add_mapping(
        &mut self,
        dst: (u32, u32),
        src: (u32, u32),
        source: Option<u32>,
        name: Option<u32>,
    ) {
        self.tokens.push(RawToken {
            dst_line: dst.0,
            dst_col: dst.1,
            src_line: src.0,
            src_col: src.1,
            source,
            name,
        });
    }

    /// Register source `id` of `lookup`'s map in this writer.
    pub fn import_source(&mut self, lookup: &TokenLookup<'_>, id: u32) -> Option<u32> {
        let source = lookup.source(id)?;
        let content = lookup.source_content(id);
        Some(self.add_source(&source, content.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn finish(mut self, file: Option<&str>) -> SourceMap {
        self.tokens.sort();
        self.tokens
            .dedup_by_key(|token| (token.dst_line, token.dst_col));

        let mut builder = SourceMapBuilder::default();
        if let Some(file) = file {
            builder.set_file(file);
        }
        for (source, content) in &self.sources {
            builder.add_source_and_content(source, content.as_deref().unwrap_or_default());
        }
        for name in &self.names {
            builder.add_name(name);
        }
        for token in &self.tokens {
            builder.add_token(
                token.dst_line,
                token.dst_col,
                token.src_line,
                token.src_col,
                token.source,
                token.name,
            );
        }
        builder.into_sourcemap()
    }
}

/// Compose two stages of mappings into one.
///
/// `first` maps stage-1 output back to the original; `second` maps stage-2
/// output back to stage-1 output. The result maps stage-2 output straight to
/// the original. Each token of `second` is traced through the generated
/// positions of `first`; tokens with no counterpart are dropped.
pub fn compose(first: &SourceMap, second: &SourceMap) -> SourceMap {
    let first_lookup = TokenLookup::new(first);
    let second_lookup = TokenLookup::new(second);
    let mut writer = MapWriter::new();

    for token in second_lookup.tokens() {
        let Some(origin) = first_lookup.find(token.src_line, token.src_col) else {
            continue;
        };
        let src = (
            origin.src_line,
            origin.src_col + (token.src_col - origin.dst_col),
        );
        let source = origin
            .source
            .and_then(|id| writer.import_source(&first_lookup, id));
        let name = origin
            .name
            .and_then(|id| first_lookup.name(id))
            .or_else(|| token.name.and_then(|id| second_lookup.name(id)))
            .map(|name| writer.add_name(&name));
        writer.add_mapping((token.dst_line, token.dst_col), src, source, name);
    }

    writer.finish(None)
}
