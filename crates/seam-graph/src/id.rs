//! Canonical module identifiers.
//!
//! Every module in a [`DependencyGraph`](crate::DependencyGraph) is keyed by
//! exactly one canonical id. An id is one of:
//!
//! - an absolute path rooted at `/` (`/src/index.js`)
//! - a `virtual:` pseudo-path for synthesized modules (`virtual:empty`, `virtual:/gen/a.js`)
//! - an absolute URL for remote assets (`https://cdn.example/x.js`)
//! - a `data:` or `blob:` URI
//!
//! Ids are plain strings with `/` separators regardless of the host platform;
//! path normalization goes through `path-clean`.

use std::path::Path;

use path_clean::PathClean;

/// Prefix used for synthesized module ids.
pub const VIRTUAL_PREFIX: &str = "virtual:";

/// Sentinel id of the built-in empty module that `false` fallbacks resolve to.
pub const EMPTY_MODULE: &str = "virtual:empty";

/// Returns `true` for `scheme://...` URLs.
pub fn is_url(specifier: &str) -> bool {
    let Some((scheme, rest)) = specifier.split_once("://") else {
        return false;
    };
    !scheme.is_empty()
        && !rest.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Returns `true` for `data:` and `blob:` URIs.
pub fn is_data_uri(specifier: &str) -> bool {
    specifier.starts_with("data:") || specifier.starts_with("blob:")
}

/// Ids that are their own canonical form and never enter file resolution.
pub fn is_opaque(specifier: &str) -> bool {
    is_url(specifier) || is_data_uri(specifier)
}

pub fn is_virtual(id: &str) -> bool {
    id.starts_with(VIRTUAL_PREFIX)
}

/// Returns `true` when the specifier names a package rather than a path.
pub fn is_bare(specifier: &str) -> bool {
    !(specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || specifier.starts_with('/')
        || is_virtual(specifier)
        || is_opaque(specifier))
}

/// Strip a trailing `?query` from a specifier. The query is not part of identity.
pub fn strip_query(specifier: &str) -> &str {
    if is_data_uri(specifier) {
        return specifier;
    }
    match specifier.find('?') {
        Some(index) => &specifier[..index],
        None => specifier,
    }
}

/// Normalize `.` and `..` segments, keeping any `virtual:` prefix.
pub fn normalize(id: &str) -> String {
    if is_opaque(id) {
        return id.to_string();
    }
    if let Some(rest) = id.strip_prefix(VIRTUAL_PREFIX) {
        if !rest.starts_with('/') {
            return id.to_string();
        }
        return format!("{VIRTUAL_PREFIX}{}", clean(rest));
    }
    clean(id)
}

/// Join a relative specifier onto a base directory.
///
/// Works identically for real directories (`/src/`), virtual ones
/// (`virtual:/gen/`) and URL directories (`https://cdn.dev/pkg/`).
pub fn join(base_dir: &str, relative: &str) -> String {
    if is_url(base_dir) {
        let authority = base_dir.find("://").map_or(0, |index| index + 3);
        let path_start = base_dir[authority..]
            .find('/')
            .map_or(base_dir.len(), |index| authority + index);
        let (origin, path) = base_dir.split_at(path_start);
        return format!("{origin}{}", clean(&join_plain(path, relative)));
    }
    if let Some(rest) = base_dir.strip_prefix(VIRTUAL_PREFIX) {
        let rooted = if rest.starts_with('/') {
            rest.to_string()
        } else {
            format!("/{rest}")
        };
        return format!("{VIRTUAL_PREFIX}{}", clean(&join_plain(&rooted, relative)));
    }
    clean(&join_plain(base_dir, relative))
}

fn join_plain(base_dir: &str, relative: &str) -> String {
    if relative.starts_with('/') {
        return relative.to_string();
    }
    let base = if base_dir.is_empty() { "/" } else { base_dir };
    if base.ends_with('/') {
        format!("{base}{relative}")
    } else {
        format!("{base}/{relative}")
    }
}

fn clean(path: &str) -> String {
    let cleaned = Path::new(path).clean();
    let text = cleaned.to_string_lossy().replace('\\', "/");
    if text.starts_with('/') {
        text
    } else {
        format!("/{}", text.trim_start_matches("./"))
    }
}

/// Directory containing a module, used as the base for its relative imports.
pub fn dirname(id: &str) -> String {
    if is_url(id) {
        return match id.rfind('/') {
            Some(index) => id[..=index].to_string(),
            None => format!("{id}/"),
        };
    }
    match id.rfind('/') {
        Some(index) => id[..=index].to_string(),
        None => "/".to_string(),
    }
}

/// Extension of the last path segment, without the dot.
pub fn extension(id: &str) -> Option<&str> {
    let path = strip_query(id);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let segment = segment.strip_prefix(VIRTUAL_PREFIX).unwrap_or(segment);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// An identifier-safe stem derived from an id (`/src/my-utils.js` → `my_utils`).
///
/// Used as the base for names the linker synthesizes on behalf of a module.
pub fn identifier_stem(id: &str) -> String {
    let path = strip_query(id);
    let segment = path
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(path);
    let stem = match segment.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };
    let mut ident: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if ident.is_empty() {
        ident.push_str("module");
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
