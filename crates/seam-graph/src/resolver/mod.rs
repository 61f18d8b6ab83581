//! Specifier resolution.
//!
//! Maps an import specifier, as written, onto a canonical module id using only
//! the [`AssetStore`] to test for existence. Resolution never fails with an
//! error: `None` means "not found", and the caller decides whether that is
//! fatal.
//!
//! Steps, in order:
//! 1. Strip any `?query`
//! 2. URLs and `data:`/`blob:` URIs are returned as-is
//! 3. Alias substitution (exact match, then `alias/` prefix match)
//! 4. Working path: absolute, `/node_modules/<spec>` for core modules, or
//!    joined onto the base directory
//! 5. File resolution (extension aliases, exact path, extension probing)
//! 6. Directory resolution (`package.json` `main`, then `index`)
//! 7. Fallbacks, matched on the original specifier
//!
//! # Example
//!
//! ```rust
//! use seam_graph::{MemoryAssetStore, ResolveOptions, Resolver};
//!
//! let store = MemoryAssetStore::from_files([("/src/utils.js", "")]);
//! let resolver = Resolver::new(ResolveOptions::default().alias("@", "/src"));
//!
//! assert_eq!(resolver.resolve("@/utils", "/", &store).as_deref(), Some("/src/utils.js"));
//! assert_eq!(resolver.resolve("./missing", "/src/", &store), None);
//! ```

mod aliases;
mod extensions;
mod options;

pub use aliases::{find_entry, substitute, substitute_alias};
pub use extensions::{MAX_MAIN_DEPTH, resolve_directory, resolve_file};
pub use options::{DEFAULT_EXTENSIONS, Fallback, ResolveOptions};

use crate::asset::AssetStore;
use crate::id::{self, EMPTY_MODULE};

/// Upper bound on fallback re-entries for one specifier.
const MAX_FALLBACK_DEPTH: usize = 8;

/// Everything resolution depends on besides the store.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Directory of the importing module (`/src/`, `virtual:/gen/`).
    pub base_dir: &'a str,
    pub options: &'a ResolveOptions,
}

/// Resolve `specifier` within `context`.
pub fn resolve(
    specifier: &str,
    context: &ResolveContext<'_>,
    store: &dyn AssetStore,
) -> Option<String> {
    resolve_inner(specifier, context, store, 0)
}

fn resolve_inner(
    specifier: &str,
    context: &ResolveContext<'_>,
    store: &dyn AssetStore,
    depth: usize,
) -> Option<String> {
    let original = id::strip_query(specifier);
    if id::is_opaque(original) {
        return Some(original.to_string());
    }
    if original == EMPTY_MODULE {
        return Some(EMPTY_MODULE.to_string());
    }

    let options = context.options;
    let aliased = aliases::substitute_alias(original, &options.aliases);
    if let Some(target) = &aliased {
        if id::is_url(target) {
            return Some(target.clone());
        }
    }
    let working = aliased.as_deref().unwrap_or(original);

    let path = working_path(working, context);
    if id::is_url(&path) {
        return Some(path);
    }
    if let Some(found) = resolve_file(&path, options, store)
        .or_else(|| resolve_directory(&path, options, store, 0))
    {
        tracing::trace!(specifier, resolved = %found, "resolved");
        return Some(found);
    }

    resolve_fallback(original, context, store, depth)
}

fn working_path(specifier: &str, context: &ResolveContext<'_>) -> String {
    if specifier.starts_with('/') || id::is_virtual(specifier) {
        return id::normalize(specifier);
    }
    if id::is_bare(specifier) && context.options.include_core_modules {
        return id::normalize(&format!("/node_modules/{specifier}"));
    }
    id::join(context.base_dir, specifier)
}

fn resolve_fallback(
    original: &str,
    context: &ResolveContext<'_>,
    store: &dyn AssetStore,
    depth: usize,
) -> Option<String> {
    let (prefix, fallback) = aliases::find_entry(original, &context.options.fallbacks)?;
    match fallback {
        Fallback::Enabled(false) => {
            tracing::debug!(specifier = original, "fallback to empty module");
            Some(EMPTY_MODULE.to_string())
        }
        Fallback::Enabled(true) => None,
        Fallback::Module(target) => {
            if depth >= MAX_FALLBACK_DEPTH {
                tracing::warn!(specifier = original, "fallback chain too deep, giving up");
                return None;
            }
            let replacement = aliases::substitute(original, prefix, target);
            if replacement == original {
                return None;
            }
            tracing::debug!(specifier = original, %replacement, "trying fallback");
            resolve_inner(&replacement, context, store, depth + 1)
        }
    }
}

/// Resolver bound to one set of [`ResolveOptions`].
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve `specifier` relative to `base_dir`.
    pub fn resolve(
        &self,
        specifier: &str,
        base_dir: &str,
        store: &dyn AssetStore,
    ) -> Option<String> {
        let context = ResolveContext {
            base_dir,
            options: &self.options,
        };
        resolve(specifier, &context, store)
    }
}
