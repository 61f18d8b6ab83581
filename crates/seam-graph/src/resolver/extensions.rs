//! File and directory probing.
//!
//! This module handles the two filesystem-shaped steps of resolution: trying
//! extension variants of a path, and treating a path as a package directory.

use serde::Deserialize;

use super::ResolveOptions;
use crate::asset::AssetStore;
use crate::id;

/// Upper bound on `main` indirections followed for one specifier.
pub const MAX_MAIN_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Resolve `path` as a file.
///
/// Extension aliases are tried first: when `path` ends with an aliased
/// extension, each candidate extension is substituted in order and the first
/// existing file wins. Then the exact path, then `path + ext` for every
/// configured extension in order.
pub fn resolve_file(path: &str, options: &ResolveOptions, store: &dyn AssetStore) -> Option<String> {
    if let Some(found) = try_extension_alias(path, options, store) {
        return Some(found);
    }

    if store.exists(path) {
        return Some(path.to_string());
    }

    options
        .extensions
        .iter()
        .map(|ext| format!("{path}{ext}"))
        .find(|candidate| store.exists(candidate))
}

fn try_extension_alias(
    path: &str,
    options: &ResolveOptions,
    store: &dyn AssetStore,
) -> Option<String> {
    let (extension, candidates) = options
        .extension_alias
        .iter()
        .find(|(extension, _)| path.ends_with(extension.as_str()))?;
    let stem = &path[..path.len() - extension.len()];

    candidates
        .iter()
        .map(|candidate| format!("{stem}{candidate}"))
        .find(|candidate| store.exists(candidate))
}

/// Resolve `path` as a directory.
///
/// A `package.json` with a `main` field redirects to `<path>/<main>`, which is
/// resolved as a file and then as a directory. Without one, `<path>/index` is
/// probed as a file.
pub fn resolve_directory(
    path: &str,
    options: &ResolveOptions,
    store: &dyn AssetStore,
    depth: usize,
) -> Option<String> {
    if depth > MAX_MAIN_DEPTH {
        tracing::warn!(path, "package main chain too deep, giving up");
        return None;
    }

    let dir = format!("{}/", path.trim_end_matches('/'));

    if let Some(main) = read_main(&format!("{dir}package.json"), store) {
        let target = id::join(&dir, &main);
        if let Some(found) = resolve_file(&target, options, store) {
            return Some(found);
        }
        if target != path {
            if let Some(found) = resolve_directory(&target, options, store, depth + 1) {
                return Some(found);
            }
        }
    }

    resolve_file(&format!("{dir}index"), options, store)
}

fn read_main(manifest_id: &str, store: &dyn AssetStore) -> Option<String> {
    let asset = store.get(manifest_id)?;
    let text = asset.content.as_text()?;
    match serde_json::from_str::<PackageManifest>(text) {
        Ok(manifest) => manifest.main.filter(|main| !main.is_empty()),
        Err(error) => {
            tracing::debug!(manifest = manifest_id, %error, "ignoring unreadable package.json");
            None
        }
    }
}
