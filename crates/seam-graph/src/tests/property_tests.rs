//! Property-based tests for resolution and id handling.

use proptest::prelude::*;

use super::super::{MemoryAssetStore, ResolveOptions, Resolver, id};

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,8}"
}

fn path_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment(), 1..=4)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// An aliased specifier resolves exactly like its substituted form.
    #[test]
    fn alias_is_equivalent_to_substitution(parts in path_strategy()) {
        let relative = parts.join("/");
        let store = MemoryAssetStore::from_files([(format!("/src/{relative}.js"), "")]);
        let aliased = Resolver::new(ResolveOptions::default().alias("@", "/src"));

        let via_alias = aliased.resolve(&format!("@/{relative}"), "/other/", &store);
        let direct = Resolver::default().resolve(&format!("/src/{relative}"), "/other/", &store);
        prop_assert_eq!(via_alias.clone(), direct);
        prop_assert_eq!(via_alias, Some(format!("/src/{relative}.js")));
    }

    /// A resolved id resolves to itself.
    #[test]
    fn resolution_is_idempotent(parts in path_strategy(), ext in prop::sample::select(vec![".js", ".mjs", ".css", ".json"])) {
        let file = format!("/{}{ext}", parts.join("/"));
        let store = MemoryAssetStore::from_files([(file.clone(), "")]);
        let resolver = Resolver::default();

        let stem = &file[..file.len() - ext.len()];
        let first = resolver.resolve(stem, "/", &store);
        prop_assert_eq!(first.as_deref(), Some(file.as_str()));
        let second = resolver.resolve(&file, "/", &store);
        prop_assert_eq!(second, first);
    }

    /// The first configured extension that exists wins.
    #[test]
    fn extension_order_decides_ties(name in segment(), json_first in any::<bool>()) {
        let store = MemoryAssetStore::from_files([
            (format!("/lib/{name}.js"), ""),
            (format!("/lib/{name}.json"), "{}"),
        ]);
        let extensions = if json_first { [".json", ".js"] } else { [".js", ".json"] };
        let resolver = Resolver::new(ResolveOptions::default().extensions(extensions));

        let resolved = resolver.resolve(&format!("./{name}"), "/lib/", &store);
        prop_assert_eq!(resolved, Some(format!("/lib/{name}{}", extensions[0])));
    }

    /// Normalizing twice changes nothing.
    #[test]
    fn normalize_is_idempotent(parts in prop::collection::vec(prop_oneof![segment(), Just("..".to_string()), Just(".".to_string())], 1..=6)) {
        let path = format!("/{}", parts.join("/"));
        let once = id::normalize(&path);
        prop_assert_eq!(id::normalize(&once), once.clone());
        prop_assert!(once.starts_with('/'));
    }

    /// Joining a relative file onto an importer's directory lands next to it.
    #[test]
    fn join_with_dirname_is_sibling(parts in path_strategy(), file in segment()) {
        let importer = format!("/{}.js", parts.join("/"));
        let joined = id::join(&id::dirname(&importer), &format!("./{file}.js"));
        prop_assert_eq!(id::dirname(&joined), id::dirname(&importer));
    }
}
