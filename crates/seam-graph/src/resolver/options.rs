//! Resolver configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default extensions probed when a specifier has none.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".mjs", ".json", ".css"];

/// Where a fallback sends a specifier that failed every other step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fallback {
    /// Re-enter resolution with this specifier (prefix substituted).
    Module(String),
    /// `false` resolves to the built-in empty module; `true` is a no-op.
    Enabled(bool),
}

impl Fallback {
    /// The intentional empty-module fallback.
    pub const EMPTY: Fallback = Fallback::Enabled(false);
}

/// Resolver configuration, deserializable from a config file.
///
/// Alias and fallback maps are ordered: the first matching entry wins and
/// entries are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveOptions {
    /// Specifier substitutions (`"@" → "/src"`).
    pub aliases: IndexMap<String, String>,

    /// Substitutions used when everything else fails.
    pub fallbacks: IndexMap<String, Fallback>,

    /// Extensions probed in order when the exact path is missing.
    pub extensions: Vec<String>,

    /// Extension rewrites tried before plain probing (`".js" → [".ts", ".js"]`).
    pub extension_alias: IndexMap<String, Vec<String>>,

    /// Resolve bare specifiers under `/node_modules/`.
    pub include_core_modules: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            aliases: IndexMap::new(),
            fallbacks: IndexMap::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            extension_alias: IndexMap::new(),
            include_core_modules: true,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.insert(from.into(), to.into());
        self
    }

    pub fn fallback(mut self, prefix: impl Into<String>, fallback: Fallback) -> Self {
        self.fallbacks.insert(prefix.into(), fallback);
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn extension_alias<I, S>(mut self, extension: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extension_alias.insert(
            extension.into(),
            candidates.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn include_core_modules(mut self, include: bool) -> Self {
        self.include_core_modules = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_false_and_string_fallbacks() {
        let options: ResolveOptions = serde_json::from_str(
            r#"{
                "aliases": { "@": "/src" },
                "fallbacks": { "fs": false, "path": "path-browserify" },
                "extensionAlias": { ".js": [".ts", ".js"] }
            }"#,
        )
        .unwrap();

        assert_eq!(options.aliases["@"], "/src");
        assert_eq!(options.fallbacks["fs"], Fallback::EMPTY);
        assert_eq!(
            options.fallbacks["path"],
            Fallback::Module("path-browserify".to_string())
        );
        assert_eq!(options.extension_alias[".js"], vec![".ts", ".js"]);
        assert_eq!(options.extensions, DEFAULT_EXTENSIONS);
        assert!(options.include_core_modules);
    }
}
