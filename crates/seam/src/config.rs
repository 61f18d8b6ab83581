//! Bundle configuration.
//!
//! A [`BundleConfig`] can be built in code, from an in-memory JSON value, or
//! loaded from disk. File loading layers, lowest priority first:
//!
//! 1. defaults,
//! 2. `seam.toml`,
//! 3. `SEAM_`-prefixed environment variables (`SEAM_ENTRY`,
//!    `SEAM_SOURCE_MAP`, `SEAM_MODULE_COMMENTS`, `SEAM_FILE`,
//!    `SEAM_LOG_LEVEL`).

use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Toml};
use seam_graph::ResolveOptions;
use seam_link::LinkOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Configuration file name searched by [`ConfigDiscovery`].
pub const CONFIG_FILE: &str = "seam.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "SEAM_";

/// `package.json` field holding an inline configuration.
pub const PACKAGE_FIELD: &str = "seam";

/// Everything one bundling run needs.
///
/// Keys are snake_case, matching `seam.toml` and the environment; JSON
/// values may use the camelCase spellings. The nested `resolve` table keeps
/// [`ResolveOptions`]' own camelCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Entry specifier, resolved like any import from `/`.
    pub entry: String,
    pub resolve: ResolveOptions,
    #[serde(alias = "sourceMap")]
    pub source_map: bool,
    #[serde(alias = "moduleComments")]
    pub module_comments: bool,
    /// `file` field of the emitted source maps.
    pub file: Option<String>,
    /// Applied by [`Bundler::new`](crate::Bundler::new) with the `logging`
    /// feature; without it the host's subscriber decides what is shown.
    #[serde(alias = "logLevel")]
    pub log_level: LogLevel,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            entry: String::new(),
            resolve: ResolveOptions::default(),
            source_map: true,
            module_comments: true,
            file: None,
            log_level: LogLevel::default(),
        }
    }
}

impl BundleConfig {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            ..Self::default()
        }
    }

    pub fn resolve(mut self, resolve: ResolveOptions) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }

    pub fn module_comments(mut self, enabled: bool) -> Self {
        self.module_comments = enabled;
        self
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Load from an optional TOML file plus the environment.
    ///
    /// A missing file is the same as an empty one.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "loading configuration file");
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment
            .extract()
            .map_err(|error| ConfigError::Invalid(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build from an in-memory value, such as the `"seam"` field of a
    /// `package.json`.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_value(value).map_err(|error| ConfigError::Invalid(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Schema checks that need no filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry.trim().is_empty() {
            return Err(ConfigError::NoEntry);
        }
        let aliased = self.resolve.extension_alias.iter().flat_map(|(from, to)| {
            std::iter::once(from).chain(to.iter())
        });
        if let Some(extension) = self
            .resolve
            .extensions
            .iter()
            .chain(aliased)
            .find(|extension| !extension.starts_with('.'))
        {
            return Err(ConfigError::InvalidExtension(extension.clone()));
        }
        Ok(())
    }

    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            source_map: self.source_map,
            module_comments: self.module_comments,
            file: self.file.clone(),
        }
    }
}

/// Finds the configuration of a project directory.
///
/// # Example
///
/// ```no_run
/// use seam::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load().unwrap();
/// println!("bundling {}", config.entry);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// `seam.toml` first, then a `package.json` with a `seam` field.
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(CONFIG_FILE);
        if toml_path.is_file() {
            return Some(toml_path);
        }

        let package_path = self.root.join("package.json");
        let content = fs::read_to_string(&package_path).ok()?;
        let parsed: Value = serde_json::from_str(&content).ok()?;
        parsed
            .get(PACKAGE_FIELD)
            .is_some_and(|field| !field.is_null())
            .then_some(package_path)
    }

    pub fn load(&self) -> Result<BundleConfig, ConfigError> {
        let path = self
            .find()
            .ok_or_else(|| ConfigError::NotFound(self.root.clone()))?;
        if path.file_name().is_some_and(|name| name == "package.json") {
            return self.load_package_json(&path);
        }
        BundleConfig::load(Some(&path))
    }

    fn load_package_json(&self, path: &Path) -> Result<BundleConfig, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut parsed: Value = serde_json::from_str(&content)
            .map_err(|error| ConfigError::Invalid(format!("{}: {error}", path.display())))?;
        let value = parsed
            .get_mut(PACKAGE_FIELD)
            .map(Value::take)
            .ok_or_else(|| ConfigError::Invalid(format!("{} has no \"seam\" field", path.display())))?;
        BundleConfig::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use figment::Jail;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn from_value_fills_defaults() {
        let config = BundleConfig::from_value(json!({
            "entry": "/src/index.js",
            "moduleComments": false,
            "resolve": { "aliases": { "@": "/src" } }
        }))
        .unwrap();

        assert_eq!(config.entry, "/src/index.js");
        assert!(config.source_map);
        assert!(!config.module_comments);
        assert_eq!(config.resolve.aliases.get("@").map(String::as_str), Some("/src"));
        assert_eq!(config.resolve.extensions, vec![".js", ".mjs", ".json", ".css"]);
    }

    #[test]
    fn validation_rejects_missing_entry_and_bare_extensions() {
        assert!(matches!(
            BundleConfig::from_value(json!({})),
            Err(ConfigError::NoEntry)
        ));
        assert!(matches!(
            BundleConfig::from_value(json!({
                "entry": "/main.js",
                "resolve": { "extensions": [".js", "mjs"] }
            })),
            Err(ConfigError::InvalidExtension(extension)) if extension == "mjs"
        ));
        assert!(matches!(
            BundleConfig::from_value(json!({ "entry": 3 })),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn environment_overrides_the_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "seam.toml",
                r#"
                entry = "/src/main.js"
                file = "app.js"
                log_level = "debug"

                [resolve.aliases]
                "@" = "/src"
                "#,
            )?;
            jail.set_env("SEAM_SOURCE_MAP", "false");
            jail.set_env("SEAM_ENTRY", "/src/other.js");

            let config = BundleConfig::load(Some(Path::new("seam.toml"))).expect("loads");
            assert_eq!(config.entry, "/src/other.js");
            assert!(!config.source_map);
            assert_eq!(config.file.as_deref(), Some("app.js"));
            assert_eq!(config.log_level, LogLevel::Debug);
            assert_eq!(config.resolve.aliases.len(), 1);
            Ok(())
        });
    }

    #[test]
    fn discovery_prefers_seam_toml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "seam": { "entry": "/pkg.js" } }"#).unwrap();
        let discovery = ConfigDiscovery::new(dir.path());
        assert_eq!(discovery.find(), Some(dir.path().join("package.json")));
        assert_eq!(discovery.load().unwrap().entry, "/pkg.js");

        fs::write(dir.path().join(CONFIG_FILE), "entry = \"/toml.js\"\n").unwrap();
        assert_eq!(discovery.find(), Some(dir.path().join(CONFIG_FILE)));
    }

    #[test]
    fn discovery_ignores_package_json_without_field() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "app", "seam": null }"#).unwrap();
        let discovery = ConfigDiscovery::new(dir.path());
        assert!(discovery.find().is_none());
        assert!(matches!(discovery.load(), Err(ConfigError::NotFound(_))));
    }
}
