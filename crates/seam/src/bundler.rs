//! The build + link pipeline.

use std::sync::Arc;

use indexmap::IndexMap;
use seam_graph::{
    AssetStore, BuildStats, DependencyGraph, GraphBuilder, HookRegistry, JsonLoader, Resolver,
};
use seam_link::{Bundle, Linker};

use crate::config::BundleConfig;
use crate::error::Result;

/// What one bundling run emits.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub script: Bundle,
    /// Present when the graph contains stylesheets.
    pub style: Option<Bundle>,
    /// Names the entry module exports → final identifiers in `script`.
    pub entry_exports: IndexMap<String, String>,
    pub stats: BuildStats,
}

/// Builds the dependency graph of the configured entry and links it.
///
/// The module cache lives as long as the bundler, so repeated
/// [`bundle`](Self::bundle) calls only reload modules whose assets changed.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use seam::{BundleConfig, Bundler};
/// use seam_graph::MemoryAssetStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> seam::Result<()> {
/// let store = Arc::new(MemoryAssetStore::from_files([
///     ("/main.js", "import { n } from './n';\nconsole.log(n);\n"),
///     ("/n.js", "export const n = 1;\n"),
/// ]));
/// let mut bundler = Bundler::new(BundleConfig::new("/main.js").module_comments(false), store);
///
/// let output = bundler.bundle().await?;
/// assert_eq!(output.script.content, "const n = 1;\nconsole.log(n);\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bundler {
    config: BundleConfig,
    builder: GraphBuilder,
    linker: Linker,
}

impl Bundler {
    /// With the `logging` feature this also installs the subscriber at
    /// `config.log_level`, unless one was installed earlier.
    pub fn new(config: BundleConfig, store: Arc<dyn AssetStore>) -> Self {
        #[cfg(feature = "logging")]
        crate::logging::init_logging(config.log_level);

        let builder = GraphBuilder::new(store, Resolver::new(config.resolve.clone()))
            .with_hooks(with_builtin_loaders(HookRegistry::new()));
        let linker = Linker::new(config.link_options());
        Self {
            config,
            builder,
            linker,
        }
    }

    /// Replace the plugin hooks. The built-in JSON loader is appended after
    /// the given loaders.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.builder = self.builder.with_hooks(with_builtin_loaders(hooks));
        self
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        self.builder.store()
    }

    /// Build the graph without linking it.
    pub async fn build_graph(&mut self) -> Result<DependencyGraph> {
        Ok(self.builder.build(&self.config.entry).await?)
    }

    pub async fn bundle(&mut self) -> Result<BundleOutput> {
        let graph = self.build_graph().await?;
        let output = self.linker.link(&graph)?;
        tracing::info!(
            entry = %self.config.entry,
            modules = graph.len(),
            script_bytes = output.script.content.len(),
            "bundle complete"
        );
        Ok(BundleOutput {
            script: output.script,
            style: output.style,
            entry_exports: output.entry_exports,
            stats: graph.stats().clone(),
        })
    }
}

fn with_builtin_loaders(hooks: HookRegistry) -> HookRegistry {
    hooks.with_loader(Arc::new(JsonLoader))
}

/// Bundle `config.entry` from `store` in a one-off run.
pub async fn bundle(config: BundleConfig, store: Arc<dyn AssetStore>) -> Result<BundleOutput> {
    Bundler::new(config, store).bundle().await
}
