//! # seam
//!
//! An ES module bundler core: resolves specifiers, builds the dependency
//! graph through a plugin pipeline, and links every module into one
//! collision-free script (plus a stylesheet) with merged source maps.
//!
//! This crate ties the pieces together:
//!
//! - [`BundleConfig`] / [`ConfigDiscovery`]: configuration from code, a
//!   `seam.toml`, a `package.json` field, or `SEAM_*` environment variables.
//! - [`Bundler`]: graph build (cached between runs) followed by linking.
//! - [`Error`]: every failure, as a [`miette::Diagnostic`].
//! - [`logging`]: log levels, and subscriber setup with the `logging` feature.
//!
//! Lower-level building blocks live in [`seam_graph`] and [`seam_link`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use seam::{BundleConfig, bundle};
//! use seam_graph::MemoryAssetStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> seam::Result<()> {
//! let store = Arc::new(MemoryAssetStore::from_files([
//!     ("/src/index.js", "import data from './data.json';\nconsole.log(data.name);\n"),
//!     ("/src/data.json", r#"{ "name": "seam" }"#),
//! ]));
//!
//! let output = bundle(BundleConfig::new("/src/index.js").file("bundle.js"), store).await?;
//! assert!(output.script.content.contains("const data_default = {\"name\":\"seam\"};"));
//! assert!(output.script.map_json().is_some());
//! # Ok(())
//! # }
//! ```

pub mod bundler;
pub mod config;
pub mod error;
pub mod logging;

pub use bundler::{BundleOutput, Bundler, bundle};
pub use config::{BundleConfig, ConfigDiscovery};
pub use error::{ConfigError, Error, Result};
pub use logging::LogLevel;

pub use seam_graph;
pub use seam_link;
