//! Top-level error type.
//!
//! [`Error`] wraps the graph, link and configuration errors and implements
//! [`miette::Diagnostic`] with one stable code per failure kind, so a CLI can
//! render any of them with `miette::Report::new(error)`.

use std::fmt;
use std::path::PathBuf;

use miette::{Diagnostic, Severity};
use seam_graph::BuildError;
use seam_link::LinkError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Canonical ids the error is attributed to.
    pub fn module_ids(&self) -> Vec<&str> {
        match self {
            Error::Build(error) => error.module_ids(),
            Error::Link(error) => error.module_ids(),
            Error::Config(_) => Vec::new(),
        }
    }

    fn code_str(&self) -> &'static str {
        match self {
            Error::Build(error) => match error {
                BuildError::ResolutionFailure { .. } => "seam::resolve",
                BuildError::LoadFailure { .. } => "seam::load",
                BuildError::TypeDeterminationFailure { .. } => "seam::module_type",
                BuildError::ParseFailure { .. } => "seam::parse",
                BuildError::Hook { .. } => "seam::hook",
                BuildError::Aborted(_) => "seam::aborted",
            },
            Error::Link(error) => match error {
                LinkError::CircularAggregateExport { .. } => "seam::circular_reexport",
                LinkError::MissingExport { .. } => "seam::missing_export",
                LinkError::UnresolvedImport { .. } => "seam::unresolved_import",
                LinkError::NonScriptBinding { .. } => "seam::non_script_binding",
            },
            Error::Config(_) => "seam::config",
        }
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn severity(&self) -> Option<Severity> {
        Some(Severity::Error)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help: String = match self {
            Error::Build(BuildError::ResolutionFailure { specifier, .. }) => format!(
                "Check that '{specifier}' exists, or add an alias or fallback for it in the resolve options"
            ),
            Error::Build(BuildError::TypeDeterminationFailure { lang, .. }) => format!(
                "Register a loader that compiles '{lang}' modules to a known language"
            ),
            Error::Build(BuildError::LoadFailure { .. }) => {
                "Remote and virtual modules need a load hook that provides their content".to_string()
            }
            Error::Link(LinkError::CircularAggregateExport { .. }) => {
                "One of these modules must declare the name instead of re-exporting it".to_string()
            }
            Error::Link(LinkError::MissingExport { exporter, .. }) => {
                format!("Check the export list of '{exporter}'")
            }
            Error::Link(LinkError::UnresolvedImport { specifier, .. }) => format!(
                "'{specifier}' was skipped as optional; only side-effect imports of it are allowed"
            ),
            Error::Link(LinkError::NonScriptBinding { .. }) => {
                "Import stylesheets and resources for their side effect only".to_string()
            }
            Error::Config(ConfigError::NoEntry) => {
                "Set `entry` in seam.toml, the \"seam\" field of package.json, or SEAM_ENTRY".to_string()
            }
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no seam.toml or package.json \"seam\" field found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no entry specified")]
    NoEntry,

    #[error("extension '{0}' must start with '.'")]
    InvalidExtension(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
