//! Error types for linking.

use thiserror::Error;

/// Result type alias for linker operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Fatal conditions found while binding modules together.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A chain of re-exports leads back to itself without reaching a
    /// declaration.
    #[error("Circular re-export: {}", chain.join(" -> "))]
    CircularAggregateExport {
        /// `id#name` steps, first to last, the last repeating an earlier one.
        chain: Vec<String>,
    },

    /// The target module does not export the requested name.
    #[error("'{exporter}' does not export '{name}' (imported by '{importer}')")]
    MissingExport {
        importer: String,
        exporter: String,
        name: String,
    },

    /// An import binding points at a specifier that was skipped as optional.
    #[error("Import '{specifier}' in '{importer}' was not resolved but its binding is used")]
    UnresolvedImport { importer: String, specifier: String },

    /// A binding import targets a style or resource module.
    #[error("'{importer}' imports bindings from '{target}', which is not a script module")]
    NonScriptBinding { importer: String, target: String },
}

impl LinkError {
    /// Canonical ids this error is attributed to.
    pub fn module_ids(&self) -> Vec<&str> {
        match self {
            LinkError::CircularAggregateExport { chain } => chain
                .iter()
                .map(|step| step.rsplit_once('#').map_or(step.as_str(), |(id, _)| id))
                .collect(),
            LinkError::MissingExport {
                importer, exporter, ..
            } => vec![importer.as_str(), exporter.as_str()],
            LinkError::NonScriptBinding { importer, target } => {
                vec![importer.as_str(), target.as_str()]
            }
            LinkError::UnresolvedImport { importer, .. } => vec![importer.as_str()],
        }
    }
}
