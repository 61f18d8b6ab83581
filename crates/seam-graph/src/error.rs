//! Error types for graph construction.

use thiserror::Error;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Result type returned by hooks and loaders.
pub type HookResult<T> = std::result::Result<T, HookError>;

/// Error a plugin hook or loader reports back to the pipeline.
#[derive(Debug, Error)]
pub enum HookError {
    /// Plain message from the collaborator.
    #[error("{0}")]
    Message(String),

    /// Any other error (collaborators are free to use `anyhow`).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HookError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Fatal conditions raised while building a [`DependencyGraph`](crate::DependencyGraph).
///
/// Every variant names the offending canonical id(s) so the caller can decide
/// whether to abort the whole run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A specifier could not be mapped to any canonical id.
    #[error("Failed to resolve '{specifier}' imported by '{importer}'")]
    ResolutionFailure { specifier: String, importer: String },

    /// No loader or plugin produced content for a module.
    #[error("Failed to load '{id}': {reason}")]
    LoadFailure { id: String, reason: String },

    /// The module's language is not recognized by any loader.
    #[error("Cannot determine the module type of '{id}' (language '{lang}')")]
    TypeDeterminationFailure { id: String, lang: String },

    /// Module content is not valid for its language.
    #[error("Failed to parse '{id}': {message}")]
    ParseFailure { id: String, message: String },

    /// A hook or loader returned an error.
    #[error("Hook '{hook}' failed for '{id}': {source}")]
    Hook {
        id: String,
        hook: String,
        #[source]
        source: HookError,
    },

    /// The build stopped before every module finished loading.
    #[error("Build aborted: {0}")]
    Aborted(String),
}

impl BuildError {
    /// Canonical ids (or specifiers) this error is attributed to.
    pub fn module_ids(&self) -> Vec<&str> {
        match self {
            BuildError::ResolutionFailure {
                specifier,
                importer,
            } => vec![importer.as_str(), specifier.as_str()],
            BuildError::LoadFailure { id, .. }
            | BuildError::TypeDeterminationFailure { id, .. }
            | BuildError::ParseFailure { id, .. }
            | BuildError::Hook { id, .. } => vec![id.as_str()],
            BuildError::Aborted(_) => Vec::new(),
        }
    }
}
