//! Linker options.

use serde::{Deserialize, Serialize};

/// Controls how bundles are emitted.
///
/// ```rust
/// use seam_link::LinkOptions;
///
/// let options: LinkOptions = serde_json::from_str(r#"{ "moduleComments": false }"#).unwrap();
/// assert!(options.source_map);
/// assert!(!options.module_comments);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkOptions {
    /// Produce a merged source map per bundle.
    pub source_map: bool,
    /// Prefix each module's code with a comment naming its canonical id.
    pub module_comments: bool,
    /// `file` field of the script map; the style map uses the same name with
    /// a `.css` extension.
    pub file: Option<String>,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            source_map: true,
            module_comments: true,
            file: None,
        }
    }
}

impl LinkOptions {
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
}
