//! Loaders: language-to-language compilers run after `load` hooks.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::{LoadOutput, ModuleInfo};
use crate::error::{HookError, HookResult};
use crate::id;

/// Compiles modules matching a test into new content, usually in a new
/// language.
///
/// Loaders are tried in registration order against the module's *current*
/// language, so a loader that emits `js` feeds every later loader that
/// accepts `js`, unless it disables chaining.
#[async_trait]
pub trait Loader: Send + Sync {
    fn name(&self) -> &str;

    fn test(&self, module: &ModuleInfo) -> bool;

    async fn compile(&self, module: &ModuleInfo) -> HookResult<LoadOutput>;

    /// Stop later loaders from post-processing this loader's output.
    fn disable_chaining(&self) -> bool {
        false
    }
}

type CompileFn = dyn Fn(&ModuleInfo) -> HookResult<LoadOutput> + Send + Sync;

/// A loader built from a pattern and a closure.
///
/// The pattern is matched against the module id with its extension replaced
/// by the current language, so `/data.json` compiled to `js` is tested as
/// `/data.js`.
pub struct FnLoader {
    name: String,
    pattern: Regex,
    compile: Arc<CompileFn>,
    disable_chaining: bool,
}

impl FnLoader {
    pub fn new<F>(name: impl Into<String>, pattern: Regex, compile: F) -> Self
    where
        F: Fn(&ModuleInfo) -> HookResult<LoadOutput> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pattern,
            compile: Arc::new(compile),
            disable_chaining: false,
        }
    }

    pub fn no_chaining(mut self) -> Self {
        self.disable_chaining = true;
        self
    }
}

impl fmt::Debug for FnLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLoader")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("disable_chaining", &self.disable_chaining)
            .finish()
    }
}

/// `id` with its extension swapped for `lang`.
fn test_path(module: &ModuleInfo) -> String {
    let path = id::strip_query(&module.id);
    match id::extension(path) {
        Some(ext) => format!("{}{}", &path[..path.len() - ext.len()], module.lang),
        None => format!("{path}.{}", module.lang),
    }
}

#[async_trait]
impl Loader for FnLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn test(&self, module: &ModuleInfo) -> bool {
        self.pattern.is_match(&test_path(module))
    }

    async fn compile(&self, module: &ModuleInfo) -> HookResult<LoadOutput> {
        (self.compile)(module)
    }

    fn disable_chaining(&self) -> bool {
        self.disable_chaining
    }
}

/// Compiles `json` modules into a script with one default export.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLoader;

#[async_trait]
impl Loader for JsonLoader {
    fn name(&self) -> &str {
        "json"
    }

    fn test(&self, module: &ModuleInfo) -> bool {
        module.lang == "json"
    }

    async fn compile(&self, module: &ModuleInfo) -> HookResult<LoadOutput> {
        let text = module
            .text()
            .ok_or_else(|| HookError::message("JSON module has no text content"))?;
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|error| HookError::message(format!("invalid JSON: {error}")))?;
        let code = format!("export default {value};\n");
        Ok(LoadOutput::new(code).lang("js"))
    }
}
