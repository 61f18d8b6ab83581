//! Load/transform pipeline.
//!
//! Plugins contribute four kinds of hooks, registered once in a
//! [`HookRegistry`] and invoked by its dispatcher methods:
//!
//! | Hook        | Sync  | Behavior                                              |
//! |-------------|-------|-------------------------------------------------------|
//! | `resolve`   | async | first handler returning an answer wins                |
//! | `load`      | async | handlers run in order; a non-chaining producer stops  |
//! | `transform` | sync  | mutates the parsed [`Program`] in place               |
//! | `parsed`    | sync  | observes the final extracted module                   |
//!
//! Registrations are ordered by [`HookOrder`] and then by registration order.
//! [`Loader`]s run after every `load` hook, in registration order.

mod loader;

pub use loader::{FnLoader, JsonLoader, Loader};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;

use crate::asset::AssetContent;
use crate::error::{BuildError, HookResult, Result};
use crate::id;
use crate::module::ModuleBody;
use crate::sourcemap::{SourceMap, compose};

/// Position of a hook relative to other hooks of the same kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HookOrder {
    Pre = 0,
    #[default]
    Normal = 10,
    Post = 20,
}

/// Registration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookOptions {
    pub order: HookOrder,
    /// For `load` hooks: keep running later hooks after this one produced
    /// content.
    pub chain: bool,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            order: HookOrder::Normal,
            chain: true,
        }
    }
}

impl HookOptions {
    pub fn pre() -> Self {
        Self {
            order: HookOrder::Pre,
            ..Self::default()
        }
    }

    pub fn post() -> Self {
        Self {
            order: HookOrder::Post,
            ..Self::default()
        }
    }

    pub fn no_chain(mut self) -> Self {
        self.chain = false;
        self
    }
}

/// Answer of a `resolve` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookResolution {
    /// Use this canonical id.
    Resolved(String),
    /// Try built-in resolution, and drop the specifier if that fails too.
    Optional,
}

/// Module state flowing through `load` hooks and loaders.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub id: String,
    /// Current language; an extension without the dot.
    pub lang: String,
    pub content: Option<AssetContent>,
    /// Maps `content` back to the original source.
    pub map: Option<SourceMap>,
    /// Replace the module with an empty one if it later fails to parse.
    pub skippable: bool,
}

impl ModuleInfo {
    pub fn new(id: impl Into<String>, content: Option<AssetContent>) -> Self {
        let id = id.into();
        let lang = lang_for_id(&id);
        Self {
            id,
            lang,
            content,
            map: None,
            skippable: false,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(AssetContent::as_text)
    }

    /// Take a hook or loader result as the new current state.
    ///
    /// An incoming map is composed onto the existing one. Content replaced
    /// without a map loses its mapping.
    pub fn apply(&mut self, output: LoadOutput) {
        self.content = Some(output.content);
        if let Some(lang) = output.lang {
            self.lang = lang;
        }
        self.map = match (self.map.take(), output.map) {
            (Some(previous), Some(next)) => Some(compose(&previous, &next)),
            (None, next) => next,
            (Some(_), None) => None,
        };
        self.skippable |= output.skippable;
    }
}

/// Language of an id before any hook has run.
///
/// The extension for paths and URLs, the media type for `data:` URIs, and
/// `js` for extension-less virtual ids.
pub fn lang_for_id(module_id: &str) -> String {
    if let Some(rest) = module_id.strip_prefix("data:") {
        let media = rest.split([';', ',']).next().unwrap_or_default();
        return match media {
            "text/javascript" | "application/javascript" => "js",
            "text/css" => "css",
            "application/json" => "json",
            _ => "",
        }
        .to_string();
    }
    match id::extension(module_id) {
        Some(ext) => ext.to_ascii_lowercase(),
        None if id::is_virtual(module_id) => "js".to_string(),
        None => String::new(),
    }
}

/// Output of a `load` hook or a loader.
#[derive(Debug, Clone)]
pub struct LoadOutput {
    pub content: AssetContent,
    pub lang: Option<String>,
    pub map: Option<SourceMap>,
    pub skippable: bool,
}

impl LoadOutput {
    pub fn new(content: impl Into<AssetContent>) -> Self {
        Self {
            content: content.into(),
            lang: None,
            map: None,
            skippable: false,
        }
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn map(mut self, map: SourceMap) -> Self {
        self.map = Some(map);
        self
    }

    pub fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }
}

impl From<String> for LoadOutput {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

impl From<&str> for LoadOutput {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

#[async_trait]
pub trait ResolveHook: Send + Sync {
    fn name(&self) -> &str;

    /// `None` passes the specifier on to the next hook.
    async fn resolve(&self, specifier: &str, importer: &str) -> HookResult<Option<HookResolution>>;
}

#[async_trait]
pub trait LoadHook: Send + Sync {
    fn name(&self) -> &str;

    /// `None` leaves the module untouched.
    async fn load(&self, module: &ModuleInfo) -> HookResult<Option<LoadOutput>>;
}

/// What a transform hook gets to work on.
pub struct TransformContext<'a, 'p> {
    pub id: &'p str,
    pub allocator: &'a Allocator,
    pub program: &'p mut Program<'a>,
}

pub trait TransformHook: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, context: &mut TransformContext<'_, '_>) -> HookResult<()>;
}

/// The final state of a module after extraction.
#[derive(Debug, Clone, Copy)]
pub struct ParseInfo<'m> {
    pub id: &'m str,
    pub module: &'m ModuleBody,
}

pub trait ParsedHook: Send + Sync {
    fn name(&self) -> &str;

    fn parsed(&self, info: &ParseInfo<'_>) -> HookResult<()>;
}

/// A hook of any kind, ready to register.
#[derive(Clone)]
pub enum Hook {
    Resolve(Arc<dyn ResolveHook>),
    Load(Arc<dyn LoadHook>),
    Transform(Arc<dyn TransformHook>),
    Parsed(Arc<dyn ParsedHook>),
}

impl Hook {
    pub fn name(&self) -> &str {
        match self {
            Hook::Resolve(hook) => hook.name(),
            Hook::Load(hook) => hook.name(),
            Hook::Transform(hook) => hook.name(),
            Hook::Parsed(hook) => hook.name(),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Hook::Resolve(_) => "Resolve",
            Hook::Load(_) => "Load",
            Hook::Transform(_) => "Transform",
            Hook::Parsed(_) => "Parsed",
        };
        write!(f, "{kind}({})", self.name())
    }
}

struct Registration<H: ?Sized> {
    options: HookOptions,
    seq: usize,
    hook: Arc<H>,
}

fn insert_ordered<H: ?Sized>(list: &mut Vec<Registration<H>>, registration: Registration<H>) {
    let key = (registration.options.order, registration.seq);
    let index = list.partition_point(|existing| (existing.options.order, existing.seq) <= key);
    list.insert(index, registration);
}

/// Ordered hook lists plus loaders, with one dispatcher per hook kind.
#[derive(Default)]
pub struct HookRegistry {
    resolve: Vec<Registration<dyn ResolveHook>>,
    load: Vec<Registration<dyn LoadHook>>,
    transform: Vec<Registration<dyn TransformHook>>,
    parsed: Vec<Registration<dyn ParsedHook>>,
    loaders: Vec<Arc<dyn Loader>>,
    seq: usize,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |hooks: Vec<&str>| hooks.join(", ");
        f.debug_struct("HookRegistry")
            .field("resolve", &names(self.resolve.iter().map(|r| r.hook.name()).collect()))
            .field("load", &names(self.load.iter().map(|r| r.hook.name()).collect()))
            .field("transform", &names(self.transform.iter().map(|r| r.hook.name()).collect()))
            .field("parsed", &names(self.parsed.iter().map(|r| r.hook.name()).collect()))
            .field("loaders", &names(self.loaders.iter().map(|l| l.name()).collect()))
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook.
    pub fn register(&mut self, hook: Hook, options: HookOptions) {
        let seq = self.seq;
        self.seq += 1;
        tracing::debug!(hook = ?hook, order = ?options.order, chain = options.chain, "register hook");
        match hook {
            Hook::Resolve(hook) => insert_ordered(&mut self.resolve, Registration { options, seq, hook }),
            Hook::Load(hook) => insert_ordered(&mut self.load, Registration { options, seq, hook }),
            Hook::Transform(hook) => {
                insert_ordered(&mut self.transform, Registration { options, seq, hook })
            }
            Hook::Parsed(hook) => insert_ordered(&mut self.parsed, Registration { options, seq, hook }),
        }
    }

    pub fn with(mut self, hook: Hook, options: HookOptions) -> Self {
        self.register(hook, options);
        self
    }

    /// Append a loader; loaders run in the order they were added.
    pub fn add_loader(&mut self, loader: Arc<dyn Loader>) {
        tracing::debug!(loader = loader.name(), "register loader");
        self.loaders.push(loader);
    }

    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.add_loader(loader);
        self
    }

    pub fn has_transforms(&self) -> bool {
        !self.transform.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.resolve.is_empty()
            && self.load.is_empty()
            && self.transform.is_empty()
            && self.parsed.is_empty()
            && self.loaders.is_empty()
    }

    /// Ask `resolve` hooks about a specifier; the first answer wins.
    pub async fn resolve(&self, specifier: &str, importer: &str) -> Result<Option<HookResolution>> {
        for registration in &self.resolve {
            let hook = &registration.hook;
            let answer = hook
                .resolve(specifier, importer)
                .await
                .map_err(|source| hook_error(importer, hook.name(), source))?;
            if let Some(answer) = answer {
                tracing::trace!(specifier, importer, hook = hook.name(), ?answer, "resolve hook answered");
                return Ok(Some(answer));
            }
        }
        Ok(None)
    }

    /// Run `load` hooks, then loaders, against `module`.
    pub async fn load(&self, module: &mut ModuleInfo) -> Result<()> {
        for registration in &self.load {
            let hook = &registration.hook;
            let output = hook
                .load(module)
                .await
                .map_err(|source| hook_error(&module.id, hook.name(), source))?;
            if let Some(output) = output {
                tracing::trace!(id = %module.id, hook = hook.name(), "load hook produced content");
                module.apply(output);
                if !registration.options.chain {
                    break;
                }
            }
        }

        for loader in &self.loaders {
            if !loader.test(module) {
                continue;
            }
            let output = loader
                .compile(module)
                .await
                .map_err(|source| hook_error(&module.id, loader.name(), source))?;
            tracing::trace!(id = %module.id, loader = loader.name(), "loader compiled module");
            module.apply(output);
            if loader.disable_chaining() {
                break;
            }
        }
        Ok(())
    }

    /// Run every `transform` hook over a parsed program.
    pub fn transform<'a>(
        &self,
        module_id: &str,
        allocator: &'a Allocator,
        program: &mut Program<'a>,
    ) -> Result<()> {
        let mut context = TransformContext {
            id: module_id,
            allocator,
            program,
        };
        for registration in &self.transform {
            let hook = &registration.hook;
            hook.transform(&mut context)
                .map_err(|source| hook_error(module_id, hook.name(), source))?;
        }
        Ok(())
    }

    /// Notify `parsed` observers.
    pub fn parsed(&self, info: &ParseInfo<'_>) -> Result<()> {
        for registration in &self.parsed {
            let hook = &registration.hook;
            hook.parsed(info)
                .map_err(|source| hook_error(info.id, hook.name(), source))?;
        }
        Ok(())
    }
}

fn hook_error(module_id: &str, hook: &str, source: crate::error::HookError) -> BuildError {
    BuildError::Hook {
        id: module_id.to_string(),
        hook: hook.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use parking_lot::Mutex;

    struct Named {
        name: &'static str,
        answer: Option<&'static str>,
    }

    #[async_trait]
    impl ResolveHook for Named {
        fn name(&self) -> &str {
            self.name
        }

        async fn resolve(&self, _specifier: &str, _importer: &str) -> HookResult<Option<HookResolution>> {
            Ok(self
                .answer
                .map(|answer| HookResolution::Resolved(answer.to_string())))
        }
    }

    struct Append {
        name: &'static str,
        suffix: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl LoadHook for Append {
        fn name(&self) -> &str {
            self.name
        }

        async fn load(&self, module: &ModuleInfo) -> HookResult<Option<LoadOutput>> {
            self.log.lock().push(self.name);
            let text = module.text().unwrap_or_default();
            Ok(Some(format!("{text}{}", self.suffix).into()))
        }
    }

    struct Failing;

    #[async_trait]
    impl LoadHook for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn load(&self, _module: &ModuleInfo) -> HookResult<Option<LoadOutput>> {
            Err(HookError::message("boom"))
        }
    }

    fn resolve_hook(name: &'static str, answer: Option<&'static str>) -> Hook {
        Hook::Resolve(Arc::new(Named { name, answer }))
    }

    #[tokio::test]
    async fn resolve_respects_order_then_registration() {
        let registry = HookRegistry::new()
            .with(resolve_hook("silent", None), HookOptions::pre())
            .with(resolve_hook("normal", Some("virtual:normal")), HookOptions::default())
            .with(resolve_hook("late", Some("virtual:late")), HookOptions::post())
            .with(resolve_hook("early", Some("virtual:early")), HookOptions::pre());

        let answer = registry.resolve("x", "/main.js").await.unwrap();
        assert_eq!(answer, Some(HookResolution::Resolved("virtual:early".into())));
    }

    #[tokio::test]
    async fn non_chaining_load_hook_stops_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let append = |name, suffix| {
            Hook::Load(Arc::new(Append {
                name,
                suffix,
                log: log.clone(),
            }))
        };
        let registry = HookRegistry::new()
            .with(append("a", "1"), HookOptions::default())
            .with(append("b", "2"), HookOptions::default().no_chain())
            .with(append("c", "3"), HookOptions::default());

        let mut module = ModuleInfo::new("/x.js", Some("x".into()));
        registry.load(&mut module).await.unwrap();
        assert_eq!(module.text(), Some("x12"));
        assert_eq!(*log.lock(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn hook_errors_name_module_and_hook() {
        let registry = HookRegistry::new().with(Hook::Load(Arc::new(Failing)), HookOptions::default());
        let mut module = ModuleInfo::new("/x.js", None);
        let error = registry.load(&mut module).await.unwrap_err();
        match error {
            BuildError::Hook { id, hook, .. } => {
                assert_eq!(id, "/x.js");
                assert_eq!(hook, "failing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn langs_for_ids() {
        assert_eq!(lang_for_id("/a/b.MJS"), "mjs");
        assert_eq!(lang_for_id("virtual:config"), "js");
        assert_eq!(lang_for_id("data:text/css,a{}"), "css");
        assert_eq!(lang_for_id("/bin/tool"), "");
    }

    #[test]
    fn apply_keeps_skippable_and_lang() {
        let mut module = ModuleInfo::new("/a.json", Some("{}".into()));
        module.apply(LoadOutput::new("export default {}").lang("js").skippable());
        module.apply(LoadOutput::new("export default {};"));
        assert_eq!(module.lang, "js");
        assert!(module.skippable);
        assert!(module.map.is_none());
    }
}
