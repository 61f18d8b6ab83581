use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout;

use super::super::{
    BuildError, EMPTY_MODULE, Fallback, GraphBuilder, Hook, HookOptions, HookRegistry,
    HookResolution, HookResult, JsonLoader, LoadHook, LoadOutput, MemoryAssetStore, ModuleBody,
    ModuleInfo, ModuleKind, ParseInfo, ParsedHook, ResolveHook, ResolveOptions, Resolver,
    TransformContext, TransformHook,
};

fn builder(store: &Arc<MemoryAssetStore>) -> GraphBuilder {
    GraphBuilder::new(store.clone(), Resolver::default())
}

/// Records every id that reaches the load pipeline.
#[derive(Default)]
struct LoadLog {
    ids: Mutex<Vec<String>>,
}

#[async_trait]
impl LoadHook for LoadLog {
    fn name(&self) -> &str {
        "load-log"
    }

    async fn load(&self, module: &ModuleInfo) -> HookResult<Option<LoadOutput>> {
        self.ids.lock().push(module.id.clone());
        Ok(None)
    }
}

/// Maps `virtual-config` to a virtual module and answers `optional-*` as optional.
struct VirtualResolver;

#[async_trait]
impl ResolveHook for VirtualResolver {
    fn name(&self) -> &str {
        "virtual"
    }

    async fn resolve(&self, specifier: &str, _importer: &str) -> HookResult<Option<HookResolution>> {
        Ok(match specifier {
            "virtual-config" => Some(HookResolution::Resolved("virtual:/config".to_string())),
            spec if spec.starts_with("optional-") => Some(HookResolution::Optional),
            _ => None,
        })
    }
}

struct VirtualLoader;

#[async_trait]
impl LoadHook for VirtualLoader {
    fn name(&self) -> &str {
        "virtual"
    }

    async fn load(&self, module: &ModuleInfo) -> HookResult<Option<LoadOutput>> {
        if module.id == "virtual:/config" {
            return Ok(Some(LoadOutput::new("export const mode = 'test';")));
        }
        Ok(None)
    }
}

#[tokio::test]
async fn reuses_unchanged_modules_and_evicts_dropped_ones() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import './a'; import './b';"),
        ("/a.js", "import './shared';"),
        ("/b.js", "import './shared';"),
        ("/shared.js", "export const shared = 1;"),
    ]));
    let mut builder = builder(&store);

    let first = builder.build("/main.js").await.unwrap();
    assert_eq!(
        first.ids().collect::<Vec<_>>(),
        vec!["/main.js", "/a.js", "/shared.js", "/b.js"]
    );
    assert_eq!(first.stats().built.len(), 4);
    assert_eq!(
        first.get("/shared.js").unwrap().importers.iter().collect::<Vec<_>>(),
        vec!["/a.js", "/b.js"]
    );

    store.insert("/main.js", "import './b';");
    let second = builder.build("/main.js").await.unwrap();
    assert_eq!(second.ids().collect::<Vec<_>>(), vec!["/main.js", "/b.js", "/shared.js"]);
    assert_eq!(second.stats().built, vec!["/main.js"]);
    assert_eq!(second.stats().reused, vec!["/b.js", "/shared.js"]);
    assert_eq!(second.stats().evicted, vec!["/a.js"]);
    assert!(!builder.cache().contains("/a.js"));

    store.insert("/main.js", "console.log('alone');");
    let third = builder.build("/main.js").await.unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third.stats().evicted, vec!["/b.js", "/shared.js"]);
    assert_eq!(builder.cache().ids(), vec!["/main.js"]);
}

#[tokio::test]
async fn flagged_assets_are_rebuilt_even_with_identical_content() {
    let store = Arc::new(MemoryAssetStore::from_files([("/main.js", "export const a = 1;")]));
    let mut builder = builder(&store);
    builder.build("/main.js").await.unwrap();

    store.remove("/main.js");
    store.insert("/main.js", "export const a = 1;");
    let graph = builder.build("/main.js").await.unwrap();
    assert_eq!(graph.stats().built, vec!["/main.js"]);
}

#[tokio::test]
async fn shared_dependencies_load_once() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import './a'; import './b'; import './c';"),
        ("/a.js", "import './shared';"),
        ("/b.js", "import './shared';"),
        ("/c.js", "import './shared';"),
        ("/shared.js", ""),
    ]));
    let log = Arc::new(LoadLog::default());
    let hooks = HookRegistry::new().with(Hook::Load(log.clone()), HookOptions::default());
    let mut builder = builder(&store).with_hooks(hooks);

    let graph = builder.build("/main.js").await.unwrap();
    assert_eq!(graph.len(), 5);
    let loads = log.ids.lock();
    assert_eq!(loads.len(), 5);
    assert_eq!(loads.iter().filter(|id| *id == "/shared.js").count(), 1);
}

/// Holds `/slow.js` until `/deep.js` starts loading.
#[derive(Default)]
struct SlowUntilDeep {
    release: Notify,
}

#[async_trait]
impl LoadHook for SlowUntilDeep {
    fn name(&self) -> &str {
        "slow-until-deep"
    }

    async fn load(&self, module: &ModuleInfo) -> HookResult<Option<LoadOutput>> {
        match module.id.as_str() {
            "/slow.js" => self.release.notified().await,
            "/deep.js" => self.release.notify_one(),
            _ => {}
        }
        Ok(None)
    }
}

#[tokio::test]
async fn slow_modules_do_not_hold_back_sibling_subtrees() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import './slow'; import './fast';"),
        ("/slow.js", "export const slow = 1;"),
        ("/fast.js", "import './deep';"),
        ("/deep.js", "export const deep = 1;"),
    ]));
    let hooks = HookRegistry::new().with(
        Hook::Load(Arc::new(SlowUntilDeep::default())),
        HookOptions::default(),
    );
    let mut builder = builder(&store).with_hooks(hooks);

    let graph = timeout(Duration::from_secs(5), builder.build("/main.js"))
        .await
        .expect("deep.js loads while slow.js is pending")
        .unwrap();
    assert_eq!(
        graph.ids().collect::<Vec<_>>(),
        vec!["/main.js", "/slow.js", "/fast.js", "/deep.js"]
    );
}

#[tokio::test]
async fn resolve_and_load_hooks_provide_virtual_modules() {
    let store = Arc::new(MemoryAssetStore::from_files([(
        "/main.js",
        "import { mode } from 'virtual-config'; import 'optional-telemetry'; console.log(mode);",
    )]));
    let hooks = HookRegistry::new()
        .with(Hook::Resolve(Arc::new(VirtualResolver)), HookOptions::pre())
        .with(Hook::Load(Arc::new(VirtualLoader)), HookOptions::default());
    let mut builder = builder(&store).with_hooks(hooks);

    let graph = builder.build("/main.js").await.unwrap();
    assert_eq!(graph.ids().collect::<Vec<_>>(), vec!["/main.js", "virtual:/config"]);
    let main = graph.get("/main.js").unwrap();
    assert!(!main.dependency_map.contains_key("optional-telemetry"));
    assert!(graph.dependency("/main.js", "virtual-config").is_some());

    // Hook-provided modules are never cached.
    assert!(!builder.cache().contains("virtual:/config"));
    let again = builder.build("/main.js").await.unwrap();
    assert_eq!(again.stats().built, vec!["virtual:/config"]);
}

#[tokio::test]
async fn json_modules_compile_to_scripts() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import data from './data.json'; console.log(data);"),
        ("/data.json", r#"{ "name": "seam" }"#),
    ]));
    let hooks = HookRegistry::new().with_loader(Arc::new(JsonLoader));
    let graph = builder(&store).with_hooks(hooks).build("/main.js").await.unwrap();

    let data = graph.get("/data.json").unwrap();
    assert_eq!(data.kind(), ModuleKind::Script);
    assert!(data.as_script().unwrap().exports.contains_key("default"));
}

#[tokio::test]
async fn style_and_resource_modules_join_the_graph() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import './theme.css';"),
        ("/theme.css", "@import './base.css';\nbody { background: url(./bg.png); }"),
        ("/base.css", "html { margin: 0; }"),
    ]));
    store.insert("/bg.png", vec![0x89, b'P', b'N', b'G']);

    let graph = builder(&store).build("/main.js").await.unwrap();
    assert_eq!(
        graph.ids().collect::<Vec<_>>(),
        vec!["/main.js", "/theme.css", "/base.css", "/bg.png"]
    );
    assert_eq!(graph.get("/theme.css").unwrap().kind(), ModuleKind::Style);
    assert_eq!(graph.get("/bg.png").unwrap().kind(), ModuleKind::Resource);
}

#[tokio::test]
async fn cycles_build() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/a.js", "import './b'; export const a = 1;"),
        ("/b.js", "import './a'; export const b = 2;"),
    ]));
    let graph = builder(&store).build("/a.js").await.unwrap();
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.emission_order(), vec!["/b.js", "/a.js"]);
}

#[tokio::test]
async fn unresolved_imports_fail_with_the_importer() {
    let store = Arc::new(MemoryAssetStore::from_files([("/main.js", "import './missing';")]));
    let error = builder(&store).build("/main.js").await.unwrap_err();
    match error {
        BuildError::ResolutionFailure {
            specifier,
            importer,
        } => {
            assert_eq!(specifier, "./missing");
            assert_eq!(importer, "/main.js");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_entry_fails_to_resolve() {
    let store = Arc::new(MemoryAssetStore::new());
    let error = builder(&store).build("/main.js").await.unwrap_err();
    assert!(matches!(error, BuildError::ResolutionFailure { importer, .. } if importer == "<entry>"));
}

#[tokio::test]
async fn unknown_languages_are_rejected() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import './config.yaml';"),
        ("/config.yaml", "a: 1"),
    ]));
    let error = builder(&store).build("/main.js").await.unwrap_err();
    assert!(matches!(
        error,
        BuildError::TypeDeterminationFailure { ref id, ref lang } if id == "/config.yaml" && lang == "yaml"
    ));
}

#[tokio::test]
async fn remote_modules_need_a_loader() {
    let store = Arc::new(MemoryAssetStore::from_files([(
        "/main.js",
        "import 'https://cdn.dev/lib.js';",
    )]));
    let error = builder(&store).build("/main.js").await.unwrap_err();
    assert!(matches!(
        error,
        BuildError::LoadFailure { ref id, .. } if id == "https://cdn.dev/lib.js"
    ));
}

#[tokio::test]
async fn failed_builds_keep_the_previous_cache() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import './a';"),
        ("/a.js", ""),
    ]));
    let mut builder = builder(&store);
    builder.build("/main.js").await.unwrap();

    store.insert("/main.js", "import './gone';");
    assert!(builder.build("/main.js").await.is_err());
    assert_eq!(builder.cache().ids(), vec!["/a.js", "/main.js"]);
}

struct MarkSkippable;

#[async_trait]
impl LoadHook for MarkSkippable {
    fn name(&self) -> &str {
        "skippable"
    }

    async fn load(&self, module: &ModuleInfo) -> HookResult<Option<LoadOutput>> {
        Ok(module
            .text()
            .filter(|_| module.id.ends_with("broken.js"))
            .map(|text| LoadOutput::new(text.to_string()).skippable()))
    }
}

#[tokio::test]
async fn skippable_modules_that_fail_become_empty() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import './broken';"),
        ("/broken.js", "export const = ;"),
    ]));
    let hooks = HookRegistry::new().with(Hook::Load(Arc::new(MarkSkippable)), HookOptions::default());
    let graph = builder(&store).with_hooks(hooks).build("/main.js").await.unwrap();

    let broken = graph.get("/broken.js").unwrap().as_script().unwrap();
    assert!(broken.exports.is_empty());
    assert!(broken.content.is_empty());

    let error = builder(&store).build("/main.js").await.unwrap_err();
    assert!(matches!(error, BuildError::ParseFailure { ref id, .. } if id == "/broken.js"));
}

#[tokio::test]
async fn fallbacks_to_false_produce_empty_modules() {
    let store = Arc::new(MemoryAssetStore::from_files([("/main.js", "import 'fs';")]));
    let resolver = Resolver::new(ResolveOptions::default().fallback("fs", Fallback::EMPTY));
    let graph = GraphBuilder::new(store, resolver).build("/main.js").await.unwrap();
    let empty = graph.get(EMPTY_MODULE).unwrap();
    assert!(matches!(&*empty.body, ModuleBody::Script(script) if script.content.is_empty()));
}

struct CountStatements {
    seen: Mutex<Vec<(String, usize)>>,
}

impl TransformHook for CountStatements {
    fn name(&self) -> &str {
        "count"
    }

    fn transform(&self, context: &mut TransformContext<'_, '_>) -> HookResult<()> {
        self.seen
            .lock()
            .push((context.id.to_string(), context.program.body.len()));
        Ok(())
    }
}

struct RecordKinds {
    kinds: Mutex<Vec<(String, ModuleKind)>>,
}

impl ParsedHook for RecordKinds {
    fn name(&self) -> &str {
        "kinds"
    }

    fn parsed(&self, info: &ParseInfo<'_>) -> HookResult<()> {
        self.kinds
            .lock()
            .push((info.id.to_string(), info.module.kind()));
        Ok(())
    }
}

#[tokio::test]
async fn transform_and_parsed_hooks_see_every_built_module() {
    let store = Arc::new(MemoryAssetStore::from_files([
        ("/main.js", "import './theme.css';\nconst a = 1;\nconsole.log(a);"),
        ("/theme.css", "body {}"),
    ]));
    let transforms = Arc::new(CountStatements {
        seen: Mutex::new(Vec::new()),
    });
    let parsed = Arc::new(RecordKinds {
        kinds: Mutex::new(Vec::new()),
    });
    let hooks = HookRegistry::new()
        .with(Hook::Transform(transforms.clone()), HookOptions::default())
        .with(Hook::Parsed(parsed.clone()), HookOptions::default());

    let graph = builder(&store).with_hooks(hooks).build("/main.js").await.unwrap();
    assert_eq!(*transforms.seen.lock(), vec![("/main.js".to_string(), 3)]);
    assert!(graph.get("/main.js").unwrap().as_script().unwrap().map.is_some());

    let mut kinds = parsed.kinds.lock().clone();
    kinds.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        kinds,
        vec![
            ("/main.js".to_string(), ModuleKind::Script),
            ("/theme.css".to_string(), ModuleKind::Style),
        ]
    );
}
