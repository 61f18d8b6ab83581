//! Processing of a single module: load, compile, extract, resolve.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use super::cache::CacheEntry;
use crate::asset::{AssetContent, AssetStore};
use crate::error::{BuildError, Result};
use crate::extract::{extract_script, extract_style};
use crate::id::{self, EMPTY_MODULE};
use crate::module::{ModuleBody, ModuleKind, ResourceModule, ScriptModule};
use crate::pipeline::{HookRegistry, HookResolution, ModuleInfo, ParseInfo};
use crate::resolver::Resolver;
use crate::sourcemap::{SourceMap, compose};

/// Shared, read-only state of one build.
#[derive(Debug)]
pub(crate) struct BuildContext {
    pub store: Arc<dyn AssetStore>,
    pub resolver: Arc<Resolver>,
    pub hooks: Arc<HookRegistry>,
}

/// Result of processing one module.
#[derive(Debug)]
pub(crate) struct Processed {
    pub id: String,
    pub body: Arc<ModuleBody>,
    /// Asset content the body was built from; `None` when no asset backs
    /// the module (hook-provided or built-in content).
    pub snapshot: Option<AssetContent>,
    pub dependency_map: IndexMap<String, String>,
    pub reused: bool,
}

pub(crate) async fn process_module(
    context: Arc<BuildContext>,
    id: String,
    cached: Option<CacheEntry>,
) -> Result<Processed> {
    let asset = context.store.get(&id);

    let (body, reused) = match (&asset, cached) {
        (Some(asset), Some(entry)) if entry.is_valid_for(asset) => {
            tracing::debug!(%id, "reusing cached module");
            (entry.body, true)
        }
        _ if id == EMPTY_MODULE && asset.is_none() => {
            (Arc::new(ModuleBody::Script(ScriptModule::empty())), false)
        }
        _ => {
            let content = asset.as_ref().map(|asset| asset.content.clone());
            let body = load_module(&context, &id, content).await?;
            tracing::debug!(%id, kind = body.kind().as_str(), "built module");
            (Arc::new(body), false)
        }
    };

    let dependency_map = resolve_dependencies(&context, &id, body.specifiers()).await?;

    Ok(Processed {
        snapshot: asset.map(|asset| asset.content),
        id,
        body,
        dependency_map,
        reused,
    })
}

async fn load_module(
    context: &BuildContext,
    id: &str,
    content: Option<AssetContent>,
) -> Result<ModuleBody> {
    let mut info = ModuleInfo::new(id, content);
    context.hooks.load(&mut info).await?;

    let Some(content) = info.content.clone() else {
        let reason = if id::is_opaque(id) {
            "remote modules need a load hook to provide content"
        } else {
            "no asset, load hook or loader produced content"
        };
        return Err(BuildError::LoadFailure {
            id: id.to_string(),
            reason: reason.to_string(),
        });
    };

    let kind = ModuleKind::from_lang(&info.lang).ok_or_else(|| {
        BuildError::TypeDeterminationFailure {
            id: id.to_string(),
            lang: info.lang.clone(),
        }
    })?;

    let body = match kind {
        ModuleKind::Script => match compile_script(context, &info) {
            Ok(script) => ModuleBody::Script(script),
            Err(error) if info.skippable => {
                tracing::warn!(%id, %error, "skippable module failed, using an empty module");
                ModuleBody::Script(ScriptModule::empty())
            }
            Err(error) => return Err(error),
        },
        ModuleKind::Style => {
            let text = text_of(id, &content)?;
            ModuleBody::Style(extract_style(text, info.map.clone()))
        }
        ModuleKind::Resource => ModuleBody::Resource(ResourceModule { content }),
    };

    context.hooks.parsed(&ParseInfo { id, module: &body })?;
    Ok(body)
}

fn text_of(id: &str, content: &AssetContent) -> Result<Arc<str>> {
    match content {
        AssetContent::Text(text) => Ok(text.clone()),
        AssetContent::Blob(_) => Err(BuildError::ParseFailure {
            id: id.to_string(),
            message: "expected text content, found binary".to_string(),
        }),
    }
}

/// Run transform hooks (if any) and extract the script facts.
fn compile_script(context: &BuildContext, info: &ModuleInfo) -> Result<ScriptModule> {
    let Some(content) = info.content.as_ref() else {
        return Err(BuildError::LoadFailure {
            id: info.id.clone(),
            reason: "no content".to_string(),
        });
    };
    let text = text_of(&info.id, content)?;

    if !context.hooks.has_transforms() {
        return extract_script(&info.id, text, info.map.clone());
    }

    let (code, map) = transform_script(context, info, &text)?;
    extract_script(&info.id, Arc::from(code), map)
}

fn transform_script(
    context: &BuildContext,
    info: &ModuleInfo,
    text: &str,
) -> Result<(String, Option<SourceMap>)> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, text, SourceType::mjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(BuildError::ParseFailure {
            id: info.id.clone(),
            message: error.to_string(),
        });
    }

    let mut program = parsed.program;
    context.hooks.transform(&info.id, &allocator, &mut program)?;

    let output = Codegen::new()
        .with_options(CodegenOptions {
            source_map_path: Some(PathBuf::from(&info.id)),
            ..CodegenOptions::default()
        })
        .build(&program);

    let map = match (info.map.as_ref(), output.map) {
        (Some(previous), Some(printed)) => Some(compose(previous, &printed)),
        (None, printed) => printed,
        (Some(previous), None) => Some(previous.clone()),
    };
    Ok((output.code, map))
}

async fn resolve_dependencies(
    context: &BuildContext,
    importer: &str,
    specifiers: &[String],
) -> Result<IndexMap<String, String>> {
    let base_dir = id::dirname(importer);
    let mut dependency_map = IndexMap::with_capacity(specifiers.len());

    for specifier in specifiers {
        let answer = context.hooks.resolve(specifier, importer).await?;
        let optional = matches!(answer, Some(HookResolution::Optional));
        let resolved = match answer {
            Some(HookResolution::Resolved(resolved)) => Some(resolved),
            Some(HookResolution::Optional) | None => {
                context
                    .resolver
                    .resolve(specifier, &base_dir, context.store.as_ref())
            }
        };

        match resolved {
            Some(resolved) => {
                tracing::trace!(importer, specifier = %specifier, %resolved, "resolved dependency");
                dependency_map.insert(specifier.clone(), resolved);
            }
            None if optional => {
                tracing::warn!(importer, specifier = %specifier, "ignoring unresolved optional import");
            }
            None => {
                return Err(BuildError::ResolutionFailure {
                    specifier: specifier.clone(),
                    importer: importer.to_string(),
                });
            }
        }
    }
    Ok(dependency_map)
}
