//! The prerender pipeline: synthesize → execute → extract → merge.
//!
//! [`emit`] is the single per-build entry point. It receives the in-progress
//! artifact set, renders every configured page through one sandbox execution,
//! and either adds one patched document per page or records exactly one error
//! and leaves the artifacts untouched. It completes exactly once on every
//! path and never panics past the sandbox boundary.

use crate::codegen::{self, Environment};
use crate::config::PrerenderConfig;
use crate::debug;
use crate::merge;
use crate::page::PageSpec;
use crate::protocol;
use crate::sandbox;
use anyhow::anyhow;
use rustc_hash::{FxHashMap, FxHashSet};

// ============================================================================
// Compilation state
// ============================================================================

/// In-progress build state handed to the emit hook: the artifact set being
/// produced plus every error recorded against the build.
#[derive(Debug, Default)]
pub struct Compilation {
    /// Artifact name → content.
    pub assets: FxHashMap<String, String>,
    /// Errors recorded against this build.
    pub errors: Vec<anyhow::Error>,
}

impl Compilation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the compilation with an existing artifact (e.g. the template).
    pub fn with_asset(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.assets.insert(name.into(), content.into());
        self
    }

    pub fn record_error(&mut self, error: anyhow::Error) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ============================================================================
// Emit hook
// ============================================================================

/// Render all configured pages and splice them into the template artifact.
///
/// A failing run records a single error and produces zero page artifacts;
/// there are no retries and no partial output.
pub fn emit(config: &PrerenderConfig, compilation: &mut Compilation) {
    let template_key = config.render.index_html.display().to_string();
    let Some(template) = compilation.assets.get(&template_key).cloned() else {
        compilation.record_error(anyhow!(
            "template artifact `{template_key}` not present in this build"
        ));
        return;
    };

    let pages = PageSpec::from_pages(&config.pages, config.get_root());
    if pages.is_empty() {
        return;
    }

    // Ordered, deduplicated by first occurrence: pages may share a source
    let mut seen = FxHashSet::default();
    let sources: Vec<String> = pages
        .iter()
        .map(PageSpec::source_key)
        .filter(|key| seen.insert(key.clone()))
        .collect();

    let environment = Environment::from_globals(&config.render.globals);
    let program = codegen::synthesize(&sources, &environment);
    debug!("render"; "synthesized program for {} component(s)", sources.len());
    for alias in &program.aliases {
        debug!("render"; "  component {}: {}", alias.index, alias.source_path);
    }

    let runner = config.sandbox.runner_command(config.get_root());
    let raw = match sandbox::run(
        &program,
        &runner,
        config.get_root(),
        config.sandbox.timeout_duration(),
    ) {
        Ok(output) => output,
        Err(error) => {
            compilation.record_error(
                anyhow::Error::new(error).context("sandbox execution failed"),
            );
            return;
        }
    };

    let results = match protocol::decode(&raw.stdout) {
        Ok(results) => results,
        Err(error) => {
            compilation.record_error(
                anyhow::Error::new(error).context("could not extract render results"),
            );
            return;
        }
    };

    let assets = match merge::merge_assets(
        &pages,
        &results,
        &template,
        &config.render.container_id,
        config.render.output_path.as_deref(),
    ) {
        Ok(assets) => assets,
        Err(error) => {
            compilation
                .record_error(anyhow::Error::new(error).context("template merge failed"));
            return;
        }
    };

    for (path, content) in assets {
        compilation.assets.insert(path.display().to_string(), content);
    }
}

// ============================================================================
// Tests
// ============================================================================
