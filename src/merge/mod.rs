//! Splicing rendered markup into the HTML shell.
//!
//! Each page gets an independent copy of the template with the container
//! element's contents replaced by that page's rendered HTML. The match is
//! anchored to the container's `id` attribute so unrelated elements are never
//! touched, and the rest of the template stays byte-identical.

use crate::log;
use crate::page::PageSpec;
use crate::protocol::RenderResultMap;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Final output path mapped to the patched document text.
pub type AssetMap = FxHashMap<PathBuf, String>;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("template has no empty element with id=\"{0}\" to render into")]
    TargetMissing(String),
}

// ============================================================================
// Template patching
// ============================================================================

/// Build the container-matching regex for an id.
///
/// Group 1 is the opening tag carrying `id="<id>"`, group 2 the closing tag
/// that must immediately follow it: the container is required to be empty in
/// the template. Attribute scanning stays within one tag (`[^>]*`), so an id
/// mentioned in text content cannot match. The ASCII boundary before `id`
/// keeps attribute names that merely end in `id` (`data-testid`) out.
fn container_regex(container_id: &str) -> Regex {
    let pattern = format!(
        r#"(<[^>]*(?-u:\b)id="{}"[^>]*>)(</[^>]*>)"#,
        regex::escape(container_id)
    );
    // Escaped literal inside a known-good pattern; cannot fail to compile
    Regex::new(&pattern).unwrap()
}

/// Replace the contents of the container element with `html`.
///
/// Fails loudly when the template has no matching container instead of
/// silently handing back an unpatched copy.
pub fn patch_template(
    template: &str,
    container_id: &str,
    html: &str,
) -> Result<String, MergeError> {
    let re = container_regex(container_id);
    if !re.is_match(template) {
        return Err(MergeError::TargetMissing(container_id.to_string()));
    }

    // Closure replacement: rendered HTML is inserted literally, `$` and
    // friends in component output must not be treated as capture references.
    let patched = re.replace(template, |caps: &regex::Captures| {
        format!("{}{}{}", &caps[1], html, &caps[2])
    });
    Ok(patched.into_owned())
}

// ============================================================================
// Asset mapping
// ============================================================================

/// Pair every page with its rendered result and produce one patched document
/// per page, keyed by the final output path.
///
/// Pages whose source path never showed up in the render results are skipped
/// with a warning; the sandbox boundary already failed the run for anything
/// worse than a missing key.
pub fn merge_assets(
    pages: &[PageSpec],
    results: &RenderResultMap,
    template: &str,
    container_id: &str,
    output_path: Option<&Path>,
) -> Result<AssetMap, MergeError> {
    let mut assets = AssetMap::default();

    for page in pages {
        let Some(html) = results.get(&page.source_key()) else {
            log!("merge"; "no render result for `{}`, skipping `{}`",
                page.source_path.display(), page.output_name);
            continue;
        };

        let patched = patch_template(template, container_id, html)?;
        let output = match output_path {
            Some(prefix) => prefix.join(&page.output_name),
            None => PathBuf::from(&page.output_name),
        };
        assets.insert(output, patched);
    }

    Ok(assets)
}

// ============================================================================
// Tests
// ============================================================================
