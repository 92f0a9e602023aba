//! Page specifications: which components render into which artifacts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A caller-declared pairing of an output artifact name and the component
/// source file rendered for it.
///
/// `output_name` may contain subdirectories (`blog/index.html`); the source
/// path is resolved absolute against the project root so it matches the keys
/// the render program reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    /// Caller-chosen artifact name, joined with the configured output path.
    pub output_name: String,
    /// Absolute path to the module exporting the default component.
    pub source_path: PathBuf,
}

impl PageSpec {
    /// Build page specs from the `[pages]` config table.
    ///
    /// Relative source paths resolve against `root`. BTreeMap iteration keeps
    /// the order deterministic, so component aliases are stable across runs.
    pub fn from_pages(pages: &BTreeMap<String, PathBuf>, root: &Path) -> Vec<PageSpec> {
        pages
            .iter()
            .map(|(output_name, source)| PageSpec {
                output_name: output_name.clone(),
                source_path: if source.is_absolute() {
                    source.clone()
                } else {
                    root.join(source)
                },
            })
            .collect()
    }

    /// Source path as a string key, matching the render result map.
    pub fn source_key(&self) -> String {
        self.source_path.display().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
