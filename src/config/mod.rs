//! Configuration management for `prerender.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `[pages]`          | Output artifact name → component source path     |
//! | `[render]`         | Template path, container id, output prefix       |
//! | `[render.globals]` | Globals injected into the sandbox environment    |
//! | `[sandbox]`        | Runner command, tsconfig path, timeout           |
//!
//! # Example
//!
//! ```toml
//! [pages]
//! "index.html" = "./src/pages/Index.tsx"
//! "about.html" = "./src/pages/About.tsx"
//!
//! [render]
//! index_html = "public/index.html"
//! container_id = "root"
//! output_path = "dist"
//!
//! [render.globals]
//! API_BASE = "https://api.example.com"
//!
//! [sandbox]
//! ts_config = "tsconfig.json"
//! timeout = 300
//! ```

use crate::log;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("config validation failed:\n{0}")]
    Validation(String),
}

// ============================================================================
// Root configuration
// ============================================================================

/// Root configuration structure representing prerender.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrerenderConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Output artifact name → component source path
    pub pages: BTreeMap<String, PathBuf>,

    /// Template and merge settings
    pub render: RenderConfig,

    /// Sandbox process settings
    pub sandbox: SandboxConfig,
}

/// `[render]` section: where the markup goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Path (relative to root) of the HTML template to patch.
    pub index_html: PathBuf,

    /// `id` of the element whose contents are replaced per page.
    pub container_id: String,

    /// Directory prefix for generated artifacts (relative to root).
    pub output_path: Option<PathBuf>,

    /// Global variables injected into the sandbox environment.
    pub globals: toml::Table,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            index_html: PathBuf::from("index.html"),
            container_id: "root".to_string(),
            output_path: None,
            globals: toml::Table::new(),
        }
    }
}

/// `[sandbox]` section: how the render program is executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Runner command prefix. Empty means the default ts-node invocation;
    /// the program file and environment JSON are appended either way.
    pub runner: Vec<String>,

    /// Project/toolchain configuration handed to the default runner.
    pub ts_config: PathBuf,

    /// Bound on sandbox execution, in seconds.
    pub timeout: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            runner: Vec::new(),
            ts_config: PathBuf::from("tsconfig.json"),
            timeout: 300,
        }
    }
}

impl SandboxConfig {
    /// Resolve the full runner command prefix.
    pub fn runner_command(&self, root: &Path) -> Vec<String> {
        if !self.runner.is_empty() {
            return self.runner.clone();
        }

        let ts_config = if self.ts_config.is_absolute() {
            self.ts_config.clone()
        } else {
            root.join(&self.ts_config)
        };

        vec![
            "ts-node".into(),
            "--project".into(),
            ts_config.display().to_string(),
            "--transpile-only".into(),
            "-r".into(),
            "tsconfig-paths/register".into(),
        ]
    }

    /// The program the runner resolves to (for validation/logging).
    pub fn runner_program(&self) -> &str {
        self.runner
            .first()
            .map(String::as_str)
            .unwrap_or("ts-node")
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// ============================================================================
// Loading
// ============================================================================

impl std::str::FromStr for PrerenderConfig {
    type Err = ConfigError;

    /// Parse configuration from a TOML string. [`load`](Self::load) is the
    /// file-backed entry point with unknown field detection.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

impl PrerenderConfig {
    /// Load configuration from file path with unknown field detection.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = fs::canonicalize(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let content =
            fs::read_to_string(&path).map_err(|err| ConfigError::Io(path.clone(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, &path);
        }

        config.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.config_path = path;
        crate::debug!("config"; "loaded `{}`", config.config_path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Package runners that resolve their target at execution time, so a missing
/// binary on PATH is not conclusive.
const PACKAGE_RUNNERS: &[&str] = &["npx", "bunx", "pnpx", "yarn", "dlx"];

impl PrerenderConfig {
    /// Validate the configuration, collecting every problem before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.pages.is_empty() {
            problems.push("[pages] is empty: nothing to prerender".to_string());
        }

        for (name, source) in &self.pages {
            if name.trim().is_empty() {
                problems.push(format!(
                    "[pages] has an empty output name for `{}`",
                    source.display()
                ));
            }
        }

        if self.render.container_id.trim().is_empty() {
            problems.push("render.container_id must not be empty".to_string());
        }

        let template = self.root_join(&self.render.index_html);
        if !template.is_file() {
            problems.push(format!(
                "render.index_html not found: {}",
                template.display()
            ));
        }

        if self.sandbox.timeout == 0 {
            problems.push("sandbox.timeout must be at least 1 second".to_string());
        }

        let program = self.sandbox.runner_program();
        if !PACKAGE_RUNNERS.contains(&program) && which::which(program).is_err() {
            problems.push(format!(
                "sandbox runner `{program}` not found on PATH \
                 (install it or set sandbox.runner)"
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("\n")))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
