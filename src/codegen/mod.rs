//! Render program synthesis.
//!
//! Builds the source text of a one-shot TSX program that renders every
//! configured component to HTML and writes the result map to stdout inside
//! the delimiter fence. Synthesis is pure string assembly and cannot fail;
//! bad component paths surface later as sandbox execution failures.
//!
//! The emitted module format (CommonJS via `--transpile-only`) evaluates
//! import statements in source order, which is what makes the globals block
//! between the `window` import and the React import effective: React and the
//! components see the injected environment at import time, not call time.

pub mod env;

pub use env::Environment;

use crate::protocol::{OUTPUT_END, OUTPUT_START};

/// One entry of the index→path table generated alongside the program.
///
/// Components are imported under position-derived aliases because import
/// names cannot be formed from arbitrary path strings; the result map is
/// keyed by the original path, so consumers never see the alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentAlias {
    pub index: usize,
    pub alias: String,
    pub source_path: String,
}

/// A synthesized render program, owned by the run that created it.
#[derive(Debug, Clone)]
pub struct Program {
    /// TSX source text, written to a single file in the temp workspace.
    pub source: String,
    /// Environment JSON passed to the process as an initialization argument.
    pub env_json: String,
    /// Index→path table for the imports the program performs.
    pub aliases: Vec<ComponentAlias>,
}

// ============================================================================
// Synthesis
// ============================================================================

/// Synthesize the render program for an ordered, deduplicated list of
/// component source paths.
pub fn synthesize(source_paths: &[String], environment: &Environment) -> Program {
    let aliases = alias_table(source_paths);
    let imports = import_statements(&aliases);
    let render_fn = render_function(&aliases);

    let source = format!(
        r#"require.extensions[".css"] = () => undefined;

import * as Window from "window";

const window = new (Window as any)();
const injected = JSON.parse(process.argv[2] ?? "{{}}");
const globals: Record<string, unknown> = {{
  window,
  document: window.document,
  navigator: window.navigator,
  ...injected,
}};
for (const key of Object.keys(globals)) {{
  (globalThis as any)[key] = globals[key];
}}

import * as React from "react";
import {{ renderToString }} from "react-dom/server";

{imports}

{render_fn}

const result = renderPages();

console.log("{OUTPUT_START}" + JSON.stringify(result) + "{OUTPUT_END}");
"#
    );

    Program {
        source,
        env_json: environment.to_json(),
        aliases,
    }
}

/// Build the index→path alias table.
fn alias_table(source_paths: &[String]) -> Vec<ComponentAlias> {
    source_paths
        .iter()
        .enumerate()
        .map(|(index, path)| ComponentAlias {
            index,
            alias: format!("Component{index}"),
            source_path: path.clone(),
        })
        .collect()
}

/// One default-import per component, extension stripped from the specifier.
fn import_statements(aliases: &[ComponentAlias]) -> String {
    aliases
        .iter()
        .map(|entry| {
            format!(
                "import {{ default as {} }} from {};",
                entry.alias,
                js_string(strip_extension(&entry.source_path))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The zero-argument entry point returning {original path → rendered HTML}.
fn render_function(aliases: &[ComponentAlias]) -> String {
    let entries = aliases
        .iter()
        .map(|entry| {
            format!(
                "    {}: renderToString(<{} />),",
                js_string(&entry.source_path),
                entry.alias
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("function renderPages(): Record<string, string> {{\n  return {{\n{entries}\n  }};\n}}")
}

/// Quote and escape a string for embedding in the program text.
fn js_string(s: &str) -> String {
    // JSON string escaping is valid JS string escaping
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

/// Strip a trailing file extension from the final path component.
///
/// Module resolution wants `./pages/Index`, not `./pages/Index.tsx`; a dot in
/// a parent directory name must not be mistaken for an extension.
fn strip_extension(path: &str) -> &str {
    let last_sep = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match path[last_sep..].rfind('.') {
        // Leading dot is a hidden file, not an extension
        Some(0) | None => path,
        Some(dot) => &path[..last_sep + dot],
    }
}

// ============================================================================
// Tests
// ============================================================================
