//! Build command: run the prerender pipeline once and publish its artifacts.

use crate::config::PrerenderConfig;
use crate::log;
use crate::pipeline::{self, Compilation};
use anyhow::{Context, Result, bail};
use std::fs;

/// Prerender every configured page and write the patched documents to disk.
pub fn run_build(config: &PrerenderConfig) -> Result<()> {
    config.validate()?;

    let template_path = config.root_join(&config.render.index_html);
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("failed to read template `{}`", template_path.display()))?;

    let template_key = config.render.index_html.display().to_string();
    let mut compilation = Compilation::new().with_asset(template_key.clone(), template);

    log!("render"; "prerendering {} page(s)", config.pages.len());
    pipeline::emit(config, &mut compilation);

    if compilation.has_errors() {
        for error in &compilation.errors {
            log!("error"; "{error:#}");
        }
        bail!("prerender failed with {} error(s)", compilation.errors.len());
    }

    let written = write_artifacts(config, &compilation, &template_key)?;
    log!("render"; "done, {written} artifact(s) written");
    Ok(())
}

/// Write every produced artifact (the seeded template is not republished).
fn write_artifacts(
    config: &PrerenderConfig,
    compilation: &Compilation,
    template_key: &str,
) -> Result<usize> {
    let mut written = 0;

    for (name, content) in &compilation.assets {
        if name == template_key {
            continue;
        }

        let path = config.root_join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("failed to write `{}`", path.display()))?;

        log!("write"; "{name}");
        written += 1;
    }

    Ok(written)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageSpec;
    use crate::protocol::{self, RenderResultMap};
    use std::path::Path;

    const TEMPLATE: &str = r#"<html><body id="root"></body></html>"#;

    fn write_site(root: &Path) -> PrerenderConfig {
        fs::create_dir_all(root.join("public")).unwrap();
        fs::write(root.join("public/index.html"), TEMPLATE).unwrap();

        let mut config: PrerenderConfig = r#"
[pages]
"index.html" = "./A.tsx"

[render]
index_html = "public/index.html"
container_id = "root"
output_path = "dist"
"#
        .parse()
        .unwrap();
        config.root = root.to_path_buf();

        let key = PageSpec::from_pages(&config.pages, root)[0].source_key();
        let mut results = RenderResultMap::default();
        results.insert(key, "<span>ok</span>".into());
        config.sandbox.runner = vec![
            "sh".into(),
            "-c".into(),
            format!("echo '{}'", protocol::encode(&results)),
        ];
        config
    }

    #[test]
    fn test_build_writes_patched_artifact() {
        let root = tempfile::tempdir().unwrap();
        let config = write_site(root.path());

        run_build(&config).unwrap();

        let artifact = fs::read_to_string(root.path().join("dist/index.html")).unwrap();
        assert_eq!(
            artifact,
            r#"<html><body id="root"><span>ok</span></body></html>"#
        );
        // Source template untouched
        assert_eq!(
            fs::read_to_string(root.path().join("public/index.html")).unwrap(),
            TEMPLATE
        );
    }

    #[test]
    fn test_build_failure_produces_no_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let mut config = write_site(root.path());
        config.sandbox.runner = vec!["sh".into(), "-c".into(), "exit 1".into()];

        assert!(run_build(&config).is_err());
        assert!(!root.path().join("dist").exists());
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let root = tempfile::tempdir().unwrap();
        let mut config = write_site(root.path());
        config.pages.clear();

        let err = run_build(&config).unwrap_err();
        assert!(err.to_string().contains("validation"));
    }
}
