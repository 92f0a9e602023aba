//! Validate command: check the configuration without rendering anything.

use crate::config::PrerenderConfig;
use crate::log;
use anyhow::Result;

pub fn run_validate(config: &PrerenderConfig) -> Result<()> {
    config.validate()?;
    log!("validate"; "configuration ok: {} page(s), container `#{}`",
        config.pages.len(), config.render.container_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_ok() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), "<div id=\"root\"></div>").unwrap();

        let mut config: PrerenderConfig = r#"
[pages]
"index.html" = "./A.tsx"

[sandbox]
runner = ["sh"]
"#
        .parse()
        .unwrap();
        config.root = root.path().to_path_buf();

        assert!(run_validate(&config).is_ok());
    }

    #[test]
    fn test_validate_reports_problems() {
        let root = tempfile::tempdir().unwrap();
        let mut config: PrerenderConfig = "".parse().unwrap();
        config.root = root.path().to_path_buf();

        assert!(run_validate(&config).is_err());
    }
}
