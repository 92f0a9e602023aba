//! Isolated execution of the synthesized render program.
//!
//! The program is materialized into a scoped temporary directory under the
//! project root and run as a separate process through the configured runner.
//! The directory is process-unique and removed on every exit path, so stale
//! state never leaks into the next run and concurrent invocations from
//! different processes cannot collide.

pub mod exec;

use crate::codegen::Program;
use crate::debug;
use exec::{Cmd, ExecError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io, process};
use thiserror::Error;

/// File name of the materialized render program.
pub const PROGRAM_FILENAME: &str = "ssr.tsx";

// ============================================================================
// Errors
// ============================================================================

/// Everything that can go wrong between "program text exists" and "raw
/// captured output exists". Launch failures, non-zero exits, and exceptions
/// thrown inside the program all surface here; they abort the whole batch.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to set up sandbox working directory")]
    Setup(#[from] io::Error),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("render program failed ({status}){}", format_diagnostic(diagnostic))]
    Failed { status: String, diagnostic: String },
}

fn format_diagnostic(diagnostic: &str) -> String {
    if diagnostic.is_empty() {
        String::new()
    } else {
        format!(":\n{diagnostic}")
    }
}

// ============================================================================
// Temp workspace
// ============================================================================

/// Scoped temporary working directory, exclusively owned by one run.
///
/// Created fresh (removing any stale leftover first) and removed again when
/// dropped, whether the run succeeded or failed.
pub struct TempWorkspace {
    dir: PathBuf,
}

impl TempWorkspace {
    /// Acquire the workspace under `root`. The name embeds the process id so
    /// parallel invocations from separate processes stay isolated.
    pub fn create(root: &Path) -> io::Result<Self> {
        let dir = root.join(format!(".prerender-{}", process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        // Cleanup is a hard requirement; nothing useful to do if it fails here
        let _ = fs::remove_dir_all(&self.dir);
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Raw captured output of a successful sandbox run, consumed by the codec.
#[derive(Debug)]
pub struct RunOutput {
    pub stdout: String,
}

/// Materialize `program` into a fresh workspace and run it to completion.
///
/// `runner` is the command prefix (e.g. a ts-node invocation); the program
/// file and the environment JSON are appended as its final two arguments, so
/// the process receives its globals as an explicit initialization argument.
pub fn run(
    program: &Program,
    runner: &[String],
    root: &Path,
    timeout: Duration,
) -> Result<RunOutput, SandboxError> {
    let workspace = TempWorkspace::create(root)?;
    let program_path = workspace.path().join(PROGRAM_FILENAME);
    fs::write(&program_path, &program.source)?;

    debug!("sandbox"; "running {:?} on {}", runner, program_path.display());

    let captured = Cmd::from_slice(runner)
        .arg(&program_path)
        .arg(&program.env_json)
        .cwd(root)
        .timeout(timeout)
        .capture()?;

    if !captured.status.success() {
        return Err(SandboxError::Failed {
            status: captured.status.to_string(),
            diagnostic: captured.diagnostic(),
        });
    }

    Ok(RunOutput {
        stdout: captured.stdout,
    })
    // workspace dropped here: temp directory removed on all paths above
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Program;

    const TIMEOUT: Duration = Duration::from_secs(10);

    /// Program whose "runner" is `sh`, standing in for ts-node.
    fn shell_program(script: &str) -> Program {
        Program {
            source: script.to_string(),
            env_json: "{}".to_string(),
            aliases: Vec::new(),
        }
    }

    fn sh_runner() -> Vec<String> {
        vec!["sh".to_string()]
    }

    #[test]
    fn test_workspace_created_and_removed() {
        let root = tempfile::tempdir().unwrap();
        let dir;
        {
            let workspace = TempWorkspace::create(root.path()).unwrap();
            dir = workspace.path().to_path_buf();
            assert!(dir.is_dir());
        }
        assert!(!dir.exists());
    }

    #[test]
    fn test_workspace_replaces_stale_leftover() {
        let root = tempfile::tempdir().unwrap();
        let stale = root.path().join(format!(".prerender-{}", process::id()));
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("stale.txt"), "old").unwrap();

        let workspace = TempWorkspace::create(root.path()).unwrap();
        assert!(!workspace.path().join("stale.txt").exists());
    }

    #[test]
    fn test_run_captures_stdout() {
        let root = tempfile::tempdir().unwrap();
        let program = shell_program("echo 'rendered output'");

        let output = run(&program, &sh_runner(), root.path(), TIMEOUT).unwrap();
        assert!(output.stdout.contains("rendered output"));
    }

    #[test]
    fn test_run_receives_env_json_argument() {
        let root = tempfile::tempdir().unwrap();
        let mut program = shell_program(r#"echo "env:$1""#);
        program.env_json = r#"{"DEBUG":true}"#.to_string();

        let output = run(&program, &sh_runner(), root.path(), TIMEOUT).unwrap();
        assert!(output.stdout.contains(r#"env:{"DEBUG":true}"#));
    }

    #[test]
    fn test_run_nonzero_exit_is_failure_with_diagnostic() {
        let root = tempfile::tempdir().unwrap();
        let program = shell_program("echo 'component threw' >&2; exit 1");

        let err = run(&program, &sh_runner(), root.path(), TIMEOUT).unwrap_err();
        match err {
            SandboxError::Failed { diagnostic, .. } => {
                assert!(diagnostic.contains("component threw"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_run_missing_runner_is_exec_error() {
        let root = tempfile::tempdir().unwrap();
        let program = shell_program("echo hi");
        let runner = vec!["no-such-runner-xyz".to_string()];

        let err = run(&program, &runner, root.path(), TIMEOUT).unwrap_err();
        assert!(matches!(err, SandboxError::Exec(ExecError::Launch { .. })));
    }

    #[test]
    fn test_cleanup_after_success_and_failure() {
        let root = tempfile::tempdir().unwrap();
        let temp_dir = root.path().join(format!(".prerender-{}", process::id()));

        let ok = shell_program("true");
        run(&ok, &sh_runner(), root.path(), TIMEOUT).unwrap();
        assert!(!temp_dir.exists());

        let bad = shell_program("exit 1");
        let _ = run(&bad, &sh_runner(), root.path(), TIMEOUT).unwrap_err();
        assert!(!temp_dir.exists());
    }

    #[test]
    fn test_run_timeout() {
        let root = tempfile::tempdir().unwrap();
        let temp_dir = root.path().join(format!(".prerender-{}", process::id()));
        let program = shell_program("sleep 30");

        let err = run(
            &program,
            &sh_runner(),
            root.path(),
            Duration::from_millis(200),
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::Exec(ExecError::TimedOut { .. })));
        assert!(!temp_dir.exists());
    }
}
