//! External command execution.
//!
//! Builder-based API for running a subprocess with captured output and a
//! bounded wait. Output is drained on reader threads so a chatty child can
//! never deadlock against a full pipe while we poll for exit.

// Parts of the builder are exercised only from tests
#![allow(dead_code)]

use std::{
    ffi::{OsStr, OsString},
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};
use thiserror::Error;

/// Poll interval while waiting for the child to exit.
const WAIT_POLL: Duration = Duration::from_millis(25);

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch `{program}`")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` did not finish within {}s and was killed", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("I/O error while waiting for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// Combined diagnostic text for error reporting: stderr first, then any
    /// stdout the process managed to produce.
    pub fn diagnostic(&self) -> String {
        let mut message = self.stderr.trim().to_string();
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str(stdout);
        }
        message
    }
}

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["npx", "ts-node"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs
                .push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Bound the wait for the child; it is killed when the limit expires.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Spawn the command and capture its output until exit or timeout.
    ///
    /// Exit status is reported, not interpreted: a non-zero exit is a
    /// successful capture. Only launch failure, wait failure, and timeout
    /// are errors.
    pub fn capture(self) -> Result<Captured, ExecError> {
        let name = self.program_name();

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ExecError::Launch {
            program: name.clone(),
            source,
        })?;

        let stdout_handle = drain(child.stdout.take());
        let stderr_handle = drain(child.stderr.take());

        let status = wait_bounded(&mut child, self.timeout, &name)?;

        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();

        Ok(Captured {
            status,
            stdout,
            stderr,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a child pipe to EOF on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buffer);
        }
        buffer
    })
}

/// Wait for the child, polling against the deadline when one is set.
fn wait_bounded(
    child: &mut Child,
    timeout: Option<Duration>,
    name: &str,
) -> Result<ExitStatus, ExecError> {
    let wait_err = |source| ExecError::Wait {
        program: name.to_string(),
        source,
    };

    let Some(limit) = timeout else {
        return child.wait().map_err(wait_err);
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().map_err(wait_err)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            // Kill and reap so the reader threads see EOF
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExecError::TimedOut {
                program: name.to_string(),
                timeout: limit,
            });
        }
        thread::sleep(WAIT_POLL);
    }
}

// ============================================================================
// Tests
// ============================================================================
