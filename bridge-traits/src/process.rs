//! External Process Abstraction
//!
//! The download pipeline shells out to an audio extraction tool and a tagging
//! tool. This trait lets the pipeline describe *what* to run while the host
//! decides *how* (tokio child processes on desktop, fakes in tests).

use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;

/// A fully described external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments as lossy UTF-8, handy for assertions and log lines.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    /// Returns the argument that directly follows `flag`, if any.
    pub fn value_of(&self, flag: &str) -> Option<String> {
        let args = self.args_lossy();
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|idx| args.get(idx + 1).cloned())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Human readable exit status, e.g. `exit status 1`
    pub fn status_description(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands to completion.
///
/// Only the calling task is suspended while the process runs; the executor
/// stays free for other work.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns error only when the process could not be started (missing
    /// binary, permission denied). A non-zero exit is reported through
    /// [`CommandOutput::exit_code`].
    async fn run(&self, command: CommandSpec) -> Result<CommandOutput>;
}
