//! Execution tiers.
//!
//! [`LocalExecutor`] runs one process on this host and applies an
//! [`ExceptionPolicy`] to its exit code. [`RemoteDispatcher`] wraps a command
//! in the forwarding script so that it runs on the cluster master.

pub mod local;
pub mod remote;

pub use local::LocalExecutor;
pub use remote::RemoteDispatcher;

use std::path::PathBuf;

use crate::config::XchangeConfig;
use crate::error::{Result, SyncError};
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder, ProcessOutput};

/// Outcome of one completed process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

impl From<ProcessOutput> for ExecutionResult {
    fn from(output: ProcessOutput) -> Self {
        Self {
            exit_code: output.status.shell_code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// How a completed command with a non-zero exit code is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceptionPolicy {
    #[default]
    FailOnNonZeroExit,
    ReturnExitCode,
}

impl ExceptionPolicy {
    /// Turn a finished result into the caller's outcome. Never affects launch.
    pub fn apply(self, command_line: &str, result: ExecutionResult) -> Result<ExecutionResult> {
        match self {
            ExceptionPolicy::ReturnExitCode => Ok(result),
            ExceptionPolicy::FailOnNonZeroExit if result.success() => Ok(result),
            ExceptionPolicy::FailOnNonZeroExit => Err(SyncError::CommandFailed {
                command: command_line.to_string(),
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            }),
        }
    }
}

/// Interpreter and script directory shared by every local script invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellContext {
    pub shell: String,
    pub scripts_dir: Option<PathBuf>,
}

impl ShellContext {
    pub fn new(shell: impl Into<String>, scripts_dir: Option<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            scripts_dir,
        }
    }

    pub fn from_config(config: &XchangeConfig) -> Self {
        Self::new(config.shell.clone(), config.scripts_dir.clone())
    }

    /// `<shell> <script> <args...>`, run from the script directory.
    pub fn script_command<I, S>(&self, script: &str, args: I) -> ProcessCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ProcessCommandBuilder::new(&self.shell)
            .arg(script)
            .args(args)
            .current_dir_opt(self.scripts_dir.as_deref())
            .build()
    }
}
