use std::path::PathBuf;
use thiserror::Error;

use crate::subprocess::ProcessError;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Errors surfaced by the executor, the dispatcher and every sync workflow.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The process could not be started at all.
    #[error("[E{code:04}] Failed to launch `{command}`: {source}", code = launch_code(.source))]
    LaunchFailed {
        command: String,
        #[source]
        source: ProcessError,
    },

    /// The process ran and exited non-zero under the strict policy.
    #[error(
        "[E{code:04}] Failed to execute `{command}` (exit code {exit_code})\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}",
        code = ErrorCode::EXEC_SUBPROCESS_FAILED
    )]
    CommandFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("[E{code:04}] Invalid command line `{line}`: {message}", code = ErrorCode::EXEC_INVALID_COMMAND_LINE)]
    InvalidCommandLine { line: String, message: String },

    #[error("[E{code:04}] I/O error for {path:?}: {source}", code = ErrorCode::FS_IO_ERROR)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[E{code:04}] Configuration error: {message}")]
    Config { code: u16, message: String },
}

fn launch_code(source: &ProcessError) -> u16 {
    match source {
        ProcessError::CommandNotFound(_) => ErrorCode::EXEC_COMMAND_NOT_FOUND,
        _ => ErrorCode::EXEC_SPAWN_FAILED,
    }
}

impl SyncError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_GENERIC,
            message: message.into(),
        }
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::LaunchFailed { source, .. } => launch_code(source),
            Self::CommandFailed { .. } => ErrorCode::EXEC_SUBPROCESS_FAILED,
            Self::InvalidCommandLine { .. } => ErrorCode::EXEC_INVALID_COMMAND_LINE,
            Self::Io { .. } => ErrorCode::FS_IO_ERROR,
            Self::Config { code, .. } => *code,
        }
    }

    /// Get the process exit code the binary reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Io { .. } => 4,
            Self::LaunchFailed { .. }
            | Self::CommandFailed { .. }
            | Self::InvalidCommandLine { .. } => 5,
        }
    }

    /// Exit code of the failed command, when one ran to completion
    pub fn command_exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
