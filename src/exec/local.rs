use std::path::Path;
use std::sync::Arc;

use super::{ExceptionPolicy, ExecutionResult};
use crate::error::{Result, SyncError};
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder, ProcessRunner};

/// Runs exactly one process on this host per call.
#[derive(Clone)]
pub struct LocalExecutor {
    runner: Arc<dyn ProcessRunner>,
}

impl LocalExecutor {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Launch `command`, capture its output and apply `policy` to the exit code.
    ///
    /// Every exit code is accepted at launch level; only `policy` decides
    /// whether a non-zero code becomes [`SyncError::CommandFailed`]. A process
    /// that cannot be started yields [`SyncError::LaunchFailed`].
    pub async fn run_locally(
        &self,
        command: ProcessCommand,
        policy: ExceptionPolicy,
    ) -> Result<ExecutionResult> {
        let command_line = command.display_line();

        let output = self
            .runner
            .run(command)
            .await
            .map_err(|source| SyncError::LaunchFailed {
                command: command_line.clone(),
                source,
            })?;

        let result = ExecutionResult::from(output);
        if !result.success() {
            tracing::debug!(
                "`{}` exited with {} ({:?})",
                command_line,
                result.exit_code,
                policy
            );
        }

        policy.apply(&command_line, result)
    }

    /// Tokenize `line` with shell quoting rules and run it.
    pub async fn run_line(
        &self,
        line: &str,
        working_dir: Option<&Path>,
        policy: ExceptionPolicy,
    ) -> Result<ExecutionResult> {
        let command = parse_command_line(line, working_dir)?;
        self.run_locally(command, policy).await
    }
}

fn parse_command_line(line: &str, working_dir: Option<&Path>) -> Result<ProcessCommand> {
    let words = shell_words::split(line).map_err(|e| SyncError::InvalidCommandLine {
        line: line.to_string(),
        message: e.to_string(),
    })?;

    let (program, args) = words
        .split_first()
        .ok_or_else(|| SyncError::InvalidCommandLine {
            line: line.to_string(),
            message: "no executable given".to_string(),
        })?;

    Ok(ProcessCommandBuilder::new(program)
        .args(args)
        .current_dir_opt(working_dir)
        .build())
}
