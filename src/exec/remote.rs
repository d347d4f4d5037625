use super::{ExceptionPolicy, ExecutionResult, LocalExecutor, ShellContext};
use crate::error::Result;
use crate::subprocess::ProcessCommand;

/// Sends commands to the cluster master through the local forwarding script.
///
/// The forwarding script's exit code is the result's exit code, so a broken
/// transport and a failing remote command surface the same way.
#[derive(Clone)]
pub struct RemoteDispatcher {
    executor: LocalExecutor,
    shell: ShellContext,
    forwarding_script: String,
}

impl RemoteDispatcher {
    pub fn new(
        executor: LocalExecutor,
        shell: ShellContext,
        forwarding_script: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            shell,
            forwarding_script: forwarding_script.into(),
        }
    }

    /// `<shell> <forwarding-script> <executable> <args...>`, in that order.
    pub fn forwarding_command(&self, executable: &str, args: &[String]) -> ProcessCommand {
        let forwarded = std::iter::once(executable).chain(args.iter().map(String::as_str));
        self.shell.script_command(&self.forwarding_script, forwarded)
    }

    pub async fn run_on_master(
        &self,
        executable: &str,
        args: &[String],
        policy: ExceptionPolicy,
    ) -> Result<ExecutionResult> {
        let command = self.forwarding_command(executable, args);
        self.executor.run_locally(command, policy).await
    }
}
