//! Folder synchronization workflows between this host, the cluster master,
//! its slaves and HDFS.
//!
//! Each workflow is planned as a fixed list of steps (see [`plan`]) and then
//! executed strictly in order with [`ExceptionPolicy::FailOnNonZeroExit`].
//! The first failing step aborts the workflow and its error is returned
//! unchanged. Nothing is retried or rolled back.

pub mod plan;

#[cfg(test)]
mod tests;

pub use plan::{Invocation, SyncPlan, SyncPlanner, SyncStep};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::XchangeConfig;
use crate::error::Result;
use crate::exec::{
    ExceptionPolicy, ExecutionResult, LocalExecutor, RemoteDispatcher, ShellContext,
};
use crate::paths::resolve_absolute;
use crate::subprocess::{ProcessCommand, ProcessRunner};

/// A requested workflow with its (possibly relative) paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workflow {
    ToMasterAndSlave {
        local: PathBuf,
        target: PathBuf,
        slave_index: u32,
    },
    FromSlave {
        remote: PathBuf,
        local: PathBuf,
        slave_index: u32,
    },
    ToMaster {
        local: PathBuf,
        target: PathBuf,
    },
    FromMaster {
        remote: PathBuf,
        local: PathBuf,
    },
    ToHdfs {
        local: PathBuf,
        hdfs_target: PathBuf,
    },
    FromHdfs {
        hdfs_source: PathBuf,
        local: PathBuf,
    },
    CopyFolderToHdfs {
        local: PathBuf,
        hdfs_target: PathBuf,
    },
    DeleteInHdfs {
        hdfs_target: PathBuf,
    },
}

impl Workflow {
    pub fn name(&self) -> &'static str {
        match self {
            Workflow::ToMasterAndSlave { .. } => "to-master-and-slave",
            Workflow::FromSlave { .. } => "from-slave",
            Workflow::ToMaster { .. } => "to-master",
            Workflow::FromMaster { .. } => "from-master",
            Workflow::ToHdfs { .. } => "to-hdfs",
            Workflow::FromHdfs { .. } => "from-hdfs",
            Workflow::CopyFolderToHdfs { .. } => "copy-to-hdfs",
            Workflow::DeleteInHdfs { .. } => "delete-in-hdfs",
        }
    }

    /// Resolve every path to its absolute form and build the step list.
    pub fn plan(&self, planner: &SyncPlanner) -> Result<SyncPlan> {
        let plan = match self {
            Workflow::ToMasterAndSlave {
                local,
                target,
                slave_index,
            } => planner.to_master_and_slave(
                &resolve_absolute(local)?,
                &resolve_absolute(target)?,
                *slave_index,
            ),
            Workflow::FromSlave {
                remote,
                local,
                slave_index,
            } => planner.from_slave(
                &resolve_absolute(remote)?,
                &resolve_absolute(local)?,
                *slave_index,
            ),
            Workflow::ToMaster { local, target } => {
                planner.to_master(&resolve_absolute(local)?, &resolve_absolute(target)?)
            }
            Workflow::FromMaster { remote, local } => {
                planner.from_master(&resolve_absolute(remote)?, &resolve_absolute(local)?)
            }
            Workflow::ToHdfs { local, hdfs_target } => {
                planner.to_hdfs(&resolve_absolute(local)?, &resolve_absolute(hdfs_target)?)
            }
            Workflow::FromHdfs { hdfs_source, local } => {
                planner.from_hdfs(&resolve_absolute(hdfs_source)?, &resolve_absolute(local)?)
            }
            Workflow::CopyFolderToHdfs { local, hdfs_target } => planner.copy_folder_to_hdfs(
                &resolve_absolute(local)?,
                &resolve_absolute(hdfs_target)?,
            ),
            Workflow::DeleteInHdfs { hdfs_target } => {
                planner.delete_in_hdfs(&resolve_absolute(hdfs_target)?)
            }
        };

        Ok(plan)
    }
}

/// Entry point for every workflow. Holds no state between calls.
#[derive(Clone)]
pub struct SyncOrchestrator {
    executor: LocalExecutor,
    dispatcher: RemoteDispatcher,
    shell: ShellContext,
    planner: SyncPlanner,
}

impl SyncOrchestrator {
    pub fn new(runner: Arc<dyn ProcessRunner>, config: &XchangeConfig) -> Self {
        let executor = LocalExecutor::new(runner);
        let shell = ShellContext::from_config(config);
        let dispatcher = RemoteDispatcher::new(
            executor.clone(),
            shell.clone(),
            config.scripts.run_on_master.clone(),
        );

        Self {
            executor,
            dispatcher,
            shell,
            planner: SyncPlanner::new(config.scripts.clone()),
        }
    }

    pub fn planner(&self) -> &SyncPlanner {
        &self.planner
    }

    /// The exact process invocation a step turns into.
    pub fn command_for(&self, step: &SyncStep) -> ProcessCommand {
        match &step.invocation {
            Invocation::Local { script, args } => self.shell.script_command(script, args),
            Invocation::Master { executable, args } => {
                self.dispatcher.forwarding_command(executable, args)
            }
        }
    }

    /// Run every step of `plan` in order; stop at the first failure.
    /// Returns the plan's HDFS URI, if it has one.
    pub async fn execute(&self, plan: &SyncPlan) -> Result<Option<String>> {
        let total = plan.len();

        for (index, step) in plan.steps.iter().enumerate() {
            tracing::info!("[{}/{}] {}", index + 1, total, step.description);

            let command = self.command_for(step);
            if let Err(e) = self
                .executor
                .run_locally(command, ExceptionPolicy::FailOnNonZeroExit)
                .await
            {
                tracing::error!(
                    "Step {}/{} failed ({}): {}",
                    index + 1,
                    total,
                    step.description,
                    e
                );
                return Err(e);
            }
        }

        Ok(plan.hdfs_uri.clone())
    }

    pub async fn run_workflow(&self, workflow: &Workflow) -> Result<Option<String>> {
        let plan = workflow.plan(&self.planner)?;
        tracing::debug!("Running {} with {} steps", workflow.name(), plan.len());
        self.execute(&plan).await
    }

    pub async fn sync_folder_to_master_and_slave(
        &self,
        local: &Path,
        target: &Path,
        slave_index: u32,
    ) -> Result<()> {
        self.run_workflow(&Workflow::ToMasterAndSlave {
            local: local.to_path_buf(),
            target: target.to_path_buf(),
            slave_index,
        })
        .await
        .map(|_| ())
    }

    pub async fn sync_folder_from_slave(
        &self,
        remote: &Path,
        local: &Path,
        slave_index: u32,
    ) -> Result<()> {
        self.run_workflow(&Workflow::FromSlave {
            remote: remote.to_path_buf(),
            local: local.to_path_buf(),
            slave_index,
        })
        .await
        .map(|_| ())
    }

    pub async fn sync_folder_to_master(&self, local: &Path, target: &Path) -> Result<()> {
        self.run_workflow(&Workflow::ToMaster {
            local: local.to_path_buf(),
            target: target.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    pub async fn sync_folder_from_master(&self, remote: &Path, local: &Path) -> Result<()> {
        self.run_workflow(&Workflow::FromMaster {
            remote: remote.to_path_buf(),
            local: local.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    /// Replace `hdfs_target` with the contents of `local`; returns its URI.
    pub async fn sync_folder_to_hdfs(&self, local: &Path, hdfs_target: &Path) -> Result<String> {
        self.run_hdfs_workflow(Workflow::ToHdfs {
            local: local.to_path_buf(),
            hdfs_target: hdfs_target.to_path_buf(),
        })
        .await
    }

    pub async fn sync_folder_from_hdfs(&self, hdfs_source: &Path, local: &Path) -> Result<()> {
        self.run_workflow(&Workflow::FromHdfs {
            hdfs_source: hdfs_source.to_path_buf(),
            local: local.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    /// Copy `local` into `hdfs_target` without deleting it first.
    pub async fn copy_folder_to_hdfs(&self, local: &Path, hdfs_target: &Path) -> Result<String> {
        self.run_hdfs_workflow(Workflow::CopyFolderToHdfs {
            local: local.to_path_buf(),
            hdfs_target: hdfs_target.to_path_buf(),
        })
        .await
    }

    pub async fn delete_folder_in_hdfs(&self, hdfs_target: &Path) -> Result<String> {
        self.run_hdfs_workflow(Workflow::DeleteInHdfs {
            hdfs_target: hdfs_target.to_path_buf(),
        })
        .await
    }

    async fn run_hdfs_workflow(&self, workflow: Workflow) -> Result<String> {
        let plan = workflow.plan(&self.planner)?;
        let uri = plan.hdfs_uri.clone().unwrap_or_default();
        self.execute(&plan).await?;
        Ok(uri)
    }

    /// Run an ad-hoc command on the master with an explicit policy.
    pub async fn run_on_master(
        &self,
        executable: &str,
        args: &[String],
        policy: ExceptionPolicy,
    ) -> Result<ExecutionResult> {
        self.dispatcher.run_on_master(executable, args, policy).await
    }

    /// Run an ad-hoc command on this host with an explicit policy.
    pub async fn run_locally(
        &self,
        command: ProcessCommand,
        policy: ExceptionPolicy,
    ) -> Result<ExecutionResult> {
        self.executor.run_locally(command, policy).await
    }
}
