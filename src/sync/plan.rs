//! Pure construction of workflow step lists.
//!
//! A [`SyncPlan`] is the full, ordered list of invocations a workflow will
//! issue. Plans are built from absolute paths only and perform no I/O, so
//! they can be printed for a dry run or executed step by step.

use std::fmt;
use std::path::Path;

use crate::config::ScriptNames;
use crate::paths::{dir_arg, staging_path, to_distributed_uri, StagingDirection};

/// Where a step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A local script run with the configured shell.
    Local { script: String, args: Vec<String> },
    /// A command forwarded to the master.
    Master { executable: String, args: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStep {
    pub description: String,
    pub invocation: Invocation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub steps: Vec<SyncStep>,
    /// HDFS URI the workflow reports back, for HDFS workflows.
    pub hdfs_uri: Option<String>,
}

impl SyncPlan {
    fn single(step: SyncStep) -> Self {
        Self {
            steps: vec![step],
            hdfs_uri: None,
        }
    }

    fn push(mut self, step: SyncStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Append all steps of `other`, keeping this plan's URI.
    fn then(mut self, other: SyncPlan) -> Self {
        self.steps.extend(other.steps);
        self
    }

    fn reporting(mut self, uri: String) -> Self {
        self.hdfs_uri = Some(uri);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (tier, program, args) = match self {
            Invocation::Local { script, args } => ("local", script, args),
            Invocation::Master { executable, args } => ("master", executable, args),
        };
        write!(f, "{}: {}", tier, program)?;
        if !args.is_empty() {
            write!(f, " {}", shell_words::join(args))?;
        }
        Ok(())
    }
}

fn local(description: String, script: &str, args: Vec<String>) -> SyncStep {
    SyncStep {
        description,
        invocation: Invocation::Local {
            script: script.to_string(),
            args,
        },
    }
}

fn master(description: String, executable: &str, args: &[&str]) -> SyncStep {
    SyncStep {
        description,
        invocation: Invocation::Master {
            executable: executable.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        },
    }
}

/// Builds plans for every workflow from the configured script names.
#[derive(Debug, Clone)]
pub struct SyncPlanner {
    scripts: ScriptNames,
}

impl SyncPlanner {
    pub fn new(scripts: ScriptNames) -> Self {
        Self { scripts }
    }

    pub fn to_master_and_slave(&self, local: &Path, target: &Path, slave_index: u32) -> SyncPlan {
        SyncPlan::single(local_sync(
            format!(
                "sync {} to master and slave {} at {}",
                local.display(),
                slave_index,
                target.display()
            ),
            &self.scripts.sync_to_master_and_slave,
            local,
            target,
            Some(slave_index),
        ))
    }

    pub fn from_slave(&self, remote: &Path, local: &Path, slave_index: u32) -> SyncPlan {
        SyncPlan::single(local_sync(
            format!(
                "sync {} from slave {} to {}",
                remote.display(),
                slave_index,
                local.display()
            ),
            &self.scripts.sync_from_slave,
            remote,
            local,
            Some(slave_index),
        ))
    }

    pub fn to_master(&self, local: &Path, target: &Path) -> SyncPlan {
        SyncPlan::single(ensure_dir_on_master(target)).push(local_sync(
            format!("sync {} to master at {}", local.display(), target.display()),
            &self.scripts.sync_to_master,
            local,
            target,
            None,
        ))
    }

    pub fn from_master(&self, remote: &Path, local: &Path) -> SyncPlan {
        SyncPlan::single(local_sync(
            format!("sync {} from master to {}", remote.display(), local.display()),
            &self.scripts.sync_from_master,
            remote,
            local,
            None,
        ))
    }

    /// Replace the HDFS directory with the contents of `local`.
    pub fn to_hdfs(&self, local: &Path, hdfs_target: &Path) -> SyncPlan {
        self.delete_in_hdfs(hdfs_target)
            .then(self.copy_folder_to_hdfs(local, hdfs_target))
            .reporting(to_distributed_uri(hdfs_target))
    }

    /// Copy `local` into HDFS through the `to-hdfs` staging directory,
    /// overwriting files in place without deleting the target first.
    pub fn copy_folder_to_hdfs(&self, local: &Path, hdfs_target: &Path) -> SyncPlan {
        let staging = staging_path(StagingDirection::ToHdfs, hdfs_target);
        let uri = to_distributed_uri(hdfs_target);
        let staged_contents = format!("{}*", dir_arg(&staging));
        let uri_dir = format!("{}/", uri);

        let plan = self
            .to_master(local, &staging)
            .push(master(
                format!("create {uri}"),
                "hadoop",
                &["fs", "-mkdir", "-p", uri.as_str()],
            ))
            .push(master(
                format!("copy {} into {}", staging.display(), uri),
                "hadoop",
                &[
                    "fs",
                    "-copyFromLocal",
                    "-f",
                    "-p",
                    staged_contents.as_str(),
                    uri_dir.as_str(),
                ],
            ));
        plan.reporting(uri)
    }

    /// Pull an HDFS directory to `local` through the `from-hdfs` staging
    /// directory, which is wiped and recreated first.
    pub fn from_hdfs(&self, hdfs_source: &Path, local: &Path) -> SyncPlan {
        let staging = staging_path(StagingDirection::FromHdfs, hdfs_source);
        let staging_str = staging.to_string_lossy().into_owned();
        let uri = to_distributed_uri(hdfs_source);
        let uri_contents = format!("{}/*", uri);
        let staging_dir = dir_arg(&staging);

        SyncPlan::single(master(
            format!("clear staging directory {staging_str}"),
            "rm",
            &["-rf", staging_str.as_str()],
        ))
        .push(ensure_dir_on_master(&staging))
        .push(master(
            format!("copy {} into {}", uri, staging_str),
            "hadoop",
            &[
                "fs",
                "-copyToLocal",
                uri_contents.as_str(),
                staging_dir.as_str(),
            ],
        ))
        .then(self.from_master(&staging, local))
    }

    pub fn delete_in_hdfs(&self, hdfs_target: &Path) -> SyncPlan {
        let uri = to_distributed_uri(hdfs_target);
        let plan = SyncPlan::single(master(
            format!("delete {uri}"),
            "hadoop",
            &["fs", "-rm", "-f", "-r", uri.as_str()],
        ));
        plan.reporting(uri)
    }
}

fn ensure_dir_on_master(dir: &Path) -> SyncStep {
    let dir = dir.to_string_lossy().into_owned();
    master(format!("create {dir} on master"), "mkdir", &["-p", dir.as_str()])
}

fn local_sync(
    description: String,
    script: &str,
    source: &Path,
    destination: &Path,
    slave_index: Option<u32>,
) -> SyncStep {
    let mut args = vec![dir_arg(source), dir_arg(destination)];
    if let Some(index) = slave_index {
        args.push(index.to_string());
    }
    local(description, script, args)
}
