use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, trace, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use cluster_xchange::config::ConfigLoader;
use cluster_xchange::subprocess::SubprocessManager;
use cluster_xchange::sync::{Invocation, SyncStep};
use cluster_xchange::{ExceptionPolicy, SyncError, SyncOrchestrator, Workflow};

/// Stage folders between this machine, the cluster master, its slaves and HDFS
#[derive(Parser)]
#[command(name = "cluster-xchange", version)]
#[command(about = "Stage folders between this machine, the cluster master, its slaves and HDFS", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Print the commands a workflow would run without running them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync a local folder to a directory on the master
    ToMaster { local: PathBuf, target: PathBuf },
    /// Sync a directory on the master to a local folder
    FromMaster { remote: PathBuf, local: PathBuf },
    /// Sync a local folder to the master and one slave
    ToMasterAndSlave {
        local: PathBuf,
        target: PathBuf,
        /// Index of the slave node
        #[arg(long, default_value_t = 0)]
        slave: u32,
    },
    /// Sync a directory on a slave to a local folder
    FromSlave {
        remote: PathBuf,
        local: PathBuf,
        /// Index of the slave node
        #[arg(long, default_value_t = 0)]
        slave: u32,
    },
    /// Replace an HDFS directory with the contents of a local folder
    ToHdfs { local: PathBuf, hdfs: PathBuf },
    /// Copy an HDFS directory into a local folder
    FromHdfs { hdfs: PathBuf, local: PathBuf },
    /// Copy a local folder into HDFS, overwriting files in place
    CopyToHdfs { local: PathBuf, hdfs: PathBuf },
    /// Recursively delete an HDFS directory
    DeleteInHdfs { hdfs: PathBuf },
    /// Run a command on the master through the forwarding script
    RunOnMaster {
        /// Exit with the remote exit code instead of failing on non-zero
        #[arg(long)]
        return_exit_code: bool,
        /// Executable followed by its arguments, forwarded verbatim
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

enum Action {
    Workflow(Workflow),
    RunOnMaster {
        executable: String,
        args: Vec<String>,
        policy: ExceptionPolicy,
    },
}

impl Commands {
    fn into_action(self) -> Action {
        let workflow = match self {
            Commands::ToMaster { local, target } => Workflow::ToMaster { local, target },
            Commands::FromMaster { remote, local } => Workflow::FromMaster { remote, local },
            Commands::ToMasterAndSlave {
                local,
                target,
                slave,
            } => Workflow::ToMasterAndSlave {
                local,
                target,
                slave_index: slave,
            },
            Commands::FromSlave {
                remote,
                local,
                slave,
            } => Workflow::FromSlave {
                remote,
                local,
                slave_index: slave,
            },
            Commands::ToHdfs { local, hdfs } => Workflow::ToHdfs {
                local,
                hdfs_target: hdfs,
            },
            Commands::FromHdfs { hdfs, local } => Workflow::FromHdfs {
                hdfs_source: hdfs,
                local,
            },
            Commands::CopyToHdfs { local, hdfs } => Workflow::CopyFolderToHdfs {
                local,
                hdfs_target: hdfs,
            },
            Commands::DeleteInHdfs { hdfs } => Workflow::DeleteInHdfs { hdfs_target: hdfs },
            Commands::RunOnMaster {
                return_exit_code,
                mut command,
            } => {
                let policy = if return_exit_code {
                    ExceptionPolicy::ReturnExitCode
                } else {
                    ExceptionPolicy::FailOnNonZeroExit
                };
                // clap guarantees at least one value
                let args = command.split_off(1);
                let executable = command.pop().unwrap_or_default();
                return Action::RunOnMaster {
                    executable,
                    args,
                    policy,
                };
            }
        };
        Action::Workflow(workflow)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<SyncError>()
                .map(SyncError::exit_code)
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}

type FilterHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Install the subscriber before anything logs. Without `-v` the filter
/// starts at `info` and is replaced by the configured level once loaded.
fn init_tracing(verbose: u8) -> FilterHandle {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let (filter, handle) = reload::Layer::new(EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose >= 2)
                .with_line_number(verbose >= 2),
        )
        .init();
    handle
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let filter = init_tracing(cli.verbose);
    debug!("cluster-xchange started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_explicit_path(path);
    }
    let config = loader
        .load()
        .await
        .context("failed to load configuration")?;

    if cli.verbose == 0 {
        if let Err(e) = filter.reload(EnvFilter::new(&config.log_level)) {
            warn!("Could not apply log level {}: {}", config.log_level, e);
        }
    }

    let orchestrator = SyncOrchestrator::new(SubprocessManager::production().runner(), &config);

    match cli.command.into_action() {
        Action::Workflow(workflow) => run_workflow(&orchestrator, workflow, cli.dry_run).await,
        Action::RunOnMaster {
            executable,
            args,
            policy,
        } => run_on_master(&orchestrator, &executable, &args, policy, cli.dry_run).await,
    }
}

async fn run_workflow(
    orchestrator: &SyncOrchestrator,
    workflow: Workflow,
    dry_run: bool,
) -> anyhow::Result<i32> {
    let plan = workflow.plan(orchestrator.planner())?;

    if dry_run {
        println!("{} ({} steps)", workflow.name(), plan.len());
        for (index, step) in plan.steps.iter().enumerate() {
            println!("{}. {}", index + 1, step.description);
            println!("   {}", orchestrator.command_for(step).display_line());
        }
    } else {
        orchestrator.execute(&plan).await?;
    }

    if let Some(uri) = &plan.hdfs_uri {
        println!("{uri}");
    }
    Ok(0)
}

async fn run_on_master(
    orchestrator: &SyncOrchestrator,
    executable: &str,
    args: &[String],
    policy: ExceptionPolicy,
    dry_run: bool,
) -> anyhow::Result<i32> {
    if dry_run {
        let step = SyncStep {
            description: format!("run {executable} on master"),
            invocation: Invocation::Master {
                executable: executable.to_string(),
                args: args.to_vec(),
            },
        };
        println!("{}", orchestrator.command_for(&step).display_line());
        return Ok(0);
    }

    let result = orchestrator.run_on_master(executable, args, policy).await?;
    print!("{}", result.stdout);
    eprint!("{}", result.stderr);
    std::io::stdout().flush()?;
    Ok(result.exit_code)
}
