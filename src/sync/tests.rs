use super::*;
use crate::error::SyncError;
use crate::subprocess::{MockProcessRunner, ProcessCommandBuilder};

fn orchestrator(mock: &MockProcessRunner) -> SyncOrchestrator {
    let config = XchangeConfig {
        scripts_dir: Some(PathBuf::from("/opt/cluster-scripts")),
        ..Default::default()
    };
    SyncOrchestrator::new(Arc::new(mock.clone()), &config)
}

fn all_succeed() -> MockProcessRunner {
    let mut mock = MockProcessRunner::new();
    mock.expect_command("/bin/bash").returns_success().finish();
    mock
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_to_master_and_slave_issues_one_command() {
    let mock = all_succeed();

    orchestrator(&mock)
        .sync_folder_to_master_and_slave(Path::new("/a/b"), Path::new("/x/y"), 2)
        .await
        .unwrap();

    let history = mock.get_call_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].program, "/bin/bash");
    assert_eq!(
        history[0].args,
        strings(&["sync-to-dcos-master-and-slave.sh", "/a/b/", "/x/y/", "2"])
    );
    assert_eq!(
        history[0].working_dir,
        Some(PathBuf::from("/opt/cluster-scripts"))
    );
}

#[tokio::test]
async fn test_from_slave_passes_slave_index() {
    let mock = all_succeed();

    orchestrator(&mock)
        .sync_folder_from_slave(Path::new("/remote/logs"), Path::new("/tmp/logs"), 3)
        .await
        .unwrap();

    assert_eq!(
        mock.recorded_args(),
        vec![strings(&[
            "sync-from-slave-to-local.sh",
            "/remote/logs/",
            "/tmp/logs/",
            "3"
        ])]
    );
}

#[tokio::test]
async fn test_to_master_creates_directory_then_syncs() {
    let mock = all_succeed();

    orchestrator(&mock)
        .sync_folder_to_master(Path::new("/a/b"), Path::new("/x/y"))
        .await
        .unwrap();

    assert_eq!(
        mock.recorded_args(),
        vec![
            strings(&["run-on-dcos-master.sh", "mkdir", "-p", "/x/y"]),
            strings(&["sync-to-dcos-master.sh", "/a/b/", "/x/y/"]),
        ]
    );
}

#[tokio::test]
async fn test_from_master_single_step() {
    let mock = all_succeed();

    orchestrator(&mock)
        .sync_folder_from_master(Path::new("/x/y"), Path::new("/a/b"))
        .await
        .unwrap();

    assert_eq!(
        mock.recorded_args(),
        vec![strings(&["sync-from-master-to-local.sh", "/x/y/", "/a/b/"])]
    );
}

#[tokio::test]
async fn test_to_hdfs_issues_steps_in_order_and_returns_uri() {
    let mock = all_succeed();

    let uri = orchestrator(&mock)
        .sync_folder_to_hdfs(Path::new("/a/b"), Path::new("/x/y"))
        .await
        .unwrap();

    assert_eq!(uri, "hdfs://hdfs/x/y");
    assert_eq!(
        mock.recorded_args(),
        vec![
            strings(&[
                "run-on-dcos-master.sh",
                "hadoop",
                "fs",
                "-rm",
                "-f",
                "-r",
                "hdfs://hdfs/x/y"
            ]),
            strings(&[
                "run-on-dcos-master.sh",
                "mkdir",
                "-p",
                "/tmp/hdfs-xchange/to-hdfs/x/y"
            ]),
            strings(&[
                "sync-to-dcos-master.sh",
                "/a/b/",
                "/tmp/hdfs-xchange/to-hdfs/x/y/"
            ]),
            strings(&[
                "run-on-dcos-master.sh",
                "hadoop",
                "fs",
                "-mkdir",
                "-p",
                "hdfs://hdfs/x/y"
            ]),
            strings(&[
                "run-on-dcos-master.sh",
                "hadoop",
                "fs",
                "-copyFromLocal",
                "-f",
                "-p",
                "/tmp/hdfs-xchange/to-hdfs/x/y/*",
                "hdfs://hdfs/x/y/"
            ]),
        ]
    );
}

#[tokio::test]
async fn test_to_hdfs_stops_when_staging_sync_fails() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command("/bin/bash")
        .with_args(|args| args.first().map(String::as_str) == Some("sync-to-dcos-master.sh"))
        .returns_stdout("sending incremental file list")
        .returns_stderr("rsync: connection unexpectedly closed")
        .returns_exit_code(12)
        .finish();
    mock.expect_command("/bin/bash").returns_success().finish();

    let err = orchestrator(&mock)
        .sync_folder_to_hdfs(Path::new("/a/b"), Path::new("/x/y"))
        .await
        .unwrap_err();

    match err {
        SyncError::CommandFailed {
            command,
            exit_code,
            stdout,
            stderr,
        } => {
            assert!(command.contains("sync-to-dcos-master.sh"));
            assert_eq!(exit_code, 12);
            assert_eq!(stdout, "sending incremental file list");
            assert_eq!(stderr, "rsync: connection unexpectedly closed");
        }
        other => panic!("Expected CommandFailed, got {other:?}"),
    }

    let history = mock.recorded_args();
    assert_eq!(history.len(), 3);
    assert!(history
        .iter()
        .all(|args| !args.contains(&"-copyFromLocal".to_string())));
    assert!(history
        .iter()
        .all(|args| !args.contains(&"-mkdir".to_string())));
}

#[tokio::test]
async fn test_to_hdfs_stops_when_delete_fails() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command("/bin/bash")
        .returns_stderr("rm: Permission denied")
        .returns_exit_code(1)
        .finish();

    let err = orchestrator(&mock)
        .sync_folder_to_hdfs(Path::new("/a/b"), Path::new("/x/y"))
        .await
        .unwrap_err();

    assert_eq!(err.command_exit_code(), Some(1));
    assert_eq!(mock.get_call_history().len(), 1);
}

#[tokio::test]
async fn test_copy_folder_to_hdfs_does_not_delete() {
    let mock = all_succeed();

    let uri = orchestrator(&mock)
        .copy_folder_to_hdfs(Path::new("/a/b"), Path::new("/x/y"))
        .await
        .unwrap();

    assert_eq!(uri, "hdfs://hdfs/x/y");
    let history = mock.recorded_args();
    assert_eq!(history.len(), 4);
    assert!(history.iter().all(|args| !args.contains(&"-rm".to_string())));
}

#[tokio::test]
async fn test_delete_folder_in_hdfs() {
    let mock = all_succeed();

    let uri = orchestrator(&mock)
        .delete_folder_in_hdfs(Path::new("/x/y"))
        .await
        .unwrap();

    assert_eq!(uri, "hdfs://hdfs/x/y");
    assert_eq!(
        mock.recorded_args(),
        vec![strings(&[
            "run-on-dcos-master.sh",
            "hadoop",
            "fs",
            "-rm",
            "-f",
            "-r",
            "hdfs://hdfs/x/y"
        ])]
    );
}

#[tokio::test]
async fn test_from_hdfs_cleans_staging_before_copy() {
    let mock = all_succeed();

    orchestrator(&mock)
        .sync_folder_from_hdfs(Path::new("/x/y"), Path::new("/a/b"))
        .await
        .unwrap();

    assert_eq!(
        mock.recorded_args(),
        vec![
            strings(&[
                "run-on-dcos-master.sh",
                "rm",
                "-rf",
                "/tmp/hdfs-xchange/from-hdfs/x/y"
            ]),
            strings(&[
                "run-on-dcos-master.sh",
                "mkdir",
                "-p",
                "/tmp/hdfs-xchange/from-hdfs/x/y"
            ]),
            strings(&[
                "run-on-dcos-master.sh",
                "hadoop",
                "fs",
                "-copyToLocal",
                "hdfs://hdfs/x/y/*",
                "/tmp/hdfs-xchange/from-hdfs/x/y/"
            ]),
            strings(&[
                "sync-from-master-to-local.sh",
                "/tmp/hdfs-xchange/from-hdfs/x/y/",
                "/a/b/"
            ]),
        ]
    );
}

#[tokio::test]
async fn test_from_hdfs_copy_failure_skips_local_sync() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command("/bin/bash")
        .with_args(|args| args.iter().any(|a| a == "-copyToLocal"))
        .returns_stderr("copyToLocal: `hdfs://hdfs/x/y/*': No such file or directory")
        .returns_exit_code(1)
        .finish();
    mock.expect_command("/bin/bash").returns_success().finish();

    let err = orchestrator(&mock)
        .sync_folder_from_hdfs(Path::new("/x/y"), Path::new("/a/b"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("No such file or directory"));
    assert_eq!(mock.get_call_history().len(), 3);
}

#[tokio::test]
async fn test_relative_paths_are_made_absolute() {
    let mock = all_succeed();
    let cwd = std::env::current_dir().unwrap();

    orchestrator(&mock)
        .sync_folder_from_master(Path::new("/x/y"), Path::new("build/out"))
        .await
        .unwrap();

    let expected_local = format!("{}/", cwd.join("build").join("out").display());
    assert_eq!(mock.recorded_args()[0][2], expected_local);
}

#[tokio::test]
async fn test_run_on_master_with_return_exit_code() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command("/bin/bash")
        .returns_stdout("ls: /nope: No such file or directory")
        .returns_exit_code(2)
        .finish();

    let result = orchestrator(&mock)
        .run_on_master(
            "ls",
            &strings(&["/nope"]),
            ExceptionPolicy::ReturnExitCode,
        )
        .await
        .unwrap();

    assert_eq!(result.exit_code, 2);
    assert_eq!(
        mock.recorded_args(),
        vec![strings(&["run-on-dcos-master.sh", "ls", "/nope"])]
    );
}

#[tokio::test]
async fn test_run_locally_with_return_exit_code() {
    let mut mock = MockProcessRunner::new();
    mock.expect_command("hadoop")
        .returns_stderr("copyToLocal: file exists")
        .returns_exit_code(1)
        .finish();

    let command = ProcessCommandBuilder::new("hadoop")
        .args(["fs", "-copyToLocal", "/a", "/b"])
        .build();
    let result = orchestrator(&mock)
        .run_locally(command, ExceptionPolicy::ReturnExitCode)
        .await
        .unwrap();

    assert_eq!(result.exit_code, 1);
    assert_eq!(result.stderr, "copyToLocal: file exists");
    assert_eq!(
        mock.recorded_args(),
        vec![strings(&["fs", "-copyToLocal", "/a", "/b"])]
    );
}

#[tokio::test]
async fn test_to_hdfs_aborts_when_first_step_cannot_launch() {
    // No expectation registered, so the runner fails to launch the shell
    let mock = MockProcessRunner::new();

    let err = orchestrator(&mock)
        .sync_folder_to_hdfs(Path::new("/a/b"), Path::new("/x/y"))
        .await
        .unwrap_err();

    match err {
        SyncError::LaunchFailed { command, .. } => {
            assert!(command.starts_with("/bin/bash run-on-dcos-master.sh"));
        }
        other => panic!("Expected LaunchFailed, got {other:?}"),
    }
    assert_eq!(mock.get_call_history().len(), 1);
}

#[tokio::test]
async fn test_missing_shell_surfaces_launch_failed() {
    let config = XchangeConfig {
        shell: "no-such-shell-for-cluster-xchange".to_string(),
        ..Default::default()
    };
    let orchestrator =
        SyncOrchestrator::new(Arc::new(crate::subprocess::TokioProcessRunner), &config);

    let err = orchestrator
        .sync_folder_to_hdfs(Path::new("/a/b"), Path::new("/x/y"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::LaunchFailed { .. }));
}

#[test]
fn test_command_for_renders_both_tiers() {
    let mock = MockProcessRunner::new();
    let orchestrator = orchestrator(&mock);
    let plan = orchestrator
        .planner()
        .to_master(Path::new("/a/b"), Path::new("/x/y"));

    let mkdir = orchestrator.command_for(&plan.steps[0]);
    let sync = orchestrator.command_for(&plan.steps[1]);

    assert_eq!(
        mkdir.display_line(),
        "/bin/bash run-on-dcos-master.sh mkdir -p /x/y"
    );
    assert_eq!(
        sync.display_line(),
        "/bin/bash sync-to-dcos-master.sh /a/b/ /x/y/"
    );
}

#[test]
fn test_workflow_names() {
    let workflow = Workflow::DeleteInHdfs {
        hdfs_target: PathBuf::from("/x"),
    };
    assert_eq!(workflow.name(), "delete-in-hdfs");
}
