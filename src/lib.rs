//! # cluster-xchange
//!
//! Moves folders between this workstation, a cluster master, its slaves and
//! HDFS by driving external forwarding scripts.
//!
//! ## Modules
//!
//! - `subprocess` - `ProcessRunner` seam with a tokio runner and a recording mock
//! - `exec` - local executor, exit-code policy and the master dispatcher
//! - `paths` - HDFS URIs and staging directories on the master
//! - `sync` - workflow planning and the orchestrator that runs plans
//! - `config` - TOML and environment configuration of scripts and logging
//! - `error` - error type with numeric codes
pub mod config;
pub mod error;
pub mod exec;
pub mod paths;
pub mod subprocess;
pub mod sync;

pub use error::{Result, SyncError};
pub use exec::{ExceptionPolicy, ExecutionResult};
pub use sync::{SyncOrchestrator, Workflow};
