//! Configuration for the forwarding scripts and logging.
//!
//! Values are layered: hardcoded defaults, then a TOML file (the global
//! `config.toml` or an explicit `--config` path), then `XCHANGE_*`
//! environment variables.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod loader;

pub use loader::ConfigLoader;

use crate::error::{ErrorCode, Result, SyncError};

/// Valid log levels for configuration validation.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub const ENV_SHELL: &str = "XCHANGE_SHELL";
pub const ENV_SCRIPTS_DIR: &str = "XCHANGE_SCRIPTS_DIR";
pub const ENV_LOG_LEVEL: &str = "XCHANGE_LOG_LEVEL";

/// Location of the global configuration file, if a home directory exists
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "cluster-xchange", "cluster-xchange")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XchangeConfig {
    /// Interpreter every local script is run with.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Directory holding the forwarding scripts; used as working directory
    /// for every local invocation. Defaults to the current directory.
    #[serde(default)]
    pub scripts_dir: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub scripts: ScriptNames,
}

/// File names of the external scripts, relative to `scripts_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptNames {
    pub run_on_master: String,
    pub sync_to_master: String,
    pub sync_to_master_and_slave: String,
    pub sync_from_master: String,
    pub sync_from_slave: String,
}

impl Default for ScriptNames {
    fn default() -> Self {
        Self {
            run_on_master: "run-on-dcos-master.sh".to_string(),
            sync_to_master: "sync-to-dcos-master.sh".to_string(),
            sync_to_master_and_slave: "sync-to-dcos-master-and-slave.sh".to_string(),
            sync_from_master: "sync-from-master-to-local.sh".to_string(),
            sync_from_slave: "sync-from-slave-to-local.sh".to_string(),
        }
    }
}

fn default_shell() -> String {
    "/bin/bash".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for XchangeConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            scripts_dir: None,
            log_level: default_log_level(),
            scripts: ScriptNames::default(),
        }
    }
}

impl XchangeConfig {
    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(shell) = lookup(ENV_SHELL) {
            self.shell = shell;
        }

        if let Some(dir) = lookup(ENV_SCRIPTS_DIR) {
            self.scripts_dir = Some(PathBuf::from(dir));
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level.to_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(SyncError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!(
                    "log_level must be one of {}, got '{}'",
                    VALID_LOG_LEVELS.join(", "),
                    self.log_level
                ),
            ));
        }

        if self.shell.trim().is_empty() {
            return Err(SyncError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "shell must not be empty",
            ));
        }

        let scripts = [
            ("run_on_master", &self.scripts.run_on_master),
            ("sync_to_master", &self.scripts.sync_to_master),
            ("sync_to_master_and_slave", &self.scripts.sync_to_master_and_slave),
            ("sync_from_master", &self.scripts.sync_from_master),
            ("sync_from_slave", &self.scripts.sync_from_slave),
        ];
        for (key, name) in scripts {
            if name.trim().is_empty() {
                return Err(SyncError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("scripts.{key} must not be empty"),
                ));
            }
        }

        Ok(())
    }
}
