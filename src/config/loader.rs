use std::path::{Path, PathBuf};
use tokio::fs;

use super::{global_config_path, XchangeConfig};
use crate::error::{ErrorCode, Result, SyncError};

/// Reads the configuration file and applies environment overrides.
pub struct ConfigLoader {
    explicit_path: Option<PathBuf>,
    global_path: Option<PathBuf>,
    apply_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            global_path: global_config_path(),
            apply_env: true,
        }
    }

    /// Use this file instead of the global one. It must exist.
    pub fn with_explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    pub fn with_global_path(mut self, path: Option<PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.apply_env = false;
        self
    }

    pub async fn load(&self) -> Result<XchangeConfig> {
        let mut config = if let Some(path) = &self.explicit_path {
            if !Self::exists(path).await {
                return Err(SyncError::config_with_code(
                    ErrorCode::CONFIG_NOT_FOUND,
                    format!("configuration file {} does not exist", path.display()),
                ));
            }
            Self::load_file(path).await?
        } else {
            match &self.global_path {
                Some(path) => {
                    if Self::exists(path).await {
                        Self::load_file(path).await?
                    } else {
                        XchangeConfig::default()
                    }
                }
                None => XchangeConfig::default(),
            }
        };

        if self.apply_env {
            config.merge_env_vars();
        }

        config.validate()?;
        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    async fn exists(path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn load_file(path: &Path) -> Result<XchangeConfig> {
        tracing::debug!("Reading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::io(path, e))?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, origin: &Path) -> Result<XchangeConfig> {
        toml::from_str(content).map_err(|e| {
            SyncError::config_with_code(
                ErrorCode::CONFIG_PARSE_ERROR,
                format!("failed to parse {}: {}", origin.display(), e),
            )
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_defaults_without_files() {
        let config = ConfigLoader::new()
            .with_global_path(None)
            .without_env()
            .load()
            .await
            .unwrap();
        assert_eq!(config, XchangeConfig::default());
    }

    #[tokio::test]
    async fn test_missing_global_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::new()
            .with_global_path(Some(dir.path().join("config.toml")))
            .without_env()
            .load()
            .await
            .unwrap();
        assert_eq!(config, XchangeConfig::default());
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::new()
            .with_explicit_path(dir.path().join("absent.toml"))
            .without_env()
            .load()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_explicit_file_wins_over_global() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&global, "shell = \"/bin/zsh\"\n").unwrap();
        std::fs::write(&explicit, "scripts_dir = \"/opt/scripts\"\n").unwrap();

        let config = ConfigLoader::new()
            .with_global_path(Some(global))
            .with_explicit_path(&explicit)
            .without_env()
            .load()
            .await
            .unwrap();

        assert_eq!(config.shell, "/bin/bash");
        assert_eq!(config.scripts_dir, Some(PathBuf::from("/opt/scripts")));
    }

    #[tokio::test]
    async fn test_invalid_toml_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "shell = [unterminated\n").unwrap();

        let err = ConfigLoader::new()
            .with_explicit_path(&path)
            .without_env()
            .load()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_log_level_in_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_level = \"loud\"\n").unwrap();

        let err = ConfigLoader::new()
            .with_explicit_path(&path)
            .without_env()
            .load()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
    }
}
