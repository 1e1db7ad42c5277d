//! Loading and saving the `fragkey` TOML file
//!
//! A missing file is not an error: callers get `Config::default()`, which
//! registers no fragment types.

pub mod schema;

pub use schema::Config;

use crate::error::{FragkeyError, FragkeyResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Reads and writes one config file, by default
/// `<config dir>/fragkey/config.toml`
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fragkey")
            .join("config.toml")
    }

    /// Falls back to defaults when the file does not exist
    pub async fn load(&self) -> FragkeyResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    pub async fn load_from_file(&self, path: &Path) -> FragkeyResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FragkeyError::io(format!("reading config from {}", path.display()), e))?;

        Self::parse(&content, path)
    }

    /// `origin` only names the source in `ConfigInvalid` errors
    pub fn parse(content: &str, origin: &Path) -> FragkeyResult<Config> {
        let config: Config = toml::from_str(content).map_err(|e| FragkeyError::ConfigInvalid {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;

        if config.interner.shards == 0 {
            return Err(FragkeyError::ConfigInvalid {
                path: origin.to_path_buf(),
                reason: "interner.shards must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    /// Creates the parent directory if needed
    pub async fn save(&self, config: &Config) -> FragkeyResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            FragkeyError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> FragkeyResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FragkeyError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
