//! Configuration module for owm-daemon.
//!
//! Handles loading configuration from a TOML file, CLI arguments and
//! defaults. The file is optional: a missing file behaves like an empty
//! one, which is enough for demo mode.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::file::FileConfig;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Wallet bridge endpoint; `None` means no provider is present.
    pub bridge_endpoint: Option<Url>,
    /// Risk-analysis API root; `None` only in demo mode.
    pub api_base_url: Option<Url>,
    pub api_key: Option<String>,
    pub poll_interval: Duration,
    pub accounts_poll: Duration,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    bridge_override: Option<Url>,
    api_override: Option<Url>,
    demo: bool,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(
        config_path: impl AsRef<Path>,
        bridge_override: Option<Url>,
        api_override: Option<Url>,
        demo: bool,
    ) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            bridge_override,
            api_override,
            demo,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, treating a missing file as empty
    /// 2. Apply CLI overrides
    /// 3. Validate the result
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = self.read_file()?;

        if let Some(bridge) = &self.bridge_override {
            file_config.bridge.endpoint = Some(bridge.clone());
        }
        if let Some(api) = &self.api_override {
            file_config.api.base_url = Some(api.clone());
        }

        self.validate(&file_config)?;

        Ok(LoadedConfig {
            bridge_endpoint: file_config.bridge.endpoint,
            api_base_url: file_config.api.base_url,
            api_key: file_config.api.api_key,
            poll_interval: Duration::from_secs(file_config.monitor.poll_interval_secs),
            accounts_poll: Duration::from_secs(file_config.monitor.accounts_poll_secs),
        })
    }

    fn read_file(&self) -> Result<FileConfig, ConfigError> {
        match std::fs::read_to_string(&self.config_path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
                Ok(FileConfig::default())
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if !self.demo && config.api.base_url.is_none() {
            return Err(ConfigError::Validation(
                "api.base_url is required outside demo mode".to_string(),
            ));
        }
        if config.monitor.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "monitor.poll_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
