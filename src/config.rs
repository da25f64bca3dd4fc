use crate::asset::{Asset, AssetId, CheckConfig, Credentials};
use crate::checks::CheckName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const SUPPORTED_API_VERSIONS: [&str; 2] = ["v1", "v2"];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listen: String,
    pub interval_secs: u64,
    #[serde(default = "default_check_timeout_secs")]
    pub check_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
    pub id: AssetId,
    pub name: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Unset means every check.
    #[serde(default)]
    pub checks: Option<Vec<CheckName>>,
    #[serde(default)]
    pub config: CheckConfig,
}

impl AssetConfig {
    pub fn asset(&self) -> Asset {
        Asset::new(self.id, self.name.clone())
    }

    pub fn enabled_checks(&self) -> Vec<CheckName> {
        match &self.checks {
            Some(checks) => checks.clone(),
            None => CheckName::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation("listen is required".to_string()));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "listen must be a valid host:port address".to_string(),
            ));
        }
        if self.interval_secs < 1 {
            return Err(ConfigError::Validation(
                "interval_secs must be >= 1".to_string(),
            ));
        }
        if self.check_timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "check_timeout_secs must be >= 1".to_string(),
            ));
        }
        if self.request_timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be >= 1".to_string(),
            ));
        }

        validate_assets(&self.assets)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

// Credentials are checked when an asset is probed, not at load.
fn validate_assets(assets: &[AssetConfig]) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for asset in assets {
        if asset.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "assets id {} name must not be empty",
                asset.id
            )));
        }
        if !ids.insert(asset.id) {
            return Err(ConfigError::Validation(format!(
                "asset id {} must be unique",
                asset.id
            )));
        }
        if !names.insert(asset.name.clone()) {
            return Err(ConfigError::Validation(format!(
                "asset name '{}' must be unique",
                asset.name
            )));
        }

        let cfg = &asset.config;
        if !SUPPORTED_API_VERSIONS.contains(&cfg.version.as_str()) {
            return Err(ConfigError::Validation(format!(
                "asset '{}' config.version must be one of {:?}, got '{}'",
                asset.name, SUPPORTED_API_VERSIONS, cfg.version
            )));
        }
        if cfg.port == 0 {
            return Err(ConfigError::Validation(format!(
                "asset '{}' config.port must be in 1..65535",
                asset.name
            )));
        }
        if cfg.hours < 1 {
            return Err(ConfigError::Validation(format!(
                "asset '{}' config.hours must be >= 1",
                asset.name
            )));
        }
    }
    Ok(())
}

const fn default_check_timeout_secs() -> u64 {
    60
}

const fn default_request_timeout_secs() -> u64 {
    30
}
