use crate::error::CheckError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type AssetId = u64;

pub const DEFAULT_API_VERSION: &str = "v2";
pub const DEFAULT_SECURE: bool = true;
pub const DEFAULT_PORT: u16 = 215;
pub const DEFAULT_ALERT_HOURS: u32 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
}

impl Asset {
    pub fn new(id: AssetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    #[cfg(test)]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn require(&self) -> Result<(String, String), CheckError> {
        let username = self.username.as_deref().filter(|v| !v.trim().is_empty());
        let password = self.password.as_deref().filter(|v| !v.is_empty());
        match (username, password) {
            (Some(u), Some(p)) => Ok((u.to_string(), p.to_string())),
            _ => Err(CheckError::Config(
                "missing username or password in asset config".to_string(),
            )),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_secure")]
    pub secure: bool,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_hours")]
    pub hours: u32,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            address: None,
            version: default_version(),
            secure: default_secure(),
            port: default_port(),
            hours: default_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub protocol: &'static str,
    pub address: String,
    pub port: u16,
    pub version: String,
}

impl Endpoint {
    pub fn resolve(asset: &Asset, cfg: &CheckConfig) -> Self {
        let address = cfg
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(&asset.name)
            .to_string();

        Self {
            protocol: if cfg.secure { "https" } else { "http" },
            address,
            port: cfg.port,
            version: cfg.version.clone(),
        }
    }

    pub fn base(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.address, self.port)
    }

    pub fn login_url(&self) -> String {
        format!("{}/api/access/{}", self.base(), self.version)
    }

    pub fn url(&self, api: &str, resource: &str) -> String {
        format!("{}/api/{}/{}{}", self.base(), api, self.version, resource)
    }
}

fn default_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_secure() -> bool {
    DEFAULT_SECURE
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_hours() -> u32 {
    DEFAULT_ALERT_HOURS
}
