use crate::asset::{Asset, CheckConfig, Credentials, Endpoint};
use crate::error::{CheckError, UpstreamError};
use crate::fetch::Fetcher;
use crate::normalize::alerts::{self, AlertWindow, RawLogs};
use crate::normalize::analytics::{self, RawDataset};
use crate::normalize::disks::{self, RawDisks};
use crate::normalize::hardware::{self, RawChassisList};
use crate::normalize::memory::{self, RawMemory};
use crate::normalize::network::{self, RawDevices, RawInterfaces, RawRoutes};
use crate::normalize::problems::{self, RawProblems};
use crate::normalize::storage::{self, RawLuns};
use crate::normalize::system::{self, RawVersionInfo};
use crate::normalize::CheckOutput;
use crate::scheduler::now_unix;
use crate::token_cache::TokenCache;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckName {
    Alerts,
    Cpu,
    Disks,
    Hardware,
    Io,
    Memory,
    Network,
    Problems,
    Storage,
    System,
}

impl CheckName {
    pub const ALL: [CheckName; 10] = [
        CheckName::Alerts,
        CheckName::Cpu,
        CheckName::Disks,
        CheckName::Hardware,
        CheckName::Io,
        CheckName::Memory,
        CheckName::Network,
        CheckName::Problems,
        CheckName::Storage,
        CheckName::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alerts => "alerts",
            Self::Cpu => "cpu",
            Self::Disks => "disks",
            Self::Hardware => "hardware",
            Self::Io => "io",
            Self::Memory => "memory",
            Self::Network => "network",
            Self::Problems => "problems",
            Self::Storage => "storage",
            Self::System => "system",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| format!("unknown check '{s}'"))
    }
}

pub struct Probe {
    cache: Arc<TokenCache>,
    fetcher: Fetcher,
}

impl Probe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            cache: Arc::new(TokenCache::new(Arc::clone(&transport))),
            fetcher: Fetcher::new(transport),
        }
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.cache
    }

    #[instrument(name = "check", skip_all, fields(asset = %asset.name, check = %name))]
    pub async fn check(
        &self,
        name: CheckName,
        asset: &Asset,
        credentials: &Credentials,
        cfg: &CheckConfig,
    ) -> Result<CheckOutput, CheckError> {
        let endpoint = Endpoint::resolve(asset, cfg);
        debug!("need token");
        let token = self.cache.acquire(asset, credentials, &endpoint).await?;
        debug!("have token");

        let session = Session {
            fetcher: &self.fetcher,
            endpoint: &endpoint,
            token: &token,
        };
        debug!(base = %endpoint.base(), "fetching");
        let payload = match session.fetch(name, cfg.hours).await {
            Ok(payload) => payload,
            Err(err) => {
                if err.status() == Some(401) {
                    warn!("session rejected, dropping cached token");
                    self.cache.invalidate(asset.id, &token);
                }
                return Err(err.into());
            }
        };

        debug!("normalizing");
        let output = payload.normalize()?;
        debug!(records = output.record_count(), "done");
        Ok(output)
    }
}

enum Payload {
    Alerts(RawLogs, AlertWindow),
    Cpu(RawDataset),
    Disks(RawDisks),
    Hardware(RawChassisList),
    Io(RawDataset, RawDataset),
    Memory(RawMemory),
    Network(RawRoutes, RawDevices, RawInterfaces),
    Problems(RawProblems),
    Storage(RawLuns),
    System(RawVersionInfo),
}

impl Payload {
    fn normalize(self) -> Result<CheckOutput, CheckError> {
        let output = match self {
            Self::Alerts(raw, window) => return alerts::normalize(raw, &window),
            Self::Cpu(raw) => analytics::normalize_cpu(raw)?,
            Self::Disks(raw) => disks::normalize(raw)?,
            Self::Hardware(raw) => hardware::normalize(raw)?,
            Self::Io(by_disk, by_op) => analytics::normalize_io(by_disk, by_op)?,
            Self::Memory(raw) => memory::normalize(raw)?,
            Self::Network(routes, devices, interfaces) => {
                network::normalize(routes, devices, interfaces)?
            }
            Self::Problems(raw) => problems::normalize(raw)?,
            Self::Storage(raw) => storage::normalize(raw)?,
            Self::System(raw) => system::normalize(raw)?,
        };
        Ok(output)
    }
}

struct Session<'a> {
    fetcher: &'a Fetcher,
    endpoint: &'a Endpoint,
    token: &'a str,
}

impl Session<'_> {
    async fn get<T: DeserializeOwned>(&self, api: &str, resource: &str) -> Result<T, UpstreamError> {
        self.fetcher
            .get(self.endpoint, api, resource, self.token)
            .await
    }

    async fn dataset(&self, dataset: &str) -> Result<RawDataset, UpstreamError> {
        self.get("analytics", &analytics::dataset_resource(dataset))
            .await
    }

    async fn fetch(&self, name: CheckName, hours: u32) -> Result<Payload, UpstreamError> {
        let payload = match name {
            CheckName::Alerts => {
                let window = AlertWindow::ending_at(now_unix(), hours);
                let raw = self
                    .get("log", &format!("/logs/alert{}", window.query()))
                    .await?;
                Payload::Alerts(raw, window)
            }
            CheckName::Cpu => Payload::Cpu(self.dataset(analytics::CPU_UTILIZATION).await?),
            CheckName::Disks => Payload::Disks(self.get("system", "/disks").await?),
            CheckName::Hardware => Payload::Hardware(self.get("hardware", "/chassis").await?),
            CheckName::Io => {
                let (by_disk, by_op) = tokio::try_join!(
                    self.dataset(analytics::IO_OPS_BY_DISK),
                    self.dataset(analytics::IO_OPS_BY_OP),
                )?;
                Payload::Io(by_disk, by_op)
            }
            CheckName::Memory => Payload::Memory(self.get("system", "/memory").await?),
            CheckName::Network => {
                let (routes, devices, interfaces) = tokio::try_join!(
                    self.get("network", "/routes"),
                    self.get("network", "/devices"),
                    self.get("network", "/interfaces"),
                )?;
                Payload::Network(routes, devices, interfaces)
            }
            CheckName::Problems => Payload::Problems(self.get("problem", "/problems").await?),
            CheckName::Storage => Payload::Storage(self.get("storage", "/luns").await?),
            CheckName::System => Payload::System(self.get("system", "/version").await?),
        };
        Ok(payload)
    }
}
