use crate::asset::Asset;
use crate::checks::{CheckName, Probe};
use crate::config::{AssetConfig, Config};
use crate::error::CheckError;
use crate::normalize::CheckOutput;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tracing::{error, info, warn};

#[derive(Debug)]
pub enum RunOutcome {
    Done(CheckOutput),
    Failed(CheckError),
    TimedOut,
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Done(_) => "ok",
            Self::Failed(err) => err.kind(),
            Self::TimedOut => "timeout",
        }
    }
}

#[derive(Debug)]
pub struct CheckReport {
    pub asset: Asset,
    pub check: CheckName,
    pub started_at_unix: i64,
    pub duration: Duration,
    pub outcome: RunOutcome,
}

pub async fn run_round(probe: Arc<Probe>, cfg: &Config) -> Vec<CheckReport> {
    let timeout = cfg.check_timeout();
    let mut tasks = JoinSet::new();

    for entry in &cfg.assets {
        for check in entry.enabled_checks() {
            let probe = Arc::clone(&probe);
            let entry = entry.clone();
            tasks.spawn(run_one(probe, entry, check, timeout));
        }
    }

    let mut reports = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(err) => error!(error = %err, "check task panicked"),
        }
    }
    reports
}

async fn run_one(
    probe: Arc<Probe>,
    entry: AssetConfig,
    check: CheckName,
    timeout: Duration,
) -> CheckReport {
    let asset = entry.asset();
    let started_at_unix = now_unix();
    let start = Instant::now();

    let outcome = match time::timeout(
        timeout,
        probe.check(check, &asset, &entry.credentials, &entry.config),
    )
    .await
    {
        Ok(Ok(output)) => RunOutcome::Done(output),
        Ok(Err(err)) => {
            warn!(asset = %asset.name, check = %check, kind = err.kind(), error = %err, "check failed");
            RunOutcome::Failed(err)
        }
        Err(_elapsed) => {
            warn!(asset = %asset.name, check = %check, timeout_secs = timeout.as_secs(), "check timeout");
            RunOutcome::TimedOut
        }
    };

    let duration = start.elapsed();
    if let RunOutcome::Done(output) = &outcome {
        info!(
            asset = %asset.name,
            check = %check,
            records = output.record_count(),
            duration_ms = duration.as_millis() as u64,
            "check completed"
        );
    }

    CheckReport {
        asset,
        check,
        started_at_unix,
        duration,
        outcome,
    }
}

pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
