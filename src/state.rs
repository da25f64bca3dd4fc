use crate::checks::CheckName;
use crate::normalize::CheckOutput;
use crate::scheduler::{CheckReport, RunOutcome};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub started_at_unix: i64,
    pub last_collect_timestamp_seconds: i64,
    pub rounds: u64,
    pub assets: BTreeMap<String, BTreeMap<CheckName, CheckStatus>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckStatus {
    pub ok: bool,
    pub outcome: &'static str,
    pub error: Option<String>,
    pub checked_at_unix: i64,
    pub duration_ms: u64,
    pub records: usize,
    pub output: Option<CheckOutput>,
}

impl CheckStatus {
    fn from_report(report: &CheckReport) -> Self {
        let (error, output) = match &report.outcome {
            RunOutcome::Done(output) => (None, Some(output.clone())),
            RunOutcome::Failed(err) => (Some(err.to_string()), err.partial().cloned()),
            RunOutcome::TimedOut => (Some("check timed out".to_string()), None),
        };
        Self {
            ok: matches!(report.outcome, RunOutcome::Done(_)),
            outcome: report.outcome.label(),
            error,
            checked_at_unix: report.started_at_unix,
            duration_ms: report.duration.as_millis() as u64,
            records: output.as_ref().map_or(0, CheckOutput::record_count),
            output,
        }
    }
}

impl State {
    pub fn new(now_unix: i64) -> Self {
        Self {
            started_at_unix: now_unix,
            ..Self::default()
        }
    }

    pub fn apply_reports(&mut self, now_unix: i64, reports: &[CheckReport]) {
        self.last_collect_timestamp_seconds = now_unix;
        self.rounds += 1;
        for report in reports {
            self.assets
                .entry(report.asset.name.clone())
                .or_default()
                .insert(report.check, CheckStatus::from_report(report));
        }
    }

    pub fn failing(&self) -> usize {
        self.assets
            .values()
            .flat_map(BTreeMap::values)
            .filter(|s| !s.ok)
            .count()
    }
}
