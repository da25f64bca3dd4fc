use crate::scheduler::CheckReport;
use crate::state::State;
use prometheus::core::Collector;
use prometheus::{opts, Counter, CounterVec, Encoder, Gauge, GaugeVec, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub check_runs_total: CounterVec,
    pub check_up: GaugeVec,
    pub check_duration_seconds: GaugeVec,
    pub check_records: GaugeVec,
    pub cached_tokens: Gauge,
    pub uptime_seconds: Gauge,
    pub scrape_count_total: Counter,
    pub last_collect_timestamp_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let check_runs_total = CounterVec::new(
            opts!(
                "zfsprobe_check_runs_total",
                "Check invocations by check and outcome (ok, config, auth, upstream, incomplete, timeout)"
            ),
            &["check", "outcome"],
        )?;
        let check_up = GaugeVec::new(
            opts!(
                "zfsprobe_check_up",
                "1 if the last invocation of the check succeeded"
            ),
            &["asset", "check"],
        )?;
        let check_duration_seconds = GaugeVec::new(
            opts!(
                "zfsprobe_check_duration_seconds",
                "Wall time of the last invocation of the check"
            ),
            &["asset", "check"],
        )?;
        let check_records = GaugeVec::new(
            opts!(
                "zfsprobe_check_records",
                "Records in each output group of the last (possibly partial) result"
            ),
            &["asset", "check", "group"],
        )?;
        let cached_tokens = Gauge::with_opts(opts!(
            "zfsprobe_cached_tokens",
            "Session tokens currently held in the token cache"
        ))?;
        let uptime_seconds =
            Gauge::with_opts(opts!("zfsprobe_uptime_seconds", "Probe uptime in seconds"))?;
        let scrape_count_total = Counter::with_opts(opts!(
            "zfsprobe_scrape_count_total",
            "Number of /metrics scrapes"
        ))?;
        let last_collect_timestamp_seconds = Gauge::with_opts(opts!(
            "zfsprobe_last_collect_timestamp_seconds",
            "Unix timestamp of the last finished round"
        ))?;

        register(&registry, &check_runs_total)?;
        register(&registry, &check_up)?;
        register(&registry, &check_duration_seconds)?;
        register(&registry, &check_records)?;
        register(&registry, &cached_tokens)?;
        register(&registry, &uptime_seconds)?;
        register(&registry, &scrape_count_total)?;
        register(&registry, &last_collect_timestamp_seconds)?;

        Ok(Arc::new(Self {
            registry,
            check_runs_total,
            check_up,
            check_duration_seconds,
            check_records,
            cached_tokens,
            uptime_seconds,
            scrape_count_total,
            last_collect_timestamp_seconds,
        }))
    }

    pub fn observe_report(&self, report: &CheckReport) {
        self.check_runs_total
            .with_label_values(&[report.check.as_str(), report.outcome.label()])
            .inc();
    }

    pub fn update_from_state(&self, state: &State, cached_tokens: usize) {
        self.last_collect_timestamp_seconds
            .set(state.last_collect_timestamp_seconds as f64);
        self.cached_tokens.set(cached_tokens as f64);

        self.check_up.reset();
        self.check_duration_seconds.reset();
        self.check_records.reset();
        for (asset, checks) in &state.assets {
            for (check, status) in checks {
                let labels = [asset.as_str(), check.as_str()];
                self.check_up
                    .with_label_values(&labels)
                    .set(if status.ok { 1.0 } else { 0.0 });
                self.check_duration_seconds
                    .with_label_values(&labels)
                    .set(status.duration_ms as f64 / 1000.0);
                let Some(output) = &status.output else {
                    continue;
                };
                for (group, records) in output.groups() {
                    self.check_records
                        .with_label_values(&[asset.as_str(), check.as_str(), group])
                        .set(records.len() as f64);
                }
            }
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(state.started_at_unix);
        let uptime = now.saturating_sub(state.started_at_unix) as f64;
        self.uptime_seconds.set(uptime);
    }

    pub fn inc_scrape_count(&self) {
        self.scrape_count_total.inc();
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::checks::CheckName;
    use crate::normalize::CheckOutput;
    use crate::scheduler::RunOutcome;
    use std::time::Duration;

    fn encoded(metrics: &Metrics) -> String {
        String::from_utf8(metrics.encode_metrics().unwrap()).unwrap()
    }

    #[test]
    fn report_outcomes_are_counted_by_label() {
        let metrics = Metrics::new().unwrap();
        let report = CheckReport {
            asset: Asset::new(1, "zfs-01"),
            check: CheckName::Io,
            started_at_unix: 0,
            duration: Duration::from_secs(1),
            outcome: RunOutcome::TimedOut,
        };
        metrics.observe_report(&report);
        metrics.observe_report(&report);

        let text = encoded(&metrics);
        assert!(text.contains(r#"zfsprobe_check_runs_total{check="io",outcome="timeout"} 2"#));
    }

    #[test]
    fn gauges_follow_state() {
        let metrics = Metrics::new().unwrap();
        let mut output = CheckOutput::new();
        output
            .push_group("disks", &[serde_json::json!({"name": "HDD 0"})])
            .unwrap();
        let report = CheckReport {
            asset: Asset::new(1, "zfs-01"),
            check: CheckName::Disks,
            started_at_unix: 50,
            duration: Duration::from_millis(1500),
            outcome: RunOutcome::Done(output),
        };
        let mut state = State::new(0);
        state.apply_reports(60, &[report]);

        metrics.update_from_state(&state, 1);

        let text = encoded(&metrics);
        assert!(text.contains(r#"zfsprobe_check_up{asset="zfs-01",check="disks"} 1"#));
        assert!(text.contains(r#"zfsprobe_check_duration_seconds{asset="zfs-01",check="disks"} 1.5"#));
        assert!(text.contains(
            r#"zfsprobe_check_records{asset="zfs-01",check="disks",group="disks"} 1"#
        ));
        assert!(text.contains("zfsprobe_cached_tokens 1"));
        assert!(text.contains("zfsprobe_last_collect_timestamp_seconds 60"));
    }
}
