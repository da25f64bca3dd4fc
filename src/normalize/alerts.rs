use super::{parse_timestamp, CheckOutput};
use crate::error::CheckError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, error, warn};

#[derive(Debug, Deserialize)]
pub struct RawLogs {
    pub logs: Vec<RawLogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RawLogEntry {
    pub uuid: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Serialize)]
struct LogRecord {
    name: String,
    timestamp: Option<i64>,
    description: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    href: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummaryRecord {
    name: &'static str,
    count: usize,
    start: i64,
    hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertWindow {
    pub start: i64,
    pub hours: u32,
}

impl AlertWindow {
    pub fn ending_at(now_unix: i64, hours: u32) -> Self {
        Self {
            start: now_unix - i64::from(hours) * 3600,
            hours,
        }
    }

    pub fn query(&self) -> String {
        let start = UNIX_EPOCH + Duration::from_secs(self.start.max(0) as u64);
        format!("?start={}", humantime::format_rfc3339_seconds(start))
    }
}

pub fn normalize(raw: RawLogs, window: &AlertWindow) -> Result<CheckOutput, CheckError> {
    let mut uuids = HashSet::new();
    let mut logs = Vec::with_capacity(raw.logs.len());
    let mut in_window = 0_usize;

    for entry in raw.logs {
        let timestamp = entry.timestamp.as_deref().and_then(parse_timestamp);
        if timestamp.is_none() && entry.timestamp.is_some() {
            warn!(uuid = %entry.uuid, raw = ?entry.timestamp, "unparseable alert timestamp");
        }
        if matches!(timestamp, Some(ts) if ts < window.start) {
            debug!(uuid = %entry.uuid, "alert older than window skipped");
            continue;
        }
        in_window += 1;

        if !uuids.insert(entry.uuid.clone()) {
            error!(uuid = %entry.uuid, "duplicate alert uuid, entry dropped");
            continue;
        }

        logs.push(LogRecord {
            name: entry.uuid,
            timestamp,
            description: entry.description,
            kind: entry.kind,
            href: entry.href,
        });
    }

    let summary = SummaryRecord {
        name: "alerts",
        count: logs.len(),
        start: window.start,
        hours: window.hours,
    };

    let mut output = CheckOutput::new();
    output.push_group("logs", &logs)?;
    output.push_group("summary", &[summary])?;

    if in_window != uuids.len() {
        return Err(CheckError::Incomplete {
            reason: format!(
                "{in_window} alert log entries but {} unique uuids",
                uuids.len()
            ),
            partial: output,
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn raw(value: serde_json::Value) -> RawLogs {
        serde_json::from_value(value).expect("raw logs")
    }

    #[test]
    fn window_defaults_to_hours_before_now() {
        let window = AlertWindow::ending_at(NOW, 24);
        assert_eq!(window.start, NOW - 86_400);
        assert_eq!(window.query(), "?start=2023-11-13T22:13:20Z");
    }

    #[test]
    fn converts_entries_and_summarizes() {
        let window = AlertWindow::ending_at(NOW, 24);
        let out = normalize(
            raw(json!({"logs": [
                {"uuid": "u1", "timestamp": "2023-11-14T20:00:00Z", "description": "fan", "type": "Major alert"},
                {"uuid": "u2", "timestamp": "garbage"}
            ]})),
            &window,
        )
        .unwrap();

        let logs = out.group("logs").unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["name"], "u1");
        assert_eq!(logs[0]["timestamp"], 1_699_992_000);
        assert_eq!(logs[0]["type"], "Major alert");
        assert!(logs[1]["timestamp"].is_null());
        assert!(logs[1]["description"].is_null());

        let summary = &out.group("summary").unwrap()[0];
        assert_eq!(summary["count"], 2);
        assert_eq!(summary["start"], NOW - 86_400);
        assert_eq!(summary["hours"], 24);
    }

    #[test]
    fn duplicate_uuid_keeps_first_and_reports_incomplete() {
        let window = AlertWindow::ending_at(NOW, 24);
        let err = normalize(
            raw(json!({"logs": [
                {"uuid": "u1", "description": "first"},
                {"uuid": "u2"},
                {"uuid": "u1", "description": "second"}
            ]})),
            &window,
        )
        .unwrap_err();

        let partial = err.partial().expect("partial output");
        let logs = partial.group("logs").unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0]["name"], "u1");
        assert_eq!(logs[0]["description"], "first");
        assert_eq!(logs[1]["name"], "u2");
        assert_eq!(partial.group("summary").unwrap()[0]["count"], 2);
        assert_eq!(err.kind(), "incomplete");
    }

    #[test]
    fn entries_before_window_are_skipped() {
        let window = AlertWindow::ending_at(NOW, 1);
        let out = normalize(
            raw(json!({"logs": [
                {"uuid": "old", "timestamp": "2020-01-01T00:00:00Z"},
                {"uuid": "new", "timestamp": "2023-11-14T22:00:00Z"}
            ]})),
            &window,
        )
        .unwrap();

        let logs = out.group("logs").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["name"], "new");
    }

    #[test]
    fn missing_uuid_fails_decoding() {
        let parsed: Result<RawLogs, _> =
            serde_json::from_value(json!({"logs": [{"description": "no id"}]}));
        assert!(parsed.is_err());
    }
}
