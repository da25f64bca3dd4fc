pub mod alerts;
pub mod analytics;
pub mod disks;
pub mod hardware;
pub mod memory;
pub mod network;
pub mod problems;
pub mod storage;
pub mod system;

use crate::error::UpstreamError;
use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CheckOutput {
    groups: BTreeMap<String, Vec<Value>>,
}

impl CheckOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_group<T: Serialize>(
        &mut self,
        name: &str,
        records: &[T],
    ) -> Result<(), UpstreamError> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| UpstreamError::Decode {
                resource: name.to_string(),
                message: err.to_string(),
            })?;
        self.groups.insert(name.to_string(), values);
        Ok(())
    }

    #[cfg(test)]
    pub fn group(&self, name: &str) -> Option<&[Value]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y%m%dT%H:%M:%S",
    "%Y%m%d-%H:%M:%S",
];

/// Best-effort conversion of an appliance timestamp to Unix seconds.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }

    let js = text.split(" (").next().unwrap_or(text);
    if let Ok(dt) = DateTime::parse_from_str(js, "%a %b %d %Y %H:%M:%S GMT%z") {
        return Some(dt.timestamp());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc().timestamp())
}

pub fn as_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

pub fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn required<T>(value: Option<T>, resource: &str, field: &str) -> Result<T, UpstreamError> {
    value.ok_or_else(|| UpstreamError::Decode {
        resource: resource.to_string(),
        message: format!("missing or invalid field `{field}`"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_appliance_timestamp_forms() {
        let expected = 1366911098; // 2013-04-25T17:31:38Z
        assert_eq!(parse_timestamp("2013-04-25T17:31:38Z"), Some(expected));
        assert_eq!(parse_timestamp("2013-04-25T17:31:38"), Some(expected));
        assert_eq!(parse_timestamp("2013-04-25 17:31:38.250"), Some(expected));
        assert_eq!(parse_timestamp("20130425T17:31:38"), Some(expected));
        assert_eq!(parse_timestamp("20130425-17:31:38"), Some(expected));
        assert_eq!(
            parse_timestamp("Thu Apr 25 2013 17:31:38 GMT+0000 (UTC)"),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp("2013-04-25T19:31:38+02:00"),
            Some(expected)
        );
    }

    #[test]
    fn unparseable_timestamp_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2013-13-45T99:00:00"), None);
    }

    #[test]
    fn lenient_numbers() {
        assert_eq!(as_i64(Some(&json!(42))), Some(42));
        assert_eq!(as_i64(Some(&json!(42.9))), Some(42));
        assert_eq!(as_i64(Some(&json!("1024"))), Some(1024));
        assert_eq!(as_i64(Some(&json!(null))), None);
        assert_eq!(as_i64(None), None);
        assert_eq!(as_f64(Some(&json!("1.5"))), Some(1.5));
        assert_eq!(as_f64(Some(&json!(true))), None);
    }

    #[test]
    fn output_counts_records_across_groups() {
        #[derive(Serialize)]
        struct R {
            name: &'static str,
        }
        let mut out = CheckOutput::new();
        out.push_group("a", &[R { name: "x" }, R { name: "y" }]).unwrap();
        out.push_group("b", &[R { name: "z" }]).unwrap();

        assert_eq!(out.record_count(), 3);
        assert_eq!(out.group("a").unwrap()[1]["name"], "y");
        assert!(out.group("c").is_none());
    }
}
