use super::{parse_timestamp, CheckOutput};
use crate::error::UpstreamError;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct RawProblems {
    pub problems: Vec<RawProblem>,
}

#[derive(Debug, Deserialize)]
pub struct RawProblem {
    pub uuid: String,
    pub code: String,
    pub description: String,
    pub severity: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub repairable: Option<bool>,
    #[serde(default)]
    pub diagnosed: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl RawProblem {
    fn diagnosed_at(&self) -> Option<i64> {
        let text = self.diagnosed.as_deref().or(self.timestamp.as_deref())?;
        let parsed = parse_timestamp(text);
        if parsed.is_none() {
            debug!(uuid = %self.uuid, raw = text, "unparseable problem timestamp");
        }
        parsed
    }
}

#[derive(Debug, Serialize)]
struct ProblemRecord {
    name: String,
    code: String,
    description: String,
    severity: String,
    #[serde(rename = "type")]
    kind: String,
    impact: Option<String>,
    action: Option<String>,
    response: Option<String>,
    repairable: Option<bool>,
    timestamp: Option<i64>,
}

pub fn normalize(raw: RawProblems) -> Result<CheckOutput, UpstreamError> {
    let problems: Vec<ProblemRecord> = raw
        .problems
        .into_iter()
        .map(|p| {
            let timestamp = p.diagnosed_at();
            ProblemRecord {
                name: p.uuid,
                code: p.code,
                description: p.description,
                severity: p.severity,
                kind: p.kind,
                impact: p.impact,
                action: p.action,
                response: p.response,
                repairable: p.repairable,
                timestamp,
            }
        })
        .collect();

    let mut output = CheckOutput::new();
    output.push_group("problems", &problems)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn problem(extra: Value) -> Value {
        let mut base = json!({
            "uuid": "0f1c2d3e",
            "code": "AK-8000-86",
            "description": "Service processor is unreachable",
            "severity": "Major",
            "type": "Defect"
        });
        for (k, v) in extra.as_object().unwrap() {
            base[k] = v.clone();
        }
        base
    }

    fn normalize_one(entry: Value) -> Value {
        let raw: RawProblems = serde_json::from_value(json!({"problems": [entry]})).unwrap();
        normalize(raw).unwrap().group("problems").unwrap()[0].clone()
    }

    #[test]
    fn prefers_diagnosed_over_timestamp() {
        let rec = normalize_one(problem(json!({
            "diagnosed": "2013-04-25T17:31:38Z",
            "timestamp": "2020-01-01T00:00:00Z",
            "repairable": false
        })));
        assert_eq!(rec["name"], "0f1c2d3e");
        assert_eq!(rec["timestamp"], 1366911098);
        assert_eq!(rec["repairable"], false);
    }

    #[test]
    fn falls_back_to_timestamp_field() {
        let rec = normalize_one(problem(json!({"timestamp": "2013-04-25T17:31:38Z"})));
        assert_eq!(rec["timestamp"], 1366911098);
    }

    #[test]
    fn bad_timestamp_becomes_null_without_failing() {
        let rec = normalize_one(problem(json!({"diagnosed": "not a date"})));
        assert!(rec["timestamp"].is_null());
        assert!(rec["impact"].is_null());
        assert_eq!(rec["severity"], "Major");
    }
}
