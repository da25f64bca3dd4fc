use super::{as_i64, CheckOutput};
use crate::error::UpstreamError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
pub struct RawChassisList {
    pub chassis: Vec<RawChassis>,
}

#[derive(Debug, Deserialize)]
pub struct RawChassis {
    pub name: String,
    pub href: String,
    pub faulted: bool,
    pub manufacturer: String,
    pub model: String,
    pub serial: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub rpm: Option<Value>,
    #[serde(default)]
    pub part: Option<String>,
    #[serde(default)]
    pub locate: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ChassisRecord {
    name: String,
    faulted: bool,
    manufacturer: String,
    model: String,
    serial: String,
    #[serde(rename = "type")]
    kind: String,
    rpm: Option<i64>,
    part: Option<String>,
    locate: Option<bool>,
}

pub fn normalize(raw: RawChassisList) -> Result<CheckOutput, UpstreamError> {
    let mut names = HashSet::new();
    let chassis: Vec<ChassisRecord> = raw
        .chassis
        .into_iter()
        .map(|item| {
            // `href` is unique and never equal to a display name.
            let name = if names.insert(item.name.clone()) {
                item.name
            } else {
                item.href
            };
            ChassisRecord {
                name,
                faulted: item.faulted,
                manufacturer: item.manufacturer,
                model: item.model,
                serial: item.serial,
                kind: item.kind,
                rpm: as_i64(item.rpm.as_ref()),
                part: item.part,
                locate: item.locate,
            }
        })
        .collect();

    let mut output = CheckOutput::new();
    output.push_group("chassis", &chassis)?;
    Ok(output)
}
