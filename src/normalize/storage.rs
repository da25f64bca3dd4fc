use super::{as_f64, as_i64, required, CheckOutput};
use crate::error::UpstreamError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RawLuns {
    pub luns: Vec<RawLun>,
}

#[derive(Debug, Deserialize)]
pub struct RawLun {
    pub canonical_name: String,
    pub sparse: bool,
    pub volsize: Value,
    pub volblocksize: Value,
    #[serde(default)]
    pub usage: Option<RawLunUsage>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stmfguid: Option<String>,
    #[serde(default)]
    pub lunguid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLunUsage {
    #[serde(default)]
    pub available: Option<Value>,
    #[serde(default)]
    pub total: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub compressratio: Option<Value>,
    #[serde(default)]
    pub snapshots: Option<Value>,
    #[serde(default)]
    pub loading: Option<bool>,
}

impl RawLun {
    /// Older firmware reports the GUID as `lunguid`.
    pub fn guid(&self) -> Option<&str> {
        self.stmfguid.as_deref().or(self.lunguid.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct LunRecord {
    name: String,
    sparse: bool,
    volsize: i64,
    volblocksize: i64,
    usage_available: Option<i64>,
    usage_total: Option<i64>,
    usage_data: Option<i64>,
    usage_compressratio: Option<f64>,
    usage_snapshots: Option<f64>,
    usage_loading: Option<bool>,
    status: Option<String>,
    stmfguid: Option<String>,
}

pub fn normalize(raw: RawLuns) -> Result<CheckOutput, UpstreamError> {
    let mut luns = Vec::with_capacity(raw.luns.len());
    for lun in raw.luns {
        let resource = format!("luns/{}", lun.canonical_name);
        let usage = lun.usage.as_ref();
        luns.push(LunRecord {
            volsize: required(as_i64(Some(&lun.volsize)), &resource, "volsize")?,
            volblocksize: required(as_i64(Some(&lun.volblocksize)), &resource, "volblocksize")?,
            usage_available: as_i64(usage.and_then(|u| u.available.as_ref())),
            usage_total: as_i64(usage.and_then(|u| u.total.as_ref())),
            usage_data: as_i64(usage.and_then(|u| u.data.as_ref())),
            usage_compressratio: as_f64(usage.and_then(|u| u.compressratio.as_ref())),
            usage_snapshots: as_f64(usage.and_then(|u| u.snapshots.as_ref())),
            usage_loading: usage.and_then(|u| u.loading),
            stmfguid: lun.guid().map(str::to_string),
            status: lun.status,
            sparse: lun.sparse,
            name: lun.canonical_name,
        });
    }

    let mut output = CheckOutput::new();
    output.push_group("luns", &luns)?;
    Ok(output)
}
