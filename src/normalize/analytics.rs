use super::{as_i64, required, CheckOutput};
use crate::error::UpstreamError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub const CPU_UTILIZATION: &str = "cpu.utilization";
pub const IO_OPS_BY_DISK: &str = "io.ops[disk]";
pub const IO_OPS_BY_OP: &str = "io.ops[op]";

pub fn dataset_resource(dataset: &str) -> String {
    format!("/datasets/{dataset}/data?span=minute")
}

#[derive(Debug, Deserialize)]
pub struct RawDataset {
    pub data: RawSample,
}

#[derive(Debug, Deserialize)]
pub struct RawSample {
    pub data: RawDatum,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawDatum {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub data: Vec<RawBreakdown>,
}

#[derive(Debug, Deserialize)]
pub struct RawBreakdown {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Serialize)]
struct UtilizationRecord {
    name: &'static str,
    percentage: i64,
}

#[derive(Debug, Serialize)]
struct DiskOpsRecord {
    name: String,
    ops: i64,
}

#[derive(Debug, Serialize)]
struct OpsRecord {
    name: &'static str,
    read: i64,
    write: i64,
}

pub fn normalize_cpu(raw: RawDataset) -> Result<CheckOutput, UpstreamError> {
    let percentage = required(as_i64(raw.data.data.value.as_ref()), CPU_UTILIZATION, "value")?;

    let mut output = CheckOutput::new();
    output.push_group(
        "utilization",
        &[UtilizationRecord {
            name: CPU_UTILIZATION,
            percentage,
        }],
    )?;
    Ok(output)
}

pub fn normalize_io(by_disk: RawDataset, by_op: RawDataset) -> Result<CheckOutput, UpstreamError> {
    let ops_disk = by_disk
        .data
        .data
        .data
        .into_iter()
        .map(|item| {
            let ops = required(as_i64(Some(&item.value)), IO_OPS_BY_DISK, "value")?;
            Ok(DiskOpsRecord {
                name: item.key,
                ops,
            })
        })
        .collect::<Result<Vec<_>, UpstreamError>>()?;

    let (mut read, mut write) = (0, 0);
    for item in by_op.data.data.data {
        let value = required(as_i64(Some(&item.value)), IO_OPS_BY_OP, "value")?;
        match item.key.as_str() {
            "read" => read = value,
            "write" => write = value,
            other => debug!(key = other, value, "ignored io operation"),
        }
    }

    let mut output = CheckOutput::new();
    output.push_group(
        "ops_op",
        &[OpsRecord {
            name: IO_OPS_BY_OP,
            read,
            write,
        }],
    )?;
    output.push_group("ops_disk", &ops_disk)?;
    Ok(output)
}
