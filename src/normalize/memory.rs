use super::{as_i64, required, CheckOutput};
use crate::error::UpstreamError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RawMemory {
    pub memory: RawMemoryStats,
}

#[derive(Debug, Deserialize)]
pub struct RawMemoryStats {
    #[serde(default)]
    pub cache: Option<Value>,
    #[serde(default)]
    pub kernel: Option<Value>,
    #[serde(default)]
    pub management: Option<Value>,
    #[serde(default)]
    pub other: Option<Value>,
    #[serde(default)]
    pub unused: Option<Value>,
}

#[derive(Debug, Serialize)]
struct MemoryRecord {
    name: &'static str,
    cache: i64,
    kernel: i64,
    management: i64,
    other: i64,
    unused: i64,
}

pub fn normalize(raw: RawMemory) -> Result<CheckOutput, UpstreamError> {
    let stats = raw.memory;
    let field = |value: &Option<Value>, name: &str| required(as_i64(value.as_ref()), "memory", name);

    let record = MemoryRecord {
        name: "memory",
        cache: field(&stats.cache, "cache")?,
        kernel: field(&stats.kernel, "kernel")?,
        management: field(&stats.management, "management")?,
        other: field(&stats.other, "other")?,
        unused: field(&stats.unused, "unused")?,
    };

    let mut output = CheckOutput::new();
    output.push_group("memory", &[record])?;
    Ok(output)
}
