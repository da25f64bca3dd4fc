use super::{as_i64, as_text, CheckOutput};
use crate::error::UpstreamError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct RawDisks {
    pub disks: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct SizeRecord {
    name: &'static str,
    total: i64,
    free: i64,
    root: i64,
    var: i64,
    update: i64,
    stash: i64,
    dump: i64,
    cores: i64,
    unknown: i64,
}

#[derive(Debug, Serialize)]
struct DiskRecord {
    name: String,
    label: String,
    state: String,
}

pub fn normalize(raw: RawDisks) -> Result<CheckOutput, UpstreamError> {
    let amount = |key: &str| as_i64(raw.disks.get(key)).unwrap_or(0);

    let mut size = SizeRecord {
        name: "disks",
        total: 0,
        free: amount("free"),
        root: amount("root"),
        var: amount("var"),
        update: amount("update"),
        stash: amount("stash"),
        dump: amount("dump"),
        cores: amount("cores"),
        unknown: amount("unknown"),
    };
    size.total = size.root
        + size.var
        + size.update
        + size.stash
        + size.dump
        + size.cores
        + size.unknown
        + size.free;

    let disks: Vec<DiskRecord> = raw
        .disks
        .iter()
        .filter_map(|(name, entry)| {
            let obj = entry.as_object()?;
            Some(DiskRecord {
                name: name.clone(),
                label: as_text(obj.get("label")?),
                state: as_text(obj.get("state")?),
            })
        })
        .collect();

    let mut output = CheckOutput::new();
    output.push_group("size", &[size])?;
    output.push_group("disks", &disks)?;
    Ok(output)
}
