use super::{parse_timestamp, CheckOutput};
use crate::error::UpstreamError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RawVersionInfo {
    pub version: RawVersion,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVersion {
    pub nodename: Option<String>,
    pub mkt_product: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    pub install_time: Option<String>,
    pub update_time: Option<String>,
    pub boot_time: Option<String>,
    pub asn: Option<String>,
    pub csn: Option<String>,
    pub part: Option<String>,
    pub urn: Option<String>,
    pub navname: Option<String>,
    pub navagent: Option<String>,
    pub http: Option<String>,
    pub ssl: Option<String>,
    pub ak_version: Option<String>,
    pub ak_release: Option<String>,
    pub os_version: Option<String>,
    pub bios_version: Option<String>,
    pub sp_version: Option<String>,
}

#[derive(Debug, Serialize)]
struct VersionRecord {
    name: &'static str,
    nodename: Option<String>,
    mkt_product: Option<String>,
    product: Option<String>,
    version: Option<String>,
    install_time: Option<i64>,
    update_time: Option<i64>,
    boot_time: Option<i64>,
    asn: Option<String>,
    csn: Option<String>,
    part: Option<String>,
    urn: Option<String>,
    navname: Option<String>,
    navagent: Option<String>,
    http: Option<String>,
    ssl: Option<String>,
    ak_version: Option<String>,
    ak_release: Option<String>,
    os_version: Option<String>,
    bios_version: Option<String>,
    sp_version: Option<String>,
}

fn epoch(value: Option<&str>) -> Option<i64> {
    value.and_then(parse_timestamp)
}

pub fn normalize(raw: RawVersionInfo) -> Result<CheckOutput, UpstreamError> {
    let v = raw.version;
    let record = VersionRecord {
        name: "version_info",
        install_time: epoch(v.install_time.as_deref()),
        update_time: epoch(v.update_time.as_deref()),
        boot_time: epoch(v.boot_time.as_deref()),
        nodename: v.nodename,
        mkt_product: v.mkt_product,
        product: v.product,
        version: v.version,
        asn: v.asn,
        csn: v.csn,
        part: v.part,
        urn: v.urn,
        navname: v.navname,
        navagent: v.navagent,
        http: v.http,
        ssl: v.ssl,
        ak_version: v.ak_version,
        ak_release: v.ak_release,
        os_version: v.os_version,
        bios_version: v.bios_version,
        sp_version: v.sp_version,
    };

    let mut output = CheckOutput::new();
    output.push_group("version", &[record])?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn times_are_epoch_and_bad_ones_null() {
        let raw: RawVersionInfo = serde_json::from_value(json!({"version": {
            "nodename": "zfs-01",
            "product": "Sun ZFS Storage 7320",
            "install_time": "2013-04-25T17:31:38Z",
            "boot_time": "Thu Apr 25 2013 17:31:38 GMT+0000 (UTC)",
            "update_time": "unknown"
        }}))
        .unwrap();

        let out = normalize(raw).unwrap();
        let rec = &out.group("version").unwrap()[0];
        assert_eq!(rec["name"], "version_info");
        assert_eq!(rec["nodename"], "zfs-01");
        assert_eq!(rec["install_time"], 1366911098);
        assert_eq!(rec["boot_time"], 1366911098);
        assert!(rec["update_time"].is_null());
        assert!(rec["sp_version"].is_null());
    }
}
