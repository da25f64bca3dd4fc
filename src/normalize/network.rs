use super::{as_i64, CheckOutput};
use crate::error::UpstreamError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RawRoutes {
    pub routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
pub struct RawRoute {
    pub href: String,
    pub destination: String,
    pub family: String,
    pub gateway: String,
    pub interface: String,
    #[serde(default)]
    pub mask: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct RawDevices {
    pub devices: Vec<RawDevice>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawDevice {
    #[serde(rename(serialize = "name"))]
    pub device: String,
    pub active: bool,
    pub duplex: String,
    pub factory_mac: String,
    pub media: String,
    /// e.g. `1000 Mbit/s`
    pub speed: String,
    pub up: bool,
}

#[derive(Debug, Deserialize)]
pub struct RawInterfaces {
    pub interfaces: Vec<RawInterface>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawInterface {
    #[serde(rename(serialize = "name"))]
    pub interface: String,
    pub admin: bool,
    pub class: String,
    pub curaddrs: Vec<String>,
    pub enable: bool,
    pub label: String,
    pub links: Vec<String>,
    pub state: String,
    pub v4addrs: Vec<String>,
    pub v4dhcp: bool,
    pub v6addrs: Vec<String>,
    pub v6dhcp: bool,
}

#[derive(Debug, Serialize)]
struct RouteRecord {
    name: String,
    destination: String,
    family: String,
    gateway: String,
    interface: String,
    mask: Option<i64>,
    status: Option<String>,
    #[serde(rename = "type")]
    kind: String,
}

pub fn normalize(
    routes: RawRoutes,
    devices: RawDevices,
    interfaces: RawInterfaces,
) -> Result<CheckOutput, UpstreamError> {
    let routes: Vec<RouteRecord> = routes
        .routes
        .into_iter()
        .map(|r| RouteRecord {
            name: r.href,
            destination: r.destination,
            family: r.family,
            gateway: r.gateway,
            interface: r.interface,
            mask: as_i64(r.mask.as_ref()),
            status: r.status,
            kind: r.kind,
        })
        .collect();

    let mut output = CheckOutput::new();
    output.push_group("devices", &devices.devices)?;
    output.push_group("interfaces", &interfaces.interfaces)?;
    output.push_group("routes", &routes)?;
    Ok(output)
}
