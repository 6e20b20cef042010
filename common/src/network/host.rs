use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

use pnet::util::MacAddr;
use serde::{Deserialize, Serialize};

/// Inferred device classification, with an explicit unknown fallback so new
/// categories can be added without breaking stored sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Unknown,
    Router,
    Server,
    Pc,
    Mobile,
    Printer,
    Iot,
}

impl DeviceType {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceType::Unknown => "Unknown",
            DeviceType::Router => "Router",
            DeviceType::Server => "Server",
            DeviceType::Pc => "PC",
            DeviceType::Mobile => "Mobile",
            DeviceType::Printer => "Printer",
            DeviceType::Iot => "IoT",
        }
    }
}

/// All evidence collected about a single target address.
///
/// One record per address per session. Every field except `address` and
/// `is_alive` is best-effort: a probe that fails leaves its field absent
/// rather than failing the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub address: IpAddr,
    #[serde(default, with = "mac_serde", skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub open_ports: BTreeSet<u16>,
    pub is_alive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_trip: Option<Duration>,
    /// TTL observed on the echo reply; evidence for hop-count inference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u8>,
    /// Classification hint derived during scanning (e.g. from the vendor).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_hint: Option<DeviceType>,
}

impl HostInfo {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            mac: None,
            hostname: None,
            vendor: None,
            open_ports: BTreeSet::new(),
            is_alive: false,
            round_trip: None,
            ttl: None,
            device_hint: None,
        }
    }

    pub fn with_mac(mut self, mac: MacAddr) -> Self {
        self.mac = Some(mac);
        self
    }

    pub fn with_alive(mut self, alive: bool) -> Self {
        self.is_alive = alive;
        self
    }

    /// A host belongs in the topology when it answered a probe or is at
    /// least present in the neighbor table.
    pub fn is_visible(&self) -> bool {
        self.is_alive || self.mac.is_some()
    }
}

mod mac_serde {
    use pnet::util::MacAddr;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mac: &Option<MacAddr>, ser: S) -> Result<S::Ok, S::Error> {
        match mac {
            Some(mac) => ser.serialize_some(&mac.to_string()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<MacAddr>, D::Error> {
        let raw: Option<String> = Option::deserialize(de)?;
        raw.map(|s| s.parse::<MacAddr>().map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, last))
    }

    #[test]
    fn visibility_requires_alive_or_mac() {
        let silent = HostInfo::new(addr(9));
        assert!(!silent.is_visible());

        let alive = HostInfo::new(addr(10)).with_alive(true);
        assert!(alive.is_visible());

        let arp_only = HostInfo::new(addr(11)).with_mac(MacAddr(0, 0x1c, 0x42, 1, 2, 3));
        assert!(arp_only.is_visible());
    }

    #[test]
    fn host_serde_round_trip_preserves_mac() {
        let mut host = HostInfo::new(addr(1)).with_mac(MacAddr(0xde, 0xad, 0xbe, 0xef, 0, 1));
        host.is_alive = true;
        host.hostname = Some("gateway.local".to_string());
        host.open_ports.extend([53, 80]);
        host.ttl = Some(64);

        let json = serde_json::to_string(&host).unwrap();
        let back: HostInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(host, back);
    }

    #[test]
    fn absent_fields_are_omitted_from_json() {
        let host = HostInfo::new(addr(2));
        let json = serde_json::to_string(&host).unwrap();
        assert!(!json.contains("mac"));
        assert!(!json.contains("hostname"));
        assert!(!json.contains("open_ports"));
    }
}
