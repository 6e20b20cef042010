//! # Scan Target Grammar
//!
//! Defines the possible inputs for a network scan:
//! * A single IP address (host).
//! * An IPv4 range (e.g., `192.168.1.1-100`).
//! * A CIDR block (e.g., `192.168.1.0/24`).
//! * The local LAN (`lan`, detected from the interfaces at resolve time).

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::network::interface;
use crate::network::range::{self, Ipv4Range};

/// A distinct target to be scanned.
///
/// The parsed form stays small; address enumeration happens lazily through
/// [`TargetSpec::resolve`] so a wide range never allocates a vector of
/// addresses up front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetSpec {
    /// Scan the local area network, detected from the interface list.
    Lan,
    /// Scan a single specific host.
    Host(IpAddr),
    /// Scan an inclusive IPv4 range (also the parsed form of CIDR input).
    Range(Ipv4Range),
}

/// A target resolved to concrete addresses, still enumerated lazily.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedTarget {
    Host(IpAddr),
    Range(Ipv4Range),
}

impl TargetSpec {
    /// Resolves the target to enumerable addresses.
    ///
    /// `Lan` consults the interface list here, not at parse time, so a
    /// stored parameter set stays portable across machines.
    pub fn resolve(&self) -> Result<ResolvedTarget, String> {
        match self {
            TargetSpec::Host(addr) => Ok(ResolvedTarget::Host(*addr)),
            TargetSpec::Range(range) => Ok(ResolvedTarget::Range(*range)),
            TargetSpec::Lan => {
                let net = interface::lan_network()
                    .ok_or_else(|| "no viable LAN interface found".to_string())?;

                let net_u32: u32 = u32::from(net.network());
                let broadcast_u32: u32 = u32::from(net.broadcast());

                // Usable range excludes the network and broadcast addresses
                // when the subnet is big enough to spare them.
                let start_u32 = net_u32.saturating_add(1);
                let end_u32 = broadcast_u32.saturating_sub(1);

                let range = if start_u32 <= end_u32 {
                    Ipv4Range::new(Ipv4Addr::from(start_u32), Ipv4Addr::from(end_u32))
                } else {
                    Ipv4Range::new(net.network(), net.broadcast())
                };

                Ok(ResolvedTarget::Range(range))
            }
        }
    }
}

impl ResolvedTarget {
    pub fn iter(&self) -> Box<dyn Iterator<Item = IpAddr> + Send> {
        match self {
            ResolvedTarget::Host(addr) => Box::new(std::iter::once(*addr)),
            ResolvedTarget::Range(r) => Box::new(r.to_iter()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResolvedTarget::Host(_) => 1,
            ResolvedTarget::Range(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The range endpoints if this target is a range.
    pub fn as_range(&self) -> Option<&Ipv4Range> {
        match self {
            ResolvedTarget::Range(r) => Some(r),
            ResolvedTarget::Host(_) => None,
        }
    }
}

impl FromStr for TargetSpec {
    type Err = String;

    /// Parses a string into a `TargetSpec`.
    ///
    /// Supported formats:
    /// * **Keyword**: "lan" (case-insensitive).
    /// * **Host**: single IPv4/IPv6 address (e.g., "192.168.1.5").
    /// * **Range**: "Start-End" (e.g., "192.168.1.1-50", "192.168.1.1-192.168.1.50").
    /// * **CIDR**: "Network/Prefix" (e.g., "192.168.1.0/24").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("lan") {
            return Ok(TargetSpec::Lan);
        }

        if let Ok(addr) = s.parse::<IpAddr>() {
            return Ok(TargetSpec::Host(addr));
        }

        if let Some(target) = parse_ip_range(s)? {
            return Ok(target);
        }

        if let Some(target) = parse_cidr_range(s)? {
            return Ok(target);
        }

        Err(format!("invalid target: {s}"))
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Lan => write!(f, "lan"),
            TargetSpec::Host(addr) => write!(f, "{addr}"),
            TargetSpec::Range(r) => write!(f, "{}-{}", r.start_addr, r.end_addr),
        }
    }
}

// Stored parameter sets keep targets in their textual form.
impl Serialize for TargetSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TargetSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
fn parse_ip_range(s: &str) -> Result<Option<TargetSpec>, String> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let start_addr = start_str
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("Invalid start IP in range '{start_str}': {e}"))?;

    let end_addr = parse_range_end_addr(end_str, &start_addr, s)?;

    if end_addr < start_addr {
        return Err(format!("range end precedes start: {s}"));
    }

    Ok(Some(TargetSpec::Range(Ipv4Range::new(start_addr, end_addr))))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(
    end_str: &str,
    start_addr: &Ipv4Addr,
    original_s: &str,
) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("Invalid end range '{end_str}': {e}"))?;

    if partial_octets.is_empty() {
        return Err(format!("End range cannot be empty: {original_s}"));
    }
    if partial_octets.len() > 4 {
        return Err(format!("End range has too many octets: {end_str}"));
    }

    let partial_len = partial_octets.len();
    let start_index = 4 - partial_len;
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Parses CIDR notation like "192.168.1.0/24".
fn parse_cidr_range(s: &str) -> Result<Option<TargetSpec>, String> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let ipv4_addr = ip_str
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("Invalid IP in CIDR '{ip_str}': {e}"))?;

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| format!("Invalid prefix in CIDR '{prefix_str}': {e}"))?;

    let ipv4_range = range::cidr_range(ipv4_addr, prefix)?;

    Ok(Some(TargetSpec::Range(ipv4_range)))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
