//! Tuning tables for classification and link inference.
//!
//! The heuristics themselves (rule order, evidence precedence) are fixed in
//! the analyzer; the literal tables and thresholds live here so they can be
//! adjusted per deployment.

use std::time::Duration;

/// Classification and link-inference tuning.
///
/// Vendor and hostname matches are case-insensitive substring checks against
/// these tables.
#[derive(Debug, Clone)]
pub struct ClassificationPolicy {
    /// Ports that mark a host as routing/DHCP infrastructure.
    pub router_ports: Vec<u16>,
    /// Vendor substrings indicating network infrastructure.
    pub router_vendors: Vec<&'static str>,
    /// Hostname substrings indicating a gateway role.
    pub router_hostnames: Vec<&'static str>,
    /// Last octets conventionally assigned to gateways.
    pub gateway_octets: Vec<u8>,

    pub printer_ports: Vec<u16>,
    pub printer_vendors: Vec<&'static str>,

    /// Vendor substrings of mobile-device OUIs.
    pub mobile_vendors: Vec<&'static str>,

    pub server_ports: Vec<u16>,
    /// Ports typical of desktop Windows/PC hosts.
    pub pc_ports: Vec<u16>,

    pub iot_hostnames: Vec<&'static str>,

    /// Vendor substrings of known wireless-chipset OUI ranges.
    pub wireless_vendors: Vec<&'static str>,

    /// Conventional initial TTLs used to estimate hop count from an
    /// observed TTL.
    pub initial_ttls: [u8; 3],

    /// Edge confidence when the spoke's MAC was ARP-resolved.
    pub direct_confidence_arp: f64,
    /// Edge confidence for same-subnet TTL evidence without a MAC.
    pub direct_confidence_ttl: f64,
    /// Edge confidence for multi-hop / no-MAC spokes.
    pub routed_confidence: f64,
    /// Edge confidence for a wireless-vendor override.
    pub wireless_confidence: f64,

    /// RTT-variance threshold for the wireless heuristic. A single scan
    /// collects one RTT sample per host, so this only participates when
    /// multi-sample evidence is available.
    pub wireless_rtt_variance: Duration,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            router_ports: vec![53, 67],
            router_vendors: vec!["cisco", "tp-link", "netgear", "mikrotik", "ubiquiti", "huawei"],
            router_hostnames: vec!["router", "gateway", "gw-", "fritz.box"],
            gateway_octets: vec![1, 254],

            printer_ports: vec![9100, 631, 515],
            printer_vendors: vec!["canon", "epson", "brother", "lexmark", "kyocera"],

            mobile_vendors: vec!["apple", "samsung", "xiaomi", "oneplus", "oppo", "vivo"],

            server_ports: vec![22, 80, 443, 3306, 5432],
            pc_ports: vec![135, 139, 445, 3389],

            iot_hostnames: vec!["esp", "raspberry", "arduino", "tasmota", "shelly", "iot"],

            wireless_vendors: vec!["broadcom", "qualcomm", "mediatek", "espressif", "realtek"],

            initial_ttls: [64, 128, 255],

            direct_confidence_arp: 0.9,
            direct_confidence_ttl: 0.6,
            routed_confidence: 0.5,
            wireless_confidence: 0.7,

            wireless_rtt_variance: Duration::from_millis(40),
        }
    }
}

impl ClassificationPolicy {
    /// Hops between scanner and host, assuming the sender used the nearest
    /// conventional initial TTL at or above the observed value. `None` when
    /// the TTL is implausible (zero).
    pub fn estimated_hops(&self, observed_ttl: u8) -> Option<u8> {
        if observed_ttl == 0 {
            return None;
        }
        self.initial_ttls
            .iter()
            .copied()
            .filter(|initial| *initial >= observed_ttl)
            .min()
            .map(|initial| initial - observed_ttl)
    }

    pub fn matches_any(haystack: &str, needles: &[&'static str]) -> bool {
        let lower = haystack.to_lowercase();
        needles.iter().any(|needle| lower.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hops_from_common_initial_ttls() {
        let policy = ClassificationPolicy::default();
        assert_eq!(policy.estimated_hops(64), Some(0));
        assert_eq!(policy.estimated_hops(63), Some(1));
        assert_eq!(policy.estimated_hops(128), Some(0));
        assert_eq!(policy.estimated_hops(120), Some(8));
        assert_eq!(policy.estimated_hops(255), Some(0));
        assert_eq!(policy.estimated_hops(0), None);
    }

    #[test]
    fn vendor_matching_is_case_insensitive() {
        let policy = ClassificationPolicy::default();
        assert!(ClassificationPolicy::matches_any(
            "Apple, Inc.",
            &policy.mobile_vendors
        ));
        assert!(!ClassificationPolicy::matches_any(
            "Dell Inc.",
            &policy.mobile_vendors
        ));
    }
}
