//! Builds a [`TopologyGraph`] from a scan session.

use std::net::IpAddr;

use tracing::debug;

use lanscope_common::network::host::{DeviceType, HostInfo};
use lanscope_common::session::ScanSession;

use crate::graph::{ConnectionLine, ConnectionType, DeviceNode, TopologyGraph};
use crate::policy::ClassificationPolicy;

/// Pure topology inference over a session's host evidence.
///
/// `analyze` is deterministic and idempotent: the same session always
/// produces the same node set, classifications and edges. It reads the
/// session by reference and never mutates it.
#[derive(Debug, Clone, Default)]
pub struct TopologyAnalyzer {
    policy: ClassificationPolicy,
}

impl TopologyAnalyzer {
    pub fn new(policy: ClassificationPolicy) -> Self {
        Self { policy }
    }

    pub fn analyze(&self, session: &ScanSession) -> TopologyGraph {
        let mut graph = TopologyGraph::new();

        // Only hosts that answered a probe or sit in the neighbor table
        // belong in the picture; silent addresses carry no evidence.
        let hosts: Vec<&HostInfo> = session
            .results
            .values()
            .filter(|h| h.is_visible())
            .collect();

        for host in &hosts {
            graph.add_node(DeviceNode {
                id: host.address,
                device_type: self.classify(host),
                label: host
                    .hostname
                    .clone()
                    .unwrap_or_else(|| host.address.to_string()),
            });
        }

        let Some(hub) = self.pick_hub(&graph, &hosts) else {
            return graph;
        };
        debug!("topology hub: {hub}");

        for host in &hosts {
            if host.address == hub {
                continue;
            }
            let (connection_type, confidence) = self.infer_link(host);
            graph.upsert_edge(ConnectionLine {
                from: hub,
                to: host.address,
                connection_type,
                confidence,
            });
        }

        graph
    }

    /// Classifies one host. Rules are evaluated in a fixed order so that
    /// classification is deterministic:
    ///
    /// 1. router evidence (DNS/DHCP ports, infrastructure vendor or
    ///    hostname, conventional gateway octet)
    /// 2. printer evidence (JetDirect/IPP/LPD ports, printer vendor)
    /// 3. mobile-device vendor
    /// 4. server-indicative ports
    /// 5. desktop-PC ports
    /// 6. IoT hostname hints
    /// 7. the hint the scanner derived, if any
    /// 8. Unknown
    pub fn classify(&self, host: &HostInfo) -> DeviceType {
        let policy = &self.policy;
        let vendor = host.vendor.as_deref().unwrap_or("");
        let hostname = host.hostname.as_deref().unwrap_or("");

        let has_any = |ports: &[u16]| ports.iter().any(|p| host.open_ports.contains(p));

        if has_any(&policy.router_ports)
            || ClassificationPolicy::matches_any(vendor, &policy.router_vendors)
            || ClassificationPolicy::matches_any(hostname, &policy.router_hostnames)
            || self.is_gateway_address(host.address)
        {
            return DeviceType::Router;
        }

        if has_any(&policy.printer_ports)
            || ClassificationPolicy::matches_any(vendor, &policy.printer_vendors)
        {
            return DeviceType::Printer;
        }

        if ClassificationPolicy::matches_any(vendor, &policy.mobile_vendors) {
            return DeviceType::Mobile;
        }

        if has_any(&policy.server_ports) {
            return DeviceType::Server;
        }

        if has_any(&policy.pc_ports) {
            return DeviceType::Pc;
        }

        if ClassificationPolicy::matches_any(hostname, &policy.iot_hostnames) {
            return DeviceType::Iot;
        }

        host.device_hint.unwrap_or(DeviceType::Unknown)
    }

    /// The hub every spoke connects to: the first node classified as a
    /// router, else the first host on a conventional gateway address, else
    /// the first visible host.
    fn pick_hub(&self, graph: &TopologyGraph, hosts: &[&HostInfo]) -> Option<IpAddr> {
        graph
            .nodes()
            .find(|n| n.device_type == DeviceType::Router)
            .map(|n| n.id)
            .or_else(|| {
                hosts
                    .iter()
                    .find(|h| self.is_gateway_address(h.address))
                    .map(|h| h.address)
            })
            .or_else(|| hosts.first().map(|h| h.address))
    }

    /// Link type and confidence for one spoke, from strongest evidence to
    /// weakest:
    ///
    /// * wireless-chipset vendor overrides everything;
    /// * an ARP-resolved MAC proves layer-2 adjacency (`Direct`, high);
    /// * a same-subnet TTL suggests adjacency without proving it
    ///   (`Direct`, medium);
    /// * everything else reached the scanner through a router (`Routed`).
    fn infer_link(&self, host: &HostInfo) -> (ConnectionType, f64) {
        let policy = &self.policy;

        if let Some(vendor) = host.vendor.as_deref() {
            if ClassificationPolicy::matches_any(vendor, &policy.wireless_vendors) {
                return (ConnectionType::Wireless, policy.wireless_confidence);
            }
        }

        if host.mac.is_some() {
            return (ConnectionType::Direct, policy.direct_confidence_arp);
        }

        if let Some(hops) = host.ttl.and_then(|ttl| policy.estimated_hops(ttl)) {
            if hops == 0 {
                return (ConnectionType::Direct, policy.direct_confidence_ttl);
            }
        }

        (ConnectionType::Routed, policy.routed_confidence)
    }

    fn is_gateway_address(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(v4) => self.policy.gateway_octets.contains(&v4.octets()[3]),
            IpAddr::V6(_) => false,
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
