#![cfg(test)]
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use pnet::util::MacAddr;

use lanscope_common::config::ScanParameters;
use lanscope_common::network::host::DeviceType;
use lanscope_common::network::target::TargetSpec;
use lanscope_core::{ScanEvent, ScanScheduler};
use lanscope_topology::{ConnectionType, TopologyGraph};

use crate::util::{MockProbes, MockVendors};

fn addr(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(192, 168, 7, last))
}

const ROUTER_MAC: MacAddr = MacAddr(0x54, 0x75, 0x95, 0xaa, 0xbb, 0xcc);

/// The end-to-end version of the reference scenario: 4 targets, one
/// router-like host (ICMP + port 80 + router-vendor MAC), one ICMP-only
/// host, two silent.
async fn scan_reference_network() -> (Arc<lanscope_common::session::ScanSession>, Arc<TopologyGraph>)
{
    let probes = Arc::new(
        MockProbes::new()
            .alive(addr(77))
            .mac(addr(77), ROUTER_MAC)
            .port(addr(77), 80)
            .ttl(addr(77), 64)
            .alive(addr(76))
            .ttl(addr(76), 64),
    );
    let vendors = Arc::new(MockVendors::new().vendor(ROUTER_MAC, "TP-Link Technologies"));
    let scheduler = ScanScheduler::new(probes, vendors);

    let target: TargetSpec = "192.168.7.74-192.168.7.77".parse().unwrap();
    let mut params = ScanParameters::new(target);
    params.probe_timeout = Duration::from_millis(50);

    let mut events = scheduler.subscribe();
    let id = scheduler.start_scan(params).await.unwrap();

    loop {
        match events.recv().await.unwrap() {
            ScanEvent::SessionFinished { session, topology } if session.id == id => {
                return (session, topology);
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn reference_scenario_produces_router_hub_graph() {
    let (session, graph) = scan_reference_network().await;

    // All four targets were scanned, but only the two visible hosts become
    // nodes.
    assert_eq!(session.results.len(), 4);
    assert_eq!(graph.node_count(), 2);
    assert!(graph.node(&addr(74)).is_none());
    assert!(graph.node(&addr(75)).is_none());

    let router = graph.node(&addr(77)).expect("router node present");
    assert_eq!(router.device_type, DeviceType::Router);

    let edge = graph
        .edge_between(addr(77), addr(76))
        .expect("spoke connects to the router");
    assert!(edge.confidence > 0.0);
    // The spoke has no ARP entry but a same-subnet TTL.
    assert_eq!(edge.connection_type, ConnectionType::Direct);
}

#[tokio::test]
async fn analysis_is_idempotent_across_requests() {
    let probes = Arc::new(
        MockProbes::new()
            .alive(addr(1))
            .port(addr(1), 53)
            .alive(addr(5))
            .mac(addr(5), MacAddr(0, 1, 2, 3, 4, 5))
            .alive(addr(9)),
    );
    let scheduler = ScanScheduler::new(probes, Arc::new(MockVendors::new()));

    let target: TargetSpec = "192.168.7.1-9".parse().unwrap();
    let mut params = ScanParameters::new(target);
    params.probe_timeout = Duration::from_millis(50);

    let mut events = scheduler.subscribe();
    let id = scheduler.start_scan(params).await.unwrap();

    let from_event = loop {
        match events.recv().await.unwrap() {
            ScanEvent::SessionFinished { session, topology } if session.id == id => {
                break topology;
            }
            _ => continue,
        }
    };

    let first = scheduler.topology(id).await.unwrap();
    let second = scheduler.topology(id).await.unwrap();

    assert_eq!(first, second, "same session, same graph");
    assert_eq!(first, *from_event);
}

#[tokio::test]
async fn no_unordered_pair_carries_two_edges() {
    let (_, graph) = scan_reference_network().await;

    let mut pairs = HashSet::new();
    for edge in graph.edges() {
        let key = if edge.from <= edge.to {
            (edge.from, edge.to)
        } else {
            (edge.to, edge.from)
        };
        assert!(pairs.insert(key), "pair {key:?} has more than one edge");
        assert!(
            graph.node(&edge.from).is_some() && graph.node(&edge.to).is_some(),
            "edge endpoints must be nodes"
        );
    }
}
