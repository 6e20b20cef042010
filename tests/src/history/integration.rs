#![cfg(test)]
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use lanscope_common::config::ScanParameters;
use lanscope_common::network::target::TargetSpec;
use lanscope_common::session::{self, ScanSession};
use lanscope_core::history::{JsonHistoryStore, ScanHistoryStore};
use lanscope_core::{ScanEvent, ScanScheduler};
use lanscope_topology::TopologyAnalyzer;

use crate::util::{MockProbes, MockVendors};

fn addr(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(172, 16, 0, last))
}

async fn scan(probes: MockProbes, range: &str) -> ScanSession {
    let scheduler = ScanScheduler::new(Arc::new(probes), Arc::new(MockVendors::new()));

    let target: TargetSpec = range.parse().unwrap();
    let mut params = ScanParameters::new(target);
    params.probe_timeout = Duration::from_millis(50);

    let mut events = scheduler.subscribe();
    let id = scheduler.start_scan(params).await.unwrap();
    loop {
        match events.recv().await.unwrap() {
            ScanEvent::SessionFinished { session, .. } if session.id == id => {
                return (*session).clone();
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn stored_session_round_trips_and_reanalyzes_identically() {
    let probes = MockProbes::new()
        .alive(addr(1))
        .port(addr(1), 53)
        .alive(addr(3))
        .hostname(addr(3), "desk.lan");
    let session = scan(probes, "172.16.0.1-4").await;

    let dir = tempfile::tempdir().unwrap();
    let store = JsonHistoryStore::new(dir.path().join("history.json"));

    let id = store.save(&session).await.unwrap();
    let loaded = store.load(id).await.unwrap();
    assert_eq!(loaded, session);

    // Analysis of the reloaded record matches analysis of the live one.
    let analyzer = TopologyAnalyzer::default();
    assert_eq!(analyzer.analyze(&loaded), analyzer.analyze(&session));
}

#[tokio::test]
async fn diff_between_two_stored_scans_reports_changes() {
    let first = scan(
        MockProbes::new().alive(addr(1)).alive(addr(2)),
        "172.16.0.1-4",
    )
    .await;
    let second = scan(
        MockProbes::new().alive(addr(1)).alive(addr(4)),
        "172.16.0.1-4",
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = JsonHistoryStore::new(dir.path().join("history.json"));
    let first_id = store.save(&first).await.unwrap();
    let second_id = store.save(&second).await.unwrap();

    let earlier = store.load(first_id).await.unwrap();
    let later = store.load(second_id).await.unwrap();

    let diff = session::diff_sessions(&earlier, &later);
    let appeared: Vec<IpAddr> = diff.appeared.iter().map(|h| h.address).collect();
    let vanished: Vec<IpAddr> = diff.vanished.iter().map(|h| h.address).collect();

    assert_eq!(appeared, vec![addr(4)]);
    assert_eq!(vanished, vec![addr(2)]);
}

#[tokio::test]
async fn summaries_survive_the_store() {
    let session = scan(MockProbes::new().alive(addr(9)), "172.16.0.8-10").await;

    let dir = tempfile::tempdir().unwrap();
    let store = JsonHistoryStore::new(dir.path().join("history.json"));
    store.save(&session).await.unwrap();

    let summaries = store.list().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_hosts, 3);
    assert_eq!(summaries[0].alive_hosts, 1);
    assert_eq!(summaries[0].status, session.status);
}
