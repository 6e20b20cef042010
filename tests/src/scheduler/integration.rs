#![cfg(test)]
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use lanscope_common::ScanError;
use lanscope_common::config::ScanParameters;
use lanscope_common::network::target::TargetSpec;
use lanscope_common::session::{ScanSession, ScanStatus};
use lanscope_core::{ScanEvent, ScanScheduler};

use crate::util::{MockProbes, MockVendors};

fn addr(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
}

fn params(range: &str) -> ScanParameters {
    let target: TargetSpec = range.parse().expect("valid target");
    let mut params = ScanParameters::new(target);
    params.probe_timeout = Duration::from_millis(50);
    params
}

async fn run_to_completion(
    scheduler: &ScanScheduler,
    params: ScanParameters,
) -> Arc<ScanSession> {
    let mut events = scheduler.subscribe();
    let id = scheduler.start_scan(params).await.expect("scan starts");

    loop {
        match events.recv().await.expect("event stream open") {
            ScanEvent::SessionFinished { session, .. } if session.id == id => return session,
            _ => continue,
        }
    }
}

#[tokio::test]
async fn every_enumerated_target_appears_exactly_once() {
    let probes = Arc::new(
        MockProbes::new()
            .alive(addr(2))
            .alive(addr(5))
            .alive(addr(9)),
    );
    let scheduler = ScanScheduler::new(probes, Arc::new(MockVendors::new()));

    let session = run_to_completion(&scheduler, params("10.0.0.1-10")).await;

    assert_eq!(session.status, ScanStatus::Completed);
    assert_eq!(session.results.len(), 10);

    let expected: HashSet<IpAddr> = (1..=10).map(addr).collect();
    let actual: HashSet<IpAddr> = session.results.keys().copied().collect();
    assert_eq!(actual, expected, "each target exactly once, none extra");
    assert_eq!(session.alive_count(), 3);
}

#[tokio::test]
async fn one_unreachable_target_does_not_abort_the_scan() {
    // 3 of 4 respond; the fourth times out everywhere.
    let probes = Arc::new(
        MockProbes::new()
            .alive(addr(1))
            .alive(addr(2))
            .alive(addr(3)),
    );
    let scheduler = ScanScheduler::new(probes, Arc::new(MockVendors::new()));

    let session = run_to_completion(&scheduler, params("10.0.0.1-4")).await;

    assert_eq!(session.status, ScanStatus::Completed);
    assert_eq!(session.results.len(), 4);
    assert!(!session.results[&addr(4)].is_alive);
}

#[tokio::test]
async fn worker_pool_never_exceeds_the_concurrency_cap() {
    let probes = Arc::new(MockProbes::new().delay(Duration::from_millis(25)));
    let scheduler = ScanScheduler::new(probes.clone(), Arc::new(MockVendors::new()));

    let mut p = params("10.0.0.1-10");
    p.concurrency = 3;
    let session = run_to_completion(&scheduler, p).await;

    assert_eq!(session.results.len(), 10);
    assert!(
        probes.max_in_flight() <= 3,
        "{} tasks overlapped with a cap of 3",
        probes.max_in_flight()
    );
}

#[tokio::test]
async fn cancellation_keeps_already_collected_results() {
    let probes = Arc::new(MockProbes::new().delay(Duration::from_millis(20)));
    let scheduler = ScanScheduler::new(probes, Arc::new(MockVendors::new()));

    let mut p = params("10.0.1.1-10.0.1.50");
    p.concurrency = 2;
    let mut events = scheduler.subscribe();
    let id = scheduler.start_scan(p).await.unwrap();

    // Let a few targets finish, then cancel mid-flight.
    let mut seen = 0;
    while seen < 3 {
        if let ScanEvent::Progress { session, .. } = events.recv().await.unwrap() {
            if session == id {
                seen += 1;
            }
        }
    }
    scheduler.cancel(id).await.unwrap();
    let at_cancel = scheduler.snapshot(id).await.unwrap();

    let final_session = loop {
        match events.recv().await.unwrap() {
            ScanEvent::SessionFinished { session, .. } if session.id == id => break session,
            _ => continue,
        }
    };

    assert_eq!(final_session.status, ScanStatus::Cancelled);
    assert!(
        final_session.results.len() < 50,
        "cancellation should stop the scan early"
    );
    for collected in at_cancel.results.keys() {
        assert!(
            final_session.results.contains_key(collected),
            "{collected} was collected before cancel and must survive it"
        );
    }
}

#[tokio::test]
async fn scan_deadline_takes_the_cancellation_path() {
    let probes = Arc::new(MockProbes::new().delay(Duration::from_millis(20)));
    let scheduler = ScanScheduler::new(probes, Arc::new(MockVendors::new()));

    let mut p = params("10.0.2.1-10.0.2.200");
    p.concurrency = 2;
    p.scan_timeout = Some(Duration::from_millis(100));

    let session = run_to_completion(&scheduler, p).await;
    assert_eq!(session.status, ScanStatus::Cancelled);
    assert!(session.results.len() < 200);
}

#[tokio::test]
async fn unusable_capability_surfaces_failed_session_event() {
    let probes = Arc::new(MockProbes::new().unavailable());
    let scheduler = ScanScheduler::new(probes, Arc::new(MockVendors::new()));

    let mut events = scheduler.subscribe();
    let result = scheduler.start_scan(params("10.0.0.1-4")).await;
    assert!(matches!(
        result,
        Err(ScanError::ProbeCapabilityUnavailable(_))
    ));

    match events.recv().await.unwrap() {
        ScanEvent::SessionFailed { reason, .. } => {
            assert!(reason.contains("scripted capability disabled"));
        }
        other => panic!("expected SessionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn progress_is_readable_during_and_after_the_scan() {
    let probes = Arc::new(MockProbes::new().alive(addr(1)).delay(Duration::from_millis(10)));
    let scheduler = ScanScheduler::new(probes, Arc::new(MockVendors::new()));

    let mut events = scheduler.subscribe();
    let id = scheduler.start_scan(params("10.0.0.1-6")).await.unwrap();

    // Concurrent progress reads must never block or error while running.
    let progress = scheduler.progress(id).await.unwrap();
    assert!(progress.scanned <= progress.total);
    assert_eq!(progress.total, 6);

    loop {
        match events.recv().await.unwrap() {
            ScanEvent::SessionFinished { session, .. } if session.id == id => break,
            _ => continue,
        }
    }

    let done = scheduler.progress(id).await.unwrap();
    assert_eq!(done.scanned, 6);
    assert_eq!(done.status, ScanStatus::Completed);
    assert_eq!(done.discovered, 1);
}

#[tokio::test]
async fn discovery_events_fire_only_for_visible_hosts() {
    let probes = Arc::new(MockProbes::new().alive(addr(3)));
    let scheduler = ScanScheduler::new(probes, Arc::new(MockVendors::new()));

    let mut events = scheduler.subscribe();
    let id = scheduler.start_scan(params("10.0.0.1-5")).await.unwrap();

    let mut discovered = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            ScanEvent::HostDiscovered { session, host } if session == id => {
                discovered.push(host.address);
            }
            ScanEvent::SessionFinished { session, .. } if session.id == id => break,
            _ => continue,
        }
    }

    assert_eq!(discovered, vec![addr(3)]);
}
