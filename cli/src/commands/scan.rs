use std::time::{Duration, Instant};

use anyhow::bail;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use lanscope_common::config::ScanParameters;
use lanscope_common::network::host::HostInfo;
use lanscope_core::history::{JsonHistoryStore, ScanHistoryStore};
use lanscope_core::{ScanEvent, ScanScheduler};

use crate::commands::ScanArgs;
use crate::terminal::print;

pub async fn scan(args: ScanArgs) -> anyhow::Result<()> {
    let mut params = ScanParameters::new(args.target.clone());
    params.probe_timeout = Duration::from_millis(args.timeout_ms);
    params.concurrency = args.concurrency;
    if !args.ports.is_empty() {
        params.ports = args.ports.clone();
    }
    params.probes.dns = !args.no_dns;
    params.probes.port_sweep = !args.no_ports;
    params.probes.icmp = !args.no_icmp;
    params.scan_timeout = args.deadline.map(Duration::from_secs);

    let scheduler = ScanScheduler::with_system_probes();
    let mut events = scheduler.subscribe();

    print::header("network discovery");
    let started = Instant::now();
    let id = scheduler.start_scan(params).await?;

    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "  {bar:32.cyan/blue} {pos}/{len} {msg}",
    )?);

    let (session, graph) = loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ScanEvent::Progress { session, scanned, total }) if session == id => {
                    bar.set_length(total as u64);
                    bar.set_position(scanned as u64);
                }
                Ok(ScanEvent::HostDiscovered { session, host }) if session == id => {
                    bar.set_message(host.address.to_string());
                }
                Ok(ScanEvent::SessionFinished { session, topology }) if session.id == id => {
                    bar.finish_and_clear();
                    break (session, topology);
                }
                Ok(ScanEvent::SessionFailed { session, reason }) if session == id => {
                    bar.finish_and_clear();
                    bail!("scan failed: {reason}");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => bail!("event stream closed unexpectedly"),
            },
            _ = tokio::signal::ctrl_c() => {
                bar.set_message("cancelling...".to_string());
                scheduler.cancel(id).await?;
            }
        }
    };

    let mut hosts: Vec<&HostInfo> = session.results.values().filter(|h| h.is_visible()).collect();
    hosts.sort_by_key(|host| host.address);

    for (idx, host) in hosts.iter().enumerate() {
        print::host_tree(idx, host);
        if idx + 1 != hosts.len() {
            println!();
        }
    }
    print::summary(hosts.len(), started.elapsed(), session.status);

    print::header("topology");
    print::topology(&graph);

    if !args.no_history {
        let store = JsonHistoryStore::new(&args.history);
        let stored = store.save(&session).await?;
        info!("session stored as #{stored} in {}", args.history.display());
    }

    Ok(())
}
