use std::time::Duration;

use colored::*;

use lanscope_common::network::host::{DeviceType, HostInfo};
use lanscope_common::session::{ScanStatus, SessionSummary};
use lanscope_topology::{ConnectionType, TopologyGraph};

pub fn header(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title.to_uppercase()).bold().cyan());
    println!();
}

/// One host as a small tree, mirroring how discovery results read in the
/// terminal.
pub fn host_tree(idx: usize, host: &HostInfo) {
    let hostname = host.hostname.as_deref().unwrap_or("No hostname");
    println!(
        "{} {}",
        format!("[{}]", idx + 1).cyan().bold(),
        hostname.bold()
    );

    let mut details: Vec<(&str, ColoredString)> = Vec::new();
    details.push(("Address", host.address.to_string().normal()));
    if let Some(mac) = host.mac {
        details.push(("MAC", mac.to_string().normal()));
    }
    if let Some(vendor) = &host.vendor {
        details.push(("Vendor", vendor.clone().normal()));
    }
    if let Some(rtt) = host.round_trip {
        details.push(("RTT", format!("{:.2}ms", rtt.as_secs_f64() * 1000.0).normal()));
    }
    if let Some(ttl) = host.ttl {
        details.push(("TTL", ttl.to_string().normal()));
    }
    if !host.open_ports.is_empty() {
        let ports = host
            .open_ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        details.push(("Open ports", ports.green()));
    }
    if !host.is_alive {
        details.push(("State", "neighbor-table entry only".dimmed()));
    }

    let last = details.len().saturating_sub(1);
    for (i, (key, value)) in details.into_iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        println!("  {} {}: {}", branch.dimmed(), key.dimmed(), value);
    }
}

pub fn summary(hosts: usize, elapsed: Duration, status: ScanStatus) {
    println!();
    let active = format!("{hosts} visible hosts").bold().green();
    let took = format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow();
    let line = match status {
        ScanStatus::Cancelled => format!("Scan cancelled: {active} collected in {took}"),
        _ => format!("Discovery complete: {active} identified in {took}"),
    };
    println!("{line}");
}

fn device_badge(device_type: DeviceType) -> ColoredString {
    let label = format!("[{}]", device_type.label());
    match device_type {
        DeviceType::Router => label.blue().bold(),
        DeviceType::Server => label.green(),
        DeviceType::Pc => label.cyan(),
        DeviceType::Mobile => label.magenta(),
        DeviceType::Printer => label.yellow(),
        DeviceType::Iot => label.purple(),
        DeviceType::Unknown => label.dimmed(),
    }
}

fn connection_label(connection_type: ConnectionType) -> &'static str {
    match connection_type {
        ConnectionType::Unknown => "unknown",
        ConnectionType::Direct => "direct",
        ConnectionType::Wireless => "wireless",
        ConnectionType::Vpn => "vpn",
        ConnectionType::Routed => "routed",
    }
}

pub fn topology(graph: &TopologyGraph) {
    if graph.node_count() == 0 {
        println!("{}", "No visible hosts; nothing to draw.".dimmed());
        return;
    }

    for node in graph.nodes() {
        println!(
            "  {} {} {}",
            device_badge(node.device_type),
            node.label.bold(),
            node.id.to_string().dimmed()
        );
    }

    if graph.edge_count() > 0 {
        println!();
        for edge in graph.edges() {
            println!(
                "  {} {} {}  {}",
                edge.from,
                format!("<-{}->", connection_label(edge.connection_type)).dimmed(),
                edge.to,
                format!("confidence {:.2}", edge.confidence).dimmed()
            );
        }
    }
}

pub fn session_row(summary: &SessionSummary) {
    println!(
        "  {} {} {} {}",
        format!("#{}", summary.id).cyan().bold(),
        summary
            .started_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .normal(),
        format!("{}", summary.status).yellow(),
        format!("{}/{} alive", summary.alive_hosts, summary.total_hosts).dimmed()
    );
}
