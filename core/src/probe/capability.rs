//! Contract over the OS probing primitives, and the system-backed
//! implementation.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pnet::util::MacAddr;
use surge_ping::{Client, Config, IcmpPacket, PingIdentifier, PingSequence};
use tracing::debug;

use lanscope_common::ScanError;
use lanscope_common::config::ProbeSet;

/// What an ICMP echo reply tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub round_trip: Duration,
    /// TTL observed on the reply; absent when the socket type hides the IP
    /// header.
    pub ttl: Option<u8>,
}

/// The OS-level probing primitives the engine depends on.
///
/// Every method is best-effort and bounded by the caller-supplied timeout;
/// `None`/`false` means "no evidence", never an error. The one hard check is
/// [`ensure_available`](ProbeCapability::ensure_available), which lets a
/// scan fail fast instead of silently degrading when a required primitive
/// is unusable.
#[async_trait]
pub trait ProbeCapability: Send + Sync {
    async fn icmp_echo(&self, addr: IpAddr, timeout: Duration) -> Option<EchoReply>;

    async fn tcp_connect(&self, addr: IpAddr, port: u16, timeout: Duration) -> bool;

    /// Resolves a MAC address from the OS neighbor table.
    async fn arp_lookup(&self, addr: IpAddr) -> Option<MacAddr>;

    async fn reverse_dns(&self, addr: IpAddr, timeout: Duration) -> Option<String>;

    /// Verifies the primitives required by `probes` are usable.
    fn ensure_available(&self, probes: &ProbeSet) -> Result<(), ScanError>;
}

/// Production implementation backed by the operating system.
pub struct SystemProbes {
    icmp: Option<Client>,
    sequence: AtomicU16,
}

impl SystemProbes {
    pub fn new() -> Self {
        let icmp = match Client::new(&Config::default()) {
            Ok(client) => Some(client),
            Err(e) => {
                debug!("ICMP client unavailable: {e}");
                None
            }
        };
        Self {
            icmp,
            sequence: AtomicU16::new(0),
        }
    }
}

impl Default for SystemProbes {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeCapability for SystemProbes {
    async fn icmp_echo(&self, addr: IpAddr, timeout: Duration) -> Option<EchoReply> {
        let client = self.icmp.as_ref()?;
        if addr.is_ipv6() {
            // The v4 client cannot reach v6 targets; TCP reachability covers
            // them instead.
            return None;
        }

        let ident = PingIdentifier(std::process::id() as u16);
        let mut pinger = client.pinger(addr, ident).await;
        pinger.timeout(timeout);

        let seq = PingSequence(self.sequence.fetch_add(1, Ordering::Relaxed));
        let payload = [0u8; 56];

        match pinger.ping(seq, &payload).await {
            Ok((packet, round_trip)) => {
                let ttl = match packet {
                    IcmpPacket::V4(v4) => v4.get_ttl(),
                    IcmpPacket::V6(_) => None,
                };
                Some(EchoReply { round_trip, ttl })
            }
            Err(e) => {
                debug!("icmp echo to {addr} failed: {e}");
                None
            }
        }
    }

    async fn tcp_connect(&self, addr: IpAddr, port: u16, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, tokio::net::TcpStream::connect((addr, port))).await,
            Ok(Ok(_))
        )
    }

    async fn arp_lookup(&self, addr: IpAddr) -> Option<MacAddr> {
        neighbor_table_lookup(addr).await
    }

    async fn reverse_dns(&self, addr: IpAddr, timeout: Duration) -> Option<String> {
        let lookup = tokio::task::spawn_blocking(move || dns_lookup::lookup_addr(&addr).ok());
        match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(name)) => name.filter(|n| !n.is_empty()),
            _ => None,
        }
    }

    fn ensure_available(&self, probes: &ProbeSet) -> Result<(), ScanError> {
        if probes.icmp && self.icmp.is_none() {
            return Err(ScanError::ProbeCapabilityUnavailable(
                "cannot open an ICMP socket; re-run privileged or disable the ICMP probe".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
async fn neighbor_table_lookup(addr: IpAddr) -> Option<MacAddr> {
    let table = tokio::fs::read_to_string("/proc/net/arp").await.ok()?;
    parse_proc_arp(&table, addr)
}

#[cfg(not(target_os = "linux"))]
async fn neighbor_table_lookup(addr: IpAddr) -> Option<MacAddr> {
    let output = tokio::process::Command::new("arp")
        .arg("-n")
        .arg(addr.to_string())
        .output()
        .await
        .ok()?;
    parse_arp_output(&String::from_utf8_lossy(&output.stdout), addr)
}

/// Parses `/proc/net/arp`. Incomplete entries (flags 0x0) carry a
/// placeholder MAC and are skipped.
fn parse_proc_arp(table: &str, addr: IpAddr) -> Option<MacAddr> {
    let wanted = addr.to_string();
    for line in table.lines().skip(1) {
        let mut fields = line.split_whitespace();
        let (Some(ip), Some(_hw_type), Some(flags), Some(mac)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if ip != wanted || flags == "0x0" {
            continue;
        }
        return parse_mac_token(mac);
    }
    None
}

/// Parses `arp -n <addr>` output, which differs per platform. Any token on
/// a line mentioning the address that looks like a MAC wins.
fn parse_arp_output(output: &str, addr: IpAddr) -> Option<MacAddr> {
    let wanted = addr.to_string();
    output
        .lines()
        .filter(|line| line.contains(&wanted))
        .flat_map(|line| line.split_whitespace())
        .find_map(parse_mac_token)
}

fn parse_mac_token(token: &str) -> Option<MacAddr> {
    let normalized = token.replace('-', ":");
    if normalized.matches(':').count() != 5 {
        return None;
    }

    // Some tables print single-digit octets; pad them so the parse holds.
    let padded: Vec<String> = normalized
        .split(':')
        .map(|octet| {
            if octet.len() == 1 {
                format!("0{octet}")
            } else {
                octet.to_string()
            }
        })
        .collect();

    let mac: MacAddr = padded.join(":").parse().ok()?;
    // All-zero entries mean "no answer yet", not a host.
    if mac == MacAddr::zero() { None } else { Some(mac) }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
