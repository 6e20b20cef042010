//! Scripted probe capability and vendor lookup for driving the engine
//! without a network.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pnet::util::MacAddr;

use lanscope_common::ScanError;
use lanscope_common::config::ProbeSet;
use lanscope_core::probe::capability::{EchoReply, ProbeCapability};
use lanscope_core::vendors::VendorLookup;

/// A network scripted per address. Every probe consults the maps; the
/// capability also tracks how many ICMP probes are in flight at once so
/// tests can assert the scheduler's concurrency cap.
#[derive(Default)]
pub struct MockProbes {
    alive: HashSet<IpAddr>,
    macs: HashMap<IpAddr, MacAddr>,
    hostnames: HashMap<IpAddr, String>,
    open_ports: HashMap<IpAddr, HashSet<u16>>,
    ttls: HashMap<IpAddr, u8>,
    /// Artificial latency per ICMP probe; lets tests overlap tasks.
    probe_delay: Duration,
    unavailable: bool,

    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl MockProbes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alive(mut self, addr: IpAddr) -> Self {
        self.alive.insert(addr);
        self
    }

    pub fn mac(mut self, addr: IpAddr, mac: MacAddr) -> Self {
        self.macs.insert(addr, mac);
        self
    }

    pub fn hostname(mut self, addr: IpAddr, name: &str) -> Self {
        self.hostnames.insert(addr, name.to_string());
        self
    }

    pub fn port(mut self, addr: IpAddr, port: u16) -> Self {
        self.open_ports.entry(addr).or_default().insert(port);
        self
    }

    pub fn ttl(mut self, addr: IpAddr, ttl: u8) -> Self {
        self.ttls.insert(addr, ttl);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// The largest number of ICMP probes that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProbeCapability for MockProbes {
    async fn icmp_echo(&self, addr: IpAddr, _timeout: Duration) -> Option<EchoReply> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        if !self.probe_delay.is_zero() {
            tokio::time::sleep(self.probe_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.alive.contains(&addr).then(|| EchoReply {
            round_trip: Duration::from_millis(1),
            ttl: self.ttls.get(&addr).copied().or(Some(64)),
        })
    }

    async fn tcp_connect(&self, addr: IpAddr, port: u16, _timeout: Duration) -> bool {
        self.open_ports
            .get(&addr)
            .is_some_and(|ports| ports.contains(&port))
    }

    async fn arp_lookup(&self, addr: IpAddr) -> Option<MacAddr> {
        self.macs.get(&addr).copied()
    }

    async fn reverse_dns(&self, addr: IpAddr, _timeout: Duration) -> Option<String> {
        self.hostnames.get(&addr).cloned()
    }

    fn ensure_available(&self, _probes: &ProbeSet) -> Result<(), ScanError> {
        if self.unavailable {
            return Err(ScanError::ProbeCapabilityUnavailable(
                "scripted capability disabled".into(),
            ));
        }
        Ok(())
    }
}

/// Vendor lookup scripted by exact MAC.
#[derive(Default)]
pub struct MockVendors {
    vendors: HashMap<MacAddr, String>,
}

impl MockVendors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vendor(mut self, mac: MacAddr, name: &str) -> Self {
        self.vendors.insert(mac, name.to_string());
        self
    }
}

impl VendorLookup for MockVendors {
    fn vendor(&self, mac: MacAddr) -> Option<String> {
        self.vendors.get(&mac).cloned()
    }
}
