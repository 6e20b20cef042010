//! Reachability probes: ICMP echo, TCP-connect fallback, and neighbor-table
//! resolution.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::trace;

use lanscope_common::ScanError;
use lanscope_common::network::host::HostInfo;

use super::ProbeStrategy;
use super::capability::ProbeCapability;

/// How many TCP connects a reachability check races at once.
const REACH_FANOUT: usize = 8;

/// Establishes `is_alive` via ICMP echo and, failing that, a raced
/// TCP-connect sweep over the configured port set. Ports that answer during
/// the fallback are recorded as open so the sweep does not repeat them.
pub struct ReachabilityProbe {
    capability: Arc<dyn ProbeCapability>,
    ports: Vec<u16>,
    timeout: Duration,
    use_icmp: bool,
    use_tcp: bool,
}

impl ReachabilityProbe {
    pub fn new(
        capability: Arc<dyn ProbeCapability>,
        ports: Vec<u16>,
        timeout: Duration,
        use_icmp: bool,
        use_tcp: bool,
    ) -> Self {
        Self {
            capability,
            ports,
            timeout,
            use_icmp,
            use_tcp,
        }
    }
}

#[async_trait]
impl ProbeStrategy for ReachabilityProbe {
    fn name(&self) -> &'static str {
        "reachability"
    }

    async fn apply(&self, host: &mut HostInfo) -> Result<(), ScanError> {
        if self.use_icmp {
            if let Some(reply) = self.capability.icmp_echo(host.address, self.timeout).await {
                host.is_alive = true;
                host.round_trip = Some(reply.round_trip);
                host.ttl = reply.ttl;
                return Ok(());
            }
        }

        if self.use_tcp {
            let addr = host.address;
            let capability = &self.capability;
            let timeout = self.timeout;

            let mut connects = stream::iter(self.ports.iter().copied())
                .map(|port| async move {
                    (port, capability.tcp_connect(addr, port, timeout).await)
                })
                .buffer_unordered(REACH_FANOUT);

            while let Some((port, open)) = connects.next().await {
                if open {
                    trace!("{addr} answered on port {port}");
                    host.is_alive = true;
                    host.open_ports.insert(port);
                }
            }
        }

        Ok(())
    }
}

/// Resolves the target's MAC from the OS neighbor table.
///
/// Runs regardless of the reachability outcome: an ARP entry makes a host
/// visible even when every probe is filtered. It deliberately does not set
/// `is_alive` — neighbor entries can outlive the host.
pub struct ArpProbe {
    capability: Arc<dyn ProbeCapability>,
}

impl ArpProbe {
    pub fn new(capability: Arc<dyn ProbeCapability>) -> Self {
        Self { capability }
    }
}

#[async_trait]
impl ProbeStrategy for ArpProbe {
    fn name(&self) -> &'static str {
        "arp"
    }

    async fn apply(&self, host: &mut HostInfo) -> Result<(), ScanError> {
        if let Some(mac) = self.capability.arp_lookup(host.address).await {
            host.mac = Some(mac);
        }
        Ok(())
    }
}
