//! Identification probes, run once a target proved visible: hostname,
//! open-port sweep and MAC-vendor lookup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::trace;

use lanscope_common::ScanError;
use lanscope_common::network::host::HostInfo;

use super::ProbeStrategy;
use super::capability::ProbeCapability;
use crate::vendors::{self, VendorLookup};

/// How many ports a sweep probes concurrently within one task.
const SWEEP_FANOUT: usize = 16;

/// Reverse-DNS hostname resolution.
pub struct HostnameProbe {
    capability: Arc<dyn ProbeCapability>,
    timeout: Duration,
}

impl HostnameProbe {
    pub fn new(capability: Arc<dyn ProbeCapability>, timeout: Duration) -> Self {
        Self {
            capability,
            timeout,
        }
    }
}

#[async_trait]
impl ProbeStrategy for HostnameProbe {
    fn name(&self) -> &'static str {
        "hostname"
    }

    async fn apply(&self, host: &mut HostInfo) -> Result<(), ScanError> {
        if !host.is_visible() {
            return Ok(());
        }
        if let Some(name) = self.capability.reverse_dns(host.address, self.timeout).await {
            host.hostname = Some(name);
        }
        Ok(())
    }
}

/// TCP-connect sweep over the configured port set.
pub struct PortSweepProbe {
    capability: Arc<dyn ProbeCapability>,
    ports: Vec<u16>,
    timeout: Duration,
}

impl PortSweepProbe {
    pub fn new(capability: Arc<dyn ProbeCapability>, ports: Vec<u16>, timeout: Duration) -> Self {
        Self {
            capability,
            ports,
            timeout,
        }
    }
}

#[async_trait]
impl ProbeStrategy for PortSweepProbe {
    fn name(&self) -> &'static str {
        "port-sweep"
    }

    async fn apply(&self, host: &mut HostInfo) -> Result<(), ScanError> {
        // Sweeping targets that never answered anything wastes a full
        // timeout per port across the whole range.
        if !host.is_visible() {
            return Ok(());
        }

        let addr = host.address;
        let capability = &self.capability;
        let timeout = self.timeout;

        // Ports the reachability fallback already confirmed stay recorded;
        // only the rest are probed.
        let remaining: Vec<u16> = self
            .ports
            .iter()
            .copied()
            .filter(|p| !host.open_ports.contains(p))
            .collect();

        let mut connects = stream::iter(remaining)
            .map(|port| async move { (port, capability.tcp_connect(addr, port, timeout).await) })
            .buffer_unordered(SWEEP_FANOUT);

        while let Some((port, open)) = connects.next().await {
            if open {
                trace!("{addr}:{port} open");
                host.open_ports.insert(port);
            }
        }

        Ok(())
    }
}

/// MAC-vendor lookup plus the device hint the vendor implies.
pub struct VendorProbe {
    lookup: Arc<dyn VendorLookup>,
}

impl VendorProbe {
    pub fn new(lookup: Arc<dyn VendorLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl ProbeStrategy for VendorProbe {
    fn name(&self) -> &'static str {
        "vendor"
    }

    async fn apply(&self, host: &mut HostInfo) -> Result<(), ScanError> {
        let Some(mac) = host.mac else {
            return Ok(());
        };
        if let Some(vendor) = self.lookup.vendor(mac) {
            host.device_hint = vendors::vendor_device_hint(&vendor);
            host.vendor = Some(vendor);
        }
        Ok(())
    }
}
