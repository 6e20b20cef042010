//! Scan parameters and their validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::network::target::{ResolvedTarget, TargetSpec};

/// Hard ceiling on worker-pool size, so a mistyped concurrency value cannot
/// exhaust the process socket budget.
pub const MAX_CONCURRENCY: usize = 256;

/// Ports probed when the caller does not supply a custom set.
pub const DEFAULT_PORTS: &[u16] = &[
    21,   // FTP
    22,   // SSH
    23,   // Telnet
    25,   // SMTP
    53,   // DNS
    80,   // HTTP
    110,  // POP3
    135,  // MS RPC
    139,  // NetBIOS
    143,  // IMAP
    443,  // HTTPS
    445,  // SMB
    631,  // IPP
    993,  // IMAPS
    995,  // POP3S
    1723, // PPTP
    3306, // MySQL
    3389, // RDP
    5900, // VNC
    8080, // HTTP-Proxy
    9100, // JetDirect
];

/// Which probe techniques a scan runs per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSet {
    /// ICMP echo reachability (needs an ICMP socket).
    pub icmp: bool,
    /// TCP-connect reachability fallback over the port set.
    pub tcp_reach: bool,
    /// Neighbor-table MAC resolution.
    pub arp: bool,
    /// Reverse DNS hostname lookup.
    pub dns: bool,
    /// Full port sweep of alive hosts.
    pub port_sweep: bool,
    /// MAC-vendor lookup for resolved MACs.
    pub vendor: bool,
}

impl Default for ProbeSet {
    fn default() -> Self {
        Self {
            icmp: true,
            tcp_reach: true,
            arp: true,
            dns: true,
            port_sweep: true,
            vendor: true,
        }
    }
}

impl ProbeSet {
    /// True when no technique that could establish liveness is enabled.
    pub fn has_reachability(&self) -> bool {
        self.icmp || self.tcp_reach || self.arp
    }
}

/// Everything a scan run needs to know, validated before any work starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanParameters {
    pub target: TargetSpec,
    pub ports: Vec<u16>,
    /// Timeout applied to each individual probe, not the whole task.
    pub probe_timeout: Duration,
    pub concurrency: usize,
    pub probes: ProbeSet,
    /// Optional whole-scan deadline; expiry takes the cancellation path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_timeout: Option<Duration>,
}

impl ScanParameters {
    pub fn new(target: TargetSpec) -> Self {
        Self {
            target,
            ports: DEFAULT_PORTS.to_vec(),
            probe_timeout: Duration::from_millis(500),
            concurrency: 64,
            probes: ProbeSet::default(),
            scan_timeout: None,
        }
    }

    /// Checks the parameter set and resolves the target, rejecting requests
    /// that could never produce a meaningful session.
    pub fn validate(&self) -> Result<ResolvedTarget, ScanError> {
        if self.probe_timeout.is_zero() {
            return Err(ScanError::InvalidParameters(
                "probe timeout must be greater than zero".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ScanError::InvalidParameters(
                "concurrency must be at least 1".into(),
            ));
        }
        if !self.probes.has_reachability() {
            return Err(ScanError::InvalidParameters(
                "at least one reachability probe must be enabled".into(),
            ));
        }
        if (self.probes.tcp_reach || self.probes.port_sweep) && self.ports.is_empty() {
            return Err(ScanError::InvalidParameters(
                "port probes enabled but the port set is empty".into(),
            ));
        }

        let resolved = self
            .target
            .resolve()
            .map_err(ScanError::InvalidParameters)?;

        if resolved.is_empty() {
            return Err(ScanError::InvalidParameters(
                "target range contains no addresses".into(),
            ));
        }

        Ok(resolved)
    }

    /// The concurrency actually used: at least 1, never above the cap.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }
}
