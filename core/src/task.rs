//! One unit of scan work: all configured probes against a single target.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use lanscope_common::config::ScanParameters;
use lanscope_common::network::host::HostInfo;

use crate::probe::ProbeStrategy;
use crate::probe::capability::ProbeCapability;
use crate::probe::identify::{HostnameProbe, PortSweepProbe, VendorProbe};
use crate::probe::reach::{ArpProbe, ReachabilityProbe};
use crate::vendors::VendorLookup;

/// Per-strategy budget, in units of the per-probe timeout. Bounds a task
/// even if a strategy misbehaves, so the worker pool always makes progress.
const STRATEGY_BUDGET_FACTOR: u32 = 4;

/// Builds the ordered strategy list one scan shares across all of its
/// tasks. Order matters: reachability and ARP first (their alive signals
/// are OR-ed), identification afterwards, gated on visibility.
pub fn build_strategies(
    params: &ScanParameters,
    capability: Arc<dyn ProbeCapability>,
    vendors: Arc<dyn VendorLookup>,
) -> Vec<Box<dyn ProbeStrategy>> {
    let probes = &params.probes;
    let mut strategies: Vec<Box<dyn ProbeStrategy>> = Vec::new();

    if probes.icmp || probes.tcp_reach {
        strategies.push(Box::new(ReachabilityProbe::new(
            capability.clone(),
            params.ports.clone(),
            params.probe_timeout,
            probes.icmp,
            probes.tcp_reach,
        )));
    }
    if probes.arp {
        strategies.push(Box::new(ArpProbe::new(capability.clone())));
    }
    if probes.dns {
        strategies.push(Box::new(HostnameProbe::new(
            capability.clone(),
            params.probe_timeout,
        )));
    }
    if probes.port_sweep {
        strategies.push(Box::new(PortSweepProbe::new(
            capability,
            params.ports.clone(),
            params.probe_timeout,
        )));
    }
    if probes.vendor {
        strategies.push(Box::new(VendorProbe::new(vendors)));
    }

    strategies
}

/// Runs the strategy list against one target and aggregates the evidence
/// into a single [`HostInfo`].
///
/// Failure containment: a strategy error or budget overrun leaves its
/// fields absent and the task continues. The cancellation flag is observed
/// between strategies; an in-flight probe finishes within its own timeout.
pub struct ScanTask {
    target: IpAddr,
    strategies: Arc<Vec<Box<dyn ProbeStrategy>>>,
    probe_timeout: Duration,
    cancel: Arc<AtomicBool>,
}

impl ScanTask {
    pub fn new(
        target: IpAddr,
        strategies: Arc<Vec<Box<dyn ProbeStrategy>>>,
        probe_timeout: Duration,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            target,
            strategies,
            probe_timeout,
            cancel,
        }
    }

    pub async fn run(self) -> HostInfo {
        let mut host = HostInfo::new(self.target);
        let budget = self.probe_timeout.saturating_mul(STRATEGY_BUDGET_FACTOR);

        for strategy in self.strategies.iter() {
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }

            match tokio::time::timeout(budget, strategy.apply(&mut host)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(target = %self.target, probe = strategy.name(), "probe failed: {e}");
                }
                Err(_) => {
                    debug!(target = %self.target, probe = strategy.name(), "probe budget exhausted");
                }
            }
        }

        host
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
