//! The scan session aggregate: one record per scan run.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ScanParameters;
use crate::network::host::HostInfo;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ScanStatus {
    /// Terminal sessions are never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Completed | ScanStatus::Cancelled | ScanStatus::Failed
        )
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Cancelled => "cancelled",
            ScanStatus::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// The aggregate record of one scan run.
///
/// Results are keyed by address (identity within a session) and keep
/// insertion order, which is discovery-completion order. Only the scheduler
/// that created the session writes to it; once the status is terminal the
/// record is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSession {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub parameters: ScanParameters,
    pub results: IndexMap<IpAddr, HostInfo>,
    pub status: ScanStatus,
}

impl ScanSession {
    pub fn new(id: SessionId, parameters: ScanParameters) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            finished_at: None,
            parameters,
            results: IndexMap::new(),
            status: ScanStatus::Pending,
        }
    }

    /// Merges one completed host result. Repeated results for the same
    /// address replace the earlier record in place.
    pub fn record(&mut self, host: HostInfo) {
        self.results.insert(host.address, host);
    }

    pub fn finish(&mut self, status: ScanStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    pub fn alive_count(&self) -> usize {
        self.results.values().filter(|h| h.is_alive).count()
    }

    /// How many alive hosts expose each open port.
    pub fn port_distribution(&self) -> BTreeMap<u16, usize> {
        let mut distribution = BTreeMap::new();
        for host in self.results.values().filter(|h| h.is_alive) {
            for port in &host.open_ports {
                *distribution.entry(*port).or_insert(0) += 1;
            }
        }
        distribution
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            started_at: self.started_at,
            status: self.status,
            total_hosts: self.results.len(),
            alive_hosts: self.alive_count(),
        }
    }
}

/// Compact listing row for the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub status: ScanStatus,
    pub total_hosts: usize,
    pub alive_hosts: usize,
}

/// Non-blocking view of an in-flight (or finished) scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// Targets that have produced a result, alive or not.
    pub scanned: usize,
    /// Total targets the range enumerates.
    pub total: usize,
    /// Alive hosts discovered so far.
    pub discovered: usize,
    pub status: ScanStatus,
}

/// Hosts that appeared in `later` but not `earlier`, and vice versa.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDiff {
    pub appeared: Vec<HostInfo>,
    pub vanished: Vec<HostInfo>,
}

/// Compares two sessions by address. Only visible hosts participate;
/// a target that merely timed out in both runs is not a change.
pub fn diff_sessions(earlier: &ScanSession, later: &ScanSession) -> SessionDiff {
    let mut diff = SessionDiff::default();

    for host in later.results.values().filter(|h| h.is_visible()) {
        let before = earlier.results.get(&host.address);
        if !before.is_some_and(|h| h.is_visible()) {
            diff.appeared.push(host.clone());
        }
    }

    for host in earlier.results.values().filter(|h| h.is_visible()) {
        let after = later.results.get(&host.address);
        if !after.is_some_and(|h| h.is_visible()) {
            diff.vanished.push(host.clone());
        }
    }

    diff
}
