//! Outbound notifications to the presentation layer.
//!
//! The original design pushed results through GUI signals; here the
//! scheduler publishes onto a broadcast channel and any number of
//! subscribers (CLI, history writer, tests) consume at their own pace.

use std::sync::Arc;

use lanscope_common::network::host::HostInfo;
use lanscope_common::session::{ScanSession, SessionId};
use lanscope_topology::TopologyGraph;

#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A visible host produced its result.
    HostDiscovered { session: SessionId, host: HostInfo },
    /// A target finished, alive or not.
    Progress {
        session: SessionId,
        scanned: usize,
        total: usize,
    },
    /// Terminal event for completed and cancelled scans, carrying the final
    /// session record and the inferred topology.
    SessionFinished {
        session: Arc<ScanSession>,
        topology: Arc<TopologyGraph>,
    },
    /// Terminal event for scans that failed systemically.
    SessionFailed { session: SessionId, reason: String },
}
