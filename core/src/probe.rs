//! The central **abstraction** for host probing.
//!
//! Two seams live here. [`capability::ProbeCapability`] is the contract over
//! the OS-level primitives (ICMP echo, TCP connect, neighbor table, reverse
//! DNS) — production code uses [`capability::SystemProbes`], tests script
//! their own. [`ProbeStrategy`] is one probing technique built on top of a
//! capability; a [`crate::task::ScanTask`] runs the configured strategies in
//! order against a single target.
//!
//! High-level modules depend on these traits rather than concrete
//! implementations, so the scheduler never knows how a probe is performed.

use async_trait::async_trait;

use lanscope_common::ScanError;
use lanscope_common::network::host::HostInfo;

pub mod capability;
pub mod identify;
pub mod reach;

/// One probing technique, stateless given a target and its configured
/// timeout.
///
/// A strategy mutates the host record in place with whatever it learned.
/// Returning an error marks a *partial* probe failure: the task logs it and
/// moves on, the field simply stays absent.
#[async_trait]
pub trait ProbeStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn apply(&self, host: &mut HostInfo) -> Result<(), ScanError>;
}
