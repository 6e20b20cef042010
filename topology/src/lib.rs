//! Topology inference over completed scan sessions.
//!
//! The analyzer is a pure function of a session's host evidence: it never
//! touches the network, never mutates the session, and produces the same
//! graph for the same input. Heuristic thresholds live in
//! [`policy::ClassificationPolicy`] so deployments can tune them without
//! touching the inference code.

pub mod analyzer;
pub mod graph;
pub mod policy;

pub use analyzer::TopologyAnalyzer;
pub use graph::{ConnectionLine, ConnectionType, DeviceNode, TopologyGraph};
pub use policy::ClassificationPolicy;
