use std::collections::BTreeMap;
use std::net::IpAddr;

use indexmap::IndexMap;
use tracing::warn;

use lanscope_common::network::host::DeviceType;

/// One discovered host in the topology. Node identity is the address the
/// host was scanned under; layout/position belongs to the presentation
/// layer, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    pub id: IpAddr,
    pub device_type: DeviceType,
    pub label: String,
}

/// How two nodes are believed to be linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Unknown,
    Direct,
    Wireless,
    Vpn,
    Routed,
}

/// An inferred (never measured) link between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionLine {
    pub from: IpAddr,
    pub to: IpAddr,
    pub connection_type: ConnectionType,
    /// Evidence strength in `0.0..=1.0`.
    pub confidence: f64,
}

/// The inferred topology for one scan session.
///
/// Invariants: every edge endpoint is a node, and each unordered node pair
/// carries at most one edge. On conflicting inferences for a pair, the
/// higher-confidence edge wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyGraph {
    nodes: IndexMap<IpAddr, DeviceNode>,
    edges: BTreeMap<(IpAddr, IpAddr), ConnectionLine>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: DeviceNode) {
        self.nodes.insert(node.id, node);
    }

    /// Inserts an edge, keeping the stronger inference when the unordered
    /// pair already has one. Edges to missing nodes or self-loops are
    /// dropped rather than corrupting the graph.
    pub fn upsert_edge(&mut self, line: ConnectionLine) -> bool {
        if line.from == line.to {
            warn!("dropping self-loop edge on {}", line.from);
            return false;
        }
        if !self.nodes.contains_key(&line.from) || !self.nodes.contains_key(&line.to) {
            warn!("dropping edge {} -> {}: endpoint not in graph", line.from, line.to);
            return false;
        }

        let key = Self::pair_key(line.from, line.to);
        match self.edges.get(&key) {
            Some(existing) if existing.confidence >= line.confidence => false,
            _ => {
                self.edges.insert(key, line);
                true
            }
        }
    }

    fn pair_key(a: IpAddr, b: IpAddr) -> (IpAddr, IpAddr) {
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn node(&self, id: &IpAddr) -> Option<&DeviceNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DeviceNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &ConnectionLine> {
        self.edges.values()
    }

    /// The edge attached to the unordered pair `(a, b)`, if any.
    pub fn edge_between(&self, a: IpAddr, b: IpAddr) -> Option<&ConnectionLine> {
        self.edges.get(&Self::pair_key(a, b))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
