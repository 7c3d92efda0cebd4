// SPDX-License-Identifier: MIT OR Apache-2.0
//! Endpoint addressing for connections.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which end of a directed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndType {
    /// Outgoing side, bound to an output port
    Source,
    /// Incoming side, bound to an input port
    Sink,
}

impl EndType {
    /// Both end roles, sink first (teardown order)
    pub const ALL: [EndType; 2] = [EndType::Sink, EndType::Source];

    /// The other end of the same connection
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Sink,
            Self::Sink => Self::Source,
        }
    }
}

impl fmt::Display for EndType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Sink => f.write_str("sink"),
        }
    }
}

/// Address of one port on one node, seen from one end of a connection.
///
/// Addresses are plain values: a connection swaps a stored address for a new
/// one rather than editing it. An unbound end is represented as
/// `Option::<EndpointAddress>::None` by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointAddress {
    node_id: NodeId,
    port_index: usize,
    end: EndType,
}

impl EndpointAddress {
    /// Create a new address
    pub fn new(node_id: NodeId, port_index: usize, end: EndType) -> Self {
        Self {
            node_id,
            port_index,
            end,
        }
    }

    /// Address of an output port
    pub fn source(node_id: NodeId, port_index: usize) -> Self {
        Self::new(node_id, port_index, EndType::Source)
    }

    /// Address of an input port
    pub fn sink(node_id: NodeId, port_index: usize) -> Self {
        Self::new(node_id, port_index, EndType::Sink)
    }

    /// Node this address points at
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Port index on that node, counted within the end's side
    pub fn port_index(&self) -> usize {
        self.port_index
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.node_id.0, self.end, self.port_index)
    }
}
