// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodes and the attachment side of the connection protocol.
//!
//! A node is the authoritative record of which connections touch which of
//! its ports. Connections only remember a node's id and look the node up in
//! the scene registry when they need it.

use crate::address::{EndType, EndpointAddress};
use crate::catalog::NodeType;
use crate::connection::ConnectionId;
use crate::geometry::NodeGeometry;
use crate::port::{Port, PortType};
use crate::state::ConnectionState;
use egui::{Pos2, Vec2};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed end of a connection that is being dropped onto a node
#[derive(Debug, Clone, PartialEq)]
pub struct PortPartner {
    /// Node the fixed end is bound to
    pub node_id: NodeId,
    /// Type of the port the fixed end is bound to
    pub port_type: PortType,
}

/// A node instance in the scene
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Display name
    pub name: String,
    /// Scene position of the node's top-left corner
    pub position: [f32; 2],
    /// Input (sink) ports
    pub inputs: Vec<Port>,
    /// Output (source) ports
    pub outputs: Vec<Port>,
    /// Body and port layout
    pub geometry: NodeGeometry,
    /// Attached connections per (end, port index)
    attachments: IndexMap<(EndType, usize), IndexSet<ConnectionId>>,
}

impl Node {
    /// Create a new node from a type definition
    pub fn new(node_type: &NodeType) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.id.clone(),
            name: node_type.name.clone(),
            position: [0.0, 0.0],
            inputs: node_type.inputs.clone(),
            outputs: node_type.outputs.clone(),
            geometry: NodeGeometry::default(),
            attachments: IndexMap::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Ports on the side an end of that role attaches to
    pub fn ports(&self, end: EndType) -> &[Port] {
        match end {
            EndType::Source => &self.outputs,
            EndType::Sink => &self.inputs,
        }
    }

    /// Get a port by role and index
    pub fn port(&self, end: EndType, index: usize) -> Option<&Port> {
        self.ports(end).get(index)
    }

    /// Translation from node-local to scene coordinates
    pub fn scene_transform(&self) -> Vec2 {
        Vec2::new(self.position[0], self.position[1])
    }

    /// Scene position of a port's anchor, `None` if the node has no such port
    pub fn connection_point_scene_position(&self, port_index: usize, end: EndType) -> Option<Pos2> {
        self.port(end, port_index)?;
        Some(self.geometry.port_anchor(end, port_index) + self.scene_transform())
    }

    /// Port of the given role whose anchor is within reach of a scene point
    pub fn port_at(&self, end: EndType, scene_point: Pos2) -> Option<usize> {
        let local = scene_point - self.scene_transform();
        self.geometry.port_at(end, self.ports(end).len(), local)
    }

    /// Closest port of either role within reach of a scene point
    pub fn port_under(&self, scene_point: Pos2) -> Option<(EndType, usize)> {
        EndType::ALL
            .into_iter()
            .filter_map(|end| {
                let index = self.port_at(end, scene_point)?;
                let anchor = self.connection_point_scene_position(index, end)?;
                Some((end, index, anchor.distance(scene_point)))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(end, index, _)| (end, index))
    }

    /// Connections attached to one port
    pub fn connections(
        &self,
        end: EndType,
        port_index: usize,
    ) -> impl Iterator<Item = ConnectionId> + '_ {
        self.attachments
            .get(&(end, port_index))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Whether a connection is registered at a port
    pub fn is_attached(&self, connection: ConnectionId, end: EndType, port_index: usize) -> bool {
        self.attachments
            .get(&(end, port_index))
            .is_some_and(|set| set.contains(&connection))
    }

    /// Number of (port, connection) registrations
    pub fn attachment_count(&self) -> usize {
        self.attachments.values().map(IndexSet::len).sum()
    }

    /// Whether a connection in `state` may be dropped at `scene_point`.
    ///
    /// Pure: the answer only changes when the node or its attachments do.
    pub fn can_connect(
        &self,
        state: &ConnectionState,
        scene_point: Pos2,
        partner: Option<&PortPartner>,
    ) -> bool {
        self.candidate_port(state, scene_point, partner).is_some()
    }

    /// Register a connection at the port under `scene_point`.
    ///
    /// Returns the chosen address, or `None` when the drop is declined for
    /// the same reasons [`Node::can_connect`] would decline it.
    pub fn connect(
        &mut self,
        connection: ConnectionId,
        state: &ConnectionState,
        scene_point: Pos2,
        partner: Option<&PortPartner>,
    ) -> Option<EndpointAddress> {
        let end = state.dragging_end()?;
        let index = self.candidate_port(state, scene_point, partner)?;

        self.attachments
            .entry((end, index))
            .or_default()
            .insert(connection);

        tracing::debug!(
            "Node {:?} attached connection {:?} at {} port {}",
            self.id,
            connection,
            end,
            index
        );
        Some(EndpointAddress::new(self.id, index, end))
    }

    /// Drop a connection's registration at a port.
    ///
    /// No-op when the registration does not exist.
    pub fn disconnect(&mut self, connection: ConnectionId, end: EndType, port_index: usize) {
        let key = (end, port_index);
        let Some(set) = self.attachments.get_mut(&key) else {
            return;
        };

        if set.shift_remove(&connection) {
            tracing::debug!(
                "Node {:?} detached connection {:?} from {} port {}",
                self.id,
                connection,
                end,
                port_index
            );
        }
        if set.is_empty() {
            self.attachments.shift_remove(&key);
        }
    }

    fn candidate_port(
        &self,
        state: &ConnectionState,
        scene_point: Pos2,
        partner: Option<&PortPartner>,
    ) -> Option<usize> {
        let end = state.dragging_end()?;

        if partner.is_some_and(|p| p.node_id == self.id) {
            tracing::trace!("Node {:?} rejects self-loop", self.id);
            return None;
        }

        let index = self.port_at(end, scene_point)?;
        let port = &self.ports(end)[index];

        if !port.multi_connect && self.connections(end, index).next().is_some() {
            tracing::trace!("Node {:?} {} port {} is full", self.id, end, index);
            return None;
        }

        if let Some(partner) = partner {
            if !port.port_type.links_with(end, &partner.port_type) {
                tracing::trace!(
                    "Node {:?} {} port {} ({:?}) incompatible with {:?}",
                    self.id,
                    end,
                    index,
                    port.port_type,
                    partner.port_type
                );
                return None;
            }
        }

        Some(index)
    }
}
