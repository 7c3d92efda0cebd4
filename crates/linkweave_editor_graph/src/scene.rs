// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow scene: owner of the registry and all live connections.
//!
//! The scene is the only place connections are torn down, so every removal
//! path (explicit removal, node removal, abandoned drag) runs
//! [`Connection::close`] before the connection is dropped.

use crate::address::EndType;
use crate::config::SceneConfig;
use crate::connection::{Connection, ConnectionId};
use crate::node::{Node, NodeId};
use crate::registry::SceneRegistry;
use egui::Pos2;
use indexmap::IndexMap;

/// Error from a scene operation
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// A node with this ID is already in the scene
    #[error("Node already in scene: {0:?}")]
    DuplicateNode(NodeId),

    /// Connection not found
    #[error("Connection not found: {0:?}")]
    ConnectionNotFound(ConnectionId),

    /// Nothing to grab under the pointer
    #[error("No port at the given point on node {0:?}")]
    NoPortAtPoint(NodeId),

    /// The port under the pointer refused a new connection
    #[error("Port on node {0:?} does not accept another connection")]
    PortRejected(NodeId),
}

/// A node scene with its connections
#[derive(Debug, Default)]
pub struct FlowScene {
    registry: SceneRegistry,
    connections: IndexMap<ConnectionId, Connection>,
}

impl FlowScene {
    /// Create an empty scene
    pub fn new(config: SceneConfig) -> Self {
        Self {
            registry: SceneRegistry::new(config),
            connections: IndexMap::new(),
        }
    }

    /// Node and visual registry
    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Node and visual registry, mutable
    pub fn registry_mut(&mut self) -> &mut SceneRegistry {
        &mut self.registry
    }

    /// Add a node to the scene
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, SceneError> {
        self.registry.add_node(node)
    }

    /// Remove a node, closing every connection attached to it first
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, SceneError> {
        if !self.registry.contains_node(node_id) {
            return Err(SceneError::NodeNotFound(node_id));
        }

        let attached: Vec<_> = self
            .connections_for_node(node_id)
            .map(Connection::id)
            .collect();
        for connection_id in &attached {
            if let Some(connection) = self.connections.shift_remove(connection_id) {
                connection.close(&mut self.registry);
            }
        }

        tracing::debug!(
            "Removing node {:?} and {} connection(s)",
            node_id,
            attached.len()
        );
        self.registry
            .take_node(node_id)
            .ok_or(SceneError::NodeNotFound(node_id))
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// A connection together with the registry its operations need
    pub fn connection_parts_mut(
        &mut self,
        connection_id: ConnectionId,
    ) -> Option<(&mut Connection, &mut SceneRegistry)> {
        let connection = self.connections.get_mut(&connection_id)?;
        Some((connection, &mut self.registry))
    }

    /// All live connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Connections with an end bound to a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.involves_node(node_id))
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Close and drop a connection
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Result<(), SceneError> {
        let connection = self
            .connections
            .shift_remove(&connection_id)
            .ok_or(SceneError::ConnectionNotFound(connection_id))?;
        connection.close(&mut self.registry);
        Ok(())
    }

    /// Start a new connection from the port under `scene_point`.
    ///
    /// The grabbed port's end is bound right away and the opposite end is
    /// left dragging.
    pub fn begin_new_connection(
        &mut self,
        node_id: NodeId,
        scene_point: Pos2,
    ) -> Result<DragSession<'_>, SceneError> {
        let node = self
            .registry
            .node(node_id)
            .ok_or(SceneError::NodeNotFound(node_id))?;
        let (end, _) = node
            .port_under(scene_point)
            .ok_or(SceneError::NoPortAtPoint(node_id))?;

        let mut connection = Connection::create_dragging(&mut self.registry, end);
        if !connection.try_connect_to_node(&mut self.registry, node_id, scene_point) {
            connection.close(&mut self.registry);
            return Err(SceneError::PortRejected(node_id));
        }
        connection.set_dragging_end(&mut self.registry, end.opposite());

        let connection_id = connection.id();
        self.connections.insert(connection_id, connection);
        Ok(DragSession::new(self, connection_id))
    }

    /// Pick up one end of an existing connection
    pub fn begin_drag(
        &mut self,
        connection_id: ConnectionId,
        end: EndType,
    ) -> Result<DragSession<'_>, SceneError> {
        let connection = self
            .connections
            .get_mut(&connection_id)
            .ok_or(SceneError::ConnectionNotFound(connection_id))?;
        connection.set_dragging_end(&mut self.registry, end);
        Ok(DragSession::new(self, connection_id))
    }

    /// A drag ended without a successful drop: a connection left with an
    /// unbound end is removed, a complete one just stops dragging.
    fn abandon_drag(&mut self, connection_id: ConnectionId) {
        let Some(connection) = self.connections.get_mut(&connection_id) else {
            return;
        };

        if connection.is_complete() {
            connection.clear_dragging();
            return;
        }

        tracing::debug!("Drag of {:?} abandoned, removing it", connection_id);
        if let Some(connection) = self.connections.shift_remove(&connection_id) {
            connection.close(&mut self.registry);
        }
    }
}

/// One pointer gesture moving a connection end.
///
/// Dropping the session without a successful drop abandons the drag, which
/// removes the connection if it is left half-open. The pointer grab is
/// released in every case.
#[derive(Debug)]
pub struct DragSession<'s> {
    scene: &'s mut FlowScene,
    connection_id: ConnectionId,
    bound: bool,
}

impl<'s> DragSession<'s> {
    fn new(scene: &'s mut FlowScene, connection_id: ConnectionId) -> Self {
        Self {
            scene,
            connection_id,
            bound: false,
        }
    }

    /// Connection being dragged
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// The dragged connection
    pub fn connection(&self) -> Option<&Connection> {
        self.scene.connection(self.connection_id)
    }

    /// End following the pointer, `None` once dropped
    pub fn dragging_end(&self) -> Option<EndType> {
        self.connection().and_then(Connection::dragging_end)
    }

    /// Move the free end to follow the pointer
    pub fn move_to(&mut self, scene_point: Pos2) {
        let Some((connection, registry)) = self.scene.connection_parts_mut(self.connection_id)
        else {
            return;
        };
        let Some(end) = connection.dragging_end() else {
            return;
        };

        let local = registry.map_from_scene(connection.visual(), scene_point);
        connection.geometry_mut().set_end_point(end, local);
        registry.update_visual(connection.visual());
    }

    /// Drop the free end onto a specific node
    pub fn try_drop(&mut self, node_id: NodeId, scene_point: Pos2) -> bool {
        let Some((connection, registry)) = self.scene.connection_parts_mut(self.connection_id)
        else {
            return false;
        };

        let ok = connection.try_connect_to_node(registry, node_id, scene_point);
        self.bound |= ok;
        ok
    }

    /// Drop the free end onto whichever node accepts it first
    pub fn drop_at(&mut self, scene_point: Pos2) -> bool {
        let candidates: Vec<_> = self.scene.registry().node_ids().collect();
        candidates
            .into_iter()
            .any(|node_id| self.try_drop(node_id, scene_point))
    }

    /// End the gesture, returning whether the connection was bound
    pub fn finish(self) -> bool {
        self.bound
    }
}

impl Drop for DragSession<'_> {
    fn drop(&mut self) {
        self.scene.registry.release_pointer();
        if !self.bound {
            self.scene.abandon_drag(self.connection_id);
        }
    }
}
