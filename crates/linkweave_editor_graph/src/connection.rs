// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connections and their attach/detach protocol.
//!
//! A connection stores the addresses of its two ends and never holds a node
//! directly. Every node access goes through the [`SceneRegistry`] passed in
//! by the caller, so nodes and connections keep independent lifetimes.
//!
//! Lifecycle:
//! 1. [`Connection::create`] (or [`Connection::create_dragging`]) registers a visual.
//! 2. [`Connection::set_dragging_end`] frees one end to follow the pointer.
//! 3. [`Connection::try_connect_to_node`] offers the free end to a node.
//! 4. [`Connection::close`] unregisters from both nodes and removes the visual.

use crate::address::{EndType, EndpointAddress};
use crate::geometry::ConnectionGeometry;
use crate::node::{NodeId, PortPartner};
use crate::registry::{SceneRegistry, VisualId};
use crate::state::ConnectionState;
use egui::Pos2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed link between an output port and an input port
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    source: Option<EndpointAddress>,
    sink: Option<EndpointAddress>,
    state: ConnectionState,
    geometry: ConnectionGeometry,
    visual: VisualId,
}

impl Connection {
    /// Create an unbound connection and register its visual
    pub fn create(registry: &mut SceneRegistry) -> Self {
        let id = ConnectionId::new();
        let visual = registry.register_visual(id);
        tracing::debug!("Created connection {:?}", id);

        Self {
            id,
            source: None,
            sink: None,
            state: ConnectionState::new(),
            geometry: ConnectionGeometry::default(),
            visual,
        }
    }

    /// Create an unbound connection that starts out dragging `end`
    pub fn create_dragging(registry: &mut SceneRegistry, end: EndType) -> Self {
        let mut connection = Self::create(registry);
        connection.state = ConnectionState::dragging(end);
        registry.grab_pointer(connection.visual);
        connection
    }

    /// Connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Free `end` to follow the pointer.
    ///
    /// The stored address for `end` is cleared, and if it was bound the node
    /// drops its registration first. Pointer input is routed to this
    /// connection's visual. Replaces any previous dragging end.
    pub fn set_dragging_end(&mut self, registry: &mut SceneRegistry, end: EndType) {
        if let Some(address) = self.address(end) {
            if let Some(node) = registry.node_mut(address.node_id()) {
                node.disconnect(self.id, end, address.port_index());
            }
        }

        self.state.set_dragging_end(end);
        registry.grab_pointer(self.visual);
        self.set_address(end, None);

        tracing::debug!("Connection {:?} dragging {}", self.id, end);
    }

    /// End currently following the pointer
    pub fn dragging_end(&self) -> Option<EndType> {
        self.state.dragging_end()
    }

    /// Stop dragging without binding. Cleared addresses stay cleared.
    pub fn clear_dragging(&mut self) {
        self.state.clear_dragging();
    }

    /// Stored address for an end, `None` while unbound
    pub fn address(&self, end: EndType) -> Option<EndpointAddress> {
        match end {
            EndType::Source => self.source,
            EndType::Sink => self.sink,
        }
    }

    /// Overwrite the stored address for an end. No validation happens here.
    pub fn set_address(&mut self, end: EndType, address: Option<EndpointAddress>) {
        match end {
            EndType::Source => self.source = address,
            EndType::Sink => self.sink = address,
        }
    }

    /// Whether either end is bound to `node_id`
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        EndType::ALL
            .into_iter()
            .any(|end| self.address(end).is_some_and(|a| a.node_id() == node_id))
    }

    /// Both ends are bound
    pub fn is_complete(&self) -> bool {
        self.source.is_some() && self.sink.is_some()
    }

    /// Try to finish the drag by dropping the dragging end onto a node.
    ///
    /// Returns `false` when the node rejects the drop or is not in the
    /// registry; the connection is left exactly as it was.
    pub fn try_connect_to_node(
        &mut self,
        registry: &mut SceneRegistry,
        node_id: NodeId,
        scene_point: Pos2,
    ) -> bool {
        let partner = self.partner(registry);

        let Some(node) = registry.node_mut(node_id) else {
            tracing::trace!("Connection {:?}: node {:?} not in scene", self.id, node_id);
            return false;
        };

        if !node.can_connect(&self.state, scene_point, partner.as_ref()) {
            tracing::trace!("Connection {:?} rejected by node {:?}", self.id, node_id);
            return false;
        }

        let Some(address) = node.connect(self.id, &self.state, scene_point, partner.as_ref()) else {
            return false;
        };

        self.connect_to_node(registry, address);
        self.state.clear_dragging();
        true
    }

    /// Bind the dragging end to `address` and move its anchor onto the port.
    fn connect_to_node(&mut self, registry: &mut SceneRegistry, address: EndpointAddress) {
        let Some(end) = self.state.dragging_end() else {
            tracing::warn!("Connection {:?} bound without a dragging end", self.id);
            return;
        };

        self.set_address(end, Some(address));

        let anchor = registry
            .node(address.node_id())
            .and_then(|node| node.connection_point_scene_position(address.port_index(), end));
        let Some(anchor) = anchor else {
            tracing::warn!("Connection {:?}: no anchor for {}", self.id, address);
            return;
        };

        let local = registry.map_from_scene(self.visual, anchor);
        self.geometry.set_end_point(end, local);

        // A half-open link collapses onto its only bound port
        if self.address(end.opposite()).is_none() {
            self.geometry.set_end_point(end.opposite(), local);
        }

        registry.update_visual(self.visual);
        tracing::debug!("Connection {:?} bound {} to {}", self.id, end, address);
    }

    /// Tear the connection down.
    ///
    /// Every bound node drops its registration before the visual is removed.
    /// Nodes that have already left the registry are skipped.
    pub fn close(self, registry: &mut SceneRegistry) {
        for end in EndType::ALL {
            let Some(address) = self.address(end) else {
                continue;
            };

            match registry.node_mut(address.node_id()) {
                Some(node) => node.disconnect(self.id, end, address.port_index()),
                None => tracing::debug!(
                    "Connection {:?}: {} node {:?} already gone",
                    self.id,
                    end,
                    address.node_id()
                ),
            }
        }

        registry.remove_visual(self.visual);
        tracing::debug!("Closed connection {:?}", self.id);
    }

    /// Dragging state
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Anchor geometry
    pub fn geometry(&self) -> &ConnectionGeometry {
        &self.geometry
    }

    /// Anchor geometry, for the input layer to move the free end
    pub fn geometry_mut(&mut self) -> &mut ConnectionGeometry {
        &mut self.geometry
    }

    /// Visual handle in the scene registry
    pub fn visual(&self) -> VisualId {
        self.visual
    }

    /// The bound end opposite the dragging one, as seen by a candidate node
    fn partner(&self, registry: &SceneRegistry) -> Option<PortPartner> {
        let end = self.state.dragging_end()?.opposite();
        let address = self.address(end)?;
        let port = registry
            .node(address.node_id())?
            .port(end, address.port_index())?;

        Some(PortPartner {
            node_id: address.node_id(),
            port_type: port.port_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NodeCategory, NodeType};
    use crate::node::Node;
    use crate::port::{Port, PortType};
    use std::collections::HashSet;

    fn blend_type() -> NodeType {
        NodeType {
            id: "blend".to_string(),
            name: "Blend".to_string(),
            category: NodeCategory::Math,
            inputs: vec![
                Port::input("A", PortType::Float),
                Port::input("B", PortType::Float),
            ],
            outputs: vec![Port::output("Out", PortType::Float)],
        }
    }

    struct Fixture {
        registry: SceneRegistry,
        a: NodeId,
        b: NodeId,
    }

    // A at (0, 0), B at (400, 0): A's output 0 anchors at (180, 35),
    // B's input 1 at (400, 57).
    const A_OUT_0: Pos2 = Pos2::new(180.0, 35.0);
    const B_IN_1: Pos2 = Pos2::new(400.0, 57.0);

    fn fixture() -> Fixture {
        let mut registry = SceneRegistry::default();
        let a = registry.add_node(Node::new(&blend_type())).unwrap();
        let b = registry
            .add_node(Node::new(&blend_type()).with_position(400.0, 0.0))
            .unwrap();
        Fixture { registry, a, b }
    }

    /// Connection with SOURCE bound to A:0 and nothing dragging
    fn half_bound(fx: &mut Fixture) -> Connection {
        let mut connection = Connection::create_dragging(&mut fx.registry, EndType::Source);
        assert!(connection.try_connect_to_node(&mut fx.registry, fx.a, A_OUT_0));
        connection
    }

    #[test]
    fn test_create() {
        let mut registry = SceneRegistry::default();
        let connection = Connection::create(&mut registry);

        assert_eq!(connection.dragging_end(), None);
        assert_eq!(connection.address(EndType::Source), None);
        assert_eq!(connection.address(EndType::Sink), None);
        assert_eq!(
            registry.visual(connection.visual()).map(|v| v.connection),
            Some(connection.id())
        );
    }

    #[test]
    fn test_ids_unique() {
        let mut registry = SceneRegistry::default();
        let ids: HashSet<_> = (0..500)
            .map(|_| Connection::create(&mut registry).id())
            .collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_set_address_overwrites() {
        let mut registry = SceneRegistry::default();
        let mut connection = Connection::create(&mut registry);
        let address = EndpointAddress::sink(NodeId::new(), 3);

        connection.set_address(EndType::Sink, Some(address));
        assert_eq!(connection.address(EndType::Sink), Some(address));
        assert_eq!(connection.address(EndType::Source), None);

        connection.set_address(EndType::Sink, None);
        assert_eq!(connection.address(EndType::Sink), None);
    }

    #[test]
    fn test_half_bound_collapses_to_anchor() {
        let mut fx = fixture();
        let connection = half_bound(&mut fx);

        assert_eq!(connection.dragging_end(), None);
        assert_eq!(
            connection.address(EndType::Source),
            Some(EndpointAddress::source(fx.a, 0))
        );
        assert_eq!(connection.geometry().end_point(EndType::Source), A_OUT_0);
        assert!(connection.geometry().is_collapsed());
        assert!(fx.registry.node(fx.a).unwrap().is_attached(connection.id(), EndType::Source, 0));
    }

    #[test]
    fn test_drag_sink_onto_node() {
        let mut fx = fixture();
        let mut connection = half_bound(&mut fx);

        connection.set_dragging_end(&mut fx.registry, EndType::Sink);
        assert_eq!(connection.address(EndType::Sink), None);
        assert_eq!(connection.dragging_end(), Some(EndType::Sink));
        assert_eq!(fx.registry.pointer_grabber(), Some(connection.visual()));

        assert!(connection.try_connect_to_node(&mut fx.registry, fx.b, B_IN_1));
        assert_eq!(
            connection.address(EndType::Sink),
            Some(EndpointAddress::sink(fx.b, 1))
        );
        assert_eq!(connection.dragging_end(), None);
        assert_eq!(connection.geometry().end_point(EndType::Source), A_OUT_0);
        assert_eq!(connection.geometry().end_point(EndType::Sink), B_IN_1);
        assert!(!connection.geometry().is_collapsed());
        assert!(fx.registry.node(fx.b).unwrap().is_attached(connection.id(), EndType::Sink, 1));
        assert!(connection.is_complete());
    }

    #[test]
    fn test_anchor_in_local_space() {
        let mut fx = fixture();
        let mut connection = Connection::create_dragging(&mut fx.registry, EndType::Source);
        fx.registry.visual_mut(connection.visual()).unwrap().origin = Pos2::new(100.0, 10.0);

        assert!(connection.try_connect_to_node(&mut fx.registry, fx.a, A_OUT_0));
        assert_eq!(
            connection.geometry().end_point(EndType::Source),
            Pos2::new(80.0, 25.0)
        );
        assert_eq!(fx.registry.visual(connection.visual()).unwrap().revision, 1);
    }

    #[test]
    fn test_rejection_leaves_connection_untouched() {
        let mut fx = fixture();
        let mut connection = half_bound(&mut fx);
        connection.set_dragging_end(&mut fx.registry, EndType::Sink);
        let geometry = *connection.geometry();

        // empty space, an output where an input is needed, an unknown node
        assert!(!connection.try_connect_to_node(&mut fx.registry, fx.b, Pos2::new(500.0, 200.0)));
        assert!(!connection.try_connect_to_node(&mut fx.registry, fx.b, Pos2::new(580.0, 35.0)));
        assert!(!connection.try_connect_to_node(&mut fx.registry, NodeId::new(), B_IN_1));
        // back onto its own node
        assert!(!connection.try_connect_to_node(&mut fx.registry, fx.a, Pos2::new(0.0, 35.0)));

        assert_eq!(connection.dragging_end(), Some(EndType::Sink));
        assert_eq!(connection.address(EndType::Sink), None);
        assert_eq!(
            connection.address(EndType::Source),
            Some(EndpointAddress::source(fx.a, 0))
        );
        assert_eq!(*connection.geometry(), geometry);
        assert_eq!(fx.registry.node(fx.b).unwrap().attachment_count(), 0);
    }

    #[test]
    fn test_dragging_end_exclusivity() {
        let mut fx = fixture();
        let mut connection = half_bound(&mut fx);
        connection.set_dragging_end(&mut fx.registry, EndType::Sink);
        assert!(connection.try_connect_to_node(&mut fx.registry, fx.b, B_IN_1));

        connection.set_dragging_end(&mut fx.registry, EndType::Source);
        let source_after_first = connection.address(EndType::Source);
        connection.set_dragging_end(&mut fx.registry, EndType::Sink);

        assert_eq!(connection.dragging_end(), Some(EndType::Sink));
        assert_eq!(connection.address(EndType::Source), source_after_first);
        assert_eq!(connection.address(EndType::Sink), None);
    }

    #[test]
    fn test_redrag_releases_old_port() {
        let mut fx = fixture();
        let mut connection = half_bound(&mut fx);
        connection.set_dragging_end(&mut fx.registry, EndType::Sink);
        assert!(connection.try_connect_to_node(&mut fx.registry, fx.b, B_IN_1));

        connection.set_dragging_end(&mut fx.registry, EndType::Sink);
        assert!(!fx.registry.node(fx.b).unwrap().is_attached(connection.id(), EndType::Sink, 1));

        // move to input 0 of the same node
        assert!(connection.try_connect_to_node(&mut fx.registry, fx.b, Pos2::new(400.0, 35.0)));
        assert_eq!(
            connection.address(EndType::Sink),
            Some(EndpointAddress::sink(fx.b, 0))
        );
    }

    #[test]
    fn test_close_unregisters_everywhere() {
        let mut fx = fixture();
        let mut connection = half_bound(&mut fx);
        connection.set_dragging_end(&mut fx.registry, EndType::Sink);
        assert!(connection.try_connect_to_node(&mut fx.registry, fx.b, B_IN_1));
        let id = connection.id();

        connection.close(&mut fx.registry);

        assert!(!fx.registry.node(fx.a).unwrap().is_attached(id, EndType::Source, 0));
        assert!(!fx.registry.node(fx.b).unwrap().is_attached(id, EndType::Sink, 1));
        assert_eq!(fx.registry.visual_count(), 0);
    }

    #[test]
    fn test_close_half_bound_and_stale() {
        let mut fx = fixture();
        let connection = half_bound(&mut fx);
        connection.close(&mut fx.registry);
        assert_eq!(fx.registry.node(fx.a).unwrap().attachment_count(), 0);

        // a node that vanished behind the connection's back
        let mut connection = half_bound(&mut fx);
        let id = connection.id();
        connection.set_address(EndType::Sink, Some(EndpointAddress::sink(NodeId::new(), 0)));
        connection.close(&mut fx.registry);
        assert!(!fx.registry.node(fx.a).unwrap().is_attached(id, EndType::Source, 0));
        assert_eq!(fx.registry.visual_count(), 0);
    }
}
