// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene registry: node lookup and connection visuals.
//!
//! The registry is the single owner of nodes and the only place node ids are
//! resolved. It is handed to connection operations explicitly; there is no
//! process-wide instance.

use crate::config::SceneConfig;
use crate::connection::ConnectionId;
use crate::node::{Node, NodeId};
use crate::scene::SceneError;
use egui::{Pos2, Vec2};
use indexmap::IndexMap;

/// Handle to a connection's visual representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(u64);

/// Scene-side record of a connection's visual
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionVisual {
    /// Connection drawn by this visual
    pub connection: ConnectionId,
    /// Scene position of the visual's local origin
    pub origin: Pos2,
    /// Bumped on every repaint request
    pub revision: u64,
}

/// Identity-to-object lookup for the active editing session
#[derive(Debug, Default)]
pub struct SceneRegistry {
    config: SceneConfig,
    nodes: IndexMap<NodeId, Node>,
    visuals: IndexMap<VisualId, ConnectionVisual>,
    next_visual: u64,
    pointer_grabber: Option<VisualId>,
}

impl SceneRegistry {
    /// Create an empty registry
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Add a node; it takes the scene's layout.
    ///
    /// A node whose ID is already registered is refused, so the registered
    /// node keeps its attachments.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId, SceneError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            tracing::warn!("Node {:?} ({}) is already registered", id, node.name);
            return Err(SceneError::DuplicateNode(id));
        }

        node.geometry = self.config.node_geometry();
        tracing::debug!("Registered node {:?} ({})", id, node.name);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Remove a node without touching connections. See `FlowScene::remove_node`.
    pub(crate) fn take_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.nodes.shift_remove(&node_id)
    }

    /// Resolve a node id
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Resolve a node id for mutation
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Whether the node is present
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// All node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Create a visual for a connection
    pub fn register_visual(&mut self, connection: ConnectionId) -> VisualId {
        let id = VisualId(self.next_visual);
        self.next_visual += 1;
        self.visuals.insert(
            id,
            ConnectionVisual {
                connection,
                origin: Pos2::ZERO,
                revision: 0,
            },
        );
        id
    }

    /// Look up a visual
    pub fn visual(&self, visual: VisualId) -> Option<&ConnectionVisual> {
        self.visuals.get(&visual)
    }

    /// Look up a visual for mutation
    pub fn visual_mut(&mut self, visual: VisualId) -> Option<&mut ConnectionVisual> {
        self.visuals.get_mut(&visual)
    }

    /// Number of live visuals
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Ask for a repaint of a visual
    pub fn update_visual(&mut self, visual: VisualId) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.revision += 1;
        }
    }

    /// Remove a visual from the scene. Returns `false` if it was already gone.
    pub fn remove_visual(&mut self, visual: VisualId) -> bool {
        if self.pointer_grabber == Some(visual) {
            self.pointer_grabber = None;
        }
        let removed = self.visuals.shift_remove(&visual).is_some();
        if !removed {
            tracing::warn!("Visual {:?} removed twice", visual);
        }
        removed
    }

    /// Route pointer input to a visual
    pub fn grab_pointer(&mut self, visual: VisualId) {
        self.pointer_grabber = Some(visual);
    }

    /// Stop routing pointer input to any visual
    pub fn release_pointer(&mut self) {
        self.pointer_grabber = None;
    }

    /// Visual currently receiving pointer input
    pub fn pointer_grabber(&self) -> Option<VisualId> {
        self.pointer_grabber
    }

    /// Convert a scene point into a visual's local coordinates
    pub fn map_from_scene(&self, visual: VisualId, scene_point: Pos2) -> Pos2 {
        let origin = self.visuals.get(&visual).map_or(Vec2::ZERO, |v| v.origin.to_vec2());
        scene_point - origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NodeCategory, NodeType};

    fn empty_node() -> Node {
        Node::new(&NodeType {
            id: "empty".to_string(),
            name: "Empty".to_string(),
            category: NodeCategory::Utility,
            inputs: vec![],
            outputs: vec![],
        })
    }

    #[test]
    fn test_node_lookup() {
        let mut registry = SceneRegistry::default();
        let id = registry.add_node(empty_node()).unwrap();

        assert!(registry.contains_node(id));
        assert_eq!(registry.node_count(), 1);
        assert!(registry.node(NodeId::new()).is_none());

        assert!(registry.take_node(id).is_some());
        assert!(registry.node(id).is_none());
    }

    #[test]
    fn test_nodes_take_scene_geometry() {
        let config = SceneConfig {
            node_width: 240.0,
            ..SceneConfig::default()
        };
        let mut registry = SceneRegistry::new(config);
        let id = registry.add_node(empty_node()).unwrap();
        assert_eq!(registry.node(id).unwrap().geometry.width, 240.0);
    }

    #[test]
    fn test_duplicate_node_refused() {
        let mut registry = SceneRegistry::default();
        let node = empty_node().with_position(5.0, 5.0);
        let id = registry.add_node(node.clone()).unwrap();

        assert!(matches!(
            registry.add_node(node.with_position(90.0, 90.0)),
            Err(SceneError::DuplicateNode(dup)) if dup == id
        ));
        assert_eq!(registry.node_count(), 1);
        assert_eq!(registry.node(id).unwrap().position, [5.0, 5.0]);
    }

    #[test]
    fn test_visual_removed_once() {
        let mut registry = SceneRegistry::default();
        let visual = registry.register_visual(ConnectionId::new());
        registry.grab_pointer(visual);

        assert!(registry.remove_visual(visual));
        assert_eq!(registry.pointer_grabber(), None);
        assert!(!registry.remove_visual(visual));
        assert_eq!(registry.visual_count(), 0);
    }

    #[test]
    fn test_map_from_scene() {
        let mut registry = SceneRegistry::default();
        let visual = registry.register_visual(ConnectionId::new());
        registry.visual_mut(visual).unwrap().origin = Pos2::new(10.0, 20.0);

        assert_eq!(registry.map_from_scene(visual, Pos2::new(15.0, 25.0)), Pos2::new(5.0, 5.0));
        registry.update_visual(visual);
        assert_eq!(registry.visual(visual).unwrap().revision, 1);
    }
}
