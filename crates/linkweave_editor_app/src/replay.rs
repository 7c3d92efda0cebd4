// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted editing session.
//!
//! Replays a fixed sequence of pointer gestures against a fresh scene, the
//! way the interactive canvas would issue them, and reports what stuck.

use egui::Pos2;
use linkweave_editor_graph::{
    ConfigError, ConnectionId, EndType, FlowScene, NodeCatalog, NodeId, SceneConfig, SceneError,
};
use thiserror::Error;

/// Driver errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Config could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A scene operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// The catalog has no such node type
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// The script addressed a port the node does not have
    #[error("Node {0:?} has no {1} port {2}")]
    MissingPort(NodeId, EndType, usize),
}

/// Outcome of a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    /// Nodes left in the scene
    pub nodes: usize,
    /// Connections left in the scene
    pub connections: usize,
    /// Drops that bound a connection
    pub accepted: usize,
    /// Drops that were refused
    pub rejected: usize,
}

/// Run the scripted session
pub fn replay(config: SceneConfig, catalog: &NodeCatalog) -> Result<ReplayReport, AppError> {
    let mut scene = FlowScene::new(config);
    let mut accepted = 0;
    let mut rejected = 0;
    let mut tally = |ok: bool| {
        if ok {
            accepted += 1;
        } else {
            rejected += 1;
        }
    };

    let constant = spawn(&mut scene, catalog, "constant", 0.0, 0.0)?;
    let add = spawn(&mut scene, catalog, "add", 300.0, 0.0)?;
    let preview = spawn(&mut scene, catalog, "preview", 600.0, 0.0)?;
    let branch = spawn(&mut scene, catalog, "branch", 300.0, 200.0)?;

    tally(drag_link(&mut scene, (constant, 0), (add, 0))?.is_some());
    let into_b = drag_link(&mut scene, (constant, 0), (add, 1))?;
    tally(into_b.is_some());

    // Float into a Bool input
    tally(drag_link(&mut scene, (add, 0), (branch, 1))?.is_some());
    tally(drag_link(&mut scene, (add, 0), (preview, 0))?.is_some());

    // Move the second link onto an Exec input
    if let Some(id) = into_b {
        tally(redrag_sink(&mut scene, id, (branch, 0))?);
    }

    scene.remove_node(constant)?;

    let report = ReplayReport {
        nodes: scene.registry().node_count(),
        connections: scene.connection_count(),
        accepted,
        rejected,
    };
    tracing::info!("Replay finished: {:?}", report);
    Ok(report)
}

fn spawn(
    scene: &mut FlowScene,
    catalog: &NodeCatalog,
    type_id: &str,
    x: f32,
    y: f32,
) -> Result<NodeId, AppError> {
    let node = catalog
        .create_node(type_id)
        .ok_or_else(|| AppError::UnknownNodeType(type_id.to_string()))?
        .with_position(x, y);
    Ok(scene.add_node(node)?)
}

fn anchor(
    scene: &FlowScene,
    node_id: NodeId,
    end: EndType,
    index: usize,
) -> Result<Pos2, AppError> {
    scene
        .registry()
        .node(node_id)
        .ok_or(SceneError::NodeNotFound(node_id))?
        .connection_point_scene_position(index, end)
        .ok_or(AppError::MissingPort(node_id, end, index))
}

/// Press on an output, drag to an input, release
fn drag_link(
    scene: &mut FlowScene,
    (from, output): (NodeId, usize),
    (to, input): (NodeId, usize),
) -> Result<Option<ConnectionId>, AppError> {
    let start = anchor(scene, from, EndType::Source, output)?;
    let target = anchor(scene, to, EndType::Sink, input)?;

    let mut session = scene.begin_new_connection(from, start)?;
    let id = session.connection_id();
    session.move_to(target);
    let bound = session.drop_at(target);
    session.finish();

    tracing::info!(
        "Link {:?} output {} -> {:?} input {}: {}",
        from,
        output,
        to,
        input,
        if bound { "connected" } else { "rejected" }
    );
    Ok(bound.then_some(id))
}

/// Pick up the sink end of a link and drop it on another input
fn redrag_sink(
    scene: &mut FlowScene,
    id: ConnectionId,
    (to, input): (NodeId, usize),
) -> Result<bool, AppError> {
    let target = anchor(scene, to, EndType::Sink, input)?;

    let mut session = scene.begin_drag(id, EndType::Sink)?;
    session.move_to(target);
    let bound = session.try_drop(to, target);
    session.finish();

    tracing::info!("Re-drag {:?} onto {:?} input {}: {}", id, to, input, bound);
    Ok(bound)
}
