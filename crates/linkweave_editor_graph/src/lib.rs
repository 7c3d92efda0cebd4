// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection core for the `Linkweave` node graph editor.
//!
//! This crate keeps links between node ports consistent while they are
//! created, dragged from port to port, and torn down:
//! - Endpoint addressing (node, port index, end role)
//! - Single-slot dragging state
//! - Node-side attachment bookkeeping and drop validation
//! - Explicit teardown through the owning scene
//!
//! ## Architecture
//!
//! Nodes live in a [`SceneRegistry`] and are referenced by id only. A
//! [`Connection`] stores the addresses of its ends and resolves nodes through
//! the registry passed to each operation. The [`FlowScene`] owns the registry
//! and every live connection, and hands out [`DragSession`] guards for
//! pointer gestures.

pub mod address;
pub mod state;
pub mod geometry;
pub mod port;
pub mod catalog;
pub mod node;
pub mod connection;
pub mod registry;
pub mod scene;
pub mod config;

pub use address::{EndType, EndpointAddress};
pub use state::ConnectionState;
pub use geometry::{ConnectionGeometry, NodeGeometry};
pub use port::{Port, PortType};
pub use catalog::{NodeCatalog, NodeCategory, NodeType};
pub use node::{Node, NodeId, PortPartner};
pub use connection::{Connection, ConnectionId};
pub use registry::{ConnectionVisual, SceneRegistry, VisualId};
pub use scene::{DragSession, FlowScene, SceneError};
pub use config::{ConfigError, SceneConfig};
