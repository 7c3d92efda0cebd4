// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection and node geometry.
//!
//! Only the anchor points live here. Curve shapes and hit-testing of the
//! link body belong to the renderer.

use crate::address::EndType;
use egui::Pos2;

/// End points of a connection, in the connection's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionGeometry {
    source: Pos2,
    sink: Pos2,
}

impl Default for ConnectionGeometry {
    fn default() -> Self {
        Self {
            source: Pos2::ZERO,
            sink: Pos2::ZERO,
        }
    }
}

impl ConnectionGeometry {
    /// Anchor of one end
    pub fn end_point(&self, end: EndType) -> Pos2 {
        match end {
            EndType::Source => self.source,
            EndType::Sink => self.sink,
        }
    }

    /// Move one end
    pub fn set_end_point(&mut self, end: EndType, point: Pos2) {
        match end {
            EndType::Source => self.source = point,
            EndType::Sink => self.sink = point,
        }
    }

    /// Both ends sit on the same point
    pub fn is_collapsed(&self) -> bool {
        self.source == self.sink
    }
}

/// Layout of a node body and its port anchors.
///
/// Inputs (sink ports) sit on the left edge, outputs (source ports) on the
/// right edge, one row per port below the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    /// Body width
    pub width: f32,
    /// Title bar height
    pub header_height: f32,
    /// Row height per port
    pub port_spacing: f32,
    /// Acceptance radius around a port anchor
    pub hit_radius: f32,
}

impl Default for NodeGeometry {
    fn default() -> Self {
        Self {
            width: 180.0,
            header_height: 24.0,
            port_spacing: 22.0,
            hit_radius: 9.0,
        }
    }
}

impl NodeGeometry {
    /// Anchor of a port in node-local coordinates
    pub fn port_anchor(&self, end: EndType, port_index: usize) -> Pos2 {
        let y =
            self.header_height + port_index as f32 * self.port_spacing + self.port_spacing / 2.0;
        match end {
            EndType::Sink => Pos2::new(0.0, y),
            EndType::Source => Pos2::new(self.width, y),
        }
    }

    /// Nearest port of `end` within the hit radius of a node-local point
    pub fn port_at(&self, end: EndType, port_count: usize, local: Pos2) -> Option<usize> {
        (0..port_count)
            .map(|index| (index, self.port_anchor(end, index).distance(local)))
            .filter(|(_, distance)| *distance <= self.hit_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
