// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dragging state of a connection.

use crate::address::EndType;

/// Which end of a connection, if any, is following the pointer.
///
/// A single slot: setting a new dragging end replaces the previous one.
/// Runtime only, never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionState {
    dragging_end: Option<EndType>,
}

impl ConnectionState {
    /// State with no end being dragged
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a connection created in the middle of a drag
    pub fn dragging(end: EndType) -> Self {
        Self {
            dragging_end: Some(end),
        }
    }

    /// Mark `end` as the dragging end
    pub fn set_dragging_end(&mut self, end: EndType) {
        self.dragging_end = Some(end);
    }

    /// Currently dragging end
    pub fn dragging_end(&self) -> Option<EndType> {
        self.dragging_end
    }

    /// Back to no-drag
    pub fn clear_dragging(&mut self) {
        self.dragging_end = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_without_drag() {
        let state = ConnectionState::new();
        assert_eq!(state.dragging_end(), None);
    }

    #[test]
    fn test_created_mid_drag() {
        let state = ConnectionState::dragging(EndType::Sink);
        assert_eq!(state.dragging_end(), Some(EndType::Sink));
    }

    #[test]
    fn test_single_slot() {
        let mut state = ConnectionState::new();
        state.set_dragging_end(EndType::Source);
        state.set_dragging_end(EndType::Sink);
        assert_eq!(state.dragging_end(), Some(EndType::Sink));

        state.clear_dragging();
        assert_eq!(state.dragging_end(), None);

        // reusable after a bind
        state.set_dragging_end(EndType::Source);
        assert_eq!(state.dragging_end(), Some(EndType::Source));
    }
}
