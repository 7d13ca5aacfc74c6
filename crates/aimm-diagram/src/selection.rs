//! Selection set for manual linking: at most two nodes, cleared atomically.

use tracing::debug;

use crate::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionTracker {
    #[default]
    Empty,
    One(NodeId),
    Two(NodeId, NodeId),
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::Empty
    }

    /// Add a node. Re-selecting the only node, or selecting a third, is a no-op.
    /// Returns whether the selection changed.
    pub fn select(&mut self, node: NodeId) -> bool {
        let next = match *self {
            Self::Empty => Self::One(node),
            Self::One(first) if first != node => Self::Two(first, node),
            Self::One(_) | Self::Two(..) => {
                debug!("Selection unchanged by {}", node);
                return false;
            }
        };
        *self = next;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::Empty;
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Two(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes().contains(&node)
    }

    /// Selected nodes in selection order.
    pub fn nodes(&self) -> Vec<NodeId> {
        match *self {
            Self::Empty => Vec::new(),
            Self::One(a) => vec![a],
            Self::Two(a, b) => vec![a, b],
        }
    }
}
