//! Data types for diagram nodes, links and store events.

use aimm_core::Factor;
use serde::{Deserialize, Serialize};

pub const TARGET_COLOR: &str = "#80396e";
pub const DEFAULT_COLOR: &str = "#8e7fa2";
pub const HIGHLIGHT_COLOR: &str = "#f5a623";

pub const NODE_WIDTH: f64 = 120.0;
pub const NODE_HEIGHT: f64 = 40.0;

/// Name of the single outbound port every node carries.
pub const OUT_PORT: &str = "out";

/// Store-assigned node id. Never reused within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// Store-assigned link id. Never reused within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A place a link can start or end: a named port, or the body of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConnectionPoint {
    Port { node: NodeId, port: String },
    Body { node: NodeId },
}

impl ConnectionPoint {
    pub fn port(node: NodeId, port: &str) -> Self {
        Self::Port {
            node,
            port: port.to_string(),
        }
    }

    pub fn body(node: NodeId) -> Self {
        Self::Body { node }
    }

    pub fn node(&self) -> NodeId {
        match self {
            Self::Port { node, .. } | Self::Body { node } => *node,
        }
    }
}

/// A factor placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Snapshot of the factor at the time it was added.
    pub factor: Factor,
    /// Display label; serialization reads this, not the id.
    pub label: String,
    pub position: Point,
    pub ports: Vec<String>,
    pub is_target: bool,
    /// Selection highlight; transient, never saved.
    #[serde(skip)]
    pub highlighted: bool,
}

impl Node {
    pub fn color(&self) -> &'static str {
        if self.highlighted {
            HIGHLIGHT_COLOR
        } else if self.is_target {
            TARGET_COLOR
        } else {
            DEFAULT_COLOR
        }
    }

    pub fn out_port(&self) -> ConnectionPoint {
        ConnectionPoint::port(self.id, OUT_PORT)
    }

    pub fn has_port(&self, name: &str) -> bool {
        self.ports.iter().any(|p| p == name)
    }
}

/// A directed, weighted influence between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub source: ConnectionPoint,
    pub target: ConnectionPoint,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub trainable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Link {
    pub fn source_node(&self) -> NodeId {
        self.source.node()
    }

    pub fn target_node(&self) -> NodeId {
        self.target.node()
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source_node() == node || self.target_node() == node
    }
}

/// Editable link attributes, exchanged with the link inspector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkEdit {
    pub weight: Option<f64>,
    pub trainable: bool,
}

/// One element of a graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Cell {
    Node(Node),
    Link(Link),
}

/// Point-in-time copy of every node and link: nodes by id, then links by id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub cells: Vec<Cell>,
}

impl GraphSnapshot {
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.cells.iter().filter_map(|c| match c {
            Cell::Node(n) => Some(n),
            Cell::Link(_) => None,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.cells.iter().filter_map(|c| match c {
            Cell::Link(l) => Some(l),
            Cell::Node(_) => None,
        })
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes().find(|n| n.id == id)
    }
}

/// Change notification emitted by the graph store.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeAdded(NodeId),
    NodeUpdated(NodeId),
    NodeRemoved(NodeId),
    LinkAdded(LinkId),
    LinkUpdated(LinkId),
    LinkRemoved(LinkId),
    /// The whole graph was replaced (restore or clear).
    Reset,
}

/// Notification for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The pointer entered a link; show its inspector control.
    LinkToolsShown(LinkId),
    LinkToolsHidden(LinkId),
    /// The inspector control was invoked; show the weight/trainable editor.
    LinkEditRequested { link: LinkId, current: LinkEdit },
    PopoverOpened(uuid::Uuid),
    PopoverClosed(uuid::Uuid),
    /// User-visible warning.
    Alert(String),
}
