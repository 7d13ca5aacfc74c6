//! Graph store backing the canvas, using petgraph.
//!
//! Nodes and links live in a `StableDiGraph` arena; callers only ever see
//! store-assigned [`NodeId`]s and [`LinkId`]s, which map to petgraph indices.
//! Links keep endpoint ids, so the logical graph may be cyclic while ownership
//! stays a tree.

use std::collections::{BTreeSet, HashMap, HashSet};

use aimm_core::{Error, Result};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::*;

/// Authoritative in-memory diagram graph.
pub struct GraphStore {
    graph: StableDiGraph<Node, Link>,
    node_index: HashMap<NodeId, NodeIndex>,
    link_index: HashMap<LinkId, EdgeIndex>,
    next_node: u64,
    next_link: u64,
    subscribers: Vec<mpsc::UnboundedSender<GraphEvent>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            link_index: HashMap::new(),
            next_node: 1,
            next_link: 1,
            subscribers: Vec::new(),
        }
    }

    /// Receive a [`GraphEvent`] for every subsequent mutation.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<GraphEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: GraphEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ---------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------

    /// Insert a node built by `build` around a freshly assigned id.
    pub fn add_node(&mut self, build: impl FnOnce(NodeId) -> Node) -> &Node {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        let node = build(id);
        debug_assert_eq!(node.id, id);
        let ix = self.graph.add_node(node);
        self.node_index.insert(id, ix);
        debug!("Added {}", id);
        self.emit(GraphEvent::NodeAdded(id));
        &self.graph[ix]
    }

    /// Remove a node together with every link touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let ix = self
            .node_index
            .get(&id)
            .copied()
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let incident: BTreeSet<LinkId> = self
            .graph
            .edges_directed(ix, Direction::Outgoing)
            .chain(self.graph.edges_directed(ix, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect();

        for link_id in &incident {
            if let Some(eix) = self.link_index.remove(link_id) {
                self.graph.remove_edge(eix);
            }
        }
        self.node_index.remove(&id);
        let node = self
            .graph
            .remove_node(ix)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        debug!("Removed {} and {} incident links", id, incident.len());
        for link_id in incident {
            self.emit(GraphEvent::LinkRemoved(link_id));
        }
        self.emit(GraphEvent::NodeRemoved(id));
        Ok(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index
            .get(&id)
            .and_then(|ix| self.graph.node_weight(*ix))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    /// Mutate a node in place and notify subscribers.
    pub fn update_node(&mut self, id: NodeId, f: impl FnOnce(&mut Node)) -> Result<()> {
        let ix = self
            .node_index
            .get(&id)
            .copied()
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if let Some(node) = self.graph.node_weight_mut(ix) {
            f(node);
        }
        self.emit(GraphEvent::NodeUpdated(id));
        Ok(())
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.node_index.keys().copied().collect();
        ids.sort();
        ids
    }

    // ---------------------------------------------------------------
    // Links
    // ---------------------------------------------------------------

    /// Insert a link between two connection points on existing nodes.
    pub fn add_link(
        &mut self,
        source: ConnectionPoint,
        target: ConnectionPoint,
        weight: Option<f64>,
        label: Option<String>,
    ) -> Result<LinkId> {
        let from = self.resolve_point(&source)?;
        let to = self.resolve_point(&target)?;

        let id = LinkId(self.next_link);
        self.next_link += 1;
        let link = Link {
            id,
            source,
            target,
            weight,
            trainable: false,
            label,
        };
        let eix = self.graph.add_edge(from, to, link);
        self.link_index.insert(id, eix);
        debug!("Added {}", id);
        self.emit(GraphEvent::LinkAdded(id));
        Ok(id)
    }

    fn resolve_point(&self, point: &ConnectionPoint) -> Result<NodeIndex> {
        let node_id = point.node();
        let ix = self
            .node_index
            .get(&node_id)
            .copied()
            .ok_or_else(|| Error::InvalidConnection(format!("{} is not on the canvas", node_id)))?;
        if let ConnectionPoint::Port { port, .. } = point {
            let has_port = self
                .graph
                .node_weight(ix)
                .map(|n| n.has_port(port))
                .unwrap_or(false);
            if !has_port {
                return Err(Error::InvalidConnection(format!(
                    "{} has no port '{}'",
                    node_id, port
                )));
            }
        }
        Ok(ix)
    }

    pub fn remove_link(&mut self, id: LinkId) -> Result<Link> {
        let eix = self
            .link_index
            .remove(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let link = self
            .graph
            .remove_edge(eix)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        debug!("Removed {}", id);
        self.emit(GraphEvent::LinkRemoved(id));
        Ok(link)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.link_index
            .get(&id)
            .and_then(|eix| self.graph.edge_weight(*eix))
    }

    /// Mutate a link's attributes in place and notify subscribers.
    pub fn update_link(&mut self, id: LinkId, f: impl FnOnce(&mut Link)) -> Result<()> {
        let eix = self
            .link_index
            .get(&id)
            .copied()
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if let Some(link) = self.graph.edge_weight_mut(eix) {
            let (source, target) = (link.source.clone(), link.target.clone());
            f(link);
            // endpoints are fixed once drawn
            link.source = source;
            link.target = target;
        }
        self.emit(GraphEvent::LinkUpdated(id));
        Ok(())
    }

    // ---------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------

    /// Stable snapshot of all cells: nodes by id, then links by id.
    pub fn get_cells(&self) -> GraphSnapshot {
        let mut nodes: Vec<&Node> = self.graph.node_weights().collect();
        nodes.sort_by_key(|n| n.id);
        let mut links: Vec<&Link> = self.graph.edge_weights().collect();
        links.sort_by_key(|l| l.id);

        let cells = nodes
            .into_iter()
            .cloned()
            .map(Cell::Node)
            .chain(links.into_iter().cloned().map(Cell::Link))
            .collect();
        GraphSnapshot { cells }
    }

    /// Replace the whole graph with a previously taken snapshot.
    ///
    /// The snapshot is checked first; on error the store is left untouched.
    pub fn restore(&mut self, snapshot: &GraphSnapshot) -> Result<()> {
        let mut nodes: HashMap<NodeId, &Node> = HashMap::new();
        for node in snapshot.nodes() {
            if nodes.insert(node.id, node).is_some() {
                return Err(Error::InvalidSnapshot(format!("duplicate {}", node.id)));
            }
        }
        let mut link_ids = HashSet::new();
        for link in snapshot.links() {
            if !link_ids.insert(link.id) {
                return Err(Error::InvalidSnapshot(format!("duplicate {}", link.id)));
            }
            for end in [&link.source, &link.target] {
                let node = nodes.get(&end.node()).ok_or_else(|| {
                    Error::InvalidSnapshot(format!("{} references missing {}", link.id, end.node()))
                })?;
                if let ConnectionPoint::Port { port, .. } = end {
                    if !node.has_port(port) {
                        return Err(Error::InvalidSnapshot(format!(
                            "{} uses unknown port '{}' on {}",
                            link.id, port, node.id
                        )));
                    }
                }
            }
        }

        self.graph.clear();
        self.node_index.clear();
        self.link_index.clear();
        for node in snapshot.nodes() {
            let mut node = node.clone();
            node.highlighted = false;
            let id = node.id;
            let ix = self.graph.add_node(node);
            self.node_index.insert(id, ix);
            self.next_node = self.next_node.max(id.0 + 1);
        }
        for link in snapshot.links() {
            let from = self.node_index[&link.source_node()];
            let to = self.node_index[&link.target_node()];
            let eix = self.graph.add_edge(from, to, link.clone());
            self.link_index.insert(link.id, eix);
            self.next_link = self.next_link.max(link.id.0 + 1);
        }

        debug!(
            "Restored graph: {} nodes, {} links",
            self.node_index.len(),
            self.link_index.len()
        );
        self.emit(GraphEvent::Reset);
        Ok(())
    }

    /// Drop every node and link. Ids keep counting up.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_index.clear();
        self.link_index.clear();
        self.emit(GraphEvent::Reset);
    }

    /// Get graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.graph.node_count(),
            link_count: self.graph.edge_count(),
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub link_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimm_core::Factor;

    fn plain_node(name: &str) -> impl FnOnce(NodeId) -> Node + '_ {
        move |id| Node {
            id,
            factor: Factor::new(name),
            label: name.to_string(),
            position: Point::default(),
            ports: vec![OUT_PORT.to_string()],
            is_target: false,
            highlighted: false,
        }
    }

    fn out(id: NodeId) -> ConnectionPoint {
        ConnectionPoint::port(id, OUT_PORT)
    }

    #[test]
    fn test_add_and_remove_link() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        let b = store.add_node(plain_node("B")).id;
        let l = store
            .add_link(out(a), ConnectionPoint::body(b), Some(2.0), None)
            .unwrap();
        assert_eq!(store.stats().link_count, 1);
        assert_eq!(store.link(l).unwrap().target_node(), b);

        let removed = store.remove_link(l).unwrap();
        assert_eq!(removed.weight, Some(2.0));
        assert!(store.link(l).is_none());
        assert!(store.remove_link(l).is_err());
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        let b = store.add_node(plain_node("B")).id;
        let c = store.add_node(plain_node("C")).id;
        store.add_link(out(a), ConnectionPoint::body(b), None, None).unwrap();
        store.add_link(out(b), ConnectionPoint::body(a), None, None).unwrap();
        store.add_link(out(b), ConnectionPoint::body(b), None, None).unwrap();
        let keep = store.add_link(out(a), ConnectionPoint::body(c), None, None).unwrap();

        store.remove_node(b).unwrap();

        let cells = store.get_cells();
        assert!(cells.links().all(|l| !l.touches(b)));
        assert!(cells.nodes().all(|n| n.id != b));
        assert_eq!(cells.links().map(|l| l.id).collect::<Vec<_>>(), vec![keep]);
        assert_eq!(store.stats(), GraphStats { node_count: 2, link_count: 1 });
    }

    #[test]
    fn test_link_requires_existing_nodes_and_ports() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        let ghost = NodeId(99);
        assert!(matches!(
            store.add_link(out(a), ConnectionPoint::body(ghost), None, None),
            Err(Error::InvalidConnection(_))
        ));
        assert!(matches!(
            store.add_link(ConnectionPoint::port(a, "in"), ConnectionPoint::body(a), None, None),
            Err(Error::InvalidConnection(_))
        ));
        assert_eq!(store.stats().link_count, 0);
    }

    #[test]
    fn test_ids_not_reused() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        store.remove_node(a).unwrap();
        let b = store.add_node(plain_node("B")).id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_cells_are_ordered() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        let b = store.add_node(plain_node("B")).id;
        store.add_link(out(b), ConnectionPoint::body(a), None, None).unwrap();
        let c = store.add_node(plain_node("C")).id;
        let cells = store.get_cells();
        let kinds: Vec<&str> = cells
            .cells
            .iter()
            .map(|c| match c {
                Cell::Node(_) => "node",
                Cell::Link(_) => "link",
            })
            .collect();
        assert_eq!(kinds, vec!["node", "node", "node", "link"]);
        assert_eq!(cells.nodes().map(|n| n.id).collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn test_events_are_emitted() {
        let mut store = GraphStore::new();
        let mut rx = store.subscribe();
        let a = store.add_node(plain_node("A")).id;
        let l = store.add_link(out(a), ConnectionPoint::body(a), None, None).unwrap();
        store.update_link(l, |link| link.trainable = true).unwrap();
        store.remove_node(a).unwrap();

        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        assert_eq!(
            events,
            vec![
                GraphEvent::NodeAdded(a),
                GraphEvent::LinkAdded(l),
                GraphEvent::LinkUpdated(l),
                GraphEvent::LinkRemoved(l),
                GraphEvent::NodeRemoved(a),
            ]
        );
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut store = GraphStore::new();
        let rx = store.subscribe();
        drop(rx);
        store.add_node(plain_node("A"));
        assert!(store.subscribers.is_empty());
    }

    #[test]
    fn test_update_link_keeps_endpoints() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        let b = store.add_node(plain_node("B")).id;
        let l = store.add_link(out(a), ConnectionPoint::body(b), None, None).unwrap();
        store
            .update_link(l, |link| {
                link.weight = Some(4.0);
                link.target = ConnectionPoint::body(a);
            })
            .unwrap();
        let link = store.link(l).unwrap();
        assert_eq!(link.weight, Some(4.0));
        assert_eq!(link.target_node(), b);
    }

    #[test]
    fn test_restore_roundtrip_and_rejects_dangling() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        let b = store.add_node(plain_node("B")).id;
        store.add_link(out(a), ConnectionPoint::body(b), Some(1.5), None).unwrap();
        let snapshot = store.get_cells();

        let mut other = GraphStore::new();
        other.restore(&snapshot).unwrap();
        assert_eq!(other.get_cells(), snapshot);
        let fresh = other.add_node(plain_node("C")).id;
        assert!(fresh.0 > b.0);

        let mut broken = snapshot.clone();
        broken.cells.retain(|c| !matches!(c, Cell::Node(n) if n.id == b));
        assert!(matches!(other.restore(&broken), Err(Error::InvalidSnapshot(_))));
        assert_eq!(other.stats().node_count, 3);
    }

    #[test]
    fn test_restore_rejects_unknown_port() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        let b = store.add_node(plain_node("B")).id;
        store.add_link(out(a), ConnectionPoint::body(b), None, None).unwrap();
        let mut snapshot = store.get_cells();
        for cell in &mut snapshot.cells {
            if let Cell::Link(link) = cell {
                link.source = ConnectionPoint::port(a, "nope");
            }
        }

        let mut other = GraphStore::new();
        assert!(matches!(other.restore(&snapshot), Err(Error::InvalidSnapshot(_))));
        assert_eq!(other.stats().node_count, 0);
    }

    #[test]
    fn test_restore_clears_highlight() {
        let mut store = GraphStore::new();
        let a = store.add_node(plain_node("A")).id;
        store.update_node(a, |n| n.highlighted = true).unwrap();
        let snapshot = store.get_cells();

        let mut other = GraphStore::new();
        other.restore(&snapshot).unwrap();
        assert!(!other.node(a).unwrap().highlighted);
    }
}
