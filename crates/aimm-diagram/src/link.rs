//! Link validation and creation.
//!
//! Two creation paths exist: dragging from a port onto another connection
//! point, and linking the two nodes of the selection set. Neither forbids
//! parallel links, cycles or self-loops through distinct points; feedback
//! loops are normal in mental models.

use aimm_core::{Error, Result};
use tracing::debug;

use crate::graph::GraphStore;
use crate::types::{ConnectionPoint, LinkEdit, LinkId, NodeId};

/// A connection is valid iff it does not start and end on the same point.
pub fn validate(source: &ConnectionPoint, target: &ConnectionPoint) -> bool {
    source != target
}

/// Drag path: join two connection points with an unweighted link.
pub fn connect(
    store: &mut GraphStore,
    source: ConnectionPoint,
    target: ConnectionPoint,
) -> Result<LinkId> {
    if !validate(&source, &target) {
        return Err(Error::InvalidConnection(
            "source and target are the same connection point".into(),
        ));
    }
    store.add_link(source, target, None, None)
}

/// Manual path: link `selection[0] -> selection[1]` with `weight`.
///
/// Requires exactly two distinct node ids; anything else is a
/// [`Error::SelectionSize`] and leaves the store untouched.
pub fn link_nodes(store: &mut GraphStore, selection: &[NodeId], weight: f64) -> Result<LinkId> {
    let (from, to) = match selection {
        [a, b] if a != b => (*a, *b),
        [_, _] => return Err(Error::SelectionSize(1)),
        other => return Err(Error::SelectionSize(other.len())),
    };
    let source = store
        .node(from)
        .map(|n| n.out_port())
        .ok_or_else(|| Error::NotFound(from.to_string()))?;
    if !store.contains_node(to) {
        return Err(Error::NotFound(to.to_string()));
    }
    let id = store.add_link(
        source,
        ConnectionPoint::body(to),
        Some(weight),
        Some(format!("Weight: {}", weight)),
    )?;
    debug!("Linked {} -> {} with weight {}", from, to, weight);
    Ok(id)
}

/// Current editable attributes of a link.
pub fn edit_state(store: &GraphStore, link: LinkId) -> Result<LinkEdit> {
    store
        .link(link)
        .map(|l| LinkEdit {
            weight: l.weight,
            trainable: l.trainable,
        })
        .ok_or_else(|| Error::NotFound(link.to_string()))
}

/// Write inspector edits back onto a link.
pub fn commit_edit(store: &mut GraphStore, link: LinkId, edit: LinkEdit) -> Result<()> {
    store.update_link(link, |l| {
        l.weight = edit.weight;
        l.trainable = edit.trainable;
    })?;
    debug!("Updated {}: weight={:?} trainable={}", link, edit.weight, edit.trainable);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::create_node;
    use crate::position::PositionAllocator;
    use aimm_core::Factor;

    fn two_nodes() -> (GraphStore, NodeId, NodeId) {
        let mut store = GraphStore::new();
        let mut positions = PositionAllocator::new();
        let a = create_node(&mut store, &mut positions, &Factor::new("A"), false).id;
        let b = create_node(&mut store, &mut positions, &Factor::new("B"), false).id;
        (store, a, b)
    }

    #[test]
    fn test_validate_rejects_same_point_only() {
        let a = NodeId(1);
        let out = ConnectionPoint::port(a, "out");
        assert!(!validate(&out, &out.clone()));
        assert!(validate(&out, &ConnectionPoint::body(a)));
        assert!(validate(&out, &ConnectionPoint::port(a, "other")));
        assert!(validate(&out, &ConnectionPoint::body(NodeId(2))));
    }

    #[test]
    fn test_connect_allows_parallel_links() {
        let (mut store, a, b) = two_nodes();
        let out = ConnectionPoint::port(a, "out");
        let first = connect(&mut store, out.clone(), ConnectionPoint::body(b)).unwrap();
        let second = connect(&mut store, out.clone(), ConnectionPoint::body(b)).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.link(first).unwrap().weight, None);
        assert!(!store.link(first).unwrap().trainable);

        assert!(connect(&mut store, out.clone(), out).is_err());
        assert_eq!(store.stats().link_count, 2);
    }

    #[test]
    fn test_connect_self_loop_through_body() {
        let (mut store, a, _) = two_nodes();
        let id = connect(&mut store, ConnectionPoint::port(a, "out"), ConnectionPoint::body(a)).unwrap();
        let link = store.link(id).unwrap();
        assert_eq!(link.source_node(), link.target_node());
    }

    #[test]
    fn test_link_nodes_wrong_sizes_do_not_mutate() {
        let (mut store, a, b) = two_nodes();
        let c = NodeId(3);
        let before = store.get_cells();
        for selection in [vec![], vec![a], vec![a, b, c], vec![a, a]] {
            let err = link_nodes(&mut store, &selection, 1.0).unwrap_err();
            assert!(matches!(err, Error::SelectionSize(_)), "{:?}", selection);
        }
        assert_eq!(store.get_cells(), before);
    }

    #[test]
    fn test_link_nodes_creates_weighted_link() {
        let (mut store, a, b) = two_nodes();
        let id = link_nodes(&mut store, &[a, b], 3.0).unwrap();
        let link = store.link(id).unwrap();
        assert_eq!(link.source_node(), a);
        assert_eq!(link.target_node(), b);
        assert_eq!(link.weight, Some(3.0));
        assert_eq!(link.label.as_deref(), Some("Weight: 3"));
        assert_eq!(store.stats().link_count, 1);
    }

    #[test]
    fn test_commit_edit() {
        let (mut store, a, b) = two_nodes();
        let id = connect(&mut store, ConnectionPoint::port(a, "out"), ConnectionPoint::body(b)).unwrap();
        assert_eq!(
            edit_state(&store, id).unwrap(),
            LinkEdit {
                weight: None,
                trainable: false
            }
        );
        let edit = LinkEdit {
            weight: Some(0.4),
            trainable: true,
        };
        commit_edit(&mut store, id, edit).unwrap();
        assert_eq!(edit_state(&store, id).unwrap(), edit);
        assert!(commit_edit(&mut store, LinkId(42), edit).is_err());
    }
}
