//! Node factory: turns a catalog factor into a canvas node.

use aimm_core::Factor;

use crate::graph::GraphStore;
use crate::position::PositionAllocator;
use crate::types::{Node, OUT_PORT};

/// Place `factor` on the canvas at the next cascading position with a single
/// outbound port. Target factors get the target color.
pub fn create_node(
    store: &mut GraphStore,
    positions: &mut PositionAllocator,
    factor: &Factor,
    is_target: bool,
) -> Node {
    let position = positions.next();
    store
        .add_node(|id| Node {
            id,
            factor: factor.clone(),
            label: factor.name.clone(),
            position,
            ports: vec![OUT_PORT.to_string()],
            is_target,
            highlighted: false,
        })
        .clone()
}
