//! Graph → model record conversion.
//!
//! Link endpoints are written as the *display labels* of the connected nodes,
//! which is what the backend keys factors by. Two nodes sharing a label are
//! indistinguishable in the derived link list; the raw `graphData` snapshot
//! still tells them apart.

use std::collections::HashMap;

use aimm_core::{
    Error, LinkRecord, ModelRecord, Result, DEFAULT_MODEL_DESCRIPTION, QUALITY_PLACEHOLDER,
};
use tracing::warn;

use crate::types::{GraphSnapshot, NodeId};

/// Weight written for links that were never given one.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Caller-supplied part of a model record.
#[derive(Debug, Clone, Default)]
pub struct ModelMeta {
    pub name: String,
    pub description: Option<String>,
    pub target_factor: String,
    pub creator: Option<String>,
}

/// Build the record from one snapshot, so `links` and `graph_data` always
/// describe the same graph.
pub fn serialize(snapshot: &GraphSnapshot, meta: &ModelMeta) -> Result<ModelRecord> {
    let labels: HashMap<NodeId, &str> = snapshot
        .nodes()
        .map(|n| (n.id, n.label.as_str()))
        .collect();

    let mut seen: HashMap<&str, NodeId> = HashMap::new();
    for node in snapshot.nodes() {
        if let Some(other) = seen.insert(node.label.as_str(), node.id) {
            warn!(
                "Nodes {} and {} share label '{}'; their links will merge in the saved model",
                other, node.id, node.label
            );
        }
    }

    let mut links = Vec::new();
    for link in snapshot.links() {
        let start = labels.get(&link.source_node()).ok_or_else(|| {
            Error::InvalidSnapshot(format!("{} has no source node", link.id))
        })?;
        let end = labels.get(&link.target_node()).ok_or_else(|| {
            Error::InvalidSnapshot(format!("{} has no target node", link.id))
        })?;
        links.push(LinkRecord {
            start_factor: start.to_string(),
            end_factor: end.to_string(),
            weight: link.weight.unwrap_or(DEFAULT_WEIGHT),
        });
    }

    Ok(ModelRecord {
        name: meta.name.clone(),
        description: meta
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL_DESCRIPTION.to_string()),
        links,
        target_factor: meta.target_factor.clone(),
        creator: meta.creator.clone(),
        quality: QUALITY_PLACEHOLDER,
        deleted: false,
        graph_data: serde_json::to_string(snapshot)?,
    })
}

/// Parse the `graphData` string of a saved model back into a snapshot.
pub fn deserialize_graph(graph_data: &str) -> Result<GraphSnapshot> {
    serde_json::from_str(graph_data).map_err(|e| Error::InvalidSnapshot(e.to_string()))
}
