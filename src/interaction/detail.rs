//! Detail panel data for the selected node.

use serde::Serialize;

use crate::graph::{GraphEdge, GraphNode, MapGraph};

/// One relationship of the selected node: the edge and the node at its
/// other end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub edge: GraphEdge,
    pub node: GraphNode,
}

/// Everything the detail panel shows for a node.
///
/// Built from the full map, so relationships hidden by the current filter
/// still appear.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    pub node: GraphNode,
    /// Label of the node's importance band, e.g. "Critical element".
    pub importance_label: &'static str,
    /// Edges pointing at the node ("influenced by").
    pub incoming: Vec<Relationship>,
    /// Edges leaving the node ("influences").
    pub outgoing: Vec<Relationship>,
}

impl NodeDetail {
    /// Collect the detail for `id`, or `None` if the map has no such node.
    ///
    /// Edges whose other endpoint is missing from the map are left out.
    pub fn build(graph: &MapGraph, id: &str) -> Option<Self> {
        let node = graph.node(id)?.clone();
        let mut incoming = Vec::new();
        let mut outgoing = Vec::new();

        for edge in &graph.edges {
            if edge.target == id {
                if let Some(source) = graph.node(&edge.source) {
                    incoming.push(Relationship {
                        edge: edge.clone(),
                        node: source.clone(),
                    });
                }
            }
            if edge.source == id {
                if let Some(target) = graph.node(&edge.target) {
                    outgoing.push(Relationship {
                        edge: edge.clone(),
                        node: target.clone(),
                    });
                }
            }
        }

        Some(Self {
            importance_label: node.importance_tier().label(),
            node,
            incoming,
            outgoing,
        })
    }
}
