//! The aggregate map payload handed to the engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::edge::GraphEdge;
use super::node::GraphNode;
use crate::error::{MapError, Result};

/// Start and end of the period a map covers, as free text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Timespan {
    pub start: String,
    pub end: String,
}

/// A complete concept map.
///
/// Every collection defaults to empty, so a payload that is missing `nodes`
/// or `edges` renders as an empty canvas instead of failing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapGraph {
    pub summary: String,
    pub disciplines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timespan: Option<Timespan>,
    pub geography: Vec<String>,
    pub key_themes: Vec<String>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl MapGraph {
    /// Create a map from nodes and edges with empty metadata.
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            nodes,
            edges,
            ..Default::default()
        }
    }

    /// Parse a map from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MapError::InvalidPayload(e.to_string()))
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Map from node id to its position in `nodes`.
    ///
    /// When ids repeat, the first occurrence wins.
    pub fn index_by_id(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            index.entry(node.id.as_str()).or_insert(i);
        }
        index
    }

    /// Disciplines offered by the filter chips.
    ///
    /// Uses the map's declared list, falling back to the distinct node
    /// disciplines (in first-seen order) when the list is empty.
    pub fn available_disciplines(&self) -> Vec<String> {
        if !self.disciplines.is_empty() {
            return self.disciplines.clone();
        }

        let mut seen = Vec::new();
        for node in &self.nodes {
            if !node.discipline.is_empty() && !seen.contains(&node.discipline) {
                seen.push(node.discipline.clone());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_collections_are_empty() {
        let map = MapGraph::from_json(r#"{"summary": "nothing here"}"#).unwrap();
        assert_eq!(map.summary, "nothing here");
        assert_eq!(map.node_count(), 0);
        assert_eq!(map.edge_count(), 0);
        assert!(map.timespan.is_none());
    }

    #[test]
    fn test_full_payload() {
        let map = MapGraph::from_json(
            r#"{
                "summary": "Rome",
                "disciplines": ["History", "Law"],
                "timespan": {"start": "509 BC", "end": "476 AD"},
                "keyThemes": ["republic"],
                "nodes": [
                    {"id": "a", "label": "Roman Republic", "type": "event", "importance": 9},
                    {"id": "b", "label": "Cicero", "type": "person", "importance": 6}
                ],
                "edges": [
                    {"id": "e1", "source": "b", "target": "a", "label": "served", "type": "part_of", "strength": 4}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(map.node_count(), 2);
        assert_eq!(map.edge_count(), 1);
        assert_eq!(map.key_themes, vec!["republic".to_string()]);
        assert_eq!(map.timespan.as_ref().map(|t| t.start.as_str()), Some("509 BC"));
        assert_eq!(map.node("b").map(|n| n.label.as_str()), Some("Cicero"));
    }

    #[test]
    fn test_invalid_payload_is_error() {
        let err = MapGraph::from_json("{\"nodes\": 3}").unwrap_err();
        assert!(matches!(err, MapError::InvalidPayload(_)));
    }

    #[test]
    fn test_available_disciplines_fallback() {
        let map = MapGraph::new(
            vec![
                GraphNode::new("a", "A").with_discipline("Physics"),
                GraphNode::new("b", "B").with_discipline("History"),
                GraphNode::new("c", "C").with_discipline("Physics"),
                GraphNode::new("d", "D"),
            ],
            Vec::new(),
        );
        assert_eq!(map.available_disciplines(), vec!["Physics", "History"]);
    }

    #[test]
    fn test_index_by_id_first_wins() {
        let map = MapGraph::new(
            vec![GraphNode::new("a", "first"), GraphNode::new("a", "second")],
            Vec::new(),
        );
        assert_eq!(map.index_by_id().get("a"), Some(&0));
    }
}
