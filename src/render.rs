//! Per-tick render snapshot.
//!
//! [`RenderFrame::build`] reads the simulation, the visible graph and the
//! interaction state and produces plain data for the page to draw. It never
//! writes to any of them.

use serde::Serialize;

use crate::filter::FilteredGraph;
use crate::interaction::{InteractionController, Transform};
use crate::simulation::Simulation;
use crate::style::{EdgeStyle, NodeStyle, color_for_edge_type, edge_width, node_radius, style_for_type};

/// Node opacity with no hover, or for highlighted nodes.
pub const NODE_OPACITY: f32 = 1.0;
/// Opacity of nodes outside the hover highlight.
pub const DIMMED_NODE_OPACITY: f32 = 0.2;
/// Edge opacity with no hover.
pub const EDGE_OPACITY: f32 = 0.6;
/// Opacity of highlighted edges.
pub const HIGHLIGHTED_EDGE_OPACITY: f32 = 1.0;
/// Opacity of edges outside the hover highlight.
pub const DIMMED_EDGE_OPACITY: f32 = 0.1;
/// Node border width.
pub const NODE_STROKE_WIDTH: f32 = 2.0;
/// Node border width when highlighted or selected.
pub const HIGHLIGHTED_STROKE_WIDTH: f32 = 3.0;
/// Extra line width for highlighted edges.
pub const HIGHLIGHTED_EDGE_EXTRA_WIDTH: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub style: NodeStyle,
    pub opacity: f32,
    pub stroke_width: f32,
    pub selected: bool,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_x: f32,
    pub source_y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub label: String,
    pub style: EdgeStyle,
    pub width: f32,
    pub opacity: f32,
    pub highlighted: bool,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub transform: Transform,
    pub alpha: f32,
    pub running: bool,
}

impl RenderFrame {
    /// Snapshot the current state.
    ///
    /// Nodes and edges follow the order of `visible`. Anything the simulation
    /// has no position for is skipped.
    pub fn build(
        visible: &FilteredGraph,
        simulation: &Simulation,
        controller: &InteractionController,
    ) -> Self {
        let highlight = controller.highlight();
        let selected = controller.selected();

        let nodes = visible
            .nodes
            .iter()
            .filter_map(|node| {
                let (x, y) = simulation.position(&node.id)?;
                let highlighted = highlight.is_some_and(|h| h.contains_node(&node.id));
                let is_selected = selected == Some(node.id.as_str());
                let opacity = match highlight {
                    Some(_) if !highlighted => DIMMED_NODE_OPACITY,
                    _ => NODE_OPACITY,
                };
                let stroke_width = if highlighted || is_selected {
                    HIGHLIGHTED_STROKE_WIDTH
                } else {
                    NODE_STROKE_WIDTH
                };
                Some(RenderNode {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    x,
                    y,
                    radius: node_radius(node.importance()),
                    style: style_for_type(node.node_type),
                    opacity,
                    stroke_width,
                    selected: is_selected,
                    highlighted,
                })
            })
            .collect();

        let edges = visible
            .edges
            .iter()
            .filter_map(|edge| {
                let (source_x, source_y) = simulation.position(&edge.source)?;
                let (target_x, target_y) = simulation.position(&edge.target)?;
                let highlighted = highlight.is_some_and(|h| h.contains_edge(&edge.id));
                let (opacity, extra) = match highlight {
                    None => (EDGE_OPACITY, 0.0),
                    Some(_) if highlighted => {
                        (HIGHLIGHTED_EDGE_OPACITY, HIGHLIGHTED_EDGE_EXTRA_WIDTH)
                    }
                    Some(_) => (DIMMED_EDGE_OPACITY, 0.0),
                };
                Some(RenderEdge {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    source_x,
                    source_y,
                    target_x,
                    target_y,
                    label: edge.label.clone(),
                    style: color_for_edge_type(edge.edge_type),
                    width: edge_width(edge.strength()) + extra,
                    opacity,
                    highlighted,
                })
            })
            .collect();

        Self {
            nodes,
            edges,
            transform: controller.transform(),
            alpha: simulation.alpha(),
            running: simulation.is_running(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }
}
