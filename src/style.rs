//! Style lookup tables for node and edge types.
//!
//! Pure functions from semantic type to presentation keys. Colors are CSS
//! strings; `icon_key` names an icon in the host page's icon set.

use serde::Serialize;

use crate::graph::{EdgeType, MAX_STRENGTH, MIN_STRENGTH, NodeType};

const INK: &str = "#4D4D4D";
const INDIGO: &str = "#2D3A8C";
const SAFFRON: &str = "#F4C95D";
const TEAL: &str = "#2A7F78";
const RUST: &str = "#B4532A";
const SLATE: &str = "#6B7280";
const WHITE: &str = "#FFFFFF";
const DARK: &str = "#1F2937";

/// Presentation keys for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub background: &'static str,
    pub border_color: &'static str,
    pub icon_key: &'static str,
    pub text_color: &'static str,
}

/// Presentation keys for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeStyle {
    pub color: &'static str,
    pub dashed: bool,
}

const fn node(background: &'static str, icon_key: &'static str, text_color: &'static str) -> NodeStyle {
    NodeStyle {
        background,
        border_color: WHITE,
        icon_key,
        text_color,
    }
}

/// Style used for [`NodeType::Other`] and plain concepts.
pub const DEFAULT_NODE_STYLE: NodeStyle = node(INK, "circle", WHITE);

/// Style for a node type.
pub fn style_for_type(node_type: NodeType) -> NodeStyle {
    use NodeType::*;
    match node_type {
        Concept | Other => DEFAULT_NODE_STYLE,
        Person => node(INDIGO, "user", WHITE),
        Organization => node(INDIGO, "building", WHITE),
        Theory => node(INDIGO, "lightbulb", WHITE),
        Principle | Law => node(INDIGO, "scale", WHITE),
        Ideology | Belief | Value => node(INDIGO, "compass", WHITE),
        Work => node(INDIGO, "book", WHITE),
        Event => node(SAFFRON, "calendar", DARK),
        Movement => node(SAFFRON, "flag", DARK),
        Discovery => node(SAFFRON, "search", DARK),
        Invention => node(SAFFRON, "sparkles", DARK),
        Place => node(TEAL, "map-pin", WHITE),
        Culture | Tradition => node(TEAL, "landmark", WHITE),
        Technology | Tool => node(SLATE, "wrench", WHITE),
        Method | Technique | Practice | Process => node(SLATE, "workflow", WHITE),
        System | Structure | Component => node(SLATE, "boxes", WHITE),
        Resource => node(SLATE, "file", WHITE),
        Phenomenon => node(RUST, "zap", WHITE),
    }
}

/// Style for an edge type. Only comparative relations are dashed.
pub fn color_for_edge_type(edge_type: EdgeType) -> EdgeStyle {
    let color = if edge_type.is_causal() {
        RUST
    } else if edge_type.is_containment() {
        INDIGO
    } else if edge_type.is_comparative() {
        SAFFRON
    } else if edge_type == EdgeType::BuildsUpon {
        TEAL
    } else {
        SLATE
    };
    EdgeStyle {
        color,
        dashed: edge_type.is_comparative(),
    }
}

/// Line width for an edge strength; strictly increasing over 1..=5.
pub fn edge_width(strength: i32) -> f32 {
    let strength = strength.clamp(MIN_STRENGTH, MAX_STRENGTH);
    1.0 + 0.5 * strength as f32
}

/// Circle radius for a node importance: `max(8, 4 + 2 * importance)`.
pub fn node_radius(importance: i32) -> f32 {
    (4.0 + 2.0 * importance as f32).max(8.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_node_type_has_style() {
        for node_type in NodeType::ALL {
            let style = style_for_type(node_type);
            assert!(style.background.starts_with('#'));
            assert!(!style.icon_key.is_empty());
        }
        assert_eq!(style_for_type(NodeType::Other), DEFAULT_NODE_STYLE);
    }

    #[test]
    fn test_base_palette() {
        assert_eq!(style_for_type(NodeType::Concept).background, "#4D4D4D");
        assert_eq!(style_for_type(NodeType::Person).background, "#2D3A8C");
        assert_eq!(style_for_type(NodeType::Event).background, "#F4C95D");
    }

    #[test]
    fn test_dashed_only_for_comparative() {
        let dashed: Vec<EdgeType> = EdgeType::ALL
            .into_iter()
            .filter(|&t| color_for_edge_type(t).dashed)
            .collect();
        assert_eq!(
            dashed,
            vec![EdgeType::Critiques, EdgeType::SimilarTo, EdgeType::DifferentFrom]
        );
    }

    #[test]
    fn test_edge_width_monotonic() {
        let widths: Vec<f32> = (1..=5).map(edge_width).collect();
        assert!(widths.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(edge_width(0), edge_width(1));
        assert_eq!(edge_width(9), edge_width(5));
    }

    #[test]
    fn test_node_radius() {
        assert_eq!(node_radius(1), 8.0);
        assert_eq!(node_radius(2), 8.0);
        assert_eq!(node_radius(5), 14.0);
        assert_eq!(node_radius(10), 24.0);
    }
}
