//! Complexity, search and discipline filtering.
//!
//! Filtering is two-staged. The complexity tier first selects nodes by
//! importance and edges by strength. Search and discipline then narrow the
//! node set further, and the tier's edges are cut back to the final nodes so
//! that no rendered edge ever dangles.
//!
//! Search is a case-insensitive substring match over label, description,
//! location and period. Labels also accept a fuzzy match, as long as the
//! needle splits into prefixes of the label's words taken in order: "rome"
//! finds "Roman Empire" (rom + e), while "ge" does not find "Wagner".

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::graph::{GraphEdge, GraphNode, MapGraph};

/// How much of the map to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    /// Only the most important concepts and strongest relations.
    Minimal,
    /// Mid-importance concepts and above.
    #[default]
    Moderate,
    /// Everything.
    Thorough,
}

impl ComplexityTier {
    /// Minimum node importance admitted by this tier (inclusive).
    pub fn min_importance(self) -> i32 {
        match self {
            ComplexityTier::Minimal => 7,
            ComplexityTier::Moderate => 5,
            ComplexityTier::Thorough => i32::MIN,
        }
    }

    /// Whether this tier keeps the given edge, ignoring its endpoints.
    pub fn admits_edge(self, edge: &GraphEdge) -> bool {
        match self {
            ComplexityTier::Minimal => edge.strength() >= 4 || edge.edge_type.is_structural(),
            ComplexityTier::Moderate => edge.strength() >= 2,
            ComplexityTier::Thorough => true,
        }
    }

    /// Whether this tier keeps the given node.
    #[inline]
    pub fn admits_node(self, node: &GraphNode) -> bool {
        node.importance() >= self.min_importance()
    }

    /// The lowercase name of the tier.
    pub fn as_str(self) -> &'static str {
        match self {
            ComplexityTier::Minimal => "minimal",
            ComplexityTier::Moderate => "moderate",
            ComplexityTier::Thorough => "thorough",
        }
    }
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexityTier {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(ComplexityTier::Minimal),
            "moderate" => Ok(ComplexityTier::Moderate),
            "thorough" => Ok(ComplexityTier::Thorough),
            _ => Err(MapError::UnknownTier(s.to_string())),
        }
    }
}

/// The user-controlled filter inputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterParams {
    pub tier: ComplexityTier,
    pub search_term: String,
    pub disciplines: BTreeSet<String>,
}

impl FilterParams {
    /// Filter parameters for a tier with no search or discipline narrowing.
    pub fn for_tier(tier: ComplexityTier) -> Self {
        Self {
            tier,
            ..Default::default()
        }
    }

    /// Builder: set the search term.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Builder: add a discipline to the filter set.
    pub fn with_discipline(mut self, discipline: impl Into<String>) -> Self {
        self.disciplines.insert(discipline.into());
        self
    }
}

/// The visible subset of a map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilteredGraph {
    /// Visible nodes, in map order.
    pub nodes: Vec<GraphNode>,
    /// Visible edges, in map order. Both endpoints are always in `nodes`.
    pub edges: Vec<GraphEdge>,
    /// Node count of the unfiltered map.
    pub total_nodes: usize,
}

impl FilteredGraph {
    /// Whether a node id is visible.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Search needle plus the fuzzy matcher used for labels.
struct SearchQuery {
    needle: String,
    matcher: SkimMatcherV2,
}

impl SearchQuery {
    /// Build a query, or `None` when the term is blank.
    fn new(term: &str) -> Option<Self> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        Some(Self {
            needle,
            matcher: SkimMatcherV2::default(),
        })
    }

    fn contains(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.needle)
    }

    /// Fuzzy label match anchored at word starts.
    fn fuzzy_label(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.matcher.fuzzy_match(&label, &self.needle).is_some()
            && spelled_by_word_prefixes(&self.needle, &label)
    }

    /// Whether the node matches on any searchable field.
    fn matches(&self, node: &GraphNode) -> bool {
        self.contains(&node.label)
            || self.fuzzy_label(&node.label)
            || self.contains(&node.description)
            || node.location.as_deref().is_some_and(|text| self.contains(text))
            || node.period.as_deref().is_some_and(|text| self.contains(text))
    }
}

/// Whether `needle` (whitespace ignored) is a concatenation of non-empty
/// prefixes of some of `text`'s words, in word order.
fn spelled_by_word_prefixes(needle: &str, text: &str) -> bool {
    let needle: Vec<char> = needle.chars().filter(|c| !c.is_whitespace()).collect();
    if needle.is_empty() {
        return false;
    }

    // reachable[p]: needle[..p] is spelled by the words seen so far.
    let mut reachable = vec![false; needle.len() + 1];
    reachable[0] = true;
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let word: Vec<char> = word.chars().collect();
        let mut next = reachable.clone();
        for start in (0..needle.len()).filter(|&p| reachable[p]) {
            let shared = word
                .iter()
                .zip(&needle[start..])
                .take_while(|(a, b)| a == b)
                .count();
            for end in start + 1..=start + shared {
                next[end] = true;
            }
        }
        reachable = next;
        if reachable[needle.len()] {
            return true;
        }
    }
    false
}

/// Derive the visible nodes and edges of `graph`.
///
/// Never fails; an empty result is a valid outcome.
pub fn filter(graph: &MapGraph, params: &FilterParams) -> FilteredGraph {
    // Stage 1: tier.
    let tier_nodes: Vec<&GraphNode> = graph
        .nodes
        .iter()
        .filter(|node| params.tier.admits_node(node))
        .collect();

    let tier_ids: HashSet<&str> = tier_nodes.iter().map(|node| node.id.as_str()).collect();
    let tier_edges: Vec<&GraphEdge> = graph
        .edges
        .iter()
        .filter(|edge| {
            tier_ids.contains(edge.source.as_str()) && tier_ids.contains(edge.target.as_str())
        })
        .filter(|edge| params.tier.admits_edge(edge))
        .collect();

    // Stage 2: content.
    let query = SearchQuery::new(&params.search_term);
    let nodes: Vec<GraphNode> = tier_nodes
        .into_iter()
        .filter(|node| query.as_ref().is_none_or(|query| query.matches(node)))
        .filter(|node| {
            params.disciplines.is_empty() || params.disciplines.contains(&node.discipline)
        })
        .cloned()
        .collect();

    let visible: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let edges: Vec<GraphEdge> = tier_edges
        .into_iter()
        .filter(|edge| {
            visible.contains(edge.source.as_str()) && visible.contains(edge.target.as_str())
        })
        .cloned()
        .collect();

    FilteredGraph {
        nodes,
        edges,
        total_nodes: graph.node_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeType;
    use pretty_assertions::assert_eq;

    fn ids(filtered: &FilteredGraph) -> Vec<&str> {
        filtered.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn edge_ids(filtered: &FilteredGraph) -> Vec<&str> {
        filtered.edges.iter().map(|e| e.id.as_str()).collect()
    }

    fn abc_graph() -> MapGraph {
        MapGraph::new(
            vec![
                GraphNode::new("A", "Alpha").with_importance(8),
                GraphNode::new("B", "Beta").with_importance(5),
                GraphNode::new("C", "Gamma").with_importance(3),
            ],
            vec![
                GraphEdge::new("AB", "A", "B").with_strength(3),
                GraphEdge::new("BC", "B", "C").with_strength(1),
            ],
        )
    }

    #[test]
    fn test_minimal_tier() {
        let result = filter(&abc_graph(), &FilterParams::for_tier(ComplexityTier::Minimal));
        assert_eq!(ids(&result), vec!["A"]);
        assert!(result.edges.is_empty());
        assert_eq!(result.total_nodes, 3);
    }

    #[test]
    fn test_moderate_tier() {
        let result = filter(&abc_graph(), &FilterParams::for_tier(ComplexityTier::Moderate));
        assert_eq!(ids(&result), vec!["A", "B"]);
        assert_eq!(edge_ids(&result), vec!["AB"]);
    }

    #[test]
    fn test_thorough_tier_keeps_everything() {
        let result = filter(&abc_graph(), &FilterParams::for_tier(ComplexityTier::Thorough));
        assert_eq!(ids(&result), vec!["A", "B", "C"]);
        assert_eq!(edge_ids(&result), vec!["AB", "BC"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("x", "X").with_importance(7),
                GraphNode::new("y", "Y").with_importance(7),
                GraphNode::new("z", "Z").with_importance(6),
            ],
            Vec::new(),
        );
        let result = filter(&graph, &FilterParams::for_tier(ComplexityTier::Minimal));
        assert_eq!(ids(&result), vec!["x", "y"]);
    }

    #[test]
    fn test_minimal_keeps_structural_weak_edges() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("a", "A").with_importance(9),
                GraphNode::new("b", "B").with_importance(9),
            ],
            vec![
                GraphEdge::new("weak", "a", "b").with_strength(1),
                GraphEdge::new("part", "a", "b")
                    .with_strength(1)
                    .with_type(EdgeType::PartOf),
                GraphEdge::new("builds", "b", "a")
                    .with_strength(2)
                    .with_type(EdgeType::BuildsUpon),
                GraphEdge::new("strong", "b", "a").with_strength(4),
            ],
        );
        let result = filter(&graph, &FilterParams::for_tier(ComplexityTier::Minimal));
        assert_eq!(edge_ids(&result), vec!["part", "builds", "strong"]);
    }

    #[test]
    fn test_missing_strength_is_weakest() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("a", "A").with_importance(9),
                GraphNode::new("b", "B").with_importance(9),
            ],
            vec![GraphEdge::new("e", "a", "b")],
        );
        assert!(filter(&graph, &FilterParams::for_tier(ComplexityTier::Moderate)).edges.is_empty());
        assert_eq!(
            filter(&graph, &FilterParams::for_tier(ComplexityTier::Thorough)).edges.len(),
            1
        );
    }

    #[test]
    fn test_search_case_insensitive() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("r", "Roman Empire"),
                GraphNode::new("g", "Greece"),
            ],
            Vec::new(),
        );
        let params = FilterParams::for_tier(ComplexityTier::Thorough).with_search("rome");
        assert_eq!(ids(&filter(&graph, &params)), vec!["r"]);

        let params = FilterParams::for_tier(ComplexityTier::Thorough).with_search("ROMAN");
        assert_eq!(ids(&filter(&graph, &params)), vec!["r"]);
    }

    #[test]
    fn test_search_matches_secondary_fields() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("a", "Aqueduct").with_location("Rome"),
                GraphNode::new("b", "Stoicism").with_period("Hellenistic"),
                GraphNode::new("c", "Forum").with_description("Public square of ancient Rome"),
                GraphNode::new("d", "Parthenon").with_location("Athens"),
            ],
            Vec::new(),
        );
        let params = FilterParams::for_tier(ComplexityTier::Thorough).with_search("  rome ");
        assert_eq!(ids(&filter(&graph, &params)), vec!["a", "c"]);

        let params = FilterParams::for_tier(ComplexityTier::Thorough).with_search("hellen");
        assert_eq!(ids(&filter(&graph, &params)), vec!["b"]);
    }

    #[test]
    fn test_fuzzy_applies_to_labels_only() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("a", "Tiber").with_description("r o m e scattered"),
                GraphNode::new("b", "Rhetoric of Menander"),
            ],
            Vec::new(),
        );
        let params = FilterParams::for_tier(ComplexityTier::Thorough).with_search("rome");
        assert_eq!(ids(&filter(&graph, &params)), vec!["b"]);
    }

    #[test]
    fn test_fuzzy_needs_word_starts() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("w", "Wagner"),
                GraphNode::new("g", "Greece"),
                GraphNode::new("a", "Aristotle"),
                GraphNode::new("r", "Roman Republic"),
                GraphNode::new("e", "Roman Empire"),
            ],
            Vec::new(),
        );
        let search = |term: &str| {
            let params = FilterParams::for_tier(ComplexityTier::Thorough).with_search(term);
            ids(&filter(&graph, &params))
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        assert!(search("ge").is_empty());
        assert!(search("art").is_empty());
        assert_eq!(search("rome"), vec!["e"]);
        assert_eq!(search("rorep"), vec!["r"]);
        assert_eq!(search("wag"), vec!["w"]);
    }

    #[test]
    fn test_word_prefix_spelling() {
        assert!(spelled_by_word_prefixes("rome", "roman empire"));
        assert!(spelled_by_word_prefixes("ro em", "roman empire"));
        assert!(spelled_by_word_prefixes("me", "rhetoric of menander"));
        assert!(!spelled_by_word_prefixes("ge", "wagner"));
        assert!(!spelled_by_word_prefixes("em ro", "roman empire"));
        assert!(!spelled_by_word_prefixes("   ", "roman empire"));
    }

    #[test]
    fn test_blank_search_is_noop() {
        let params = FilterParams::for_tier(ComplexityTier::Thorough).with_search("   ");
        assert_eq!(filter(&abc_graph(), &params).nodes.len(), 3);
    }

    #[test]
    fn test_discipline_filter_and_edge_refilter() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("a", "A").with_discipline("Physics"),
                GraphNode::new("b", "B").with_discipline("History"),
                GraphNode::new("c", "C").with_discipline("Physics"),
            ],
            vec![
                GraphEdge::new("ab", "a", "b").with_strength(5),
                GraphEdge::new("ac", "a", "c").with_strength(5),
            ],
        );
        let params = FilterParams::for_tier(ComplexityTier::Thorough).with_discipline("Physics");
        let result = filter(&graph, &params);
        assert_eq!(ids(&result), vec!["a", "c"]);
        assert_eq!(edge_ids(&result), vec!["ac"]);
    }

    #[test]
    fn test_search_and_discipline_are_anded() {
        let graph = MapGraph::new(
            vec![
                GraphNode::new("a", "Newton").with_discipline("Physics"),
                GraphNode::new("b", "Newton's era").with_discipline("History"),
            ],
            Vec::new(),
        );
        let params = FilterParams::for_tier(ComplexityTier::Thorough)
            .with_search("newton")
            .with_discipline("History");
        assert_eq!(ids(&filter(&graph, &params)), vec!["b"]);
    }

    #[test]
    fn test_dangling_edges_dropped() {
        let graph = MapGraph::new(
            vec![GraphNode::new("a", "A")],
            vec![GraphEdge::new("ghost", "a", "missing").with_strength(5)],
        );
        assert!(filter(&graph, &FilterParams::for_tier(ComplexityTier::Thorough)).edges.is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let result = filter(&MapGraph::default(), &FilterParams::default());
        assert!(result.is_empty());
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("Minimal".parse::<ComplexityTier>(), Ok(ComplexityTier::Minimal));
        assert_eq!(" thorough ".parse::<ComplexityTier>(), Ok(ComplexityTier::Thorough));
        assert!(matches!(
            "extreme".parse::<ComplexityTier>(),
            Err(MapError::UnknownTier(_))
        ));
    }
}
