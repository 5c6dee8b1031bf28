//! Edge type and related structures.
//!
//! Edges are the relationships between concepts. Each edge has:
//! - A string identifier
//! - Source and target node ids
//! - A semantic [`EdgeType`] that shapes link distance and styling
//! - An optional strength (1-5) used by tier filtering and line weight

use std::fmt;

use serde::{Deserialize, Serialize};

/// Strength assumed when the payload omits it (the weakest relation).
pub const DEFAULT_STRENGTH: i32 = 1;

/// Lowest strength an edge can report.
pub const MIN_STRENGTH: i32 = 1;

/// Highest strength an edge can report.
pub const MAX_STRENGTH: i32 = 5;

/// Relationship category of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    #[default]
    Influences,
    Critiques,
    BuildsUpon,
    Causes,
    PartOf,
    Contains,
    LeadsTo,
    SimilarTo,
    DifferentFrom,
    Opposes,
    Supports,
    Extends,
    Refutes,
    Inspires,
    Precedes,
    Follows,
    DerivedFrom,
    InstanceOf,
    TypeOf,
    Uses,
    Produces,
    Created,
    Discovered,
    Invented,
    Developed,
    Founded,
    Studied,
    TaughtBy,
    ContemporaryOf,
    LocatedIn,
    OccurredIn,
    AppliesTo,
    Enables,
    Requires,
    RelatedTo,
    #[serde(other)]
    Other,
}

impl EdgeType {
    /// Every known category, in declaration order.
    pub const ALL: [EdgeType; 36] = [
        EdgeType::Influences,
        EdgeType::Critiques,
        EdgeType::BuildsUpon,
        EdgeType::Causes,
        EdgeType::PartOf,
        EdgeType::Contains,
        EdgeType::LeadsTo,
        EdgeType::SimilarTo,
        EdgeType::DifferentFrom,
        EdgeType::Opposes,
        EdgeType::Supports,
        EdgeType::Extends,
        EdgeType::Refutes,
        EdgeType::Inspires,
        EdgeType::Precedes,
        EdgeType::Follows,
        EdgeType::DerivedFrom,
        EdgeType::InstanceOf,
        EdgeType::TypeOf,
        EdgeType::Uses,
        EdgeType::Produces,
        EdgeType::Created,
        EdgeType::Discovered,
        EdgeType::Invented,
        EdgeType::Developed,
        EdgeType::Founded,
        EdgeType::Studied,
        EdgeType::TaughtBy,
        EdgeType::ContemporaryOf,
        EdgeType::LocatedIn,
        EdgeType::OccurredIn,
        EdgeType::AppliesTo,
        EdgeType::Enables,
        EdgeType::Requires,
        EdgeType::RelatedTo,
        EdgeType::Other,
    ];

    /// The snake_case wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::Influences => "influences",
            EdgeType::Critiques => "critiques",
            EdgeType::BuildsUpon => "builds_upon",
            EdgeType::Causes => "causes",
            EdgeType::PartOf => "part_of",
            EdgeType::Contains => "contains",
            EdgeType::LeadsTo => "leads_to",
            EdgeType::SimilarTo => "similar_to",
            EdgeType::DifferentFrom => "different_from",
            EdgeType::Opposes => "opposes",
            EdgeType::Supports => "supports",
            EdgeType::Extends => "extends",
            EdgeType::Refutes => "refutes",
            EdgeType::Inspires => "inspires",
            EdgeType::Precedes => "precedes",
            EdgeType::Follows => "follows",
            EdgeType::DerivedFrom => "derived_from",
            EdgeType::InstanceOf => "instance_of",
            EdgeType::TypeOf => "type_of",
            EdgeType::Uses => "uses",
            EdgeType::Produces => "produces",
            EdgeType::Created => "created",
            EdgeType::Discovered => "discovered",
            EdgeType::Invented => "invented",
            EdgeType::Developed => "developed",
            EdgeType::Founded => "founded",
            EdgeType::Studied => "studied",
            EdgeType::TaughtBy => "taught_by",
            EdgeType::ContemporaryOf => "contemporary_of",
            EdgeType::LocatedIn => "located_in",
            EdgeType::OccurredIn => "occurred_in",
            EdgeType::AppliesTo => "applies_to",
            EdgeType::Enables => "enables",
            EdgeType::Requires => "requires",
            EdgeType::RelatedTo => "related_to",
            EdgeType::Other => "other",
        }
    }

    /// Containment-like relations that pull their endpoints closer together.
    #[inline]
    pub fn is_containment(self) -> bool {
        matches!(self, EdgeType::PartOf | EdgeType::Contains)
    }

    /// Causal or influence relations that keep their endpoints further apart.
    #[inline]
    pub fn is_causal(self) -> bool {
        matches!(self, EdgeType::Influences | EdgeType::Causes | EdgeType::LeadsTo)
    }

    /// Comparative relations, drawn dashed.
    #[inline]
    pub fn is_comparative(self) -> bool {
        matches!(
            self,
            EdgeType::Critiques | EdgeType::SimilarTo | EdgeType::DifferentFrom
        )
    }

    /// Structural relations kept at the minimal tier regardless of strength.
    #[inline]
    pub fn is_structural(self) -> bool {
        matches!(self, EdgeType::BuildsUpon | EdgeType::PartOf)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relationship between two concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    /// Raw strength as supplied. Read it through [`GraphEdge::strength`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<i32>,
}

impl GraphEdge {
    /// Create an edge between two node ids.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: String::new(),
            edge_type: EdgeType::default(),
            strength: None,
        }
    }

    /// Builder: set strength.
    pub fn with_strength(mut self, strength: i32) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Builder: set the relationship type.
    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    /// Builder: set label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Strength clamped to [1, 5], [`DEFAULT_STRENGTH`] when absent.
    #[inline]
    pub fn strength(&self) -> i32 {
        self.strength
            .unwrap_or(DEFAULT_STRENGTH)
            .clamp(MIN_STRENGTH, MAX_STRENGTH)
    }

    /// Whether the edge touches the given node id.
    #[inline]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// The endpoint opposite to `node_id`, if the edge touches it.
    pub fn opposite(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}
