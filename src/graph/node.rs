//! Node type and related structures.
//!
//! Nodes are the concepts of a map. Each node has:
//! - A string identifier, unique within a map
//! - A semantic [`NodeType`] used for style lookup
//! - An importance score (1-10) driving size, repulsion and tier filtering
//! - Optional historical context (year, period, location) and resources

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Importance assumed when the payload omits it.
pub const DEFAULT_IMPORTANCE: i32 = 5;

/// Lowest importance a node can report.
pub const MIN_IMPORTANCE: i32 = 1;

/// Highest importance a node can report.
pub const MAX_IMPORTANCE: i32 = 10;

/// Semantic category of a node.
///
/// Unrecognized categories deserialize to [`NodeType::Other`] so that a new
/// category from the generator never rejects a whole map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Concept,
    Person,
    Event,
    Theory,
    Work,
    Movement,
    Place,
    Organization,
    Technology,
    Discovery,
    Invention,
    Method,
    Principle,
    Law,
    Phenomenon,
    Process,
    System,
    Structure,
    Component,
    Resource,
    Tool,
    Technique,
    Practice,
    Tradition,
    Culture,
    Ideology,
    Belief,
    Value,
    #[serde(other)]
    Other,
}

impl NodeType {
    /// Every known category, in declaration order.
    pub const ALL: [NodeType; 29] = [
        NodeType::Concept,
        NodeType::Person,
        NodeType::Event,
        NodeType::Theory,
        NodeType::Work,
        NodeType::Movement,
        NodeType::Place,
        NodeType::Organization,
        NodeType::Technology,
        NodeType::Discovery,
        NodeType::Invention,
        NodeType::Method,
        NodeType::Principle,
        NodeType::Law,
        NodeType::Phenomenon,
        NodeType::Process,
        NodeType::System,
        NodeType::Structure,
        NodeType::Component,
        NodeType::Resource,
        NodeType::Tool,
        NodeType::Technique,
        NodeType::Practice,
        NodeType::Tradition,
        NodeType::Culture,
        NodeType::Ideology,
        NodeType::Belief,
        NodeType::Value,
        NodeType::Other,
    ];

    /// The snake_case wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Concept => "concept",
            NodeType::Person => "person",
            NodeType::Event => "event",
            NodeType::Theory => "theory",
            NodeType::Work => "work",
            NodeType::Movement => "movement",
            NodeType::Place => "place",
            NodeType::Organization => "organization",
            NodeType::Technology => "technology",
            NodeType::Discovery => "discovery",
            NodeType::Invention => "invention",
            NodeType::Method => "method",
            NodeType::Principle => "principle",
            NodeType::Law => "law",
            NodeType::Phenomenon => "phenomenon",
            NodeType::Process => "process",
            NodeType::System => "system",
            NodeType::Structure => "structure",
            NodeType::Component => "component",
            NodeType::Resource => "resource",
            NodeType::Tool => "tool",
            NodeType::Technique => "technique",
            NodeType::Practice => "practice",
            NodeType::Tradition => "tradition",
            NodeType::Culture => "culture",
            NodeType::Ideology => "ideology",
            NodeType::Belief => "belief",
            NodeType::Value => "value",
            NodeType::Other => "other",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Further reading attached to a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub description: String,
}

/// Coarse importance band shown in the node detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceTier {
    /// Importance 8 and above.
    Critical,
    /// Importance 6-7.
    Major,
    /// Importance 4-5.
    Significant,
    /// Everything below 4.
    Supporting,
}

impl ImportanceTier {
    /// Human readable label for the band.
    pub fn label(self) -> &'static str {
        match self {
            ImportanceTier::Critical => "Critical element",
            ImportanceTier::Major => "Major element",
            ImportanceTier::Significant => "Significant element",
            ImportanceTier::Supporting => "Supporting element",
        }
    }
}

/// A concept in the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub description: String,
    /// Raw importance as supplied. Read it through [`GraphNode::importance`].
    #[serde(default = "default_importance")]
    pub importance: i32,
    #[serde(default)]
    pub discipline: String,
    #[serde(default, deserialize_with = "deserialize_year", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

fn default_importance() -> i32 {
    DEFAULT_IMPORTANCE
}

/// Years arrive either as free text ("509 BC") or as bare numbers.
fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Year>::deserialize(deserializer)?.map(|year| match year {
        Year::Text(text) => text,
        Year::Int(value) => value.to_string(),
        Year::Float(value) => value.to_string(),
    }))
}

impl GraphNode {
    /// Create a node with the given id and label and default attributes.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type: NodeType::default(),
            description: String::new(),
            importance: DEFAULT_IMPORTANCE,
            discipline: String::new(),
            year: None,
            period: None,
            location: None,
            resources: Vec::new(),
        }
    }

    /// Builder: set importance.
    pub fn with_importance(mut self, importance: i32) -> Self {
        self.importance = importance;
        self
    }

    /// Builder: set the semantic type.
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    /// Builder: set discipline.
    pub fn with_discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = discipline.into();
        self
    }

    /// Builder: set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder: set period.
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    /// Importance clamped to [1, 10].
    #[inline]
    pub fn importance(&self) -> i32 {
        self.importance.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE)
    }

    /// Importance band for the detail panel.
    pub fn importance_tier(&self) -> ImportanceTier {
        match self.importance() {
            i if i >= 8 => ImportanceTier::Critical,
            6 | 7 => ImportanceTier::Major,
            4 | 5 => ImportanceTier::Significant,
            _ => ImportanceTier::Supporting,
        }
    }
}
