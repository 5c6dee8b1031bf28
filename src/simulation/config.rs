//! Force constants for the layout simulation.

use serde::{Deserialize, Serialize};

use crate::graph::EdgeType;

/// Tunables for [`Simulation`](super::Simulation).
///
/// Every field has a default, so a partial JSON object overrides only what
/// it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // -- cooling --
    /// Alpha at the start of a run.
    pub alpha_start: f32,
    /// The run cools once alpha drops below this.
    pub alpha_min: f32,
    /// Fraction of the gap to `alpha_target` closed each tick.
    pub alpha_decay: f32,
    /// Fraction of velocity lost each tick.
    pub velocity_decay: f32,
    /// Upper bound on ticks per run. Reset by a reheat.
    pub max_ticks: u32,

    // -- initial placement --
    /// Half-width of the square around the center new nodes are dropped in.
    pub initial_spread: f32,

    // -- link --
    /// Rest length of a plain link.
    pub link_distance: f32,
    /// Link stiffness.
    pub link_strength: f32,
    /// Rest-length factor for containment relations (part_of, contains).
    pub containment_distance_factor: f32,
    /// Rest-length factor for causal relations (influences, causes, leads_to).
    pub causal_distance_factor: f32,

    // -- charge --
    /// Base repulsion; scaled per node by `1 + importance / 10`.
    pub charge_strength: f32,
    /// Distances below this are treated as this, so close pairs stay finite.
    pub charge_distance_min: f32,

    // -- center --
    pub center_strength: f32,

    // -- collision --
    pub collide_base_radius: f32,
    pub collide_radius_per_importance: f32,
    pub collide_strength: f32,

    // -- radial / axis --
    pub radial_strength: f32,
    /// Radius of the ring the radial force pulls toward.
    pub radial_radius: f32,
    pub axis_strength: f32,
    /// Pull toward tidy-tree targets in tree layout mode.
    pub tree_target_strength: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha_start: 1.0,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001f32.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            max_ticks: 3000,
            initial_spread: 200.0,
            link_distance: 300.0,
            link_strength: 0.3,
            containment_distance_factor: 0.7,
            causal_distance_factor: 1.2,
            charge_strength: -2000.0,
            charge_distance_min: 1.0,
            center_strength: 0.05,
            collide_base_radius: 120.0,
            collide_radius_per_importance: 8.0,
            collide_strength: 1.0,
            radial_strength: 0.02,
            radial_radius: 350.0,
            axis_strength: 0.02,
            tree_target_strength: 0.3,
        }
    }
}

impl SimulationConfig {
    /// Rest length for a link of the given relation type.
    pub fn link_distance_for(&self, edge_type: EdgeType) -> f32 {
        if edge_type.is_containment() {
            self.link_distance * self.containment_distance_factor
        } else if edge_type.is_causal() {
            self.link_distance * self.causal_distance_factor
        } else {
            self.link_distance
        }
    }

    /// Repulsion strength for a node of the given importance.
    pub fn charge_for(&self, importance: i32) -> f32 {
        self.charge_strength * (1.0 + importance as f32 / 10.0)
    }

    /// Collision radius for a node of the given importance.
    pub fn collide_radius_for(&self, importance: i32) -> f32 {
        self.collide_base_radius + self.collide_radius_per_importance * importance as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert!((config.alpha_decay - 0.0228).abs() < 0.0005);
        assert_eq!(config.max_ticks, 3000);
    }

    #[test]
    fn test_link_distance_by_type() {
        let config = SimulationConfig::default();
        assert!((config.link_distance_for(EdgeType::PartOf) - 210.0).abs() < 0.01);
        assert!((config.link_distance_for(EdgeType::Contains) - 210.0).abs() < 0.01);
        assert!((config.link_distance_for(EdgeType::Causes) - 360.0).abs() < 0.01);
        assert!((config.link_distance_for(EdgeType::Critiques) - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_importance_scaling() {
        let config = SimulationConfig::default();
        assert!((config.charge_for(10) - -4000.0).abs() < 0.01);
        assert!((config.charge_for(5) - -3000.0).abs() < 0.01);
        assert!((config.collide_radius_for(5) - 160.0).abs() < 0.01);
    }

    #[test]
    fn test_partial_json() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"link_distance": 100.0, "max_ticks": 50}"#).unwrap();
        assert_eq!(config.link_distance, 100.0);
        assert_eq!(config.max_ticks, 50);
        assert_eq!(config.charge_strength, -2000.0);
    }
}
