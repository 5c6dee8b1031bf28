//! Force-directed layout simulation.
//!
//! Positions and velocities live in SoA buffers indexed by slot; slot `i`
//! is the `i`-th distinct node id handed to [`Simulation::new`]. Each
//! [`tick`](Simulation::tick) runs one iteration:
//!
//! 1. Alpha moves toward `alpha_target` by `alpha_decay`.
//! 2. Forces accumulate velocity: link, charge, center, collision, then
//!    radial and axis (force mode) or tree targets (tree mode).
//! 3. Pinned nodes snap to their pin with zero velocity; free nodes keep
//!    `1 - velocity_decay` of their velocity and move by it.
//!
//! A run cools once alpha falls below `alpha_min` or `max_ticks` is reached.
//! A [`reheat`](Simulation::reheat) restarts a cooled run; a
//! [`stop`](Simulation::stop)ped simulation never moves again.

mod config;
mod forces;

pub use config::SimulationConfig;
pub use forces::{Bodies, Link};

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::graph::{GraphEdge, GraphNode};
use crate::layout::TidyTreeResult;
use crate::spatial::SpatialIndex;

/// Result of a single [`Simulation::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickOutcome {
    /// The simulation moved and wants another tick.
    Running,
    /// Alpha has settled (or the tick cap was hit); nothing moves until a
    /// reheat.
    Cooled,
    /// Torn down; nothing moves ever again.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Cooled,
    Stopped,
}

/// Where the positioning forces pull toward.
#[derive(Debug, Clone)]
enum Anchor {
    /// Radial ring and x/y axes through the canvas center.
    Center,
    /// Per-slot tidy-tree targets.
    Tree(Vec<[f32; 2]>),
}

/// The force layout engine for one filtered node set.
///
/// Recreated from scratch whenever the visible nodes change.
#[derive(Debug)]
pub struct Simulation {
    /// Node id per slot.
    ids: Vec<String>,
    /// Map from node id to slot.
    slot_by_id: HashMap<String, usize>,

    /// Positions and velocities (SoA layout).
    bodies: Bodies,
    /// Pinned position per slot.
    pins: Vec<Option<(f32, f32)>>,

    links: Vec<Link>,
    charges: Vec<f32>,
    radii: Vec<f32>,
    anchor: Anchor,

    center: (f32, f32),
    config: SimulationConfig,
    rng: StdRng,

    alpha: f32,
    alpha_target: f32,
    ticks: u32,
    state: RunState,
}

impl Simulation {
    /// Build a simulation over `nodes` and `edges` on a `width` by `height`
    /// canvas.
    ///
    /// Nodes start at uniformly random positions within `initial_spread` of
    /// the canvas center, drawn from a generator seeded with `seed`. Repeated
    /// node ids keep their first occurrence; edges with a missing endpoint
    /// and self-loops are skipped.
    pub fn new(
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        width: f32,
        height: f32,
        config: &SimulationConfig,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let center = (width / 2.0, height / 2.0);
        let spread = config.initial_spread.abs();

        let mut ids = Vec::with_capacity(nodes.len());
        let mut slot_by_id = HashMap::with_capacity(nodes.len());
        let mut bodies = Bodies::with_capacity(nodes.len());
        let mut charges = Vec::with_capacity(nodes.len());
        let mut radii = Vec::with_capacity(nodes.len());

        for node in nodes {
            if slot_by_id.contains_key(&node.id) {
                continue;
            }
            slot_by_id.insert(node.id.clone(), ids.len());
            ids.push(node.id.clone());

            let (dx, dy) = if spread > 0.0 {
                (rng.gen_range(-spread..=spread), rng.gen_range(-spread..=spread))
            } else {
                (0.0, 0.0)
            };
            bodies.push(center.0 + dx, center.1 + dy);

            let importance = node.importance();
            charges.push(config.charge_for(importance));
            radii.push(config.collide_radius_for(importance));
        }

        let mut resolved = Vec::with_capacity(edges.len());
        let mut link_count = vec![0u32; ids.len()];
        for edge in edges {
            let (Some(&source), Some(&target)) =
                (slot_by_id.get(&edge.source), slot_by_id.get(&edge.target))
            else {
                continue;
            };
            if source == target {
                continue;
            }
            link_count[source] += 1;
            link_count[target] += 1;
            resolved.push((source, target, config.link_distance_for(edge.edge_type)));
        }

        let links = resolved
            .into_iter()
            .map(|(source, target, distance)| {
                let (cs, ct) = (link_count[source] as f32, link_count[target] as f32);
                Link {
                    source,
                    target,
                    distance,
                    strength: config.link_strength,
                    bias: cs / (cs + ct),
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "simulation created: nodes={} links={} seed={seed}",
            ids.len(),
            links.len()
        );

        let state = if ids.is_empty() {
            RunState::Cooled
        } else {
            RunState::Running
        };
        let pins = vec![None; ids.len()];

        Self {
            ids,
            slot_by_id,
            bodies,
            pins,
            links,
            charges,
            radii,
            anchor: Anchor::Center,
            center,
            config: config.clone(),
            rng,
            alpha: config.alpha_start,
            alpha_target: 0.0,
            ticks: 0,
            state,
        }
    }

    /// Pull nodes toward tidy-tree targets instead of the canvas center.
    ///
    /// Nodes without a target in `targets` are pulled toward the center.
    pub fn with_tree_targets(mut self, targets: &TidyTreeResult) -> Self {
        let per_slot: Vec<[f32; 2]> = self
            .ids
            .iter()
            .map(|id| {
                targets
                    .get(id)
                    .unwrap_or([self.center.0, self.center.1])
            })
            .collect();
        self.anchor = Anchor::Tree(per_slot);
        self
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance one iteration.
    pub fn tick(&mut self) -> TickOutcome {
        match self.state {
            RunState::Stopped => return TickOutcome::Stopped,
            RunState::Cooled => return TickOutcome::Cooled,
            RunState::Running => {}
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.apply_forces();
        self.integrate();
        self.ticks += 1;

        // A held pin means a drag in progress; the cap only ends free runs.
        let capped = self.ticks >= self.config.max_ticks && !self.any_pinned();
        if self.alpha < self.config.alpha_min || capped {
            self.state = RunState::Cooled;
            log::debug!(
                "simulation cooled after {} ticks (alpha={:.4})",
                self.ticks,
                self.alpha
            );
            return TickOutcome::Cooled;
        }
        TickOutcome::Running
    }

    /// Tick until the run cools or stops, returning the number of ticks taken.
    pub fn run_to_rest(&mut self) -> u32 {
        let mut count = 0;
        while self.tick() == TickOutcome::Running {
            count += 1;
        }
        count
    }

    fn apply_forces(&mut self) {
        let alpha = self.alpha;
        let config = &self.config;
        let (cx, cy) = self.center;

        forces::apply_links(&mut self.bodies, &self.links, alpha, &mut self.rng);
        forces::apply_charge(
            &mut self.bodies,
            &self.charges,
            config.charge_distance_min,
            alpha,
            &mut self.rng,
        );
        forces::apply_center(&mut self.bodies, cx, cy, config.center_strength);
        forces::apply_collide(
            &mut self.bodies,
            &self.radii,
            config.collide_strength,
            &mut self.rng,
        );

        match &self.anchor {
            Anchor::Center => {
                forces::apply_radial(
                    &mut self.bodies,
                    cx,
                    cy,
                    config.radial_radius,
                    config.radial_strength,
                    alpha,
                );
                let targets = vec![[cx, cy]; self.bodies.len()];
                forces::apply_axes(&mut self.bodies, &targets, config.axis_strength, alpha);
            }
            Anchor::Tree(targets) => {
                forces::apply_axes(
                    &mut self.bodies,
                    targets,
                    config.tree_target_strength,
                    alpha,
                );
            }
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.config.velocity_decay;
        let bodies = &mut self.bodies;
        for (i, pin) in self.pins.iter().enumerate() {
            match *pin {
                Some((px, py)) => {
                    bodies.x[i] = px;
                    bodies.y[i] = py;
                    bodies.vx[i] = 0.0;
                    bodies.vy[i] = 0.0;
                }
                None => {
                    bodies.vx[i] *= keep;
                    bodies.vy[i] *= keep;
                    bodies.x[i] += bodies.vx[i];
                    bodies.y[i] += bodies.vy[i];
                }
            }
        }
    }

    // =========================================================================
    // Run control
    // =========================================================================

    /// Set the alpha target and wake a cooled run.
    ///
    /// Alpha eases toward the target from wherever it is; the tick cap starts
    /// over. Has no effect on a stopped simulation.
    pub fn reheat(&mut self, alpha_target: f32) {
        if self.state == RunState::Stopped {
            return;
        }
        self.alpha_target = alpha_target;
        self.ticks = 0;
        if self.state == RunState::Cooled && !self.ids.is_empty() {
            log::debug!("simulation reheated (alpha_target={alpha_target})");
            self.state = RunState::Running;
        }
    }

    /// Set the alpha target without waking a cooled run.
    pub fn set_alpha_target(&mut self, alpha_target: f32) {
        self.alpha_target = alpha_target;
    }

    /// Tear the run down. Every later tick returns [`TickOutcome::Stopped`].
    pub fn stop(&mut self) {
        if self.state != RunState::Stopped {
            log::debug!("simulation stopped after {} ticks", self.ticks);
            self.state = RunState::Stopped;
        }
    }

    /// Whether the next tick would move anything.
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.state == RunState::Stopped
    }

    /// Current alpha.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Current alpha target.
    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    /// Ticks since the run started or was last reheated.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    // =========================================================================
    // Pins
    // =========================================================================

    /// Fix a node at `(x, y)`. The node moves there immediately.
    ///
    /// Returns false for an unknown id.
    pub fn pin(&mut self, id: &str, x: f32, y: f32) -> bool {
        let Some(&slot) = self.slot_by_id.get(id) else {
            return false;
        };
        self.pins[slot] = Some((x, y));
        self.bodies.x[slot] = x;
        self.bodies.y[slot] = y;
        self.bodies.vx[slot] = 0.0;
        self.bodies.vy[slot] = 0.0;
        true
    }

    /// Release a pinned node. Returns false for an unknown id.
    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(&slot) = self.slot_by_id.get(id) else {
            return false;
        };
        self.pins[slot] = None;
        true
    }

    fn any_pinned(&self) -> bool {
        self.pins.iter().any(Option::is_some)
    }

    /// Check if a node is pinned.
    pub fn is_pinned(&self, id: &str) -> bool {
        self.slot_by_id
            .get(id)
            .is_some_and(|&slot| self.pins[slot].is_some())
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Node ids in slot order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Slot of a node id.
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.slot_by_id.get(id).copied()
    }

    /// Current position of a node.
    pub fn position(&self, id: &str) -> Option<(f32, f32)> {
        self.slot_of(id)
            .map(|slot| (self.bodies.x[slot], self.bodies.y[slot]))
    }

    /// X positions in slot order.
    pub fn positions_x(&self) -> &[f32] {
        &self.bodies.x
    }

    /// Y positions in slot order.
    pub fn positions_y(&self) -> &[f32] {
        &self.bodies.y
    }

    /// X velocities in slot order.
    pub fn velocities_x(&self) -> &[f32] {
        &self.bodies.vx
    }

    /// Y velocities in slot order.
    pub fn velocities_y(&self) -> &[f32] {
        &self.bodies.vy
    }

    /// Canvas center the forces pull toward.
    pub fn center(&self) -> (f32, f32) {
        self.center
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of all nodes.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        if self.bodies.is_empty() {
            return None;
        }
        let mut bounds = (
            f32::INFINITY,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NEG_INFINITY,
        );
        for (&x, &y) in self.bodies.x.iter().zip(&self.bodies.y) {
            bounds.0 = bounds.0.min(x);
            bounds.1 = bounds.1.min(y);
            bounds.2 = bounds.2.max(x);
            bounds.3 = bounds.3.max(y);
        }
        Some(bounds)
    }

    /// Build a spatial index over the current positions.
    pub fn spatial_index(&self) -> SpatialIndex {
        SpatialIndex::from_positions(&self.bodies.x, &self.bodies.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeType;

    fn nodes(ids: &[&str]) -> Vec<GraphNode> {
        ids.iter().map(|id| GraphNode::new(*id, *id)).collect()
    }

    fn edge(s: &str, t: &str) -> GraphEdge {
        GraphEdge::new(format!("{s}-{t}"), s, t)
    }

    fn triangle() -> Simulation {
        Simulation::new(
            &nodes(&["a", "b", "c"]),
            &[edge("a", "b"), edge("b", "c"), edge("c", "a")],
            1200.0,
            800.0,
            &SimulationConfig::default(),
            42,
        )
    }

    fn dist(sim: &Simulation, a: &str, b: &str) -> f32 {
        let (ax, ay) = sim.position(a).unwrap();
        let (bx, by) = sim.position(b).unwrap();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    #[test]
    fn test_initial_positions_near_center() {
        let sim = triangle();
        for id in ["a", "b", "c"] {
            let (x, y) = sim.position(id).unwrap();
            assert!((x - 600.0).abs() <= 200.0, "x={x}");
            assert!((y - 400.0).abs() <= 200.0, "y={y}");
        }
        assert!(sim.is_running());
        assert_eq!(sim.alpha(), 1.0);
    }

    #[test]
    fn test_same_seed_same_start() {
        let a = triangle();
        let b = triangle();
        assert_eq!(a.positions_x(), b.positions_x());
        assert_eq!(a.positions_y(), b.positions_y());
    }

    #[test]
    fn test_skips_dangling_and_duplicates() {
        let sim = Simulation::new(
            &nodes(&["a", "a", "b"]),
            &[edge("a", "ghost"), edge("a", "a"), edge("a", "b")],
            100.0,
            100.0,
            &SimulationConfig::default(),
            1,
        );
        assert_eq!(sim.node_count(), 2);
        assert_eq!(sim.links.len(), 1);
    }

    #[test]
    fn test_link_bias_by_degree() {
        let sim = Simulation::new(
            &nodes(&["hub", "x", "y"]),
            &[edge("hub", "x"), edge("hub", "y")],
            100.0,
            100.0,
            &SimulationConfig::default(),
            1,
        );
        // hub has 2 links, x has 1: the target (x) takes 2/3 of the move.
        assert!((sim.links[0].bias - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_link_distance_from_type() {
        let sim = Simulation::new(
            &nodes(&["a", "b"]),
            &[edge("a", "b").with_type(EdgeType::PartOf)],
            100.0,
            100.0,
            &SimulationConfig::default(),
            1,
        );
        assert!((sim.links[0].distance - 210.0).abs() < 0.01);
    }

    #[test]
    fn test_cools_and_terminates() {
        let mut sim = triangle();
        let ticks = sim.run_to_rest();
        assert!(ticks < 3000, "took {ticks} ticks");
        assert!(!sim.is_running());
        assert!(sim.alpha() < 0.001);
        assert_eq!(sim.tick(), TickOutcome::Cooled);
    }

    #[test]
    fn test_tick_cap() {
        let config = SimulationConfig {
            max_ticks: 10,
            ..Default::default()
        };
        let mut sim = Simulation::new(&nodes(&["a", "b"]), &[], 100.0, 100.0, &config, 3);
        assert_eq!(sim.run_to_rest(), 9);
        assert_eq!(sim.ticks(), 10);
    }

    #[test]
    fn test_tick_cap_waits_for_pins() {
        let config = SimulationConfig {
            max_ticks: 10,
            ..Default::default()
        };
        let mut sim = Simulation::new(&nodes(&["a", "b"]), &[], 100.0, 100.0, &config, 3);
        sim.pin("a", 0.0, 0.0);
        sim.reheat(0.3);
        for _ in 0..50 {
            assert_eq!(sim.tick(), TickOutcome::Running);
        }

        sim.unpin("a");
        assert_eq!(sim.tick(), TickOutcome::Cooled);
    }

    #[test]
    fn test_settled_layout_is_spread() {
        let mut sim = triangle();
        sim.run_to_rest();
        let positions = sim.positions_x().iter().chain(sim.positions_y());
        assert!(positions.into_iter().all(|v| v.is_finite()));
        // Collision radius is 160 at default importance.
        assert!(dist(&sim, "a", "b") > 150.0);
        assert!(dist(&sim, "b", "c") > 150.0);
    }

    #[test]
    fn test_pin_holds_across_ticks() {
        let mut sim = triangle();
        assert!(sim.pin("a", 10.0, 20.0));
        for _ in 0..50 {
            sim.tick();
            assert_eq!(sim.position("a"), Some((10.0, 20.0)));
        }
        assert!(sim.is_pinned("a"));

        sim.unpin("a");
        sim.reheat(0.3);
        sim.tick();
        assert_ne!(sim.position("a"), Some((10.0, 20.0)));
    }

    #[test]
    fn test_pin_unknown_id() {
        let mut sim = triangle();
        assert!(!sim.pin("nope", 0.0, 0.0));
        assert!(!sim.unpin("nope"));
        assert!(!sim.is_pinned("nope"));
    }

    #[test]
    fn test_reheat_wakes_cooled_run() {
        let mut sim = triangle();
        sim.run_to_rest();
        sim.reheat(0.3);
        assert!(sim.is_running());
        assert_eq!(sim.ticks(), 0);
        for _ in 0..200 {
            sim.tick();
        }
        assert!((sim.alpha() - 0.3).abs() < 0.05, "alpha={}", sim.alpha());

        sim.set_alpha_target(0.0);
        sim.run_to_rest();
        assert!(!sim.is_running());
    }

    #[test]
    fn test_stop_is_final() {
        let mut sim = triangle();
        sim.stop();
        let before = sim.positions_x().to_vec();
        assert_eq!(sim.tick(), TickOutcome::Stopped);
        sim.reheat(0.3);
        assert_eq!(sim.tick(), TickOutcome::Stopped);
        assert_eq!(sim.positions_x(), before.as_slice());
        assert!(sim.is_stopped());
    }

    #[test]
    fn test_empty_simulation() {
        let mut sim = Simulation::new(&[], &[], 100.0, 100.0, &SimulationConfig::default(), 0);
        assert_eq!(sim.tick(), TickOutcome::Cooled);
        assert_eq!(sim.bounds(), None);
        sim.reheat(0.3);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_tree_targets_pull_nodes() {
        use crate::hierarchy::build_hierarchy;
        use crate::layout::TidyTreeLayout;

        let graph_nodes = nodes(&["a", "b", "c"]);
        let graph_edges = [edge("a", "b"), edge("a", "c")];
        let tree = build_hierarchy(&graph_nodes, &graph_edges);
        let targets = TidyTreeLayout::with_defaults()
            .compute(&tree)
            .centered_on(600.0, 400.0);

        let mut sim = Simulation::new(
            &graph_nodes,
            &graph_edges,
            1200.0,
            800.0,
            &SimulationConfig::default(),
            9,
        )
        .with_tree_targets(&targets);
        sim.run_to_rest();

        let (_, root_y) = sim.position("a").unwrap();
        let (_, b_y) = sim.position("b").unwrap();
        let (_, c_y) = sim.position("c").unwrap();
        assert!(root_y < b_y && root_y < c_y, "root above children");
    }

    #[test]
    fn test_bounds_and_spatial_index() {
        let sim = triangle();
        let (min_x, min_y, max_x, max_y) = sim.bounds().unwrap();
        assert!(min_x <= max_x && min_y <= max_y);
        let index = sim.spatial_index();
        assert_eq!(index.len(), 3);
        let (ax, ay) = sim.position("a").unwrap();
        assert_eq!(index.nearest(ax, ay), sim.slot_of("a"));
    }
}
