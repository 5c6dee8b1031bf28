//! Session owner tying the pipeline together.
//!
//! A [`ConceptMapView`] holds the map and everything derived from it:
//!
//! ```text
//! MapGraph ─filter─▶ FilteredGraph ─┬─▶ HierarchyNode ─▶ (tree targets)
//!                                   └─▶ Simulation ◀── InteractionController
//!                                            │
//!                                            ▼
//!                                       RenderFrame
//! ```
//!
//! Any change to the filter inputs (tier, disciplines, committed search,
//! layout mode, canvas size) recomputes the filter, rebuilds the hierarchy,
//! stops the old simulation and only then creates a new one.

use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::filter::{ComplexityTier, FilterParams, FilteredGraph, filter};
use crate::graph::MapGraph;
use crate::hierarchy::{HierarchyNode, build_hierarchy};
use crate::interaction::{InteractionController, InteractionEvent, NodeDetail, Scene, Transform};
use crate::layout::{TidyTreeConfig, TidyTreeLayout};
use crate::render::RenderFrame;
use crate::simulation::{Simulation, SimulationConfig, TickOutcome};
use crate::style::node_radius;

/// How the simulation positions nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Free force layout around the canvas center.
    #[default]
    Force,
    /// Force layout pulled toward a tidy tree of the hierarchy.
    Tree,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::Force => "force",
            LayoutMode::Tree => "tree",
        }
    }
}

impl FromStr for LayoutMode {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "force" => Ok(LayoutMode::Force),
            "tree" => Ok(LayoutMode::Tree),
            _ => Err(MapError::UnknownLayoutMode(s.to_string())),
        }
    }
}

/// Configuration for a [`ConceptMapView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Complexity tier shown first.
    pub tier: ComplexityTier,
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
    pub layout: LayoutMode,
    /// Quiet time after the last keystroke before a search is applied.
    pub search_debounce_ms: f64,
    /// Seed for initial node placement.
    pub seed: u64,
    pub simulation: SimulationConfig,
    pub tree: TidyTreeConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            tier: ComplexityTier::Moderate,
            width: 1200.0,
            height: 800.0,
            layout: LayoutMode::Force,
            search_debounce_ms: 300.0,
            seed: 0x00C0_617A,
            simulation: SimulationConfig::default(),
            tree: TidyTreeConfig::default(),
        }
    }
}

impl ViewConfig {
    /// Parse a config from JSON text. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MapError::InvalidConfig(e.to_string()))
    }
}

/// Numbers for the status overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub tier: ComplexityTier,
    pub layout: LayoutMode,
    pub visible_nodes: usize,
    pub total_nodes: usize,
    pub visible_edges: usize,
    pub search_term: String,
    pub zoom_percent: u32,
    /// Active discipline filter, sorted.
    pub disciplines: Vec<String>,
    /// Disciplines the filter chips offer.
    pub available_disciplines: Vec<String>,
    pub running: bool,
}

impl Status {
    /// "Showing X of Y nodes".
    pub fn summary(&self) -> String {
        format!("Showing {} of {} nodes", self.visible_nodes, self.total_nodes)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingSearch {
    term: String,
    last_input_ms: f64,
}

/// One interactive concept map.
#[derive(Debug)]
pub struct ConceptMapView {
    graph: MapGraph,
    config: ViewConfig,
    params: FilterParams,
    pending_search: Option<PendingSearch>,

    visible: FilteredGraph,
    hierarchy: HierarchyNode,
    simulation: Simulation,
    controller: InteractionController,

    rng: StdRng,
    unmounted: bool,
}

impl ConceptMapView {
    /// Build the view: filter, then hierarchy, then simulation.
    pub fn new(graph: MapGraph, config: ViewConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let params = FilterParams::for_tier(config.tier);
        let visible = filter(&graph, &params);
        let hierarchy = build_hierarchy(&visible.nodes, &visible.edges);
        let simulation = Self::create_simulation(&visible, &hierarchy, &config, rng.r#gen());

        log::debug!(
            "view created: {} of {} nodes visible, tier={}",
            visible.nodes.len(),
            visible.total_nodes,
            config.tier
        );

        Self {
            graph,
            config,
            params,
            pending_search: None,
            visible,
            hierarchy,
            simulation,
            controller: InteractionController::new(),
            rng,
            unmounted: false,
        }
    }

    /// Parse the map and config from JSON text and build the view.
    pub fn from_json(graph_json: &str, config_json: Option<&str>) -> Result<Self> {
        let graph = MapGraph::from_json(graph_json)?;
        let config = config_json
            .map(ViewConfig::from_json)
            .transpose()?
            .unwrap_or_default();
        Ok(Self::new(graph, config))
    }

    fn create_simulation(
        visible: &FilteredGraph,
        hierarchy: &HierarchyNode,
        config: &ViewConfig,
        seed: u64,
    ) -> Simulation {
        let simulation = Simulation::new(
            &visible.nodes,
            &visible.edges,
            config.width,
            config.height,
            &config.simulation,
            seed,
        );
        match config.layout {
            LayoutMode::Force => simulation,
            LayoutMode::Tree => {
                let targets = TidyTreeLayout::new(config.tree.clone())
                    .compute(hierarchy)
                    .centered_on(config.width / 2.0, config.height / 2.0);
                simulation.with_tree_targets(&targets)
            }
        }
    }

    /// Recompute every derived structure from the current inputs.
    fn rebuild(&mut self) {
        if self.unmounted {
            return;
        }
        self.visible = filter(&self.graph, &self.params);
        self.hierarchy = build_hierarchy(&self.visible.nodes, &self.visible.edges);
        self.simulation.stop();
        let seed = self.rng.r#gen();
        self.simulation =
            Self::create_simulation(&self.visible, &self.hierarchy, &self.config, seed);
        self.controller.reset_for(&self.graph);

        log::debug!(
            "view rebuilt: {} of {} nodes, {} edges visible",
            self.visible.nodes.len(),
            self.visible.total_nodes,
            self.visible.edges.len()
        );
    }

    // =========================================================================
    // Filter inputs
    // =========================================================================

    // Inputs after unmount are dropped so `status()` keeps describing the
    // graph that was last built.

    pub fn set_tier(&mut self, tier: ComplexityTier) {
        if !self.unmounted && self.params.tier != tier {
            self.params.tier = tier;
            self.rebuild();
        }
    }

    /// Add the discipline to the filter, or remove it if present.
    ///
    /// Returns whether it is active afterwards. After unmount nothing changes
    /// and the result is whether it was already active.
    pub fn toggle_discipline(&mut self, discipline: &str) -> bool {
        if self.unmounted {
            return self.params.disciplines.contains(discipline);
        }
        let active = if self.params.disciplines.remove(discipline) {
            false
        } else {
            self.params.disciplines.insert(discipline.to_string());
            true
        };
        self.rebuild();
        active
    }

    pub fn clear_disciplines(&mut self) {
        if !self.unmounted && !self.params.disciplines.is_empty() {
            self.params.disciplines.clear();
            self.rebuild();
        }
    }

    /// Record a keystroke in the search box. Applied by [`poll`](Self::poll)
    /// once the input has been quiet long enough.
    pub fn input_search(&mut self, term: &str, now_ms: f64) {
        if self.unmounted {
            return;
        }
        self.pending_search = Some(PendingSearch {
            term: term.to_string(),
            last_input_ms: now_ms,
        });
    }

    /// Apply a pending search whose debounce window has elapsed.
    ///
    /// Returns true if the visible graph was rebuilt.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match &self.pending_search {
            Some(pending) if now_ms - pending.last_input_ms >= self.config.search_debounce_ms => {
                self.commit_search()
            }
            _ => false,
        }
    }

    /// Apply the pending search now. Returns true if the visible graph was
    /// rebuilt.
    pub fn commit_search(&mut self) -> bool {
        let Some(pending) = self.pending_search.take() else {
            return false;
        };
        if pending.term == self.params.search_term {
            return false;
        }
        self.params.search_term = pending.term;
        self.rebuild();
        true
    }

    /// The search term waiting for its debounce window, if any.
    pub fn pending_search(&self) -> Option<&str> {
        self.pending_search.as_ref().map(|p| p.term.as_str())
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        if !self.unmounted && self.config.layout != mode {
            self.config.layout = mode;
            self.rebuild();
        }
    }

    /// Change the canvas size. The layout restarts around the new center.
    pub fn resize(&mut self, width: f32, height: f32) {
        if self.unmounted {
            return;
        }
        if self.config.width != width || self.config.height != height {
            self.config.width = width;
            self.config.height = height;
            self.rebuild();
        }
    }

    // =========================================================================
    // Animation loop
    // =========================================================================

    /// Advance the simulation one tick.
    pub fn tick(&mut self) -> TickOutcome {
        if self.unmounted {
            return TickOutcome::Stopped;
        }
        self.simulation.tick()
    }

    /// Step the fit-view transition. Returns true while it is still running.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        self.controller.advance(dt_ms)
    }

    /// Snapshot for drawing.
    pub fn frame(&self) -> RenderFrame {
        RenderFrame::build(&self.visible, &self.simulation, &self.controller)
    }

    /// Stop the simulation for good. Later ticks and events do nothing.
    pub fn unmount(&mut self) {
        if !self.unmounted {
            self.simulation.stop();
            self.pending_search = None;
            self.unmounted = true;
            log::debug!("view unmounted");
        }
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Apply an interaction event.
    pub fn dispatch(&mut self, event: InteractionEvent) {
        if self.unmounted {
            log::debug!("event after unmount ignored: {event:?}");
            return;
        }
        self.controller.dispatch(
            event,
            Scene {
                simulation: &mut self.simulation,
                visible: &self.visible,
                graph: &self.graph,
            },
        );
    }

    pub fn zoom_in(&mut self) {
        self.controller.zoom_in(self.config.width, self.config.height);
    }

    pub fn zoom_out(&mut self) {
        self.controller.zoom_out(self.config.width, self.config.height);
    }

    /// Animate the transform to frame every visible node.
    pub fn fit_view(&mut self) {
        if let Some(bounds) = self.content_bounds() {
            self.controller
                .fit_view(bounds, self.config.width, self.config.height);
        }
    }

    /// Bounding box of the visible nodes, padded by each node's radius.
    pub fn content_bounds(&self) -> Option<(f32, f32, f32, f32)> {
        self.visible.nodes.iter().fold(None, |acc, node| {
            let Some((x, y)) = self.simulation.position(&node.id) else {
                return acc;
            };
            let r = node_radius(node.importance());
            let (min_x, min_y, max_x, max_y) = acc.unwrap_or((
                f32::INFINITY,
                f32::INFINITY,
                f32::NEG_INFINITY,
                f32::NEG_INFINITY,
            ));
            Some((
                min_x.min(x - r),
                min_y.min(y - r),
                max_x.max(x + r),
                max_y.max(y + r),
            ))
        })
    }

    /// The visible node drawn under a screen point, if any.
    pub fn hit_test(&self, screen_x: f32, screen_y: f32) -> Option<String> {
        let (wx, wy) = self.transform().screen_to_world(screen_x, screen_y);
        let index = self.simulation.spatial_index();
        let ids = self.simulation.ids();
        let radius_of = |slot: usize| {
            self.visible
                .nodes
                .iter()
                .find(|node| node.id == ids[slot])
                .map_or(0.0, |node| node_radius(node.importance()))
        };
        let max_radius = node_radius(crate::graph::MAX_IMPORTANCE);

        index
            .by_distance(wx, wy)
            .take_while(|&(_, distance)| distance <= max_radius)
            .find(|&(slot, distance)| distance <= radius_of(slot))
            .map(|(slot, _)| ids[slot].clone())
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn status(&self) -> Status {
        Status {
            tier: self.params.tier,
            layout: self.config.layout,
            visible_nodes: self.visible.nodes.len(),
            total_nodes: self.visible.total_nodes,
            visible_edges: self.visible.edges.len(),
            search_term: self.params.search_term.clone(),
            zoom_percent: self.transform().zoom_percent(),
            disciplines: self.params.disciplines.iter().cloned().collect(),
            available_disciplines: self.graph.available_disciplines(),
            running: !self.unmounted && self.simulation.is_running(),
        }
    }

    /// Detail for the selected node, from the full map.
    pub fn selected_detail(&self) -> Option<NodeDetail> {
        NodeDetail::build(&self.graph, self.controller.selected()?)
    }

    pub fn hierarchy(&self) -> &HierarchyNode {
        &self.hierarchy
    }

    pub fn visible(&self) -> &FilteredGraph {
        &self.visible
    }

    pub fn graph(&self) -> &MapGraph {
        &self.graph
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn transform(&self) -> Transform {
        self.controller.transform()
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn filter_params(&self) -> &FilterParams {
        &self.params
    }
}
