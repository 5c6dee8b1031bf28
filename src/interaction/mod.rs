//! Interaction controller.
//!
//! All user input arrives as [`InteractionEvent`] values and goes through
//! [`InteractionController::dispatch`]. The controller owns the pan/zoom
//! transform, the drag state machine, the hover highlight and the selection.
//! It is the only writer of simulation pins.
//!
//! Drag coordinates are world coordinates; zoom anchors and pan deltas are
//! screen pixels. The facade converts pointer positions before dispatching.

mod detail;
mod transform;

pub use detail::{NodeDetail, Relationship};
pub use transform::{
    FIT_DURATION_MS, FIT_FILL, MAX_ZOOM, MIN_ZOOM, Transform, TransformAnimation,
    ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR, clamp_zoom, ease_cubic_in_out,
};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::filter::FilteredGraph;
use crate::graph::MapGraph;
use crate::simulation::Simulation;

/// Alpha target held while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f32 = 0.3;

/// A user input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InteractionEvent {
    DragStart { node_id: String, x: f32, y: f32 },
    DragMove { node_id: String, x: f32, y: f32 },
    DragEnd { node_id: String },
    /// `None` when the pointer leaves every node.
    NodeHover { node_id: Option<String> },
    /// `None` for a click on empty canvas.
    NodeSelect { node_id: Option<String> },
    Zoom { factor: f32, anchor_x: f32, anchor_y: f32 },
    Pan { dx: f32, dy: f32 },
}

/// Drag state machine: Free → Dragging → Free.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Free,
    Dragging {
        node_id: String,
        /// Node position minus pointer position at drag start.
        offset: (f32, f32),
    },
}

/// The hovered node and everything directly connected to it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Highlight {
    pub node_ids: HashSet<String>,
    pub edge_ids: HashSet<String>,
}

impl Highlight {
    /// Highlight for `id` over the visible graph: the node, its visible
    /// incident edges and their other endpoints.
    pub fn around(visible: &FilteredGraph, id: &str) -> Self {
        let mut highlight = Self::default();
        highlight.node_ids.insert(id.to_string());
        for edge in visible.edges.iter().filter(|edge| edge.touches(id)) {
            highlight.edge_ids.insert(edge.id.clone());
            if let Some(other) = edge.opposite(id) {
                highlight.node_ids.insert(other.to_string());
            }
        }
        highlight
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_ids.contains(id)
    }
}

/// What an event may read and write besides the controller itself.
pub struct Scene<'a> {
    pub simulation: &'a mut Simulation,
    pub visible: &'a FilteredGraph,
    pub graph: &'a MapGraph,
}

/// Interactive view state.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    transform: Transform,
    animation: Option<TransformAnimation>,
    drag: DragState,
    hovered: Option<String>,
    highlight: Option<Highlight>,
    selected: Option<String>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reducer
    // =========================================================================

    /// Apply one event.
    pub fn dispatch(&mut self, event: InteractionEvent, scene: Scene<'_>) {
        match event {
            InteractionEvent::DragStart { node_id, x, y } => {
                self.drag_start(scene.simulation, node_id, x, y)
            }
            InteractionEvent::DragMove { node_id, x, y } => {
                self.drag_move(scene.simulation, &node_id, x, y)
            }
            InteractionEvent::DragEnd { node_id } => self.drag_end(scene.simulation, &node_id),
            InteractionEvent::NodeHover { node_id } => self.hover(scene.visible, node_id),
            InteractionEvent::NodeSelect { node_id } => self.select(scene.graph, node_id),
            InteractionEvent::Zoom {
                factor,
                anchor_x,
                anchor_y,
            } => {
                self.animation = None;
                self.transform = self.transform.zoomed_at(factor, anchor_x, anchor_y);
            }
            InteractionEvent::Pan { dx, dy } => {
                self.animation = None;
                self.transform = self.transform.panned(dx, dy);
            }
        }
    }

    fn drag_start(&mut self, simulation: &mut Simulation, node_id: String, x: f32, y: f32) {
        let Some((nx, ny)) = simulation.position(&node_id) else {
            log::debug!("drag start on unknown node {node_id:?} ignored");
            return;
        };
        if let DragState::Dragging { node_id: previous, .. } = &self.drag {
            if *previous != node_id {
                log::debug!("drag on {node_id:?} releases {previous:?}");
                simulation.unpin(previous);
            }
        }

        simulation.pin(&node_id, nx, ny);
        simulation.reheat(DRAG_ALPHA_TARGET);
        log::debug!("drag start {node_id:?}");
        self.drag = DragState::Dragging {
            node_id,
            offset: (nx - x, ny - y),
        };
    }

    fn drag_move(&mut self, simulation: &mut Simulation, node_id: &str, x: f32, y: f32) {
        match &self.drag {
            DragState::Dragging {
                node_id: dragged,
                offset,
            } if dragged == node_id => {
                simulation.pin(node_id, x + offset.0, y + offset.1);
                simulation.reheat(DRAG_ALPHA_TARGET);
            }
            _ => log::debug!("drag move on {node_id:?} without drag start ignored"),
        }
    }

    fn drag_end(&mut self, simulation: &mut Simulation, node_id: &str) {
        match &self.drag {
            DragState::Dragging {
                node_id: dragged, ..
            } if dragged == node_id => {
                simulation.unpin(node_id);
                simulation.set_alpha_target(0.0);
                log::debug!("drag end {node_id:?}");
                self.drag = DragState::Free;
            }
            _ => log::debug!("drag end on {node_id:?} without drag start ignored"),
        }
    }

    fn hover(&mut self, visible: &FilteredGraph, node_id: Option<String>) {
        match node_id {
            Some(id) if visible.contains_node(&id) => {
                self.highlight = Some(Highlight::around(visible, &id));
                self.hovered = Some(id);
            }
            Some(id) => {
                log::debug!("hover on hidden node {id:?} ignored");
                self.clear_hover();
            }
            None => self.clear_hover(),
        }
    }

    fn select(&mut self, graph: &MapGraph, node_id: Option<String>) {
        self.selected = match node_id {
            Some(id) if graph.node(&id).is_some() => Some(id),
            Some(id) => {
                log::debug!("select on unknown node {id:?} clears selection");
                None
            }
            None => None,
        };
    }

    fn clear_hover(&mut self) {
        self.hovered = None;
        self.highlight = None;
    }

    // =========================================================================
    // View commands
    // =========================================================================

    /// Zoom by [`ZOOM_IN_FACTOR`] around the viewport center.
    pub fn zoom_in(&mut self, width: f32, height: f32) {
        self.animation = None;
        self.transform = self
            .transform
            .zoomed_at(ZOOM_IN_FACTOR, width / 2.0, height / 2.0);
    }

    /// Zoom by [`ZOOM_OUT_FACTOR`] around the viewport center.
    pub fn zoom_out(&mut self, width: f32, height: f32) {
        self.animation = None;
        self.transform = self
            .transform
            .zoomed_at(ZOOM_OUT_FACTOR, width / 2.0, height / 2.0);
    }

    /// Start an animated transition that frames the world box `bounds`.
    pub fn fit_view(&mut self, bounds: (f32, f32, f32, f32), width: f32, height: f32) {
        let target = Transform::fit(bounds, width, height);
        self.animation = Some(TransformAnimation::new(
            self.transform,
            target,
            FIT_DURATION_MS,
        ));
    }

    /// Step the running transition. Returns true while it is still running.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };
        self.transform = animation.advance(dt_ms);
        if animation.is_finished() {
            self.animation = None;
            return false;
        }
        true
    }

    /// Forget hover, selection and drag for a freshly rebuilt scene.
    ///
    /// The transform is kept. A selection survives if the node still exists
    /// in the map; hover is dropped since its highlight described the old
    /// visible edge set.
    pub fn reset_for(&mut self, graph: &MapGraph) {
        self.drag = DragState::Free;
        self.clear_hover();
        if let Some(id) = &self.selected {
            if graph.node(id).is_none() {
                self.selected = None;
            }
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Replace the transform outright, cancelling any transition.
    pub fn set_transform(&mut self, transform: Transform) {
        self.animation = None;
        self.transform = Transform::new(transform.x, transform.y, transform.k);
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Id of the node being dragged.
    pub fn dragging(&self) -> Option<&str> {
        match &self.drag {
            DragState::Dragging { node_id, .. } => Some(node_id),
            DragState::Free => None,
        }
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}
