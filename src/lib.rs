//! Cogito concept map engine - WASM Module
//!
//! Layout and interaction core for Cogito concept maps, compiled to
//! WebAssembly and driven from the page's animation loop.
//!
//! # Architecture
//!
//! - `graph`: Node, edge and map types as delivered by the map generator
//! - `filter`: Complexity tier, search and discipline filtering
//! - `hierarchy`: BFS spanning tree of the visible graph
//! - `layout`: Tidy tree targets for the tree layout mode
//! - `simulation`: Force-directed layout (link, charge, center, collision,
//!   radial and axis forces)
//! - `spatial`: R-tree spatial indexing for hit testing and collisions
//! - `interaction`: Pan/zoom, drag pins, hover highlight, selection
//! - `style` / `render`: Style lookup tables and per-tick render frames
//! - `view`: Session owner wiring the above together

use js_sys::Float32Array;
use log::Level;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod filter;
pub mod graph;
pub mod hierarchy;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod simulation;
pub mod spatial;
pub mod style;
pub mod view;

pub use error::{MapError, Result};
pub use view::{ConceptMapView, LayoutMode, Status, ViewConfig};

use filter::ComplexityTier;
use graph::MapGraph;
use interaction::InteractionEvent;
use simulation::TickOutcome;

/// Initialize the WASM module: console logging and readable panics.
#[wasm_bindgen(start)]
pub fn init() {
    let _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> std::result::Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(
    value: JsValue,
    wrap: fn(String) -> MapError,
) -> std::result::Result<T, MapError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| wrap(e.to_string()))
}

/// Main entry point for a concept map.
///
/// Wraps a [`ConceptMapView`] and exposes it to JavaScript. Pointer
/// positions passed in are screen pixels relative to the canvas.
#[wasm_bindgen]
pub struct CogitoMapWasm {
    view: ConceptMapView,
}

#[wasm_bindgen]
impl CogitoMapWasm {
    /// Create a map from a JS graph object and an optional config object.
    #[wasm_bindgen(constructor)]
    pub fn new(graph: JsValue, config: JsValue) -> std::result::Result<CogitoMapWasm, JsError> {
        let graph: MapGraph = from_js(graph, MapError::InvalidPayload)?;
        let config: ViewConfig = if config.is_undefined() || config.is_null() {
            ViewConfig::default()
        } else {
            from_js(config, MapError::InvalidConfig)?
        };
        Ok(Self {
            view: ConceptMapView::new(graph, config),
        })
    }

    /// Create a map from JSON text.
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(
        graph_json: &str,
        config_json: Option<String>,
    ) -> std::result::Result<CogitoMapWasm, JsError> {
        let view = ConceptMapView::from_json(graph_json, config_json.as_deref())?;
        Ok(Self { view })
    }

    // =========================================================================
    // Animation Loop
    // =========================================================================

    /// Advance the simulation one tick. Returns true while it is running.
    pub fn tick(&mut self) -> bool {
        self.view.tick() == TickOutcome::Running
    }

    /// Step the fit-view transition by `dt_ms`. Returns true while animating.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        self.view.advance(dt_ms)
    }

    /// The current render frame.
    pub fn frame(&self) -> std::result::Result<JsValue, JsError> {
        to_js(&self.view.frame())
    }

    /// Stop the simulation for good.
    pub fn destroy(&mut self) {
        self.view.unmount();
    }

    // =========================================================================
    // Position Buffer Access (Zero-Copy)
    // =========================================================================

    /// Node ids in position-buffer order.
    #[wasm_bindgen(js_name = nodeIds)]
    pub fn node_ids(&self) -> Vec<String> {
        self.view.simulation().ids().to_vec()
    }

    /// Get a zero-copy view of X positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Read it immediately, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.view.simulation().positions_x()) }
    }

    /// Get a zero-copy view of Y positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Read it immediately, do not store.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.view.simulation().positions_y()) }
    }

    // =========================================================================
    // Pointer Events
    // =========================================================================

    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self, node_id: String, screen_x: f32, screen_y: f32) {
        let (x, y) = self.view.transform().screen_to_world(screen_x, screen_y);
        self.view
            .dispatch(InteractionEvent::DragStart { node_id, x, y });
    }

    #[wasm_bindgen(js_name = dragMove)]
    pub fn drag_move(&mut self, node_id: String, screen_x: f32, screen_y: f32) {
        let (x, y) = self.view.transform().screen_to_world(screen_x, screen_y);
        self.view
            .dispatch(InteractionEvent::DragMove { node_id, x, y });
    }

    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&mut self, node_id: String) {
        self.view.dispatch(InteractionEvent::DragEnd { node_id });
    }

    /// Hover a node, or pass `undefined` when the pointer leaves.
    pub fn hover(&mut self, node_id: Option<String>) {
        self.view.dispatch(InteractionEvent::NodeHover { node_id });
    }

    /// Select a node, or pass `undefined` for a click on empty canvas.
    pub fn select(&mut self, node_id: Option<String>) {
        self.view.dispatch(InteractionEvent::NodeSelect { node_id });
    }

    /// Zoom by `factor` keeping the screen point fixed (wheel zoom).
    pub fn zoom(&mut self, factor: f32, anchor_x: f32, anchor_y: f32) {
        self.view.dispatch(InteractionEvent::Zoom {
            factor,
            anchor_x,
            anchor_y,
        });
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.view.dispatch(InteractionEvent::Pan { dx, dy });
    }

    /// Dispatch a JS event object, e.g. `{type: "dragEnd", nodeId: "a"}`.
    ///
    /// Drag coordinates in the object are world coordinates.
    pub fn dispatch(&mut self, event: JsValue) -> std::result::Result<(), JsError> {
        let event: InteractionEvent = from_js(event, MapError::InvalidPayload)?;
        self.view.dispatch(event);
        Ok(())
    }

    /// Id of the node under a screen point.
    #[wasm_bindgen(js_name = hitTest)]
    pub fn hit_test(&self, screen_x: f32, screen_y: f32) -> Option<String> {
        self.view.hit_test(screen_x, screen_y)
    }

    // =========================================================================
    // View Controls
    // =========================================================================

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) {
        self.view.zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) {
        self.view.zoom_out();
    }

    /// Start the animated fit-to-content transition.
    #[wasm_bindgen(js_name = fitView)]
    pub fn fit_view(&mut self) {
        self.view.fit_view();
    }

    /// The current `{x, y, k}` transform.
    pub fn transform(&self) -> std::result::Result<JsValue, JsError> {
        to_js(&self.view.transform())
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.view.resize(width, height);
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Switch to "minimal", "moderate" or "thorough".
    #[wasm_bindgen(js_name = setTier)]
    pub fn set_tier(&mut self, tier: &str) -> std::result::Result<(), JsError> {
        let tier: ComplexityTier = tier.parse()?;
        self.view.set_tier(tier);
        Ok(())
    }

    /// Switch to "force" or "tree".
    #[wasm_bindgen(js_name = setLayoutMode)]
    pub fn set_layout_mode(&mut self, mode: &str) -> std::result::Result<(), JsError> {
        let mode: LayoutMode = mode.parse()?;
        self.view.set_layout_mode(mode);
        Ok(())
    }

    /// Toggle a discipline chip. Returns whether it is now active.
    #[wasm_bindgen(js_name = toggleDiscipline)]
    pub fn toggle_discipline(&mut self, discipline: &str) -> bool {
        self.view.toggle_discipline(discipline)
    }

    #[wasm_bindgen(js_name = clearDisciplines)]
    pub fn clear_disciplines(&mut self) {
        self.view.clear_disciplines();
    }

    /// Record a search keystroke at `now_ms` (e.g. `performance.now()`).
    #[wasm_bindgen(js_name = inputSearch)]
    pub fn input_search(&mut self, term: &str, now_ms: f64) {
        self.view.input_search(term, now_ms);
    }

    /// Apply a debounced search if it is due. Returns true on rebuild.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        self.view.poll(now_ms)
    }

    /// Apply the pending search immediately. Returns true on rebuild.
    #[wasm_bindgen(js_name = commitSearch)]
    pub fn commit_search(&mut self) -> bool {
        self.view.commit_search()
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    /// Tier, counts, search term, zoom and discipline state.
    pub fn status(&self) -> std::result::Result<JsValue, JsError> {
        to_js(&self.view.status())
    }

    /// "Showing X of Y nodes".
    #[wasm_bindgen(js_name = statusSummary)]
    pub fn status_summary(&self) -> String {
        self.view.status().summary()
    }

    /// Detail for the selected node, or `undefined`.
    #[wasm_bindgen(js_name = selectedDetail)]
    pub fn selected_detail(&self) -> std::result::Result<JsValue, JsError> {
        match self.view.selected_detail() {
            Some(detail) => to_js(&detail),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// The spanning tree of the visible graph.
    pub fn hierarchy(&self) -> std::result::Result<JsValue, JsError> {
        to_js(self.view.hierarchy())
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::filter::{FilterParams, filter};
    use crate::hierarchy::build_hierarchy;
    use crate::layout::{CoordinateMode, TidyTreeConfig, TidyTreeLayout};

    const ROME: &str = r#"{
        "summary": "The rise and fall of Rome",
        "disciplines": ["History", "Law", "Philosophy"],
        "timespan": {"start": "753 BC", "end": "476 AD"},
        "nodes": [
            {"id": "republic", "label": "Roman Republic", "type": "event", "importance": 9,
             "discipline": "History", "year": -509},
            {"id": "empire", "label": "Roman Empire", "type": "event", "importance": 10,
             "discipline": "History", "period": "27 BC - 476 AD"},
            {"id": "cicero", "label": "Cicero", "type": "person", "importance": 7,
             "discipline": "Philosophy"},
            {"id": "twelve", "label": "Twelve Tables", "type": "work", "importance": 6,
             "discipline": "Law"},
            {"id": "stoa", "label": "Stoicism", "type": "movement", "importance": 4,
             "discipline": "Philosophy"},
            {"id": "carthage", "label": "Carthage", "type": "place", "importance": 5,
             "discipline": "History", "location": "North Africa"}
        ],
        "edges": [
            {"id": "e1", "source": "republic", "target": "empire", "label": "became", "type": "leads_to", "strength": 5},
            {"id": "e2", "source": "cicero", "target": "republic", "label": "defended", "type": "supports", "strength": 4},
            {"id": "e3", "source": "twelve", "target": "republic", "label": "founded law of", "type": "part_of", "strength": 2},
            {"id": "e4", "source": "stoa", "target": "cicero", "label": "influenced", "type": "influences", "strength": 3},
            {"id": "e5", "source": "republic", "target": "carthage", "label": "destroyed", "type": "opposes", "strength": 1},
            {"id": "e6", "source": "empire", "target": "ghost", "type": "contains", "strength": 5}
        ]
    }"#;

    fn load(config_json: Option<&str>) -> CogitoMapWasm {
        match CogitoMapWasm::from_json(ROME, config_json.map(str::to_string)) {
            Ok(map) => map,
            Err(_) => panic!("fixture map failed to parse"),
        }
    }

    /// Full pipeline through the facade: parse, tick to rest, interact.
    #[test]
    fn test_facade_pipeline() {
        let mut map = load(None);
        assert_eq!(map.status_summary(), "Showing 5 of 6 nodes");

        let mut ticks = 0;
        while map.tick() {
            ticks += 1;
        }
        assert!(ticks > 0 && ticks < 3000);

        let ids = map.node_ids();
        assert_eq!(ids.len(), 5);
        assert!(!ids.contains(&"stoa".to_string()));

        // Grab the empire node through a screen-space hit test and drag it.
        let (x, y) = map.view.simulation().position("empire").unwrap();
        let (sx, sy) = map.view.transform().world_to_screen(x, y);
        assert_eq!(map.hit_test(sx, sy), Some("empire".to_string()));

        map.drag_start("empire".into(), sx, sy);
        map.drag_move("empire".into(), sx + 40.0, sy);
        assert!(map.tick(), "drag reheats the simulation");
        let (nx, ny) = map.view.simulation().position("empire").unwrap();
        assert!((nx - (x + 40.0)).abs() < 1e-3 && (ny - y).abs() < 1e-3);
        map.drag_end("empire".into());
        assert!(!map.view.simulation().is_pinned("empire"));

        map.destroy();
        assert!(!map.tick());
    }

    #[test]
    fn test_facade_filters() {
        let mut map = load(None);

        map.input_search("rome", 0.0);
        assert!(!map.poll(100.0));
        assert!(map.poll(300.0));
        let ids = map.node_ids();
        assert_eq!(ids, vec!["empire".to_string()]);

        map.input_search("", 400.0);
        assert!(map.commit_search());
        assert!(map.toggle_discipline("Law"));
        assert_eq!(map.node_ids(), vec!["twelve".to_string()]);
        map.clear_disciplines();

        assert!(map.set_layout_mode("tree").is_ok());
        assert_eq!(map.view.status().layout, LayoutMode::Tree);
    }

    #[test]
    fn test_facade_zoom_controls() {
        let mut map = load(Some(r#"{"width": 800, "height": 600}"#));
        map.zoom_in();
        map.zoom_in();
        assert_eq!(map.view.status().zoom_percent, 144);
        map.zoom(0.001, 0.0, 0.0);
        assert_eq!(map.view.transform().k, interaction::MIN_ZOOM);
        map.pan(5.0, 5.0);

        while map.tick() {}
        map.fit_view();
        while map.advance(16.0) {}
        let k = map.view.transform().k;
        assert!(k >= interaction::MIN_ZOOM && k <= interaction::MAX_ZOOM);
    }

    /// Hierarchy and tidy tree straight from the filtered map.
    #[test]
    fn test_filter_to_tree_layout() {
        let graph = MapGraph::from_json(ROME).unwrap();
        let visible = filter(&graph, &FilterParams::for_tier(ComplexityTier::Thorough));
        assert_eq!(visible.nodes.len(), 6);
        // The dangling e6 is gone.
        assert_eq!(visible.edges.len(), 5);

        let tree = build_hierarchy(&visible.nodes, &visible.edges);
        assert_eq!(tree.id(), "republic");
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.find("stoa").map(|n| n.depth), Some(2));

        let layout = TidyTreeLayout::new(TidyTreeConfig {
            coordinate_mode: CoordinateMode::Radial,
            level_separation: 100.0,
            ..Default::default()
        });
        let targets = layout.compute(&tree);
        assert_eq!(targets.len(), 6);
        let [sx, sy] = targets.get("stoa").unwrap();
        assert!(((sx * sx + sy * sy).sqrt() - 200.0).abs() < 0.5);
    }
}
