//! Graph data model.
//!
//! Typed nodes, edges and the map aggregate as they arrive from the
//! surrounding application. Pure data: the engine only reads these, and every
//! derived structure (filtered view, hierarchy, simulation) is rebuilt from
//! them.

mod edge;
mod map;
mod node;

pub use edge::{DEFAULT_STRENGTH, EdgeType, GraphEdge, MAX_STRENGTH, MIN_STRENGTH};
pub use map::{MapGraph, Timespan};
pub use node::{
    DEFAULT_IMPORTANCE, GraphNode, ImportanceTier, MAX_IMPORTANCE, MIN_IMPORTANCE, NodeType,
    Resource,
};
