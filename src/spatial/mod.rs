//! Spatial indexing over simulation positions.
//!
//! An R-tree keyed by simulation slot, rebuilt from the position buffers when
//! needed. Used for pointer hit testing and for collision candidate lookup.

mod rtree;

pub use rtree::{BodyPoint, SpatialIndex};
