//! Layout algorithms that compute target positions for nodes.
//!
//! The force simulation owns live positions. Layouts here only produce
//! per-node targets that the simulation's positioning forces pull toward.

pub mod tidy_tree;

pub use tidy_tree::{CoordinateMode, TidyTreeConfig, TidyTreeLayout, TidyTreeResult};
