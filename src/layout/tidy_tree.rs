//! Tidy tree layout over the concept hierarchy.
//!
//! Reingold-Tilford style placement: every subtree is laid out on its own,
//! then siblings are packed left to right as tightly as their contours allow
//! and the parent is centered over its first and last child. The result is a
//! compact drawing in which no two subtrees overlap at any depth.
//!
//! # Algorithm Overview
//!
//! 1. **Flatten:** copy the [`HierarchyNode`] tree into an index-addressed
//!    arena so the walks below can work on plain slices.
//! 2. **Contour walk (bottom-up):** compute each child's offset relative to
//!    its parent by merging the left/right contours of its siblings.
//! 3. **Absolute walk (top-down):** accumulate offsets into (x, depth) pairs.
//! 4. **Coordinate transform:** turn (x, depth) into linear (top-down) or
//!    radial (polar) world coordinates.
//!
//! The layout produces *targets*. In tree mode the force simulation pulls
//! each node toward its target rather than toward the canvas center, so the
//! drawing still reacts to drags and collisions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::hierarchy::HierarchyNode;

/// Coordinate mode for the final layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateMode {
    /// Linear top-down layout: x = breadth slot, y = depth * level_separation.
    #[default]
    Linear,
    /// Radial layout: angle = breadth slot, radius = depth * level_separation.
    Radial,
}

/// Configuration for the tidy tree layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidyTreeConfig {
    /// Minimum separation between adjacent siblings, in breadth slots.
    pub sibling_separation: f32,
    /// Minimum separation between the contours of neighbouring subtrees
    /// below the sibling level, in breadth slots.
    pub subtree_separation: f32,
    /// Distance between tree levels, in world units.
    pub level_separation: f32,
    /// World units per breadth slot (linear mode only).
    pub breadth_spacing: f32,
    /// Coordinate output mode.
    pub coordinate_mode: CoordinateMode,
}

impl Default for TidyTreeConfig {
    fn default() -> Self {
        Self {
            sibling_separation: 1.0,
            subtree_separation: 1.5,
            level_separation: 220.0,
            breadth_spacing: 260.0,
            coordinate_mode: CoordinateMode::Linear,
        }
    }
}

/// Arena entry for one hierarchy node.
#[derive(Debug)]
struct Slot<'a> {
    id: &'a str,
    depth: u32,
    children: Vec<usize>,
}

/// Left and right extents of a subtree per level, relative to its root.
///
/// Index 0 is the root's own level.
#[derive(Debug)]
struct Contour {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl Contour {
    fn leaf() -> Self {
        Self {
            left: vec![0.0],
            right: vec![0.0],
        }
    }
}

/// Target positions computed by [`TidyTreeLayout::compute`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TidyTreeResult {
    positions: HashMap<String, [f32; 2]>,
}

impl TidyTreeResult {
    /// Target position for a node id.
    pub fn get(&self, id: &str) -> Option<[f32; 2]> {
        self.positions.get(id).copied()
    }

    /// Number of nodes laid out.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Check if nothing was laid out.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Axis-aligned bounds `(min_x, min_y, max_x, max_y)`, if any.
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        self.positions.values().fold(None, |acc, &[x, y]| {
            Some(match acc {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            })
        })
    }

    /// Translate every target so the bounding box is centered on `(cx, cy)`.
    pub fn centered_on(mut self, cx: f32, cy: f32) -> Self {
        if let Some((min_x, min_y, max_x, max_y)) = self.bounds() {
            let dx = cx - (min_x + max_x) / 2.0;
            let dy = cy - (min_y + max_y) / 2.0;
            for [x, y] in self.positions.values_mut() {
                *x += dx;
                *y += dy;
            }
        }
        self
    }
}

/// The tidy tree layout engine.
pub struct TidyTreeLayout {
    config: TidyTreeConfig,
}

impl TidyTreeLayout {
    /// Create a new tidy tree layout with the given configuration.
    pub fn new(config: TidyTreeConfig) -> Self {
        Self { config }
    }

    /// Create a tidy tree layout with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TidyTreeConfig::default())
    }

    /// Lay out `tree`, returning a target per node id.
    ///
    /// The root of a linear layout sits at the top (`y = 0`); the root of a
    /// radial layout sits at the origin.
    pub fn compute(&self, tree: &HierarchyNode) -> TidyTreeResult {
        let mut slots = Vec::with_capacity(tree.len());
        Self::flatten(tree, &mut slots);

        let mut offsets = vec![0.0f32; slots.len()];
        self.contour_walk(&slots, &mut offsets);

        let mut breadth = vec![0.0f32; slots.len()];
        Self::absolute_walk(&slots, &offsets, &mut breadth);

        let min_x = breadth.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = breadth.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let x_range = max_x - min_x;

        let mut positions = HashMap::with_capacity(slots.len());
        match self.config.coordinate_mode {
            CoordinateMode::Linear => {
                let x_offset = -(min_x + x_range / 2.0);
                for (slot, &x) in slots.iter().zip(&breadth) {
                    positions.insert(
                        slot.id.to_string(),
                        [
                            (x + x_offset) * self.config.breadth_spacing,
                            slot.depth as f32 * self.config.level_separation,
                        ],
                    );
                }
            }
            CoordinateMode::Radial => {
                // One extra slot keeps the first and last leaf from meeting
                // at the seam of the circle.
                let divisor = x_range + self.config.sibling_separation;
                let angular_scale = if divisor > f32::EPSILON {
                    std::f32::consts::TAU / divisor
                } else {
                    0.0
                };
                for (slot, &x) in slots.iter().zip(&breadth) {
                    let angle = (x - min_x) * angular_scale;
                    let radius = slot.depth as f32 * self.config.level_separation;
                    positions.insert(
                        slot.id.to_string(),
                        [radius * angle.cos(), radius * angle.sin()],
                    );
                }
            }
        }

        TidyTreeResult { positions }
    }

    /// Copy the tree into `slots` in pre-order, so every child sits at a
    /// higher index than its parent.
    fn flatten<'a>(tree: &'a HierarchyNode, slots: &mut Vec<Slot<'a>>) {
        let mut stack: Vec<(&HierarchyNode, u32, Option<usize>)> = vec![(tree, 0, None)];
        while let Some((node, depth, parent)) = stack.pop() {
            let index = slots.len();
            slots.push(Slot {
                id: node.id(),
                depth,
                children: Vec::with_capacity(node.children.len()),
            });
            if let Some(parent) = parent {
                slots[parent].children.push(index);
            }
            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child| (child, depth + 1, Some(index))),
            );
        }
    }

    /// Bottom-up pass: fill `offsets[child]` with each child's x relative to
    /// its parent. Slots are visited last to first, so a node's children are
    /// always finished before it.
    fn contour_walk(&self, slots: &[Slot<'_>], offsets: &mut [f32]) {
        let mut contours: Vec<Option<Contour>> = Vec::with_capacity(slots.len());
        contours.resize_with(slots.len(), || None);

        for v in (0..slots.len()).rev() {
            let finished: Vec<Contour> = slots[v]
                .children
                .iter()
                .map(|&child| contours[child].take().unwrap_or_else(Contour::leaf))
                .collect();
            contours[v] = Some(self.place_children(&slots[v].children, finished, offsets));
        }
    }

    /// Pack the children of one node left to right and return the contour of
    /// the node's subtree. `finished` holds the children's contours in order.
    fn place_children(
        &self,
        children: &[usize],
        finished: Vec<Contour>,
        offsets: &mut [f32],
    ) -> Contour {
        let mut merged: Option<Contour> = None;
        let mut placed: Vec<f32> = Vec::with_capacity(children.len());

        for contour in finished {
            let Some(acc) = merged.as_mut() else {
                placed.push(0.0);
                merged = Some(contour);
                continue;
            };

            // Smallest shift that keeps this child right of everything placed
            // so far, on every level both share.
            let mut shift = f32::NEG_INFINITY;
            for (level, (&acc_right, &child_left)) in
                acc.right.iter().zip(&contour.left).enumerate()
            {
                let separation = if level == 0 {
                    self.config.sibling_separation
                } else {
                    self.config.subtree_separation
                };
                shift = shift.max(acc_right + separation - child_left);
            }
            placed.push(shift);

            for (level, (&left, &right)) in contour.left.iter().zip(&contour.right).enumerate() {
                if level < acc.left.len() {
                    acc.right[level] = right + shift;
                } else {
                    acc.left.push(left + shift);
                    acc.right.push(right + shift);
                }
            }
        }

        let Some(mut acc) = merged else {
            return Contour::leaf();
        };

        let first = placed.first().copied().unwrap_or(0.0);
        let last = placed.last().copied().unwrap_or(0.0);
        let mid = (first + last) / 2.0;
        for (&child, &x) in children.iter().zip(&placed) {
            offsets[child] = x - mid;
        }

        for x in acc.left.iter_mut().chain(acc.right.iter_mut()) {
            *x -= mid;
        }
        acc.left.insert(0, 0.0);
        acc.right.insert(0, 0.0);
        acc
    }

    /// Top-down pass: accumulate relative offsets into absolute breadth.
    /// Parents precede children in `slots`, so one forward sweep suffices.
    fn absolute_walk(slots: &[Slot<'_>], offsets: &[f32], breadth: &mut [f32]) {
        for (v, slot) in slots.iter().enumerate() {
            let x = breadth[v];
            for &child in &slot.children {
                breadth[child] = x + offsets[child];
            }
        }
    }
}
