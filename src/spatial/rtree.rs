//! R-tree over one snapshot of simulation positions.
//!
//! Two queries matter to the engine: nodes ordered by distance from the
//! pointer (hit testing), and nodes within reach of a circle (collision
//! candidates). Positions change every tick, so an index is always bulk-loaded
//! from the SoA buffers and thrown away, never edited in place.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// A simulation slot at a fixed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPoint {
    pub slot: usize,
    pub position: [f32; 2],
}

impl RTreeObject for BodyPoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for BodyPoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let [x, y] = self.position;
        (x - point[0]).powi(2) + (y - point[1]).powi(2)
    }
}

/// Spatial index keyed by simulation slot.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<BodyPoint>,
}

impl SpatialIndex {
    /// Bulk-load from parallel buffers; slot `i` sits at `(xs[i], ys[i])`.
    ///
    /// Slots with a NaN or infinite coordinate are left out, so a diverged
    /// body can never be hit or collided with.
    pub fn from_positions(xs: &[f32], ys: &[f32]) -> Self {
        let points = xs
            .iter()
            .zip(ys)
            .enumerate()
            .filter(|(_, (x, y))| x.is_finite() && y.is_finite())
            .map(|(slot, (&x, &y))| BodyPoint {
                slot,
                position: [x, y],
            })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Slot closest to `(x, y)`.
    pub fn nearest(&self, x: f32, y: f32) -> Option<usize> {
        self.tree.nearest_neighbor(&[x, y]).map(|point| point.slot)
    }

    /// Every slot with its distance from `(x, y)`, closest first.
    ///
    /// Lazy: stop pulling once distances pass the largest radius of interest.
    pub fn by_distance(&self, x: f32, y: f32) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.tree
            .nearest_neighbor_iter_with_distance_2(&[x, y])
            .map(|(point, distance_2)| (point.slot, distance_2.sqrt()))
    }

    /// Slots no further than `reach` from `(x, y)`, in no particular order.
    pub fn within(&self, x: f32, y: f32, reach: f32) -> impl Iterator<Item = usize> + '_ {
        self.tree
            .locate_within_distance([x, y], reach * reach)
            .map(|point| point.slot)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal() -> SpatialIndex {
        SpatialIndex::from_positions(&[0.0, 10.0, 5.0], &[0.0, 10.0, 5.0])
    }

    #[test]
    fn test_nearest() {
        let index = diagonal();
        assert_eq!(index.nearest(-3.0, 1.0), Some(0));
        assert_eq!(index.nearest(6.0, 6.0), Some(2));
        assert_eq!(index.nearest(11.0, 11.0), Some(1));
        assert_eq!(SpatialIndex::default().nearest(0.0, 0.0), None);
    }

    #[test]
    fn test_by_distance_is_sorted() {
        let ranked: Vec<(usize, f32)> = diagonal().by_distance(11.0, 11.0).collect();
        let slots: Vec<usize> = ranked.iter().map(|&(slot, _)| slot).collect();
        assert_eq!(slots, vec![1, 2, 0]);
        assert!((ranked[0].1 - 2f32.sqrt()).abs() < 1e-5);
        assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_within_reach() {
        let index = SpatialIndex::from_positions(&[0.0, 3.0, 10.0], &[0.0, 0.0, 0.0]);
        let mut found: Vec<usize> = index.within(0.0, 0.0, 5.0).collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
        // The boundary is inclusive.
        assert_eq!(index.within(10.0, 4.0, 4.0).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_diverged_bodies_left_out() {
        let index =
            SpatialIndex::from_positions(&[0.0, f32::NAN, 2.0], &[0.0, 1.0, f32::INFINITY]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.nearest(2.0, 100.0), Some(0));
    }

    #[test]
    fn test_mismatched_buffers_use_shorter() {
        let index = SpatialIndex::from_positions(&[0.0, 1.0, 2.0], &[0.0, 1.0]);
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
    }
}
