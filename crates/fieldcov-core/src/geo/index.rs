//! Proximity index over the projected measurement set.
//!
//! An R-tree over the 3-D spherical embedding answers "all measurements
//! within radius R of this candidate" without a quadratic scan. Radii are in
//! the embedding's units, i.e. metres for nearby points.

use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Immutable spatial index built once per ingestion run.
pub struct ProximityIndex {
    tree: RTree<IndexedPoint>,
}

impl ProximityIndex {
    /// Bulk-load the index from projected coordinates. The position of each
    /// point in `points` is the index returned by queries.
    pub fn build(points: &[[f64; 3]]) -> Self {
        let entries: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(*p, i))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// All measurement indices whose Cartesian distance to `center` is at
    /// most `radius_m`. No ordering guarantee.
    pub fn query_radius(&self, center: [f64; 3], radius_m: f64) -> Vec<usize> {
        self.tree
            .locate_within_distance(center, radius_m * radius_m)
            .map(|entry| entry.data)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::projection::{project, EARTH_RADIUS_M};

    fn offset_deg(meters: f64) -> f64 {
        meters / (EARTH_RADIUS_M * std::f64::consts::PI / 180.0)
    }

    #[test]
    fn test_empty_index() {
        let index = ProximityIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.query_radius(project(0.0, 0.0), 100.0).is_empty());
    }

    #[test]
    fn test_query_radius_includes_boundary_neighbours() {
        let points = vec![
            project(0.0, 0.0),
            project(offset_deg(3.0), 0.0),
            project(offset_deg(8.0), 0.0),
            project(offset_deg(20.0), 0.0),
        ];
        let index = ProximityIndex::build(&points);

        let mut hits = index.query_radius(project(0.0, 0.0), 15.0);
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1, 2]);
    }

    #[test]
    fn test_query_radius_far_from_all_points() {
        let points = vec![project(0.0, 0.0), project(0.001, 0.001)];
        let index = ProximityIndex::build(&points);
        assert!(index.query_radius(project(1.0, 1.0), 15.0).is_empty());
    }
}
