// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash for tolerance-based point snapping.
//!
//! Space is divided into cubic cells of side `cell_size`; lookups scan the
//! 3x3x3 neighbourhood of the query cell. Stored items are plain indices
//! into a caller-owned point list.

use rustc_hash::FxHashMap;

use fabric_core::Point;

/// Smallest cell edge, keeps zero tolerances from collapsing the grid.
const MIN_CELL_SIZE: f64 = 1e-10;

/// Cell coordinates are clamped to this magnitude so neighbour offsets never overflow.
const MAX_CELL_COORD: f64 = (1_i64 << 52) as f64;

#[derive(Debug)]
pub struct SpatialIndex {
    cell_size: f64,
    grid: FxHashMap<(i64, i64, i64), Vec<usize>>,
    points: Vec<Point>,
}

impl SpatialIndex {
    /// `cell_size` should be >= the tolerance used for queries.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(MIN_CELL_SIZE),
            grid: FxHashMap::default(),
            points: Vec::new(),
        }
    }

    /// Inserts a point and returns its index.
    pub fn insert(&mut self, point: Point) -> usize {
        let index = self.points.len();
        let cell = self.cell_coords(&point);
        self.grid.entry(cell).or_default().push(index);
        self.points.push(point);
        index
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest stored point within `tolerance` of `point`, as an index.
    ///
    /// Ties resolve to the earliest inserted point.
    pub fn nearest_within(&self, point: &Point, tolerance: f64) -> Option<usize> {
        let (cx, cy, cz) = self.cell_coords(point);
        let tol_sq = tolerance * tolerance;
        let reach = (tolerance / self.cell_size).ceil().max(1.0) as i64;
        let mut best: Option<(usize, f64)> = None;

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let cell = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    let Some(items) = self.grid.get(&cell) else {
                        continue;
                    };
                    for &i in items {
                        let d = self.points[i].distance_squared(point);
                        if d > tol_sq {
                            continue;
                        }
                        match best {
                            Some((bi, bd)) if bd < d || (bd == d && bi < i) => {}
                            _ => best = Some((i, d)),
                        }
                    }
                }
            }
        }
        best.map(|(i, _)| i)
    }

    fn cell_coords(&self, p: &Point) -> (i64, i64, i64) {
        (
            self.cell_coord(p.x),
            self.cell_coord(p.y),
            self.cell_coord(p.z),
        )
    }

    fn cell_coord(&self, v: f64) -> i64 {
        (v / self.cell_size)
            .floor()
            .clamp(-MAX_CELL_COORD, MAX_CELL_COORD) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nearest_within_tolerance() {
        let mut idx = SpatialIndex::new(0.1);
        idx.insert(Point::new(0.0, 0.0, 0.0));
        idx.insert(Point::new(0.05, 0.0, 0.0));
        idx.insert(Point::new(5.0, 0.0, 0.0));
        assert_eq!(idx.nearest_within(&Point::new(0.04, 0.0, 0.0), 0.1), Some(1));
        assert_eq!(idx.nearest_within(&Point::new(0.01, 0.0, 0.0), 0.1), Some(0));
        assert_eq!(idx.nearest_within(&Point::new(1.0, 0.0, 0.0), 0.1), None);
    }

    #[test]
    fn boundary_cells_are_searched() {
        let mut idx = SpatialIndex::new(1.0);
        idx.insert(Point::new(0.99, 0.0, 0.0));
        assert_eq!(idx.nearest_within(&Point::new(1.01, 0.0, 0.0), 0.05), Some(0));
    }

    #[test]
    fn zero_tolerance_matches_exact_point() {
        let mut idx = SpatialIndex::new(0.0);
        idx.insert(Point::new(2.0, 3.0, 4.0));
        assert_eq!(idx.nearest_within(&Point::new(2.0, 3.0, 4.0), 0.0), Some(0));
        assert_eq!(idx.nearest_within(&Point::new(2.0, 3.0, 4.000_1), 0.0), None);
    }

    #[test]
    fn far_coordinates_with_zero_tolerance() {
        let mut idx = SpatialIndex::new(0.0);
        let northing = Point::new(5e9, 0.0, 0.0);
        idx.insert(northing);
        idx.insert(Point::new(-7e12, 3e11, 0.0));
        assert_eq!(idx.nearest_within(&northing, 0.0), Some(0));
        assert_eq!(idx.nearest_within(&Point::new(-7e12, 3e11, 0.0), 0.0), Some(1));
        assert_eq!(idx.nearest_within(&Point::new(5e9 + 1.0, 0.0, 0.0), 0.0), None);
    }
}
