#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Terrain analysis built on top of the grid search engine.
//!
//! [`TerrainAnalyser`] binds one [`PathFinder`] to a walkability grid where
//! [`Tile::WALKABLE`] is the only acceptable code. Queries may start or end on
//! otherwise blocked cells: those cells are forced walkable for the duration
//! of the query and restored afterwards. [`MapsAnalyser`] derives influence
//! maps from the roster for hosts that want a coarse view of the battlefield.

mod influence;

use grid_tactics_core::{Grid, Point, Tile};
use grid_tactics_system_pathfinder::{FindPath, FindZone, PathFinder, SearchError, Zone};
use tracing::trace;

pub use crate::influence::{convert_range, InfluenceMap, InfluenceTuning, MapsAnalyser};

/// Search facade bound to one walkability grid.
#[derive(Clone, Debug)]
pub struct TerrainAnalyser {
    path_finder: PathFinder,
}

impl TerrainAnalyser {
    /// Creates an analyser over the provided walkability grid.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        let mut path_finder = PathFinder::new();
        path_finder.set_acceptable_tiles([Tile::WALKABLE]);
        path_finder.set_grid(grid);
        Self { path_finder }
    }

    /// Rebinds the analyser to a new walkability grid.
    pub fn set_grid(&mut self, grid: Grid) {
        self.path_finder.set_grid(grid);
    }

    /// Grid the analyser currently searches.
    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.path_finder.grid()
    }

    /// Underlying search engine.
    #[must_use]
    pub fn path_finder(&self) -> &PathFinder {
        &self.path_finder
    }

    /// Mutable access to the search engine, used to configure obstacles and costs.
    pub fn path_finder_mut(&mut self) -> &mut PathFinder {
        &mut self.path_finder
    }

    /// Finds a path, treating both endpoints as walkable for this query only.
    pub fn find_path(&mut self, start: Point, end: Point) -> Result<FindPath, SearchError> {
        self.with_walkable(&[start, end], |finder| finder.find_path(start, end))
    }

    /// Finds the zone reachable within `distance`, treating `start` as walkable.
    pub fn find_zone(
        &mut self,
        start: Point,
        distance: u32,
        extension: u32,
    ) -> Result<FindZone, SearchError> {
        self.with_walkable(&[start], |finder| {
            finder.find_zone(start, distance, extension)
        })
    }

    /// Enumerates every in-grid point within `distance` of `start`.
    pub fn cover_zone(&self, start: Point, distance: u32) -> Result<Zone, SearchError> {
        self.path_finder.cover_zone(start, distance)
    }

    fn with_walkable<T, F>(&mut self, points: &[Point], query: F) -> Result<T, SearchError>
    where
        F: FnOnce(&PathFinder) -> Result<T, SearchError>,
    {
        let mut overrides = Vec::with_capacity(points.len());
        for &point in points {
            match self.path_finder.set_point_value(point, Tile::WALKABLE) {
                Ok(previous) => {
                    if previous != Tile::WALKABLE {
                        trace!(?point, tile = previous.get(), "forcing tile walkable");
                    }
                    overrides.push((point, previous));
                }
                Err(error) => {
                    self.restore(&overrides);
                    return Err(error);
                }
            }
        }

        let result = query(&self.path_finder);
        self.restore(&overrides);
        result
    }

    fn restore(&mut self, overrides: &[(Point, Tile)]) {
        for &(point, tile) in overrides.iter().rev() {
            let _ = self.path_finder.set_point_value(point, tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TerrainAnalyser;
    use grid_tactics_core::{Grid, Point, Tile};
    use grid_tactics_system_pathfinder::SearchError;

    #[test]
    fn failed_override_leaves_grid_untouched() {
        let grid = Grid::from_rows(vec![vec![1, 0], vec![0, 0]]).expect("valid grid");
        let mut analyser = TerrainAnalyser::new(grid.clone());

        let error = analyser
            .find_path(Point::new(0, 0), Point::new(3, 3))
            .expect_err("end outside grid");
        assert_eq!(
            error,
            SearchError::OutOfBounds {
                point: Point::new(3, 3)
            }
        );
        assert_eq!(analyser.grid(), Some(&grid));
        assert_eq!(analyser.grid().and_then(|g| g.get(Point::new(0, 0))), Some(Tile::BLOCKED));
    }
}
