#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted grid search engine.
//!
//! [`PathFinder`] answers three kinds of queries over a borrowed [`Grid`]:
//! point-to-point weighted A* ([`PathFinder::find_path`]), cost-bounded flood
//! fill with optional geometric extension ([`PathFinder::find_zone`]) and pure
//! Manhattan radius enumeration ([`PathFinder::cover_zone`]). Configuration
//! such as walkable tiles, costs, avoided points and directional conditions
//! persists across queries until changed.

mod instance;
mod node;
mod zone;

use std::collections::{BTreeSet, HashMap, HashSet};

use grid_tactics_core::{Direction, DirectionSet, Grid, Point, Tile};
use thiserror::Error;
use tracing::{debug, trace};

use crate::instance::Instance;
pub use crate::node::{Node, NodeId, NodeList};
pub use crate::zone::{ExtendedZone, ExtendedZonePoint, Zone};

/// Cost of entering a tile whose code has no explicit cost.
pub const DEFAULT_TILE_COST: u32 = 1;

/// Lowest accepted entry cost; keeps the Manhattan heuristic admissible.
pub const MIN_COST: u32 = 1;

/// Failures raised by misconfigured engines or invalid query points.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// No walkable tile codes were configured.
    #[error("acceptable tiles must be set before searching")]
    MissingAcceptableTiles,
    /// No grid was configured.
    #[error("a grid must be set before searching")]
    MissingGrid,
    /// A query point lies outside the grid.
    #[error("point ({}, {}) lies outside the grid", point.x, point.y)]
    OutOfBounds {
        /// Offending point.
        point: Point,
    },
}

impl SearchError {
    /// Reports whether the error stems from missing engine configuration.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingAcceptableTiles | Self::MissingGrid)
    }
}

/// Reason a path search stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchStatus {
    /// The destination was reached.
    Found,
    /// Start and end are the same point; the path is empty.
    SameTile,
    /// The destination tile is not walkable; no search ran.
    BlockedDestination,
    /// The open list ran dry before reaching the destination.
    Exhausted,
    /// The iteration cap stopped the search with nodes still open.
    IterationCapReached,
}

/// Result of [`PathFinder::find_path`].
#[derive(Clone, Debug)]
pub struct FindPath {
    /// Nodes from start to end inclusive, empty for identical endpoints,
    /// `None` when no path exists.
    pub path: Option<Vec<Node>>,
    /// Every node the search touched.
    pub explored: Zone,
    /// Why the search stopped.
    pub status: SearchStatus,
    /// Number of nodes popped from the open list.
    pub iterations: u32,
}

/// Result of [`PathFinder::find_zone`].
#[derive(Clone, Debug)]
pub struct FindZone {
    /// Nodes reached by the flood fill.
    pub zone: Zone,
    /// Geometric extension of the zone; `None` when no extension was requested.
    pub extended_zone: Option<ExtendedZone>,
    /// Number of nodes popped from the open list.
    pub iterations: u32,
}

/// Configurable weighted search over a tile grid.
#[derive(Clone, Debug, Default)]
pub struct PathFinder {
    grid: Option<Grid>,
    acceptable_tiles: BTreeSet<Tile>,
    tile_costs: HashMap<Tile, u32>,
    point_costs: HashMap<Point, u32>,
    avoided_points: HashSet<Point>,
    directional_conditions: HashMap<Point, DirectionSet>,
    iteration_cap: Option<u32>,
}

impl PathFinder {
    /// Creates an engine with no grid and no walkable tiles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the set of walkable tile codes.
    pub fn set_acceptable_tiles<I>(&mut self, tiles: I)
    where
        I: IntoIterator<Item = Tile>,
    {
        self.acceptable_tiles = tiles.into_iter().collect();
    }

    /// Walkable tile codes.
    #[must_use]
    pub fn acceptable_tiles(&self) -> &BTreeSet<Tile> {
        &self.acceptable_tiles
    }

    /// Replaces the working grid, giving unseen tile codes the default cost.
    pub fn set_grid(&mut self, grid: Grid) {
        for (_, tile) in grid.cells() {
            let _ = self.tile_costs.entry(tile).or_insert(DEFAULT_TILE_COST);
        }
        self.grid = Some(grid);
    }

    /// Working grid, if one has been set.
    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    /// Overwrites a single grid cell and returns the tile it replaced.
    pub fn set_point_value(&mut self, point: Point, tile: Tile) -> Result<Tile, SearchError> {
        let grid = self.grid.as_mut().ok_or(SearchError::MissingGrid)?;
        let previous = grid
            .set(point, tile)
            .map_err(|_| SearchError::OutOfBounds { point })?;
        let _ = self.tile_costs.entry(tile).or_insert(DEFAULT_TILE_COST);
        Ok(previous)
    }

    /// Sets the cost of entering tiles with the provided code; zero is raised to one.
    pub fn set_tile_cost(&mut self, tile: Tile, cost: u32) {
        let _ = self.tile_costs.insert(tile, cost.max(MIN_COST));
    }

    /// Cost of entering tiles with the provided code.
    #[must_use]
    pub fn tile_cost(&self, tile: Tile) -> u32 {
        self.tile_costs
            .get(&tile)
            .copied()
            .unwrap_or(DEFAULT_TILE_COST)
    }

    /// Sets a cost for entering one point, overriding its tile cost; zero is raised to one.
    pub fn set_additional_point_cost(&mut self, point: Point, cost: u32) {
        let _ = self.point_costs.insert(point, cost.max(MIN_COST));
    }

    /// Cost override of one point, if any.
    #[must_use]
    pub fn additional_point_cost(&self, point: Point) -> Option<u32> {
        self.point_costs.get(&point).copied()
    }

    /// Removes the cost override of one point.
    pub fn remove_additional_point_cost(&mut self, point: Point) {
        let _ = self.point_costs.remove(&point);
    }

    /// Removes every point cost override.
    pub fn remove_all_additional_point_costs(&mut self) {
        self.point_costs.clear();
    }

    /// Restricts the sides from which `point` may be entered.
    pub fn set_directional_condition(&mut self, point: Point, allowed: DirectionSet) {
        let _ = self.directional_conditions.insert(point, allowed);
    }

    /// Lifts the entry restriction of one point.
    pub fn remove_directional_condition(&mut self, point: Point) {
        let _ = self.directional_conditions.remove(&point);
    }

    /// Lifts every entry restriction.
    pub fn remove_all_directional_conditions(&mut self) {
        self.directional_conditions.clear();
    }

    /// Bounds the number of open-list pops per query; `None` removes the bound.
    pub fn set_iteration_cap(&mut self, cap: Option<u32>) {
        self.iteration_cap = cap;
    }

    /// Current iteration bound.
    #[must_use]
    pub const fn iteration_cap(&self) -> Option<u32> {
        self.iteration_cap
    }

    /// Blocks a point regardless of its tile.
    pub fn avoid_additional_point(&mut self, point: Point) {
        let _ = self.avoided_points.insert(point);
    }

    /// Unblocks a previously avoided point.
    pub fn stop_avoiding_additional_point(&mut self, point: Point) {
        let _ = self.avoided_points.remove(&point);
    }

    /// Unblocks every avoided point.
    pub fn stop_avoiding_all_additional_points(&mut self) {
        self.avoided_points.clear();
    }

    /// Clears the avoided points and installs the provided ones instead.
    pub fn replace_avoided_points<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = Point>,
    {
        self.avoided_points.clear();
        self.avoided_points.extend(points);
    }

    /// Reports whether a point is currently avoided.
    #[must_use]
    pub fn is_avoided(&self, point: Point) -> bool {
        self.avoided_points.contains(&point)
    }

    /// Reports whether a point falls outside the grid; always true without one.
    #[must_use]
    pub fn point_is_out_of_grid(&self, point: Point) -> bool {
        self.grid.as_ref().map_or(true, |grid| !grid.contains(point))
    }

    /// Finds the cheapest path from `start` to `end` with weighted A*.
    pub fn find_path(&self, start: Point, end: Point) -> Result<FindPath, SearchError> {
        let grid = self.configured_grid()?;
        for point in [start, end] {
            if !grid.contains(point) {
                return Err(SearchError::OutOfBounds { point });
            }
        }

        if start == end {
            return Ok(FindPath {
                path: Some(Vec::new()),
                explored: Zone::default(),
                status: SearchStatus::SameTile,
                iterations: 0,
            });
        }

        if !grid.get(end).is_some_and(|tile| self.acceptable_tiles.contains(&tile)) {
            return Ok(FindPath {
                path: None,
                explored: Zone::default(),
                status: SearchStatus::BlockedDestination,
                iterations: 0,
            });
        }

        let mut instance = Instance::new(Some(end));
        let _ = instance.open(start, 0, None);

        let mut iterations = 0_u32;
        let mut reached = None;
        let mut status = SearchStatus::Exhausted;
        loop {
            if self.iteration_cap.is_some_and(|cap| iterations >= cap) {
                if instance.has_open_nodes() {
                    status = SearchStatus::IterationCapReached;
                    trace!(iterations, "iteration cap stopped path search");
                }
                break;
            }

            let Some(current) = instance.pop() else {
                break;
            };
            iterations += 1;

            if instance.node(current).is_some_and(|node| node.point == end) {
                reached = Some(current);
                status = SearchStatus::Found;
                break;
            }

            instance.close(current);
            self.check_adjacent_nodes(grid, &mut instance, current);
        }

        let explored = instance.into_zone();
        let path = reached.map(|id| explored.build_path(id));
        debug!(
            ?start,
            ?end,
            ?status,
            iterations,
            explored = explored.len(),
            "path search finished"
        );

        Ok(FindPath {
            path,
            explored,
            status,
            iterations,
        })
    }

    /// Floods outward from `start`, expanding nodes whose cost is below `max_cost`.
    ///
    /// Nodes discovered from an expanded node stay in the zone even when their
    /// own cost reaches or exceeds the budget; use [`Zone::within`] to slice.
    /// A non-zero `extension` grows the result by that many geometric rings.
    pub fn find_zone(
        &self,
        start: Point,
        max_cost: u32,
        extension: u32,
    ) -> Result<FindZone, SearchError> {
        let grid = self.configured_grid()?;
        if !grid.contains(start) {
            return Err(SearchError::OutOfBounds { point: start });
        }

        let mut instance = Instance::new(None);
        let _ = instance.open(start, 0, None);

        let mut iterations = 0_u32;
        loop {
            if self.iteration_cap.is_some_and(|cap| iterations >= cap) {
                trace!(iterations, "iteration cap stopped zone search");
                break;
            }

            let Some(current) = instance.pop() else {
                break;
            };
            iterations += 1;

            instance.close(current);
            if instance.node(current).is_some_and(|node| node.cost < max_cost) {
                self.check_adjacent_nodes(grid, &mut instance, current);
            }
        }

        let zone = instance.into_zone();
        let extended_zone = (extension > 0).then(|| self.extend_zone(&zone, extension));
        debug!(
            ?start,
            max_cost,
            extension,
            iterations,
            zone = zone.len(),
            "zone search finished"
        );

        Ok(FindZone {
            zone,
            extended_zone,
            iterations,
        })
    }

    /// Enumerates the in-grid points within Manhattan distance `radius` of `center`.
    ///
    /// Walkability is ignored; each node's cost is its distance to `center`.
    pub fn cover_zone(&self, center: Point, radius: u32) -> Result<Zone, SearchError> {
        let grid = self.grid.as_ref().ok_or(SearchError::MissingGrid)?;
        if !grid.contains(center) {
            return Err(SearchError::OutOfBounds { point: center });
        }

        let reach = i64::from(radius);
        let (x, y) = (i64::from(center.x), i64::from(center.y));
        let last_x = i64::from(grid.width()) - 1;
        let last_y = i64::from(grid.height()) - 1;

        let mut nodes = Vec::new();
        for row in (y - reach).max(0)..=(y + reach).min(last_y) {
            let remaining = reach - (row - y).abs();
            for column in (x - remaining).max(0)..=(x + remaining).min(last_x) {
                let (Ok(column), Ok(row)) = (i32::try_from(column), i32::try_from(row)) else {
                    continue;
                };
                let point = Point::new(column, row);
                nodes.push(Node {
                    point,
                    cost: point.manhattan_distance(center),
                    heuristic: 0,
                    parent: None,
                    list: NodeList::Unvisited,
                });
            }
        }

        Ok(Zone::from_nodes(nodes))
    }

    /// Grows a zone by `rings` cardinal steps, ignoring walkability and cost.
    #[must_use]
    pub fn extend_zone(&self, zone: &Zone, rings: u32) -> ExtendedZone {
        let mut extended = ExtendedZone::seeded(zone);
        for ring in 1..=rings {
            extended.grow(ring, |point| !self.point_is_out_of_grid(point));
        }
        extended
    }

    fn configured_grid(&self) -> Result<&Grid, SearchError> {
        if self.acceptable_tiles.is_empty() {
            return Err(SearchError::MissingAcceptableTiles);
        }
        self.grid.as_ref().ok_or(SearchError::MissingGrid)
    }

    fn check_adjacent_nodes(&self, grid: &Grid, instance: &mut Instance, current: NodeId) {
        let Some(&source) = instance.node(current) else {
            return;
        };

        for neighbor in source.point.cardinal_neighbors() {
            if !self.can_enter(grid, source.point, neighbor) {
                continue;
            }

            let cost = source.cost.saturating_add(self.entry_cost(grid, neighbor));
            match instance.node_at(neighbor) {
                None => {
                    let _ = instance.open(neighbor, cost, Some(current));
                }
                Some(existing) => {
                    let _ = instance.relax(existing, cost, current);
                }
            }
        }
    }

    fn can_enter(&self, grid: &Grid, from: Point, to: Point) -> bool {
        let Some(tile) = grid.get(to) else {
            return false;
        };
        if self.avoided_points.contains(&to) {
            return false;
        }
        if let Some(allowed) = self.directional_conditions.get(&to) {
            let permitted =
                Direction::entry_side(from, to).is_some_and(|side| allowed.allows(side));
            if !permitted {
                return false;
            }
        }
        self.acceptable_tiles.contains(&tile)
    }

    fn entry_cost(&self, grid: &Grid, point: Point) -> u32 {
        if let Some(cost) = self.point_costs.get(&point) {
            return *cost;
        }
        grid.get(point)
            .map_or(DEFAULT_TILE_COST, |tile| self.tile_cost(tile))
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeList, PathFinder, SearchError, SearchStatus};
    use grid_tactics_core::{Grid, Point, Tile};

    fn open_finder(width: u32, height: u32) -> PathFinder {
        let mut finder = PathFinder::new();
        finder.set_acceptable_tiles([Tile::WALKABLE]);
        finder.set_grid(Grid::filled(width, height, Tile::WALKABLE).expect("valid grid"));
        finder
    }

    #[test]
    fn configuration_errors_are_classified() {
        let finder = PathFinder::new();
        let error = finder
            .find_path(Point::new(0, 0), Point::new(1, 0))
            .expect_err("unconfigured engine");
        assert_eq!(error, SearchError::MissingAcceptableTiles);
        assert!(error.is_configuration());

        let mut finder = PathFinder::new();
        finder.set_acceptable_tiles([Tile::WALKABLE]);
        assert_eq!(
            finder.find_zone(Point::new(0, 0), 2, 0).map(|_| ()),
            Err(SearchError::MissingGrid)
        );
        assert!(!SearchError::OutOfBounds {
            point: Point::new(0, 0)
        }
        .is_configuration());
    }

    #[test]
    fn set_point_value_returns_previous_tile() {
        let mut finder = open_finder(3, 3);
        let previous = finder
            .set_point_value(Point::new(1, 1), Tile::new(7))
            .expect("in bounds");
        assert_eq!(previous, Tile::WALKABLE);
        assert_eq!(finder.tile_cost(Tile::new(7)), 1);
        assert_eq!(
            finder.set_point_value(Point::new(3, 0), Tile::WALKABLE),
            Err(SearchError::OutOfBounds {
                point: Point::new(3, 0)
            })
        );
    }

    #[test]
    fn set_grid_keeps_existing_tile_costs() {
        let mut finder = PathFinder::new();
        finder.set_tile_cost(Tile::new(2), 5);
        finder.set_grid(Grid::from_rows(vec![vec![0, 2]]).expect("valid grid"));
        assert_eq!(finder.tile_cost(Tile::new(2)), 5);
        assert_eq!(finder.tile_cost(Tile::WALKABLE), 1);
    }

    #[test]
    fn zero_costs_are_raised_to_one() {
        let mut finder = open_finder(3, 1);
        finder.set_tile_cost(Tile::new(4), 0);
        finder.set_additional_point_cost(Point::new(1, 0), 0);
        assert_eq!(finder.tile_cost(Tile::new(4)), 1);
        assert_eq!(finder.additional_point_cost(Point::new(1, 0)), Some(1));

        let result = finder
            .find_path(Point::new(0, 0), Point::new(2, 0))
            .expect("configured");
        let cost = result
            .path
            .and_then(|path| path.last().map(|node| node.cost));
        assert_eq!(cost, Some(2));
    }

    #[test]
    fn cover_zone_is_bounded_by_the_grid() {
        let finder = open_finder(4, 4);
        let zone = finder
            .cover_zone(Point::new(1, 2), u32::MAX)
            .expect("configured");
        assert_eq!(zone.len(), 16);
        assert_eq!(zone.get(Point::new(3, 0)).map(|node| node.cost), Some(4));
    }

    #[test]
    fn zone_leaves_are_closed() {
        let finder = open_finder(5, 5);
        let found = finder
            .find_zone(Point::new(2, 2), 1, 0)
            .expect("configured");
        assert_eq!(found.zone.len(), 5);
        assert!(found
            .zone
            .iter()
            .all(|node| node.list == NodeList::Closed));
    }

    #[test]
    fn iteration_cap_stops_search() {
        let mut finder = open_finder(6, 6);
        finder.set_iteration_cap(Some(2));
        let result = finder
            .find_path(Point::new(0, 0), Point::new(5, 5))
            .expect("configured");
        assert!(result.path.is_none());
        assert_eq!(result.status, SearchStatus::IterationCapReached);
        assert_eq!(result.iterations, 2);
    }
}
