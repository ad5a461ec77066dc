#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the grid tactics engine.
//!
//! This crate defines the vocabulary that connects the search engine, the
//! terrain analysers, the decision engine and the host loop. Grids are
//! rectangular matrices of [`Tile`] codes addressed by [`Point`] values,
//! combatants carry a roster of [`Action`]s, and every system consumes these
//! types read-only apart from the explicit life mutators on [`Combatant`].

use std::cmp::Ordering;

use bitflags::bitflags;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Life assigned to freshly created combatants.
pub const DEFAULT_MAX_LIFE: i32 = 20;

/// Percentage of damage jitter applied when an action does not specify one.
pub const DEFAULT_VARIATION: u32 = 8;

/// Integer grid coordinate.
///
/// Points order row-major (`y` first, then `x`) so that collections keyed by
/// point iterate in the same order regardless of how they were filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column of the point.
    pub x: i32,
    /// Row of the point.
    pub y: i32,
}

impl Point {
    /// Creates a new point from column and row coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Computes the Manhattan distance between two points.
    #[must_use]
    pub fn manhattan_distance(self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns the adjacent point one step away in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Point {
        let (dx, dy) = direction.offset();
        Point::new(self.x + dx, self.y + dy)
    }

    /// Iterates over the four cardinal neighbours in a fixed order.
    ///
    /// Neighbours are not bounds checked.
    pub fn cardinal_neighbors(self) -> impl Iterator<Item = Point> {
        Direction::ALL
            .into_iter()
            .map(move |direction| self.step(direction))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cardinal directions available to movement on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward increasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in the order neighbours are expanded by searches.
    pub const ALL: [Direction; 4] = [
        Direction::South,
        Direction::North,
        Direction::East,
        Direction::West,
    ];

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Direction of a single step from `from` to `to`, if the points are adjacent.
    #[must_use]
    pub fn between(from: Point, to: Point) -> Option<Direction> {
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Some(Self::North),
            (1, 0) => Some(Self::East),
            (0, 1) => Some(Self::South),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }

    /// Side of `to` through which a mover coming from `from` enters.
    ///
    /// A mover stepping south enters its destination from the north side.
    #[must_use]
    pub fn entry_side(from: Point, to: Point) -> Option<Direction> {
        Self::between(from, to).map(Direction::opposite)
    }

    /// Single-direction set matching this direction.
    #[must_use]
    pub const fn as_set(self) -> DirectionSet {
        match self {
            Self::North => DirectionSet::NORTH,
            Self::East => DirectionSet::EAST,
            Self::South => DirectionSet::SOUTH,
            Self::West => DirectionSet::WEST,
        }
    }
}

bitflags! {
    /// Set of cardinal directions.
    ///
    /// Used by directional conditions to list the sides a tile may be
    /// entered from.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DirectionSet: u8 {
        /// Entry from the northern neighbour.
        const NORTH = 1;
        /// Entry from the eastern neighbour.
        const EAST = 2;
        /// Entry from the southern neighbour.
        const SOUTH = 4;
        /// Entry from the western neighbour.
        const WEST = 8;
    }
}

impl DirectionSet {
    /// Reports whether the set includes the provided direction.
    #[must_use]
    pub const fn allows(self, direction: Direction) -> bool {
        self.contains(direction.as_set())
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DirectionSet::empty(), |set, direction| {
                set | direction.as_set()
            })
    }
}

/// Terrain code stored in a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tile(u32);

impl Tile {
    /// Conventional code for walkable terrain.
    pub const WALKABLE: Tile = Tile(0);
    /// Conventional code for blocked terrain.
    pub const BLOCKED: Tile = Tile(1);

    /// Wraps a raw tile code.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Retrieves the raw tile code.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Errors raised while constructing or mutating a [`Grid`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The grid has no rows or its first row has no columns.
    #[error("grid must contain at least one row and one column")]
    Empty,
    /// A row length differs from the first row.
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        /// Index of the offending row.
        row: usize,
        /// Width established by the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// The addressed point lies outside the grid.
    #[error("point ({}, {}) lies outside the grid", point.x, point.y)]
    OutOfBounds {
        /// Point that failed the bounds check.
        point: Point,
    },
}

/// Dense rectangular matrix of tile codes stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid of the provided dimensions with every cell set to `tile`.
    ///
    /// Returns [`GridError::Empty`] when either dimension is zero.
    pub fn filled(width: u32, height: u32, tile: Tile) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::Empty);
        }

        let cell_count =
            usize::try_from(u64::from(width) * u64::from(height)).map_err(|_| GridError::Empty)?;
        Ok(Self {
            width,
            height,
            tiles: vec![tile; cell_count],
        })
    }

    /// Builds a grid from raw tile codes, one inner vector per row.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, GridError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(GridError::Empty);
        }

        let mut tiles = Vec::with_capacity(expected * rows.len());
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(GridError::Ragged {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
            tiles.extend(cells.iter().copied().map(Tile::new));
        }

        let width = u32::try_from(expected).map_err(|_| GridError::Empty)?;
        let height = u32::try_from(rows.len()).map_err(|_| GridError::Empty)?;
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the point lies within `[0, width-1] x [0, height-1]`.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.index(point).is_some()
    }

    /// Tile stored at the provided point, if it lies within the grid.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<Tile> {
        self.index(point)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Overwrites the tile at the provided point, returning the previous tile.
    pub fn set(&mut self, point: Point, tile: Tile) -> Result<Tile, GridError> {
        let slot = self
            .index(point)
            .and_then(|index| self.tiles.get_mut(index))
            .ok_or(GridError::OutOfBounds { point })?;
        Ok(std::mem::replace(slot, tile))
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Point, Tile)> + '_ {
        let width = usize::try_from(self.width).unwrap_or(usize::MAX);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let x = i32::try_from(index % width).unwrap_or(i32::MAX);
            let y = i32::try_from(index / width).unwrap_or(i32::MAX);
            (Point::new(x, y), *tile)
        })
    }

    fn index(&self, point: Point) -> Option<usize> {
        let x = u32::try_from(point.x).ok()?;
        let y = u32::try_from(point.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(y).ok()?;
        let column = usize::try_from(x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Unique identifier assigned to a combatant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(u32);

impl CombatantId {
    /// Creates a new combatant identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of the team a combatant fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(u32);

impl TeamId {
    /// Creates a new team identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Ability a combatant can use against a target.
///
/// `damage` is signed: negative values harm the target, positive values heal
/// it. `variation` is the percentage of jitter applied when the action is
/// rolled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Distance from the user at which the action can be aimed.
    #[serde(default = "default_action_distance")]
    pub distance: u32,
    /// Area-of-effect radius around the aimed point.
    #[serde(default)]
    pub zone: u32,
    /// Signed life change applied to the target.
    pub damage: i32,
    /// Percentage of jitter applied to `damage` when rolled.
    #[serde(default = "default_variation")]
    pub variation: u32,
}

fn default_action_distance() -> u32 {
    1
}

fn default_variation() -> u32 {
    DEFAULT_VARIATION
}

impl Action {
    /// Creates a single-target action with the default variation.
    #[must_use]
    pub const fn new(distance: u32, damage: i32) -> Self {
        Self {
            distance,
            zone: 0,
            damage,
            variation: DEFAULT_VARIATION,
        }
    }

    /// Returns a copy of the action with the provided area-of-effect radius.
    #[must_use]
    pub const fn with_zone(mut self, zone: u32) -> Self {
        self.zone = zone;
        self
    }

    /// Returns a copy of the action with the provided variation percentage.
    #[must_use]
    pub const fn with_variation(mut self, variation: u32) -> Self {
        self.variation = variation;
        self
    }

    /// Furthest distance at which the action affects anything: `distance + zone`.
    #[must_use]
    pub const fn full_distance(&self) -> u32 {
        self.distance.saturating_add(self.zone)
    }

    /// Reports whether the action removes life.
    #[must_use]
    pub const fn is_harmful(&self) -> bool {
        self.damage < 0
    }

    /// Reports whether the action restores life.
    #[must_use]
    pub const fn is_healing(&self) -> bool {
        self.damage > 0
    }

    /// Largest deviation from `damage` a roll may produce.
    ///
    /// The signed product `damage * variation / 100` is floored before its
    /// magnitude is taken, so any harmful action varies by at least one while
    /// small heals may roll exactly.
    #[must_use]
    pub fn variation_span(&self) -> i32 {
        let span = (i64::from(self.damage) * i64::from(self.variation))
            .div_euclid(100)
            .unsigned_abs();
        i32::try_from(span).unwrap_or(i32::MAX)
    }

    /// Draws the effective life change uniformly from `damage ± variation_span`.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> DamageRoll {
        let span = self.variation_span();
        let low = self.damage.saturating_sub(span);
        let high = self.damage.saturating_add(span);
        DamageRoll {
            damage: rng.gen_range(low..=high),
        }
    }
}

/// Outcome of rolling an [`Action`]; the signed life change to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    /// Signed life change: negative harms, positive heals.
    pub damage: i32,
}

/// Participant in the skirmish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combatant {
    id: CombatantId,
    team: TeamId,
    position: Point,
    walk: u32,
    jump: u32,
    life: i32,
    max_life: i32,
    actions: Vec<Action>,
}

impl Combatant {
    /// Creates a combatant at full default life.
    #[must_use]
    pub fn new(
        id: CombatantId,
        team: TeamId,
        position: Point,
        walk: u32,
        jump: u32,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            id,
            team,
            position,
            walk,
            jump,
            life: DEFAULT_MAX_LIFE,
            max_life: DEFAULT_MAX_LIFE,
            actions,
        }
    }

    /// Returns the combatant with both life and maximum life set to `max_life`.
    #[must_use]
    pub fn with_max_life(mut self, max_life: i32) -> Self {
        self.max_life = max_life.max(0);
        self.life = self.max_life;
        self
    }

    /// Identifier of the combatant.
    #[must_use]
    pub const fn id(&self) -> CombatantId {
        self.id
    }

    /// Team the combatant belongs to.
    #[must_use]
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Cell the combatant currently occupies.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Moves the combatant to a new cell.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Movement budget per round.
    #[must_use]
    pub const fn walk(&self) -> u32 {
        self.walk
    }

    /// Vertical mobility; unused by searches but part of threat estimates.
    #[must_use]
    pub const fn jump(&self) -> u32 {
        self.jump
    }

    /// Remaining life.
    #[must_use]
    pub const fn life(&self) -> i32 {
        self.life
    }

    /// Maximum life.
    #[must_use]
    pub const fn max_life(&self) -> i32 {
        self.max_life
    }

    /// Sets remaining life, clamped to `[0, max_life]`.
    pub fn set_life(&mut self, life: i32) {
        self.life = life.clamp(0, self.max_life);
    }

    /// Adds a signed amount to remaining life, clamped to `[0, max_life]`.
    pub fn add_life(&mut self, delta: i32) {
        self.set_life(self.life.saturating_add(delta));
    }

    /// Applies a rolled action to the combatant and returns the roll.
    pub fn apply_roll(&mut self, roll: DamageRoll) -> DamageRoll {
        self.add_life(roll.damage);
        roll
    }

    /// Reports whether the combatant has no life left.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.life <= 0
    }

    /// Reports whether both combatants fight for the same team.
    #[must_use]
    pub fn is_ally(&self, other: &Combatant) -> bool {
        self.team == other.team
    }

    /// Actions available to the combatant.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Highest `full_distance` across all actions, or zero without actions.
    #[must_use]
    pub fn max_action_distance(&self) -> u32 {
        self.actions
            .iter()
            .map(Action::full_distance)
            .max()
            .unwrap_or(0)
    }
}
