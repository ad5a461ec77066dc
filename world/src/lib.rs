#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Battlefield state consumed by the grid tactics systems.
//!
//! The world owns the walkability [`Terrain`], the ordered combatant roster in
//! [`GameState`] and the [`Core`] aggregate that binds both to a
//! [`TerrainAnalyser`]. Systems read the roster through [`query`] and mutate
//! it only through [`GameState::apply_action`] and [`GameState::move_player`].

use grid_tactics_core::{
    Action, Combatant, CombatantId, DamageRoll, Grid, GridError, Point, TeamId, Tile,
};
use grid_tactics_system_terrain_analysis::TerrainAnalyser;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// One in this many generated cells is blocked.
const BLOCKED_CELL_ODDS: u32 = 8;

const GENERATED_DISTANCES: [u32; 5] = [1, 1, 2, 3, 4];
const GENERATED_ZONES: [u32; 5] = [0, 0, 0, 1, 2];

/// Failures raised while building or mutating the world.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// No combatant with the provided identifier exists.
    #[error("no combatant with id {}", id.get())]
    UnknownCombatant {
        /// Identifier that failed the lookup.
        id: CombatantId,
    },
    /// The terrain grid could not be built or mutated.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// Generation asked for more combatants than free walkable cells.
    #[error("cannot place {requested} combatants on {available} free cells")]
    NoRoom {
        /// Combatants requested.
        requested: usize,
        /// Walkable cells available.
        available: usize,
    },
}

/// Walkability layout of the battlefield.
///
/// Cells holding [`Tile::WALKABLE`] can be crossed; any other code blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terrain {
    walkable: Grid,
}

impl Terrain {
    /// Wraps an existing walkability grid.
    #[must_use]
    pub fn new(walkable: Grid) -> Self {
        Self { walkable }
    }

    /// Builds terrain from raw tile codes, one inner vector per row.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, WorldError> {
        Ok(Self::new(Grid::from_rows(rows)?))
    }

    /// Generates terrain where roughly one cell in eight is blocked.
    pub fn generate<R: Rng + ?Sized>(
        width: u32,
        height: u32,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        let mut walkable = Grid::filled(width, height, Tile::WALKABLE)?;
        let points: Vec<Point> = walkable.cells().map(|(point, _)| point).collect();
        for point in points {
            if rng.gen_ratio(1, BLOCKED_CELL_ODDS) {
                let _ = walkable.set(point, Tile::BLOCKED)?;
            }
        }
        Ok(Self::new(walkable))
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.walkable.width()
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.walkable.height()
    }

    /// Walkability grid handed to the terrain analyser.
    #[must_use]
    pub fn get_walkable_grid(&self) -> &Grid {
        &self.walkable
    }

    /// Reports whether the point lies in the grid and can be crossed.
    #[must_use]
    pub fn is_walkable(&self, point: Point) -> bool {
        self.walkable.get(point) == Some(Tile::WALKABLE)
    }

    /// Points that cannot be crossed, in row-major order.
    #[must_use]
    pub fn unwalkable_points(&self) -> Vec<Point> {
        self.walkable
            .cells()
            .filter(|(_, tile)| *tile != Tile::WALKABLE)
            .map(|(point, _)| point)
            .collect()
    }
}

/// Ordered roster of every combatant in the skirmish.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    players: Vec<Combatant>,
}

impl GameState {
    /// Creates a roster from combatants in turn order.
    #[must_use]
    pub fn new(players: Vec<Combatant>) -> Self {
        Self { players }
    }

    /// Generates `teams` teams of `per_team` combatants on distinct walkable cells.
    ///
    /// Each combatant walks 3 to 5 cells, jumps 1 or 2 and carries 2 or 3
    /// harmful actions whose reach trades off against damage.
    pub fn generate<R: Rng + ?Sized>(
        terrain: &Terrain,
        teams: u32,
        per_team: u32,
        rng: &mut R,
    ) -> Result<Self, WorldError> {
        let mut cells: Vec<Point> = terrain
            .get_walkable_grid()
            .cells()
            .filter(|(_, tile)| *tile == Tile::WALKABLE)
            .map(|(point, _)| point)
            .collect();
        let requested =
            usize::try_from(u64::from(teams) * u64::from(per_team)).unwrap_or(usize::MAX);
        if requested > cells.len() {
            return Err(WorldError::NoRoom {
                requested,
                available: cells.len(),
            });
        }
        cells.shuffle(rng);

        let mut players = Vec::with_capacity(requested);
        let mut cells = cells.into_iter();
        for team in 0..teams {
            for _ in 0..per_team {
                let Some(position) = cells.next() else {
                    break;
                };
                let id = CombatantId::new(u32::try_from(players.len()).unwrap_or(u32::MAX));
                let action_count = rng.gen_range(2..=3);
                let actions = (0..action_count).map(|_| generate_action(rng)).collect();
                players.push(Combatant::new(
                    id,
                    TeamId::new(team),
                    position,
                    rng.gen_range(3..=5),
                    rng.gen_range(1..=2),
                    actions,
                ));
            }
        }

        Ok(Self::new(players))
    }

    /// Every combatant in turn order, dead ones included.
    #[must_use]
    pub fn players(&self) -> &[Combatant] {
        &self.players
    }

    /// Combatant with the provided identifier.
    #[must_use]
    pub fn player(&self, id: CombatantId) -> Option<&Combatant> {
        self.players.iter().find(|player| player.id() == id)
    }

    /// Mutable access to the combatant with the provided identifier.
    pub fn player_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.players.iter_mut().find(|player| player.id() == id)
    }

    /// Combatants that still have life left, in turn order.
    pub fn living(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.players.iter().filter(|player| !player.is_dead())
    }

    /// Number of distinct teams with at least one living combatant.
    #[must_use]
    pub fn teams_alive(&self) -> usize {
        let mut teams: Vec<TeamId> = self.living().map(Combatant::team).collect();
        teams.sort_unstable();
        teams.dedup();
        teams.len()
    }

    /// Reports whether at most one team is still standing.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.teams_alive() <= 1
    }

    /// Rolls `action` against `target` and applies the signed result to its life.
    pub fn apply_action<R: Rng + ?Sized>(
        &mut self,
        target: CombatantId,
        action: &Action,
        rng: &mut R,
    ) -> Result<DamageRoll, WorldError> {
        let player = self
            .player_mut(target)
            .ok_or(WorldError::UnknownCombatant { id: target })?;
        Ok(player.apply_roll(action.roll(rng)))
    }

    /// Moves a combatant to a new cell.
    pub fn move_player(&mut self, id: CombatantId, position: Point) -> Result<(), WorldError> {
        let player = self
            .player_mut(id)
            .ok_or(WorldError::UnknownCombatant { id })?;
        player.set_position(position);
        Ok(())
    }
}

fn generate_action<R: Rng + ?Sized>(rng: &mut R) -> Action {
    let distance = GENERATED_DISTANCES.choose(rng).copied().unwrap_or(1);
    let zone = if distance > 1 {
        GENERATED_ZONES.choose(rng).copied().unwrap_or(0)
    } else {
        0
    };
    let strength = 4 - i32::try_from(distance).unwrap_or(4) + rng.gen_range(1..=3);
    Action::new(distance, -strength.max(1)).with_zone(zone)
}

/// Terrain, analyser and roster bundled for one skirmish.
#[derive(Clone, Debug)]
pub struct Core {
    terrain: Terrain,
    analyser: TerrainAnalyser,
    game_state: GameState,
}

impl Core {
    /// Binds a terrain analyser to the terrain and takes ownership of the roster.
    #[must_use]
    pub fn new(terrain: Terrain, game_state: GameState) -> Self {
        let analyser = TerrainAnalyser::new(terrain.get_walkable_grid().clone());
        Self {
            terrain,
            analyser,
            game_state,
        }
    }

    /// Walkability layout.
    #[must_use]
    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Terrain analyser bound to the walkability grid.
    #[must_use]
    pub fn analyser(&self) -> &TerrainAnalyser {
        &self.analyser
    }

    /// Mutable terrain analyser.
    pub fn analyser_mut(&mut self) -> &mut TerrainAnalyser {
        &mut self.analyser
    }

    /// Combatant roster.
    #[must_use]
    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Mutable combatant roster.
    pub fn game_state_mut(&mut self) -> &mut GameState {
        &mut self.game_state
    }

    /// Analyser and roster borrowed together for a planning call.
    pub fn parts_mut(&mut self) -> (&mut TerrainAnalyser, &GameState) {
        (&mut self.analyser, &self.game_state)
    }
}

/// Read-only helpers over the roster.
pub mod query {
    use grid_tactics_core::{Combatant, CombatantId, Point};

    /// Living combatants on a different team from `actor`, in roster order.
    pub fn living_opponents<'a>(
        players: &'a [Combatant],
        actor: &'a Combatant,
    ) -> impl Iterator<Item = &'a Combatant> + 'a {
        players
            .iter()
            .filter(move |player| !player.is_dead() && !actor.is_ally(player))
    }

    /// Cells held by living combatants other than `actor`.
    #[must_use]
    pub fn occupied_points(players: &[Combatant], actor: CombatantId) -> Vec<Point> {
        players
            .iter()
            .filter(|player| player.id() != actor && !player.is_dead())
            .map(Combatant::position)
            .collect()
    }

    /// Nearest living opponent by Manhattan distance; ties keep roster order.
    #[must_use]
    pub fn closest_opponent<'a>(
        players: &'a [Combatant],
        actor: &'a Combatant,
    ) -> Option<&'a Combatant> {
        let origin = actor.position();
        living_opponents(players, actor)
            .min_by_key(|candidate| candidate.position().manhattan_distance(origin))
    }
}

#[cfg(test)]
mod tests {
    use super::{query, Core, GameState, Terrain, WorldError};
    use grid_tactics_core::{Action, Combatant, CombatantId, Point, TeamId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn combatant(id: u32, team: u32, x: i32, y: i32) -> Combatant {
        Combatant::new(
            CombatantId::new(id),
            TeamId::new(team),
            Point::new(x, y),
            3,
            1,
            vec![Action::new(1, -5)],
        )
    }

    #[test]
    fn terrain_lists_unwalkable_points() {
        let terrain = Terrain::from_rows(vec![vec![0, 1], vec![2, 0]]).expect("valid rows");
        assert_eq!(
            terrain.unwalkable_points(),
            vec![Point::new(1, 0), Point::new(0, 1)]
        );
        assert!(terrain.is_walkable(Point::new(1, 1)));
        assert!(!terrain.is_walkable(Point::new(2, 1)));
    }

    #[test]
    fn generated_roster_uses_distinct_walkable_cells() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let terrain = Terrain::generate(8, 8, &mut rng).expect("non-empty terrain");
        let state = GameState::generate(&terrain, 2, 3, &mut rng).expect("enough room");

        assert_eq!(state.players().len(), 6);
        let mut positions: Vec<_> = state.players().iter().map(Combatant::position).collect();
        positions.sort();
        positions.dedup();
        assert_eq!(positions.len(), 6);
        for player in state.players() {
            assert!(terrain.is_walkable(player.position()));
            assert!((2..=3).contains(&player.actions().len()));
            assert!(player.actions().iter().all(Action::is_harmful));
        }
        assert_eq!(state.teams_alive(), 2);
    }

    #[test]
    fn generation_reports_missing_room() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let terrain = Terrain::from_rows(vec![vec![0, 1]]).expect("valid rows");
        assert_eq!(
            GameState::generate(&terrain, 2, 1, &mut rng),
            Err(WorldError::NoRoom {
                requested: 2,
                available: 1
            })
        );
    }

    #[test]
    fn apply_action_harms_target() {
        let mut state = GameState::new(vec![combatant(1, 0, 0, 0), combatant(2, 1, 1, 0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let action = Action::new(1, -5).with_variation(0);

        let roll = state
            .apply_action(CombatantId::new(2), &action, &mut rng)
            .expect("target exists");
        assert_eq!(roll.damage, -5);
        assert_eq!(state.player(CombatantId::new(2)).map(Combatant::life), Some(15));

        assert_eq!(
            state.apply_action(CombatantId::new(9), &action, &mut rng),
            Err(WorldError::UnknownCombatant {
                id: CombatantId::new(9)
            })
        );
    }

    #[test]
    fn closest_opponent_prefers_roster_order_on_ties() {
        let players = vec![
            combatant(1, 0, 2, 2),
            combatant(2, 1, 4, 2),
            combatant(3, 1, 0, 2),
            combatant(4, 0, 2, 3),
        ];
        let closest = query::closest_opponent(&players, &players[0]).expect("opponents exist");
        assert_eq!(closest.id(), CombatantId::new(2));
        assert_eq!(
            query::occupied_points(&players, CombatantId::new(1)),
            vec![Point::new(4, 2), Point::new(0, 2), Point::new(2, 3)]
        );
    }

    #[test]
    fn match_ends_with_one_team_standing() {
        let mut state = GameState::new(vec![combatant(1, 0, 0, 0), combatant(2, 1, 1, 0)]);
        assert!(!state.is_over());
        if let Some(player) = state.player_mut(CombatantId::new(2)) {
            player.set_life(0);
        }
        assert!(state.is_over());
        assert_eq!(state.living().count(), 1);
    }

    #[test]
    fn core_binds_analyser_to_terrain() {
        let terrain = Terrain::from_rows(vec![vec![0, 1, 0], vec![0, 0, 0]]).expect("rectangular");
        let state = GameState::new(vec![combatant(1, 0, 0, 0), combatant(2, 1, 2, 0)]);
        let mut core = Core::new(terrain, state);

        assert_eq!(core.analyser().grid(), Some(core.terrain().get_walkable_grid()));
        let (analyser, roster) = core.parts_mut();
        let result = analyser
            .find_path(Point::new(0, 0), Point::new(2, 0))
            .expect("in bounds");
        assert_eq!(result.path.map(|path| path.len()), Some(5));
        assert_eq!(roster.players().len(), 2);
    }
}
