use std::{collections::BTreeSet, fs, path::Path};

use anyhow::{bail, Context, Result};
use grid_tactics_core::{Action, Combatant, CombatantId, Point, TeamId, DEFAULT_MAX_LIFE};
use grid_tactics_system_decision::DecisionTuning;
use grid_tactics_system_terrain_analysis::InfluenceTuning;
use grid_tactics_world::{Core, GameState, Terrain};
use serde::Deserialize;

/// Skirmish description loaded from a TOML file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Walkability rows; `0` is walkable, anything else blocks.
    grid: Vec<Vec<u32>>,
    /// Combatants in turn order.
    #[serde(default)]
    combatants: Vec<CombatantEntry>,
    /// Decision engine overrides.
    #[serde(default)]
    pub(crate) tuning: DecisionTuning,
    /// Attraction map overrides.
    #[serde(default)]
    pub(crate) influence: InfluenceTuning,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CombatantEntry {
    team: u32,
    position: Point,
    walk: u32,
    #[serde(default = "default_jump")]
    jump: u32,
    #[serde(default)]
    max_life: Option<i32>,
    #[serde(default)]
    life: Option<i32>,
    #[serde(default)]
    actions: Vec<Action>,
}

fn default_jump() -> u32 {
    1
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }

    /// Parses scenario TOML contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse scenario toml contents")
    }

    /// Builds the terrain and roster, rejecting combatants on blocked or shared cells.
    pub(crate) fn into_core(self) -> Result<Core> {
        let terrain = Terrain::from_rows(self.grid).context("scenario grid is not rectangular")?;

        let mut occupied = BTreeSet::new();
        let mut players = Vec::with_capacity(self.combatants.len());
        for (index, entry) in self.combatants.into_iter().enumerate() {
            let position = entry.position;
            if !terrain.is_walkable(position) {
                bail!("combatant {index} stands on blocked or missing cell {position:?}");
            }
            if !occupied.insert(position) {
                bail!("combatant {index} shares cell {position:?} with another combatant");
            }

            let id = CombatantId::new(u32::try_from(index).context("too many combatants")?);
            let mut combatant = Combatant::new(
                id,
                TeamId::new(entry.team),
                position,
                entry.walk,
                entry.jump,
                entry.actions,
            )
            .with_max_life(entry.max_life.unwrap_or(DEFAULT_MAX_LIFE));
            if let Some(life) = entry.life {
                combatant.set_life(life);
            }
            players.push(combatant);
        }

        Ok(Core::new(terrain, GameState::new(players)))
    }
}

#[cfg(test)]
mod tests {
    use super::Scenario;
    use grid_tactics_core::{CombatantId, Point};
    use grid_tactics_system_decision::TargetPolicy;

    const SKIRMISH: &str = r#"
grid = [
    [0, 0, 0],
    [0, 1, 0],
]

[[combatants]]
team = 0
position = { x = 0, y = 0 }
walk = 2
actions = [{ distance = 1, damage = -5 }]

[[combatants]]
team = 1
position = { x = 2, y = 1 }
walk = 3
jump = 2
max_life = 30
life = 12

[tuning]
rounds = 4
targets = "everyone"

[influence]
radius = 3
"#;

    #[test]
    fn parses_roster_and_overrides() {
        let scenario = Scenario::parse(SKIRMISH).expect("scenario parses");
        assert_eq!(scenario.tuning.rounds, 4);
        assert_eq!(scenario.tuning.targets, TargetPolicy::Everyone);
        assert_eq!(scenario.tuning.score_precision, 6);
        assert_eq!(scenario.influence.radius, 3);

        let core = scenario.into_core().expect("scenario is valid");
        let players = core.game_state().players();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].actions()[0].variation, 8);
        assert_eq!(players[0].jump(), 1);
        assert_eq!(players[1].id(), CombatantId::new(1));
        assert_eq!(players[1].position(), Point::new(2, 1));
        assert_eq!(players[1].max_life(), 30);
        assert_eq!(players[1].life(), 12);
        assert!(!core.terrain().is_walkable(Point::new(1, 1)));
    }

    #[test]
    fn rejects_combatants_on_blocked_cells() {
        let scenario = Scenario::parse(
            r#"
grid = [[0, 1]]

[[combatants]]
team = 0
position = { x = 1, y = 0 }
walk = 1
"#,
        )
        .expect("scenario parses");
        assert!(scenario.into_core().is_err());
    }

    #[test]
    fn rejects_shared_cells() {
        let scenario = Scenario::parse(
            r#"
grid = [[0, 0]]

[[combatants]]
team = 0
position = { x = 0, y = 0 }
walk = 1

[[combatants]]
team = 1
position = { x = 0, y = 0 }
walk = 1
"#,
        )
        .expect("scenario parses");
        assert!(scenario.into_core().is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Scenario::parse("grid = [[0]]\nwalls = 3\n").is_err());
    }
}
