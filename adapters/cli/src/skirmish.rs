use anyhow::{Context, Result};
use grid_tactics_core::{Combatant, CombatantId, DamageRoll, Point};
use grid_tactics_system_decision::{Decision, DecisionScorer, DecisionTuning};
use grid_tactics_world::Core;
use rand::Rng;
use serde::Serialize;
use tracing::info;

/// What one combatant did during one turn.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct TurnReport {
    pub(crate) turn: u32,
    pub(crate) actor: CombatantId,
    pub(crate) from: Point,
    pub(crate) to: Point,
    pub(crate) decision: Decision,
    pub(crate) roll: Option<DamageRoll>,
    pub(crate) target_life: Option<i32>,
}

/// Runs up to `turns` turns, handing every report to `report` as it happens.
///
/// Combatants act in roster order; one that dies earlier in the turn skips its
/// slot. Stops early once at most one team is left standing.
pub(crate) fn run<R, F>(
    core: &mut Core,
    tuning: &DecisionTuning,
    turns: u32,
    rng: &mut R,
    mut report: F,
) -> Result<u32>
where
    R: Rng + ?Sized,
    F: FnMut(&TurnReport) -> Result<()>,
{
    let mut played = 0;
    for turn in 1..=turns {
        if core.game_state().is_over() {
            break;
        }
        played = turn;

        let order: Vec<CombatantId> = core.game_state().living().map(Combatant::id).collect();
        for id in order {
            let Some(actor) = core.game_state().player(id).filter(|actor| !actor.is_dead()) else {
                continue;
            };
            let (from, walk) = (actor.position(), actor.walk());

            let outcome = DecisionScorer::new(id, tuning.clone())
                .get_decision(core)
                .with_context(|| format!("planning failed for combatant {}", id.get()))?;
            let to = outcome.step_towards(walk).unwrap_or(from);
            core.game_state_mut().move_player(id, to)?;

            let decision = outcome.decision;
            let mut roll = None;
            let mut target_life = None;
            if decision.reaches_target && decision.position.point == to {
                if let (Some(action), Some(target)) = (decision.action, decision.target) {
                    roll = Some(core.game_state_mut().apply_action(target, &action, rng)?);
                    target_life = core.game_state().player(target).map(Combatant::life);
                }
            }

            report(&TurnReport {
                turn,
                actor: id,
                from,
                to,
                decision,
                roll,
                target_life,
            })?;
        }
    }

    info!(
        turns = played,
        teams_alive = core.game_state().teams_alive(),
        "skirmish finished"
    );
    Ok(played)
}

#[cfg(test)]
mod tests {
    use super::run;
    use grid_tactics_core::{Action, Combatant, CombatantId, Point, TeamId};
    use grid_tactics_system_decision::DecisionTuning;
    use grid_tactics_world::{Core, GameState, Terrain};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn duel() -> Core {
        let terrain = Terrain::from_rows(vec![vec![0; 6]; 3]).expect("valid rows");
        let roster = GameState::new(vec![
            Combatant::new(
                CombatantId::new(0),
                TeamId::new(0),
                Point::new(0, 1),
                2,
                1,
                vec![Action::new(1, -8).with_variation(0)],
            ),
            Combatant::new(
                CombatantId::new(1),
                TeamId::new(1),
                Point::new(5, 1),
                2,
                1,
                vec![Action::new(1, -3).with_variation(0)],
            ),
        ]);
        Core::new(terrain, roster)
    }

    #[test]
    fn duel_ends_with_one_team_standing() {
        let mut core = duel();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut reports = Vec::new();

        let played = run(&mut core, &DecisionTuning::default(), 30, &mut rng, |report| {
            reports.push(report.clone());
            Ok(())
        })
        .expect("skirmish runs");

        assert!(core.game_state().is_over());
        assert!(played < 30);
        assert!(reports.iter().any(|report| report.roll.is_some()));
        assert!(reports
            .iter()
            .all(|report| report.from.manhattan_distance(report.to) <= 2));
        assert!(reports
            .iter()
            .all(|report| report.roll.is_none() || report.to == report.decision.position.point));
    }

    #[test]
    fn zero_turns_leave_the_roster_untouched() {
        let mut core = duel();
        let before = core.game_state().clone();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let played = run(&mut core, &DecisionTuning::default(), 0, &mut rng, |_| Ok(()))
            .expect("skirmish runs");

        assert_eq!(played, 0);
        assert_eq!(core.game_state(), &before);
    }
}
