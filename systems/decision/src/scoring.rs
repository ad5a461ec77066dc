//! Action and position heuristics combined by the decision engine.

use grid_tactics_core::{Action, Combatant};

use crate::tuning::{ActionTuning, PositionTuning};
use crate::CandidatePosition;

/// Action/target pairing evaluated during one planning round.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    /// Combatant choosing what to do.
    pub actor: &'a Combatant,
    /// Combatant the action would land on.
    pub target: &'a Combatant,
    /// Action under evaluation.
    pub action: &'a Action,
    /// Planning round, starting at 1 for the current turn.
    pub round: u32,
}

/// Scores how desirable an action is against a target.
///
/// Implementations must return zero for actions that harm an ally or heal
/// an opponent.
pub trait ActionScoring {
    /// Non-negative desirability of the candidate's action.
    fn score(&self, candidate: &Candidate<'_>) -> f64;
}

/// Scores where the actor should stand when acting.
pub trait PositionScoring {
    /// Desirability of acting from `position`.
    fn score(&self, candidate: &Candidate<'_>, position: &CandidatePosition) -> f64;
}

/// Opportunity times dangerousness heuristic.
#[derive(Clone, Debug, Default)]
pub struct ActionScorer {
    tuning: ActionTuning,
}

impl ActionScorer {
    /// Creates a scorer with the provided weights.
    #[must_use]
    pub fn new(tuning: ActionTuning) -> Self {
        Self { tuning }
    }

    /// How much the target is worth acting on right now.
    ///
    /// Low life raises the score; a blow that kills, or a heal that is not
    /// wasted, earns the full bonus.
    #[must_use]
    pub fn opportunity(&self, target: &Combatant, action: &Action) -> f64 {
        let max_life = target.max_life();
        let ratio = if max_life > 0 {
            f64::from(target.life()) / f64::from(max_life)
        } else {
            0.0
        };
        let decisive = if action.is_harmful() {
            action.damage.unsigned_abs() >= target.life().unsigned_abs()
        } else {
            action.damage <= max_life.saturating_sub(target.life())
        };
        let outcome = if decisive {
            self.tuning.kill_bonus
        } else {
            self.tuning.wound_factor
        };
        (self.tuning.opportunity_bias - ratio).max(0.0) * outcome
    }

    /// How threatening the target is, from its strongest action and its mobility.
    #[must_use]
    pub fn dangerousness(&self, target: &Combatant) -> f64 {
        let threat = target
            .actions()
            .iter()
            .map(|action| {
                self.clamp(f64::from(action.damage.unsigned_abs()) / self.tuning.damage_normaliser)
                    * self.clamp(f64::from(action.distance) / self.tuning.reach_normaliser)
                    * self.clamp(f64::from(action.zone + 1) / self.tuning.zone_normaliser)
            })
            .fold(self.tuning.floor, f64::max);
        let mobility = f64::from(target.walk().saturating_add(target.jump()));
        threat * self.clamp(mobility / self.tuning.mobility_normaliser)
    }

    fn potency(&self, action: &Action) -> f64 {
        self.clamp(f64::from(action.damage.unsigned_abs()) / self.tuning.damage_normaliser)
    }

    fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.tuning.floor;
        }
        value.clamp(self.tuning.floor, 1.0)
    }
}

impl ActionScoring for ActionScorer {
    fn score(&self, candidate: &Candidate<'_>) -> f64 {
        let Candidate {
            actor,
            target,
            action,
            ..
        } = *candidate;
        let ally = actor.is_ally(target);
        if action.damage == 0 || (ally && action.is_harmful()) || (!ally && action.is_healing()) {
            return 0.0;
        }

        self.potency(action) * self.opportunity(target, action) * self.dangerousness(target)
    }
}

/// Prefers positions at the edge of the action's reach.
#[derive(Clone, Debug, Default)]
pub struct PositionScorer {
    tuning: PositionTuning,
}

impl PositionScorer {
    /// Creates a scorer with the provided weights.
    #[must_use]
    pub fn new(tuning: PositionTuning) -> Self {
        Self { tuning }
    }
}

impl PositionScoring for PositionScorer {
    fn score(&self, _candidate: &Candidate<'_>, position: &CandidatePosition) -> f64 {
        self.tuning.base + self.tuning.per_tile * f64::from(position.target_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionScorer, ActionScoring, Candidate, PositionScorer, PositionScoring};
    use crate::CandidatePosition;
    use grid_tactics_core::{Action, Combatant, CombatantId, Point, TeamId};

    fn fighter(id: u32, team: u32, actions: Vec<Action>) -> Combatant {
        Combatant::new(
            CombatantId::new(id),
            TeamId::new(team),
            Point::new(0, 0),
            3,
            1,
            actions,
        )
    }

    fn score(actor: &Combatant, target: &Combatant, action: &Action) -> f64 {
        ActionScorer::default().score(&Candidate {
            actor,
            target,
            action,
            round: 1,
        })
    }

    #[test]
    fn rejects_friendly_fire_and_enemy_heals() {
        let actor = fighter(1, 0, Vec::new());
        let ally = fighter(2, 0, vec![Action::new(1, -3)]);
        let enemy = fighter(3, 1, vec![Action::new(1, -3)]);

        assert_eq!(score(&actor, &ally, &Action::new(1, -5)), 0.0);
        assert_eq!(score(&actor, &enemy, &Action::new(1, 5)), 0.0);
        assert_eq!(score(&actor, &enemy, &Action::new(1, 0)), 0.0);
        assert!(score(&actor, &enemy, &Action::new(1, -5)) > 0.0);
        assert!(score(&actor, &ally, &Action::new(1, 5)) > 0.0);
    }

    #[test]
    fn wounded_targets_score_higher() {
        let actor = fighter(1, 0, Vec::new());
        let healthy = fighter(2, 1, vec![Action::new(1, -3)]);
        let mut wounded = healthy.clone();
        wounded.set_life(12);
        let action = Action::new(1, -4);

        assert!(score(&actor, &wounded, &action) > score(&actor, &healthy, &action));
    }

    #[test]
    fn killing_blows_score_higher() {
        let actor = fighter(1, 0, Vec::new());
        let mut target = fighter(2, 1, vec![Action::new(1, -3)]);
        target.set_life(4);

        let finishing = ActionScorer::default().opportunity(&target, &Action::new(1, -4));
        let grazing = ActionScorer::default().opportunity(&target, &Action::new(1, -3));
        assert!(finishing > grazing);
        assert!(score(&actor, &target, &Action::new(1, -4)) > 0.0);
    }

    #[test]
    fn threatening_targets_score_higher() {
        let scorer = ActionScorer::default();
        let weak = fighter(2, 1, vec![Action::new(1, -1)]);
        let strong = fighter(3, 1, vec![Action::new(4, -9).with_zone(1)]);
        let unarmed = fighter(4, 1, Vec::new());

        assert!(scorer.dangerousness(&strong) > scorer.dangerousness(&weak));
        assert!(scorer.dangerousness(&weak) >= scorer.dangerousness(&unarmed));
        assert!(scorer.dangerousness(&unarmed) > 0.0);
    }

    #[test]
    fn farther_positions_score_at_least_as_high() {
        let actor = fighter(1, 0, Vec::new());
        let target = fighter(2, 1, Vec::new());
        let action = Action::new(3, -2);
        let candidate = Candidate {
            actor: &actor,
            target: &target,
            action: &action,
            round: 1,
        };
        let scorer = PositionScorer::default();
        let near = CandidatePosition {
            point: Point::new(1, 0),
            target_distance: 1,
            travel_cost: 1,
        };
        let far = CandidatePosition {
            point: Point::new(3, 0),
            target_distance: 3,
            travel_cost: 3,
        };
        assert!(scorer.score(&candidate, &far) >= scorer.score(&candidate, &near));
    }
}
