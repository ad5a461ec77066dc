#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Multi-round decision engine for computer-controlled combatants.
//!
//! For one acting combatant the [`DecisionScorer`] floods its movement
//! envelope over the whole planning horizon once, slices it per round,
//! intersects each slice with the reach envelope around every eligible
//! target and scores every feasible (action, target, position, round)
//! combination. Later rounds are discounted by dividing by the round number.
//! The best entry wins, with a fallback that keeps the winning position but
//! swaps in an action executable this turn when one exists there.

mod scoring;
mod tuning;

use grid_tactics_core::{Action, Combatant, CombatantId, Point};
use grid_tactics_system_pathfinder::{SearchError, Zone};
use grid_tactics_system_terrain_analysis::TerrainAnalyser;
use grid_tactics_world::{query, Core};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub use crate::scoring::{ActionScorer, ActionScoring, Candidate, PositionScorer, PositionScoring};
pub use crate::tuning::{ActionTuning, DecisionTuning, PositionTuning, TargetPolicy};

/// Failures raised while planning a decision.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    /// The terrain analyser rejected a query.
    #[error(transparent)]
    Search(#[from] SearchError),
    /// The acting combatant is missing from the roster.
    #[error("acting combatant {} is not in the roster", id.get())]
    ActorNotFound {
        /// Identifier of the missing combatant.
        id: CombatantId,
    },
}

/// Cell from which an action could be performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CandidatePosition {
    /// Location of the cell.
    pub point: Point,
    /// Manhattan distance from the cell to the target.
    pub target_distance: u32,
    /// Movement cost from the actor's position to the cell.
    pub travel_cost: u32,
}

/// Ranked recommendation for the acting combatant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Decision {
    /// Action to perform; `None` for movement-only decisions.
    pub action: Option<Action>,
    /// Combatant the action aims at, or the one being approached.
    pub target: Option<CombatantId>,
    /// Cell to move to.
    pub position: CandidatePosition,
    /// Planning round in which the position is reached, starting at 1.
    pub round: u32,
    /// Whether the action should be performed this turn.
    pub reaches_target: bool,
    /// Output of the action scorer.
    pub action_score: f64,
    /// Output of the position scorer.
    pub position_score: f64,
    /// `action_score * position_score / round`, rounded.
    pub score: f64,
}

/// Every scored entry of one planning call plus the movement envelope.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// Scored entries in enumeration order: round, target, action, position.
    pub entries: Vec<Decision>,
    /// Cost-bounded zone covering the actor's whole planning horizon.
    pub move_zone: Zone,
}

/// Selected decision plus the movement envelope it was chosen from.
#[derive(Clone, Debug)]
pub struct DecisionOutcome {
    /// Selected decision.
    pub decision: Decision,
    /// Cost-bounded zone covering the actor's whole planning horizon.
    pub move_zone: Zone,
}

impl DecisionOutcome {
    /// Cells from the actor's position to the decision's position, both included.
    #[must_use]
    pub fn movement_path(&self) -> Vec<Point> {
        self.move_zone
            .path_to(self.decision.position.point)
            .map(|path| path.into_iter().map(|node| node.point).collect())
            .unwrap_or_default()
    }

    /// Furthest cell along the movement path whose travel cost fits `budget`.
    #[must_use]
    pub fn step_towards(&self, budget: u32) -> Option<Point> {
        self.move_zone
            .path_to(self.decision.position.point)?
            .into_iter()
            .take_while(|node| node.cost <= budget)
            .last()
            .map(|node| node.point)
    }
}

/// Picks the winning entry.
///
/// The first entry with the highest score wins. A winner that cannot act this
/// turn is replaced by the best entry that can act this turn from the same
/// cell, if any. A winner whose action score is not positive never acts.
#[must_use]
pub fn select_decision(entries: &[Decision]) -> Option<Decision> {
    let mut selected = first_best(entries.iter())?.clone();

    if !selected.reaches_target {
        let point = selected.position.point;
        let reaching = entries
            .iter()
            .filter(|entry| entry.reaches_target && entry.position.point == point);
        if let Some(substitute) = first_best(reaching) {
            debug!(
                ?point,
                round = selected.round,
                "acting now from the planned position"
            );
            selected = substitute.clone();
        }
    }

    if selected.action_score <= 0.0 {
        selected.reaches_target = false;
    }

    Some(selected)
}

fn first_best<'a, I>(entries: I) -> Option<&'a Decision>
where
    I: Iterator<Item = &'a Decision>,
{
    entries.fold(None, |best: Option<&'a Decision>, entry| match best {
        Some(current) if current.score >= entry.score => Some(current),
        _ => Some(entry),
    })
}

/// Chooses what one combatant should do.
#[derive(Clone, Debug)]
pub struct DecisionScorer<A = ActionScorer, P = PositionScorer> {
    player: CombatantId,
    tuning: DecisionTuning,
    action_scorer: A,
    position_scorer: P,
}

impl DecisionScorer {
    /// Creates a scorer for `player` using the default heuristics.
    #[must_use]
    pub fn new(player: CombatantId, tuning: DecisionTuning) -> Self {
        let action_scorer = ActionScorer::new(tuning.action.clone());
        let position_scorer = PositionScorer::new(tuning.position.clone());
        Self::with_scorers(player, tuning, action_scorer, position_scorer)
    }
}

impl<A, P> DecisionScorer<A, P>
where
    A: ActionScoring,
    P: PositionScoring,
{
    /// Creates a scorer with custom heuristics.
    #[must_use]
    pub fn with_scorers(
        player: CombatantId,
        tuning: DecisionTuning,
        action_scorer: A,
        position_scorer: P,
    ) -> Self {
        Self {
            player,
            tuning,
            action_scorer,
            position_scorer,
        }
    }

    /// Acting combatant.
    #[must_use]
    pub fn player(&self) -> CombatantId {
        self.player
    }

    /// Reassigns the acting combatant.
    pub fn set_player(&mut self, player: CombatantId) {
        self.player = player;
    }

    /// Tuning in effect.
    #[must_use]
    pub fn tuning(&self) -> &DecisionTuning {
        &self.tuning
    }

    /// Plans the acting combatant's decision against the core's roster.
    pub fn get_decision(&self, core: &mut Core) -> Result<DecisionOutcome, DecisionError> {
        let (analyser, game_state) = core.parts_mut();
        self.plan(analyser, game_state.players())
    }

    /// Plans the acting combatant's decision against borrowed parts.
    pub fn plan(
        &self,
        analyser: &mut TerrainAnalyser,
        players: &[Combatant],
    ) -> Result<DecisionOutcome, DecisionError> {
        let actor = self.actor(players)?;
        let Evaluation {
            entries,
            move_zone,
        } = self.evaluate(analyser, players)?;

        let decision = match select_decision(&entries) {
            Some(decision) => decision,
            None => self.movement_only(actor, players, &move_zone),
        };
        debug!(
            actor = actor.id().get(),
            candidates = entries.len(),
            target_id = ?decision.target.map(|id| id.get()),
            position = ?decision.position.point,
            round = decision.round,
            reaches_target = decision.reaches_target,
            score = decision.score,
            "decision selected"
        );

        Ok(DecisionOutcome {
            decision,
            move_zone,
        })
    }

    /// Enumerates and scores every feasible entry without selecting one.
    ///
    /// Living combatants other than the actor replace whatever points the
    /// engine avoided before.
    pub fn evaluate(
        &self,
        analyser: &mut TerrainAnalyser,
        players: &[Combatant],
    ) -> Result<Evaluation, DecisionError> {
        let actor = self.actor(players)?;
        analyser
            .path_finder_mut()
            .replace_avoided_points(query::occupied_points(players, actor.id()));

        let rounds = self.tuning.rounds.max(1);
        let horizon = actor.walk().saturating_mul(rounds);
        let move_zone = analyser.find_zone(actor.position(), horizon, 0)?.zone;

        let reach = actor.max_action_distance();
        let mut targets = Vec::new();
        for target in self.targets(players, actor) {
            targets.push((target, analyser.cover_zone(target.position(), reach)?));
        }

        let mut entries = Vec::new();
        for round in 1..=rounds {
            let budget = actor.walk().saturating_mul(round);
            for (target, cover) in &targets {
                let intersection: Vec<CandidatePosition> = cover
                    .iter()
                    .filter_map(|cover_node| {
                        move_zone
                            .get(cover_node.point)
                            .filter(|move_node| move_node.cost <= budget)
                            .map(|move_node| CandidatePosition {
                                point: cover_node.point,
                                target_distance: cover_node.cost,
                                travel_cost: move_node.cost,
                            })
                    })
                    .collect();
                if intersection.is_empty() {
                    continue;
                }

                for action in actor.actions() {
                    self.score_action(
                        &Candidate {
                            actor,
                            target: *target,
                            action,
                            round,
                        },
                        &intersection,
                        &mut entries,
                    );
                }
            }
        }
        debug!(
            actor = actor.id().get(),
            targets = targets.len(),
            entries = entries.len(),
            move_zone = move_zone.len(),
            "candidates enumerated"
        );

        Ok(Evaluation {
            entries,
            move_zone,
        })
    }

    fn score_action(
        &self,
        candidate: &Candidate<'_>,
        intersection: &[CandidatePosition],
        out: &mut Vec<Decision>,
    ) {
        let full_distance = candidate.action.full_distance();
        let mut positions = intersection
            .iter()
            .filter(|position| position.target_distance <= full_distance)
            .peekable();
        if positions.peek().is_none() {
            return;
        }

        let action_score = self.action_scorer.score(candidate);
        for position in positions {
            let position_score = self.position_scorer.score(candidate, position);
            let score = round_to(
                action_score * position_score / f64::from(candidate.round),
                self.tuning.score_precision,
            );
            out.push(Decision {
                action: Some(*candidate.action),
                target: Some(candidate.target.id()),
                position: *position,
                round: candidate.round,
                reaches_target: candidate.round == 1,
                action_score,
                position_score,
                score,
            });
        }
    }

    fn actor<'a>(&self, players: &'a [Combatant]) -> Result<&'a Combatant, DecisionError> {
        players
            .iter()
            .find(|player| player.id() == self.player)
            .ok_or(DecisionError::ActorNotFound { id: self.player })
    }

    fn targets<'a>(&self, players: &'a [Combatant], actor: &'a Combatant) -> Vec<&'a Combatant> {
        match self.tuning.targets {
            TargetPolicy::OpponentsOnly => query::living_opponents(players, actor).collect(),
            TargetPolicy::Everyone => players.iter().filter(|player| !player.is_dead()).collect(),
        }
    }

    /// Approach the closest opponent as far as one round allows, or hold still.
    fn movement_only(
        &self,
        actor: &Combatant,
        players: &[Combatant],
        move_zone: &Zone,
    ) -> Decision {
        let origin = CandidatePosition {
            point: actor.position(),
            target_distance: 0,
            travel_cost: 0,
        };
        let closest = query::closest_opponent(players, actor);
        let position = closest.map_or(origin, |opponent| {
            let goal = opponent.position();
            move_zone
                .within(actor.walk())
                .map(|node| CandidatePosition {
                    point: node.point,
                    target_distance: node.point.manhattan_distance(goal),
                    travel_cost: node.cost,
                })
                .min_by_key(|position| (position.target_distance, position.travel_cost))
                .unwrap_or(origin)
        });

        Decision {
            action: None,
            target: closest.map(Combatant::id),
            position,
            round: 1,
            reaches_target: false,
            action_score: 0.0,
            position_score: 0.0,
            score: 0.0,
        }
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX));
    (value * scale).round() / scale
}
