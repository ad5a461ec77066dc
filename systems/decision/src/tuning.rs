//! Tuning knobs for the decision engine.

use serde::Deserialize;

/// Aggregated tuning controlling candidate enumeration and scoring.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionTuning {
    /// Planning horizon in rounds; the movement envelope spans `walk * rounds`.
    pub rounds: u32,
    /// Decimal places kept on combined scores.
    pub score_precision: u32,
    /// Which combatants are considered as targets.
    pub targets: TargetPolicy,
    /// Action scorer weights.
    pub action: ActionTuning,
    /// Position scorer weights.
    pub position: PositionTuning,
}

impl Default for DecisionTuning {
    fn default() -> Self {
        Self {
            rounds: 10,
            score_precision: 6,
            targets: TargetPolicy::default(),
            action: ActionTuning::default(),
            position: PositionTuning::default(),
        }
    }
}

/// Set of combatants eligible as targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Only living opponents.
    #[default]
    OpponentsOnly,
    /// Every living combatant, the actor included, so support actions compete.
    Everyone,
}

/// Weights of the opportunity and dangerousness heuristics.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActionTuning {
    /// Offset the target's life ratio is subtracted from; keeps full-life targets above zero.
    pub opportunity_bias: f64,
    /// Multiplier when a harmful action would kill or a heal would be fully used.
    pub kill_bonus: f64,
    /// Multiplier for every other harmful or healing outcome.
    pub wound_factor: f64,
    /// Damage magnitude mapped to `1.0`.
    pub damage_normaliser: f64,
    /// Action distance mapped to `1.0`.
    pub reach_normaliser: f64,
    /// Area-of-effect size (`zone + 1`) mapped to `1.0`.
    pub zone_normaliser: f64,
    /// Mobility (`walk + jump`) mapped to `1.0`.
    pub mobility_normaliser: f64,
    /// Lower clamp of every normalised factor.
    pub floor: f64,
}

impl Default for ActionTuning {
    fn default() -> Self {
        Self {
            opportunity_bias: 1.1,
            kill_bonus: 1.0,
            wound_factor: 0.5,
            damage_normaliser: 10.0,
            reach_normaliser: 5.0,
            zone_normaliser: 3.0,
            mobility_normaliser: 7.0,
            floor: 0.1,
        }
    }
}

/// Linear preference for standing away from the target.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PositionTuning {
    /// Score of a position at distance zero from the target.
    pub base: f64,
    /// Score added per tile of distance between the position and the target.
    pub per_tile: f64,
}

impl Default for PositionTuning {
    fn default() -> Self {
        Self {
            base: 1.0,
            per_tile: 0.5,
        }
    }
}
