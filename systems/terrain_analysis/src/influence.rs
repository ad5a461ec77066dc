//! Influence maps derived from combatant positions.

use grid_tactics_core::{Combatant, Point};
use grid_tactics_system_pathfinder::SearchError;
use serde::Deserialize;

use crate::TerrainAnalyser;

/// Shape of the attraction map produced by [`MapsAnalyser`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InfluenceTuning {
    /// Manhattan radius of each opponent's influence.
    pub radius: u32,
    /// Raw value mapped to `1.0`; raw values are normalised from `[0, normaliser]`.
    pub normaliser: f64,
    /// Decimal places kept after normalisation.
    pub precision: u32,
}

impl Default for InfluenceTuning {
    fn default() -> Self {
        Self {
            radius: 5,
            normaliser: 15.0,
            precision: 2,
        }
    }
}

/// Dense per-cell influence values in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct InfluenceMap {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl InfluenceMap {
    fn zeroed(width: u32, height: u32) -> Self {
        let cells = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            values: vec![0.0; cells],
        }
    }

    fn index(&self, point: Point) -> Option<usize> {
        let x = u32::try_from(point.x).ok()?;
        let y = u32::try_from(point.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        usize::try_from(u64::from(y) * u64::from(self.width) + u64::from(x)).ok()
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Influence at the provided point, if it lies within the map.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<f64> {
        self.index(point)
            .and_then(|index| self.values.get(index).copied())
    }

    /// Rows of the map, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        let width = usize::try_from(self.width).unwrap_or(usize::MAX).max(1);
        self.values.chunks(width)
    }
}

/// Builds roster-wide influence maps over a terrain.
#[derive(Clone, Debug, Default)]
pub struct MapsAnalyser {
    tuning: InfluenceTuning,
}

impl MapsAnalyser {
    /// Creates an analyser with the provided tuning.
    #[must_use]
    pub fn new(tuning: InfluenceTuning) -> Self {
        Self { tuning }
    }

    /// Tuning used by the analyser.
    #[must_use]
    pub fn tuning(&self) -> &InfluenceTuning {
        &self.tuning
    }

    /// Map of how strongly each cell is threatened by the actor's opponents.
    ///
    /// Every living non-ally adds `radius + 1 - distance` to the cells of its
    /// cover zone; totals are normalised and rounded.
    pub fn attraction_map(
        &self,
        analyser: &TerrainAnalyser,
        actor: &Combatant,
        players: &[Combatant],
    ) -> Result<InfluenceMap, SearchError> {
        let grid = analyser.grid().ok_or(SearchError::MissingGrid)?;
        let mut map = InfluenceMap::zeroed(grid.width(), grid.height());
        let peak = f64::from(self.tuning.radius) + 1.0;

        for player in players
            .iter()
            .filter(|player| !player.is_dead() && !actor.is_ally(player))
        {
            let zone = analyser.cover_zone(player.position(), self.tuning.radius)?;
            for node in zone.iter() {
                if let Some(index) = map.index(node.point) {
                    if let Some(value) = map.values.get_mut(index) {
                        *value += peak - f64::from(node.cost);
                    }
                }
            }
        }

        let precision = i32::try_from(self.tuning.precision).unwrap_or(i32::MAX);
        for value in &mut map.values {
            let normalised = convert_range(*value, (0.0, self.tuning.normaliser), (0.0, 1.0));
            *value = round_to(normalised, precision);
        }

        Ok(map)
    }
}

/// Linearly maps `value` from the `from` range onto the `to` range.
///
/// Values outside `from` extrapolate; ranges may be inverted.
#[must_use]
pub fn convert_range(value: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    (value - from.0) * (to.1 - to.0) / (from.1 - from.0) + to.0
}

fn round_to(value: f64, precision: i32) -> f64 {
    let scale = 10_f64.powi(precision);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::{convert_range, round_to};

    #[test]
    fn convert_range_maps_linearly() {
        assert_eq!(convert_range(1.0, (0.0, 2.0), (0.0, 10.0)), 5.0);
        assert_eq!(convert_range(5.0, (0.0, 10.0), (0.0, 100.0)), 50.0);
        assert_eq!(round_to(convert_range(4.0, (0.0, 5.0), (1.0, 0.0)), 2), 0.2);
        assert_eq!(round_to(convert_range(1.0, (0.0, 5.0), (1.0, 0.0)), 2), 0.8);
    }
}
