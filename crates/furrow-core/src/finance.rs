//! Season finance and rolling scores.
//!
//! Runs once per tick, after every cell has been updated. Income comes from
//! crop yield (vegetation vigour times fertility times the crop's base yield
//! and price); cost comes from the practices each cell's plan switches on.
//!
//! Scores are exponentially smoothed: `score = 0.7 * old + 0.3 * sample`.
//! Starting from zero, two samples `s1, s2` leave `0.21 * s1 + 0.3 * s2`.

use furrow_types::{Finance, Layer, Scores};
use furrow_world::{Catalog, Farm};

/// Weight kept from the previous score.
pub const SMOOTHING_KEEP: f64 = 0.7;

/// Weight given to the new sample.
pub const SMOOTHING_NEW: f64 = 0.3;

/// Converts per-cell yield value into cash (cells are a fraction of a hectare).
pub const AREA_SCALE: f64 = 100.0;

/// Moisture level the sustainability score treats as ideal.
pub const IDEAL_MOISTURE: f64 = 0.6;

/// Keeps efficiency positive on a barren grid.
const EFFICIENCY_EPSILON: f64 = 1e-4;

/// Income and cost of one season.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeasonTotals {
    /// Crop revenue.
    pub income: f64,
    /// Practice operating cost.
    pub cost: f64,
}

impl SeasonTotals {
    /// Income minus cost.
    pub fn margin(&self) -> f64 {
        self.income - self.cost
    }
}

/// Result of aggregating one season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonResult {
    /// Income and cost.
    pub totals: SeasonTotals,
    /// Raw score samples before smoothing.
    pub samples: Scores,
}

/// Share of base yield realized by a cell.
pub fn yield_factor(ndvi: f64, fertility: f64) -> f64 {
    ndvi * (0.5 + 0.5 * fertility)
}

/// Sum income and cost over all cells.
pub fn season_totals(farm: &Farm, catalog: &Catalog) -> SeasonTotals {
    let costs = catalog.practices;
    farm.cells()
        .iter()
        .fold(SeasonTotals::default(), |mut totals, cell| {
            let crop = catalog.crop(&cell.plan.crop);
            let cell_yield = crop.base_yield * yield_factor(cell.ndvi, cell.fertility);
            totals.income += cell_yield * crop.price / AREA_SCALE;
            if cell.plan.irrigation {
                totals.cost += costs.irrigation;
            }
            if cell.plan.drainage {
                totals.cost += costs.drainage;
            }
            if cell.plan.pest_control {
                totals.cost += costs.pest_control;
            }
            totals
        })
}

/// Raw score samples for a season.
pub fn sample_scores(farm: &Farm, totals: SeasonTotals) -> Scores {
    let fertility = farm.values(Layer::Fertility);
    let salinity = farm.values(Layer::Salinity);
    let moisture = farm.values(Layer::Moisture);
    let ndvi = farm.values(Layer::Ndvi);

    Scores {
        economy: totals.margin(),
        sustain: 1.2 * mean(&fertility)
            - 0.8 * mean(&salinity)
            - 0.2 * (mean(&moisture) - IDEAL_MOISTURE).abs(),
        risk: -(population_stdev(&moisture) + population_stdev(&salinity)),
        efficiency: (mean(&ndvi) + EFFICIENCY_EPSILON) / (1.0 + totals.cost / AREA_SCALE),
    }
}

/// One smoothing step.
pub fn smooth(old: f64, sample: f64) -> f64 {
    SMOOTHING_KEEP * old + SMOOTHING_NEW * sample
}

/// Smooth every score toward its sample.
pub fn smooth_scores(current: &Scores, sample: &Scores) -> Scores {
    Scores {
        economy: smooth(current.economy, sample.economy),
        sustain: smooth(current.sustain, sample.sustain),
        risk: smooth(current.risk, sample.risk),
        efficiency: smooth(current.efficiency, sample.efficiency),
    }
}

/// Aggregate a season into `finance`: update cash and smooth the scores.
pub fn aggregate(finance: &mut Finance, farm: &Farm, catalog: &Catalog) -> SeasonResult {
    let totals = season_totals(farm, catalog);
    let samples = sample_scores(farm, totals);
    finance.cash += totals.margin();
    finance.scores = smooth_scores(&finance.scores, &samples);
    SeasonResult { totals, samples }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / count(values.len())
}

/// Population standard deviation (divides by `n`); 0 for an empty slice.
pub fn population_stdev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / count(values.len());
    variance.sqrt()
}

fn count(n: usize) -> f64 {
    u32::try_from(n).map_or(f64::from(u32::MAX), f64::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use furrow_types::{CellPlan, CropKey};
    use furrow_world::builtin_catalog;

    fn farm_with(plan: &CellPlan) -> Farm {
        let mut farm = Farm::seeded(4, 1337).unwrap();
        farm.set_all_plans(plan);
        farm
    }

    #[test]
    fn smoothing_law_from_zero() {
        let (s1, s2) = (4.0, -10.0);
        let after_two = smooth(smooth(0.0, s1), s2);
        assert!((after_two - (0.21 * s1 + 0.3 * s2)).abs() < 1e-12);
    }

    #[test]
    fn fallow_has_no_income_or_cost() {
        let catalog = builtin_catalog();
        let farm = farm_with(&CellPlan::default());
        let totals = season_totals(&farm, &catalog);
        assert_eq!(totals.income, 0.0);
        assert_eq!(totals.cost, 0.0);
    }

    #[test]
    fn practice_costs_per_cell() {
        let catalog = builtin_catalog();
        let farm = farm_with(&CellPlan {
            crop: CropKey::fallow(),
            irrigation: true,
            drainage: true,
            pest_control: true,
        });
        let totals = season_totals(&farm, &catalog);
        assert!((totals.cost - 16.0 * (1.2 + 0.8 + 0.5)).abs() < 1e-9);
    }

    #[test]
    fn wheat_income_matches_formula() {
        let catalog = builtin_catalog();
        let farm = farm_with(&CellPlan {
            crop: CropKey::from("wheat"),
            ..CellPlan::default()
        });
        let expected: f64 = farm
            .cells()
            .iter()
            .map(|c| 3.5 * c.ndvi * (0.5 + 0.5 * c.fertility) * 220.0 / 100.0)
            .sum();
        let totals = season_totals(&farm, &catalog);
        assert!((totals.income - expected).abs() < 1e-9);
        assert!(totals.income > 0.0);
    }

    #[test]
    fn stats_match_known_values() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(population_stdev(&values), 2.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_stdev(&[]), 0.0);
    }

    #[test]
    fn aggregate_updates_cash_and_scores() {
        let catalog = builtin_catalog();
        let farm = farm_with(&CellPlan {
            crop: CropKey::from("maize"),
            irrigation: true,
            ..CellPlan::default()
        });
        let mut finance = Finance {
            cash: 100.0,
            scores: Scores::default(),
        };
        let result = aggregate(&mut finance, &farm, &catalog);
        assert!((finance.cash - (100.0 + result.totals.margin())).abs() < 1e-9);
        assert!((finance.scores.economy - 0.3 * result.samples.economy).abs() < 1e-12);
        assert!(result.samples.risk <= 0.0);
        assert!(result.samples.efficiency > 0.0);
    }
}
