//! Per-run simulation state.
//!
//! A [`GameState`] owns everything a tick mutates: the region and its shock
//! multipliers, the farm grid, finance, the season clock, loans and policies
//! and the event log. It round-trips through [`GameSnapshot`] so runs can be
//! stored, shipped and resumed.

use chrono::{DateTime, Utc};
use furrow_types::{
    Accounts, Cell, EventId, Finance, GameSnapshot, Layer, LayerGrid, PlanFields, PlanOutcome,
    PlanReport, RunId, RunOverview, Scores, SeasonEvent,
};
use furrow_world::soil::{FERTILITY_CEILING, FERTILITY_FLOOR};
use furrow_world::{Catalog, Farm, Region};
use tracing::{debug, info, warn};

use crate::clock::SeasonClock;
use crate::config::WorldConfig;
use crate::error::CoreError;

/// Parameters every new run starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDefaults {
    /// Seed used when a caller does not pick one.
    pub seed: u64,
    /// Side length of the grid.
    pub grid_size: usize,
    /// Year of the first season.
    pub baseline_year: i32,
    /// Opening cash.
    pub starting_cash: f64,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self::from(&WorldConfig::default())
    }
}

impl From<&WorldConfig> for RunDefaults {
    fn from(world: &WorldConfig) -> Self {
        Self {
            seed: world.seed,
            grid_size: world.grid_size,
            baseline_year: world.baseline_year,
            starting_cash: world.starting_cash,
        }
    }
}

/// The mutable state of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Run identifier.
    pub id: RunId,
    /// Seed driving the initial landscape and every shock roll.
    pub seed: u64,
    /// Region and its current shock multipliers.
    pub region: Region,
    /// The cell grid.
    pub farm: Farm,
    /// Cash and smoothed scores.
    pub finance: Finance,
    /// Calendar position.
    pub clock: SeasonClock,
    /// Loans, policies and ledger.
    pub accounts: Accounts,
    /// Fired shocks not yet resolved.
    pub events: Vec<SeasonEvent>,
    /// When the run was created or restored.
    pub created_at: DateTime<Utc>,
}

impl GameState {
    /// Start a run in `region_code`.
    ///
    /// Turn 0, spring of the baseline year, every cell fallow, scores zero.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::World`] if the region is unknown or the grid
    /// size is invalid.
    pub fn new_run(
        catalog: &Catalog,
        defaults: &RunDefaults,
        region_code: &str,
        seed: Option<u64>,
    ) -> Result<Self, CoreError> {
        let spec = catalog.region(region_code)?;
        let seed = seed.unwrap_or(defaults.seed);
        let farm = Farm::seeded(defaults.grid_size, seed)?;
        let state = Self {
            id: RunId::new(),
            seed,
            region: Region::new(region_code, spec.clone()),
            farm,
            finance: Finance {
                cash: defaults.starting_cash,
                scores: Scores::default(),
            },
            clock: SeasonClock::new(defaults.baseline_year),
            accounts: Accounts::default(),
            events: Vec::new(),
            created_at: Utc::now(),
        };
        info!(
            run_id = %state.id,
            region = region_code,
            seed,
            grid_size = defaults.grid_size,
            "Run created"
        );
        Ok(state)
    }

    /// Merge a partial plan into one cell. Out-of-range indices are ignored.
    pub fn apply_plan(&mut self, index: usize, fields: &PlanFields) -> PlanOutcome {
        let outcome = self.farm.apply_plan(index, fields);
        match outcome {
            PlanOutcome::Applied => debug!(run_id = %self.id, index, "Plan merged"),
            PlanOutcome::Ignored => warn!(
                run_id = %self.id,
                index,
                cells = self.farm.len(),
                "Plan index out of range, ignored"
            ),
        }
        outcome
    }

    /// Apply the same update to several cells.
    pub fn apply_plan_to(&mut self, indices: &[usize], fields: &PlanFields) -> PlanReport {
        let mut report = PlanReport::default();
        for &index in indices {
            match self.apply_plan(index, fields) {
                PlanOutcome::Applied => report.applied = report.applied.saturating_add(1),
                PlanOutcome::Ignored => report.ignored.push(index),
            }
        }
        report
    }

    /// One layer as a 2D array.
    pub fn get_layer(&self, layer: Layer) -> LayerGrid {
        self.farm.layer(layer)
    }

    /// Remove an event from the log.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EventNotFound`] if no open event has this id.
    pub fn resolve_event(&mut self, event_id: EventId) -> Result<SeasonEvent, CoreError> {
        let position = self
            .events
            .iter()
            .position(|e| e.id == event_id)
            .ok_or(CoreError::EventNotFound(event_id))?;
        let event = self.events.remove(position);
        debug!(run_id = %self.id, event_id = %event.id, kind = ?event.kind, "Event resolved");
        Ok(event)
    }

    /// Compact description of the run.
    pub fn overview(&self) -> RunOverview {
        RunOverview {
            run_id: self.id,
            region_code: self.region.code().to_owned(),
            region_name: self.region.display_name().to_owned(),
            seed: self.seed,
            grid_size: self.farm.size(),
            year: self.clock.year(),
            season: self.clock.season(),
            turn: self.clock.turn(),
            finance: self.finance,
            open_events: self.events.len(),
            created_at: self.created_at,
        }
    }

    /// Serializable copy of the run.
    pub fn to_snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            run_id: self.id,
            seed: self.seed,
            region_code: self.region.code().to_owned(),
            grid_size: self.farm.size(),
            year: self.clock.year(),
            season: self.clock.season(),
            turn: self.clock.turn(),
            cells: self.farm.cells().to_vec(),
            finance: self.finance,
            accounts: self.accounts.clone(),
            events: self.events.clone(),
        }
    }

    /// Rebuild a run from a snapshot. The region is looked up in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::World`] for an unknown region or a cell array
    /// that does not fill the grid, and [`CoreError::InvalidSnapshot`] for
    /// cell or finance values outside their ranges.
    pub fn restore(snapshot: GameSnapshot, catalog: &Catalog) -> Result<Self, CoreError> {
        let spec = catalog.region(&snapshot.region_code)?;
        if let Some(index) = snapshot.cells.iter().position(|c| !cell_in_range(c)) {
            return Err(CoreError::InvalidSnapshot {
                reason: format!("cell {index} has a value outside its range"),
            });
        }
        if !snapshot.finance.cash.is_finite() {
            return Err(CoreError::InvalidSnapshot {
                reason: "cash is not finite".to_owned(),
            });
        }
        let farm = Farm::from_cells(snapshot.grid_size, snapshot.cells)?;
        let state = Self {
            id: snapshot.run_id,
            seed: snapshot.seed,
            region: Region::new(snapshot.region_code, spec.clone()),
            farm,
            finance: snapshot.finance,
            clock: SeasonClock::from_parts(snapshot.year, snapshot.season, snapshot.turn),
            accounts: snapshot.accounts,
            events: snapshot.events,
            created_at: Utc::now(),
        };
        info!(run_id = %state.id, turn = state.clock.turn(), "Run restored");
        Ok(state)
    }
}

fn cell_in_range(cell: &Cell) -> bool {
    (FERTILITY_FLOOR..=FERTILITY_CEILING).contains(&cell.fertility)
        && [cell.salinity, cell.moisture, cell.ndvi]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use furrow_types::{CropKey, PlanPatch, Season};
    use furrow_world::builtin_catalog;

    fn small_defaults() -> RunDefaults {
        RunDefaults {
            grid_size: 4,
            ..RunDefaults::default()
        }
    }

    #[test]
    fn new_run_starts_in_spring_with_zero_scores() {
        let catalog = builtin_catalog();
        let state = GameState::new_run(&catalog, &RunDefaults::default(), "california", None).unwrap();
        assert_eq!(state.seed, 1337);
        assert_eq!(state.clock.turn(), 0);
        assert_eq!(state.clock.season(), Season::Spring);
        assert_eq!(state.clock.year(), 2014);
        assert_eq!(state.farm.len(), 1024);
        assert_eq!(state.finance.cash, 10_000.0);
        assert_eq!(state.finance.scores, Scores::default());
    }

    #[test]
    fn unknown_region_is_rejected() {
        let catalog = builtin_catalog();
        let err = GameState::new_run(&catalog, &small_defaults(), "atlantis", Some(1)).unwrap_err();
        assert!(matches!(err, CoreError::World { .. }));
    }

    #[test]
    fn plan_to_many_reports_ignored_indices() {
        let catalog = builtin_catalog();
        let mut state = GameState::new_run(&catalog, &small_defaults(), "sahel", Some(3)).unwrap();
        let fields = PlanFields::from(PlanPatch::Crops {
            crop: CropKey::from("millet"),
        });
        let report = state.apply_plan_to(&[0, 15, 16, 99], &fields);
        assert_eq!(report.applied, 2);
        assert_eq!(report.ignored, vec![16, 99]);
        assert_eq!(state.farm.cell(15).unwrap().plan.crop.as_str(), "millet");
        assert_eq!(state.farm.cell(1).unwrap().plan.crop, CropKey::fallow());
    }

    #[test]
    fn snapshot_round_trip_keeps_state() {
        let catalog = builtin_catalog();
        let state = GameState::new_run(&catalog, &small_defaults(), "amu_darya", Some(8)).unwrap();
        let restored = GameState::restore(state.to_snapshot(), &catalog).unwrap();
        assert_eq!(restored.id, state.id);
        assert_eq!(restored.farm, state.farm);
        assert_eq!(restored.clock, state.clock);
        assert_eq!(restored.region.code(), "amu_darya");
    }

    #[test]
    fn restore_rejects_short_cell_array() {
        let catalog = builtin_catalog();
        let state = GameState::new_run(&catalog, &small_defaults(), "sahel", Some(2)).unwrap();
        let mut snapshot = state.to_snapshot();
        snapshot.cells.pop();
        let err = GameState::restore(snapshot, &catalog).unwrap_err();
        assert!(matches!(err, CoreError::World { .. }));
    }

    #[test]
    fn restore_rejects_out_of_range_cell() {
        let catalog = builtin_catalog();
        let state = GameState::new_run(&catalog, &small_defaults(), "sahel", Some(2)).unwrap();
        let mut snapshot = state.to_snapshot();
        snapshot.cells[3].salinity = 1.5;
        let err = GameState::restore(snapshot, &catalog).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSnapshot { .. }));
    }

    #[test]
    fn restore_rejects_fertility_below_floor() {
        let catalog = builtin_catalog();
        let state = GameState::new_run(&catalog, &small_defaults(), "sahel", Some(2)).unwrap();
        let mut snapshot = state.to_snapshot();
        snapshot.cells[0].fertility = 0.05;
        let err = GameState::restore(snapshot, &catalog).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSnapshot { .. }));

        let mut snapshot = state.to_snapshot();
        snapshot.cells[0].fertility = FERTILITY_FLOOR;
        assert!(GameState::restore(snapshot, &catalog).is_ok());
    }

    #[test]
    fn resolving_unknown_event_fails() {
        let catalog = builtin_catalog();
        let mut state = GameState::new_run(&catalog, &small_defaults(), "sahel", Some(2)).unwrap();
        let err = state.resolve_event(EventId::new()).unwrap_err();
        assert!(matches!(err, CoreError::EventNotFound(_)));
    }
}
