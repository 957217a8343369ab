//! Tick cycle: one call advances a run by one season.
//!
//! Each tick runs through these phases:
//!
//! 1. **Climate** -- reset the region's shocks, draw this season's roll and
//!    compute effective rain and temperature. A fired shock is appended to
//!    the run's event log.
//!
//! 2. **Cells** -- update moisture, salinity, fertility and NDVI of every
//!    cell from the drivers and its plan. Cells are independent.
//!
//! 3. **Aggregate** -- once all cells are done, sum income and cost, move
//!    cash and smooth the scores.
//!
//! 4. **Financing** -- settle loan installments, premiums and payouts and
//!    append the ledger line.
//!
//! 5. **Clock** -- `turn += 1`, next season, `year += 1` after winter.
//!
//! A tick does no I/O and cannot fail on a valid state. Given the same
//! state and the same shock rolls it produces the same result.

use furrow_types::{EventId, LedgerLine, SeasonEvent, TickSummary};
use furrow_world::{Catalog, SeededShocks, ShockSource, season_drivers, update_cell};
use tracing::{debug, info};

use crate::accounts;
use crate::finance;
use crate::state::GameState;

/// Advance a run by one season using its own seeded shock stream.
pub fn tick(state: &mut GameState, catalog: &Catalog) -> TickSummary {
    let mut shocks = SeededShocks::new(state.seed);
    run_tick(state, catalog, &mut shocks)
}

/// Advance a run by one season, drawing the shock roll from `source`.
pub fn run_tick(
    state: &mut GameState,
    catalog: &Catalog,
    source: &mut dyn ShockSource,
) -> TickSummary {
    let year = state.clock.year();
    let season = state.clock.season();
    let turn = state.clock.turn();
    let simulated_turn = turn.saturating_add(1);

    // Phase 1: Climate
    let (drivers, fired) = season_drivers(&mut state.region, season, turn, source);
    let event = fired.map(|kind| SeasonEvent {
        id: EventId::new(),
        kind,
        turn: simulated_turn,
        year,
        season,
        rain_shock: drivers.shock_rain,
        temp_shock: drivers.shock_temp,
    });
    if let Some(event) = &event {
        info!(
            run_id = %state.id,
            kind = ?event.kind,
            year,
            season = season.as_str(),
            "Shock fired"
        );
        state.events.push(event.clone());
    }

    // Phase 2: Cells
    for cell in state.farm.cells_mut() {
        let crop = catalog.crop(&cell.plan.crop);
        update_cell(cell, &drivers, crop, season);
    }

    // Phase 3: Aggregate
    let result = finance::aggregate(&mut state.finance, &state.farm, catalog);

    // Phase 4: Financing
    let financing = accounts::settle_season(&mut state.accounts, fired);
    state.finance.cash += financing.net();
    accounts::record(
        &mut state.accounts,
        LedgerLine {
            turn: simulated_turn,
            year,
            season,
            income: result.totals.income,
            cost: result.totals.cost,
            financing,
        },
    );

    // Phase 5: Clock
    let new_year = state.clock.advance();
    if new_year {
        debug!(run_id = %state.id, year = state.clock.year(), "Year closed");
    }

    info!(
        run_id = %state.id,
        turn = state.clock.turn(),
        year,
        season = season.as_str(),
        income = result.totals.income,
        cost = result.totals.cost,
        cash = state.finance.cash,
        "Tick complete"
    );

    TickSummary {
        run_id: state.id,
        turn: state.clock.turn(),
        year,
        season,
        next_year: state.clock.year(),
        next_season: state.clock.season(),
        drivers,
        event,
        income: result.totals.income,
        cost: result.totals.cost,
        financing,
        cash: state.finance.cash,
        scores: state.finance.scores,
        samples: result.samples,
        layers: state.farm.layers(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::state::RunDefaults;
    use furrow_types::{Season, ShockKind};
    use furrow_world::{FixedShock, builtin_catalog};

    fn run(region: &str) -> GameState {
        let defaults = RunDefaults {
            grid_size: 6,
            ..RunDefaults::default()
        };
        GameState::new_run(&builtin_catalog(), &defaults, region, Some(42)).unwrap()
    }

    #[test]
    fn tick_advances_clock_and_reports_simulated_season() {
        let catalog = builtin_catalog();
        let mut state = run("california");
        let summary = tick(&mut state, &catalog);
        assert_eq!(summary.turn, 1);
        assert_eq!(summary.season, Season::Spring);
        assert_eq!(summary.next_season, Season::Summer);
        assert_eq!(summary.year, 2014);
        assert_eq!(summary.layers.ndvi.len(), 6);
        assert_eq!(state.accounts.ledger.len(), 1);
    }

    #[test]
    fn fired_shock_is_logged() {
        let catalog = builtin_catalog();
        let mut state = run("california");
        let summary = run_tick(&mut state, &catalog, &mut FixedShock(0.0));
        let event = summary.event.unwrap();
        assert_eq!(event.kind, ShockKind::Drought);
        assert_eq!(event.turn, 1);
        assert_eq!(event.rain_shock, 0.55);
        assert_eq!(state.events.len(), 1);
        assert_eq!(state.events[0].id, event.id);
    }

    #[test]
    fn quiet_season_logs_nothing() {
        let catalog = builtin_catalog();
        let mut state = run("california");
        let summary = run_tick(&mut state, &catalog, &mut FixedShock(0.99));
        assert!(summary.event.is_none());
        assert!(state.events.is_empty());
        assert_eq!(summary.drivers.shock_rain, 1.0);
    }

    #[test]
    fn financing_does_not_touch_income_or_samples() {
        let catalog = builtin_catalog();
        let mut plain = run("sahel");
        let mut financed = plain.clone();
        accounts::take_loan(&mut financed.accounts, &mut financed.finance, 800.0, 4).unwrap();
        accounts::insure(&mut financed.accounts, ShockKind::Flood, 1000.0, 0.02).unwrap();

        let a = run_tick(&mut plain, &catalog, &mut FixedShock(0.5));
        let b = run_tick(&mut financed, &catalog, &mut FixedShock(0.5));
        assert_eq!(a.income, b.income);
        assert_eq!(a.cost, b.cost);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.scores, b.scores);
        assert!((b.financing.repayments - 200.0).abs() < 1e-9);
        assert!((b.financing.premiums - 20.0).abs() < 1e-9);
        assert!((b.cash - (a.cash + 800.0 - 220.0)).abs() < 1e-6);
    }
}
