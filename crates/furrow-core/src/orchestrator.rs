//! Run orchestration: the entry point the service layer talks to.
//!
//! The [`Orchestrator`] owns the catalog and a [`RunStore`] and exposes
//! every run operation. Mutations (tick, plan updates, event resolution,
//! financing) lease the run first: at most one mutation per run is in
//! flight, and a second concurrent one is rejected with
//! [`CoreError::RunBusy`] rather than queued. Different runs proceed in
//! parallel.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use furrow_types::{
    EventId, FinanceReport, GameSnapshot, InsurancePolicy, Layer, LayerGrid, Loan, PlanFields,
    PlanReport, RunId, RunOverview, SeasonEvent, ShockKind, TickSummary,
};
use furrow_world::Catalog;
use tracing::warn;

use crate::accounts;
use crate::error::CoreError;
use crate::state::{GameState, RunDefaults};
use crate::store::RunStore;
use crate::tick;

/// Exclusive right to mutate one run. Released on drop.
#[derive(Debug)]
pub struct RunLease<'a> {
    in_flight: &'a Mutex<BTreeSet<RunId>>,
    id: RunId,
}

impl RunLease<'_> {
    /// The leased run.
    pub const fn id(&self) -> RunId {
        self.id
    }
}

impl Drop for RunLease<'_> {
    fn drop(&mut self) {
        lock_ignoring_poison(self.in_flight).remove(&self.id);
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coordinates runs held in a [`RunStore`].
pub struct Orchestrator {
    catalog: Arc<Catalog>,
    store: Arc<dyn RunStore>,
    defaults: RunDefaults,
    premium_rate: f64,
    in_flight: Mutex<BTreeSet<RunId>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("defaults", &self.defaults)
            .field("premium_rate", &self.premium_rate)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator over `store`.
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn RunStore>,
        defaults: RunDefaults,
        premium_rate: f64,
    ) -> Self {
        Self {
            catalog,
            store,
            defaults,
            premium_rate,
            in_flight: Mutex::new(BTreeSet::new()),
        }
    }

    /// The catalog runs are simulated against.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Defaults applied to new runs.
    pub const fn defaults(&self) -> &RunDefaults {
        &self.defaults
    }

    /// Take the mutation lease on a run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RunBusy`] if another mutation holds it.
    pub fn lease(&self, id: RunId) -> Result<RunLease<'_>, CoreError> {
        let mut in_flight = lock_ignoring_poison(&self.in_flight);
        if !in_flight.insert(id) {
            warn!(run_id = %id, "Run busy, mutation rejected");
            return Err(CoreError::RunBusy(id));
        }
        Ok(RunLease {
            in_flight: &self.in_flight,
            id,
        })
    }

    // -----------------------------------------------------------------------
    // Runs
    // -----------------------------------------------------------------------

    /// Create and store a new run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::World`] for an unknown region, or
    /// [`CoreError::Store`] if the run cannot be stored.
    pub fn new_run(&self, region_code: &str, seed: Option<u64>) -> Result<RunOverview, CoreError> {
        let state = GameState::new_run(&self.catalog, &self.defaults, region_code, seed)?;
        let overview = state.overview();
        self.store.put(state)?;
        Ok(overview)
    }

    /// Ids of all runs.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the store fails.
    pub fn run_ids(&self) -> Result<Vec<RunId>, CoreError> {
        Ok(self.store.run_ids()?)
    }

    /// Overview of one run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RunNotFound`] or [`CoreError::Store`].
    pub fn overview(&self, id: RunId) -> Result<RunOverview, CoreError> {
        Ok(self.load(id)?.overview())
    }

    /// Advance a run by one season.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RunBusy`], [`CoreError::RunNotFound`] or
    /// [`CoreError::Store`]. The tick itself cannot fail.
    pub fn tick(&self, id: RunId) -> Result<TickSummary, CoreError> {
        self.mutate(id, |state, catalog| Ok(tick::tick(state, catalog)))
    }

    /// Merge one partial plan into each listed cell.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for an update that changes
    /// nothing, or [`CoreError::RunBusy`], [`CoreError::RunNotFound`],
    /// [`CoreError::Store`].
    pub fn apply_plan(
        &self,
        id: RunId,
        cells: &[usize],
        fields: &PlanFields,
    ) -> Result<PlanReport, CoreError> {
        if fields.is_empty() {
            return Err(CoreError::invalid("plan update changes nothing"));
        }
        self.mutate(id, |state, _| Ok(state.apply_plan_to(cells, fields)))
    }

    /// One layer of a run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RunNotFound`] or [`CoreError::Store`].
    pub fn layer(&self, id: RunId, layer: Layer) -> Result<LayerGrid, CoreError> {
        Ok(self.load(id)?.get_layer(layer))
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Serializable copy of a run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RunNotFound`] or [`CoreError::Store`].
    pub fn snapshot(&self, id: RunId) -> Result<GameSnapshot, CoreError> {
        Ok(self.load(id)?.to_snapshot())
    }

    /// Rebuild a run from a snapshot, replacing any run with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSnapshot`] or [`CoreError::World`] for a
    /// bad snapshot, [`CoreError::RunBusy`] if the id is being mutated, or
    /// [`CoreError::Store`].
    pub fn restore(&self, snapshot: GameSnapshot) -> Result<RunOverview, CoreError> {
        let _lease = self.lease(snapshot.run_id)?;
        let state = GameState::restore(snapshot, &self.catalog)?;
        let overview = state.overview();
        self.store.put(state)?;
        Ok(overview)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Open season events of a run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RunNotFound`] or [`CoreError::Store`].
    pub fn events(&self, id: RunId) -> Result<Vec<SeasonEvent>, CoreError> {
        Ok(self.load(id)?.events)
    }

    /// Acknowledge and remove an event.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EventNotFound`] plus the usual lookup errors.
    pub fn resolve_event(&self, id: RunId, event_id: EventId) -> Result<SeasonEvent, CoreError> {
        self.mutate(id, |state, _| state.resolve_event(event_id))
    }

    // -----------------------------------------------------------------------
    // Financing
    // -----------------------------------------------------------------------

    /// Take a loan on a run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for a bad amount or term, plus
    /// the usual lookup errors.
    pub fn take_loan(&self, id: RunId, amount: f64, term_seasons: u32) -> Result<Loan, CoreError> {
        self.mutate(id, |state, _| {
            accounts::take_loan(&mut state.accounts, &mut state.finance, amount, term_seasons)
        })
    }

    /// Buy an insurance policy on a run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for a bad sum, plus the usual
    /// lookup errors.
    pub fn insure(
        &self,
        id: RunId,
        coverage: ShockKind,
        sum_insured: f64,
    ) -> Result<InsurancePolicy, CoreError> {
        let rate = self.premium_rate;
        self.mutate(id, |state, _| {
            accounts::insure(&mut state.accounts, coverage, sum_insured, rate)
        })
    }

    /// Ledger summary of a run, optionally for one year.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RunNotFound`] or [`CoreError::Store`].
    pub fn finance_report(&self, id: RunId, year: Option<i32>) -> Result<FinanceReport, CoreError> {
        Ok(accounts::report(&self.load(id)?.accounts, year))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn load(&self, id: RunId) -> Result<GameState, CoreError> {
        self.store.get(&id)?.ok_or(CoreError::RunNotFound(id))
    }

    /// Lease, load, mutate and store a run. Nothing is stored if `f` fails.
    fn mutate<T>(
        &self,
        id: RunId,
        f: impl FnOnce(&mut GameState, &Catalog) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let _lease = self.lease(id)?;
        let mut state = self.load(id)?;
        let out = f(&mut state, &self.catalog)?;
        self.store.put(state)?;
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryRunStore;
    use furrow_types::PlanPatch;
    use furrow_world::builtin_catalog;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            Arc::new(builtin_catalog()),
            Arc::new(InMemoryRunStore::new()),
            RunDefaults {
                grid_size: 4,
                ..RunDefaults::default()
            },
            0.02,
        )
    }

    #[test]
    fn held_lease_rejects_tick() {
        let orch = orchestrator();
        let run = orch.new_run("california", None).unwrap();
        let lease = orch.lease(run.run_id).unwrap();
        assert!(matches!(orch.tick(run.run_id), Err(CoreError::RunBusy(_))));
        drop(lease);
        assert!(orch.tick(run.run_id).is_ok());
    }

    #[test]
    fn other_runs_are_not_blocked() {
        let orch = orchestrator();
        let a = orch.new_run("california", Some(1)).unwrap();
        let b = orch.new_run("sahel", Some(2)).unwrap();
        let _lease = orch.lease(a.run_id).unwrap();
        assert!(orch.tick(b.run_id).is_ok());
    }

    #[test]
    fn unknown_run_is_not_found() {
        let orch = orchestrator();
        assert!(matches!(orch.tick(RunId::new()), Err(CoreError::RunNotFound(_))));
        assert!(matches!(orch.overview(RunId::new()), Err(CoreError::RunNotFound(_))));
    }

    #[test]
    fn tick_is_persisted() {
        let orch = orchestrator();
        let run = orch.new_run("amu_darya", None).unwrap();
        orch.tick(run.run_id).unwrap();
        orch.tick(run.run_id).unwrap();
        assert_eq!(orch.overview(run.run_id).unwrap().turn, 2);
    }

    #[test]
    fn empty_plan_update_is_rejected() {
        let orch = orchestrator();
        let run = orch.new_run("sahel", None).unwrap();
        let err = orch
            .apply_plan(run.run_id, &[0], &PlanFields::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest { .. }));
    }

    #[test]
    fn failed_mutation_stores_nothing() {
        let orch = orchestrator();
        let run = orch.new_run("sahel", None).unwrap();
        assert!(orch.take_loan(run.run_id, -5.0, 4).is_err());
        let report = orch.finance_report(run.run_id, None).unwrap();
        assert!(report.active_loans.is_empty());
        assert!(orch.lease(run.run_id).is_ok());
    }

    #[test]
    fn plan_update_reaches_store() {
        let orch = orchestrator();
        let run = orch.new_run("sahel", None).unwrap();
        let fields = PlanFields::from(PlanPatch::Drainage { enabled: true });
        let report = orch.apply_plan(run.run_id, &[1, 2, 40], &fields).unwrap();
        assert_eq!(report.applied, 2);
        assert_eq!(report.ignored, vec![40]);
        let snapshot = orch.snapshot(run.run_id).unwrap();
        assert!(snapshot.cells[1].plan.drainage);
        assert!(!snapshot.cells[0].plan.drainage);
    }
}
