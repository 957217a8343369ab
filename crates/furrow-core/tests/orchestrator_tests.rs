//! Integration tests for the run orchestrator.
//!
//! Covers the mutation lease under real thread contention, financing
//! through whole seasons and the event log.

#![allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;
use std::thread;

use furrow_core::{CoreError, InMemoryRunStore, Orchestrator, RunDefaults};
use furrow_types::{CropKey, Layer, PlanFields, PlanPatch, ShockKind};
use furrow_world::builtin_catalog;

fn orchestrator(grid_size: usize) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        Arc::new(builtin_catalog()),
        Arc::new(InMemoryRunStore::new()),
        RunDefaults {
            grid_size,
            ..RunDefaults::default()
        },
        0.02,
    ))
}

#[test]
fn concurrent_ticks_on_one_run_never_overlap() {
    let orch = orchestrator(16);
    let run = orch.new_run("california", Some(1337)).unwrap().run_id;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orch = Arc::clone(&orch);
            thread::spawn(move || {
                let mut done = 0_u64;
                let mut busy = 0_u64;
                for _ in 0..10 {
                    match orch.tick(run) {
                        Ok(_) => done += 1,
                        Err(CoreError::RunBusy(_)) => busy += 1,
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
                (done, busy)
            })
        })
        .collect();

    let (done, busy) = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .fold((0, 0), |(d, b), (dd, bb)| (d + dd, b + bb));
    assert_eq!(done + busy, 80);

    // Every accepted tick was persisted exactly once.
    assert_eq!(orch.overview(run).unwrap().turn, done);
    assert!(orch.lease(run).is_ok());
}

#[test]
fn separate_runs_tick_in_parallel() {
    let orch = orchestrator(8);
    let runs: Vec<_> = ["california", "amu_darya", "sahel"]
        .iter()
        .map(|region| orch.new_run(region, None).unwrap().run_id)
        .collect();

    let handles: Vec<_> = runs
        .iter()
        .map(|&run| {
            let orch = Arc::clone(&orch);
            thread::spawn(move || {
                for _ in 0..8 {
                    orch.tick(run).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for run in runs {
        let overview = orch.overview(run).unwrap();
        assert_eq!(overview.turn, 8);
        assert_eq!(overview.year, 2016);
    }
}

#[test]
fn loan_is_repaid_over_its_term() {
    let orch = orchestrator(4);
    let run = orch.new_run("sahel", None).unwrap().run_id;
    let cash_before = orch.overview(run).unwrap().finance.cash;

    orch.take_loan(run, 1000.0, 4).unwrap();
    assert_eq!(orch.overview(run).unwrap().finance.cash, cash_before + 1000.0);

    for _ in 0..4 {
        orch.tick(run).unwrap();
    }
    let report = orch.finance_report(run, None).unwrap();
    assert_eq!(report.seasons, 4);
    assert!((report.repayments - 1000.0).abs() < 1e-9);
    assert!(report.active_loans.is_empty());
    assert_eq!(report.outstanding_debt, 0.0);

    // Fallow farm: no income or cost, so cash is back where it started.
    let cash_after = orch.overview(run).unwrap().finance.cash;
    assert!((cash_after - cash_before).abs() < 1e-9);
}

#[test]
fn insurance_premiums_accrue_every_season() {
    let orch = orchestrator(4);
    let run = orch.new_run("amu_darya", Some(9)).unwrap().run_id;
    let policy = orch.insure(run, ShockKind::HeatWave, 2000.0).unwrap();
    assert!((policy.premium - 40.0).abs() < 1e-12);

    let mut payouts = 0.0;
    for _ in 0..8 {
        let summary = orch.tick(run).unwrap();
        assert!((summary.financing.premiums - 40.0).abs() < 1e-12);
        let expected = match summary.event.map(|e| e.kind) {
            Some(ShockKind::HeatWave) => 2000.0,
            _ => 0.0,
        };
        assert_eq!(summary.financing.payouts, expected);
        payouts += expected;
    }

    let report = orch.finance_report(run, Some(2014)).unwrap();
    assert_eq!(report.seasons, 4);
    assert!((report.premiums - 160.0).abs() < 1e-9);
    let whole_run = orch.finance_report(run, None).unwrap();
    assert_eq!(whole_run.payouts, payouts);
    assert_eq!(whole_run.policies.len(), 1);
}

#[test]
fn events_can_be_listed_and_resolved() {
    let orch = orchestrator(4);
    let run = orch.new_run("sahel", Some(4)).unwrap().run_id;
    for _ in 0..40 {
        orch.tick(run).unwrap();
    }
    let events = orch.events(run).unwrap();
    assert_eq!(orch.overview(run).unwrap().open_events, events.len());

    if let Some(first) = events.first() {
        let resolved = orch.resolve_event(run, first.id).unwrap();
        assert_eq!(resolved.id, first.id);
        assert_eq!(orch.events(run).unwrap().len(), events.len() - 1);
        assert!(matches!(
            orch.resolve_event(run, first.id),
            Err(CoreError::EventNotFound(_))
        ));
    }
}

#[test]
fn plans_change_the_next_tick() {
    let orch = orchestrator(4);
    let run = orch.new_run("california", Some(12)).unwrap().run_id;
    let crops = PlanFields::from(PlanPatch::Crops {
        crop: CropKey::from("alfalfa"),
    });
    let irrigate = PlanFields::from(PlanPatch::Irrigation { enabled: true });
    let all: Vec<usize> = (0..16).collect();
    orch.apply_plan(run, &all, &crops).unwrap();
    orch.apply_plan(run, &all, &irrigate).unwrap();

    let before = orch.layer(run, Layer::Fertility).unwrap();
    let summary = orch.tick(run).unwrap();
    assert!(summary.income > 0.0);
    assert!((summary.cost - 16.0 * 1.2).abs() < 1e-9);

    let after = orch.layer(run, Layer::Fertility).unwrap();
    for (row_before, row_after) in before.values.iter().zip(&after.values) {
        for (b, a) in row_before.iter().zip(row_after) {
            assert!(a > b);
        }
    }
}

#[test]
fn restore_replaces_run_state() {
    let orch = orchestrator(4);
    let run = orch.new_run("sahel", Some(2)).unwrap().run_id;
    let snapshot = orch.snapshot(run).unwrap();
    orch.tick(run).unwrap();
    assert_eq!(orch.overview(run).unwrap().turn, 1);

    let overview = orch.restore(snapshot).unwrap();
    assert_eq!(overview.run_id, run);
    assert_eq!(orch.overview(run).unwrap().turn, 0);
    assert_eq!(orch.run_ids().unwrap(), vec![run]);
}
