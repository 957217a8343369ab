//! Season clock, tick cycle, finance and run orchestration for Furrow.
//!
//! This crate owns the season tick that drives a run: climate, per-cell
//! updates, the finance barrier, financing and the clock. It also owns run
//! storage and the per-run mutation lease.
//!
//! # Modules
//!
//! - [`accounts`] -- Loans, insurance, ledger and finance reports.
//! - [`clock`] -- Season clock with turn counter and year roll-over.
//! - [`config`] -- Configuration loading from `furrow-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`CoreError`].
//! - [`finance`] -- Season income, cost, score samples and smoothing.
//! - [`orchestrator`] -- [`Orchestrator`], the run-level API.
//! - [`state`] -- [`GameState`] and snapshot round-trips.
//! - [`store`] -- [`RunStore`] trait and [`InMemoryRunStore`].
//! - [`tick`] -- The season tick.
//!
//! [`CoreError`]: error::CoreError
//! [`Orchestrator`]: orchestrator::Orchestrator
//! [`GameState`]: state::GameState
//! [`RunStore`]: store::RunStore
//! [`InMemoryRunStore`]: store::InMemoryRunStore

pub mod accounts;
pub mod clock;
pub mod config;
pub mod error;
pub mod finance;
pub mod orchestrator;
pub mod state;
pub mod store;
pub mod tick;

pub use error::CoreError;
pub use orchestrator::{Orchestrator, RunLease};
pub use state::{GameState, RunDefaults};
pub use store::{InMemoryRunStore, RunStore, StoreError};
