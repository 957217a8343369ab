//! Core entity structs for the Furrow simulation.
//!
//! These are plain data: the rules that mutate them live in
//! `furrow-world` (cell physics) and `furrow-core` (finance, tick cycle).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Layer, Season, ShockKind};
use crate::ids::{EventId, LoanId, PolicyId, RunId};

// ---------------------------------------------------------------------------
// Crops and plans
// ---------------------------------------------------------------------------

/// Name of a crop, resolved against the catalog at simulation time.
///
/// Keys that do not name a catalog crop are not an error: the engine treats
/// them as fallow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CropKey(pub String);

impl CropKey {
    /// Key of the fallback crop used for unknown or empty keys.
    pub const FALLOW: &'static str = "fallow";

    /// Create a crop key from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The fallow crop key.
    pub fn fallow() -> Self {
        Self(Self::FALLOW.to_owned())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty (no crop chosen).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CropKey {
    fn default() -> Self {
        Self::fallow()
    }
}

impl core::fmt::Display for CropKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CropKey {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for CropKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// The player's decision for one cell, applied on the next tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CellPlan {
    /// Crop to grow this season.
    pub crop: CropKey,
    /// Whether the cell is irrigated.
    pub irrigation: bool,
    /// Whether drainage is active.
    pub drainage: bool,
    /// Whether a pest-control programme runs on the cell.
    #[serde(default)]
    pub pest_control: bool,
}

// ---------------------------------------------------------------------------
// Grid cells
// ---------------------------------------------------------------------------

/// One unit of farmland in the region grid.
///
/// Bounded fields are kept in range by the cell engine after every update:
/// `fertility` in `[0.2, 1.0]`, the rest in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Soil fertility.
    pub fertility: f64,
    /// Soil salinity.
    pub salinity: f64,
    /// Soil moisture.
    pub moisture: f64,
    /// Vegetation index.
    pub ndvi: f64,
    /// Crop grown in the most recent simulated season.
    pub last_crop: CropKey,
    /// Plan for the next season.
    pub plan: CellPlan,
}

// ---------------------------------------------------------------------------
// Finance
// ---------------------------------------------------------------------------

/// The four rolling scores tracked per run.
///
/// Also used for the raw per-season samples that feed the smoothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Scores {
    /// Profitability.
    pub economy: f64,
    /// Soil health.
    pub sustain: f64,
    /// Negated spread of moisture and salinity (closer to zero is safer).
    pub risk: f64,
    /// Vegetation produced per unit of spend.
    pub efficiency: f64,
}

/// Running financial state of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Finance {
    /// Cash on hand.
    pub cash: f64,
    /// Exponentially smoothed scores.
    pub scores: Scores,
}

/// A loan taken out by a run, repaid in equal installments each season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Loan {
    /// Loan identifier.
    pub id: LoanId,
    /// Amount borrowed.
    pub principal: f64,
    /// Number of seasons over which the principal is repaid.
    pub term_seasons: u32,
    /// Installments still to pay.
    pub remaining_seasons: u32,
    /// Principal still owed.
    pub outstanding: f64,
}

/// An insurance policy paying out when a covered shock fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InsurancePolicy {
    /// Policy identifier.
    pub id: PolicyId,
    /// Shock kind this policy covers.
    pub coverage: ShockKind,
    /// Amount paid out when the covered shock fires.
    pub sum_insured: f64,
    /// Premium charged every season.
    pub premium: f64,
}

/// Cash flows from loans and insurance settled in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FinancingFlows {
    /// Loan installments paid.
    pub repayments: f64,
    /// Insurance premiums paid.
    pub premiums: f64,
    /// Insurance payouts received.
    pub payouts: f64,
}

impl FinancingFlows {
    /// Net effect on cash.
    pub fn net(&self) -> f64 {
        self.payouts - self.premiums - self.repayments
    }
}

/// One line of the per-season ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerLine {
    /// Turn number of the simulated season (1-based).
    pub turn: u64,
    /// Year of the simulated season.
    pub year: i32,
    /// The simulated season.
    pub season: Season,
    /// Crop revenue.
    pub income: f64,
    /// Operating cost of practices.
    pub cost: f64,
    /// Loan and insurance flows.
    pub financing: FinancingFlows,
}

/// Loans, policies and ledger history of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Accounts {
    /// Loans, including fully repaid ones.
    pub loans: Vec<Loan>,
    /// Active insurance policies.
    pub policies: Vec<InsurancePolicy>,
    /// One line per simulated season.
    pub ledger: Vec<LedgerLine>,
}

/// Aggregated finance report over the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FinanceReport {
    /// Year filter, or `None` for the whole run.
    pub year: Option<i32>,
    /// Number of seasons covered.
    pub seasons: usize,
    /// Total crop revenue.
    pub revenue: f64,
    /// Total operating cost.
    pub opex: f64,
    /// Total premiums paid.
    pub premiums: f64,
    /// Total payouts received.
    pub payouts: f64,
    /// Total loan installments paid.
    pub repayments: f64,
    /// Principal still owed across all loans.
    pub outstanding_debt: f64,
    /// Loans that are not yet repaid.
    pub active_loans: Vec<Loan>,
    /// Policies in force.
    pub policies: Vec<InsurancePolicy>,
}

// ---------------------------------------------------------------------------
// Climate and events
// ---------------------------------------------------------------------------

/// Effective climate drivers for one season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClimateDrivers {
    /// Effective rain (baseline times shock).
    pub rain: f64,
    /// Effective temperature (baseline times shock).
    pub temp: f64,
    /// Rain shock multiplier applied.
    pub shock_rain: f64,
    /// Temperature shock multiplier applied.
    pub shock_temp: f64,
}

/// A shock that fired during a tick, kept in the run's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SeasonEvent {
    /// Event identifier.
    pub id: EventId,
    /// What happened.
    pub kind: ShockKind,
    /// Turn number of the season the shock hit (1-based).
    pub turn: u64,
    /// Year of the season the shock hit.
    pub year: i32,
    /// Season the shock hit.
    pub season: Season,
    /// Rain multiplier applied.
    pub rain_shock: f64,
    /// Temperature multiplier applied.
    pub temp_shock: f64,
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// A single layer as a row-major 2D array (`values[y][x]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LayerGrid {
    /// Which field this grid holds.
    pub layer: Layer,
    /// Side length of the square grid.
    pub size: usize,
    /// Rows of values, each of length `size`.
    pub values: Vec<Vec<f64>>,
}

/// All four layers captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LayerSet {
    /// Vegetation index rows.
    pub ndvi: Vec<Vec<f64>>,
    /// Soil moisture rows.
    pub moisture: Vec<Vec<f64>>,
    /// Soil salinity rows.
    pub salinity: Vec<Vec<f64>>,
    /// Soil fertility rows.
    pub fertility: Vec<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// Tick results and run views
// ---------------------------------------------------------------------------

/// Result of advancing a run by one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickSummary {
    /// The run that was advanced.
    pub run_id: RunId,
    /// Turn counter after the tick.
    pub turn: u64,
    /// Year of the simulated season.
    pub year: i32,
    /// The simulated season.
    pub season: Season,
    /// Year the run is now in.
    pub next_year: i32,
    /// Season the run is now in.
    pub next_season: Season,
    /// Climate drivers used for the season.
    pub drivers: ClimateDrivers,
    /// Shock that fired this season, if any.
    pub event: Option<SeasonEvent>,
    /// Crop revenue.
    pub income: f64,
    /// Operating cost.
    pub cost: f64,
    /// Loan and insurance flows settled after the season.
    pub financing: FinancingFlows,
    /// Cash after the season.
    pub cash: f64,
    /// Smoothed scores after the season.
    pub scores: Scores,
    /// Raw score samples for this season.
    pub samples: Scores,
    /// Grid layers after the season.
    pub layers: LayerSet,
}

/// Serializable capture of a run, sufficient to rebuild it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameSnapshot {
    /// Run identifier.
    pub run_id: RunId,
    /// Seed driving spatial initialization and shock rolls.
    pub seed: u64,
    /// Catalog code of the region.
    pub region_code: String,
    /// Side length of the grid.
    pub grid_size: usize,
    /// Current year.
    pub year: i32,
    /// Current season.
    pub season: Season,
    /// Number of seasons simulated so far.
    pub turn: u64,
    /// Row-major cells, `grid_size * grid_size` long.
    pub cells: Vec<Cell>,
    /// Cash and scores.
    pub finance: Finance,
    /// Loans, policies and ledger.
    #[serde(default)]
    pub accounts: Accounts,
    /// Unresolved season events.
    #[serde(default)]
    pub events: Vec<SeasonEvent>,
}

/// Compact run description returned by the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunOverview {
    /// Run identifier.
    pub run_id: RunId,
    /// Catalog code of the region.
    pub region_code: String,
    /// Human-readable region name.
    pub region_name: String,
    /// Run seed.
    pub seed: u64,
    /// Side length of the grid.
    pub grid_size: usize,
    /// Current year.
    pub year: i32,
    /// Current season.
    pub season: Season,
    /// Number of seasons simulated so far.
    pub turn: u64,
    /// Cash and scores.
    pub finance: Finance,
    /// Number of unresolved season events.
    pub open_events: usize,
    /// When the run was created or restored.
    pub created_at: DateTime<Utc>,
}
