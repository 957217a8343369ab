//! Shared type definitions for the Furrow farm simulation.
//!
//! This crate is the single source of truth for the data that crosses crate
//! boundaries: grid cells, plans, finance state, tick results and snapshots.
//! Types flow downstream to `TypeScript` via `ts-rs` for map and dashboard
//! clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for runs, events, loans and policies
//! - [`enums`] -- Seasons, layers, shock kinds and catalog classifications
//! - [`structs`] -- Cells, finance, events, layers, tick summaries, snapshots
//! - [`plan`] -- Tagged plan patches and the partial fields the core merges

pub mod enums;
pub mod ids;
pub mod plan;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{InfraCategory, Layer, Normalization, Season, ShockKind, SoilRole};
pub use ids::{EventId, LoanId, PolicyId, RunId};
pub use plan::{PlanFields, PlanOutcome, PlanPatch, PlanReport};
pub use structs::{
    Accounts, Cell, CellPlan, ClimateDrivers, CropKey, Finance, FinanceReport, FinancingFlows,
    GameSnapshot, InsurancePolicy, LayerGrid, LayerSet, LedgerLine, Loan, RunOverview, Scores,
    SeasonEvent, TickSummary,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::RunId::export_all();
        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::LoanId::export_all();
        let _ = crate::ids::PolicyId::export_all();

        // Enums
        let _ = crate::enums::Season::export_all();
        let _ = crate::enums::Layer::export_all();
        let _ = crate::enums::ShockKind::export_all();
        let _ = crate::enums::SoilRole::export_all();
        let _ = crate::enums::InfraCategory::export_all();
        let _ = crate::enums::Normalization::export_all();

        // Structs
        let _ = crate::structs::CropKey::export_all();
        let _ = crate::structs::CellPlan::export_all();
        let _ = crate::structs::Cell::export_all();
        let _ = crate::structs::Scores::export_all();
        let _ = crate::structs::Finance::export_all();
        let _ = crate::structs::Loan::export_all();
        let _ = crate::structs::InsurancePolicy::export_all();
        let _ = crate::structs::FinancingFlows::export_all();
        let _ = crate::structs::LedgerLine::export_all();
        let _ = crate::structs::Accounts::export_all();
        let _ = crate::structs::FinanceReport::export_all();
        let _ = crate::structs::ClimateDrivers::export_all();
        let _ = crate::structs::SeasonEvent::export_all();
        let _ = crate::structs::LayerGrid::export_all();
        let _ = crate::structs::LayerSet::export_all();
        let _ = crate::structs::TickSummary::export_all();
        let _ = crate::structs::GameSnapshot::export_all();
        let _ = crate::structs::RunOverview::export_all();

        // Plans
        let _ = crate::plan::PlanPatch::export_all();
        let _ = crate::plan::PlanFields::export_all();
        let _ = crate::plan::PlanOutcome::export_all();
        let _ = crate::plan::PlanReport::export_all();
    }
}
