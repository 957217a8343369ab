//! Catalog, climate, soil physics and farm grid for the Furrow simulation.
//!
//! This crate models the physical side of a run: what crops and regions
//! exist, how each season's weather and shocks are drawn, and how a single
//! cell's moisture, salinity, fertility and vegetation respond.
//!
//! # Modules
//!
//! - [`builtin`] -- Default catalog (six crops, three regions).
//! - [`catalog`] -- Crop, region, practice and infrastructure parameters,
//!   loadable from YAML, with fallow fallback for unknown crops.
//! - [`climate`] -- Region shock multipliers and seeded shock rolls.
//! - [`error`] -- Error types for catalog loading and grid construction.
//! - [`farm`] -- The square cell grid, plan addressing and layer export.
//! - [`render`] -- Grayscale rasters of layers, PNG encoding.
//! - [`soil`] -- The per-cell season update.

pub mod builtin;
pub mod catalog;
pub mod climate;
pub mod error;
pub mod farm;
pub mod render;
pub mod soil;

// Re-export primary types at crate root.
pub use builtin::builtin_catalog;
pub use catalog::{Catalog, CropSpec, InfraSpec, PracticeCosts, RegionSpec, SeasonTable};
pub use climate::{FixedShock, Region, SeededShocks, ShockSource, season_drivers};
pub use error::WorldError;
pub use farm::{DEFAULT_GRID_SIZE, Farm};
pub use render::Raster;
pub use soil::{phenology_factor, update_cell};
