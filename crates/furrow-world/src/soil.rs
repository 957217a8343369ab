//! Per-cell soil and vegetation update.
//!
//! [`update_cell`] advances one cell by one season. It reads only the cell,
//! the season's climate drivers and the catalog entry of the planned crop,
//! so cells can be updated in any order (or in parallel) with identical
//! results.
//!
//! # Update order
//!
//! 1. Moisture: rain plus irrigation minus evapotranspiration.
//! 2. Salinity: irrigation without drainage adds salt; rain and drainage
//!    leach it.
//! 3. Fertility: depends on the crop's [`SoilRole`].
//! 4. NDVI: relaxes toward a growth target scaled by season phenology.
//! 5. `last_crop` records the planted crop.

use furrow_types::{Cell, ClimateDrivers, Season, SoilRole};

use crate::catalog::CropSpec;

/// Evapotranspiration at zero temperature.
pub const ET_BASE: f64 = 0.25;

/// Evapotranspiration added per unit temperature.
pub const ET_PER_TEMP: f64 = 0.35;

/// Moisture added by irrigation in one season.
pub const IRRIGATION_BOOST: f64 = 0.25;

/// Salt deposited by irrigation without drainage, per unit of `0.5 + water_need`.
pub const IRRIGATION_SALT: f64 = 0.05;

/// Salt leached per unit of rain (and of weighted drainage).
pub const LEACH_RATE: f64 = 0.04;

/// Weight of drainage relative to rain in leaching.
pub const DRAINAGE_LEACH_WEIGHT: f64 = 0.4;

/// Lower bound on fertility.
pub const FERTILITY_FLOOR: f64 = 0.2;

/// Upper bound on fertility.
pub const FERTILITY_CEILING: f64 = 1.0;

/// Floor on salt-tolerance denominators.
pub const TOLERANCE_FLOOR: f64 = 1e-3;

/// Growth target bounds.
pub const GROWTH_MIN: f64 = 0.05;

/// See [`GROWTH_MIN`].
pub const GROWTH_MAX: f64 = 0.95;

/// Weight kept from last season's NDVI.
pub const NDVI_MEMORY: f64 = 0.6;

/// Fertility change for one season of the given soil role.
pub const fn fertility_delta(role: SoilRole) -> f64 {
    match role {
        SoilRole::Builder => 0.02,
        SoilRole::Exhaustive => -0.01,
        SoilRole::Neutral => 0.005,
    }
}

/// Fraction of the growth target expressed in each season.
pub const fn phenology_factor(season: Season) -> f64 {
    match season {
        Season::Spring => 0.9,
        Season::Summer => 1.0,
        Season::Autumn => 0.8,
        Season::Winter => 0.5,
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Growth target for a cell whose moisture, salinity and fertility have
/// already been updated this season.
pub fn growth_target(crop: &CropSpec, moisture: f64, salinity: f64, fertility: f64) -> f64 {
    let unmet_water = (crop.water_need - moisture).max(0.0);
    let tolerance = crop.salt_tolerance.max(TOLERANCE_FLOOR);
    let salt_stress = (salinity - 0.5 * tolerance).max(0.0);
    let growth = crop.ndvi_peak
        * (1.0 - 0.6 * unmet_water - 0.5 * salt_stress)
        * (0.8 + 0.4 * fertility);
    if growth.is_nan() {
        GROWTH_MIN
    } else {
        growth.clamp(GROWTH_MIN, GROWTH_MAX)
    }
}

/// Advance one cell by one season.
///
/// `crop` must be the catalog entry resolved from `cell.plan.crop` (fallow
/// for unknown keys).
pub fn update_cell(cell: &mut Cell, drivers: &ClimateDrivers, crop: &CropSpec, season: Season) {
    let irrigating = cell.plan.irrigation;
    let draining = cell.plan.drainage;

    let evapotranspiration = ET_BASE + ET_PER_TEMP * drivers.temp;
    let boost = if irrigating { IRRIGATION_BOOST } else { 0.0 };
    cell.moisture = clamp01(cell.moisture + drivers.rain + boost - evapotranspiration);

    let mut salinity = cell.salinity;
    if irrigating && !draining {
        salinity += IRRIGATION_SALT * (0.5 + crop.water_need);
    }
    let drain_flag = if draining { 1.0 } else { 0.0 };
    salinity -= LEACH_RATE * (drivers.rain + DRAINAGE_LEACH_WEIGHT * drain_flag);
    cell.salinity = clamp01(salinity);

    let fertility = cell.fertility + fertility_delta(crop.soil_role);
    cell.fertility = if fertility.is_nan() {
        FERTILITY_FLOOR
    } else {
        fertility.clamp(FERTILITY_FLOOR, FERTILITY_CEILING)
    };

    let target = growth_target(crop, cell.moisture, cell.salinity, cell.fertility)
        * phenology_factor(season);
    cell.ndvi = clamp01(NDVI_MEMORY * cell.ndvi + (1.0 - NDVI_MEMORY) * target);

    if !cell.plan.crop.is_empty() {
        cell.last_crop.clone_from(&cell.plan.crop);
    }
}
