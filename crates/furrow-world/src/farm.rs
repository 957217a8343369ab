//! The farm grid: a square, row-major array of cells.
//!
//! Cell `(x, y)` lives at linear index `y * size + x`. Plans are addressed
//! by linear index; indices outside the grid are ignored without touching
//! any cell.
//!
//! New grids are initialized from low-frequency sinusoids of the cell
//! coordinates. The run seed picks the phase of the pattern, so two farms
//! built from the same seed are identical and different seeds give
//! different (but equally smooth) landscapes.

use std::f64::consts::TAU;

use furrow_types::{Cell, CellPlan, CropKey, Layer, LayerGrid, LayerSet, PlanFields, PlanOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::WorldError;
use crate::soil::{FERTILITY_CEILING, FERTILITY_FLOOR, clamp01};

/// Default side length of a farm grid.
pub const DEFAULT_GRID_SIZE: usize = 32;

/// Lowest NDVI a freshly initialized cell can have.
const INITIAL_NDVI_FLOOR: f64 = 0.1;

/// Phase offsets chosen from the run seed.
#[derive(Debug, Clone, Copy)]
struct Phase {
    x: f64,
    y: f64,
}

/// A square grid of cells owned by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Farm {
    size: usize,
    cells: Vec<Cell>,
}

impl Farm {
    /// Build a freshly initialized farm from a seed.
    ///
    /// Every cell starts fallow with no irrigation or drainage.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGridSize`] for a zero size or one whose
    /// cell count overflows.
    pub fn seeded(size: usize, seed: u64) -> Result<Self, WorldError> {
        let count = cell_count(size)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let phase = Phase {
            x: rng.random_range(0.0..TAU),
            y: rng.random_range(0.0..TAU),
        };

        let cells = (0..count)
            .map(|index| {
                let x = coord(index.checked_rem(size).unwrap_or(0));
                let y = coord(index.checked_div(size).unwrap_or(0));
                initial_cell(x, y, phase)
            })
            .collect();

        debug!(size, seed, "Farm initialized");
        Ok(Self { size, cells })
    }

    /// Rebuild a farm from a stored cell array.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGridSize`] or
    /// [`WorldError::CellCountMismatch`] if the cells do not fill the grid.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<Self, WorldError> {
        let expected = cell_count(size)?;
        if cells.len() != expected {
            return Err(WorldError::CellCountMismatch {
                size,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { size, cells })
    }

    /// Side length of the grid.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the farm has no cells (never true for a constructed farm).
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable access to all cells in row-major order.
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Consume the farm and return its cells.
    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// The cell at a linear index.
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Linear index of `(x, y)`, or `None` if outside the grid.
    pub fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.size || y >= self.size {
            return None;
        }
        y.checked_mul(self.size)?.checked_add(x)
    }

    /// Coordinates `(x, y)` of a linear index, or `None` if outside the grid.
    pub fn coords(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.cells.len() {
            return None;
        }
        Some((index.checked_rem(self.size)?, index.checked_div(self.size)?))
    }

    /// Merge a partial plan into one cell. Out-of-range indices are ignored.
    pub fn apply_plan(&mut self, index: usize, fields: &PlanFields) -> PlanOutcome {
        match self.cells.get_mut(index) {
            Some(cell) => {
                cell.plan.merge(fields);
                PlanOutcome::Applied
            }
            None => PlanOutcome::Ignored,
        }
    }

    /// Replace every cell's plan.
    pub fn set_all_plans(&mut self, plan: &CellPlan) {
        for cell in &mut self.cells {
            cell.plan.clone_from(plan);
        }
    }

    /// Flat values of one layer in row-major order.
    pub fn values(&self, layer: Layer) -> Vec<f64> {
        self.cells.iter().map(|cell| layer_value(cell, layer)).collect()
    }

    /// One layer as rows of values.
    pub fn layer(&self, layer: Layer) -> LayerGrid {
        LayerGrid {
            layer,
            size: self.size,
            values: self.rows(layer),
        }
    }

    /// All four layers.
    pub fn layers(&self) -> LayerSet {
        LayerSet {
            ndvi: self.rows(Layer::Ndvi),
            moisture: self.rows(Layer::Moisture),
            salinity: self.rows(Layer::Salinity),
            fertility: self.rows(Layer::Fertility),
        }
    }

    fn rows(&self, layer: Layer) -> Vec<Vec<f64>> {
        // size >= 1 is guaranteed by the constructors.
        self.cells
            .chunks(self.size.max(1))
            .map(|row| row.iter().map(|cell| layer_value(cell, layer)).collect())
            .collect()
    }
}

/// Read one layer's value from a cell.
pub const fn layer_value(cell: &Cell, layer: Layer) -> f64 {
    match layer {
        Layer::Ndvi => cell.ndvi,
        Layer::Moisture => cell.moisture,
        Layer::Salinity => cell.salinity,
        Layer::Fertility => cell.fertility,
    }
}

fn cell_count(size: usize) -> Result<usize, WorldError> {
    if size == 0 {
        return Err(WorldError::InvalidGridSize(size));
    }
    size.checked_mul(size)
        .ok_or(WorldError::InvalidGridSize(size))
}

/// Grid coordinate as a float. Grids are far smaller than `u32::MAX`.
fn coord(value: usize) -> f64 {
    u32::try_from(value).map_or(f64::from(u32::MAX), f64::from)
}

fn initial_cell(x: f64, y: f64, phase: Phase) -> Cell {
    let moisture = clamp01(0.4 + 0.1 * (x / 7.0 + phase.x).sin() + 0.05 * (y / 5.0 + phase.y).cos());
    let salinity =
        clamp01(0.2 + 0.1 * (x / 13.0 + phase.x).sin() * (y / 11.0 + phase.y).cos());
    let fertility = (0.55 + 0.1 * (x / 9.0 + phase.x).cos() * (y / 9.0 + phase.y).cos())
        .clamp(FERTILITY_FLOOR, FERTILITY_CEILING);
    let ndvi = clamp01((fertility - salinity * 0.25).max(INITIAL_NDVI_FLOOR));

    Cell {
        fertility,
        salinity,
        moisture,
        ndvi,
        last_crop: CropKey::fallow(),
        plan: CellPlan::default(),
    }
}
