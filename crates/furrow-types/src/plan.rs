//! Plan update types exchanged between the service layer and the core.
//!
//! The service layer accepts one [`PlanPatch`] per request (a tagged variant
//! per plan kind). The core only ever sees [`PlanFields`], an explicit set of
//! optional overrides that is merged into a cell's [`CellPlan`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::structs::{CellPlan, CropKey};

/// A single plan change, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PlanPatch {
    /// Choose the crop for the coming season.
    Crops {
        /// Catalog key of the crop.
        crop: CropKey,
    },
    /// Switch irrigation on or off.
    Irrigation {
        /// Whether to irrigate.
        enabled: bool,
    },
    /// Switch drainage on or off.
    Drainage {
        /// Whether to drain.
        enabled: bool,
    },
    /// Switch the pest-control programme on or off.
    Pests {
        /// Whether to run pest control.
        control: bool,
    },
}

/// Partial plan update; `None` leaves the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlanFields {
    /// New crop, if changing.
    pub crop: Option<CropKey>,
    /// New irrigation flag, if changing.
    pub irrigation: Option<bool>,
    /// New drainage flag, if changing.
    pub drainage: Option<bool>,
    /// New pest-control flag, if changing.
    pub pest_control: Option<bool>,
}

impl From<PlanPatch> for PlanFields {
    fn from(patch: PlanPatch) -> Self {
        match patch {
            PlanPatch::Crops { crop } => Self {
                crop: Some(crop),
                ..Self::default()
            },
            PlanPatch::Irrigation { enabled } => Self {
                irrigation: Some(enabled),
                ..Self::default()
            },
            PlanPatch::Drainage { enabled } => Self {
                drainage: Some(enabled),
                ..Self::default()
            },
            PlanPatch::Pests { control } => Self {
                pest_control: Some(control),
                ..Self::default()
            },
        }
    }
}

impl PlanFields {
    /// Whether this update changes nothing.
    pub const fn is_empty(&self) -> bool {
        self.crop.is_none()
            && self.irrigation.is_none()
            && self.drainage.is_none()
            && self.pest_control.is_none()
    }
}

impl CellPlan {
    /// Merge a partial update into this plan.
    pub fn merge(&mut self, fields: &PlanFields) {
        if let Some(crop) = &fields.crop {
            self.crop.clone_from(crop);
        }
        if let Some(irrigation) = fields.irrigation {
            self.irrigation = irrigation;
        }
        if let Some(drainage) = fields.drainage {
            self.drainage = drainage;
        }
        if let Some(pest_control) = fields.pest_control {
            self.pest_control = pest_control;
        }
    }
}

/// What happened to a plan update aimed at one cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PlanOutcome {
    /// The cell's plan was updated.
    Applied,
    /// The index was outside the grid; nothing changed.
    Ignored,
}

/// Per-request result of applying one update to many cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlanReport {
    /// Number of cells updated.
    pub applied: usize,
    /// Indices that were out of range and skipped.
    pub ignored: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_parses_from_tagged_json() {
        let patch: Result<PlanPatch, _> =
            serde_json::from_str(r#"{"kind":"crops","crop":"alfalfa"}"#);
        assert_eq!(
            patch.ok(),
            Some(PlanPatch::Crops {
                crop: CropKey::from("alfalfa")
            })
        );

        let patch: Result<PlanPatch, _> = serde_json::from_str(r#"{"kind":"pests","control":true}"#);
        assert_eq!(patch.ok(), Some(PlanPatch::Pests { control: true }));
    }

    #[test]
    fn patch_rejects_unknown_kind() {
        let patch: Result<PlanPatch, _> = serde_json::from_str(r#"{"kind":"livestock","herd":4}"#);
        assert!(patch.is_err());
    }

    #[test]
    fn merge_only_touches_named_fields() {
        let mut plan = CellPlan {
            crop: CropKey::from("wheat"),
            irrigation: true,
            drainage: false,
            pest_control: false,
        };
        plan.merge(&PlanFields::from(PlanPatch::Drainage { enabled: true }));
        assert_eq!(plan.crop.as_str(), "wheat");
        assert!(plan.irrigation);
        assert!(plan.drainage);

        plan.merge(&PlanFields::default());
        assert!(plan.drainage);
    }

    #[test]
    fn empty_fields_detected() {
        assert!(PlanFields::default().is_empty());
        assert!(!PlanFields::from(PlanPatch::Irrigation { enabled: false }).is_empty());
    }
}
