//! Enumeration types for the Furrow simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

/// One of the four seasons that make up a simulated year.
///
/// A tick always simulates exactly one season. After [`Season::Winter`]
/// the cycle wraps back to [`Season::Spring`] and the year advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Season {
    /// First season of the year (S1).
    Spring,
    /// Second season of the year (S2).
    Summer,
    /// Third season of the year (S3).
    Autumn,
    /// Fourth season of the year (S4).
    Winter,
}

impl Season {
    /// All seasons in calendar order.
    pub const ALL: [Self; 4] = [Self::Spring, Self::Summer, Self::Autumn, Self::Winter];

    /// The season that follows this one.
    pub const fn next(self) -> Self {
        match self {
            Self::Spring => Self::Summer,
            Self::Summer => Self::Autumn,
            Self::Autumn => Self::Winter,
            Self::Winter => Self::Spring,
        }
    }

    /// Whether advancing past this season starts a new year.
    pub const fn closes_year(self) -> bool {
        matches!(self, Self::Winter)
    }

    /// Lowercase name used in configuration files and URLs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Autumn => "autumn",
            Self::Winter => "winter",
        }
    }
}

// ---------------------------------------------------------------------------
// Grid layers
// ---------------------------------------------------------------------------

/// A per-cell scalar field that can be exported as a 2D array or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Layer {
    /// Vegetation index.
    Ndvi,
    /// Soil moisture.
    Moisture,
    /// Soil salinity.
    Salinity,
    /// Soil fertility.
    Fertility,
}

impl Layer {
    /// All layers, in the order they appear in tick summaries.
    pub const ALL: [Self; 4] = [Self::Ndvi, Self::Moisture, Self::Salinity, Self::Fertility];

    /// Lowercase layer name as used in URLs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ndvi => "ndvi",
            Self::Moisture => "moisture",
            Self::Salinity => "salinity",
            Self::Fertility => "fertility",
        }
    }

    /// Parse a layer from its lowercase name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str().eq_ignore_ascii_case(name))
    }
}

// ---------------------------------------------------------------------------
// Climate shocks
// ---------------------------------------------------------------------------

/// Kind of stochastic climate shock fired by a region's event rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ShockKind {
    /// Rain sharply reduced and heat raised.
    Drought,
    /// Temperature raised, accelerating evaporation and salt build-up.
    HeatWave,
    /// Rain sharply increased.
    Flood,
    /// Rain moderately reduced.
    RainDeficit,
}

// ---------------------------------------------------------------------------
// Catalog classifications
// ---------------------------------------------------------------------------

/// How a crop affects soil fertility over a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SoilRole {
    /// Nitrogen-fixing crops that rebuild fertility (alfalfa).
    Builder,
    /// Crops that draw down fertility (cereals, cotton).
    Exhaustive,
    /// Fallow and cover: slow natural recovery.
    #[default]
    Neutral,
}

/// Category of an infrastructure item in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum InfraCategory {
    /// Water delivery (canals, drip lines, pivots).
    Irrigation,
    /// Water removal (surface drains, tile drainage).
    Drainage,
    /// Crop protection programmes.
    PestControl,
    /// Post-harvest storage.
    Storage,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// How layer values are mapped to grayscale pixel intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Normalization {
    /// Clip values to `[0, 1]` and scale linearly.
    #[default]
    Clip,
    /// Stretch the observed minimum and maximum to the full range.
    MinMax,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_cycle_wraps_after_winter() {
        let mut season = Season::Spring;
        for _ in 0..4 {
            season = season.next();
        }
        assert_eq!(season, Season::Spring);
        assert!(Season::Winter.closes_year());
        assert!(!Season::Autumn.closes_year());
    }

    #[test]
    fn layer_names_round_trip() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_name(layer.as_str()), Some(layer));
        }
        assert_eq!(Layer::from_name("NDVI"), Some(Layer::Ndvi));
        assert_eq!(Layer::from_name("elevation"), None);
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&ShockKind::HeatWave).unwrap_or_default();
        assert_eq!(json, "\"heat_wave\"");
        let json = serde_json::to_string(&Season::Autumn).unwrap_or_default();
        assert_eq!(json, "\"autumn\"");
    }
}
