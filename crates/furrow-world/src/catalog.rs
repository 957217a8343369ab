//! Manifest catalog: crop, region, practice and infrastructure parameters.
//!
//! The catalog is read-only once a simulation starts. It comes either from
//! [`builtin_catalog`](crate::builtin::builtin_catalog) or from a YAML
//! manifest with the same shape (see `manifests/catalog.yaml`).
//!
//! Crop lookups never fail: unknown keys resolve to the fallow entry, so a
//! plan naming a crop the catalog does not know simply leaves the cell idle.

use std::collections::BTreeMap;
use std::path::Path;

use furrow_types::{CropKey, InfraCategory, Season, ShockKind, SoilRole};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Parameters of one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSpec {
    /// Yield at full vigour, in tonnes per hectare.
    pub base_yield: f64,
    /// Moisture the crop needs, in `[0, 1]`.
    pub water_need: f64,
    /// Salinity the crop tolerates, in `[0, 1]`.
    pub salt_tolerance: f64,
    /// Peak vegetation index under ideal conditions, in `[0, 1]`.
    pub ndvi_peak: f64,
    /// Price per tonne.
    pub price: f64,
    /// Effect on soil fertility.
    #[serde(default)]
    pub soil_role: SoilRole,
}

/// Used only if a catalog somehow lacks a fallow entry.
static FALLBACK_FALLOW: CropSpec = CropSpec {
    base_yield: 0.0,
    water_need: 0.2,
    salt_tolerance: 1.0,
    ndvi_peak: 0.15,
    price: 0.0,
    soil_role: SoilRole::Neutral,
};

/// One value per season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonTable {
    /// Spring value.
    pub spring: f64,
    /// Summer value.
    pub summer: f64,
    /// Autumn value.
    pub autumn: f64,
    /// Winter value.
    pub winter: f64,
}

impl SeasonTable {
    /// Value for the given season.
    pub const fn get(&self, season: Season) -> f64 {
        match season {
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
            Season::Winter => self.winter,
        }
    }

    fn values(&self) -> [f64; 4] {
        [self.spring, self.summer, self.autumn, self.winter]
    }
}

/// One outcome band of a shock rule.
///
/// Bands are checked in order; the first whose `below` threshold exceeds
/// the season's roll fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockBand {
    /// Exclusive upper bound on the roll for this band to fire.
    pub below: f64,
    /// What the shock is called.
    pub kind: ShockKind,
    /// Rain multiplier while the shock is active.
    #[serde(default = "neutral_multiplier")]
    pub rain: f64,
    /// Temperature multiplier while the shock is active.
    #[serde(default = "neutral_multiplier")]
    pub temp: f64,
}

/// Region-specific shock rule active in some seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockRule {
    /// Seasons in which the rule applies.
    pub seasons: Vec<Season>,
    /// Ordered outcome bands.
    pub bands: Vec<ShockBand>,
}

/// Static description of a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    /// Human-readable name.
    pub display_name: String,
    /// Baseline rain per season.
    pub seasonal_rain: SeasonTable,
    /// Baseline temperature per season.
    pub seasonal_temp: SeasonTable,
    /// Stochastic shock rules. The first rule covering the season is used.
    #[serde(default)]
    pub shocks: Vec<ShockRule>,
}

/// Per-cell, per-season operating cost of each practice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PracticeCosts {
    /// Cost of irrigating a cell for a season.
    #[serde(default = "default_irrigation_cost")]
    pub irrigation: f64,
    /// Cost of draining a cell for a season.
    #[serde(default = "default_drainage_cost")]
    pub drainage: f64,
    /// Cost of pest control on a cell for a season.
    #[serde(default = "default_pest_control_cost")]
    pub pest_control: f64,
}

impl Default for PracticeCosts {
    fn default() -> Self {
        Self {
            irrigation: default_irrigation_cost(),
            drainage: default_drainage_cost(),
            pest_control: default_pest_control_cost(),
        }
    }
}

/// A piece of farm infrastructure with its capital and operating cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraSpec {
    /// Unique key.
    pub key: String,
    /// Human-readable name.
    pub display_name: String,
    /// What the item is for.
    pub category: InfraCategory,
    /// One-off cost per hectare.
    pub capex_per_ha: f64,
    /// Running cost per hectare per season.
    pub opex_per_ha_per_season: f64,
}

/// The full manifest catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Crops keyed by crop name. Must contain `fallow`.
    pub crops: BTreeMap<String, CropSpec>,
    /// Regions keyed by region code.
    pub regions: BTreeMap<String, RegionSpec>,
    /// Practice costs charged by the finance aggregator.
    #[serde(default)]
    pub practices: PracticeCosts,
    /// Infrastructure items.
    #[serde(default)]
    pub infrastructure: Vec<InfraSpec>,
}

impl Catalog {
    /// Load and validate a catalog from a YAML manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CatalogIo`] if the file cannot be read,
    /// [`WorldError::CatalogYaml`] on parse failure, or
    /// [`WorldError::InvalidCatalog`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, WorldError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a catalog from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CatalogYaml`] on parse failure or
    /// [`WorldError::InvalidCatalog`] if validation fails.
    pub fn from_yaml(yaml: &str) -> Result<Self, WorldError> {
        let catalog: Self = serde_yml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Resolve a crop key, falling back to fallow for unknown keys.
    pub fn crop(&self, key: &CropKey) -> &CropSpec {
        self.crops
            .get(key.as_str())
            .or_else(|| self.crops.get(CropKey::FALLOW))
            .unwrap_or(&FALLBACK_FALLOW)
    }

    /// Whether the key names a crop in the catalog.
    pub fn knows_crop(&self, key: &CropKey) -> bool {
        self.crops.contains_key(key.as_str())
    }

    /// Look up a region by code.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownRegion`] if the code is not present.
    pub fn region(&self, code: &str) -> Result<&RegionSpec, WorldError> {
        self.regions
            .get(code)
            .ok_or_else(|| WorldError::UnknownRegion(code.to_owned()))
    }

    /// Infrastructure items, optionally restricted to one category.
    pub fn infrastructure(&self, category: Option<InfraCategory>) -> Vec<&InfraSpec> {
        self.infrastructure
            .iter()
            .filter(|item| category.is_none_or(|c| item.category == c))
            .collect()
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidCatalog`] describing the first problem.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.crops.contains_key(CropKey::FALLOW) {
            return Err(invalid("crop table must contain `fallow`"));
        }
        for (key, crop) in &self.crops {
            for (name, value) in [
                ("water_need", crop.water_need),
                ("salt_tolerance", crop.salt_tolerance),
                ("ndvi_peak", crop.ndvi_peak),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    return Err(invalid(&format!("crop `{key}`: {name} {value} outside [0, 1]")));
                }
            }
            if !crop.base_yield.is_finite() || crop.base_yield < 0.0 {
                return Err(invalid(&format!("crop `{key}`: negative base_yield")));
            }
            if !crop.price.is_finite() || crop.price < 0.0 {
                return Err(invalid(&format!("crop `{key}`: negative price")));
            }
        }

        if self.regions.is_empty() {
            return Err(invalid("at least one region must be defined"));
        }
        for (code, region) in &self.regions {
            let baselines = region
                .seasonal_rain
                .values()
                .into_iter()
                .chain(region.seasonal_temp.values());
            for value in baselines {
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid(&format!("region `{code}`: invalid baseline {value}")));
                }
            }
            for rule in &region.shocks {
                validate_rule(code, rule)?;
            }
        }

        let costs = self.practices;
        for value in [costs.irrigation, costs.drainage, costs.pest_control] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(&format!("practice cost {value} must be non-negative")));
            }
        }
        Ok(())
    }
}

fn validate_rule(code: &str, rule: &ShockRule) -> Result<(), WorldError> {
    if rule.seasons.is_empty() {
        return Err(invalid(&format!("region `{code}`: shock rule without seasons")));
    }
    let mut previous = 0.0_f64;
    for band in &rule.bands {
        if !(0.0..=1.0).contains(&band.below) || band.below < previous {
            return Err(invalid(&format!(
                "region `{code}`: band thresholds must ascend within [0, 1]"
            )));
        }
        if !(band.rain.is_finite() && band.temp.is_finite()) || band.rain < 0.0 || band.temp < 0.0
        {
            return Err(invalid(&format!("region `{code}`: negative shock multiplier")));
        }
        previous = band.below;
    }
    Ok(())
}

fn invalid(reason: &str) -> WorldError {
    WorldError::InvalidCatalog {
        reason: reason.to_owned(),
    }
}

const fn neutral_multiplier() -> f64 {
    1.0
}

const fn default_irrigation_cost() -> f64 {
    1.2
}

const fn default_drainage_cost() -> f64 {
    0.8
}

const fn default_pest_control_cost() -> f64 {
    0.5
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::builtin::builtin_catalog;

    #[test]
    fn unknown_crop_resolves_to_fallow() {
        let catalog = builtin_catalog();
        let fallow = catalog.crop(&CropKey::fallow()).clone();
        assert_eq!(catalog.crop(&CropKey::from("dragonfruit")), &fallow);
        assert_eq!(catalog.crop(&CropKey::new("")), &fallow);
        assert!(!catalog.knows_crop(&CropKey::from("dragonfruit")));
    }

    #[test]
    fn missing_fallow_falls_back_to_static_entry() {
        let mut catalog = builtin_catalog();
        catalog.crops.remove("fallow");
        let crop = catalog.crop(&CropKey::from("unknown"));
        assert_eq!(crop.base_yield, 0.0);
        assert_eq!(crop.ndvi_peak, 0.15);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn region_lookup() {
        let catalog = builtin_catalog();
        assert!(catalog.region("sahel").is_ok());
        assert!(matches!(
            catalog.region("atlantis"),
            Err(WorldError::UnknownRegion(code)) if code == "atlantis"
        ));
    }

    #[test]
    fn infrastructure_filters_by_category() {
        let catalog = builtin_catalog();
        let all = catalog.infrastructure(None);
        let drainage = catalog.infrastructure(Some(InfraCategory::Drainage));
        assert!(!drainage.is_empty());
        assert!(drainage.len() < all.len());
        assert!(drainage.iter().all(|i| i.category == InfraCategory::Drainage));
    }

    #[test]
    fn parse_minimal_manifest_uses_defaults() {
        let yaml = r"
crops:
  fallow: { base_yield: 0.0, water_need: 0.2, salt_tolerance: 1.0, ndvi_peak: 0.15, price: 0.0 }
regions:
  test:
    display_name: Test
    seasonal_rain: { spring: 0.1, summer: 0.1, autumn: 0.1, winter: 0.1 }
    seasonal_temp: { spring: 0.5, summer: 0.5, autumn: 0.5, winter: 0.5 }
";
        let catalog = Catalog::from_yaml(yaml).unwrap();
        assert_eq!(catalog.practices, PracticeCosts::default());
        assert!(catalog.infrastructure.is_empty());
        assert_eq!(catalog.crop(&CropKey::fallow()).soil_role, SoilRole::Neutral);
    }

    #[test]
    fn rejects_out_of_range_crop_parameters() {
        let mut catalog = builtin_catalog();
        if let Some(wheat) = catalog.crops.get_mut("wheat") {
            wheat.water_need = 1.5;
        }
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("water_need"));
    }

    #[test]
    fn rejects_descending_band_thresholds() {
        let mut catalog = builtin_catalog();
        if let Some(sahel) = catalog.regions.get_mut("sahel") {
            if let Some(rule) = sahel.shocks.first_mut() {
                rule.bands.reverse();
            }
        }
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn rejects_garbage_yaml() {
        assert!(matches!(
            Catalog::from_yaml("crops: [1, 2"),
            Err(WorldError::CatalogYaml { .. })
        ));
    }
}
