//! Built-in catalog: six crops, three regions, practice costs and a small
//! infrastructure list.
//!
//! `manifests/catalog.yaml` at the workspace root mirrors this data so it
//! can be copied and edited; a test keeps the two in sync.

use std::collections::BTreeMap;

use furrow_types::{InfraCategory, Season, ShockKind, SoilRole};

use crate::catalog::{
    Catalog, CropSpec, InfraSpec, PracticeCosts, RegionSpec, SeasonTable, ShockBand, ShockRule,
};

/// Build the default catalog.
pub fn builtin_catalog() -> Catalog {
    Catalog {
        crops: builtin_crops(),
        regions: builtin_regions(),
        practices: PracticeCosts::default(),
        infrastructure: builtin_infrastructure(),
    }
}

fn crop(
    base_yield: f64,
    water_need: f64,
    salt_tolerance: f64,
    ndvi_peak: f64,
    price: f64,
    soil_role: SoilRole,
) -> CropSpec {
    CropSpec {
        base_yield,
        water_need,
        salt_tolerance,
        ndvi_peak,
        price,
        soil_role,
    }
}

fn builtin_crops() -> BTreeMap<String, CropSpec> {
    [
        ("fallow", crop(0.0, 0.2, 1.0, 0.15, 0.0, SoilRole::Neutral)),
        ("wheat", crop(3.5, 0.5, 0.5, 0.75, 220.0, SoilRole::Exhaustive)),
        ("maize", crop(6.0, 0.7, 0.4, 0.80, 210.0, SoilRole::Exhaustive)),
        ("cotton", crop(2.0, 0.8, 0.6, 0.70, 300.0, SoilRole::Exhaustive)),
        ("alfalfa", crop(10.0, 0.6, 0.7, 0.85, 180.0, SoilRole::Builder)),
        ("millet", crop(1.5, 0.35, 0.8, 0.60, 170.0, SoilRole::Exhaustive)),
    ]
    .into_iter()
    .map(|(key, spec)| (key.to_owned(), spec))
    .collect()
}

const fn table(spring: f64, summer: f64, autumn: f64, winter: f64) -> SeasonTable {
    SeasonTable {
        spring,
        summer,
        autumn,
        winter,
    }
}

fn builtin_regions() -> BTreeMap<String, RegionSpec> {
    let mut regions = BTreeMap::new();

    regions.insert(
        "california".to_owned(),
        RegionSpec {
            display_name: "California (water-limited orchards)".to_owned(),
            seasonal_rain: table(0.35, 0.1, 0.25, 0.5),
            seasonal_temp: table(0.6, 0.9, 0.6, 0.3),
            shocks: vec![ShockRule {
                seasons: vec![Season::Spring, Season::Summer],
                bands: vec![ShockBand {
                    below: 0.18,
                    kind: ShockKind::Drought,
                    rain: 0.55,
                    temp: 1.10,
                }],
            }],
        },
    );

    regions.insert(
        "amu_darya".to_owned(),
        RegionSpec {
            display_name: "Amu Darya / Khorezm (salinity & drainage)".to_owned(),
            seasonal_rain: table(0.25, 0.15, 0.2, 0.3),
            seasonal_temp: table(0.5, 0.85, 0.55, 0.25),
            shocks: vec![ShockRule {
                seasons: vec![Season::Summer, Season::Autumn],
                bands: vec![ShockBand {
                    below: 0.15,
                    kind: ShockKind::HeatWave,
                    rain: 1.0,
                    temp: 1.15,
                }],
            }],
        },
    );

    regions.insert(
        "sahel".to_owned(),
        RegionSpec {
            display_name: "Sahel (rain-fed, erosion risk)".to_owned(),
            seasonal_rain: table(0.1, 0.55, 0.25, 0.05),
            seasonal_temp: table(0.7, 0.9, 0.7, 0.6),
            shocks: vec![ShockRule {
                seasons: vec![Season::Summer],
                bands: vec![
                    ShockBand {
                        below: 0.12,
                        kind: ShockKind::Flood,
                        rain: 1.35,
                        temp: 1.0,
                    },
                    ShockBand {
                        below: 0.24,
                        kind: ShockKind::RainDeficit,
                        rain: 0.65,
                        temp: 1.0,
                    },
                ],
            }],
        },
    );

    regions
}

fn infra(
    key: &str,
    display_name: &str,
    category: InfraCategory,
    capex_per_ha: f64,
    opex_per_ha_per_season: f64,
) -> InfraSpec {
    InfraSpec {
        key: key.to_owned(),
        display_name: display_name.to_owned(),
        category,
        capex_per_ha,
        opex_per_ha_per_season,
    }
}

fn builtin_infrastructure() -> Vec<InfraSpec> {
    vec![
        infra("canal_lining", "Lined canal", InfraCategory::Irrigation, 350.0, 0.6),
        infra("center_pivot", "Center pivot", InfraCategory::Irrigation, 1200.0, 1.0),
        infra("drip_line", "Drip irrigation", InfraCategory::Irrigation, 1800.0, 1.2),
        infra("surface_drain", "Surface drain", InfraCategory::Drainage, 250.0, 0.4),
        infra("tile_drainage", "Subsurface tile drainage", InfraCategory::Drainage, 900.0, 0.8),
        infra("ipm_programme", "Integrated pest management", InfraCategory::PestControl, 0.0, 0.5),
        infra("grain_store", "Grain store", InfraCategory::Storage, 400.0, 0.2),
    ]
}
