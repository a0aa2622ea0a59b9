//! Egg density estimators, one per survey method.
//!
//! All densities are in 10^3 eggs * m^-2. Estimators are pure and reject
//! out-of-domain inputs with `InvalidMeasurement`.

use crate::error::{Result, SpawnIndexError};
use crate::params::{MacrocystisParameters, SurfaceParameters, UnderstoryParameters};

pub(crate) fn require_non_negative(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(SpawnIndexError::InvalidMeasurement(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(value)
}

fn require_fraction(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(SpawnIndexError::InvalidMeasurement(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(value)
}

/// Surface egg density from a resolved layer count.
pub fn surface_density(layers: f64, pars: &SurfaceParameters) -> Result<f64> {
    let layers = require_non_negative("egg layers", layers)?;
    Ok(layers * pars.eggs_per_layer)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacrocystisPlant {
    pub height_m: f64,
    pub stalks: f64,
    pub layers: f64,
}

/// A Macrocystis transect and the plants counted on it.
#[derive(Debug, Clone, PartialEq)]
pub struct MacrocystisTransect {
    pub transect: i64,
    pub area_m2: f64,
    /// Proportion of the transect area carrying spawn.
    pub spawn_fraction: f64,
    pub plants: Vec<MacrocystisPlant>,
}

/// Eggs on one plant (10^3 eggs).
pub fn macrocystis_plant_eggs(plant: &MacrocystisPlant, pars: &MacrocystisParameters) -> Result<f64> {
    let layers = require_non_negative("plant egg layers", plant.layers)?;
    let height = require_non_negative("plant height", plant.height_m)?;
    let stalks = require_non_negative("stalks per plant", plant.stalks)?;
    // xi is in 10^6 eggs per plant
    Ok(pars.xi
        * layers.powf(pars.gamma)
        * height.powf(pars.delta)
        * stalks.powf(pars.epsilon)
        * 1000.0)
}

pub fn macrocystis_density(
    transect: &MacrocystisTransect,
    pars: &MacrocystisParameters,
) -> Result<f64> {
    let area = require_non_negative("transect area", transect.area_m2)?;
    if area == 0.0 {
        return Err(SpawnIndexError::InvalidMeasurement(format!(
            "transect {} has zero area",
            transect.transect
        )));
    }
    let fraction = require_fraction("spawn fraction", transect.spawn_fraction)?;

    let mut eggs = 0.0;
    for plant in &transect.plants {
        eggs += macrocystis_plant_eggs(plant, pars)?;
    }
    Ok(eggs * fraction / area)
}

/// Spawn on one algae type within a quadrat.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgaeCover {
    pub algae_type: String,
    pub layers: f64,
    pub proportion: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnderstoryQuadrat {
    pub quadrat: i64,
    pub substrate_layers: f64,
    pub substrate_proportion: f64,
    pub algae: Vec<AlgaeCover>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnderstoryTransect {
    pub transect: i64,
    pub width_m: f64,
    pub quadrats: Vec<UnderstoryQuadrat>,
}

/// Egg density on a single understory quadrat: substrate plus each algae.
pub fn understory_density(quadrat: &UnderstoryQuadrat, pars: &UnderstoryParameters) -> Result<f64> {
    let sub_layers = require_non_negative("substrate layers", quadrat.substrate_layers)?;
    let sub_prop = require_fraction("substrate proportion", quadrat.substrate_proportion)?;
    let mut density = pars.substrate_alpha * sub_layers.powf(pars.substrate_beta) * sub_prop;

    for algae in &quadrat.algae {
        let coef = pars
            .algae_coefficients
            .get(algae.algae_type.trim())
            .copied()
            .ok_or_else(|| SpawnIndexError::UnknownSubstrate(algae.algae_type.clone()))?;
        let layers = require_non_negative("algae layers", algae.layers)?;
        let prop = require_fraction("algae proportion", algae.proportion)?;
        density += pars.algae_alpha
            * layers.powf(pars.algae_beta)
            * prop.powf(pars.algae_gamma)
            * coef;
    }

    Ok(density)
}

/// Mean quadrat density along an understory transect.
pub fn understory_transect_density(
    transect: &UnderstoryTransect,
    pars: &UnderstoryParameters,
) -> Result<f64> {
    if transect.quadrats.is_empty() {
        return Err(SpawnIndexError::InvalidMeasurement(format!(
            "transect {} has no quadrats",
            transect.transect
        )));
    }
    let mut total = 0.0;
    for quadrat in &transect.quadrats {
        total += understory_density(quadrat, pars)?;
    }
    Ok(total / transect.quadrats.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_worked_example() {
        let density = surface_density(4.0, &SurfaceParameters::default()).unwrap();
        assert!((density - 848.872).abs() < 1e-9);
    }

    #[test]
    fn surface_zero_layers_is_zero() {
        assert_eq!(surface_density(0.0, &SurfaceParameters::default()).unwrap(), 0.0);
    }

    #[test]
    fn surface_negative_layers_rejected() {
        assert!(matches!(
            surface_density(-1.0, &SurfaceParameters::default()),
            Err(SpawnIndexError::InvalidMeasurement(_))
        ));
    }

    #[test]
    fn macrocystis_single_unit_plant() {
        // one layer, 1 m, one stalk: xi * 1000
        let plant = MacrocystisPlant {
            height_m: 1.0,
            stalks: 1.0,
            layers: 1.0,
        };
        let eggs = macrocystis_plant_eggs(&plant, &MacrocystisParameters::default()).unwrap();
        assert!((eggs - 73.0).abs() < 1e-9);
    }

    #[test]
    fn macrocystis_density_scales_with_fraction_and_area() {
        let plant = MacrocystisPlant {
            height_m: 1.0,
            stalks: 1.0,
            layers: 1.0,
        };
        let transect = MacrocystisTransect {
            transect: 1,
            area_m2: 2.0,
            spawn_fraction: 0.5,
            plants: vec![plant.clone(), plant],
        };
        let density = macrocystis_density(&transect, &MacrocystisParameters::default()).unwrap();
        assert!((density - 36.5).abs() < 1e-9);
    }

    #[test]
    fn macrocystis_rejects_bad_fraction() {
        let transect = MacrocystisTransect {
            transect: 1,
            area_m2: 2.0,
            spawn_fraction: 1.5,
            plants: vec![],
        };
        assert!(matches!(
            macrocystis_density(&transect, &MacrocystisParameters::default()),
            Err(SpawnIndexError::InvalidMeasurement(_))
        ));
    }

    #[test]
    fn understory_substrate_only() {
        let quadrat = UnderstoryQuadrat {
            quadrat: 1,
            substrate_layers: 1.0,
            substrate_proportion: 0.5,
            algae: vec![],
        };
        let density = understory_density(&quadrat, &UnderstoryParameters::default()).unwrap();
        assert!((density - 170.0).abs() < 1e-9);
    }

    #[test]
    fn understory_algae_uses_type_coefficient() {
        let quadrat = UnderstoryQuadrat {
            quadrat: 1,
            substrate_layers: 0.0,
            substrate_proportion: 0.0,
            algae: vec![AlgaeCover {
                algae_type: "SM".to_string(),
                layers: 1.0,
                proportion: 1.0,
            }],
        };
        let density = understory_density(&quadrat, &UnderstoryParameters::default()).unwrap();
        assert!((density - 600.567 * 0.9119).abs() < 1e-9);
    }

    #[test]
    fn understory_unknown_algae() {
        let quadrat = UnderstoryQuadrat {
            quadrat: 1,
            substrate_layers: 0.0,
            substrate_proportion: 0.0,
            algae: vec![AlgaeCover {
                algae_type: "XX".to_string(),
                layers: 1.0,
                proportion: 1.0,
            }],
        };
        assert!(matches!(
            understory_density(&quadrat, &UnderstoryParameters::default()),
            Err(SpawnIndexError::UnknownSubstrate(code)) if code == "XX"
        ));
    }
}
