//! Eggs to spawning biomass and back.

use crate::advisory::{Advisories, Advisory};
use crate::error::{Result, SpawnIndexError};
use crate::params::{EggConversion, SokParameters};

/// Literature egg conversion factor (eggs per tonne).
pub const DEFAULT_THETA: f64 = 1e8;

/// Theta values outside this factor of the default are flagged.
const THETA_TOLERANCE_FACTOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EggBiomassConverter {
    theta: f64,
}

impl EggBiomassConverter {
    pub fn new(theta: f64) -> Result<Self> {
        if !theta.is_finite() || theta <= 0.0 {
            return Err(SpawnIndexError::InvalidConversionFactor(theta));
        }
        Ok(Self { theta })
    }

    pub fn from_parameters(pars: &EggConversion) -> Result<Self> {
        Self::new(pars.theta())
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Spawning biomass (t) from a number of eggs.
    pub fn eggs_to_biomass(&self, eggs: f64) -> f64 {
        eggs / self.theta
    }

    pub fn biomass_to_eggs(&self, biomass_t: f64) -> f64 {
        biomass_t * self.theta
    }

    /// Eggs represented by harvested spawn-on-kelp product.
    pub fn sok_eggs(&self, product_kg: f64, pars: &SokParameters) -> Result<f64> {
        if !product_kg.is_finite() || product_kg < 0.0 {
            return Err(SpawnIndexError::InvalidMeasurement(format!(
                "SOK product must be a non-negative mass, got {product_kg}"
            )));
        }
        Ok(product_kg * pars.eggs_per_kg())
    }

    /// Spawning biomass (t) back-calculated from spawn-on-kelp product.
    pub fn sok_biomass(&self, product_kg: f64, pars: &SokParameters) -> Result<f64> {
        Ok(self.eggs_to_biomass(self.sok_eggs(product_kg, pars)?))
    }

    /// Flag a theta far from the literature value.
    pub fn check_literature(&self, advisories: &mut Advisories) {
        let ratio = self.theta / DEFAULT_THETA;
        if !(1.0 / THETA_TOLERANCE_FACTOR..=THETA_TOLERANCE_FACTOR).contains(&ratio) {
            advisories.push(Advisory::ThetaFarFromDefault { theta: self.theta });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_theta() {
        for theta in [0.0, -1e8, f64::NAN] {
            assert!(matches!(
                EggBiomassConverter::new(theta),
                Err(SpawnIndexError::InvalidConversionFactor(_))
            ));
        }
    }

    #[test]
    fn forward_conversion() {
        let conv = EggBiomassConverter::new(DEFAULT_THETA).unwrap();
        assert!((conv.eggs_to_biomass(8.48872e8) - 8.48872).abs() < 1e-9);
    }

    #[test]
    fn sok_worked_example() {
        let conv = EggBiomassConverter::new(DEFAULT_THETA).unwrap();
        let biomass = conv.sok_biomass(100.0, &SokParameters::default()).unwrap();
        assert_eq!(format!("{biomass:.3}"), "0.327");
    }

    #[test]
    fn flags_unusual_theta() {
        let mut advisories = Advisories::new(false);
        EggBiomassConverter::new(DEFAULT_THETA)
            .unwrap()
            .check_literature(&mut advisories);
        assert!(advisories.is_empty());

        EggBiomassConverter::new(5e9)
            .unwrap()
            .check_literature(&mut advisories);
        assert_eq!(advisories.len(), 1);
    }
}
