//! Calculation parameters with published defaults.
//!
//! Everything the formulas need is carried here and passed explicitly into
//! each calculation; nothing is read from global state.

use std::collections::BTreeMap;

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.first <= year && year <= self.last
    }
}

/// Survey protocol boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EraYears {
    /// First year of the survey program.
    pub survey_start: i32,
    /// First year recorded on the 9-category intensity scale.
    pub intensity_change: i32,
    /// First year egg layers were recorded directly.
    pub layers_start: i32,
    /// First year used by the stock assessment.
    pub assessment_start: i32,
    /// Last year used by the stock assessment; the current year when absent.
    pub assessment_end: Option<i32>,
    /// Years whose 5-category ratings are remapped onto the 9-category scale.
    pub rescale: YearRange,
}

impl Default for EraYears {
    fn default() -> Self {
        Self {
            survey_start: 1928,
            intensity_change: 1969,
            layers_start: 1979,
            assessment_start: 1951,
            assessment_end: None,
            rescale: YearRange::new(1928, 1968),
        }
    }
}

impl EraYears {
    pub fn last_assessment_year(&self) -> i32 {
        self.assessment_end.unwrap_or_else(|| Local::now().year())
    }

    pub fn in_assessment(&self, year: i32) -> bool {
        year >= self.assessment_start && year <= self.last_assessment_year()
    }
}

/// Surface egg density (Schweigert 2005).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParameters {
    /// Egg density per layer (10^3 eggs * m^-2).
    pub eggs_per_layer: f64,
}

impl Default for SurfaceParameters {
    fn default() -> Self {
        Self {
            eggs_per_layer: 212.218,
        }
    }
}

/// Eggs per Macrocystis plant (Haegele and Schweigert 1990):
/// `xi * layers^gamma * height^delta * stalks^epsilon`, in 10^6 eggs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacrocystisParameters {
    pub xi: f64,
    pub gamma: f64,
    pub delta: f64,
    pub epsilon: f64,
}

impl Default for MacrocystisParameters {
    fn default() -> Self {
        Self {
            xi: 0.073,
            gamma: 0.673,
            delta: 0.932,
            epsilon: 0.703,
        }
    }
}

/// Understory egg density (Haegele et al. 1979, Schweigert 2005).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderstoryParameters {
    pub substrate_alpha: f64,
    pub substrate_beta: f64,
    pub algae_alpha: f64,
    pub algae_beta: f64,
    pub algae_gamma: f64,
    /// Multiplier per algae type code.
    pub algae_coefficients: BTreeMap<String, f64>,
}

impl Default for UnderstoryParameters {
    fn default() -> Self {
        let algae_coefficients = [
            ("GR", 0.9715),
            ("KS", 1.0),
            ("LBR", 1.0),
            ("LL", 1.0),
            ("SM", 0.9119),
            ("ST", 1.0),
        ]
        .into_iter()
        .map(|(code, coef)| (code.to_string(), coef))
        .collect();

        Self {
            substrate_alpha: 340.0,
            substrate_beta: 0.7164,
            algae_alpha: 600.567,
            algae_beta: 0.6355,
            algae_gamma: 1.4130,
            algae_coefficients,
        }
    }
}

/// Spawn-on-kelp product back-calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SokParameters {
    /// Proportion of product weight that is eggs.
    pub egg_proportion: f64,
    /// Weight gained by the product through brining, as a proportion.
    pub brine_gain: f64,
    /// Mass of one fertilized egg (kg).
    pub egg_mass_kg: f64,
}

impl Default for SokParameters {
    fn default() -> Self {
        Self {
            egg_proportion: 0.88,
            brine_gain: 0.10,
            egg_mass_kg: 2.45e-6,
        }
    }
}

impl SokParameters {
    /// Eggs per kg of brined product.
    pub fn eggs_per_kg(&self) -> f64 {
        self.egg_proportion / ((1.0 + self.brine_gain) * self.egg_mass_kg)
    }
}

/// Inputs to the egg conversion factor theta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EggConversion {
    /// Eggs per gram of female spawner.
    pub fecundity: f64,
    /// Proportion of spawners that are female.
    pub female_fraction: f64,
}

impl Default for EggConversion {
    fn default() -> Self {
        Self {
            fecundity: 200.0,
            female_fraction: 0.5,
        }
    }
}

impl EggConversion {
    /// Eggs per tonne of spawners.
    pub fn theta(&self) -> f64 {
        self.fecundity * self.female_fraction * 1_000_000.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationParameters {
    pub years: EraYears,
    pub surface: SurfaceParameters,
    pub macrocystis: MacrocystisParameters,
    pub understory: UnderstoryParameters,
    pub sok: SokParameters,
    pub egg_conversion: EggConversion,
}

/// Parameter groups that carry unit-conversion constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterGroup {
    Surface,
    Macrocystis,
    Understory,
    Sok,
    EggConversion,
}

impl ParameterGroup {
    pub fn name(self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Macrocystis => "macrocystis",
            Self::Understory => "understory",
            Self::Sok => "sok",
            Self::EggConversion => "egg_conversion",
        }
    }
}

impl CalculationParameters {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether a constant group differs from its published default.
    pub fn is_default(&self, group: ParameterGroup) -> bool {
        match group {
            ParameterGroup::Surface => self.surface == SurfaceParameters::default(),
            ParameterGroup::Macrocystis => self.macrocystis == MacrocystisParameters::default(),
            ParameterGroup::Understory => self.understory == UnderstoryParameters::default(),
            ParameterGroup::Sok => self.sok == SokParameters::default(),
            ParameterGroup::EggConversion => self.egg_conversion == EggConversion::default(),
        }
    }
}
