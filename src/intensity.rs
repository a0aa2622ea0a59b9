//! Historical intensity ratings to egg layers.
//!
//! Before layers were counted directly, surveyors rated spawn on an ordinal
//! scale: 5 categories until the scale change, 9 categories after it. Each
//! surface record is resolved once into a layer count before density
//! estimation.

use crate::error::{Result, SpawnIndexError};
use crate::params::EraYears;

/// 5-category ratings placed onto the 9-category scale.
const FIVE_TO_NINE: [i64; 5] = [1, 3, 5, 7, 9];

#[derive(Debug, Clone, PartialEq)]
pub struct IntensityCategory {
    pub category: i64,
    pub description: String,
    pub layers: f64,
}

/// Layer count per 9-scale intensity category.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityTable {
    rows: Vec<IntensityCategory>,
}

impl Default for IntensityTable {
    fn default() -> Self {
        let rows = [
            (1, "Very light", 0.5529),
            (2, "Light", 0.9444),
            (3, "Light-medium", 1.3360),
            (4, "Medium", 1.7276),
            (5, "Medium-heavy", 2.1192),
            (6, "Heavy", 2.5108),
            (7, "Very heavy", 2.9023),
            (8, "Very heavy", 3.2939),
            (9, "Very heavy", 3.6855),
        ]
        .into_iter()
        .map(|(category, description, layers)| IntensityCategory {
            category,
            description: description.to_string(),
            layers,
        })
        .collect();
        Self { rows }
    }
}

impl IntensityTable {
    /// Build from 9 rows, one per category 1-9.
    pub fn new(mut rows: Vec<IntensityCategory>) -> Result<Self> {
        rows.sort_by_key(|r| r.category);
        let categories: Vec<i64> = rows.iter().map(|r| r.category).collect();
        if categories != (1..=9).collect::<Vec<_>>() {
            return Err(SpawnIndexError::InvalidData(format!(
                "Intensity table must hold categories 1-9 exactly once, got {categories:?}"
            )));
        }
        if let Some(bad) = rows.iter().find(|r| !r.layers.is_finite() || r.layers < 0.0) {
            return Err(SpawnIndexError::InvalidData(format!(
                "Intensity category {} has invalid layers {}",
                bad.category, bad.layers
            )));
        }
        Ok(Self { rows })
    }

    pub fn layers(&self, category: i64) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.layers)
    }

    pub fn rows(&self) -> &[IntensityCategory] {
        &self.rows
    }
}

/// Intensity scale in force for a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityScale {
    Five,
    Nine,
}

impl IntensityScale {
    /// Scale used in `year`, or `None` outside the intensity eras.
    pub fn for_year(year: i32, years: &EraYears) -> Option<Self> {
        if year < years.survey_start || year >= years.layers_start {
            None
        } else if year < years.intensity_change {
            Some(Self::Five)
        } else {
            Some(Self::Nine)
        }
    }

    pub fn max_category(self) -> i64 {
        match self {
            Self::Five => 5,
            Self::Nine => 9,
        }
    }
}

/// How spawn on a surface quadrat was recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerMeasurement {
    Intensity(i64),
    Layers(f64),
}

impl LayerMeasurement {
    /// Reading that applies in `year` for a record that may carry both an
    /// intensity rating and a layer count. Ratings count only before layers
    /// were recorded; a zero rating means the quadrat was not rated.
    pub fn for_year(
        year: i32,
        intensity: Option<i64>,
        layers: Option<f64>,
        years: &EraYears,
    ) -> Option<Self> {
        match intensity {
            Some(category) if year < years.layers_start && category != 0 => {
                Some(Self::Intensity(category))
            }
            _ => layers.map(Self::Layers),
        }
    }
}

/// Resolve a surface measurement to a number of egg layers.
pub fn resolve_layers(
    year: i32,
    measurement: LayerMeasurement,
    table: &IntensityTable,
    years: &EraYears,
) -> Result<f64> {
    match measurement {
        LayerMeasurement::Layers(layers) => checked_layers(layers),
        // Layers were being counted by then; the value is already a count.
        LayerMeasurement::Intensity(count) if year >= years.layers_start => {
            checked_layers(count as f64)
        }
        LayerMeasurement::Intensity(category) => {
            let scale = IntensityScale::for_year(year, years).ok_or_else(|| {
                SpawnIndexError::AmbiguousProtocol(format!(
                    "intensity {category} recorded in {year}, before surveys began in {}",
                    years.survey_start
                ))
            })?;
            if !(1..=scale.max_category()).contains(&category) {
                return Err(SpawnIndexError::InvalidCategory { year, category });
            }
            let category = match scale {
                IntensityScale::Five if years.rescale.contains(year) => {
                    FIVE_TO_NINE[(category - 1) as usize]
                }
                _ => category,
            };
            table
                .layers(category)
                .ok_or(SpawnIndexError::InvalidCategory { year, category })
        }
    }
}

fn checked_layers(layers: f64) -> Result<f64> {
    if !layers.is_finite() || layers < 0.0 {
        return Err(SpawnIndexError::InvalidMeasurement(format!(
            "egg layers must be >= 0, got {layers}"
        )));
    }
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(year: i32, m: LayerMeasurement) -> Result<f64> {
        resolve_layers(year, m, &IntensityTable::default(), &EraYears::default())
    }

    #[test]
    fn direct_layers_pass_through() {
        assert_eq!(resolve(1995, LayerMeasurement::Layers(4.0)).unwrap(), 4.0);
        assert_eq!(resolve(1975, LayerMeasurement::Layers(0.0)).unwrap(), 0.0);
    }

    #[test]
    fn nine_scale_direct_lookup() {
        let layers = resolve(1970, LayerMeasurement::Intensity(9)).unwrap();
        assert!((layers - 3.6855).abs() < 1e-12);
    }

    #[test]
    fn five_scale_is_remapped() {
        // 3 on the old scale is 5 on the new one
        let layers = resolve(1960, LayerMeasurement::Intensity(3)).unwrap();
        assert!((layers - 2.1192).abs() < 1e-12);
        let layers = resolve(1960, LayerMeasurement::Intensity(5)).unwrap();
        assert!((layers - 3.6855).abs() < 1e-12);
    }

    #[test]
    fn outside_rescale_window_uses_category_directly() {
        let mut years = EraYears::default();
        years.rescale = crate::params::YearRange::new(1950, 1968);
        let layers = resolve_layers(
            1940,
            LayerMeasurement::Intensity(3),
            &IntensityTable::default(),
            &years,
        )
        .unwrap();
        assert!((layers - 1.3360).abs() < 1e-12);
    }

    #[test]
    fn high_category_before_change_is_invalid() {
        for category in 6..=9 {
            let err = resolve(1968, LayerMeasurement::Intensity(category)).unwrap_err();
            assert!(matches!(err, SpawnIndexError::InvalidCategory { .. }));
        }
    }

    #[test]
    fn unknown_category_is_invalid() {
        assert!(matches!(
            resolve(1972, LayerMeasurement::Intensity(10)),
            Err(SpawnIndexError::InvalidCategory { .. })
        ));
        assert!(matches!(
            resolve(1972, LayerMeasurement::Intensity(0)),
            Err(SpawnIndexError::InvalidCategory { .. })
        ));
    }

    #[test]
    fn intensity_before_surveys_is_ambiguous() {
        assert!(matches!(
            resolve(1920, LayerMeasurement::Intensity(2)),
            Err(SpawnIndexError::AmbiguousProtocol(_))
        ));
    }

    #[test]
    fn recorded_value_passes_through_once_layers_are_counted() {
        assert_eq!(resolve(1979, LayerMeasurement::Intensity(2)).unwrap(), 2.0);
        assert!(matches!(
            resolve(1985, LayerMeasurement::Intensity(-1)),
            Err(SpawnIndexError::InvalidMeasurement(_))
        ));
    }

    #[test]
    fn reading_is_chosen_by_year() {
        let years = EraYears::default();
        // a zero-filled layer column must not mask a rating
        assert_eq!(
            LayerMeasurement::for_year(1975, Some(9), Some(0.0), &years),
            Some(LayerMeasurement::Intensity(9))
        );
        assert_eq!(
            LayerMeasurement::for_year(1975, Some(0), Some(2.5), &years),
            Some(LayerMeasurement::Layers(2.5))
        );
        assert_eq!(
            LayerMeasurement::for_year(1985, Some(4), Some(1.5), &years),
            Some(LayerMeasurement::Layers(1.5))
        );
        assert_eq!(LayerMeasurement::for_year(1985, Some(4), None, &years), None);
        assert_eq!(LayerMeasurement::for_year(1975, None, None, &years), None);
    }

    #[test]
    fn table_requires_all_categories() {
        let mut rows = IntensityTable::default().rows().to_vec();
        rows.pop();
        assert!(IntensityTable::new(rows).is_err());
    }
}
