use proptest::prelude::*;

use spawn_index::density::surface_density;
use spawn_index::intensity::resolve_layers;
use spawn_index::params::{EraYears, SurfaceParameters};
use spawn_index::width::{PoolWidth, RegionWidth, SectionWidth, WidthSource};
use spawn_index::{
    EggBiomassConverter, IntensityTable, LayerMeasurement, Location, SpawnIndexError, WidthTables,
};

fn location() -> Location {
    Location {
        sar: 1,
        region: "HG".to_string(),
        region_name: "Haida Gwaii".to_string(),
        stat_area: 2,
        group: None,
        section: 21,
        location_code: 42,
        location_name: "Louscoone".to_string(),
        pool: Some("North".to_string()),
        easting: None,
        northing: None,
    }
}

fn widths(pool: Option<f64>, section: Option<f64>, region: f64) -> WidthTables {
    WidthTables::new(
        vec![RegionWidth {
            region: "HG".to_string(),
            width_m: region,
        }],
        section
            .map(|width_m| SectionWidth {
                region: "HG".to_string(),
                section: 21,
                width_m,
            })
            .into_iter()
            .collect(),
        pool.map(|width_m| PoolWidth {
            region: "HG".to_string(),
            section: 21,
            pool: "North".to_string(),
            width_m,
        })
        .into_iter()
        .collect(),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn surface_density_is_monotone(a in 0.0f64..50.0, b in 0.0f64..50.0) {
        let pars = SurfaceParameters::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(surface_density(lo, &pars).unwrap() <= surface_density(hi, &pars).unwrap());
    }

    #[test]
    fn pool_width_always_wins(pool in 0.0f64..100.0, section in 0.0f64..100.0, region in 0.0f64..100.0) {
        let w = widths(Some(pool), Some(section), region).resolve(&location()).unwrap();
        prop_assert_eq!(w.width_m, pool);
        prop_assert_eq!(w.source, WidthSource::Pool);

        let w = widths(None, Some(section), region).resolve(&location()).unwrap();
        prop_assert_eq!(w.width_m, section);

        let w = widths(None, None, region).resolve(&location()).unwrap();
        prop_assert_eq!(w.width_m, region);
    }

    #[test]
    fn biomass_round_trip(biomass in 0.0f64..1e6, theta in 1e6f64..1e10) {
        let conv = EggBiomassConverter::new(theta).unwrap();
        let back = conv.eggs_to_biomass(conv.biomass_to_eggs(biomass));
        prop_assert!((back - biomass).abs() <= 1e-9 * biomass.max(1.0));
    }

    #[test]
    fn five_scale_years_accept_only_one_to_five(year in 1928i32..1969, category in -2i64..12) {
        let result = resolve_layers(
            year,
            LayerMeasurement::Intensity(category),
            &IntensityTable::default(),
            &EraYears::default(),
        );
        if (1..=5).contains(&category) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(
                matches!(result, Err(SpawnIndexError::InvalidCategory { .. })),
                "expected InvalidCategory"
            );
        }
    }

    #[test]
    fn nine_scale_years_accept_one_to_nine(year in 1969i32..1979, category in -2i64..12) {
        let result = resolve_layers(
            year,
            LayerMeasurement::Intensity(category),
            &IntensityTable::default(),
            &EraYears::default(),
        );
        prop_assert_eq!(result.is_ok(), (1..=9).contains(&category));
    }
}
