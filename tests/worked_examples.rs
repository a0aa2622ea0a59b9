use chrono::NaiveDate;
use polars::prelude::*;

use spawn_index::frame::{
    read_area_hierarchy, read_spawn_events, read_surface_observations, read_width_tables,
    results_to_frame,
};
use spawn_index::params::{EraYears, SokParameters};
use spawn_index::{
    calc_sok_biomass, calc_surface_index, Advisory, AreaHierarchy, CalculationParameters,
    CalculationRequest, EggBiomassConverter, IntensityTable, LayerMeasurement, Location,
    ReportingLevel, SpawnEvent, SpawnKey, SurfaceObservation, WidthTables, YearRange,
};
use spawn_index::index::SokHarvest;
use spawn_index::width::RegionWidth;

fn single_location() -> AreaHierarchy {
    AreaHierarchy::new(vec![Location {
        sar: 5,
        region: "WCVI".to_string(),
        region_name: "West Coast of Vancouver Island".to_string(),
        stat_area: 23,
        group: Some("Barkley".to_string()),
        section: 231,
        location_code: 1001,
        location_name: "Ucluelet Inlet".to_string(),
        pool: None,
        easting: Some(1_000_000.0),
        northing: Some(500_000.0),
    }])
    .unwrap()
}

fn ten_metre_widths() -> WidthTables {
    WidthTables::new(
        vec![RegionWidth {
            region: "WCVI".to_string(),
            width_m: 10.0,
        }],
        vec![],
        vec![],
    )
    .unwrap()
}

fn spawn(year: i32, start: Option<NaiveDate>) -> SpawnEvent {
    SpawnEvent {
        key: SpawnKey::new(year, 1001, 1),
        start,
        end: NaiveDate::from_ymd_opt(year, 3, 20),
        length_m: Some(100.0),
        width_obs_m: Some(3.0),
    }
}

#[test]
fn surface_four_layers_over_one_thousand_square_metres() {
    let request = CalculationRequest::new(YearRange::new(2010, 2010));
    let events = [spawn(2010, NaiveDate::from_ymd_opt(2010, 3, 15))];
    let observations = [SurfaceObservation {
        key: SpawnKey::new(2010, 1001, 1),
        measurement: Some(LayerMeasurement::Layers(4.0)),
    }];

    let out = calc_surface_index(
        &request,
        &events,
        &observations,
        &single_location(),
        &ten_metre_widths(),
        &IntensityTable::default(),
        &CalculationParameters::default(),
    )
    .unwrap();

    assert_eq!(out.rows.len(), 1);
    let row = &out.rows[0];
    assert!((row.egg_density.unwrap() - 848.872).abs() < 1e-9);
    assert_eq!(format!("{:.2}", row.spawn_index), "8.49");
    assert_eq!(row.region, "WCVI");
    assert_eq!(row.stat_area, Some(23));
    assert_eq!(row.section, Some(231));
    // the observed width is carried for audit but not used
    assert_eq!(row.width_obs_m, Some(3.0));
    assert_eq!(row.width_m, Some(10.0));
    assert!(out.advisories.is_empty());
}

#[test]
fn sok_hundred_kilograms() {
    let conv = EggBiomassConverter::new(1e8).unwrap();
    let biomass = conv.sok_biomass(100.0, &SokParameters::default()).unwrap();
    assert_eq!(format!("{biomass:.3}"), "0.327");

    let out = calc_sok_biomass(
        &CalculationRequest::new(YearRange::new(2010, 2010)),
        &[SokHarvest {
            key: SpawnKey::new(2010, 1001, 1),
            product_kg: Some(100.0),
        }],
        &single_location(),
        &CalculationParameters::default(),
    )
    .unwrap();
    assert_eq!(format!("{:.3}", out.rows[0].spawn_index), "0.327");
}

#[test]
fn missing_start_date_excluded_with_one_message() {
    let request = CalculationRequest::new(YearRange::new(2010, 2011));
    let events = [
        spawn(2010, NaiveDate::from_ymd_opt(2010, 3, 15)),
        spawn(2011, None),
    ];
    let observations = [
        SurfaceObservation {
            key: SpawnKey::new(2010, 1001, 1),
            measurement: Some(LayerMeasurement::Layers(1.0)),
        },
        SurfaceObservation {
            key: SpawnKey::new(2011, 1001, 1),
            measurement: Some(LayerMeasurement::Layers(1.0)),
        },
    ];
    let run = |quiet: bool| {
        calc_surface_index(
            &request.clone().quiet(quiet),
            &events,
            &observations,
            &single_location(),
            &ten_metre_widths(),
            &IntensityTable::default(),
            &CalculationParameters::default(),
        )
        .unwrap()
    };

    let out = run(false);
    assert_eq!(out.rows.len(), 1);
    assert_eq!(out.advisories.len(), 1);
    assert!(matches!(
        &out.advisories[0],
        Advisory::ExcludedEvent { key, .. } if key.year == 2011
    ));

    let quiet = run(true);
    assert_eq!(quiet.rows, out.rows);
    assert!(quiet.advisories.is_empty());
}

#[test]
fn rerun_is_identical() {
    let request =
        CalculationRequest::new(YearRange::new(1960, 1990)).reporting(ReportingLevel::Location);
    let events: Vec<SpawnEvent> = (1960..=1990)
        .rev()
        .map(|year| spawn(year, NaiveDate::from_ymd_opt(year, 3, 1)))
        .collect();
    let observations: Vec<SurfaceObservation> = (1960..=1990)
        .map(|year| SurfaceObservation {
            key: SpawnKey::new(year, 1001, 1),
            measurement: Some(if year < 1979 {
                LayerMeasurement::Intensity(if year < 1969 { 2 } else { 7 })
            } else {
                LayerMeasurement::Layers(2.5)
            }),
        })
        .collect();

    let run = || {
        calc_surface_index(
            &request,
            &events,
            &observations,
            &single_location(),
            &ten_metre_widths(),
            &IntensityTable::default(),
            &CalculationParameters::default(),
        )
        .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(first.rows.len(), 31);
    let years: Vec<i32> = first.rows.iter().map(|r| r.year).collect();
    let mut sorted = years.clone();
    sorted.sort();
    assert_eq!(years, sorted);
}

#[test]
fn frames_end_to_end() {
    let areas = df!(
        "sar" => [5i64],
        "region" => ["WCVI"],
        "region_name" => ["West Coast of Vancouver Island"],
        "stat_area" => [23i64],
        "group" => ["Barkley"],
        "section" => [231i64],
        "location_code" => [1001i64],
        "location_name" => ["Ucluelet Inlet"],
        "pool" => ["P1"],
    )
    .unwrap();
    let regions = df!("region" => ["WCVI"], "width_region" => [30.0]).unwrap();
    let sections = df!(
        "region" => ["WCVI"],
        "section" => [231i64],
        "width_section" => [20.0],
    )
    .unwrap();
    let pools = df!(
        "region" => ["WCVI"],
        "section" => [231i64],
        "pool" => ["P1"],
        "width_pool" => [10.0],
    )
    .unwrap();
    let events = df!(
        "year" => [2015i64],
        "location_code" => [1001i64],
        "spawn_number" => [3i64],
        "start_date" => ["2015-03-10"],
        "end_date" => ["2015-03-12"],
        "length" => [100.0],
        "width_obs" => [4.0],
    )
    .unwrap();
    let quadrats = df!(
        "year" => [2015i64, 2015],
        "location_code" => [1001i64, 1001],
        "spawn_number" => [3i64, 3],
        "egg_layers" => [3.0, 5.0],
    )
    .unwrap();

    let out = calc_surface_index(
        &CalculationRequest::new(YearRange::new(2015, 2015)),
        &read_spawn_events(&events).unwrap(),
        &read_surface_observations(&quadrats, &EraYears::default()).unwrap(),
        &read_area_hierarchy(&areas).unwrap(),
        &read_width_tables(&regions, &sections, Some(&pools)).unwrap(),
        &IntensityTable::default(),
        &CalculationParameters::default(),
    )
    .unwrap();

    let df = results_to_frame(&out.rows).unwrap();
    let source = df.column("width_source").unwrap().str().unwrap();
    assert_eq!(source.get(0), Some("pool"));
    let index = df.column("spawn_index").unwrap().f64().unwrap();
    assert_eq!(format!("{:.2}", index.get(0).unwrap()), "8.49");
}
