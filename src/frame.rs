//! Tabular boundary: polars frames in, typed records out, and back.
//!
//! Column presence and types are checked once here. Numeric columns are cast
//! so integer, float and string encodings are all accepted; date columns may
//! be `Date` or `%Y-%m-%d` strings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::area::{AreaHierarchy, Location};
use crate::density::{
    AlgaeCover, MacrocystisPlant, MacrocystisTransect, UnderstoryQuadrat, UnderstoryTransect,
};
use crate::error::{Result, SpawnIndexError};
use crate::index::{
    MacrocystisRecord, SokHarvest, SpawnEvent, SpawnIndexRow, SpawnKey, SurfaceObservation,
    UnderstoryRecord,
};
use crate::intensity::{IntensityCategory, IntensityTable, LayerMeasurement};
use crate::params::EraYears;
use crate::schema::{area, intensity, macrocystis, result, sok, spawn, surface, understory, width};
use crate::width::{PoolWidth, RegionWidth, SectionWidth, WidthTables};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Column helpers ──────────────────────────────────────────────────────────

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(SpawnIndexError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

fn floats(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    if !has_column(df, name) {
        return Ok(vec![None; df.height()]);
    }
    let s = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(s.f64()?.into_iter().collect())
}

fn ints(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    if !has_column(df, name) {
        return Ok(vec![None; df.height()]);
    }
    let s = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(s.i64()?.into_iter().collect())
}

fn strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if !has_column(df, name) {
        return Ok(vec![None; df.height()]);
    }
    let s = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(s.str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect())
}

fn dates(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    strings(df, name)?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.map(|s| {
                NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
                    SpawnIndexError::InvalidData(format!(
                        "Unparseable {name} '{s}' at row {i}: {e}"
                    ))
                })
            })
            .transpose()
        })
        .collect()
}

fn required<T>(value: Option<T>, column: &str, row: usize) -> Result<T> {
    value.ok_or_else(|| SpawnIndexError::InvalidData(format!("Null {column} at row {row}")))
}

fn spawn_keys(df: &DataFrame) -> Result<Vec<SpawnKey>> {
    require_columns(df, &spawn::KEY)?;
    let years = ints(df, spawn::YEAR)?;
    let codes = ints(df, spawn::LOCATION_CODE)?;
    let numbers = ints(df, spawn::SPAWN_NUMBER)?;

    (0..df.height())
        .map(|i| {
            let year = required(years[i], spawn::YEAR, i)?;
            let year = i32::try_from(year).map_err(|_| {
                SpawnIndexError::InvalidData(format!("Year {year} out of range at row {i}"))
            })?;
            Ok(SpawnKey::new(
                year,
                required(codes[i], spawn::LOCATION_CODE, i)?,
                required(numbers[i], spawn::SPAWN_NUMBER, i)?,
            ))
        })
        .collect()
}

// ── Reference tables ────────────────────────────────────────────────────────

pub fn read_area_hierarchy(df: &DataFrame) -> Result<AreaHierarchy> {
    require_columns(df, &area::REQUIRED)?;

    let sar = ints(df, area::SAR)?;
    let region = strings(df, area::REGION)?;
    let region_name = strings(df, area::REGION_NAME)?;
    let stat_area = ints(df, area::STAT_AREA)?;
    let group = strings(df, area::GROUP)?;
    let section = ints(df, area::SECTION)?;
    let location_code = ints(df, area::LOCATION_CODE)?;
    let location_name = strings(df, area::LOCATION_NAME)?;
    let pool = strings(df, area::POOL)?;
    let easting = floats(df, area::EASTING)?;
    let northing = floats(df, area::NORTHING)?;

    let mut locations = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        locations.push(Location {
            sar: required(sar[i], area::SAR, i)?,
            region: required(region[i].clone(), area::REGION, i)?,
            region_name: required(region_name[i].clone(), area::REGION_NAME, i)?,
            stat_area: required(stat_area[i], area::STAT_AREA, i)?,
            group: group[i].clone(),
            section: required(section[i], area::SECTION, i)?,
            location_code: required(location_code[i], area::LOCATION_CODE, i)?,
            location_name: required(location_name[i].clone(), area::LOCATION_NAME, i)?,
            pool: pool[i].clone(),
            easting: easting[i],
            northing: northing[i],
        });
    }
    AreaHierarchy::new(locations)
}

/// Build width tables from region, section and (optionally) pool frames.
pub fn read_width_tables(
    regions: &DataFrame,
    sections: &DataFrame,
    pools: Option<&DataFrame>,
) -> Result<WidthTables> {
    require_columns(regions, &[width::REGION, width::WIDTH_REGION])?;
    require_columns(sections, &[width::REGION, width::SECTION, width::WIDTH_SECTION])?;

    let names = strings(regions, width::REGION)?;
    let values = floats(regions, width::WIDTH_REGION)?;
    let region_rows = (0..regions.height())
        .map(|i| {
            Ok(RegionWidth {
                region: required(names[i].clone(), width::REGION, i)?,
                width_m: required(values[i], width::WIDTH_REGION, i)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let names = strings(sections, width::REGION)?;
    let codes = ints(sections, width::SECTION)?;
    let values = floats(sections, width::WIDTH_SECTION)?;
    let section_rows = (0..sections.height())
        .map(|i| {
            Ok(SectionWidth {
                region: required(names[i].clone(), width::REGION, i)?,
                section: required(codes[i], width::SECTION, i)?,
                width_m: required(values[i], width::WIDTH_SECTION, i)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut pool_rows = Vec::new();
    if let Some(pools) = pools {
        require_columns(
            pools,
            &[width::REGION, width::SECTION, width::POOL, width::WIDTH_POOL],
        )?;
        let names = strings(pools, width::REGION)?;
        let codes = ints(pools, width::SECTION)?;
        let pool_names = strings(pools, width::POOL)?;
        let values = floats(pools, width::WIDTH_POOL)?;
        for i in 0..pools.height() {
            // Pools without a median width fall back to the section width
            let Some(width_m) = values[i] else {
                continue;
            };
            pool_rows.push(PoolWidth {
                region: required(names[i].clone(), width::REGION, i)?,
                section: required(codes[i], width::SECTION, i)?,
                pool: required(pool_names[i].clone(), width::POOL, i)?,
                width_m,
            });
        }
    }

    WidthTables::new(region_rows, section_rows, pool_rows)
}

pub fn read_intensity_table(df: &DataFrame) -> Result<IntensityTable> {
    require_columns(df, &[intensity::CATEGORY, intensity::LAYERS])?;
    let categories = ints(df, intensity::CATEGORY)?;
    let descriptions = strings(df, intensity::DESCRIPTION)?;
    let layers = floats(df, intensity::LAYERS)?;

    let rows = (0..df.height())
        .map(|i| {
            Ok(IntensityCategory {
                category: required(categories[i], intensity::CATEGORY, i)?,
                description: descriptions[i].clone().unwrap_or_default(),
                layers: required(layers[i], intensity::LAYERS, i)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    IntensityTable::new(rows)
}

// ── Survey tables ───────────────────────────────────────────────────────────

pub fn read_spawn_events(df: &DataFrame) -> Result<Vec<SpawnEvent>> {
    require_columns(df, &[spawn::START_DATE, spawn::END_DATE, spawn::LENGTH])?;
    let keys = spawn_keys(df)?;
    let start = dates(df, spawn::START_DATE)?;
    let end = dates(df, spawn::END_DATE)?;
    let length = floats(df, spawn::LENGTH)?;
    let width_obs = floats(df, spawn::WIDTH_OBS)?;

    Ok(keys
        .into_iter()
        .enumerate()
        .map(|(i, key)| SpawnEvent {
            key,
            start: start[i],
            end: end[i],
            length_m: length[i],
            width_obs_m: width_obs[i],
        })
        .collect())
}

/// Surface quadrats. Needs `egg_layers`, `intensity`, or both; the year of
/// each row decides which one is read (see [`LayerMeasurement::for_year`]).
pub fn read_surface_observations(
    df: &DataFrame,
    years: &EraYears,
) -> Result<Vec<SurfaceObservation>> {
    if !has_column(df, surface::EGG_LAYERS) && !has_column(df, surface::INTENSITY) {
        return Err(SpawnIndexError::MissingColumn(format!(
            "{} or {}",
            surface::EGG_LAYERS,
            surface::INTENSITY
        )));
    }
    let keys = spawn_keys(df)?;
    let layers = floats(df, surface::EGG_LAYERS)?;
    let intensity = ints(df, surface::INTENSITY)?;

    Ok(keys
        .into_iter()
        .enumerate()
        .map(|(i, key)| SurfaceObservation {
            key,
            measurement: LayerMeasurement::for_year(key.year, intensity[i], layers[i], years),
        })
        .collect())
}

type TransectKey = (SpawnKey, i64);

fn transect_keys(df: &DataFrame, column: &str) -> Result<Vec<TransectKey>> {
    require_columns(df, &[column])?;
    let keys = spawn_keys(df)?;
    let transects = ints(df, column)?;
    keys.into_iter()
        .enumerate()
        .map(|(i, key)| Ok((key, required(transects[i], column, i)?)))
        .collect()
}

/// Macrocystis transects with their plants attached.
pub fn read_macrocystis(transects: &DataFrame, plants: &DataFrame) -> Result<Vec<MacrocystisRecord>> {
    require_columns(
        transects,
        &[macrocystis::AREA, macrocystis::SPAWN_FRACTION],
    )?;
    require_columns(
        plants,
        &[macrocystis::HEIGHT, macrocystis::STALKS, macrocystis::LAYERS],
    )?;

    let plant_keys = transect_keys(plants, macrocystis::TRANSECT)?;
    let height = floats(plants, macrocystis::HEIGHT)?;
    let stalks = floats(plants, macrocystis::STALKS)?;
    let layers = floats(plants, macrocystis::LAYERS)?;

    let mut by_transect: BTreeMap<TransectKey, Vec<MacrocystisPlant>> = BTreeMap::new();
    for (i, key) in plant_keys.into_iter().enumerate() {
        by_transect.entry(key).or_default().push(MacrocystisPlant {
            height_m: required(height[i], macrocystis::HEIGHT, i)?,
            stalks: required(stalks[i], macrocystis::STALKS, i)?,
            layers: required(layers[i], macrocystis::LAYERS, i)?,
        });
    }

    let keys = transect_keys(transects, macrocystis::TRANSECT)?;
    let area = floats(transects, macrocystis::AREA)?;
    let fraction = floats(transects, macrocystis::SPAWN_FRACTION)?;

    let mut records = Vec::with_capacity(keys.len());
    for (i, (key, transect)) in keys.into_iter().enumerate() {
        records.push(MacrocystisRecord {
            key,
            transect: MacrocystisTransect {
                transect,
                area_m2: required(area[i], macrocystis::AREA, i)?,
                spawn_fraction: required(fraction[i], macrocystis::SPAWN_FRACTION, i)?,
                plants: by_transect.remove(&(key, transect)).unwrap_or_default(),
            },
        });
    }

    if let Some(((key, transect), _)) = by_transect.into_iter().next() {
        return Err(SpawnIndexError::InvalidData(format!(
            "Plants recorded for unknown transect {transect} of spawn {} at location {} in {}",
            key.spawn_number, key.location_code, key.year
        )));
    }
    Ok(records)
}

/// Understory transects with quadrats and algae attached. Algae are optional.
pub fn read_understory(
    transects: &DataFrame,
    quadrats: &DataFrame,
    algae: Option<&DataFrame>,
) -> Result<Vec<UnderstoryRecord>> {
    require_columns(transects, &[understory::WIDTH])?;
    require_columns(
        quadrats,
        &[
            understory::QUADRAT,
            understory::SUBSTRATE_LAYERS,
            understory::SUBSTRATE_PROPORTION,
        ],
    )?;

    let mut algae_by_quadrat: BTreeMap<(TransectKey, i64), Vec<AlgaeCover>> = BTreeMap::new();
    if let Some(algae) = algae {
        require_columns(
            algae,
            &[
                understory::QUADRAT,
                understory::ALGAE_TYPE,
                understory::ALGAE_LAYERS,
                understory::ALGAE_PROPORTION,
            ],
        )?;
        let keys = transect_keys(algae, understory::TRANSECT)?;
        let quadrat = ints(algae, understory::QUADRAT)?;
        let algae_type = strings(algae, understory::ALGAE_TYPE)?;
        let layers = floats(algae, understory::ALGAE_LAYERS)?;
        let proportion = floats(algae, understory::ALGAE_PROPORTION)?;
        for (i, key) in keys.into_iter().enumerate() {
            let quadrat = required(quadrat[i], understory::QUADRAT, i)?;
            algae_by_quadrat
                .entry((key, quadrat))
                .or_default()
                .push(AlgaeCover {
                    algae_type: required(algae_type[i].clone(), understory::ALGAE_TYPE, i)?,
                    layers: required(layers[i], understory::ALGAE_LAYERS, i)?,
                    proportion: required(proportion[i], understory::ALGAE_PROPORTION, i)?,
                });
        }
    }

    let keys = transect_keys(quadrats, understory::TRANSECT)?;
    let quadrat = ints(quadrats, understory::QUADRAT)?;
    let sub_layers = floats(quadrats, understory::SUBSTRATE_LAYERS)?;
    let sub_prop = floats(quadrats, understory::SUBSTRATE_PROPORTION)?;

    let mut quadrats_by_transect: BTreeMap<TransectKey, Vec<UnderstoryQuadrat>> = BTreeMap::new();
    for (i, key) in keys.into_iter().enumerate() {
        let quadrat = required(quadrat[i], understory::QUADRAT, i)?;
        quadrats_by_transect
            .entry(key)
            .or_default()
            .push(UnderstoryQuadrat {
                quadrat,
                substrate_layers: required(sub_layers[i], understory::SUBSTRATE_LAYERS, i)?,
                substrate_proportion: required(sub_prop[i], understory::SUBSTRATE_PROPORTION, i)?,
                algae: algae_by_quadrat.remove(&(key, quadrat)).unwrap_or_default(),
            });
    }

    if let Some((((key, transect), quadrat), _)) = algae_by_quadrat.into_iter().next() {
        return Err(SpawnIndexError::InvalidData(format!(
            "Algae recorded for unknown quadrat {quadrat} on transect {transect} of spawn {} at location {} in {}",
            key.spawn_number, key.location_code, key.year
        )));
    }

    let keys = transect_keys(transects, understory::TRANSECT)?;
    let width = floats(transects, understory::WIDTH)?;
    keys.into_iter()
        .enumerate()
        .map(|(i, (key, transect))| {
            Ok(UnderstoryRecord {
                key,
                transect: UnderstoryTransect {
                    transect,
                    width_m: required(width[i], understory::WIDTH, i)?,
                    quadrats: quadrats_by_transect
                        .remove(&(key, transect))
                        .unwrap_or_default(),
                },
            })
        })
        .collect()
}

pub fn read_sok_harvests(df: &DataFrame) -> Result<Vec<SokHarvest>> {
    require_columns(df, &[sok::PRODUCT_KG])?;
    let keys = spawn_keys(df)?;
    let product = floats(df, sok::PRODUCT_KG)?;
    Ok(keys
        .into_iter()
        .enumerate()
        .map(|(i, key)| SokHarvest {
            key,
            product_kg: product[i],
        })
        .collect())
}

// ── Results ─────────────────────────────────────────────────────────────────

pub fn results_to_frame(rows: &[SpawnIndexRow]) -> Result<DataFrame> {
    let method: Vec<&str> = rows.iter().map(|r| r.method.as_str()).collect();
    let year: Vec<i32> = rows.iter().map(|r| r.year).collect();
    let region: Vec<&str> = rows.iter().map(|r| r.region.as_str()).collect();
    let stat_area: Vec<Option<i64>> = rows.iter().map(|r| r.stat_area).collect();
    let section: Vec<Option<i64>> = rows.iter().map(|r| r.section).collect();
    let location_code: Vec<Option<i64>> = rows.iter().map(|r| r.location_code).collect();
    let spawn_number: Vec<Option<i64>> = rows.iter().map(|r| r.spawn_number).collect();
    let length: Vec<Option<f64>> = rows.iter().map(|r| r.length_m).collect();
    let width_m: Vec<Option<f64>> = rows.iter().map(|r| r.width_m).collect();
    let width_source: Vec<Option<&str>> = rows
        .iter()
        .map(|r| r.width_source.map(|s| s.as_str()))
        .collect();
    let width_obs: Vec<Option<f64>> = rows.iter().map(|r| r.width_obs_m).collect();
    let egg_density: Vec<Option<f64>> = rows.iter().map(|r| r.egg_density).collect();
    let eggs: Vec<f64> = rows.iter().map(|r| r.eggs).collect();
    let spawn_index: Vec<f64> = rows.iter().map(|r| r.spawn_index).collect();

    let df = DataFrame::new(vec![
        Column::new(result::METHOD.into(), &method),
        Column::new(result::YEAR.into(), &year),
        Column::new(result::REGION.into(), &region),
        Column::new(result::STAT_AREA.into(), &stat_area),
        Column::new(result::SECTION.into(), &section),
        Column::new(result::LOCATION_CODE.into(), &location_code),
        Column::new(result::SPAWN_NUMBER.into(), &spawn_number),
        Column::new(result::LENGTH.into(), &length),
        Column::new(result::WIDTH.into(), &width_m),
        Column::new(result::WIDTH_SOURCE.into(), &width_source),
        Column::new(result::WIDTH_OBS.into(), &width_obs),
        Column::new(result::EGG_DENSITY.into(), &egg_density),
        Column::new(result::EGGS.into(), &eggs),
        Column::new(result::SPAWN_INDEX.into(), &spawn_index),
    ])?;
    Ok(df)
}
