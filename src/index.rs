//! Spawn index calculation.
//!
//! Each entry point joins spawn events with per-method egg densities, turns
//! them into total eggs per spawn, converts eggs to biomass and reports the
//! result at the requested spatial granularity. Rows come back sorted by
//! their reporting key so repeated runs produce identical tables.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::debug;

use crate::advisory::{Advisories, Advisory};
use crate::area::{AreaHierarchy, Location};
use crate::conversion::EggBiomassConverter;
use crate::density::{
    macrocystis_density, require_non_negative, surface_density, understory_transect_density,
    MacrocystisTransect, UnderstoryTransect,
};
use crate::error::{Result, SpawnIndexError};
use crate::intensity::{resolve_layers, IntensityTable, LayerMeasurement};
use crate::params::{CalculationParameters, ParameterGroup, YearRange};
use crate::width::{WidthSource, WidthTables};

/// Thousands of eggs to eggs.
const EGGS_PER_DENSITY_UNIT: f64 = 1000.0;

/// Identifies one spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpawnKey {
    pub year: i32,
    pub location_code: i64,
    pub spawn_number: i64,
}

impl SpawnKey {
    pub fn new(year: i32, location_code: i64, spawn_number: i64) -> Self {
        Self {
            year,
            location_code,
            spawn_number,
        }
    }
}

/// One surveyed spawn: extent and timing, shared by all methods.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnEvent {
    pub key: SpawnKey,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub length_m: Option<f64>,
    /// Width recorded in the field. Audit only for the surface index.
    pub width_obs_m: Option<f64>,
}

/// A surface quadrat observation.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceObservation {
    pub key: SpawnKey,
    pub measurement: Option<LayerMeasurement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacrocystisRecord {
    pub key: SpawnKey,
    pub transect: MacrocystisTransect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnderstoryRecord {
    pub key: SpawnKey,
    pub transect: UnderstoryTransect,
}

/// Harvested spawn-on-kelp product attributed to a spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SokHarvest {
    pub key: SpawnKey,
    pub product_kg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurveyMethod {
    Surface,
    Macrocystis,
    Understory,
    SpawnOnKelp,
    Combined,
}

impl SurveyMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Macrocystis => "macrocystis",
            Self::Understory => "understory",
            Self::SpawnOnKelp => "sok",
            Self::Combined => "combined",
        }
    }
}

impl fmt::Display for SurveyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spatial granularity of output rows, finest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportingLevel {
    #[default]
    Spawn,
    Location,
    Section,
    StatArea,
    Region,
}

impl FromStr for ReportingLevel {
    type Err = SpawnIndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spawn" => Ok(Self::Spawn),
            "location" => Ok(Self::Location),
            "section" => Ok(Self::Section),
            "stat_area" => Ok(Self::StatArea),
            "region" => Ok(Self::Region),
            _ => Err(SpawnIndexError::InvalidData(format!(
                "Invalid reporting level: '{s}'. Must be one of spawn, location, section, stat_area, region"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationRequest {
    pub years: YearRange,
    pub reporting: ReportingLevel,
    /// Suppress advisories. Validation errors are still returned.
    pub quiet: bool,
}

impl CalculationRequest {
    pub fn new(years: YearRange) -> Self {
        Self {
            years,
            reporting: ReportingLevel::Spawn,
            quiet: false,
        }
    }

    pub fn reporting(mut self, reporting: ReportingLevel) -> Self {
        self.reporting = reporting;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// One output row. Key columns finer than the reporting level are `None`,
/// as are the per-spawn measurement columns on aggregated rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnIndexRow {
    pub method: SurveyMethod,
    pub year: i32,
    pub region: String,
    pub stat_area: Option<i64>,
    pub section: Option<i64>,
    pub location_code: Option<i64>,
    pub spawn_number: Option<i64>,
    pub length_m: Option<f64>,
    pub width_m: Option<f64>,
    pub width_source: Option<WidthSource>,
    pub width_obs_m: Option<f64>,
    /// 10^3 eggs * m^-2.
    pub egg_density: Option<f64>,
    pub eggs: f64,
    /// Spawning biomass (t).
    pub spawn_index: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ReportKey {
    year: i32,
    region: String,
    stat_area: Option<i64>,
    section: Option<i64>,
    location_code: Option<i64>,
    spawn_number: Option<i64>,
}

impl SpawnIndexRow {
    fn key_at(&self, level: ReportingLevel) -> ReportKey {
        let depth = match level {
            ReportingLevel::Region => 0,
            ReportingLevel::StatArea => 1,
            ReportingLevel::Section => 2,
            ReportingLevel::Location => 3,
            ReportingLevel::Spawn => 4,
        };
        ReportKey {
            year: self.year,
            region: self.region.clone(),
            stat_area: self.stat_area.filter(|_| depth >= 1),
            section: self.section.filter(|_| depth >= 2),
            location_code: self.location_code.filter(|_| depth >= 3),
            spawn_number: self.spawn_number.filter(|_| depth >= 4),
        }
    }

    fn summary(method: SurveyMethod, key: ReportKey) -> Self {
        Self {
            method,
            year: key.year,
            region: key.region,
            stat_area: key.stat_area,
            section: key.section,
            location_code: key.location_code,
            spawn_number: key.spawn_number,
            length_m: None,
            width_m: None,
            width_source: None,
            width_obs_m: None,
            egg_density: None,
            eggs: 0.0,
            spawn_index: 0.0,
        }
    }
}

/// Rows produced by one calculation call plus its advisories.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOutput {
    pub rows: Vec<SpawnIndexRow>,
    pub advisories: Vec<Advisory>,
}

/// Sum rows to `level`, keeping methods apart. Spawn-level rows are only sorted.
pub fn aggregate(mut rows: Vec<SpawnIndexRow>, level: ReportingLevel) -> Vec<SpawnIndexRow> {
    if level == ReportingLevel::Spawn {
        rows.sort_by(|a, b| {
            a.key_at(level)
                .cmp(&b.key_at(level))
                .then(a.method.cmp(&b.method))
        });
        return rows;
    }
    sum_rows(rows.iter(), level, |row| row.method)
}

/// Total index across survey methods at `level`.
pub fn combine_methods<'r>(
    rows: impl IntoIterator<Item = &'r SpawnIndexRow>,
    level: ReportingLevel,
) -> Vec<SpawnIndexRow> {
    sum_rows(rows, level, |_| SurveyMethod::Combined)
}

fn sum_rows<'r>(
    rows: impl IntoIterator<Item = &'r SpawnIndexRow>,
    level: ReportingLevel,
    method_of: impl Fn(&SpawnIndexRow) -> SurveyMethod,
) -> Vec<SpawnIndexRow> {
    let mut groups: BTreeMap<(ReportKey, SurveyMethod), SpawnIndexRow> = BTreeMap::new();
    for row in rows {
        let key = row.key_at(level);
        let method = method_of(row);
        let total = groups
            .entry((key.clone(), method))
            .or_insert_with(|| SpawnIndexRow::summary(method, key));
        total.eggs += row.eggs;
        total.spawn_index += row.spawn_index;
    }
    groups.into_values().collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// State shared by one calculation call.
struct Run<'a> {
    request: &'a CalculationRequest,
    areas: &'a AreaHierarchy,
    converter: EggBiomassConverter,
    params: &'a CalculationParameters,
    advisories: Advisories,
    flagged_years: BTreeSet<i32>,
    flagged_locations: BTreeSet<i64>,
}

impl<'a> Run<'a> {
    fn start(
        request: &'a CalculationRequest,
        params: &'a CalculationParameters,
        areas: &'a AreaHierarchy,
        group: ParameterGroup,
    ) -> Result<Self> {
        let YearRange { first, last } = request.years;
        if first > last {
            return Err(SpawnIndexError::InvalidData(format!(
                "Year range {first}-{last} is reversed"
            )));
        }
        let converter = EggBiomassConverter::from_parameters(&params.egg_conversion)?;
        let mut advisories = Advisories::new(request.quiet);

        converter.check_literature(&mut advisories);
        for group in [group, ParameterGroup::EggConversion] {
            if !params.is_default(group) {
                advisories.push(Advisory::NonDefaultParameter {
                    group: group.name(),
                });
            }
        }

        Ok(Self {
            request,
            areas,
            converter,
            params,
            advisories,
            flagged_years: BTreeSet::new(),
            flagged_locations: BTreeSet::new(),
        })
    }

    /// Whether a record falls in the requested years. Years present in the
    /// data but outside the assessment window are flagged once each.
    fn in_years(&mut self, key: &SpawnKey) -> bool {
        if !self.request.years.contains(key.year) {
            return false;
        }
        let params: &'a CalculationParameters = self.params;
        let years = &params.years;
        if !years.in_assessment(key.year) && self.flagged_years.insert(key.year) {
            self.advisories.push(Advisory::YearOutsideAssessment {
                year: key.year,
                assessment_start: years.assessment_start,
                assessment_end: years.last_assessment_year(),
            });
        }
        true
    }

    /// Report measurements recorded for spawns that have no event.
    fn exclude_unmatched<'k>(
        &mut self,
        measured: impl IntoIterator<Item = &'k SpawnKey>,
        events: &[&SpawnEvent],
    ) {
        let known: BTreeSet<SpawnKey> = events.iter().map(|e| e.key).collect();
        for key in measured {
            if !known.contains(key) {
                self.exclude(*key, "no spawn event recorded");
            }
        }
    }

    /// Requested spawn events in key order; keys must be unique.
    fn events<'e>(&mut self, events: &'e [SpawnEvent]) -> Result<Vec<&'e SpawnEvent>> {
        let mut by_key: BTreeMap<SpawnKey, &SpawnEvent> = BTreeMap::new();
        for event in events.iter().filter(|e| self.in_years(&e.key)) {
            if by_key.insert(event.key, event).is_some() {
                return Err(SpawnIndexError::InvalidData(format!(
                    "Duplicate spawn event: year {}, location {}, spawn {}",
                    event.key.year, event.key.location_code, event.key.spawn_number
                )));
            }
        }
        Ok(by_key.into_values().collect())
    }

    fn exclude(&mut self, key: SpawnKey, reason: &str) {
        self.advisories.push(Advisory::ExcludedEvent {
            key,
            reason: reason.to_string(),
        });
    }

    /// Spawn length, or `None` after reporting an incomplete event.
    fn usable_length(&mut self, event: &SpawnEvent) -> Result<Option<f64>> {
        let (Some(start), Some(end)) = (event.start, event.end) else {
            self.exclude(event.key, "missing start or end date");
            return Ok(None);
        };
        if end < start {
            return Err(SpawnIndexError::InvalidMeasurement(format!(
                "spawn {} at location {} ends ({end}) before it starts ({start})",
                event.key.spawn_number, event.key.location_code
            )));
        }
        let Some(length) = event.length_m else {
            self.exclude(event.key, "missing spawn length");
            return Ok(None);
        };
        Ok(Some(require_non_negative("spawn length", length)?))
    }

    /// Location for a spawn; a section without a group is flagged once.
    fn locate(&mut self, location_code: i64) -> Result<&'a Location> {
        let areas: &'a AreaHierarchy = self.areas;
        let location = areas.get(location_code)?;
        if location.group.is_none() && self.flagged_locations.insert(location_code) {
            self.advisories.push(Advisory::IncompleteMetadata {
                location_code,
                section: location.section,
            });
        }
        Ok(location)
    }

    fn spawn_row(&self, method: SurveyMethod, event: &SpawnEvent, location: &Location) -> SpawnIndexRow {
        SpawnIndexRow {
            method,
            year: event.key.year,
            region: location.region.clone(),
            stat_area: Some(location.stat_area),
            section: Some(location.section),
            location_code: Some(location.location_code),
            spawn_number: Some(event.key.spawn_number),
            length_m: event.length_m,
            width_m: None,
            width_source: None,
            width_obs_m: event.width_obs_m,
            egg_density: None,
            eggs: 0.0,
            spawn_index: 0.0,
        }
    }

    fn with_eggs(&self, mut row: SpawnIndexRow, density: f64, width_m: f64) -> SpawnIndexRow {
        let length = row.length_m.unwrap_or(0.0);
        row.egg_density = Some(density);
        row.width_m = Some(width_m);
        row.eggs = density * EGGS_PER_DENSITY_UNIT * length * width_m;
        row.spawn_index = self.converter.eggs_to_biomass(row.eggs);
        row
    }

    fn finish(self, method: SurveyMethod, rows: Vec<SpawnIndexRow>) -> IndexOutput {
        debug!(
            method = method.as_str(),
            spawns = rows.len(),
            advisories = self.advisories.len(),
            "spawn index calculated"
        );
        IndexOutput {
            rows: aggregate(rows, self.request.reporting),
            advisories: self.advisories.into_vec(),
        }
    }
}

/// Surface spawn index.
///
/// Quadrat layers (recorded directly or resolved from intensity) give egg
/// density; spawn area is length times the median width for the location.
pub fn calc_surface_index(
    request: &CalculationRequest,
    events: &[SpawnEvent],
    observations: &[SurfaceObservation],
    areas: &AreaHierarchy,
    widths: &WidthTables,
    intensity: &IntensityTable,
    params: &CalculationParameters,
) -> Result<IndexOutput> {
    let mut run = Run::start(request, params, areas, ParameterGroup::Surface)?;

    let mut densities: BTreeMap<SpawnKey, Vec<f64>> = BTreeMap::new();
    for obs in observations.iter().filter(|o| run.in_years(&o.key)) {
        let Some(measurement) = obs.measurement else {
            continue;
        };
        let layers = resolve_layers(obs.key.year, measurement, intensity, &params.years)?;
        densities
            .entry(obs.key)
            .or_default()
            .push(surface_density(layers, &params.surface)?);
    }

    let events = run.events(events)?;
    let mut rows = Vec::new();
    for &event in &events {
        if run.usable_length(event)?.is_none() {
            continue;
        }
        let Some(quadrats) = densities.get(&event.key) else {
            run.exclude(event.key, "no surface layers or intensity recorded");
            continue;
        };
        let location = run.locate(event.key.location_code)?;
        let width = widths.resolve(location)?;

        let row = run.spawn_row(SurveyMethod::Surface, event, location);
        let mut row = run.with_eggs(row, mean(quadrats), width.width_m);
        row.width_source = Some(width.source);
        rows.push(row);
    }
    run.exclude_unmatched(densities.keys(), &events);

    Ok(run.finish(SurveyMethod::Surface, rows))
}

/// Macrocystis spawn index over the observed spawn bed.
pub fn calc_macrocystis_index(
    request: &CalculationRequest,
    events: &[SpawnEvent],
    transects: &[MacrocystisRecord],
    areas: &AreaHierarchy,
    params: &CalculationParameters,
) -> Result<IndexOutput> {
    let mut run = Run::start(request, params, areas, ParameterGroup::Macrocystis)?;

    let mut densities: BTreeMap<SpawnKey, Vec<f64>> = BTreeMap::new();
    for record in transects.iter().filter(|r| run.in_years(&r.key)) {
        densities
            .entry(record.key)
            .or_default()
            .push(macrocystis_density(&record.transect, &params.macrocystis)?);
    }

    let events = run.events(events)?;
    let mut rows = Vec::new();
    for &event in &events {
        if run.usable_length(event)?.is_none() {
            continue;
        }
        let Some(width_obs) = event.width_obs_m else {
            run.exclude(event.key, "missing observed spawn width");
            continue;
        };
        let width_obs = require_non_negative("observed spawn width", width_obs)?;
        let Some(transect_densities) = densities.get(&event.key) else {
            run.exclude(event.key, "no Macrocystis transects recorded");
            continue;
        };
        let location = run.locate(event.key.location_code)?;

        let row = run.spawn_row(SurveyMethod::Macrocystis, event, location);
        rows.push(run.with_eggs(row, mean(transect_densities), width_obs));
    }
    run.exclude_unmatched(densities.keys(), &events);

    Ok(run.finish(SurveyMethod::Macrocystis, rows))
}

/// Understory spawn index.
///
/// Transect density is the mean over its quadrats; spawn density is the
/// transect-width-weighted mean, applied over length times mean transect width.
pub fn calc_understory_index(
    request: &CalculationRequest,
    events: &[SpawnEvent],
    transects: &[UnderstoryRecord],
    areas: &AreaHierarchy,
    params: &CalculationParameters,
) -> Result<IndexOutput> {
    let mut run = Run::start(request, params, areas, ParameterGroup::Understory)?;

    // (density, width) per transect
    let mut by_spawn: BTreeMap<SpawnKey, Vec<(f64, f64)>> = BTreeMap::new();
    for record in transects.iter().filter(|r| run.in_years(&r.key)) {
        let width = require_non_negative("transect width", record.transect.width_m)?;
        if width == 0.0 {
            return Err(SpawnIndexError::InvalidMeasurement(format!(
                "transect {} has zero width",
                record.transect.transect
            )));
        }
        let density = understory_transect_density(&record.transect, &params.understory)?;
        by_spawn.entry(record.key).or_default().push((density, width));
    }

    let events = run.events(events)?;
    let mut rows = Vec::new();
    for &event in &events {
        if run.usable_length(event)?.is_none() {
            continue;
        }
        let Some(spawn_transects) = by_spawn.get(&event.key) else {
            run.exclude(event.key, "no understory transects recorded");
            continue;
        };
        let location = run.locate(event.key.location_code)?;

        let total_width: f64 = spawn_transects.iter().map(|(_, w)| w).sum();
        let density = spawn_transects.iter().map(|(d, w)| d * w).sum::<f64>() / total_width;
        let width = total_width / spawn_transects.len() as f64;

        let row = run.spawn_row(SurveyMethod::Understory, event, location);
        rows.push(run.with_eggs(row, density, width));
    }
    run.exclude_unmatched(by_spawn.keys(), &events);

    Ok(run.finish(SurveyMethod::Understory, rows))
}

/// Spawning biomass back-calculated from spawn-on-kelp harvest.
pub fn calc_sok_biomass(
    request: &CalculationRequest,
    harvests: &[SokHarvest],
    areas: &AreaHierarchy,
    params: &CalculationParameters,
) -> Result<IndexOutput> {
    let mut run = Run::start(request, params, areas, ParameterGroup::Sok)?;

    let mut product: BTreeMap<SpawnKey, f64> = BTreeMap::new();
    let mut missing: BTreeSet<SpawnKey> = BTreeSet::new();
    for harvest in harvests.iter().filter(|h| run.in_years(&h.key)) {
        match harvest.product_kg {
            Some(kg) => *product.entry(harvest.key).or_default() += kg,
            None => {
                missing.insert(harvest.key);
            }
        }
    }
    // One unweighed harvest leaves the spawn's total unknown.
    for key in missing {
        product.remove(&key);
        run.exclude(key, "missing SOK product mass");
    }

    let mut rows = Vec::new();
    for (key, kg) in product {
        let location = run.locate(key.location_code)?;
        let eggs = run.converter.sok_eggs(kg, &params.sok)?;
        rows.push(SpawnIndexRow {
            method: SurveyMethod::SpawnOnKelp,
            year: key.year,
            region: location.region.clone(),
            stat_area: Some(location.stat_area),
            section: Some(location.section),
            location_code: Some(location.location_code),
            spawn_number: Some(key.spawn_number),
            length_m: None,
            width_m: None,
            width_source: None,
            width_obs_m: None,
            egg_density: None,
            eggs,
            spawn_index: run.converter.eggs_to_biomass(eggs),
        });
    }

    Ok(run.finish(SurveyMethod::SpawnOnKelp, rows))
}
