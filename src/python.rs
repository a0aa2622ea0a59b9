use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::area::AreaHierarchy;
use crate::error::SpawnIndexError;
use crate::frame;
use crate::index::{self, CalculationRequest, IndexOutput, ReportingLevel};
use crate::intensity::IntensityTable;
use crate::params::{CalculationParameters, YearRange};
use crate::schema;
use crate::width::WidthTables;

/// Reference tables and parameters held between calculation calls.
#[pyclass]
pub struct SpawnIndexModel {
    params: CalculationParameters,
    areas: Option<AreaHierarchy>,
    widths: Option<WidthTables>,
    intensity: IntensityTable,
}

#[pymethods]
impl SpawnIndexModel {
    /// Create a model with published parameters, optionally overridden by a
    /// JSON document (missing fields keep their defaults).
    #[new]
    #[pyo3(signature = (parameters_json=None))]
    fn new(parameters_json: Option<&str>) -> PyResult<Self> {
        let params = match parameters_json {
            Some(json) => CalculationParameters::from_json(json)?,
            None => CalculationParameters::default(),
        };
        Ok(Self {
            params,
            areas: None,
            widths: None,
            intensity: IntensityTable::default(),
        })
    }

    // ── Reference tables ────────────────────────────────────────────────────

    /// Load the area hierarchy. Returns the number of locations.
    fn load_areas(&mut self, df: PyDataFrame) -> PyResult<usize> {
        let areas = frame::read_area_hierarchy(&df.0)?;
        let count = areas.len();
        self.areas = Some(areas);
        Ok(count)
    }

    #[pyo3(signature = (regions, sections, pools=None))]
    fn load_widths(
        &mut self,
        regions: PyDataFrame,
        sections: PyDataFrame,
        pools: Option<PyDataFrame>,
    ) -> PyResult<()> {
        let widths = frame::read_width_tables(&regions.0, &sections.0, pools.as_ref().map(|p| &p.0))?;
        self.widths = Some(widths);
        Ok(())
    }

    /// Replace the built-in intensity table.
    fn load_intensity(&mut self, df: PyDataFrame) -> PyResult<()> {
        self.intensity = frame::read_intensity_table(&df.0)?;
        Ok(())
    }

    #[getter]
    fn parameters_json(&self) -> PyResult<String> {
        Ok(self.params.to_json()?)
    }

    #[getter]
    fn theta(&self) -> f64 {
        self.params.egg_conversion.theta()
    }

    // ── Calculations ────────────────────────────────────────────────────────
    //
    // Each returns (results, advisories).

    #[pyo3(signature = (events, observations, first_year, last_year, reporting="spawn", quiet=false))]
    fn calc_surface(
        &self,
        events: PyDataFrame,
        observations: PyDataFrame,
        first_year: i32,
        last_year: i32,
        reporting: &str,
        quiet: bool,
    ) -> PyResult<(PyDataFrame, Vec<String>)> {
        let request = Self::request(first_year, last_year, reporting, quiet)?;
        let out = index::calc_surface_index(
            &request,
            &frame::read_spawn_events(&events.0)?,
            &frame::read_surface_observations(&observations.0, &self.params.years)?,
            self.areas()?,
            self.widths()?,
            &self.intensity,
            &self.params,
        )?;
        Self::output(out)
    }

    #[pyo3(signature = (events, transects, plants, first_year, last_year, reporting="spawn", quiet=false))]
    #[allow(clippy::too_many_arguments)]
    fn calc_macrocystis(
        &self,
        events: PyDataFrame,
        transects: PyDataFrame,
        plants: PyDataFrame,
        first_year: i32,
        last_year: i32,
        reporting: &str,
        quiet: bool,
    ) -> PyResult<(PyDataFrame, Vec<String>)> {
        let request = Self::request(first_year, last_year, reporting, quiet)?;
        let out = index::calc_macrocystis_index(
            &request,
            &frame::read_spawn_events(&events.0)?,
            &frame::read_macrocystis(&transects.0, &plants.0)?,
            self.areas()?,
            &self.params,
        )?;
        Self::output(out)
    }

    #[pyo3(signature = (events, transects, quadrats, first_year, last_year, algae=None, reporting="spawn", quiet=false))]
    #[allow(clippy::too_many_arguments)]
    fn calc_understory(
        &self,
        events: PyDataFrame,
        transects: PyDataFrame,
        quadrats: PyDataFrame,
        first_year: i32,
        last_year: i32,
        algae: Option<PyDataFrame>,
        reporting: &str,
        quiet: bool,
    ) -> PyResult<(PyDataFrame, Vec<String>)> {
        let request = Self::request(first_year, last_year, reporting, quiet)?;
        let records = frame::read_understory(&transects.0, &quadrats.0, algae.as_ref().map(|a| &a.0))?;
        let out = index::calc_understory_index(
            &request,
            &frame::read_spawn_events(&events.0)?,
            &records,
            self.areas()?,
            &self.params,
        )?;
        Self::output(out)
    }

    #[pyo3(signature = (harvests, first_year, last_year, reporting="spawn", quiet=false))]
    fn calc_sok(
        &self,
        harvests: PyDataFrame,
        first_year: i32,
        last_year: i32,
        reporting: &str,
        quiet: bool,
    ) -> PyResult<(PyDataFrame, Vec<String>)> {
        let request = Self::request(first_year, last_year, reporting, quiet)?;
        let out = index::calc_sok_biomass(
            &request,
            &frame::read_sok_harvests(&harvests.0)?,
            self.areas()?,
            &self.params,
        )?;
        Self::output(out)
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl SpawnIndexModel {
    fn areas(&self) -> Result<&AreaHierarchy, SpawnIndexError> {
        self.areas
            .as_ref()
            .ok_or_else(|| SpawnIndexError::NotLoaded("areas".into()))
    }

    fn widths(&self) -> Result<&WidthTables, SpawnIndexError> {
        self.widths
            .as_ref()
            .ok_or_else(|| SpawnIndexError::NotLoaded("widths".into()))
    }

    fn request(
        first_year: i32,
        last_year: i32,
        reporting: &str,
        quiet: bool,
    ) -> Result<CalculationRequest, SpawnIndexError> {
        let reporting: ReportingLevel = reporting.parse()?;
        Ok(CalculationRequest::new(YearRange::new(first_year, last_year))
            .reporting(reporting)
            .quiet(quiet))
    }

    fn output(out: IndexOutput) -> PyResult<(PyDataFrame, Vec<String>)> {
        let df = frame::results_to_frame(&out.rows)?;
        let messages = out.advisories.iter().map(|a| a.to_string()).collect();
        Ok((PyDataFrame(df), messages))
    }
}

/// Export column-name constants as Python submodules.
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Area hierarchy
    let area = PyModule::new(m.py(), "area")?;
    area.add("SAR", schema::area::SAR)?;
    area.add("REGION", schema::area::REGION)?;
    area.add("REGION_NAME", schema::area::REGION_NAME)?;
    area.add("STAT_AREA", schema::area::STAT_AREA)?;
    area.add("GROUP", schema::area::GROUP)?;
    area.add("SECTION", schema::area::SECTION)?;
    area.add("LOCATION_CODE", schema::area::LOCATION_CODE)?;
    area.add("LOCATION_NAME", schema::area::LOCATION_NAME)?;
    area.add("POOL", schema::area::POOL)?;
    area.add("EASTING", schema::area::EASTING)?;
    area.add("NORTHING", schema::area::NORTHING)?;
    m.add_submodule(&area)?;

    // Median widths
    let width = PyModule::new(m.py(), "width")?;
    width.add("REGION", schema::width::REGION)?;
    width.add("SECTION", schema::width::SECTION)?;
    width.add("POOL", schema::width::POOL)?;
    width.add("WIDTH_REGION", schema::width::WIDTH_REGION)?;
    width.add("WIDTH_SECTION", schema::width::WIDTH_SECTION)?;
    width.add("WIDTH_POOL", schema::width::WIDTH_POOL)?;
    m.add_submodule(&width)?;

    // Intensity categories
    let intensity = PyModule::new(m.py(), "intensity")?;
    intensity.add("CATEGORY", schema::intensity::CATEGORY)?;
    intensity.add("DESCRIPTION", schema::intensity::DESCRIPTION)?;
    intensity.add("LAYERS", schema::intensity::LAYERS)?;
    m.add_submodule(&intensity)?;

    // Spawn events
    let spawn = PyModule::new(m.py(), "spawn")?;
    spawn.add("YEAR", schema::spawn::YEAR)?;
    spawn.add("LOCATION_CODE", schema::spawn::LOCATION_CODE)?;
    spawn.add("SPAWN_NUMBER", schema::spawn::SPAWN_NUMBER)?;
    spawn.add("START_DATE", schema::spawn::START_DATE)?;
    spawn.add("END_DATE", schema::spawn::END_DATE)?;
    spawn.add("LENGTH", schema::spawn::LENGTH)?;
    spawn.add("WIDTH_OBS", schema::spawn::WIDTH_OBS)?;
    m.add_submodule(&spawn)?;

    // Surface
    let surface = PyModule::new(m.py(), "surface")?;
    surface.add("INTENSITY", schema::surface::INTENSITY)?;
    surface.add("EGG_LAYERS", schema::surface::EGG_LAYERS)?;
    m.add_submodule(&surface)?;

    // Macrocystis
    let macrocystis = PyModule::new(m.py(), "macrocystis")?;
    macrocystis.add("TRANSECT", schema::macrocystis::TRANSECT)?;
    macrocystis.add("AREA", schema::macrocystis::AREA)?;
    macrocystis.add("SPAWN_FRACTION", schema::macrocystis::SPAWN_FRACTION)?;
    macrocystis.add("HEIGHT", schema::macrocystis::HEIGHT)?;
    macrocystis.add("STALKS", schema::macrocystis::STALKS)?;
    macrocystis.add("LAYERS", schema::macrocystis::LAYERS)?;
    m.add_submodule(&macrocystis)?;

    // Understory
    let understory = PyModule::new(m.py(), "understory")?;
    understory.add("TRANSECT", schema::understory::TRANSECT)?;
    understory.add("WIDTH", schema::understory::WIDTH)?;
    understory.add("QUADRAT", schema::understory::QUADRAT)?;
    understory.add("SUBSTRATE_LAYERS", schema::understory::SUBSTRATE_LAYERS)?;
    understory.add("SUBSTRATE_PROPORTION", schema::understory::SUBSTRATE_PROPORTION)?;
    understory.add("ALGAE_TYPE", schema::understory::ALGAE_TYPE)?;
    understory.add("ALGAE_LAYERS", schema::understory::ALGAE_LAYERS)?;
    understory.add("ALGAE_PROPORTION", schema::understory::ALGAE_PROPORTION)?;
    m.add_submodule(&understory)?;

    // Spawn-on-kelp
    let sok = PyModule::new(m.py(), "sok")?;
    sok.add("PRODUCT_KG", schema::sok::PRODUCT_KG)?;
    m.add_submodule(&sok)?;

    // Results
    let result = PyModule::new(m.py(), "result")?;
    result.add("METHOD", schema::result::METHOD)?;
    result.add("YEAR", schema::result::YEAR)?;
    result.add("REGION", schema::result::REGION)?;
    result.add("STAT_AREA", schema::result::STAT_AREA)?;
    result.add("SECTION", schema::result::SECTION)?;
    result.add("LOCATION_CODE", schema::result::LOCATION_CODE)?;
    result.add("SPAWN_NUMBER", schema::result::SPAWN_NUMBER)?;
    result.add("LENGTH", schema::result::LENGTH)?;
    result.add("WIDTH", schema::result::WIDTH)?;
    result.add("WIDTH_SOURCE", schema::result::WIDTH_SOURCE)?;
    result.add("WIDTH_OBS", schema::result::WIDTH_OBS)?;
    result.add("EGG_DENSITY", schema::result::EGG_DENSITY)?;
    result.add("EGGS", schema::result::EGGS)?;
    result.add("SPAWN_INDEX", schema::result::SPAWN_INDEX)?;
    m.add_submodule(&result)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<SpawnIndexModel>()?;
    add_schema_exports(m)?;
    Ok(())
}
