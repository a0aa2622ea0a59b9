//! Herring spawn index calculation.
//!
//! Converts spawn-survey observations (surface, Macrocystis, understory and
//! spawn-on-kelp harvest) into egg density, total eggs and spawning biomass
//! in tonnes, reported from single spawns up to regions.

pub mod advisory;
pub mod area;
pub mod conversion;
pub mod density;
pub mod error;
pub mod frame;
pub mod index;
pub mod intensity;
pub mod params;
pub mod schema;
pub mod width;

#[cfg(feature = "python")]
mod python;

pub use advisory::{Advisories, Advisory};
pub use area::{AreaHierarchy, Location};
pub use conversion::{EggBiomassConverter, DEFAULT_THETA};
pub use error::{Result, SpawnIndexError};
pub use index::{
    aggregate, calc_macrocystis_index, calc_sok_biomass, calc_surface_index,
    calc_understory_index, combine_methods, CalculationRequest, IndexOutput, ReportingLevel,
    SpawnEvent, SpawnIndexRow, SpawnKey, SurfaceObservation, SurveyMethod,
};
pub use intensity::{IntensityTable, LayerMeasurement};
pub use params::{CalculationParameters, YearRange};
pub use width::WidthTables;
