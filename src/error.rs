#[cfg(feature = "python")]
use pyo3::exceptions::PyRuntimeError;
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpawnIndexError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Invalid intensity category {category} for year {year}")]
    InvalidCategory { year: i32, category: i64 },

    #[error("Ambiguous protocol: {0}")]
    AmbiguousProtocol(String),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("Unknown substrate: {0}")]
    UnknownSubstrate(String),

    #[error("No width available for location {0}")]
    NoWidthAvailable(i64),

    #[error("Invalid conversion factor: {0}")]
    InvalidConversionFactor(f64),

    #[error("Unknown location: {0}")]
    UnknownLocation(i64),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpawnIndexError>;

#[cfg(feature = "python")]
impl From<SpawnIndexError> for PyErr {
    fn from(err: SpawnIndexError) -> PyErr {
        PyRuntimeError::new_err(err.to_string())
    }
}
