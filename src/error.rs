//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while computing a correlation coefficient or its p-value.
#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("correlation needs at least 2 pairs, got {0}")]
    TooFewPairs(usize),

    #[error("sequences differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("input has zero variance")]
    ZeroVariance,

    #[error("failed to build t distribution: {0}")]
    Distribution(String),
}

/// Failures raised by an observation store or result sink.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The sink has no flag row matching this classification label.
    #[error("unknown classification label '{0}'")]
    UnknownLabel(String),
}

/// Failures raised while loading weather and ISPU CSV files.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing file: {0}")]
    MissingFile(PathBuf),

    #[error("not a CSV: {0}")]
    NotCsv(PathBuf),

    #[error("cannot infer city from filename: {0}")]
    NoCityToken(PathBuf),

    #[error("city tokens not aligned: '{weather}' vs '{ispu}'")]
    CityMismatch { weather: String, ispu: String },

    #[error("{file} missing columns: {missing:?}")]
    MissingColumns { file: String, missing: Vec<String> },

    #[error("city '{0}' not found in city table")]
    UnknownCity(String),

    #[error("no location found for city_id={0}")]
    NoLocation(i64),

    #[error("failed reading CSV {0}")]
    Csv(PathBuf, #[source] csv::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for IngestError {
    fn from(e: rusqlite::Error) -> Self {
        IngestError::Store(StoreError::Sqlite(e))
    }
}

/// Malformed configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Store(StoreError::Sqlite(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
