//! Crate-level error type and `Result` alias.
//! Metadata reader failures are split into "not found" and "format" errors,
//! raster failures surface as `RasterIo`, and sensor/method combinations the
//! pipeline cannot serve surface as `UnsupportedSensor`.
use std::path::PathBuf;

use thiserror::Error;

use crate::io::metadata::MetadataError;
use crate::types::Sensor;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Metadata not found: {}", .0.display())]
    MetadataNotFound(PathBuf),

    #[error("Metadata format error: {0}")]
    MetadataFormat(MetadataError),

    #[error("Raster I/O error: {0}")]
    RasterIo(#[from] crate::io::GdalError),

    #[error("Unsupported sensor {sensor}: {detail}")]
    UnsupportedSensor { sensor: Sensor, detail: String },

    #[error("{sensor} needs {expected} bands, raster has {found}")]
    InsufficientBands {
        sensor: Sensor,
        expected: usize,
        found: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<MetadataError> for Error {
    fn from(e: MetadataError) -> Self {
        match e {
            MetadataError::NotFound(path) => Error::MetadataNotFound(path),
            other => Error::MetadataFormat(other),
        }
    }
}

impl Error {
    pub fn unsupported<S: Into<String>>(sensor: Sensor, detail: S) -> Self {
        Error::UnsupportedSensor {
            sensor,
            detail: detail.into(),
        }
    }
}
