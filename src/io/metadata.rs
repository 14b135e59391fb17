//! Uniform per-scene calibration record and the sensor dispatch that builds it.
//!
//! `SceneMetadata` holds what every sensor shares (the sensor tag and a bag of
//! informational fields) plus a `Calibration` sum type carrying the
//! coefficients a given sensor family actually needs. Coefficient list lengths
//! are validated at construction, so the conversion math never sees a
//! short list.
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::types::Sensor;

/// Errors encountered when reading scene metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Missing field `{0}` in scene metadata")]
    MissingField(&'static str),
    #[error("Invalid value for `{field}`: {value:?}")]
    InvalidValue { field: String, value: String },
    #[error("`{field}` has {found} values, expected {expected}")]
    BandCountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Sentinel-2 L1C coefficients: DN are already TOA reflectance scaled by
/// `quantification_value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentinel2Calibration {
    pub quantification_value: f64,
    pub sun_zenith_deg: f64,
    /// One value per calibrated band, raster band order
    pub solar_irradiance: Vec<f64>,
}

/// Landsat-7/8 per-band radiance rescaling gains and offsets, band order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandsatCalibration {
    pub radiance_mult: Vec<f64>,
    pub radiance_add: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Calibration {
    Sentinel2(Sentinel2Calibration),
    Landsat(LandsatCalibration),
}

/// Raster grid of one Sentinel-2 resolution inside a tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileGeometry {
    pub resolution_m: u32,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub ulx: Option<f64>,
    pub uly: Option<f64>,
}

/// Informational fields. Carried through to output provenance, never
/// consumed by the conversion math.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneInfo {
    pub product_name: Option<String>,
    pub product_start: Option<String>,
    pub processing_level: Option<String>,
    pub spacecraft: Option<String>,
    pub orbit_direction: Option<String>,
    pub reflectance_conversion_u: Option<f64>,
    pub sun_zenith_deg: Option<f64>,
    pub sun_azimuth_deg: Option<f64>,
    pub sensor_zenith_deg: Option<f64>,
    pub sensor_azimuth_deg: Option<f64>,
    pub projection: Option<String>,
    pub cloud_cover_percent: Option<f64>,
    pub metadata_namespace: Option<String>,
    pub tile_geometry: Vec<TileGeometry>,
}

impl SceneInfo {
    pub fn geometry_at(&self, resolution_m: u32) -> Option<&TileGeometry> {
        self.tile_geometry
            .iter()
            .find(|g| g.resolution_m == resolution_m)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneMetadata {
    pub sensor: Sensor,
    pub calibration: Calibration,
    pub info: SceneInfo,
}

impl SceneMetadata {
    /// Build a record, checking the calibration variant matches the sensor
    /// family and every coefficient list covers the sensor's band window.
    pub fn new(
        sensor: Sensor,
        calibration: Calibration,
        info: SceneInfo,
    ) -> Result<Self, MetadataError> {
        let expected = sensor.vis_nir_band_count();
        let check = |field: &'static str, found: usize| {
            if found == expected {
                Ok(())
            } else {
                Err(MetadataError::BandCountMismatch {
                    field,
                    expected,
                    found,
                })
            }
        };
        match &calibration {
            Calibration::Sentinel2(c) => {
                if !sensor.is_sentinel2() {
                    return Err(MetadataError::InvalidValue {
                        field: "sensor".into(),
                        value: format!("{} with Sentinel-2 coefficients", sensor),
                    });
                }
                check("SOLAR_IRRADIANCE", c.solar_irradiance.len())?;
                if !(c.quantification_value > 0.0) {
                    return Err(MetadataError::InvalidValue {
                        field: "QUANTIFICATION_VALUE".into(),
                        value: c.quantification_value.to_string(),
                    });
                }
            }
            Calibration::Landsat(c) => {
                if !sensor.is_landsat() {
                    return Err(MetadataError::InvalidValue {
                        field: "sensor".into(),
                        value: format!("{} with Landsat coefficients", sensor),
                    });
                }
                check("RADIANCE_MULT_BAND", c.radiance_mult.len())?;
                check("RADIANCE_ADD_BAND", c.radiance_add.len())?;
            }
        }
        Ok(Self {
            sensor,
            calibration,
            info,
        })
    }

    pub fn sun_zenith_deg(&self) -> Option<f64> {
        match &self.calibration {
            Calibration::Sentinel2(c) => Some(c.sun_zenith_deg),
            Calibration::Landsat(_) => self.info.sun_zenith_deg,
        }
    }

    pub fn sentinel2(&self) -> Option<&Sentinel2Calibration> {
        match &self.calibration {
            Calibration::Sentinel2(c) => Some(c),
            Calibration::Landsat(_) => None,
        }
    }

    pub fn landsat(&self) -> Option<&LandsatCalibration> {
        match &self.calibration {
            Calibration::Landsat(c) => Some(c),
            Calibration::Sentinel2(_) => None,
        }
    }
}

/// Read the calibration metadata of one scene.
///
/// Sentinel-2 expects the product-level `MTD_MSIL1C.xml` (the granule file is
/// located next to it); Landsat expects the `*_MTL.txt` file.
pub fn read_metadata(path: &Path, sensor: Sensor) -> Result<SceneMetadata, MetadataError> {
    if !path.is_file() {
        return Err(MetadataError::NotFound(path.to_path_buf()));
    }
    info!("Reading {} metadata from {:?}", sensor, path);
    match sensor {
        Sensor::Sentinel2R10m | Sensor::Sentinel2R60m => {
            crate::io::sentinel2::read_sentinel2_metadata(path, sensor)
        }
        Sensor::Landsat8 | Sensor::Landsat7 => {
            crate::io::landsat::read_landsat_metadata(path, sensor)
        }
    }
}

/// Parse a float field, naming the field on failure
pub(crate) fn parse_f64(field: &str, value: &str) -> Result<f64, MetadataError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| MetadataError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}
