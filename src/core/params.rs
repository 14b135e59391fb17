use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{AtmCorrMethod, Compression, Sensor};

/// One calibration run, as supplied by a front end or a JSON config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationConfig {
    pub sensor: Sensor,
    /// DN raster. For Landsat this may be one `*_B<n>.TIF` of a band-per-file scene.
    pub dn_file: PathBuf,
    /// `MTD_MSIL1C.xml` for Sentinel-2, `*_MTL.txt` for Landsat
    pub metadata_file: PathBuf,
    /// Output GeoTIFF
    pub reflectance_file: PathBuf,
    pub atm_corr_method: AtmCorrMethod,
}

impl CalibrationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// GeoTIFF creation settings handed to the writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    pub compression: Compression,
    /// TIFF predictor (1 = none, 2 = horizontal, 3 = floating point)
    pub predictor: u8,
    pub bigtiff_if_safer: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Deflate,
            predictor: 1,
            bigtiff_if_safer: true,
        }
    }
}

impl WriteOptions {
    /// `KEY=VALUE` GTiff creation options
    pub fn creation_options(&self) -> Vec<(&'static str, String)> {
        let mut options = vec![("COMPRESS", self.compression.gdal_name().to_string())];
        if self.compression != Compression::None {
            options.push(("PREDICTOR", self.predictor.to_string()));
        }
        if self.bigtiff_if_safer {
            options.push(("BIGTIFF", "IF_SAFER".to_string()));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_front_end_config() {
        let cfg = CalibrationConfig::from_json_str(
            r#"{
                "sensor": "S2A_10m",
                "dnFile": "/data/stack.tif",
                "metadataFile": "/data/S2A.SAFE/MTD_MSIL1C.xml",
                "reflectanceFile": "/out/refl.tif",
                "atmCorrMethod": "DOS"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.sensor, Sensor::Sentinel2R10m);
        assert_eq!(cfg.atm_corr_method, AtmCorrMethod::Dos);
        assert_eq!(cfg.reflectance_file, PathBuf::from("/out/refl.tif"));
    }

    #[test]
    fn unknown_sensor_is_a_config_error() {
        let err = CalibrationConfig::from_json_str(
            r#"{"sensor": "S2B_20m", "dnFile": "a", "metadataFile": "b",
                "reflectanceFile": "c", "atmCorrMethod": "TOA"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn default_write_options_match_lossless_deflate() {
        let opts = WriteOptions::default().creation_options();
        assert_eq!(
            opts,
            vec![
                ("COMPRESS", "DEFLATE".to_string()),
                ("PREDICTOR", "1".to_string()),
                ("BIGTIFF", "IF_SAFER".to_string()),
            ]
        );
    }

    #[test]
    fn uncompressed_output_skips_predictor() {
        let opts = WriteOptions {
            compression: Compression::None,
            predictor: 2,
            bigtiff_if_safer: false,
        };
        assert_eq!(opts.creation_options(), vec![("COMPRESS", "NONE".to_string())]);
    }
}
