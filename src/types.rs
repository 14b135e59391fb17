//! Shared types and enums used across toacal.
//! Includes `Sensor`, `AtmCorrMethod` and the output `Compression` scheme.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Sensor {
    #[serde(rename = "L8")]
    Landsat8,
    #[serde(rename = "L7")]
    Landsat7,
    #[serde(rename = "S2A_10m")]
    Sentinel2R10m,
    #[serde(rename = "S2A_60m")]
    Sentinel2R60m,
}

impl Sensor {
    /// Number of visible/near-infrared bands calibrated for this sensor.
    /// Bands are always the first `n` bands of the input, in order.
    pub fn vis_nir_band_count(self) -> usize {
        match self {
            Sensor::Landsat8 => 5,
            Sensor::Landsat7 => 4,
            Sensor::Sentinel2R10m | Sensor::Sentinel2R60m => 9,
        }
    }

    pub fn is_sentinel2(self) -> bool {
        matches!(self, Sensor::Sentinel2R10m | Sensor::Sentinel2R60m)
    }

    pub fn is_landsat(self) -> bool {
        matches!(self, Sensor::Landsat8 | Sensor::Landsat7)
    }

    /// Ground sampling distance the Sentinel-2 variant is delivered at
    pub fn resolution_m(self) -> Option<u32> {
        match self {
            Sensor::Sentinel2R10m => Some(10),
            Sensor::Sentinel2R60m => Some(60),
            Sensor::Landsat8 | Sensor::Landsat7 => None,
        }
    }

    /// Value of `SPACECRAFT_ID` expected in a Landsat MTL file
    pub fn landsat_spacecraft_id(self) -> Option<&'static str> {
        match self {
            Sensor::Landsat8 => Some("LANDSAT_8"),
            Sensor::Landsat7 => Some("LANDSAT_7"),
            _ => None,
        }
    }
}

// Manual implementation so the CLI accepts the same short names as config files
impl clap::ValueEnum for Sensor {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Sensor::Landsat8,
            Sensor::Landsat7,
            Sensor::Sentinel2R10m,
            Sensor::Sentinel2R60m,
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Sensor::Landsat8 => clap::builder::PossibleValue::new("l8").alias("L8"),
            Sensor::Landsat7 => clap::builder::PossibleValue::new("l7").alias("L7"),
            Sensor::Sentinel2R10m => {
                clap::builder::PossibleValue::new("s2a-10m").alias("S2A_10m")
            }
            Sensor::Sentinel2R60m => {
                clap::builder::PossibleValue::new("s2a-60m").alias("S2A_60m")
            }
        })
    }
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sensor::Landsat8 => "L8",
            Sensor::Landsat7 => "L7",
            Sensor::Sentinel2R10m => "S2A_10m",
            Sensor::Sentinel2R60m => "S2A_60m",
        };
        write!(f, "{}", s)
    }
}

/// Atmospheric correction method selected by the front end
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize)]
pub enum AtmCorrMethod {
    /// TOA reflectance after dark-object subtraction
    #[serde(rename = "DOS")]
    Dos,
    /// Plain TOA reflectance
    #[serde(rename = "TOA")]
    Toa,
    /// TOA radiance
    #[serde(rename = "RAD")]
    Rad,
}

impl AtmCorrMethod {
    pub fn applies_dos(self) -> bool {
        matches!(self, AtmCorrMethod::Dos)
    }
}

impl std::fmt::Display for AtmCorrMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtmCorrMethod::Dos => write!(f, "DOS"),
            AtmCorrMethod::Toa => write!(f, "TOA"),
            AtmCorrMethod::Rad => write!(f, "RAD"),
        }
    }
}

/// Lossless compression used for the GeoTIFF output
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum Compression {
    Deflate,
    Lzw,
    None,
}

impl Compression {
    /// GDAL `COMPRESS` creation option value
    pub fn gdal_name(self) -> &'static str {
        match self {
            Compression::Deflate => "DEFLATE",
            Compression::Lzw => "LZW",
            Compression::None => "NONE",
        }
    }
}
