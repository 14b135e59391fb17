//! Landsat-7/8 MTL reader.
//!
//! The MTL file is plain text made of `KEY = VALUE` lines grouped by
//! `GROUP = ...` / `END_GROUP = ...`. Only the per-band radiance rescaling
//! factors are required; a handful of scene descriptors are kept as
//! informational fields.
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::io::metadata::{
    Calibration, LandsatCalibration, MetadataError, SceneInfo, SceneMetadata, parse_f64,
};
use crate::types::Sensor;

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9_]+)\s*=\s*(.*?)\s*$").expect("static regex"));

static BAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RADIANCE_(MULT|ADD)_BAND_(\d+)$").expect("static regex"));

/// Parsed MTL content: every `KEY = VALUE` pair (first occurrence wins,
/// quotes stripped) plus the radiance factors keyed by band number.
#[derive(Debug, Default)]
pub struct MtlFile {
    values: HashMap<String, String>,
    mult: BTreeMap<u32, String>,
    add: BTreeMap<u32, String>,
}

impl MtlFile {
    pub fn parse(text: &str) -> Self {
        let mut mtl = MtlFile::default();

        for line in text.lines() {
            let Some(caps) = LINE_RE.captures(line) else {
                continue;
            };
            let key = caps[1].to_string();
            let value = caps[2].trim_matches('"').to_string();
            if key == "GROUP" || key == "END_GROUP" {
                continue;
            }
            if let Some(band) = BAND_RE.captures(&key) {
                // Thermal keys such as RADIANCE_MULT_BAND_6_VCID_1 do not match
                if let Ok(n) = band[2].parse::<u32>() {
                    let target = if &band[1] == "MULT" {
                        &mut mtl.mult
                    } else {
                        &mut mtl.add
                    };
                    target.entry(n).or_insert_with(|| value.clone());
                }
            }
            mtl.values.entry(key).or_insert(value);
        }
        mtl
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Coefficients for bands `1..=bands`, ascending band order
    fn band_coefficients(
        factors: &BTreeMap<u32, String>,
        field: &'static str,
        bands: usize,
    ) -> Result<Vec<f64>, MetadataError> {
        (1..=bands as u32)
            .map(|n| {
                let value = factors.get(&n).ok_or(MetadataError::MissingField(field))?;
                parse_f64(&format!("{field}_{n}"), value)
            })
            .collect()
    }

    pub fn radiance_mult(&self, bands: usize) -> Result<Vec<f64>, MetadataError> {
        Self::band_coefficients(&self.mult, "RADIANCE_MULT_BAND", bands)
    }

    pub fn radiance_add(&self, bands: usize) -> Result<Vec<f64>, MetadataError> {
        Self::band_coefficients(&self.add, "RADIANCE_ADD_BAND", bands)
    }

    fn scene_info(&self) -> SceneInfo {
        let projection = match (self.get("MAP_PROJECTION"), self.get("UTM_ZONE")) {
            (Some(p), Some(zone)) => Some(format!("{p} zone {zone}")),
            (Some(p), None) => Some(p.to_string()),
            (None, Some(zone)) => Some(format!("UTM zone {zone}")),
            (None, None) => None,
        };
        SceneInfo {
            product_name: self
                .get("LANDSAT_PRODUCT_ID")
                .or_else(|| self.get("LANDSAT_SCENE_ID"))
                .map(str::to_string),
            product_start: self.get("DATE_ACQUIRED").map(|date| match self.get("SCENE_CENTER_TIME") {
                Some(time) => format!("{date}T{time}"),
                None => date.to_string(),
            }),
            processing_level: self
                .get("PROCESSING_LEVEL")
                .or_else(|| self.get("DATA_TYPE"))
                .map(str::to_string),
            spacecraft: self.get("SPACECRAFT_ID").map(str::to_string),
            sun_zenith_deg: self.get_f64("SUN_ELEVATION").map(|e| 90.0 - e),
            sun_azimuth_deg: self.get_f64("SUN_AZIMUTH"),
            projection,
            cloud_cover_percent: self.get_f64("CLOUD_COVER"),
            ..SceneInfo::default()
        }
    }
}

/// Build the scene record from MTL text
pub fn scene_from_mtl(text: &str, sensor: Sensor) -> Result<SceneMetadata, MetadataError> {
    let mtl = MtlFile::parse(text);
    let bands = sensor.vis_nir_band_count();
    let radiance_mult = mtl.radiance_mult(bands)?;
    let radiance_add = mtl.radiance_add(bands)?;
    debug!("Radiance mult {:?}, add {:?}", radiance_mult, radiance_add);

    if let (Some(found), Some(expected)) = (mtl.get("SPACECRAFT_ID"), sensor.landsat_spacecraft_id()) {
        if found != expected {
            warn!("MTL reports SPACECRAFT_ID {} but sensor {} was selected", found, sensor);
        }
    }

    SceneMetadata::new(
        sensor,
        Calibration::Landsat(LandsatCalibration {
            radiance_mult,
            radiance_add,
        }),
        mtl.scene_info(),
    )
}

/// Read a Landsat `*_MTL.txt` file
pub fn read_landsat_metadata(path: &Path, sensor: Sensor) -> Result<SceneMetadata, MetadataError> {
    let text = fs::read_to_string(path)?;
    scene_from_mtl(&text, sensor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MTL_L8: &str = r#"GROUP = L1_METADATA_FILE
  GROUP = METADATA_FILE_INFO
    LANDSAT_SCENE_ID = "LC81960222015159LGN00"
  END_GROUP = METADATA_FILE_INFO
  GROUP = PRODUCT_METADATA
    DATA_TYPE = "L1T"
    SPACECRAFT_ID = "LANDSAT_8"
    DATE_ACQUIRED = 2015-06-08
    SCENE_CENTER_TIME = "10:22:32.5871070Z"
    UTM_ZONE = 32
  END_GROUP = PRODUCT_METADATA
  GROUP = IMAGE_ATTRIBUTES
    CLOUD_COVER = 3.25
    SUN_AZIMUTH = 142.5
    SUN_ELEVATION = 58.0
  END_GROUP = IMAGE_ATTRIBUTES
  GROUP = RADIOMETRIC_RESCALING
    RADIANCE_MULT_BAND_2 = 1.2460E-02
    RADIANCE_MULT_BAND_1 = 1.2168E-02
    RADIANCE_MULT_BAND_3 = 1.1482E-02
    RADIANCE_MULT_BAND_4 = 9.6820E-03
    RADIANCE_MULT_BAND_5 = 5.9250E-03
    RADIANCE_MULT_BAND_10 = 3.3420E-04
    RADIANCE_ADD_BAND_1 = -60.84222
    RADIANCE_ADD_BAND_2 = -62.30213
    RADIANCE_ADD_BAND_3 = -57.41046
    RADIANCE_ADD_BAND_4 = -48.41238
    RADIANCE_ADD_BAND_5 = -29.62490
    RADIANCE_ADD_BAND_10 = 0.10000
  END_GROUP = RADIOMETRIC_RESCALING
END_GROUP = L1_METADATA_FILE
END
"#;

    #[test]
    fn coefficients_come_out_in_band_order() {
        let meta = scene_from_mtl(MTL_L8, Sensor::Landsat8).unwrap();
        let cal = meta.landsat().unwrap();
        assert_eq!(cal.radiance_mult, vec![1.2168e-2, 1.2460e-2, 1.1482e-2, 9.6820e-3, 5.9250e-3]);
        assert_eq!(cal.radiance_add[0], -60.84222);
        assert_eq!(cal.radiance_add[4], -29.62490);
    }

    #[test]
    fn informational_fields_are_carried() {
        let meta = scene_from_mtl(MTL_L8, Sensor::Landsat8).unwrap();
        assert_eq!(meta.info.spacecraft.as_deref(), Some("LANDSAT_8"));
        assert_eq!(meta.info.sun_zenith_deg, Some(32.0));
        assert_eq!(meta.sun_zenith_deg(), Some(32.0));
        assert_eq!(meta.info.cloud_cover_percent, Some(3.25));
        assert_eq!(meta.info.projection.as_deref(), Some("UTM zone 32"));
        assert_eq!(meta.info.product_name.as_deref(), Some("LC81960222015159LGN00"));
    }

    #[test]
    fn landsat7_window_ignores_extra_bands() {
        let meta = scene_from_mtl(MTL_L8, Sensor::Landsat7).unwrap();
        assert_eq!(meta.landsat().unwrap().radiance_add.len(), 4);
    }

    #[test]
    fn missing_band_factor_is_reported() {
        let text = MTL_L8.replace("RADIANCE_ADD_BAND_3 = -57.41046", "");
        let err = scene_from_mtl(&text, Sensor::Landsat8).unwrap_err();
        assert!(matches!(err, MetadataError::MissingField("RADIANCE_ADD_BAND")));
    }

    #[test]
    fn malformed_factor_is_reported() {
        let text = MTL_L8.replace("9.6820E-03", "n/a");
        let err = scene_from_mtl(&text, Sensor::Landsat8).unwrap_err();
        match err {
            MetadataError::InvalidValue { field, .. } => assert_eq!(field, "RADIANCE_MULT_BAND_4"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn absent_informational_fields_are_fine() {
        let text: String = MTL_L8
            .lines()
            .filter(|l| l.contains("RADIANCE_"))
            .collect::<Vec<_>>()
            .join("\n");
        let meta = scene_from_mtl(&text, Sensor::Landsat8).unwrap();
        assert_eq!(meta.info, SceneInfo::default());
    }
}
