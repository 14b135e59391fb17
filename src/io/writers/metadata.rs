use gdal::Dataset;
use gdal::Metadata;
use serde_json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::processing::pipeline::CalibrationPath;
use crate::error::Result;
use crate::io::gdal::GdalError;
use crate::io::metadata::{Calibration, SceneMetadata};
use crate::types::AtmCorrMethod;

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Collect calibration provenance as `KEY -> value` pairs.
///
/// `crs` is the output's CRS code when known (see `RasterImage::epsg`);
/// otherwise the code recorded in the scene metadata is used.
pub fn extract_metadata_fields(
    meta: &SceneMetadata,
    method: AtmCorrMethod,
    crs: Option<&str>,
) -> HashMap<String, String> {
    let mut metadata = HashMap::new();

    metadata.insert("SENSOR".to_string(), meta.sensor.to_string());
    metadata.insert("METHOD".to_string(), method.to_string());
    metadata.insert(
        "QUANTITY".to_string(),
        CalibrationPath::select(meta.sensor, method)
            .quantity()
            .to_string(),
    );
    metadata.insert(
        "BAND_COUNT".to_string(),
        meta.sensor.vis_nir_band_count().to_string(),
    );

    // Coefficients actually used
    match &meta.calibration {
        Calibration::Sentinel2(c) => {
            metadata.insert(
                "QUANTIFICATION_VALUE".to_string(),
                c.quantification_value.to_string(),
            );
            metadata.insert("SOLAR_IRRADIANCE".to_string(), join(&c.solar_irradiance));
        }
        Calibration::Landsat(c) => {
            metadata.insert("RADIANCE_MULT".to_string(), join(&c.radiance_mult));
            metadata.insert("RADIANCE_ADD".to_string(), join(&c.radiance_add));
        }
    }

    let info = &meta.info;
    if let Some(zenith) = meta.sun_zenith_deg() {
        metadata.insert("SUN_ZENITH".to_string(), zenith.to_string());
    }
    if let Some(azimuth) = info.sun_azimuth_deg {
        metadata.insert("SUN_AZIMUTH".to_string(), azimuth.to_string());
    }
    if let Some(zenith) = info.sensor_zenith_deg {
        metadata.insert("VIEWING_ZENITH".to_string(), zenith.to_string());
    }
    if let Some(azimuth) = info.sensor_azimuth_deg {
        metadata.insert("VIEWING_AZIMUTH".to_string(), azimuth.to_string());
    }
    if let Some(u) = info.reflectance_conversion_u {
        metadata.insert("REFLECTANCE_CONVERSION_U".to_string(), u.to_string());
    }

    // Product identification
    if let Some(name) = &info.product_name {
        metadata.insert("PRODUCT_NAME".to_string(), name.clone());
    }
    if let Some(start) = &info.product_start {
        metadata.insert("ACQUISITION_START".to_string(), start.clone());
    }
    if let Some(level) = &info.processing_level {
        metadata.insert("PROCESSING_LEVEL".to_string(), level.clone());
    }
    if let Some(spacecraft) = &info.spacecraft {
        metadata.insert("SPACECRAFT".to_string(), spacecraft.clone());
    }
    if let Some(direction) = &info.orbit_direction {
        metadata.insert("ORBIT_DIRECTION".to_string(), direction.clone());
    }
    if let Some(cloud) = info.cloud_cover_percent {
        metadata.insert("CLOUD_COVER".to_string(), cloud.to_string());
    }
    if let Some(crs) = crs.or(info.projection.as_deref()) {
        if !crs.is_empty() {
            metadata.insert("CRS".to_string(), crs.to_string());
        }
    }

    metadata.insert(
        "CONVERSION_TOOL".to_string(),
        env!("CARGO_PKG_NAME").to_string(),
    );
    metadata.insert(
        "CONVERSION_VERSION".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    metadata.insert(
        "CONVERSION_TIMESTAMP".to_string(),
        chrono::Utc::now().to_rfc3339(),
    );

    metadata
}

/// Convert metadata HashMap to JSON format
pub fn convert_metadata_to_json(
    metadata: &HashMap<String, String>,
) -> serde_json::Map<String, serde_json::Value> {
    let mut json_metadata = serde_json::Map::new();

    for (key, value) in metadata {
        let json_key = key.to_lowercase();
        // Comma-separated coefficient lists become arrays
        let parsed: Option<Vec<f64>> = if value.contains(',') {
            value.split(',').map(|v| v.parse::<f64>().ok()).collect()
        } else {
            None
        };
        let json_value = match parsed {
            Some(list) => serde_json::Value::Array(list.into_iter().map(number_or_null).collect()),
            None => match value.parse::<f64>() {
                Ok(num) => number_or_null(num),
                Err(_) => serde_json::Value::String(value.clone()),
            },
        };
        json_metadata.insert(json_key, json_value);
    }

    json_metadata
}

fn number_or_null(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Embed calibration provenance into an output dataset
pub fn embed_calibration_metadata(
    ds: &mut Dataset,
    meta: &SceneMetadata,
    method: AtmCorrMethod,
    crs: Option<&str>,
) -> std::result::Result<(), GdalError> {
    let mut metadata: Vec<_> = extract_metadata_fields(meta, method, crs).into_iter().collect();
    // Stable item order keeps repeated writes identical
    metadata.sort();
    for (key, value) in metadata {
        ds.set_metadata_item(&key, &value, "")?;
    }
    Ok(())
}

/// Write the provenance as pretty JSON next to `output_path` and return the
/// sidecar's path
pub fn create_metadata_sidecar(
    output_path: &Path,
    meta: &SceneMetadata,
    method: AtmCorrMethod,
    geotransform: [f64; 6],
    crs: Option<&str>,
) -> Result<PathBuf> {
    let metadata = extract_metadata_fields(meta, method, crs);
    let mut json_metadata = convert_metadata_to_json(&metadata);
    json_metadata.insert(
        "geotransform".to_string(),
        serde_json::Value::Array(geotransform.iter().map(|&v| number_or_null(v)).collect()),
    );

    let sidecar_path = output_path.with_extension("json");
    let json_string = serde_json::to_string_pretty(&json_metadata)?;
    std::fs::write(&sidecar_path, json_string)?;

    info!("Created metadata sidecar: {:?}", sidecar_path);
    Ok(sidecar_path)
}
