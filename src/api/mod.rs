//! High-level library API: calibrate a scene in memory or straight to a
//! GeoTIFF. Prefer these entrypoints over the per-sensor processing modules
//! when embedding TOACAL.
use std::path::Path;

use tracing::{info, warn};

use crate::core::params::{CalibrationConfig, WriteOptions};
use crate::core::processing::pipeline::run_calibration;
use crate::core::raster::RasterImage;
use crate::error::Result;
use crate::io::gdal::load_dn_raster;
use crate::io::metadata::{SceneMetadata, read_metadata};
use crate::io::writers::metadata::{create_metadata_sidecar, embed_calibration_metadata};
use crate::io::writers::tiff::{discard_failed_output, save_by_copy, to_mem_dataset};
use crate::types::AtmCorrMethod;

/// Result of in-memory calibration
#[derive(Debug, Clone)]
pub struct CalibratedImage {
    pub image: RasterImage,
    pub metadata: SceneMetadata,
    pub method: AtmCorrMethod,
}

/// Compare the raster grid with the tile geometry listed for the selected
/// Sentinel-2 resolution. Returns false (after logging a warning) on a
/// mismatch; unknown geometry counts as a match.
pub fn check_tile_grid(metadata: &SceneMetadata, raster: &RasterImage) -> bool {
    let Some(resolution) = metadata.sensor.resolution_m() else {
        return true;
    };
    let Some(geometry) = metadata.info.geometry_at(resolution) else {
        return true;
    };
    let rows_ok = geometry.rows.is_none_or(|r| r == raster.rows());
    let cols_ok = geometry.cols.is_none_or(|c| c == raster.cols());
    if !(rows_ok && cols_ok) {
        warn!(
            "Raster is {}x{} but the {} m tile grid is {:?}x{:?}",
            raster.rows(),
            raster.cols(),
            resolution,
            geometry.rows,
            geometry.cols
        );
        return false;
    }
    true
}

/// Read metadata, then the DN raster. Metadata comes first so a bad
/// metadata file fails before any raster is opened.
pub fn load_scene(config: &CalibrationConfig) -> Result<(SceneMetadata, RasterImage)> {
    let metadata = read_metadata(&config.metadata_file, config.sensor)?;
    let dn = load_dn_raster(&config.dn_file, config.sensor)?;
    check_tile_grid(&metadata, &dn);
    Ok((metadata, dn))
}

/// Calibrate the scene described by `config` without touching the output path
pub fn calibrate(config: &CalibrationConfig) -> Result<CalibratedImage> {
    let (metadata, dn) = load_scene(config)?;
    let image = run_calibration(&dn, &metadata, config.sensor, config.atm_corr_method)?;
    Ok(CalibratedImage {
        image,
        metadata,
        method: config.atm_corr_method,
    })
}

/// Write a calibrated image with its provenance embedded as GeoTIFF
/// metadata, plus an optional JSON sidecar
pub fn save_calibrated(
    calibrated: &CalibratedImage,
    output: &Path,
    options: &WriteOptions,
    sidecar: bool,
) -> Result<()> {
    let image = &calibrated.image;
    let crs = image.epsg();

    let mut mem = to_mem_dataset(image)?;
    embed_calibration_metadata(
        &mut mem,
        &calibrated.metadata,
        calibrated.method,
        crs.as_deref(),
    )?;
    save_by_copy(&mem, output, options)?;

    if sidecar {
        let written = create_metadata_sidecar(
            output,
            &calibrated.metadata,
            calibrated.method,
            image.geotransform,
            crs.as_deref(),
        );
        // Raster and sidecar are delivered together or not at all
        if let Err(e) = written {
            warn!("Sidecar for {:?} failed, removing raster: {}", output, e);
            discard_failed_output(output, false);
            return Err(e);
        }
    }

    info!(
        "Wrote {} band(s) of {}x{} to {:?}",
        image.band_count(),
        image.cols(),
        image.rows(),
        output
    );
    Ok(())
}

/// Calibrate the scene described by `config` and write it to
/// `config.reflectance_file`. On error no output file is left behind.
pub fn calibrate_to_path(
    config: &CalibrationConfig,
    options: &WriteOptions,
    sidecar: bool,
) -> Result<()> {
    info!(
        "Calibrating {:?} ({}, {}) -> {:?}",
        config.dn_file, config.sensor, config.atm_corr_method, config.reflectance_file
    );
    let calibrated = calibrate(config)?;
    save_calibrated(&calibrated, &config.reflectance_file, options, sidecar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::IDENTITY_GEOTRANSFORM;
    use crate::io::metadata::{Calibration, SceneInfo, Sentinel2Calibration, TileGeometry};
    use crate::types::Sensor;
    use ndarray::Array3;

    fn meta(sensor: Sensor, geometry: Vec<TileGeometry>) -> SceneMetadata {
        SceneMetadata::new(
            sensor,
            Calibration::Sentinel2(Sentinel2Calibration {
                quantification_value: 10000.0,
                sun_zenith_deg: 30.0,
                solar_irradiance: vec![1500.0; 9],
            }),
            SceneInfo {
                tile_geometry: geometry,
                ..SceneInfo::default()
            },
        )
        .unwrap()
    }

    fn grid(resolution_m: u32, rows: usize, cols: usize) -> TileGeometry {
        TileGeometry {
            resolution_m,
            rows: Some(rows),
            cols: Some(cols),
            ulx: None,
            uly: None,
        }
    }

    #[test]
    fn tile_grid_check_uses_selected_resolution() {
        let raster = RasterImage::new(Array3::zeros((4, 6, 9)), IDENTITY_GEOTRANSFORM, "");
        let geometry = vec![grid(10, 40, 60), grid(60, 4, 6)];
        assert!(check_tile_grid(&meta(Sensor::Sentinel2R60m, geometry.clone()), &raster));
        assert!(!check_tile_grid(&meta(Sensor::Sentinel2R10m, geometry), &raster));
    }

    #[test]
    fn unknown_tile_grid_is_accepted() {
        let raster = RasterImage::new(Array3::zeros((4, 6, 9)), IDENTITY_GEOTRANSFORM, "");
        assert!(check_tile_grid(&meta(Sensor::Sentinel2R10m, Vec::new()), &raster));
    }

    #[test]
    fn missing_metadata_fails_before_raster_is_read() {
        let config = CalibrationConfig {
            sensor: Sensor::Landsat8,
            dn_file: "/nonexistent/LC08_B1.TIF".into(),
            metadata_file: "/nonexistent/LC08_MTL.txt".into(),
            reflectance_file: "/nonexistent/out.tif".into(),
            atm_corr_method: AtmCorrMethod::Rad,
        };
        let err = calibrate(&config).unwrap_err();
        assert!(matches!(err, crate::Error::MetadataNotFound(_)));
    }
}
