use tracing::{debug, info};

use crate::core::processing::dos::{DarkObjectOffsets, estimate_dark_object_offsets};
use crate::core::processing::{landsat, sentinel2};
use crate::core::raster::RasterImage;
use crate::error::{Error, Result};
use crate::io::metadata::{LandsatCalibration, SceneMetadata, Sentinel2Calibration};
use crate::types::{AtmCorrMethod, Sensor};

/// Statically selected conversion chain for one {sensor, method} pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPath {
    /// DN -> radiance
    Sentinel2Radiance,
    /// DN -> reflectance directly; L1C DN are already TOA-scaled
    Sentinel2Reflectance { dos: bool },
    /// DN -> radiance
    LandsatRadiance,
    /// DN -> radiance -> reflectance (pass-through)
    LandsatReflectance { dos: bool },
}

impl CalibrationPath {
    pub fn select(sensor: Sensor, method: AtmCorrMethod) -> Self {
        let dos = method.applies_dos();
        match (sensor.is_sentinel2(), method) {
            (true, AtmCorrMethod::Rad) => CalibrationPath::Sentinel2Radiance,
            (true, _) => CalibrationPath::Sentinel2Reflectance { dos },
            (false, AtmCorrMethod::Rad) => CalibrationPath::LandsatRadiance,
            (false, _) => CalibrationPath::LandsatReflectance { dos },
        }
    }

    pub fn applies_dos(self) -> bool {
        match self {
            CalibrationPath::Sentinel2Reflectance { dos }
            | CalibrationPath::LandsatReflectance { dos } => dos,
            CalibrationPath::Sentinel2Radiance | CalibrationPath::LandsatRadiance => false,
        }
    }

    /// Physical quantity of the output samples. Landsat reflectance is a
    /// pass-through, so it still yields radiance.
    pub fn quantity(self) -> &'static str {
        match self {
            CalibrationPath::Sentinel2Reflectance { .. } => "REFLECTANCE",
            CalibrationPath::Sentinel2Radiance
            | CalibrationPath::LandsatRadiance
            | CalibrationPath::LandsatReflectance { .. } => "RADIANCE",
        }
    }
}

fn ensure_bands(raster: &RasterImage, sensor: Sensor) -> Result<()> {
    let expected = sensor.vis_nir_band_count();
    if raster.band_count() < expected {
        return Err(Error::InsufficientBands {
            sensor,
            expected,
            found: raster.band_count(),
        });
    }
    Ok(())
}

fn sentinel2_coefficients(metadata: &SceneMetadata, sensor: Sensor) -> Result<&Sentinel2Calibration> {
    if !sensor.is_sentinel2() {
        return Err(Error::unsupported(sensor, "Sentinel-2 conversion requested"));
    }
    metadata
        .sentinel2()
        .ok_or_else(|| Error::unsupported(sensor, "metadata carries Landsat coefficients"))
}

fn landsat_coefficients(metadata: &SceneMetadata, sensor: Sensor) -> Result<&LandsatCalibration> {
    if !sensor.is_landsat() {
        return Err(Error::unsupported(sensor, "Landsat conversion requested"));
    }
    metadata
        .landsat()
        .ok_or_else(|| Error::unsupported(sensor, "metadata carries Sentinel-2 coefficients"))
}

fn offsets_for(raster: &RasterImage, apply_dos: bool) -> DarkObjectOffsets {
    if apply_dos {
        estimate_dark_object_offsets(raster)
    } else {
        DarkObjectOffsets::zeros(raster.band_count())
    }
}

/// DN to TOA radiance for `sensor`. Dark-object offsets are only used by
/// the Landsat formula; Sentinel-2 radiance never subtracts them.
pub fn to_radiance(
    raster: &RasterImage,
    metadata: &SceneMetadata,
    sensor: Sensor,
    apply_dos: bool,
) -> Result<RasterImage> {
    ensure_bands(raster, sensor)?;
    if sensor.is_sentinel2() {
        let cal = sentinel2_coefficients(metadata, sensor)?;
        Ok(sentinel2::toa_radiance(raster, cal))
    } else {
        let cal = landsat_coefficients(metadata, sensor)?;
        Ok(landsat::toa_radiance(raster, cal, &offsets_for(raster, apply_dos)))
    }
}

/// TOA reflectance for `sensor`. Sentinel-2 expects DN; Landsat expects
/// the output of [`to_radiance`] and returns it unchanged.
pub fn to_reflectance(
    input: &RasterImage,
    metadata: &SceneMetadata,
    sensor: Sensor,
    apply_dos: bool,
) -> Result<RasterImage> {
    ensure_bands(input, sensor)?;
    if sensor.is_sentinel2() {
        let cal = sentinel2_coefficients(metadata, sensor)?;
        Ok(sentinel2::toa_reflectance(input, cal, &offsets_for(input, apply_dos)))
    } else {
        landsat_coefficients(metadata, sensor)?;
        Ok(landsat::toa_reflectance(input))
    }
}

/// Run the conversion chain for `method` on an already loaded DN raster
pub fn run_calibration(
    dn: &RasterImage,
    metadata: &SceneMetadata,
    sensor: Sensor,
    method: AtmCorrMethod,
) -> Result<RasterImage> {
    let path = CalibrationPath::select(sensor, method);
    info!("Calibrating {} with {} via {:?}", sensor, method, path);

    let out = match path {
        CalibrationPath::Sentinel2Radiance => to_radiance(dn, metadata, sensor, false)?,
        CalibrationPath::Sentinel2Reflectance { dos } => to_reflectance(dn, metadata, sensor, dos)?,
        CalibrationPath::LandsatRadiance => to_radiance(dn, metadata, sensor, false)?,
        CalibrationPath::LandsatReflectance { dos } => {
            let radiance = to_radiance(dn, metadata, sensor, dos)?;
            to_reflectance(&radiance, metadata, sensor, dos)?
        }
    };
    debug!(
        "Calibrated image: {}x{}x{}",
        out.rows(),
        out.cols(),
        out.band_count()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::IDENTITY_GEOTRANSFORM;
    use crate::io::metadata::{Calibration, SceneInfo};
    use approx::assert_relative_eq;
    use ndarray::Array3;
    use std::f64::consts::PI;

    const E0: [f64; 9] = [
        1913.57, 1941.63, 1822.61, 1512.79, 1425.56, 1288.32, 1163.19, 1036.39, 955.19,
    ];

    fn s2_meta() -> SceneMetadata {
        SceneMetadata::new(
            Sensor::Sentinel2R10m,
            Calibration::Sentinel2(Sentinel2Calibration {
                quantification_value: 10000.0,
                sun_zenith_deg: 30.0,
                solar_irradiance: E0.to_vec(),
            }),
            SceneInfo::default(),
        )
        .unwrap()
    }

    fn l7_meta() -> SceneMetadata {
        SceneMetadata::new(
            Sensor::Landsat7,
            Calibration::Landsat(LandsatCalibration {
                radiance_mult: vec![0.5, 0.25, 1.0, 2.0],
                radiance_add: vec![-1.0; 4],
            }),
            SceneInfo::default(),
        )
        .unwrap()
    }

    fn l8_meta() -> SceneMetadata {
        SceneMetadata::new(
            Sensor::Landsat8,
            Calibration::Landsat(LandsatCalibration {
                radiance_mult: vec![0.012; 5],
                radiance_add: vec![-6.0; 5],
            }),
            SceneInfo::default(),
        )
        .unwrap()
    }

    /// Scene with a dark tail starting at DN 201 and brighter pixels above
    fn scene(bands: usize) -> RasterImage {
        let data = Array3::from_shape_fn((20, 20, bands), |(r, c, _)| {
            if r == 0 && c < 5 {
                0.0
            } else if r < 5 {
                201.0
            } else {
                3000.0
            }
        });
        RasterImage::new(data, IDENTITY_GEOTRANSFORM, "")
    }

    #[test]
    fn dispatch_table() {
        use AtmCorrMethod::*;
        assert_eq!(CalibrationPath::select(Sensor::Sentinel2R10m, Rad), CalibrationPath::Sentinel2Radiance);
        assert_eq!(
            CalibrationPath::select(Sensor::Sentinel2R60m, Dos),
            CalibrationPath::Sentinel2Reflectance { dos: true }
        );
        assert_eq!(
            CalibrationPath::select(Sensor::Landsat7, Toa),
            CalibrationPath::LandsatReflectance { dos: false }
        );
        assert_eq!(CalibrationPath::select(Sensor::Landsat8, Rad), CalibrationPath::LandsatRadiance);
        assert!(!CalibrationPath::select(Sensor::Landsat8, Rad).applies_dos());
    }

    #[test]
    fn sentinel2_toa_scenario() {
        let out = run_calibration(&scene(9), &s2_meta(), Sensor::Sentinel2R10m, AtmCorrMethod::Toa).unwrap();
        assert_relative_eq!(out.data[[10, 10, 0]], 0.3);
    }

    #[test]
    fn sentinel2_rad_scenario() {
        let out = run_calibration(&scene(9), &s2_meta(), Sensor::Sentinel2R10m, AtmCorrMethod::Rad).unwrap();
        let expected = (3000.0 / 10000.0) * E0[0] * 30f64.to_radians().cos() / PI;
        assert_relative_eq!(out.data[[10, 10, 0]], expected, epsilon = 1e-12);
    }

    #[test]
    fn dos_disabled_equals_zero_offsets() {
        let dn = scene(9);
        let meta = s2_meta();
        let toa = to_reflectance(&dn, &meta, Sensor::Sentinel2R10m, false).unwrap();
        let zeroed = sentinel2::toa_reflectance(&dn, meta.sentinel2().unwrap(), &DarkObjectOffsets::zeros(9));
        assert_eq!(toa.data, zeroed.data);
    }

    #[test]
    fn dos_lowers_reflectance() {
        let dn = scene(9);
        let meta = s2_meta();
        let toa = run_calibration(&dn, &meta, Sensor::Sentinel2R10m, AtmCorrMethod::Toa).unwrap();
        let dos = run_calibration(&dn, &meta, Sensor::Sentinel2R10m, AtmCorrMethod::Dos).unwrap();
        // offset is bin 199, just below the dark tail at DN 201
        assert_relative_eq!(dos.data[[10, 10, 0]], (3000.0 - 199.0) / 10000.0);
        assert!(dos.data[[10, 10, 0]] < toa.data[[10, 10, 0]]);
        assert!(dos.data.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn output_band_count_follows_sensor_window() {
        let s2 = run_calibration(&scene(13), &s2_meta(), Sensor::Sentinel2R10m, AtmCorrMethod::Toa).unwrap();
        assert_eq!(s2.band_count(), 9);
        let l8 = run_calibration(&scene(11), &l8_meta(), Sensor::Landsat8, AtmCorrMethod::Rad).unwrap();
        assert_eq!(l8.band_count(), 5);
    }

    #[test]
    fn landsat_reflectance_is_radiance() {
        let dn = scene(7);
        let rad = run_calibration(&dn, &l8_meta(), Sensor::Landsat8, AtmCorrMethod::Rad).unwrap();
        let toa = run_calibration(&dn, &l8_meta(), Sensor::Landsat8, AtmCorrMethod::Toa).unwrap();
        assert_eq!(rad.data[[10, 10, 2]], toa.data[[10, 10, 2]]);
        assert!(toa.data[[0, 0, 0]].is_nan());
    }

    #[test]
    fn too_few_bands_is_rejected() {
        let err = run_calibration(&scene(4), &l8_meta(), Sensor::Landsat8, AtmCorrMethod::Rad).unwrap_err();
        assert!(matches!(err, Error::InsufficientBands { expected: 5, found: 4, .. }));
    }

    #[test]
    fn metadata_of_other_family_is_unsupported() {
        let err = to_radiance(&scene(9), &l8_meta(), Sensor::Sentinel2R10m, false).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSensor { .. }));
    }

    #[test]
    fn landsat_dos_subtracts_offset_before_gain() {
        // six input bands, dark tail at DN 201 so every band's offset is 199
        let dn = scene(6);
        let meta = l7_meta();
        let dos = run_calibration(&dn, &meta, Sensor::Landsat7, AtmCorrMethod::Dos).unwrap();
        let rad = run_calibration(&dn, &meta, Sensor::Landsat7, AtmCorrMethod::Rad).unwrap();

        assert_eq!(dos.band_count(), 4);
        let cal = meta.landsat().unwrap();
        for b in 0..4 {
            let expected = (3000.0 - 199.0) * cal.radiance_mult[b] + cal.radiance_add[b];
            assert_relative_eq!(dos.data[[10, 10, b]], expected, epsilon = 1e-9);
            assert_relative_eq!(
                rad.data[[10, 10, b]],
                3000.0 * cal.radiance_mult[b] + cal.radiance_add[b],
                epsilon = 1e-9
            );
        }
        assert!(dos.data[[0, 0, 0]].is_nan());
    }

    #[test]
    fn output_quantity_per_path() {
        use AtmCorrMethod::*;
        assert_eq!(CalibrationPath::select(Sensor::Sentinel2R10m, Toa).quantity(), "REFLECTANCE");
        assert_eq!(CalibrationPath::select(Sensor::Sentinel2R60m, Rad).quantity(), "RADIANCE");
        assert_eq!(CalibrationPath::select(Sensor::Landsat8, Dos).quantity(), "RADIANCE");
    }
}
