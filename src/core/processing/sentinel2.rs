//! Sentinel-2 L1C conversions.
//!
//! L1C DN are TOA reflectance multiplied by the quantification value, so
//! reflectance is a rescale and radiance goes back through the solar
//! irradiance and sun zenith.
use std::f64::consts::PI;

use ndarray::parallel::prelude::*;
use ndarray::{Array3, Axis, Zip};
use tracing::info;

use crate::core::processing::dos::DarkObjectOffsets;
use crate::core::raster::RasterImage;
use crate::io::metadata::Sentinel2Calibration;

/// `radiance = (DN / q) * E0[band] * cos(zenith) / pi` over the first
/// `solar_irradiance.len()` bands. The caller guarantees the raster has them.
pub fn toa_radiance(raster: &RasterImage, cal: &Sentinel2Calibration) -> RasterImage {
    let bands = cal.solar_irradiance.len();
    let cos_zenith = cal.sun_zenith_deg.to_radians().cos();
    let q = cal.quantification_value;
    info!(
        "Sentinel-2 TOA radiance: {} bands, q={}, sun zenith={} deg",
        bands, q, cal.sun_zenith_deg
    );

    let mut out = Array3::<f64>::zeros((raster.rows(), raster.cols(), bands));
    out.axis_iter_mut(Axis(2))
        .into_par_iter()
        .enumerate()
        .for_each(|(b, mut out_band)| {
            let scale = cal.solar_irradiance[b] * cos_zenith / PI;
            Zip::from(&mut out_band)
                .and(&raster.band(b))
                .for_each(|o, &dn| *o = (dn / q) * scale);
        });

    raster.with_data(out).with_nodata(f64::NAN)
}

/// `reflectance = max(0, DN - offset[band]) / q`; non-positive differences
/// become exactly 0.
pub fn toa_reflectance(
    raster: &RasterImage,
    cal: &Sentinel2Calibration,
    offsets: &DarkObjectOffsets,
) -> RasterImage {
    let bands = cal.solar_irradiance.len();
    let q = cal.quantification_value;
    info!(
        "Sentinel-2 TOA reflectance: {} bands, q={}, offsets={:?}",
        bands,
        q,
        offsets.as_slice()
    );

    let mut out = Array3::<f64>::zeros((raster.rows(), raster.cols(), bands));
    out.axis_iter_mut(Axis(2))
        .into_par_iter()
        .enumerate()
        .for_each(|(b, mut out_band)| {
            let offset = offsets.get(b);
            Zip::from(&mut out_band)
                .and(&raster.band(b))
                .for_each(|o, &dn| {
                    let diff = dn - offset;
                    *o = if diff > 0.0 { diff / q } else { 0.0 };
                });
        });

    raster.with_data(out).with_nodata(f64::NAN)
}
