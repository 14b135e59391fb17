//! Landsat-7/8 conversions.
use ndarray::parallel::prelude::*;
use ndarray::{Array2, Array3, Axis, Zip};
use tracing::{info, warn};

use crate::core::processing::dos::DarkObjectOffsets;
use crate::core::raster::RasterImage;
use crate::io::metadata::LandsatCalibration;

/// `radiance = max(0, DN - offset[band]) * mult[band] + add[band]` over the
/// first `radiance_mult.len()` bands.
///
/// A pixel whose radiances sum to zero or less across the calibrated bands
/// was not observed (scan gap, swath edge) and becomes NaN in every band.
pub fn toa_radiance(
    raster: &RasterImage,
    cal: &LandsatCalibration,
    offsets: &DarkObjectOffsets,
) -> RasterImage {
    let bands = cal.radiance_mult.len();
    info!(
        "Landsat TOA radiance: {} bands, offsets={:?}",
        bands,
        offsets.as_slice()
    );

    let mut out = Array3::<f64>::zeros((raster.rows(), raster.cols(), bands));
    out.axis_iter_mut(Axis(2))
        .into_par_iter()
        .enumerate()
        .for_each(|(b, mut out_band)| {
            let (mult, add, offset) = (cal.radiance_mult[b], cal.radiance_add[b], offsets.get(b));
            Zip::from(&mut out_band)
                .and(&raster.band(b))
                .for_each(|o, &dn| *o = (dn - offset).max(0.0) * mult + add);
        });

    let band_sum: Array2<f64> = out.sum_axis(Axis(2));
    let mut invalid = 0usize;
    for ((r, c), &total) in band_sum.indexed_iter() {
        if total <= 0.0 {
            out.slice_mut(ndarray::s![r, c, ..]).fill(f64::NAN);
            invalid += 1;
        }
    }
    if invalid > 0 {
        info!("Masked {} unobserved pixels", invalid);
    }

    raster.with_data(out).with_nodata(f64::NAN)
}

/// Landsat TOA reflectance is not implemented: the radiance image is
/// returned unchanged.
pub fn toa_reflectance(radiance: &RasterImage) -> RasterImage {
    warn!("Landsat TOA reflectance conversion is not implemented; output is TOA radiance");
    radiance.clone()
}
