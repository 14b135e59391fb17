//! Dark-object estimation for haze correction.
//!
//! Each band is histogrammed over DN `[1, 2048]` in 2048 bins. Walking up
//! from the empty low tail, the dark-object DN is the bin just before the
//! first upward step larger than one millionth of the valid pixel count.
use ndarray::parallel::prelude::*;
use ndarray::{ArrayView2, Axis};
use tracing::{debug, warn};

use crate::core::raster::RasterImage;

pub const HISTOGRAM_BINS: usize = 2048;
const HISTOGRAM_MIN: f64 = 1.0;
const HISTOGRAM_MAX: f64 = 2048.0;
const SIGNIFICANCE: f64 = 0.999999;

/// Per-band DN offsets, one per input band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DarkObjectOffsets(Vec<u32>);

impl DarkObjectOffsets {
    pub fn new(offsets: Vec<u32>) -> Self {
        Self(offsets)
    }

    /// Offsets of a run without dark-object subtraction
    pub fn zeros(bands: usize) -> Self {
        Self(vec![0; bands])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Offset of a zero-based band; bands past the end get 0
    pub fn get(&self, band: usize) -> f64 {
        self.0.get(band).copied().unwrap_or(0) as f64
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// Equal-width histogram over `[1, 2048]`; the last bin is closed on the right
pub fn band_histogram(band: ArrayView2<'_, f64>) -> Vec<u64> {
    let mut hist = vec![0u64; HISTOGRAM_BINS];
    let scale = HISTOGRAM_BINS as f64 / (HISTOGRAM_MAX - HISTOGRAM_MIN);
    for &v in band.iter() {
        if !(HISTOGRAM_MIN..=HISTOGRAM_MAX).contains(&v) {
            continue;
        }
        let idx = (((v - HISTOGRAM_MIN) * scale) as usize).min(HISTOGRAM_BINS - 1);
        hist[idx] += 1;
    }
    hist
}

/// Bin index before the first significant upward step, or `None` if the
/// histogram never steps up by more than the threshold
pub fn dark_object_bin(hist: &[u64], valid_pixels: u64) -> Option<u32> {
    let n = valid_pixels as f64;
    let threshold = n - n * SIGNIFICANCE;
    (1..hist.len())
        .find(|&i| (hist[i] as f64 - hist[i - 1] as f64) > threshold)
        .map(|i| (i - 1) as u32)
}

/// Estimate one dark-object offset per band of `raster`.
///
/// The valid pixel count is the number of non-zero pixels of the first band.
/// A band with no qualifying step gets offset 0, which leaves it
/// uncorrected.
pub fn estimate_dark_object_offsets(raster: &RasterImage) -> DarkObjectOffsets {
    if raster.band_count() == 0 {
        return DarkObjectOffsets::zeros(0);
    }
    let valid_pixels = raster.band(0).iter().filter(|&&v| v != 0.0).count() as u64;
    debug!("Dark-object estimation over {} valid pixels", valid_pixels);

    let offsets: Vec<u32> = raster
        .data
        .axis_iter(Axis(2))
        .into_par_iter()
        .enumerate()
        .map(|(b, band)| {
            let hist = band_histogram(band);
            dark_object_bin(&hist, valid_pixels).unwrap_or_else(|| {
                warn!("No dark-object step found in band {}, offset set to 0", b + 1);
                0
            })
        })
        .collect();

    debug!("Dark-object offsets: {:?}", offsets);
    DarkObjectOffsets(offsets)
}
