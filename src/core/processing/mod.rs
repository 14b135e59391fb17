//! Radiometric conversions: dark-object estimation, the per-sensor formulas
//! and the {sensor, method} dispatch that chains them.
pub mod dos;
pub mod landsat;
pub mod pipeline;
pub mod sentinel2;

pub use dos::{DarkObjectOffsets, estimate_dark_object_offsets};
pub use pipeline::{CalibrationPath, run_calibration, to_radiance, to_reflectance};
