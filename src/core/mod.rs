//! Core calibration building blocks: the in-memory raster, run parameters and
//! the conversion pipeline. These are consumed by the high-level `api` module.
pub mod params;
pub mod processing;
pub mod raster;
