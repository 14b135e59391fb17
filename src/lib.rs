#![doc = r#"
TOACAL: radiometric calibration of Landsat-7/8 and Sentinel-2 L1C imagery.

Converts raw digital numbers (DN) into top-of-atmosphere (TOA) radiance or
reflectance, optionally after a dark-object subtraction (DOS) haze
correction, and writes the result as a compressed float32 GeoTIFF that keeps
the input's georeferencing. It powers the `toacal` CLI and can be embedded in
your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: calibrate a scene to a file
----------------------------------------
```rust,no_run
use toacal::{calibrate_to_path, AtmCorrMethod, CalibrationConfig, Sensor, WriteOptions};

fn main() -> toacal::Result<()> {
    let config = CalibrationConfig {
        sensor: Sensor::Sentinel2R60m,
        dn_file: "/data/S2A_stack_60m.tif".into(),
        metadata_file: "/data/S2A_MSIL1C.SAFE/MTD_MSIL1C.xml".into(),
        reflectance_file: "/out/reflectance.tif".into(),
        atm_corr_method: AtmCorrMethod::Dos,
    };
    calibrate_to_path(&config, &WriteOptions::default(), false)
}
```

Calibrate in memory
-------------------
```rust,no_run
use toacal::{calibrate, CalibrationConfig};

fn main() -> toacal::Result<()> {
    let config = CalibrationConfig::from_json_file("/data/run.json".as_ref())?;
    let out = calibrate(&config)?;
    println!("{} bands, sun zenith {:?}", out.image.band_count(), out.metadata.sun_zenith_deg());
    Ok(())
}
```

Error handling
--------------
All public functions return `toacal::Result<T>`; match on `toacal::Error` to
tell a missing metadata file from a malformed one, or raster I/O failures from
unsupported sensor/metadata combinations.

Useful modules
--------------
- [`api`]: high-level entry points.
- [`core::processing`](crate::core::processing): per-sensor conversions and the dark-object estimator.
- [`io`]: metadata readers and GDAL raster reader/writers.
- [`types`]: `Sensor`, `AtmCorrMethod`, `Compression`.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::params::{CalibrationConfig, WriteOptions};
pub use core::raster::RasterImage;
pub use error::{Error, Result};
pub use types::{AtmCorrMethod, Compression, Sensor};

// Readers
pub use io::gdal::{GdalError, GdalRasterReader, load_dn_raster};
pub use io::metadata::{Calibration, MetadataError, SceneInfo, SceneMetadata, read_metadata};

// Processing
pub use core::processing::{
    CalibrationPath, DarkObjectOffsets, estimate_dark_object_offsets, run_calibration,
    to_radiance, to_reflectance,
};

// Selected writer helpers
pub use io::writers::metadata::{
    create_metadata_sidecar, embed_calibration_metadata, extract_metadata_fields,
};
pub use io::writers::tiff::write_float_raster;

// High-level API re-exports
pub use api::{CalibratedImage, calibrate, calibrate_to_path, load_scene, save_calibrated};
