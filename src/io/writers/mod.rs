//! Output side of the raster adapter: float GeoTIFF writing and calibration
//! provenance (embedded metadata items and JSON sidecar).
pub mod metadata;
pub mod tiff;

pub use metadata::{create_metadata_sidecar, embed_calibration_metadata, extract_metadata_fields};
pub use tiff::{save_by_copy, to_mem_dataset, write_float_raster};
