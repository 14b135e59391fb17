//! I/O layer: scene metadata readers (Sentinel-2 XML, Landsat MTL), the
//! GDAL-backed raster reader, and `writers` for GeoTIFF output and
//! provenance metadata.
pub mod metadata;
pub use metadata::{MetadataError, SceneMetadata, read_metadata};

pub mod landsat;
pub mod sentinel2;

pub mod gdal;
pub use gdal::{GdalError, GdalRasterReader};

pub mod writers;
