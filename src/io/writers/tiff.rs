use std::path::Path;

use gdal::cpl::CslStringList;
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use tracing::{info, warn};

use crate::core::params::WriteOptions;
use crate::core::raster::RasterImage;
use crate::io::gdal::GdalError;

/// Materialize `image` as an in-memory float32 dataset. Every band gets the
/// image's no-data value (NaN when unset).
pub fn to_mem_dataset(image: &RasterImage) -> Result<Dataset, GdalError> {
    let (rows, cols, bands) = image.data.dim();
    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut ds = driver.create_with_band_type::<f32, _>("", cols, rows, bands)?;
    ds.set_geo_transform(&image.geotransform)?;
    if !image.projection.is_empty() {
        ds.set_projection(&image.projection)?;
    }

    let nodata = image.nodata.unwrap_or(f64::NAN);
    for b in 0..bands {
        let mut band = ds.rasterband(b + 1)?;
        let samples: Vec<f32> = image.band(b).iter().map(|&v| v as f32).collect();
        let mut buf = Buffer::new((cols, rows), samples);
        band.write((0, 0), (cols, rows), &mut buf)?;
        band.set_no_data_value(Some(nodata))?;
    }
    Ok(ds)
}

fn creation_options(options: &WriteOptions) -> Result<CslStringList, GdalError> {
    let mut list = CslStringList::new();
    for (key, value) in options.creation_options() {
        list.set_name_value(key, &value)?;
    }
    Ok(list)
}

/// Remove `output` after a failed write, unless it was already there
/// before the write started
pub(crate) fn discard_failed_output(output: &Path, existed_before: bool) {
    if !existed_before && output.is_file() {
        if let Err(e) = std::fs::remove_file(output) {
            warn!("Could not remove partial output {:?}: {}", output, e);
        }
    }
}

/// Copy a dataset to a compressed GeoTIFF at `output`.
///
/// A file created by a failed copy is removed before the error is
/// returned; a file that existed before the call is left alone.
pub fn save_by_copy(
    ds: &Dataset,
    output: &Path,
    options: &WriteOptions,
) -> Result<Dataset, GdalError> {
    let existed_before = output.exists();
    let copy = DriverManager::get_driver_by_name("GTiff")
        .map_err(GdalError::from)
        .and_then(|driver| {
            let list = creation_options(options)?;
            Ok(ds.create_copy(&driver, output, &list)?)
        });
    if let Err(e) = &copy {
        warn!("Writing {:?} failed: {}", output, e);
        discard_failed_output(output, existed_before);
    }
    copy
}

/// Write `image` to `output` as a compressed float32 GeoTIFF without any
/// extra metadata items
pub fn write_float_raster(
    image: &RasterImage,
    output: &Path,
    options: &WriteOptions,
) -> Result<Dataset, GdalError> {
    let mem = to_mem_dataset(image)?;
    let ds = save_by_copy(&mem, output, options)?;
    info!(
        "Wrote {} band(s) of {}x{} to {:?}",
        image.band_count(),
        image.cols(),
        image.rows(),
        output
    );
    Ok(ds)
}
