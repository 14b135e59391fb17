use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use gdal::raster::ResampleAlg;
use gdal::{Dataset, errors::GdalError as GdalCrateError};
use ndarray::Array2;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::raster::{IDENTITY_GEOTRANSFORM, RasterImage};
use crate::types::Sensor;

/// Errors encountered when using GDAL reader
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),
    #[error("No file for band {band} next to {}", .near.display())]
    MissingBandFile { band: usize, near: PathBuf },
}

// `<scene>_B<n>.TIF`, the Landsat band-per-file layout
static BAND_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*)_B(\d+)\.TIF$").expect("static regex"));

/// Dimensions and georeferencing of an opened dataset
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection exactly as stored in the dataset (usually WKT)
    pub projection: String,
    /// No-data value of the first band, if any
    pub nodata: Option<f64>,
}

/// Reader for DN rasters via GDAL
pub struct GdalRasterReader {
    pub dataset: Dataset,
    pub metadata: RasterMetadata,
}

impl GdalRasterReader {
    /// Open a GDAL-supported dataset (e.g., GeoTIFF, JP2, ENVI)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = dataset.geo_transform().unwrap_or(IDENTITY_GEOTRANSFORM);
        let projection = dataset.projection();
        let nodata = dataset.rasterband(1)?.no_data_value();
        Ok(GdalRasterReader {
            dataset,
            metadata: RasterMetadata {
                size_x: size_x as usize,
                size_y: size_y as usize,
                bands,
                geotransform,
                projection,
                nodata,
            },
        })
    }

    /// Read a single band (1-based index) as an f64 ndarray of shape (height, width)
    pub fn read_band(&self, index: usize) -> Result<Array2<f64>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, Some(ResampleAlg::NearestNeighbour))?;
        let data_vec = buf.data().to_vec();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data_vec).map_err(
            |_| {
                GdalError::DimensionMismatch(
                    self.metadata.size_x,
                    self.metadata.size_y,
                    self.metadata.size_x,
                    self.metadata.size_y,
                )
            },
        )
    }

    /// Read the first `count` bands into one image carrying this dataset's
    /// geotransform and projection
    pub fn read_bands(&self, count: usize) -> Result<RasterImage, GdalError> {
        let count = count.min(self.metadata.bands);
        let bands = (1..=count)
            .map(|idx| self.read_band(idx))
            .collect::<Result<Vec<_>, _>>()?;
        self.stack(&bands)
    }

    pub fn read_all_bands(&self) -> Result<RasterImage, GdalError> {
        self.read_bands(self.metadata.bands)
    }

    fn stack(&self, bands: &[Array2<f64>]) -> Result<RasterImage, GdalError> {
        let image = RasterImage::from_bands(
            bands,
            self.metadata.geotransform,
            self.metadata.projection.clone(),
        )
        .ok_or_else(|| GdalError::UnsupportedFormat("bands differ in size".into()))?;
        Ok(match self.metadata.nodata {
            Some(nodata) => image.with_nodata(nodata),
            None => image,
        })
    }
}

/// Locate `<scene>_B<n>.TIF` for `n = 1..=bands` next to `path`.
///
/// When `path` itself follows the pattern only files of the same scene are
/// considered; otherwise the first matching file per band (lexical order)
/// is taken.
pub fn find_band_files(path: &Path, bands: usize) -> Result<Vec<PathBuf>, GdalError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let own_stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| BAND_FILE_RE.captures(n))
        .map(|c| c[1].to_string());

    let mut entries = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    (1..=bands)
        .map(|band| {
            entries
                .iter()
                .find(|candidate| {
                    let Some(name) = candidate.file_name().and_then(|n| n.to_str()) else {
                        return false;
                    };
                    let Some(caps) = BAND_FILE_RE.captures(name) else {
                        return false;
                    };
                    let same_scene = own_stem.as_deref().map(|s| s == &caps[1]).unwrap_or(true);
                    same_scene && caps[2].parse::<usize>().ok() == Some(band)
                })
                .cloned()
                .ok_or_else(|| GdalError::MissingBandFile {
                    band,
                    near: path.to_path_buf(),
                })
        })
        .collect()
}

/// Load the DN raster for `sensor`, restricted to its visible/near-infrared
/// bands where the file has more.
///
/// A single-band Landsat file is treated as one file of a band-per-file
/// scene and the remaining bands are read from sibling `_B<n>.TIF` files.
/// Georeferencing always comes from the file that was opened.
pub fn load_dn_raster(path: &Path, sensor: Sensor) -> Result<RasterImage, GdalError> {
    let reader = GdalRasterReader::open(path)?;
    let wanted = sensor.vis_nir_band_count();
    info!(
        "Opened {:?}: {}x{} pixels, {} band(s)",
        path, reader.metadata.size_x, reader.metadata.size_y, reader.metadata.bands
    );

    if sensor.is_landsat() && reader.metadata.bands == 1 {
        let files = find_band_files(path, wanted)?;
        let mut bands = Vec::with_capacity(files.len());
        for file in &files {
            debug!("Stacking band file {:?}", file);
            let band_reader = GdalRasterReader::open(file)?;
            let (x, y) = (band_reader.metadata.size_x, band_reader.metadata.size_y);
            if (x, y) != (reader.metadata.size_x, reader.metadata.size_y) {
                return Err(GdalError::DimensionMismatch(
                    reader.metadata.size_x,
                    reader.metadata.size_y,
                    x,
                    y,
                ));
            }
            bands.push(band_reader.read_band(1)?);
        }
        info!("Stacked {} Landsat band files", bands.len());
        return reader.stack(&bands);
    }

    reader.read_bands(wanted)
}
