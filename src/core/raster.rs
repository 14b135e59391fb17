use ndarray::{Array2, Array3, ArrayView2, Axis, s};

/// In-memory multi-band raster, shape `(rows, cols, bands)`.
///
/// Owned by exactly one pipeline stage at a time; every conversion consumes
/// a borrowed input and returns a fresh image.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub data: Array3<f64>,
    /// Affine geotransform ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection as delivered by the source (usually WKT)
    pub projection: String,
    pub nodata: Option<f64>,
}

pub const IDENTITY_GEOTRANSFORM: [f64; 6] = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

// Helper to extract EPSG code from WKT authority tag
pub(crate) fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            let code = &wkt[start..start + end];
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

impl RasterImage {
    pub fn new(data: Array3<f64>, geotransform: [f64; 6], projection: impl Into<String>) -> Self {
        Self {
            data,
            geotransform,
            projection: projection.into(),
            nodata: None,
        }
    }

    /// Stack equally sized single-band arrays, in order
    pub fn from_bands(
        bands: &[Array2<f64>],
        geotransform: [f64; 6],
        projection: impl Into<String>,
    ) -> Option<Self> {
        let (rows, cols) = bands.first()?.dim();
        if bands.iter().any(|b| b.dim() != (rows, cols)) {
            return None;
        }
        let mut data = Array3::<f64>::zeros((rows, cols, bands.len()));
        for (i, band) in bands.iter().enumerate() {
            data.slice_mut(s![.., .., i]).assign(band);
        }
        Some(Self::new(data, geotransform, projection))
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    pub fn band_count(&self) -> usize {
        self.data.dim().2
    }

    /// Zero-based band view
    pub fn band(&self, index: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(2), index)
    }

    /// Same georeferencing, new pixel data
    pub fn with_data(&self, data: Array3<f64>) -> Self {
        Self {
            data,
            geotransform: self.geotransform,
            projection: self.projection.clone(),
            nodata: self.nodata,
        }
    }

    pub fn epsg(&self) -> Option<String> {
        if self.projection.starts_with("EPSG:") {
            Some(self.projection.clone())
        } else {
            parse_epsg(&self.projection)
        }
    }
}
