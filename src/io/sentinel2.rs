//! Sentinel-2 L1C metadata reader.
//!
//! Reads the product-level `MTD_MSIL1C.xml` for the quantification value and
//! solar irradiance list, then the single granule `GRANULE/L1C_*/MTD_TL.xml`
//! next to it for sun/view angles and tile geometry. Elements are matched by
//! local name, so the namespace prefix and schema version of the document do
//! not matter.
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info, warn};

use crate::io::metadata::{
    Calibration, MetadataError, SceneInfo, SceneMetadata, Sentinel2Calibration, TileGeometry,
    parse_f64,
};
use crate::types::Sensor;

const PRODUCT_INFO: &str = "General_Info/Product_Info";
const IMAGE_CHARACTERISTICS: &str = "General_Info/Product_Image_Characteristics";
const TILE_ANGLES: &str = "Geometric_Info/Tile_Angles";
const TILE_GEOCODING: &str = "Geometric_Info/Tile_Geocoding";
const GRANULE_METADATA: &str = "MTD_TL.xml";
const RESOLUTIONS: [u32; 3] = [10, 20, 60];

/// One text node, addressed by its element path below the document root
#[derive(Debug, Clone)]
struct XmlLeaf {
    path: String,
    resolution: Option<String>,
    text: String,
}

/// Flattened view of a metadata document
#[derive(Debug, Default)]
pub(crate) struct XmlDocument {
    namespace: Option<String>,
    leaves: Vec<XmlLeaf>,
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, MetadataError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::InvalidAttr)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

/// Namespace URI bound to the root element's own prefix (or the default one)
fn root_namespace(e: &BytesStart<'_>) -> Result<Option<String>, MetadataError> {
    let key = match e.name().prefix() {
        Some(prefix) => {
            let mut key = b"xmlns:".to_vec();
            key.extend_from_slice(prefix.as_ref());
            key
        }
        None => b"xmlns".to_vec(),
    };
    attribute(e, &key)
}

impl XmlDocument {
    pub(crate) fn parse_file(path: &Path) -> Result<Self, MetadataError> {
        if !path.is_file() {
            return Err(MetadataError::NotFound(path.to_path_buf()));
        }
        let reader = Reader::from_file(path)?;
        Self::parse(reader)
    }

    pub(crate) fn parse_str(xml: &str) -> Result<Self, MetadataError> {
        Self::parse(Reader::from_str(xml))
    }

    fn parse<R: BufRead>(mut reader: Reader<R>) -> Result<Self, MetadataError> {
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut doc = XmlDocument::default();
        // (local name, resolution attribute) of every open element, root first
        let mut stack: Vec<(String, Option<String>)> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    if stack.is_empty() {
                        doc.namespace = root_namespace(e)?;
                        debug!("Root element {} (namespace {:?})", local_name(e), doc.namespace);
                    }
                    stack.push((local_name(e), attribute(e, b"resolution")?));
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(e) => {
                    if stack.len() < 2 {
                        continue;
                    }
                    let text = e.unescape()?.to_string();
                    let path = stack[1..]
                        .iter()
                        .map(|(name, _)| name.as_str())
                        .collect::<Vec<_>>()
                        .join("/");
                    let resolution = stack.iter().rev().find_map(|(_, r)| r.clone());
                    doc.leaves.push(XmlLeaf {
                        path,
                        resolution,
                        text,
                    });
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(doc)
    }

    pub(crate) fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub(crate) fn first(&self, path: &str) -> Option<&str> {
        self.all(path).next()
    }

    pub(crate) fn all<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a str> {
        self.leaves
            .iter()
            .filter(move |leaf| leaf.path == path)
            .map(|leaf| leaf.text.as_str())
    }

    fn at_resolution(&self, path: &str, resolution_m: u32) -> Option<&str> {
        let wanted = resolution_m.to_string();
        self.leaves
            .iter()
            .find(|leaf| leaf.path == path && leaf.resolution.as_deref() == Some(wanted.as_str()))
            .map(|leaf| leaf.text.as_str())
    }

    fn required_f64(&self, path: &str, field: &'static str) -> Result<f64, MetadataError> {
        let text = self.first(path).ok_or(MetadataError::MissingField(field))?;
        parse_f64(field, text)
    }

    fn optional_f64(&self, path: &str) -> Option<f64> {
        self.first(path).and_then(|t| t.trim().parse().ok())
    }

    fn optional_string(&self, path: &str) -> Option<String> {
        self.first(path).map(|t| t.trim().to_string())
    }
}

/// Locate `GRANULE/L1C_*/MTD_TL.xml` relative to the product metadata file.
/// When several granules match, the first in lexical order is used.
pub fn locate_granule_metadata(product_metadata: &Path) -> Result<PathBuf, MetadataError> {
    let product_dir = product_metadata.parent().unwrap_or_else(|| Path::new("."));
    let granule_dir = product_dir.join("GRANULE");
    let pattern = granule_dir.join("L1C_*").join(GRANULE_METADATA);
    if !granule_dir.is_dir() {
        return Err(MetadataError::NotFound(pattern));
    }

    let mut matches = Vec::new();
    for entry in fs::read_dir(&granule_dir)? {
        let path = entry?.path();
        let is_l1c = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("L1C_"))
            .unwrap_or(false);
        let candidate = path.join(GRANULE_METADATA);
        if path.is_dir() && is_l1c && candidate.is_file() {
            matches.push(candidate);
        }
    }
    matches.sort();

    match matches.len() {
        0 => Err(MetadataError::NotFound(pattern)),
        1 => Ok(matches.remove(0)),
        n => {
            warn!("{} granule metadata files found, using {:?}", n, matches[0]);
            Ok(matches.remove(0))
        }
    }
}

fn tile_geometry(granule: &XmlDocument) -> Vec<TileGeometry> {
    let int = |path: String, res: u32| {
        granule
            .at_resolution(&path, res)
            .and_then(|t| t.trim().parse::<usize>().ok())
    };
    let float = |path: String, res: u32| {
        granule
            .at_resolution(&path, res)
            .and_then(|t| t.trim().parse::<f64>().ok())
    };
    RESOLUTIONS
        .iter()
        .map(|&res| TileGeometry {
            resolution_m: res,
            rows: int(format!("{TILE_GEOCODING}/Size/NROWS"), res),
            cols: int(format!("{TILE_GEOCODING}/Size/NCOLS"), res),
            ulx: float(format!("{TILE_GEOCODING}/Geoposition/ULX"), res),
            uly: float(format!("{TILE_GEOCODING}/Geoposition/ULY"), res),
        })
        .filter(|g| g.rows.is_some() || g.cols.is_some() || g.ulx.is_some() || g.uly.is_some())
        .collect()
}

/// Build the scene record from an already parsed product and granule document
pub(crate) fn scene_from_documents(
    product: &XmlDocument,
    granule: &XmlDocument,
    sensor: Sensor,
    product_name: Option<String>,
) -> Result<SceneMetadata, MetadataError> {
    let quantification_value = product.required_f64(
        &format!("{IMAGE_CHARACTERISTICS}/QUANTIFICATION_VALUE"),
        "QUANTIFICATION_VALUE",
    )?;

    let irradiance_path =
        format!("{IMAGE_CHARACTERISTICS}/Reflectance_Conversion/Solar_Irradiance_List/SOLAR_IRRADIANCE");
    let irradiance = product
        .all(&irradiance_path)
        .map(|t| parse_f64("SOLAR_IRRADIANCE", t))
        .collect::<Result<Vec<_>, _>>()?;
    let bands = sensor.vis_nir_band_count();
    if irradiance.len() < bands {
        return Err(MetadataError::BandCountMismatch {
            field: "SOLAR_IRRADIANCE",
            expected: bands,
            found: irradiance.len(),
        });
    }
    let solar_irradiance = irradiance[..bands].to_vec();

    let sun_zenith_deg = granule.required_f64(
        &format!("{TILE_ANGLES}/Mean_Sun_Angle/ZENITH_ANGLE"),
        "Mean_Sun_Angle/ZENITH_ANGLE",
    )?;

    // Viewing angles differ slightly per band; the first band's mean is kept
    let viewing = format!("{TILE_ANGLES}/Mean_Viewing_Incidence_Angle_List/Mean_Viewing_Incidence_Angle");
    let info = SceneInfo {
        product_name,
        product_start: product.optional_string(&format!("{PRODUCT_INFO}/PRODUCT_START_TIME")),
        processing_level: product.optional_string(&format!("{PRODUCT_INFO}/PROCESSING_LEVEL")),
        spacecraft: product.optional_string(&format!("{PRODUCT_INFO}/Datatake/SPACECRAFT_NAME")),
        orbit_direction: product
            .optional_string(&format!("{PRODUCT_INFO}/Datatake/SENSING_ORBIT_DIRECTION")),
        reflectance_conversion_u: product
            .optional_f64(&format!("{IMAGE_CHARACTERISTICS}/Reflectance_Conversion/U")),
        sun_zenith_deg: Some(sun_zenith_deg),
        sun_azimuth_deg: granule.optional_f64(&format!("{TILE_ANGLES}/Mean_Sun_Angle/AZIMUTH_ANGLE")),
        sensor_zenith_deg: granule.optional_f64(&format!("{viewing}/ZENITH_ANGLE")),
        sensor_azimuth_deg: granule.optional_f64(&format!("{viewing}/AZIMUTH_ANGLE")),
        projection: granule.optional_string(&format!("{TILE_GEOCODING}/HORIZONTAL_CS_CODE")),
        cloud_cover_percent: granule
            .optional_f64("Quality_Indicators_Info/Image_Content_QI/CLOUDY_PIXEL_PERCENTAGE"),
        metadata_namespace: product.namespace().map(str::to_string),
        tile_geometry: tile_geometry(granule),
    };

    SceneMetadata::new(
        sensor,
        Calibration::Sentinel2(Sentinel2Calibration {
            quantification_value,
            sun_zenith_deg,
            solar_irradiance,
        }),
        info,
    )
}

/// Read a Sentinel-2 L1C product metadata file and its granule metadata
pub fn read_sentinel2_metadata(
    path: &Path,
    sensor: Sensor,
) -> Result<SceneMetadata, MetadataError> {
    let product = XmlDocument::parse_file(path)?;
    let granule_path = locate_granule_metadata(path)?;
    info!("Using granule metadata {:?}", granule_path);
    let granule = XmlDocument::parse_file(&granule_path)?;

    let product_name = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string());

    scene_from_documents(&product, &granule, sensor, product_name)
}
