//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use gdal::DriverManager;
use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;

pub const UTM32N_GEOTRANSFORM: [f64; 6] = [499980.0, 60.0, 0.0, 6300000.0, 0.0, -60.0];

pub fn utm32n_wkt() -> String {
    SpatialRef::from_epsg(32632)
        .and_then(|srs| srs.to_wkt())
        .unwrap()
}

/// Write a UInt16 GeoTIFF with one band per entry of `bands`, each filled
/// through `pixel(row, col)`
pub fn write_dn_tiff(
    path: &Path,
    rows: usize,
    cols: usize,
    bands: usize,
    projection: &str,
    pixel: impl Fn(usize, usize, usize) -> u16,
) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver
        .create_with_band_type::<u16, _>(path, cols, rows, bands)
        .unwrap();
    ds.set_geo_transform(&UTM32N_GEOTRANSFORM).unwrap();
    if !projection.is_empty() {
        ds.set_projection(projection).unwrap();
    }
    for b in 0..bands {
        let mut samples = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                samples.push(pixel(r, c, b));
            }
        }
        let mut band = ds.rasterband(b + 1).unwrap();
        let mut buf = Buffer::new((cols, rows), samples);
        band.write((0, 0), (cols, rows), &mut buf).unwrap();
    }
}

const IRRADIANCE: [f64; 13] = [
    1913.57, 1941.63, 1822.61, 1512.79, 1425.56, 1288.32, 1163.19, 1036.39, 955.19, 813.04,
    367.15, 245.59, 85.25,
];

pub fn product_xml(quantification: Option<&str>) -> String {
    let irradiance: String = IRRADIANCE
        .iter()
        .enumerate()
        .map(|(i, e)| format!("<SOLAR_IRRADIANCE bandId=\"{i}\" unit=\"W/m²/µm\">{e}</SOLAR_IRRADIANCE>\n"))
        .collect();
    let quantification = quantification
        .map(|q| format!("<QUANTIFICATION_VALUE unit=\"none\">{q}</QUANTIFICATION_VALUE>"))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<n1:Level-1C_User_Product xmlns:n1="https://psd-14.sentinel2.eo.esa.int/PSD/User_Product_Level-1C.xsd">
  <n1:General_Info>
    <Product_Info>
      <PRODUCT_START_TIME>2017-06-01T10:30:31.026Z</PRODUCT_START_TIME>
      <PROCESSING_LEVEL>Level-1C</PROCESSING_LEVEL>
      <Datatake datatakeIdentifier="GS2A_20170601T103021_010207_N02.05">
        <SPACECRAFT_NAME>Sentinel-2A</SPACECRAFT_NAME>
      </Datatake>
    </Product_Info>
    <Product_Image_Characteristics>
      {quantification}
      <Reflectance_Conversion>
        <U>0.9713</U>
        <Solar_Irradiance_List>
{irradiance}        </Solar_Irradiance_List>
      </Reflectance_Conversion>
    </Product_Image_Characteristics>
  </n1:General_Info>
</n1:Level-1C_User_Product>"#
    )
}

pub fn granule_xml(rows_60m: usize, cols_60m: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<n1:Level-1C_Tile_ID xmlns:n1="https://psd-14.sentinel2.eo.esa.int/PSD/S2_PDI_Level-1C_Tile_Metadata.xsd">
  <n1:Geometric_Info>
    <Tile_Geocoding metadataLevel="Brief">
      <HORIZONTAL_CS_CODE>EPSG:32632</HORIZONTAL_CS_CODE>
      <Size resolution="60"><NROWS>{rows_60m}</NROWS><NCOLS>{cols_60m}</NCOLS></Size>
      <Geoposition resolution="60"><ULX>499980</ULX><ULY>6300000</ULY></Geoposition>
    </Tile_Geocoding>
    <Tile_Angles>
      <Mean_Sun_Angle>
        <ZENITH_ANGLE unit="deg">30.0</ZENITH_ANGLE>
        <AZIMUTH_ANGLE unit="deg">160.0</AZIMUTH_ANGLE>
      </Mean_Sun_Angle>
    </Tile_Angles>
  </n1:Geometric_Info>
</n1:Level-1C_Tile_ID>"#
    )
}

/// Lay out `<root>/S2A_TEST.SAFE/MTD_MSIL1C.xml` and, when `granule` is set,
/// `GRANULE/L1C_T32ABC_TEST/MTD_TL.xml`. Returns the product metadata path.
pub fn write_safe(root: &Path, product: &str, granule: Option<&str>) -> PathBuf {
    let safe = root.join("S2A_TEST.SAFE");
    fs::create_dir_all(&safe).unwrap();
    let product_path = safe.join("MTD_MSIL1C.xml");
    fs::write(&product_path, product).unwrap();
    if let Some(granule) = granule {
        let dir = safe.join("GRANULE").join("L1C_T32ABC_TEST");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("MTD_TL.xml"), granule).unwrap();
    }
    product_path
}

pub const L8_MULT: [f64; 5] = [1.2168e-2, 1.2460e-2, 1.1482e-2, 9.6820e-3, 5.9250e-3];
pub const L8_ADD: [f64; 5] = [-60.84222, -62.30213, -57.41046, -48.41238, -29.62490];

pub fn mtl_l8(spacecraft: &str) -> String {
    let mut text = format!(
        "GROUP = L1_METADATA_FILE\n  GROUP = PRODUCT_METADATA\n    SPACECRAFT_ID = \"{spacecraft}\"\n    DATE_ACQUIRED = 2015-06-08\n    UTM_ZONE = 32\n  END_GROUP = PRODUCT_METADATA\n  GROUP = IMAGE_ATTRIBUTES\n    SUN_ELEVATION = 58.0\n  END_GROUP = IMAGE_ATTRIBUTES\n  GROUP = RADIOMETRIC_RESCALING\n"
    );
    for (i, (m, a)) in L8_MULT.iter().zip(L8_ADD.iter()).enumerate() {
        text.push_str(&format!("    RADIANCE_MULT_BAND_{} = {:E}\n", i + 1, m));
        text.push_str(&format!("    RADIANCE_ADD_BAND_{} = {}\n", i + 1, a));
    }
    text.push_str("  END_GROUP = RADIOMETRIC_RESCALING\nEND_GROUP = L1_METADATA_FILE\nEND\n");
    text
}
