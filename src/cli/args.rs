use clap::Parser;
use std::path::PathBuf;

use toacal::types::Compression;
use toacal::{AtmCorrMethod, Sensor};

#[derive(Parser)]
#[command(name = "toacal", version, about = "TOA radiance/reflectance calibration for Landsat-7/8 and Sentinel-2 L1C")]
pub struct CliArgs {
    /// Sensor and resolution (l8, l7, s2a-10m, s2a-60m)
    #[arg(short, long, value_enum)]
    pub sensor: Option<Sensor>,

    /// DN raster (Landsat: any one *_B<n>.TIF of the scene, or a stacked file)
    #[arg(short, long)]
    pub dn_file: Option<PathBuf>,

    /// Scene metadata (MTD_MSIL1C.xml for Sentinel-2, *_MTL.txt for Landsat)
    #[arg(short, long)]
    pub metadata_file: Option<PathBuf>,

    /// Output GeoTIFF
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Calibration method (dos, toa or rad); dos unless set here or in --config
    #[arg(long, value_enum)]
    pub method: Option<AtmCorrMethod>,

    /// JSON config with sensor, dnFile, metadataFile, reflectanceFile and
    /// atmCorrMethod; explicit flags override its fields
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// GeoTIFF compression
    #[arg(long, value_enum, default_value_t = Compression::Deflate)]
    pub compress: Compression,

    /// Also write calibration provenance to a JSON sidecar
    #[arg(long, default_value_t = false)]
    pub sidecar: bool,

    /// Enable logging (RUST_LOG overrides the level)
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
