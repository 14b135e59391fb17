use tracing::info;
use tracing_subscriber::EnvFilter;

use toacal::api::calibrate_to_path;
use toacal::{AtmCorrMethod, CalibrationConfig, WriteOptions};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn missing(arg: &str) -> AppError {
    AppError::MissingArgument {
        arg: arg.to_string(),
    }
}

/// Build the run configuration from `--config` (if given) with explicit
/// flags taking precedence, or from the flags alone
pub fn resolve_config(args: &CliArgs) -> Result<CalibrationConfig, AppError> {
    if let Some(path) = &args.config {
        info!("Loading configuration from {:?}", path);
        let mut config = CalibrationConfig::from_json_file(path)?;
        if let Some(sensor) = args.sensor {
            config.sensor = sensor;
        }
        if let Some(dn_file) = &args.dn_file {
            config.dn_file = dn_file.clone();
        }
        if let Some(metadata_file) = &args.metadata_file {
            config.metadata_file = metadata_file.clone();
        }
        if let Some(output) = &args.output {
            config.reflectance_file = output.clone();
        }
        if let Some(method) = args.method {
            config.atm_corr_method = method;
        }
        return Ok(config);
    }

    Ok(CalibrationConfig {
        sensor: args.sensor.ok_or_else(|| missing("--sensor"))?,
        dn_file: args.dn_file.clone().ok_or_else(|| missing("--dn-file"))?,
        metadata_file: args
            .metadata_file
            .clone()
            .ok_or_else(|| missing("--metadata-file"))?,
        reflectance_file: args.output.clone().ok_or_else(|| missing("--output"))?,
        atm_corr_method: args.method.unwrap_or(AtmCorrMethod::Dos),
    })
}

pub fn run(args: CliArgs) -> Result<(), AppError> {
    if args.log {
        init_logging();
    }

    let config = resolve_config(&args)?;
    let options = WriteOptions {
        compression: args.compress,
        ..WriteOptions::default()
    };

    calibrate_to_path(&config, &options, args.sidecar)?;
    info!(
        "Successfully calibrated: {:?} -> {:?}",
        config.dn_file, config.reflectance_file
    );
    Ok(())
}
