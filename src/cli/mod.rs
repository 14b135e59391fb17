//! Command Line Interface (CLI) layer for TOACAL.
//!
//! `args` defines argument parsing, `errors` the CLI error type and
//! `runner` turns the arguments into a `CalibrationConfig` and hands it to
//! `toacal::api`. Embedders should call `toacal::api` directly.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
