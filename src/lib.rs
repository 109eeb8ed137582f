//! geolife2one: make sure the GeoLife GPS trajectory dataset is on disk.
//!
//! The dataset is considered present once a trajectory (`.plt`) file exists
//! somewhere under the target directory. When it is missing, an existing
//! zip archive in that directory is extracted, or the archive is downloaded
//! first.
//!
//! # Modules
//!
//! - [`dataset`]: Locate, download, extract, and the verify orchestration
//! - [`logging`]: File and console log sinks
//! - [`error`]: Error types for geolife2one operations

pub mod dataset;
pub mod error;
pub mod logging;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::debug;
use url::Url;

pub use dataset::{DatasetLocation, DatasetProvisioner, ProvisionConfig, ProvisionReport};
pub use error::{DownloadError, ExtractError, Geolife2OneError, ProvisionError};

/// The geolife2one CLI application.
#[derive(Parser)]
#[command(name = "geolife2one")]
#[command(version, author, about)]
#[command(
    long_about = "Verify, unpack, or download the GeoLife GPS trajectory dataset for further processing."
)]
struct Cli {
    /// Verbose console output.
    #[arg(short, long)]
    verbose: bool,

    /// Directory where the GeoLife dataset is stored.
    #[arg(short, long, default_value = "./data")]
    directory: PathBuf,

    /// Log file recording all debug messages.
    #[arg(short = 'l', long = "log-file", default_value = "./geolife2one.log")]
    log_file: PathBuf,

    /// URL of the dataset zip archive.
    #[arg(long, env = "GEOLIFE2ONE_ARCHIVE_URL", default_value = dataset::GEOLIFE_ARCHIVE_URL)]
    url: Url,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Report formats accepted by `--output`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self, Geolife2OneError> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Geolife2OneError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            ))),
        }
    }
}

/// Run the geolife2one CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), Geolife2OneError> {
    let cli = Cli::parse();
    let output = OutputFormat::parse(&cli.output)?;

    let log_opts = logging::LogOptions {
        verbose: cli.verbose,
        log_file: cli.log_file.clone(),
    };
    let subscriber = logging::subscriber(&log_opts)?;

    tracing::subscriber::with_default(subscriber, || run_verify(cli, output))
}

/// Execute the provisioning run under the installed log sinks.
fn run_verify(cli: Cli, output: OutputFormat) -> Result<(), Geolife2OneError> {
    let start = Instant::now();
    debug!("starting run for directory '{}'", cli.directory.display());

    let config = ProvisionConfig {
        archive_url: cli.url.to_string(),
        ..ProvisionConfig::default()
    };
    let provisioner = DatasetProvisioner::new(config);

    let report = match provisioner.verify(&cli.directory) {
        Ok(report) => report,
        Err(err) => {
            debug!("provisioning failed: {err:?}");
            return Err(err.into());
        }
    };

    match output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).map_err(Geolife2OneError::ReportJson)?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", report),
    }

    debug!("Execution time: {:?}", start.elapsed());
    Ok(())
}
