//! Log sinks for a geolife2one run.
//!
//! Two sinks are attached: a persistent file that always receives debug
//! events, and a console sink on stderr whose level follows `--verbose`. The
//! subscriber is returned to the caller instead of being installed globally.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, Layer};

use crate::error::Geolife2OneError;

/// Options for building the log subscriber.
#[derive(Clone, Debug)]
pub struct LogOptions {
    /// Lower the console sink to debug level.
    pub verbose: bool,
    /// File that records every debug message. Appended to, never truncated.
    pub log_file: PathBuf,
}

impl LogOptions {
    fn console_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        }
    }
}

/// Build the dual-sink subscriber described by `opts`.
///
/// Install it for a scope with [`tracing::subscriber::with_default`].
pub fn subscriber(
    opts: &LogOptions,
) -> Result<impl Subscriber + Send + Sync + 'static, Geolife2OneError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&opts.log_file)
        .map_err(|source| Geolife2OneError::LogFile {
            path: opts.log_file.clone(),
            source,
        })?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .without_time()
        .with_target(false)
        .with_filter(opts.console_level());

    Ok(tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer))
}
