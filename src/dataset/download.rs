use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::DownloadError;

const CHUNK_SIZE: usize = 64 * 1024;

/// Log interval when the server does not send a content length.
const UNSIZED_LOG_STEP: u64 = 16 * 1024 * 1024;

/// Stream `url` into `destination` and return the number of bytes written.
///
/// The body goes to `<destination>.part` first and is renamed into place only
/// once the transfer is complete; on failure the partial file is removed.
pub fn download_to_file(
    url: &str,
    destination: &Path,
    connect_timeout: Duration,
) -> Result<u64, DownloadError> {
    info!("Downloading {url}...");

    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(connect_timeout))
        .build();
    let agent: ureq::Agent = config.into();

    let response = agent
        .get(url)
        .call()
        .map_err(|source| DownloadError::Request {
            url: url.to_string(),
            source,
        })?;

    let total = response.body().content_length();
    match total {
        Some(len) => debug!("server reports {len} bytes"),
        None => debug!("server did not report a content length"),
    }

    let partial = partial_path(destination);
    let body = response.into_body().into_reader();

    let received = match write_body(url, body, &partial, total) {
        Ok(received) => received,
        Err(err) => {
            let _ = fs::remove_file(&partial);
            return Err(err);
        }
    };

    fs::rename(&partial, destination).map_err(|source| DownloadError::Io {
        path: destination.to_path_buf(),
        source,
    })?;

    info!("Download complete! Saved {received} bytes to {}", destination.display());
    Ok(received)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name: OsString = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    destination.with_file_name(name)
}

/// Copy `body` into a fresh file at `path`, checking the byte count against
/// `expected` when the server announced one.
pub(crate) fn write_body(
    url: &str,
    mut body: impl Read,
    path: &Path,
    expected: Option<u64>,
) -> Result<u64, DownloadError> {
    let io_err = |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let mut progress = Progress::new(expected);
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(DownloadError::Transfer {
                    url: url.to_string(),
                    source,
                })
            }
        };
        writer.write_all(&buf[..n]).map_err(io_err)?;
        progress.advance(n as u64);
    }

    writer.flush().map_err(io_err)?;
    writer.get_ref().sync_all().map_err(io_err)?;

    if let Some(expected) = expected {
        if progress.received < expected {
            return Err(DownloadError::Truncated {
                url: url.to_string(),
                expected,
                received: progress.received,
            });
        }
    }

    Ok(progress.received)
}

/// Tracks transferred bytes and logs at coarse milestones.
#[derive(Debug)]
struct Progress {
    total: Option<u64>,
    received: u64,
    next_mark: u64,
}

impl Progress {
    fn new(total: Option<u64>) -> Self {
        let mut progress = Self {
            total,
            received: 0,
            next_mark: 0,
        };
        progress.next_mark = progress.step();
        progress
    }

    fn step(&self) -> u64 {
        match self.total {
            Some(total) => (total / 10).max(1),
            None => UNSIZED_LOG_STEP,
        }
    }

    /// Record `n` more bytes. Returns true when a milestone was logged.
    fn advance(&mut self, n: u64) -> bool {
        self.received += n;
        if self.received < self.next_mark {
            return false;
        }

        match self.total {
            Some(total) if total > 0 => info!(
                "{:.0}% ({} / {} bytes)",
                (self.received as f64) / (total as f64) * 100.0,
                self.received,
                total
            ),
            _ => info!("{} bytes received", self.received),
        }

        let step = self.step();
        while self.next_mark <= self.received {
            self.next_mark += step;
        }
        true
    }
}
