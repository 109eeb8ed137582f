use std::path::PathBuf;
use thiserror::Error;

/// Page users are sent to when automatic acquisition fails.
pub const MANUAL_DOWNLOAD_PAGE: &str =
    "https://www.microsoft.com/en-us/download/details.aspx?id=52367";

/// Failure while fetching the dataset archive.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("connection to {url} broke during transfer: {source}")]
    Transfer {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed writing download to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transfer from {url} ended after {received} of {expected} bytes")]
    Truncated {
        url: String,
        expected: u64,
        received: u64,
    },
}

/// Failure while unpacking the dataset archive.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open archive {archive}: {source}")]
    Open {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{archive} is not a valid zip archive: {source}")]
    InvalidArchive {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive {archive} contains entry '{entry}' that escapes the destination directory")]
    UnsafeEntry { archive: PathBuf, entry: String },

    #[error("failed reading entry '{entry}' from {archive}: {source}")]
    Entry {
        archive: PathBuf,
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal failure of a provisioning run.
///
/// Every message tells the user where to fetch the archive by hand and which
/// directory it belongs in.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(
        "could not download the GeoLife archive from {url}: {source}\n\
         Download it manually from {manual_page} and place the zip file in '{directory}'."
    )]
    Download {
        url: String,
        directory: PathBuf,
        manual_page: String,
        #[source]
        source: DownloadError,
    },

    #[error(
        "could not extract {archive}: {source}\n\
         Download a fresh copy from {manual_page} and place the zip file in '{directory}'."
    )]
    Extract {
        archive: PathBuf,
        directory: PathBuf,
        manual_page: String,
        #[source]
        source: ExtractError,
    },

    #[error(
        "archive {archive} was extracted but contains no GeoLife trajectory files; \
         it is not the expected dataset (configured URL: {url}).\n\
         Remove it, download the dataset manually from {manual_page} and place the zip file in '{directory}'."
    )]
    DatasetMissing {
        archive: PathBuf,
        url: String,
        directory: PathBuf,
        manual_page: String,
    },
}

impl ProvisionError {
    /// True when the failure came from network or extraction infrastructure
    /// rather than from an archive with the wrong contents.
    pub fn is_download_failure(&self) -> bool {
        matches!(self, ProvisionError::Download { .. })
    }

    /// The directory the archive should be placed in.
    pub fn directory(&self) -> &std::path::Path {
        match self {
            ProvisionError::Download { directory, .. }
            | ProvisionError::Extract { directory, .. }
            | ProvisionError::DatasetMissing { directory, .. } => directory,
        }
    }
}

/// The main error type for geolife2one operations.
#[derive(Debug, Error)]
pub enum Geolife2OneError {
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("Failed to write JSON report: {0}")]
    ReportJson(#[source] serde_json::Error),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}
