//! GeoLife dataset provisioning.
//!
//! This module owns the verify-or-acquire procedure: find unpacked
//! trajectory files, otherwise find or download the zip archive, extract it,
//! and look again. Each step is also exposed on its own so callers (and
//! tests) can drive them individually.

pub mod download;
pub mod extract;
pub mod locate;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{DownloadError, ExtractError, ProvisionError, MANUAL_DOWNLOAD_PAGE};

/// Official location of the GeoLife Trajectories 1.3 archive.
pub const GEOLIFE_ARCHIVE_URL: &str = "https://download.microsoft.com/download/F/4/8/F4894AA5-FDBC-481E-9285-D5F8C4C4F039/Geolife%20Trajectories%201.3.zip";

/// Constants that shape a provisioning run.
#[derive(Clone, Debug)]
pub struct ProvisionConfig {
    /// Extension of unpacked trajectory files, without the dot.
    pub data_extension: String,
    /// Extension of candidate archives, without the dot.
    pub archive_extension: String,
    /// Where to fetch the archive from when none is present.
    pub archive_url: String,
    /// Page pointed to in error messages for manual download.
    pub manual_download_page: String,
    /// File name given to a downloaded archive.
    pub archive_file_name: String,
    pub connect_timeout: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            data_extension: "plt".to_string(),
            archive_extension: "zip".to_string(),
            archive_url: GEOLIFE_ARCHIVE_URL.to_string(),
            manual_download_page: MANUAL_DOWNLOAD_PAGE.to_string(),
            archive_file_name: "geolife.zip".to_string(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// Inferred root of an unpacked dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatasetLocation {
    /// Absolute path two levels above the first trajectory file's directory.
    pub root: PathBuf,
    /// The trajectory file the root was derived from.
    pub first_trajectory: PathBuf,
}

/// How an archive came to be on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveOrigin {
    Existing,
    Downloaded,
}

/// An archive file used during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveReference {
    pub path: PathBuf,
    pub origin: ArchiveOrigin,
}

/// Outcome of a successful [`DatasetProvisioner::verify`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub location: DatasetLocation,
    /// The archive that was extracted, if acquisition was needed.
    pub archive: Option<ArchiveReference>,
    pub extracted_files: usize,
}

impl ProvisionReport {
    /// True when the run had to fetch the archive over the network.
    pub fn downloaded(&self) -> bool {
        self.archive
            .as_ref()
            .is_some_and(|archive| archive.origin == ArchiveOrigin::Downloaded)
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GeoLife dataset ready at {}", self.location.root.display())?;
        writeln!(
            f,
            "  first trajectory: {}",
            self.location.first_trajectory.display()
        )?;
        match &self.archive {
            None => writeln!(f, "  already unpacked, nothing to do")?,
            Some(archive) => {
                let how = match archive.origin {
                    ArchiveOrigin::Existing => "existing",
                    ArchiveOrigin::Downloaded => "downloaded",
                };
                writeln!(
                    f,
                    "  extracted {} files from {} archive {}",
                    self.extracted_files,
                    how,
                    archive.path.display()
                )?;
            }
        }
        Ok(())
    }
}

/// Verifies, unpacks, or downloads the dataset under a directory.
#[derive(Clone, Debug, Default)]
pub struct DatasetProvisioner {
    config: ProvisionConfig,
}

impl DatasetProvisioner {
    pub fn new(config: ProvisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Find unpacked trajectory files anywhere under `root`.
    pub fn locate(&self, root: &Path) -> Option<DatasetLocation> {
        locate::find_dataset_root(root, &self.config.data_extension)
    }

    /// Find an archive among the direct children of `root`.
    pub fn locate_archive(&self, root: &Path) -> Option<ArchiveReference> {
        locate::find_archive(root, &self.config.archive_extension).map(|path| ArchiveReference {
            path,
            origin: ArchiveOrigin::Existing,
        })
    }

    /// Fetch `url` into `destination`.
    pub fn download(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<ArchiveReference, DownloadError> {
        download::download_to_file(url, destination, self.config.connect_timeout)?;
        Ok(ArchiveReference {
            path: destination.to_path_buf(),
            origin: ArchiveOrigin::Downloaded,
        })
    }

    /// Unpack `archive` below `destination`, returning the file count.
    pub fn extract(&self, archive: &Path, destination: &Path) -> Result<usize, ExtractError> {
        extract::extract_archive(archive, destination)
    }

    /// Make sure the dataset is unpacked under `directory` and return where.
    ///
    /// The search after extraction happens exactly once; a second miss is
    /// terminal because it almost always means a wrong archive or a stale URL.
    pub fn verify(&self, directory: &Path) -> Result<ProvisionReport, ProvisionError> {
        if let Some(location) = self.locate(directory) {
            info!(
                "GeoLife trajectory files found; dataset root is '{}'",
                location.root.display()
            );
            return Ok(ProvisionReport {
                location,
                archive: None,
                extracted_files: 0,
            });
        }

        info!(
            "GeoLife PLT files not found in '{}'. Checking for ZIP archive.",
            directory.display()
        );
        let target_dir = absolute(directory);

        let archive = match self.locate_archive(directory) {
            Some(archive) => {
                info!("GeoLife ZIP archive found at '{}'.", archive.path.display());
                archive
            }
            None => {
                info!(
                    "No GeoLife ZIP archive. Proceeding with download. \
                     Please be patient, it is a 300 MB archive."
                );
                let destination = directory.join(&self.config.archive_file_name);
                self.download(&self.config.archive_url, &destination)
                    .map_err(|source| ProvisionError::Download {
                        url: self.config.archive_url.clone(),
                        directory: target_dir.clone(),
                        manual_page: self.config.manual_download_page.clone(),
                        source,
                    })?
            }
        };

        let extracted_files =
            self.extract(&archive.path, directory)
                .map_err(|source| ProvisionError::Extract {
                    archive: archive.path.clone(),
                    directory: target_dir.clone(),
                    manual_page: self.config.manual_download_page.clone(),
                    source,
                })?;

        debug!("searching '{}' again after extraction", directory.display());
        match self.locate(directory) {
            Some(location) => {
                info!(
                    "GeoLife dataset unpacked; dataset root is '{}'",
                    location.root.display()
                );
                Ok(ProvisionReport {
                    location,
                    archive: Some(archive),
                    extracted_files,
                })
            }
            None => Err(ProvisionError::DatasetMissing {
                archive: archive.path,
                url: self.config.archive_url.clone(),
                directory: target_dir,
                manual_page: self.config.manual_download_page.clone(),
            }),
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
