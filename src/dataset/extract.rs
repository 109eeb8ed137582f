use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::ExtractError;

/// One archive entry scheduled for extraction.
#[derive(Debug)]
struct PlannedEntry {
    index: usize,
    name: String,
    target: PathBuf,
    is_dir: bool,
}

/// Unpack every entry of `archive` below `destination`.
///
/// All entry names are checked before anything touches the disk, so an
/// archive with a single escaping entry writes nothing at all. Returns the
/// number of files written.
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<usize, ExtractError> {
    info!(
        "Extracting {} into {}",
        archive.display(),
        destination.display()
    );

    let file = File::open(archive).map_err(|source| ExtractError::Open {
        archive: archive.to_path_buf(),
        source,
    })?;
    let mut zip =
        ZipArchive::new(BufReader::new(file)).map_err(|source| ExtractError::InvalidArchive {
            archive: archive.to_path_buf(),
            source,
        })?;

    let plan = plan_entries(&mut zip, archive, destination)?;
    debug!("{} entries passed path checks", plan.len());

    let mut written = 0;
    for entry in plan {
        if entry.is_dir {
            create_dir(&entry.target)?;
            continue;
        }

        if let Some(parent) = entry.target.parent() {
            create_dir(parent)?;
        }

        let mut reader = zip
            .by_index(entry.index)
            .map_err(|source| ExtractError::Entry {
                archive: archive.to_path_buf(),
                entry: entry.name.clone(),
                source,
            })?;
        copy_entry(&mut reader, &entry, archive)?;
        written += 1;
    }

    info!("Extracted {written} files from {}", archive.display());
    Ok(written)
}

fn plan_entries<R: Read + io::Seek>(
    zip: &mut ZipArchive<R>,
    archive: &Path,
    destination: &Path,
) -> Result<Vec<PlannedEntry>, ExtractError> {
    let mut plan = Vec::with_capacity(zip.len());

    for index in 0..zip.len() {
        let raw = zip
            .by_index_raw(index)
            .map_err(|source| ExtractError::InvalidArchive {
                archive: archive.to_path_buf(),
                source,
            })?;
        let name = raw.name().to_string();
        let is_dir = raw.is_dir();
        drop(raw);

        let unsafe_entry = || ExtractError::UnsafeEntry {
            archive: archive.to_path_buf(),
            entry: name.clone(),
        };
        let relative = contained_path(&name).ok_or_else(unsafe_entry)?;

        if relative.as_os_str().is_empty() {
            // "./" style entries name the destination itself.
            if is_dir {
                continue;
            }
            return Err(unsafe_entry());
        }

        plan.push(PlannedEntry {
            index,
            target: destination.join(relative),
            name,
            is_dir,
        });
    }

    Ok(plan)
}

/// Normalize an archive entry name into a path relative to the extraction
/// directory.
///
/// Returns `None` for absolute names, drive prefixes, embedded NULs, and any
/// name whose `..` components climb above the starting directory.
pub fn contained_path(name: &str) -> Option<PathBuf> {
    if name.contains('\0') {
        return None;
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return None,
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    Some(normalized)
}

fn create_dir(path: &Path) -> Result<(), ExtractError> {
    fs::create_dir_all(path).map_err(|source| ExtractError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_entry(
    reader: &mut impl Read,
    entry: &PlannedEntry,
    archive: &Path,
) -> Result<(), ExtractError> {
    let write_err = |source| ExtractError::Write {
        path: entry.target.clone(),
        source,
    };

    let file = File::create(&entry.target).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let mut buf = [0u8; 16 * 1024];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ExtractError::Entry {
                    archive: archive.to_path_buf(),
                    entry: entry.name.clone(),
                    source: source.into(),
                })
            }
        };
        writer.write_all(&buf[..n]).map_err(write_err)?;
    }

    writer.flush().map_err(write_err)
}
