use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::DatasetLocation;

/// Number of directory levels between a trajectory file's directory and the
/// dataset root (`Data/<user>/Trajectory/*.plt`).
const ROOT_LEVELS_ABOVE_TRAJECTORY_DIR: usize = 2;

/// Walk `root` and derive the dataset root from the first file carrying
/// `extension`.
///
/// Entries are visited depth-first with each directory's children sorted by
/// file name, so the same tree always yields the same location. Returns
/// `None` when no such file exists, including when `root` itself is missing.
pub fn find_dataset_root(root: &Path, extension: &str) -> Option<DatasetLocation> {
    let root = match root.canonicalize() {
        Ok(path) => path,
        Err(source) => {
            debug!("cannot resolve search directory {}: {source}", root.display());
            return None;
        }
    };

    let first = first_file_with_extension(&root, extension)?;
    let containing_dir = first.parent()?;

    Some(DatasetLocation {
        root: ancestor(containing_dir, ROOT_LEVELS_ABOVE_TRAJECTORY_DIR),
        first_trajectory: first,
    })
}

/// Find the first archive among the direct children of `root`, by file name.
pub fn find_archive(root: &Path, extension: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && has_extension(entry.path(), extension))
        .map(walkdir::DirEntry::into_path)
}

fn first_file_with_extension(root: &Path, extension: &str) -> Option<PathBuf> {
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                warn!("skipping unreadable entry while searching: {source}");
                continue;
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            return Some(entry.into_path());
        }
    }

    None
}

/// Walk `levels` parents up from `dir`, stopping early at the filesystem root.
fn ancestor(dir: &Path, levels: usize) -> PathBuf {
    let mut current = dir;
    for _ in 0..levels {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current.to_path_buf()
}

pub(crate) fn has_extension(path: &Path, wanted: &str) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    ext.eq_ignore_ascii_case(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().expect("parent")).expect("create parent dir");
        fs::write(path, b"").expect("write file");
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_extension(Path::new("a/b/20081023025304.plt"), "plt"));
        assert!(has_extension(Path::new("a/b/20081023025304.PLT"), "plt"));
        assert!(!has_extension(Path::new("a/b/labels.txt"), "plt"));
        assert!(!has_extension(Path::new("a/b/plt"), "plt"));
    }

    #[test]
    fn ancestor_saturates_at_filesystem_root() {
        assert_eq!(ancestor(Path::new("/a/b/c"), 2), PathBuf::from("/a"));
        assert_eq!(ancestor(Path::new("/a"), 2), PathBuf::from("/"));
    }

    #[test]
    fn dataset_root_is_two_levels_above_trajectory_dir() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("Data/012/Trajectory/foo.plt"));

        let location = find_dataset_root(temp.path(), "plt").expect("dataset found");
        let root = temp.path().canonicalize().expect("canonical temp dir");
        assert_eq!(location.root, root.join("Data"));
        assert_eq!(
            location.first_trajectory,
            root.join("Data/012/Trajectory/foo.plt")
        );
    }

    #[test]
    fn first_match_follows_file_name_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("b/Data/001/Trajectory/x.plt"));
        touch(&temp.path().join("a/Data/009/Trajectory/z.plt"));
        touch(&temp.path().join("a/Data/009/Trajectory/y.plt"));

        let location = find_dataset_root(temp.path(), "plt").expect("dataset found");
        assert!(location
            .first_trajectory
            .ends_with("a/Data/009/Trajectory/y.plt"));
    }

    #[test]
    fn missing_data_is_none() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("Data/012/labels.txt"));

        assert!(find_dataset_root(temp.path(), "plt").is_none());
        assert!(find_dataset_root(&temp.path().join("does-not-exist"), "plt").is_none());
    }

    #[test]
    fn archive_search_is_shallow_and_sorted() {
        let temp = tempfile::tempdir().expect("create temp dir");
        touch(&temp.path().join("nested/deep.zip"));
        touch(&temp.path().join("z.ZIP"));
        touch(&temp.path().join("b.zip"));
        touch(&temp.path().join("geolife.zip.part"));

        let found = find_archive(temp.path(), "zip").expect("archive found");
        assert_eq!(found.file_name().and_then(|n| n.to_str()), Some("b.zip"));
    }

    #[test]
    fn archive_search_ignores_directories_named_like_archives() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("unpacked.zip")).expect("create dir");

        assert!(find_archive(temp.path(), "zip").is_none());
    }
}
