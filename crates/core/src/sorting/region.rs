//! Selection of images containing a dominant-hue region.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::{collect_files, place_file, FileAction, SortError};

/// Predicate deciding whether an image contains the wanted color region.
pub trait RegionDetector: Send + Sync {
    fn matches(&self, path: &Path) -> Result<bool, SortError>;
}

/// Images of `input_dir` the detector accepts, sorted by name.
///
/// Images the detector cannot read are skipped with a warning.
pub fn select_matching(
    input_dir: &Path,
    extension: &str,
    detector: &dyn RegionDetector,
) -> Result<Vec<PathBuf>, SortError> {
    let mut selected = Vec::new();
    for path in collect_files(input_dir, extension)? {
        match detector.matches(&path) {
            Ok(true) => selected.push(path),
            Ok(false) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable image"),
        }
    }
    Ok(selected)
}

/// Move or copy every path into `out_dir`. Returns the new locations.
pub fn apply_action(
    paths: &[PathBuf],
    out_dir: &Path,
    action: FileAction,
) -> Result<Vec<PathBuf>, SortError> {
    paths
        .iter()
        .map(|path| place_file(path, out_dir, action))
        .collect()
}
