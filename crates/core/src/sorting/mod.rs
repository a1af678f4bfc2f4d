//! File handling around the image sorting collaborators.
//!
//! The classification model and the hue detector live outside this crate;
//! they plug in through `ImageClassifier` and `RegionDetector`. This module
//! owns everything around them: picking input files, batching, and moving
//! or copying results into place.

mod classify;
mod region;

pub use classify::{sort_by_label, ImageClassifier, SortReport};
pub use region::{apply_action, select_matching, RegionDetector};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with a selected file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    #[default]
    Move,
    Copy,
}

/// Errors from sorting operations.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("classifier returned {got} labels for {expected} images")]
    LabelMismatch { expected: usize, got: usize },

    #[error("detector failed on {path}: {message}")]
    Detector { path: PathBuf, message: String },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SortError + '_ {
    move |source| SortError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Regular files in `dir` with the given extension, sorted by name.
pub fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SortError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Move or copy `source` into `dest_dir`, keeping its file name.
///
/// Moves fall back to copy-then-delete when a rename crosses filesystems.
pub fn place_file(source: &Path, dest_dir: &Path, action: FileAction) -> Result<PathBuf, SortError> {
    let file_name = source.file_name().ok_or_else(|| SortError::Io {
        path: source.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    fs::create_dir_all(dest_dir).map_err(io_error(dest_dir))?;
    let destination = dest_dir.join(file_name);

    match action {
        FileAction::Copy => {
            fs::copy(source, &destination).map_err(io_error(source))?;
        }
        FileAction::Move => {
            if fs::rename(source, &destination).is_err() {
                fs::copy(source, &destination).map_err(io_error(source))?;
                fs::remove_file(source).map_err(io_error(source))?;
            }
        }
    }
    Ok(destination)
}
