//! Label-folder sorting driven by an external image classifier.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::SortConfig;

use super::{collect_files, place_file, SortError};

/// An image classification model.
pub trait ImageClassifier: Send + Sync {
    /// Return exactly one label per input path, in order.
    fn classify(&self, batch: &[PathBuf]) -> Result<Vec<String>, SortError>;
}

/// Outcome of a sorting run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortReport {
    /// Files placed per label.
    pub labeled: BTreeMap<String, usize>,
    /// Files left in place because their batch or their placement failed.
    pub failed: Vec<PathBuf>,
}

impl SortReport {
    pub fn total_sorted(&self) -> usize {
        self.labeled.values().sum()
    }
}

/// Classify the images of `input_dir` and place each into `out_dir/<label>/`.
///
/// A failing batch is recorded and skipped; the remaining batches still run.
pub fn sort_by_label(
    input_dir: &Path,
    out_dir: &Path,
    config: &SortConfig,
    classifier: &dyn ImageClassifier,
) -> Result<SortReport, SortError> {
    let files = collect_files(input_dir, &config.pattern_extension)?;
    let mut report = SortReport::default();

    for batch in files.chunks(config.batch_size.max(1)) {
        let labels = match classifier.classify(batch) {
            Ok(labels) if labels.len() == batch.len() => labels,
            Ok(labels) => {
                let err = SortError::LabelMismatch {
                    expected: batch.len(),
                    got: labels.len(),
                };
                warn!(error = %err, "Skipping batch");
                report.failed.extend_from_slice(batch);
                continue;
            }
            Err(e) => {
                warn!(error = %e, "Skipping batch");
                report.failed.extend_from_slice(batch);
                continue;
            }
        };

        for (path, label) in batch.iter().zip(labels) {
            match place_file(path, &out_dir.join(&label), config.action) {
                Ok(_) => *report.labeled.entry(label).or_default() += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to place file");
                    report.failed.push(path.clone());
                }
            }
        }
    }

    info!(
        sorted = report.total_sorted(),
        failed = report.failed.len(),
        "Sorting finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorting::FileAction;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Labels by file size parity and records batch sizes.
    struct ParityClassifier {
        batches: Mutex<Vec<usize>>,
    }

    impl ImageClassifier for ParityClassifier {
        fn classify(&self, batch: &[PathBuf]) -> Result<Vec<String>, SortError> {
            self.batches.lock().unwrap().push(batch.len());
            Ok(batch
                .iter()
                .map(|p| {
                    let len = fs::metadata(p).map(|m| m.len()).unwrap_or(0);
                    let label = if len % 2 == 0 { "even" } else { "odd" };
                    label.to_string()
                })
                .collect())
        }
    }

    struct ShortClassifier;

    impl ImageClassifier for ShortClassifier {
        fn classify(&self, _batch: &[PathBuf]) -> Result<Vec<String>, SortError> {
            Ok(vec!["only-one".to_string()])
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("1_1_1.jpg"), b"ab").unwrap();
        fs::write(input.join("1_1_2.jpg"), b"abc").unwrap();
        fs::write(input.join("1_1_3.jpg"), b"abcd").unwrap();
        fs::write(input.join("notes.txt"), b"x").unwrap();
        (dir, input, output)
    }

    #[test]
    fn test_sorts_into_label_folders_in_batches() {
        let (_dir, input, output) = setup();
        let classifier = ParityClassifier {
            batches: Mutex::new(Vec::new()),
        };
        let config = SortConfig {
            batch_size: 2,
            ..Default::default()
        };

        let report = sort_by_label(&input, &output, &config, &classifier).unwrap();

        assert_eq!(report.labeled.get("even"), Some(&2));
        assert_eq!(report.labeled.get("odd"), Some(&1));
        assert!(report.failed.is_empty());
        assert_eq!(*classifier.batches.lock().unwrap(), vec![2, 1]);
        assert!(output.join("even/1_1_1.jpg").exists());
        assert!(output.join("odd/1_1_2.jpg").exists());
        assert!(!input.join("1_1_1.jpg").exists());
        assert!(input.join("notes.txt").exists());
    }

    #[test]
    fn test_copy_leaves_originals() {
        let (_dir, input, output) = setup();
        let classifier = ParityClassifier {
            batches: Mutex::new(Vec::new()),
        };
        let config = SortConfig {
            action: FileAction::Copy,
            ..Default::default()
        };

        let report = sort_by_label(&input, &output, &config, &classifier).unwrap();

        assert_eq!(report.total_sorted(), 3);
        assert!(input.join("1_1_1.jpg").exists());
        assert!(output.join("even/1_1_3.jpg").exists());
    }

    #[test]
    fn test_label_mismatch_fails_batch_only() {
        let (_dir, input, output) = setup();
        let config = SortConfig::default();

        let report = sort_by_label(&input, &output, &config, &ShortClassifier).unwrap();

        assert_eq!(report.total_sorted(), 0);
        assert_eq!(report.failed.len(), 3);
        assert!(input.join("1_1_1.jpg").exists());
    }
}
