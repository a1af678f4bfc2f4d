//! Download stage: fetch photo bytes and persist them.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::marketplace::{FetchError, MarketplaceClient, PhotoRecord};

use super::fanout::{cancellable, fan_out};
use super::types::{IssueKind, Stage, StageIssue, StageOutput};

/// Failure of a single photo download.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    fn to_issue(&self, photo_id: u64) -> Option<StageIssue> {
        match self {
            DownloadError::Fetch(e) => StageIssue::from_fetch(Stage::Download, photo_id, e),
            DownloadError::Io { .. } => Some(StageIssue::new(
                Stage::Download,
                IssueKind::Io,
                photo_id,
                self.to_string(),
            )),
        }
    }
}

/// Photos written by the download stage.
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    /// Records written, with their issues.
    pub output: StageOutput<PhotoRecord>,
    /// Downloads that failed (cancelled downloads excluded).
    pub failed: usize,
}

/// Hidden sibling the body is streamed into before the final rename.
fn partial_path(out_dir: &Path, file_name: &str) -> PathBuf {
    out_dir.join(format!(".{}.part", file_name))
}

fn is_partial_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".part")
}

/// Delete `.{name}.part` leftovers of interrupted runs. Returns how many were removed.
///
/// A leftover that cannot be removed is logged and kept.
pub async fn sweep_partial_files(out_dir: &Path) -> std::io::Result<usize> {
    let mut entries = match fs::read_dir(out_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let is_partial = entry.file_name().to_str().is_some_and(is_partial_name);
        if !is_partial || !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        match fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Cannot remove partial download"),
        }
    }

    Ok(removed)
}

async fn write_atomically(out_dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let partial = partial_path(out_dir, file_name);
    let destination = out_dir.join(file_name);

    let mut file = File::create(&partial).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&partial, &destination).await?;
    Ok(destination)
}

/// Fetch one photo and write it to `out_dir/{product}_{item}_{photo}.jpg`.
pub async fn download_photo(
    client: &dyn MarketplaceClient,
    record: PhotoRecord,
    out_dir: &Path,
    cancel: &CancellationToken,
) -> Result<PathBuf, DownloadError> {
    let bytes = cancellable(cancel, client.photo_bytes(record.photo_id)).await?;

    let file_name = record.file_name();
    let path = write_atomically(out_dir, &file_name, &bytes)
        .await
        .map_err(|source| DownloadError::Io {
            path: out_dir.join(&file_name),
            source,
        })?;

    debug!(path = %path.display(), bytes = bytes.len(), "Photo saved");
    Ok(path)
}

/// Download every record concurrently. Failures never stop sibling downloads.
pub async fn download_all(
    client: &dyn MarketplaceClient,
    records: Vec<PhotoRecord>,
    out_dir: &Path,
    limit: usize,
    cancel: &CancellationToken,
) -> DownloadOutcome {
    let results = fan_out(records, limit, cancel, |record| async move {
        (record, download_photo(client, record, out_dir, cancel).await)
    })
    .await;

    let mut outcome = DownloadOutcome::default();
    for (record, result) in results {
        match result {
            Ok(_) => outcome.output.items.push(record),
            Err(DownloadError::Fetch(FetchError::Cancelled)) => {}
            Err(e) => {
                outcome.failed += 1;
                outcome.output.report(e.to_issue(record.photo_id));
            }
        }
    }
    outcome
}
