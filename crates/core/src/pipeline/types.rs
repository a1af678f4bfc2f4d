//! Types reported by a pipeline run.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::marketplace::FetchError;

/// Fatal conditions that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The existing output could not be listed.
    #[error("cannot scan output directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No network session could be established.
    #[error("cannot create HTTP session: {0}")]
    Session(FetchError),

    /// The run was interrupted by its cancellation signal.
    #[error("run cancelled")]
    Cancelled,
}

/// Pipeline stage an issue was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Search,
    Resolve,
    Discover,
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Search => "search",
            Stage::Resolve => "resolve",
            Stage::Discover => "discover",
            Stage::Download => "download",
        };
        f.write_str(name)
    }
}

/// Classification of a recoverable issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Transport,
    Parse,
    NotFound,
    InvalidArgument,
    /// A search page returned no products. Informational.
    ZeroResults,
    /// Writing a photo to disk failed.
    Io,
}

/// A per-item failure that was isolated and did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageIssue {
    pub stage: Stage,
    pub kind: IssueKind,
    /// Page number, product id, item id or photo id, depending on the stage.
    pub subject: u64,
    pub message: String,
}

impl StageIssue {
    pub fn new(stage: Stage, kind: IssueKind, subject: u64, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            subject,
            message: message.into(),
        }
    }

    /// Issue for a failed backend call. `None` for cancelled calls.
    pub fn from_fetch(stage: Stage, subject: u64, error: &FetchError) -> Option<Self> {
        let kind = match error {
            FetchError::Transport(_) => IssueKind::Transport,
            FetchError::Parse(_) => IssueKind::Parse,
            FetchError::NotFound(_) => IssueKind::NotFound,
            FetchError::InvalidArgument(_) => IssueKind::InvalidArgument,
            FetchError::Cancelled => return None,
        };
        Some(Self::new(stage, kind, subject, error.to_string()))
    }

    pub fn is_informational(&self) -> bool {
        self.kind == IssueKind::ZeroResults
    }

    /// Log the issue at the level matching its severity.
    pub fn log(&self) {
        if self.is_informational() {
            info!(stage = %self.stage, subject = self.subject, "{}", self.message);
        } else {
            warn!(
                stage = %self.stage,
                kind = ?self.kind,
                subject = self.subject,
                "{}",
                self.message
            );
        }
    }
}

/// Items produced by one stage barrier plus the issues raised on the way.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub items: Vec<T>,
    pub issues: Vec<StageIssue>,
}

impl<T> Default for StageOutput<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl<T> StageOutput<T> {
    /// Log and keep an issue.
    pub(crate) fn report(&mut self, issue: Option<StageIssue>) {
        if let Some(issue) = issue {
            issue.log();
            self.issues.push(issue);
        }
    }
}

/// Final report of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub query: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_requested: u32,
    /// Search rows across all pages, duplicates included.
    pub rows_found: usize,
    /// Products whose card yielded an item id.
    pub products_resolved: usize,
    /// Items left after dedup, one owner each.
    pub unique_items: usize,
    /// Items whose feedback list had at least one photo.
    pub items_with_photos: usize,
    /// Photos handed to the download stage.
    pub photos_scheduled: usize,
    /// Photos already on disk.
    pub photos_skipped: usize,
    pub photos_downloaded: usize,
    pub photos_failed: usize,
    pub issues: Vec<StageIssue>,
}

impl RunSummary {
    pub fn new(query: &str, pages_requested: u32) -> Self {
        Self {
            query: query.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            pages_requested,
            rows_found: 0,
            products_resolved: 0,
            unique_items: 0,
            items_with_photos: 0,
            photos_scheduled: 0,
            photos_skipped: 0,
            photos_downloaded: 0,
            photos_failed: 0,
            issues: Vec::new(),
        }
    }

    /// Issues of one kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &StageIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Issues that are actual failures.
    pub fn recoverable_errors(&self) -> usize {
        self.issues.iter().filter(|i| !i.is_informational()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_from_fetch() {
        let issue =
            StageIssue::from_fetch(Stage::Discover, 999, &FetchError::Parse("bad".to_string()))
                .unwrap();
        assert_eq!(issue.kind, IssueKind::Parse);
        assert_eq!(issue.subject, 999);
        assert_eq!(issue.message, "parse error: bad");
    }

    #[test]
    fn test_cancelled_fetch_is_not_an_issue() {
        assert!(StageIssue::from_fetch(Stage::Download, 1, &FetchError::Cancelled).is_none());
    }

    #[test]
    fn test_summary_counts_only_real_errors() {
        let mut summary = RunSummary::new("mug", 2);
        summary
            .issues
            .push(StageIssue::new(Stage::Search, IssueKind::ZeroResults, 2, "empty"));
        summary
            .issues
            .push(StageIssue::new(Stage::Resolve, IssueKind::Transport, 100, "reset"));
        assert_eq!(summary.recoverable_errors(), 1);
        assert_eq!(summary.issues_of(IssueKind::ZeroResults).count(), 1);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = RunSummary::new("mug", 1);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["query"], "mug");
        assert_eq!(json["photos_scheduled"], 0);
        assert!(json["finished_at"].is_null());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Discover.to_string(), "discover");
    }
}
