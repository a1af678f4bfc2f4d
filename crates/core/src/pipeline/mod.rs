//! The photo crawl pipeline.
//!
//! Stages, each a bounded concurrent fan-out that fully drains before the
//! next one starts:
//! - **Search**: catalog pages to product rows
//! - **Resolve**: product ids to item ids, then one owner per item
//! - **Discover**: item ids to photo ids
//! - **Download**: photo bytes to `{product}_{item}_{photo}.jpg`, skipping
//!   what a previous run already wrote
//!
//! Per-item failures are isolated and reported as `StageIssue`s; only
//! run-level conditions surface as `PipelineError`.

mod dedup;
mod download;
mod existing;
mod fanout;
mod photos;
mod resolve;
mod runner;
mod search;
mod types;

pub use dedup::select_owners;
pub use download::{
    download_all, download_photo, sweep_partial_files, DownloadError, DownloadOutcome,
};
pub use existing::{parse_file_name, scan, ExistingFileIndex};
pub use photos::discover_photos;
pub use resolve::resolve_items;
pub use runner::{plan_downloads, PhotoPipeline};
pub use search::fetch_pages;
pub use types::{IssueKind, PipelineError, RunSummary, Stage, StageIssue, StageOutput};
