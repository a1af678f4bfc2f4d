//! Marketplace photo crawler.
//!
//! Searches the catalog, resolves every product to its item, lists the
//! item's feedback photos and downloads them, skipping photos a previous
//! run already wrote.

pub mod config;
pub mod hosts;
pub mod marketplace;
pub mod pipeline;
pub mod sorting;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, validate_scrape,
    validate_sort, Config, ConfigError, ScrapeConfig, SortConfig,
};
pub use hosts::{build_url, checksum16, feedback_bucket, UrlKind};
pub use marketplace::{
    FetchError, ItemId, ItemMapping, ItemOwner, MarketplaceClient, PhotoId, PhotoRecord,
    PhotoSet, ProductId, SearchPage, SearchResultRow, WbClient, WbClientConfig,
};
pub use pipeline::{
    ExistingFileIndex, IssueKind, PhotoPipeline, PipelineError, RunSummary, Stage, StageIssue,
};
pub use sorting::{FileAction, ImageClassifier, RegionDetector, SortError, SortReport};
