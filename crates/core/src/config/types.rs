use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::marketplace::{WbClientConfig, DEFAULT_SEARCH_URL};
use crate::sorting::FileAction;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub sort: SortConfig,
}

/// Crawl configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapeConfig {
    /// Catalog search query
    #[serde(default)]
    pub query: String,
    /// Number of search pages to fetch, starting at 1
    #[serde(default = "default_pages")]
    pub pages: u32,
    /// Directory photos are written to
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    /// Per-request timeout in seconds (none = wait indefinitely)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
    /// Skip photos already present in `out_dir`
    #[serde(default = "default_true")]
    pub skip_existing: bool,
    /// Ignore zero-length files when looking for existing photos
    #[serde(default = "default_true")]
    pub verify_existing: bool,
    /// Maximum in-flight requests per stage
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Catalog search endpoint
    #[serde(default = "default_search_url")]
    pub search_url: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            pages: default_pages(),
            out_dir: default_out_dir(),
            timeout_secs: None,
            skip_existing: true,
            verify_existing: true,
            concurrency: default_concurrency(),
            search_url: default_search_url(),
        }
    }
}

impl ScrapeConfig {
    /// Per-request timeout. Values that are not a valid `Duration` yield `None`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// HTTP client settings derived from this config.
    pub fn client_config(&self) -> WbClientConfig {
        WbClientConfig {
            search_url: self.search_url.clone(),
            timeout: self.timeout(),
            cdn_base_url: None,
        }
    }
}

fn default_pages() -> u32 {
    5
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("RawData")
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    16
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

/// Sorting collaborators configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SortConfig {
    /// Extension of files picked up from the input directory
    #[serde(default = "default_extension")]
    pub pattern_extension: String,
    /// Images per classifier call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Whether sorted files are moved or copied
    #[serde(default)]
    pub action: FileAction,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            pattern_extension: default_extension(),
            batch_size: default_batch_size(),
            action: FileAction::default(),
        }
    }
}

fn default_extension() -> String {
    "jpg".to_string()
}

fn default_batch_size() -> usize {
    50
}
