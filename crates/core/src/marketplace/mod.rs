//! Marketplace backend access.
//!
//! This module provides the `MarketplaceClient` trait covering the four
//! backend interactions the crawler needs (catalog search, product card,
//! feedback list, photo binary) and the reqwest-backed `WbClient`.

mod client;
mod parse;
mod types;

pub use client::{WbClient, WbClientConfig, DEFAULT_SEARCH_URL};
pub use parse::{parse_card, parse_feedbacks, parse_search_page, validate_id};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a single backend call.
///
/// Every variant is recoverable at the item level: the pipeline reports it
/// and drops the item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection failure, timeout or unexpected HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The payload did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// The backend has no such resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed identifier.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Aborted by the run's cancellation signal.
    #[error("request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Backend operations used by the pipeline stages.
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Fetch one page of catalog search results (pages start at 1).
    async fn search_page(&self, query: &str, page: u32) -> Result<SearchPage, FetchError>;

    /// Resolve a product id to its item id. `Ok(None)` when the card has none.
    async fn item_id(&self, product_id: ProductId) -> Result<Option<ItemId>, FetchError>;

    /// List the photo ids attached to an item's feedbacks.
    async fn photo_ids(&self, item_id: ItemId) -> Result<Vec<PhotoId>, FetchError>;

    /// Download the raw bytes of a photo.
    async fn photo_bytes(&self, photo_id: PhotoId) -> Result<Vec<u8>, FetchError>;
}
