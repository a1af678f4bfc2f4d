//! Testing utilities and mock implementations.
//!
//! This module provides a mock of the marketplace backend, allowing the
//! whole pipeline to be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use wildbeater_core::testing::{fixtures, MockMarketplace};
//!
//! let mock = MockMarketplace::new();
//! mock.set_page_rows("mug", 1, vec![fixtures::search_row(100, "Mug")]);
//! mock.set_item(100, 999);
//! ```

mod mock_marketplace;

pub use mock_marketplace::{fake_photo_bytes, MockMarketplace, RecordedCalls};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::ScrapeConfig;
    use crate::marketplace::{ProductId, SearchResultRow};

    /// Create a search row with reasonable metadata.
    pub fn search_row(product_id: ProductId, name: &str) -> SearchResultRow {
        SearchResultRow {
            product_id,
            brand_id: Some(1),
            name: Some(name.to_string()),
            supplier_name: Some("Test Supplier".to_string()),
            supplier_id: Some(42),
            review_rating: Some(4.5),
            feedback_count: Some(10),
            sizes: Vec::new(),
        }
    }

    /// Scrape config for `query` writing into `out_dir`, one page, small pool.
    pub fn scrape_config(query: &str, out_dir: &Path) -> ScrapeConfig {
        ScrapeConfig {
            query: query.to_string(),
            pages: 1,
            out_dir: out_dir.to_path_buf(),
            concurrency: 4,
            ..Default::default()
        }
    }
}
