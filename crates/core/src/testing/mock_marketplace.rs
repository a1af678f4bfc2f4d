//! Mock marketplace backend for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::marketplace::{
    FetchError, ItemId, MarketplaceClient, PhotoId, ProductId, SearchPage, SearchResultRow,
};

/// Backend calls made against the mock, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedCalls {
    /// Search page numbers requested.
    pub search_pages: Vec<u32>,
    /// Queries sent with those pages.
    pub search_queries: Vec<String>,
    /// Product ids whose card was fetched.
    pub item_lookups: Vec<ProductId>,
    /// Item ids whose feedback list was fetched.
    pub photo_lists: Vec<ItemId>,
    /// Photo ids downloaded.
    pub photo_downloads: Vec<PhotoId>,
}

#[derive(Default)]
struct MockState {
    pages: HashMap<(String, u32), SearchPage>,
    page_errors: HashMap<u32, FetchError>,
    items: HashMap<ProductId, ItemId>,
    item_errors: HashMap<ProductId, FetchError>,
    photos: HashMap<ItemId, Vec<PhotoId>>,
    photo_errors: HashMap<ItemId, FetchError>,
    photo_bytes: HashMap<PhotoId, Vec<u8>>,
    download_errors: HashMap<PhotoId, FetchError>,
    latency: Option<Duration>,
    calls: RecordedCalls,
}

/// Mock implementation of the MarketplaceClient trait.
///
/// Provides controllable behavior for testing:
/// - Configure search pages, card item ids, photo lists and photo bytes
/// - Inject a `FetchError` for any single page, product, item or photo
/// - Record every call for assertions
/// - Delay every call to exercise cancellation
///
/// Unconfigured lookups behave like an empty backend: empty pages, cards
/// without an item id, items without photos. Unconfigured photos download
/// as a small fake JPEG.
///
/// Clones share state.
///
/// # Example
///
/// ```rust,ignore
/// use wildbeater_core::testing::MockMarketplace;
///
/// let mock = MockMarketplace::new();
/// mock.set_page("mug", 1, vec![100, 200]);
/// mock.set_item(100, 999);
/// mock.set_photos(999, vec![1001, 1002]);
///
/// // run the pipeline against Arc::new(mock.clone())
///
/// assert_eq!(mock.calls().photo_lists, vec![999]);
/// ```
#[derive(Clone, Default)]
pub struct MockMarketplace {
    state: Arc<Mutex<MockState>>,
}

impl std::fmt::Debug for MockMarketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockMarketplace")
            .field("state", &"<state>")
            .finish()
    }
}

/// Bytes served for photos without configured content.
pub fn fake_photo_bytes(photo_id: PhotoId) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF];
    bytes.extend_from_slice(photo_id.to_string().as_bytes());
    bytes
}

impl MockMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serve a page of bare rows for `query`.
    pub fn set_page(&self, query: &str, page: u32, product_ids: Vec<ProductId>) {
        let rows = product_ids.into_iter().map(SearchResultRow::bare).collect();
        self.set_page_rows(query, page, rows);
    }

    /// Serve a page of full rows for `query`.
    pub fn set_page_rows(&self, query: &str, page: u32, rows: Vec<SearchResultRow>) {
        self.state().pages.insert(
            (query.to_string(), page),
            SearchPage {
                rows,
                rejected: Vec::new(),
            },
        );
    }

    /// Serve a parsed page as is, rejected rows included.
    pub fn set_search_page(&self, query: &str, page: u32, search_page: SearchPage) {
        self.state()
            .pages
            .insert((query.to_string(), page), search_page);
    }

    /// Fail page `page` for every query.
    pub fn fail_page(&self, page: u32, error: FetchError) {
        self.state().page_errors.insert(page, error);
    }

    pub fn set_item(&self, product_id: ProductId, item_id: ItemId) {
        self.state().items.insert(product_id, item_id);
    }

    pub fn fail_item(&self, product_id: ProductId, error: FetchError) {
        self.state().item_errors.insert(product_id, error);
    }

    pub fn set_photos(&self, item_id: ItemId, photos: Vec<PhotoId>) {
        self.state().photos.insert(item_id, photos);
    }

    pub fn fail_photos(&self, item_id: ItemId, error: FetchError) {
        self.state().photo_errors.insert(item_id, error);
    }

    pub fn set_photo_bytes(&self, photo_id: PhotoId, bytes: Vec<u8>) {
        self.state().photo_bytes.insert(photo_id, bytes);
    }

    pub fn fail_download(&self, photo_id: PhotoId, error: FetchError) {
        self.state().download_errors.insert(photo_id, error);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    /// Snapshot of the calls made so far.
    pub fn calls(&self) -> RecordedCalls {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls = RecordedCalls::default();
    }

    async fn delay(&self) {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl MarketplaceClient for MockMarketplace {
    async fn search_page(&self, query: &str, page: u32) -> Result<SearchPage, FetchError> {
        {
            let mut state = self.state();
            state.calls.search_pages.push(page);
            state.calls.search_queries.push(query.to_string());
        }
        self.delay().await;

        let state = self.state();
        if let Some(e) = state.page_errors.get(&page) {
            return Err(e.clone());
        }
        Ok(state
            .pages
            .get(&(query.to_string(), page))
            .cloned()
            .unwrap_or_default())
    }

    async fn item_id(&self, product_id: ProductId) -> Result<Option<ItemId>, FetchError> {
        self.state().calls.item_lookups.push(product_id);
        self.delay().await;

        let state = self.state();
        if let Some(e) = state.item_errors.get(&product_id) {
            return Err(e.clone());
        }
        Ok(state.items.get(&product_id).copied())
    }

    async fn photo_ids(&self, item_id: ItemId) -> Result<Vec<PhotoId>, FetchError> {
        self.state().calls.photo_lists.push(item_id);
        self.delay().await;

        let state = self.state();
        if let Some(e) = state.photo_errors.get(&item_id) {
            return Err(e.clone());
        }
        Ok(state.photos.get(&item_id).cloned().unwrap_or_default())
    }

    async fn photo_bytes(&self, photo_id: PhotoId) -> Result<Vec<u8>, FetchError> {
        self.state().calls.photo_downloads.push(photo_id);
        self.delay().await;

        let state = self.state();
        if let Some(e) = state.download_errors.get(&photo_id) {
            return Err(e.clone());
        }
        Ok(state
            .photo_bytes
            .get(&photo_id)
            .cloned()
            .unwrap_or_else(|| fake_photo_bytes(photo_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_backend_is_empty() {
        let mock = MockMarketplace::new();
        assert!(mock.search_page("q", 1).await.unwrap().rows.is_empty());
        assert_eq!(mock.item_id(1).await.unwrap(), None);
        assert!(mock.photo_ids(1).await.unwrap().is_empty());
        assert_eq!(mock.photo_bytes(7).await.unwrap(), fake_photo_bytes(7));
    }

    #[tokio::test]
    async fn test_pages_are_keyed_by_query() {
        let mock = MockMarketplace::new();
        mock.set_page("mug", 1, vec![100]);

        assert_eq!(mock.search_page("mug", 1).await.unwrap().rows.len(), 1);
        assert!(mock.search_page("cup", 1).await.unwrap().rows.is_empty());
        assert_eq!(mock.calls().search_queries, vec!["mug", "cup"]);
    }

    #[tokio::test]
    async fn test_injected_errors() {
        let mock = MockMarketplace::new();
        mock.set_item(100, 999);
        mock.fail_item(100, FetchError::NotFound("card".to_string()));

        let err = mock.item_id(100).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let mock = MockMarketplace::new();
        let clone = mock.clone();
        clone.set_photos(5, vec![1]);

        assert_eq!(mock.photo_ids(5).await.unwrap(), vec![1]);
        assert_eq!(clone.calls().photo_lists, vec![5]);
    }
}
