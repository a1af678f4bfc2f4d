//! Types flowing between the pipeline stages.

use serde::{Deserialize, Serialize};

/// Catalog-facing identifier returned by search.
pub type ProductId = u64;

/// Canonical identifier shared by all listings of one physical item.
pub type ItemId = u64;

/// Identifier of one feedback photo.
pub type PhotoId = u64;

/// Extension of persisted photo files.
pub const PHOTO_EXTENSION: &str = "jpg";

/// One product row from catalog search.
///
/// Only `product_id` drives the pipeline; the rest is pass-through metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultRow {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_count: Option<u64>,
    /// Size entries exactly as the backend returned them.
    #[serde(default)]
    pub sizes: Vec<serde_json::Value>,
}

impl SearchResultRow {
    /// A row carrying only its product id.
    pub fn bare(product_id: ProductId) -> Self {
        Self {
            product_id,
            brand_id: None,
            name: None,
            supplier_name: None,
            supplier_id: None,
            review_rating: None,
            feedback_count: None,
            sizes: Vec::new(),
        }
    }
}

/// A parsed search page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Rows with a valid product id.
    pub rows: Vec<SearchResultRow>,
    /// Per-row failures; the page itself is still usable.
    pub rejected: Vec<super::FetchError>,
}

/// Result of resolving one product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMapping {
    pub product_id: ProductId,
    pub item_id: Option<ItemId>,
}

/// The product chosen to own an item's photos, after dedup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemOwner {
    pub product_id: ProductId,
    pub item_id: ItemId,
}

/// Photos discovered for one owned item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSet {
    pub owner: ItemOwner,
    /// Photo ids in backend order.
    pub photos: Vec<PhotoId>,
}

impl PhotoSet {
    /// Expand into one record per photo.
    pub fn records(&self) -> impl Iterator<Item = PhotoRecord> + '_ {
        self.photos.iter().map(move |&photo_id| PhotoRecord {
            product_id: self.owner.product_id,
            item_id: self.owner.item_id,
            photo_id,
        })
    }
}

/// A photo persisted to the output directory.
///
/// The identity triple is also the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub product_id: ProductId,
    pub item_id: ItemId,
    pub photo_id: PhotoId,
}

impl PhotoRecord {
    /// `{product_id}_{item_id}_{photo_id}.jpg`
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.product_id, self.item_id, self.photo_id, PHOTO_EXTENSION
        )
    }
}
