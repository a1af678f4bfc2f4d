//! Payload parsing for backend responses.

use serde_json::Value;

use super::types::{ItemId, PhotoId, SearchPage, SearchResultRow};
use super::FetchError;

/// Accept a JSON value as an id only if it is a non-negative integer.
pub fn validate_id(value: &Value) -> Result<u64, FetchError> {
    value
        .as_u64()
        .ok_or_else(|| FetchError::InvalidArgument(format!("malformed id: {}", value)))
}

fn parse_json(body: &[u8], what: &str) -> Result<Value, FetchError> {
    serde_json::from_slice(body)
        .map_err(|e| FetchError::Parse(format!("{} is not valid JSON: {}", what, e)))
}

/// Parse a catalog search response.
///
/// A missing `products` array fails the whole page; a bad product only
/// lands in `rejected`.
pub fn parse_search_page(body: &[u8]) -> Result<SearchPage, FetchError> {
    let json = parse_json(body, "search response")?;
    let products = json
        .get("products")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Parse("search response has no products array".to_string()))?;

    let mut page = SearchPage::default();
    for product in products {
        match parse_product(product) {
            Ok(row) => page.rows.push(row),
            Err(e) => page.rejected.push(e),
        }
    }
    Ok(page)
}

fn parse_product(product: &Value) -> Result<SearchResultRow, FetchError> {
    let id = product
        .get("id")
        .ok_or_else(|| FetchError::Parse("product without id".to_string()))?;
    let product_id = validate_id(id)?;

    // Metadata is passed through as-is; a missing or mistyped field is just absent.
    Ok(SearchResultRow {
        product_id,
        brand_id: product.get("brandId").and_then(Value::as_u64),
        name: product.get("name").and_then(Value::as_str).map(str::to_string),
        supplier_name: product.get("supplier").and_then(Value::as_str).map(str::to_string),
        supplier_id: product.get("supplierId").and_then(Value::as_u64),
        review_rating: product.get("reviewRating").and_then(Value::as_f64),
        feedback_count: product.get("feedbacks").and_then(Value::as_u64),
        sizes: product.get("sizes")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    })
}

/// Extract `imt_id` from a product card. Absent or null yields `None`.
pub fn parse_card(body: &[u8]) -> Result<Option<ItemId>, FetchError> {
    let json = parse_json(body, "product card")?;
    match json.get("imt_id") {
        None | Some(Value::Null) => Ok(None),
        Some(id) => validate_id(id).map(Some),
    }
}

/// Extract the `photo` id list from a feedback list. Absent or null yields no photos.
pub fn parse_feedbacks(body: &[u8]) -> Result<Vec<PhotoId>, FetchError> {
    let json = parse_json(body, "feedback list")?;
    match json.get("photo") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|id| {
                id.as_u64()
                    .ok_or_else(|| FetchError::Parse(format!("photo id is not an integer: {}", id)))
            })
            .collect(),
        Some(other) => Err(FetchError::Parse(format!(
            "photo field is not an array: {}",
            other
        ))),
    }
}
