//! Item resolution stage: product id to item id.

use tokio_util::sync::CancellationToken;

use crate::marketplace::{ItemMapping, MarketplaceClient, ProductId};

use super::fanout::{cancellable, fan_out};
use super::types::{IssueKind, Stage, StageIssue, StageOutput};

/// Resolve every product id concurrently.
///
/// One mapping per product id that was attempted; failures yield an absent
/// item id plus an issue and are not retried.
pub async fn resolve_items(
    client: &dyn MarketplaceClient,
    product_ids: Vec<ProductId>,
    limit: usize,
    cancel: &CancellationToken,
) -> StageOutput<ItemMapping> {
    let results = fan_out(product_ids, limit, cancel, |product_id| async move {
        (product_id, cancellable(cancel, client.item_id(product_id)).await)
    })
    .await;

    let mut output = StageOutput::default();
    for (product_id, result) in results {
        let item_id = match result {
            Ok(Some(item_id)) => Some(item_id),
            Ok(None) => {
                output.report(Some(StageIssue::new(
                    Stage::Resolve,
                    IssueKind::NotFound,
                    product_id,
                    format!("product {} has no item id", product_id),
                )));
                None
            }
            Err(e) => {
                output.report(StageIssue::from_fetch(Stage::Resolve, product_id, &e));
                None
            }
        };
        output.items.push(ItemMapping {
            product_id,
            item_id,
        });
    }
    output
}
