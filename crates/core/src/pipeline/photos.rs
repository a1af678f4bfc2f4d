//! Photo discovery stage: item id to photo ids.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::marketplace::{ItemOwner, MarketplaceClient, PhotoSet};

use super::fanout::{cancellable, fan_out};
use super::types::{Stage, StageIssue, StageOutput};

/// List photos for every owned item concurrently.
///
/// Exactly one feedback-list call per owner. Items with no photos, and items
/// whose listing failed, are left out of the output.
pub async fn discover_photos(
    client: &dyn MarketplaceClient,
    owners: &[ItemOwner],
    limit: usize,
    cancel: &CancellationToken,
) -> StageOutput<PhotoSet> {
    let results = fan_out(owners.iter().copied(), limit, cancel, |owner| async move {
        (owner, cancellable(cancel, client.photo_ids(owner.item_id)).await)
    })
    .await;

    let mut output = StageOutput::default();
    for (owner, result) in results {
        match result {
            Ok(photos) if photos.is_empty() => {
                debug!(item_id = owner.item_id, "Item has no photos");
            }
            Ok(photos) => output.items.push(PhotoSet { owner, photos }),
            Err(e) => output.report(StageIssue::from_fetch(Stage::Discover, owner.item_id, &e)),
        }
    }
    output
}
