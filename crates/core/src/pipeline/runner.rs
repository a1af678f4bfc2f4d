//! Pipeline orchestrator.
//!
//! Runs the stages as four join barriers:
//! search -> resolve -> (dedup by item) -> discover -> (skip existing) -> download.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ScrapeConfig;
use crate::marketplace::{MarketplaceClient, PhotoRecord, PhotoSet, ProductId};

use super::dedup::select_owners;
use super::download::{download_all, sweep_partial_files};
use super::existing::{scan, ExistingFileIndex};
use super::photos::discover_photos;
use super::resolve::resolve_items;
use super::search::fetch_pages;
use super::types::{PipelineError, RunSummary};

/// Split discovered photos into records to download and a count of skipped ones.
///
/// Duplicate triples are scheduled once.
pub fn plan_downloads(sets: &[PhotoSet], existing: &ExistingFileIndex) -> (Vec<PhotoRecord>, usize) {
    let mut seen = HashSet::new();
    let mut scheduled = Vec::new();
    let mut skipped = 0;

    for record in sets.iter().flat_map(|set| set.records()) {
        if !seen.insert(record) {
            continue;
        }
        if existing.contains(&record) {
            skipped += 1;
        } else {
            scheduled.push(record);
        }
    }
    (scheduled, skipped)
}

/// One crawl of the marketplace for a single query.
pub struct PhotoPipeline {
    client: Arc<dyn MarketplaceClient>,
    config: ScrapeConfig,
    cancel: CancellationToken,
}

impl PhotoPipeline {
    /// Create a pipeline with its own cancellation token.
    pub fn new(client: Arc<dyn MarketplaceClient>, config: ScrapeConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Share an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts the run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    fn checkpoint(&self) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            warn!("Run cancelled");
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    /// Run every stage to completion and report the counts.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let config = &self.config;
        let client = self.client.as_ref();
        let cancel = &self.cancel;
        let limit = config.concurrency;

        fs::create_dir_all(&config.out_dir)
            .await
            .map_err(|source| PipelineError::OutputDir {
                path: config.out_dir.clone(),
                source,
            })?;

        let swept = sweep_partial_files(&config.out_dir)
            .await
            .map_err(|source| PipelineError::Scan {
                path: config.out_dir.clone(),
                source,
            })?;
        if swept > 0 {
            info!(removed = swept, "Removed partial downloads from an earlier run");
        }

        let mut summary = RunSummary::new(&config.query, config.pages);

        info!(query = %config.query, pages = config.pages, "Searching catalog");
        let search = fetch_pages(client, &config.query, config.pages, limit, cancel).await;
        self.checkpoint()?;
        summary.rows_found = search.items.len();
        summary.issues.extend(search.issues);

        let product_ids: Vec<ProductId> = search
            .items
            .iter()
            .map(|row| row.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        info!(
            rows = summary.rows_found,
            products = product_ids.len(),
            "Resolving item ids"
        );

        let resolved = resolve_items(client, product_ids, limit, cancel).await;
        self.checkpoint()?;
        summary.products_resolved = resolved.items.iter().filter(|m| m.item_id.is_some()).count();
        summary.issues.extend(resolved.issues);

        let owners = select_owners(&resolved.items);
        summary.unique_items = owners.len();
        info!(
            resolved = summary.products_resolved,
            items = owners.len(),
            "Discovering photos"
        );

        let discovered = discover_photos(client, &owners, limit, cancel).await;
        self.checkpoint()?;
        summary.items_with_photos = discovered.items.len();
        summary.issues.extend(discovered.issues);

        let existing = if config.skip_existing {
            scan(&config.out_dir, config.verify_existing)
                .await
                .map_err(|source| PipelineError::Scan {
                    path: config.out_dir.clone(),
                    source,
                })?
        } else {
            ExistingFileIndex::default()
        };

        let (scheduled, skipped) = plan_downloads(&discovered.items, &existing);
        summary.photos_scheduled = scheduled.len();
        summary.photos_skipped = skipped;
        info!(scheduled = scheduled.len(), skipped, "Downloading photos");

        let outcome = download_all(client, scheduled, &config.out_dir, limit, cancel).await;
        self.checkpoint()?;
        summary.photos_downloaded = outcome.output.items.len();
        summary.photos_failed = outcome.failed;
        summary.issues.extend(outcome.output.issues);

        summary.finished_at = Some(Utc::now());
        info!(
            scheduled = summary.photos_scheduled,
            skipped = summary.photos_skipped,
            downloaded = summary.photos_downloaded,
            failed = summary.photos_failed,
            "Run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::ItemOwner;

    fn set(product_id: u64, item_id: u64, photos: Vec<u64>) -> PhotoSet {
        PhotoSet {
            owner: ItemOwner {
                product_id,
                item_id,
            },
            photos,
        }
    }

    #[test]
    fn test_plan_skips_existing() {
        let mut existing = ExistingFileIndex::new();
        existing.insert(PhotoRecord {
            product_id: 100,
            item_id: 999,
            photo_id: 1001,
        });

        let (scheduled, skipped) = plan_downloads(&[set(100, 999, vec![1001, 1002])], &existing);

        assert_eq!(skipped, 1);
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].photo_id, 1002);
    }

    #[test]
    fn test_plan_existing_under_other_owner_is_not_skipped() {
        let mut existing = ExistingFileIndex::new();
        existing.insert(PhotoRecord {
            product_id: 200,
            item_id: 999,
            photo_id: 1001,
        });

        let (scheduled, skipped) = plan_downloads(&[set(100, 999, vec![1001])], &existing);

        assert_eq!(skipped, 0);
        assert_eq!(scheduled.len(), 1);
    }

    #[test]
    fn test_plan_deduplicates_triples() {
        let (scheduled, skipped) =
            plan_downloads(&[set(100, 999, vec![1001, 1001, 1002])], &ExistingFileIndex::new());
        assert_eq!(skipped, 0);
        assert_eq!(scheduled.len(), 2);
    }
}
