//! Catalog search stage: pages 1..=N fetched concurrently.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::marketplace::{MarketplaceClient, SearchResultRow};

use super::fanout::{cancellable, fan_out};
use super::types::{IssueKind, Stage, StageIssue, StageOutput};

/// Fetch every search page and concatenate their rows.
///
/// Row order across pages is unspecified. A failed page contributes no rows
/// and one issue; a page without products yields a `ZeroResults` issue.
pub async fn fetch_pages(
    client: &dyn MarketplaceClient,
    query: &str,
    pages: u32,
    limit: usize,
    cancel: &CancellationToken,
) -> StageOutput<SearchResultRow> {
    let results = fan_out(1..=pages, limit, cancel, |page| async move {
        (page, cancellable(cancel, client.search_page(query, page)).await)
    })
    .await;

    let mut output = StageOutput::default();
    for (page, result) in results {
        match result {
            Ok(search_page) => {
                debug!(page, rows = search_page.rows.len(), "Search page fetched");
                if search_page.rows.is_empty() && search_page.rejected.is_empty() {
                    output.report(Some(StageIssue::new(
                        Stage::Search,
                        IssueKind::ZeroResults,
                        u64::from(page),
                        format!("zero products on page {}", page),
                    )));
                }
                for rejected in &search_page.rejected {
                    output.report(StageIssue::from_fetch(Stage::Search, u64::from(page), rejected));
                }
                output.items.extend(search_page.rows);
            }
            Err(e) => {
                output.report(StageIssue::from_fetch(Stage::Search, u64::from(page), &e));
            }
        }
    }
    output
}
