//! Deterministic routing of ids to the marketplace's sharded hosts.
//!
//! Every URL is derived from the id alone:
//! - `volume = id / 100_000`, `part = id / 1_000` shard the CDN paths
//! - the volume picks a `basket-NN` host (product cards) or a
//!   `feedbackNN` host (photo binaries) from a static range table
//! - the feedback list lives on `feedbacks1` or `feedbacks2`, chosen by a
//!   CRC-16 of the item id

mod checksum;
mod tables;

pub use checksum::{checksum16, feedback_bucket};
pub use tables::{lookup, ShardRange, BASKET_SHARDS, FEEDBACK_SHARDS};

use serde::{Deserialize, Serialize};

/// Domain of the sharded content hosts.
pub const CDN_DOMAIN: &str = "wbbasket.ru";

/// Domain of the feedback-list API.
pub const FEEDBACK_LIST_DOMAIN: &str = "wb.ru";

/// Which resource a URL addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKind {
    /// Product card JSON (carries the item id).
    ProductInfo,
    /// Feedback list JSON (carries the photo ids).
    FeedbackList,
    /// Raw photo bytes.
    PhotoBinary,
}

/// Coarse CDN grouping of an id.
pub fn volume(id: u64) -> u64 {
    id / 100_000
}

/// Fine CDN grouping of an id.
pub fn part(id: u64) -> u64 {
    id / 1_000
}

/// Base URL of the card host for `id`.
pub fn info_host(id: u64) -> String {
    format!(
        "https://basket-{}.{}",
        lookup(BASKET_SHARDS, volume(id)),
        CDN_DOMAIN
    )
}

/// Base URL of the feedback host for `id`.
pub fn feedback_host(id: u64) -> String {
    format!(
        "https://feedback{}.{}",
        lookup(FEEDBACK_SHARDS, volume(id)),
        CDN_DOMAIN
    )
}

/// Base URL of the host serving photo `id`.
///
/// Photos are stored on the feedback shards.
pub fn photo_host(id: u64) -> String {
    feedback_host(id)
}

/// Base URL of the host serving resource `kind` for `id`.
pub fn resource_host(id: u64, kind: UrlKind) -> String {
    match kind {
        UrlKind::ProductInfo => info_host(id),
        UrlKind::PhotoBinary => photo_host(id),
        UrlKind::FeedbackList => format!(
            "https://feedbacks{}.{}",
            feedback_bucket(id),
            FEEDBACK_LIST_DOMAIN
        ),
    }
}

/// Path of resource `kind` for `id`, starting with `/`.
pub fn resource_path(id: u64, kind: UrlKind) -> String {
    match kind {
        UrlKind::ProductInfo => format!(
            "/vol{}/part{}/{}/info/ru/card.json",
            volume(id),
            part(id),
            id
        ),
        UrlKind::PhotoBinary => format!("/vol{}/part{}/{}/photos/fs.jpg", volume(id), part(id), id),
        UrlKind::FeedbackList => format!("/feedbacks/v1/{}", id),
    }
}

/// Full URL of resource `kind` for `id`.
pub fn build_url(id: u64, kind: UrlKind) -> String {
    format!("{}{}", resource_host(id, kind), resource_path(id, kind))
}
