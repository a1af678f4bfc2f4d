//! Inventory of photos already present in the output directory.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tokio::fs;
use tracing::debug;

use crate::marketplace::{ItemId, PhotoId, PhotoRecord, ProductId, PHOTO_EXTENSION};

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Photo ids on disk, keyed by (product id, item id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingFileIndex {
    entries: HashMap<(ProductId, ItemId), HashSet<PhotoId>>,
}

impl ExistingFileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: PhotoRecord) {
        self.entries
            .entry((record.product_id, record.item_id))
            .or_default()
            .insert(record.photo_id);
    }

    pub fn contains(&self, record: &PhotoRecord) -> bool {
        self.entries
            .get(&(record.product_id, record.item_id))
            .is_some_and(|photos| photos.contains(&record.photo_id))
    }

    /// Photo ids present for one (product, item) pair.
    pub fn photos_for(&self, product_id: ProductId, item_id: ItemId) -> Option<&HashSet<PhotoId>> {
        self.entries.get(&(product_id, item_id))
    }

    /// Total number of indexed photos.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read the identity triple out of a photo file name.
///
/// The name must contain exactly three digit runs, taken in
/// product, item, photo order. Anything else is not ours.
pub fn parse_file_name(name: &str) -> Option<PhotoRecord> {
    let mut numbers = DIGIT_RUN.find_iter(name).map(|m| m.as_str().parse::<u64>());
    let product_id = numbers.next()?.ok()?;
    let item_id = numbers.next()?.ok()?;
    let photo_id = numbers.next()?.ok()?;
    if numbers.next().is_some() {
        return None;
    }
    Some(PhotoRecord {
        product_id,
        item_id,
        photo_id,
    })
}

/// Index the `*.jpg` files of `out_dir`.
///
/// A missing directory yields an empty index. With `skip_empty`, zero-length
/// files are not counted as downloaded.
pub async fn scan(out_dir: &Path, skip_empty: bool) -> std::io::Result<ExistingFileIndex> {
    let mut index = ExistingFileIndex::new();

    let mut entries = match fs::read_dir(out_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(index),
        Err(e) => return Err(e),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(PHOTO_EXTENSION) {
            continue;
        }
        let Some(record) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_file_name)
        else {
            continue;
        };

        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        if skip_empty && metadata.len() == 0 {
            debug!(path = %path.display(), "Ignoring empty photo file");
            continue;
        }
        index.insert(record);
    }

    debug!(dir = %out_dir.display(), photos = index.len(), "Scanned existing output");
    Ok(index)
}
