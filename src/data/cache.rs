use std::collections::HashMap;

use super::model::BookDataset;
use super::source::SourceKey;

/// Per-session memo of fetched datasets, keyed by fetch parameters.
///
/// Entries are never invalidated; a new session starts with a new cache.
/// Only successful, non-empty fetches are stored.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<SourceKey, BookDataset>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SourceKey) -> Option<&BookDataset> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: SourceKey, dataset: BookDataset) {
        self.entries.insert(key, dataset);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
