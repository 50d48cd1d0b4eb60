//! In-memory vector store
//!
//! Process-lifetime map from photo identity to its [`IndexEntry`]. Handles are
//! cheap to clone and share one underlying map. The expected discipline is a
//! single writer (the active ingestion run) and any number of readers; entries
//! are replaced whole and never mutated in place, so readers see either the old
//! or the new entry.

use super::models::IndexEntry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    entries: Arc<DashMap<String, Arc<IndexEntry>>>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Arc<IndexEntry>> {
        self.entries.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Insert or replace the entry for `id`
    pub fn put(&self, id: impl Into<String>, entry: IndexEntry) {
        self.entries.insert(id.into(), Arc::new(entry));
    }

    /// Snapshot of every entry at the time of the call
    pub fn all_entries(&self) -> Vec<(String, Arc<IndexEntry>)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
