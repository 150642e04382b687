//! In-memory remote store
//!
//! Holds a folder map keyed by source id. Used as the fixture for the menu
//! tree tests and for demos without network access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::{RemoteFile, RemoteItem, RemoteStore, StoreError, ROOT_SOURCE_ID};

/// Remote store backed by a `HashMap<source_id, items>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    folders: RwLock<HashMap<String, Vec<RemoteItem>>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: set the items under `source_id`.
    pub fn with_items(self, source_id: impl Into<String>, items: Vec<RemoteItem>) -> Self {
        self.set_items(source_id, items);
        self
    }

    /// Builder-style: set the items of the root folder.
    pub fn with_root(self, items: Vec<RemoteItem>) -> Self {
        self.with_items(ROOT_SOURCE_ID, items)
    }

    /// Replace the items under `source_id`.
    pub fn set_items(&self, source_id: impl Into<String>, items: Vec<RemoteItem>) {
        let mut folders = self.folders.write().unwrap_or_else(|e| e.into_inner());
        folders.insert(source_id.into(), items);
    }

    /// Simulate a network outage: every call fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionFailed("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_entries(&self, source_id: &str) -> Result<Vec<RemoteItem>, StoreError> {
        self.check_online()?;
        let folders = self.folders.read().unwrap_or_else(|e| e.into_inner());
        // Unknown folders are empty, like a freshly created remote folder
        Ok(folders.get(source_id).cloned().unwrap_or_default())
    }

    async fn find_files(&self, predicate: &str) -> Result<Vec<RemoteFile>, StoreError> {
        self.check_online()?;
        let needle = predicate.to_lowercase();
        let folders = self.folders.read().unwrap_or_else(|e| e.into_inner());

        let mut source_ids: Vec<&String> = folders.keys().collect();
        source_ids.sort();

        Ok(source_ids
            .into_iter()
            .flat_map(|id| folders[id].iter())
            .filter_map(|item| match item {
                RemoteItem::File(file) if file.name.to_lowercase().contains(&needle) => {
                    Some(file.clone())
                }
                _ => None,
            })
            .collect())
    }

    fn display_name(&self) -> String {
        "memory".to_string()
    }
}
