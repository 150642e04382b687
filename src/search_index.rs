//! Search Index - per-requester search result trees
//!
//! Every search builds a small standalone tree (a root plus file pages) and
//! caches it under the requester that asked, replacing that requester's
//! previous result. Ids come from the same allocator as the main tree, so
//! they never collide with main tree ids or other live search trees.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Limits;
use crate::providers::{RemoteStore, StoreError};
use crate::strings::Strings;
use crate::token::RequesterId;
use crate::tree::{ContentNode, IdAllocator, NodeId, NodeTree, PageOwner, Paginator};

pub struct SearchIndex {
    ids: Arc<IdAllocator>,
    strings: Strings,
    limits: Limits,
    /// Map of requester -> latest search result tree
    cache: RwLock<HashMap<RequesterId, Arc<NodeTree>>>,
}

impl SearchIndex {
    pub fn new(ids: Arc<IdAllocator>, strings: Strings, limits: Limits) -> Self {
        Self {
            ids,
            strings,
            limits,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Run a search for `requester` and cache the result tree.
    /// Zero matches still yield a valid root with the "not found" body.
    pub async fn search<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        requester: RequesterId,
        predicate: &str,
    ) -> Result<Arc<NodeTree>, StoreError> {
        let files = store.find_files(predicate).await?;
        info!("Search '{}' for {} matched {} files", predicate, requester, files.len());

        let root = ContentNode::new(
            self.ids.next_id(),
            self.strings.find.clone(),
            None,
            self.strings.search_body(!files.is_empty()),
        );
        let owner = PageOwner::of(&root);
        let pages = Paginator::new(&self.ids, &self.strings, self.limits).file_chain(root, &owner, &files);

        let mut pages = pages.into_iter();
        let Some(root) = pages.next() else {
            return Err(StoreError::Other("Search produced no root page".to_string()));
        };
        let mut tree = NodeTree::with_root(root);
        for page in pages {
            tree.insert(page);
        }

        let tree = Arc::new(tree);
        self.cache.write().await.insert(requester, tree.clone());
        Ok(tree)
    }

    /// Latest result tree of `requester`
    pub async fn tree(&self, requester: RequesterId) -> Option<Arc<NodeTree>> {
        self.cache.read().await.get(&requester).cloned()
    }

    /// Find `id` inside the cached tree of `requester`
    pub async fn lookup(&self, requester: RequesterId, id: NodeId) -> Option<(Arc<NodeTree>, ContentNode)> {
        let Some(tree) = self.tree(requester).await else {
            debug!("No search results cached for {}", requester);
            return None;
        };
        let node = tree.lookup(id)?.clone();
        Some((tree, node))
    }

    /// Number of requesters with cached results
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MemoryStore, RemoteItem};
    use std::collections::HashSet;

    fn index() -> SearchIndex {
        SearchIndex::new(Arc::new(IdAllocator::starting_at(1)), Strings::default(), Limits::default())
    }

    fn store() -> MemoryStore {
        let files = (0..8).map(|i| RemoteItem::file(format!("Song {}", i), "audio/mpeg", format!("https://x/{}", i)));
        MemoryStore::new().with_root(files.collect())
    }

    #[tokio::test]
    async fn test_no_matches_gives_not_found_root() {
        let index = index();
        let tree = index.search(&store(), 42, "xyz").await.unwrap();

        let root = tree.root();
        assert_eq!(root.body, Strings::default().search_body(false));
        assert_eq!(root.label, "Find");
        assert!(root.entries.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn test_matches_are_paginated() {
        let index = index();
        let tree = index.search(&store(), 42, "song").await.unwrap();

        let root = tree.root();
        assert!(root.body.starts_with(&Strings::default().search_body(true)));
        assert_eq!(root.body.matches("• ").count(), 6);
        assert!(root.parent.is_none());

        let page = tree.lookup(root.next_page().unwrap()).unwrap();
        assert_eq!(page.body.matches("• ").count(), 2);
        assert_eq!(page.previous_page(), Some(root.id));
        assert!(!page.entries.iter().any(|l| l.is_back(crate::tree::BackKind::Parent)));
    }

    #[tokio::test]
    async fn test_new_search_replaces_previous_result() {
        let index = index();
        let first = index.search(&store(), 42, "song 1").await.unwrap();
        let second = index.search(&store(), 42, "xyz").await.unwrap();

        assert_eq!(index.len().await, 1);
        assert!(index.lookup(42, first.root_id()).await.is_none());
        let (_, node) = index.lookup(42, second.root_id()).await.unwrap();
        assert_eq!(node.body, Strings::default().search_body(false));
    }

    #[tokio::test]
    async fn test_lookup_unknown_requester_is_none() {
        let index = index();
        let tree = index.search(&store(), 42, "song").await.unwrap();
        assert!(index.lookup(7, tree.root_id()).await.is_none());
        assert!(index.lookup(42, NodeId(9999)).await.is_none());
    }

    #[tokio::test]
    async fn test_ids_unique_across_live_trees() {
        let index = index();
        let a = index.search(&store(), 1, "song").await.unwrap();
        let b = index.search(&store(), 2, "song").await.unwrap();

        let ids: Vec<NodeId> = a.walk().iter().chain(b.walk().iter()).map(|n| n.id).collect();
        let unique: HashSet<NodeId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
    }

    #[tokio::test]
    async fn test_store_error_keeps_cache() {
        let index = index();
        let store = store();
        index.search(&store, 42, "song").await.unwrap();
        store.set_offline(true);

        assert!(index.search(&store, 42, "song").await.is_err());
        assert!(index.tree(42).await.is_some());
    }
}
