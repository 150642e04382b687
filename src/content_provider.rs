//! Content Provider - live menu tree and search results
//!
//! Owns the current generation of the main menu tree and the search cache.
//! `sync` rebuilds the tree off to the side and swaps it in only when the
//! build succeeds, so readers always see a complete generation.
//!
//! ```text
//!   resolve("1_7") ──► Target::Normal ──► main tree snapshot ──► NodeView
//!   resolve("2_7_42") ► Target::Search ─► search cache[42] ───► NodeView
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, Limits};
use crate::providers::{RemoteStore, StoreError};
use crate::search_index::SearchIndex;
use crate::strings::Strings;
use crate::token::{RequesterId, Target, TreeScope};
use crate::tree::{ContentNode, IdAllocator, Link, NodeId, NodeTree, PageOwner, Paginator, TreeBuilder};

/// A button under a rendered node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub target: Target,
}

impl Button {
    /// Token to attach to the button
    pub fn token(&self) -> String {
        self.target.encode()
    }
}

/// Serializable copy of a rendered node
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub token: String,
    pub node: ContentNode,
    pub buttons: Vec<Button>,
}

/// A node together with the tree generation it was read from
#[derive(Debug, Clone)]
pub struct NodeView {
    tree: Arc<NodeTree>,
    node: ContentNode,
    scope: TreeScope,
}

impl NodeView {
    fn new(tree: Arc<NodeTree>, node: ContentNode, scope: TreeScope) -> Self {
        Self { tree, node, scope }
    }

    pub fn node(&self) -> &ContentNode {
        &self.node
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn label(&self) -> &str {
        &self.node.label
    }

    pub fn body(&self) -> &str {
        &self.node.body
    }

    pub fn scope(&self) -> TreeScope {
        self.scope
    }

    /// Target that reopens this node
    pub fn target(&self) -> Target {
        self.scope.target(self.node.id)
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            token: self.target().encode(),
            node: self.node.clone(),
            buttons: self.buttons(),
        }
    }

    /// Buttons in entry order. Back markers point at their parent; every
    /// other entry is captioned with the label of the node it opens.
    pub fn buttons(&self) -> Vec<Button> {
        self.node
            .entries
            .iter()
            .filter_map(|link| {
                let label = match link {
                    Link::Child { id } | Link::NextPage { id } => self.tree.get(*id)?.label.clone(),
                    Link::Back(marker) => marker.label.clone(),
                };
                Some(Button {
                    label,
                    target: self.scope.target(link.target()),
                })
            })
            .collect()
    }
}

/// Outcome of a completed sync
#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    pub nodes: usize,
    pub generation: u64,
    pub finished_at: DateTime<Utc>,
}

pub struct ContentProvider {
    store: Arc<dyn RemoteStore>,
    ids: Arc<IdAllocator>,
    strings: Strings,
    limits: Limits,
    root_id: NodeId,
    tree: RwLock<Arc<NodeTree>>,
    /// Serialises `sync` calls
    sync_guard: Mutex<()>,
    search: SearchIndex,
    last_sync: RwLock<Option<DateTime<Utc>>>,
    generation: AtomicU64,
}

impl ContentProvider {
    /// Create a provider with only the root node. Call `sync` to fill it.
    pub fn new(store: Arc<dyn RemoteStore>, config: &AppConfig) -> Self {
        Self::with_id_allocator(store, config, Arc::new(IdAllocator::new()))
    }

    pub fn with_id_allocator(store: Arc<dyn RemoteStore>, config: &AppConfig, ids: Arc<IdAllocator>) -> Self {
        let root_id = ids.next_id();
        let root = ContentNode::root(root_id, config.strings.main_body());
        let owner = PageOwner::of(&root);
        let mut pages = Paginator::new(&ids, &config.strings, config.limits)
            .chain(root, &owner, &[])
            .into_iter();
        let mut tree = NodeTree::with_root(pages.next().unwrap_or_else(|| ContentNode::root(root_id, "")));
        for page in pages {
            tree.insert(page);
        }
        Self {
            search: SearchIndex::new(ids.clone(), config.strings.clone(), config.limits),
            store,
            ids,
            strings: config.strings.clone(),
            limits: config.limits,
            root_id,
            tree: RwLock::new(Arc::new(tree)),
            sync_guard: Mutex::new(()),
            last_sync: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a provider and run the first sync
    pub async fn start(store: Arc<dyn RemoteStore>, config: &AppConfig) -> Result<Self, StoreError> {
        let provider = Self::new(store, config);
        provider.sync().await?;
        Ok(provider)
    }

    /// Snapshot of the current main tree
    pub async fn tree(&self) -> Arc<NodeTree> {
        self.tree.read().await.clone()
    }

    pub async fn root(&self) -> NodeView {
        let tree = self.tree().await;
        let root = tree.root().clone();
        NodeView::new(tree, root, TreeScope::Main)
    }

    /// Rebuild the main tree from the store and swap it in.
    /// On error the previous generation stays live.
    pub async fn sync(&self) -> Result<SyncReport, StoreError> {
        let _guard = self.sync_guard.lock().await;
        info!("Sync started from {}", self.store.display_name());

        let builder = TreeBuilder::new(self.store.as_ref(), &self.ids, &self.strings, self.limits);
        let tree = match builder.build(self.root_id).await {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Sync failed, keeping previous tree: {}", e);
                return Err(e);
            }
        };

        let nodes = tree.len();
        *self.tree.write().await = Arc::new(tree);

        let finished_at = Utc::now();
        *self.last_sync.write().await = Some(finished_at);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!("Sync finished: {} nodes, generation {}", nodes, generation);
        Ok(SyncReport {
            nodes,
            generation,
            finished_at,
        })
    }

    /// Search file names and cache the result for `requester`
    pub async fn search(&self, requester: RequesterId, predicate: &str) -> Result<NodeView, StoreError> {
        let tree = self.search.search(self.store.as_ref(), requester, predicate).await?;
        let root = tree.root().clone();
        Ok(NodeView::new(tree, root, TreeScope::Search(requester)))
    }

    /// Look up a decoded target. Stale or unknown ids give `None`.
    pub async fn get(&self, target: Target) -> Option<NodeView> {
        match target {
            Target::Normal { id } => {
                let tree = self.tree().await;
                let node = tree.lookup(id)?.clone();
                Some(NodeView::new(tree, node, TreeScope::Main))
            }
            Target::Search { id, requester } => {
                let (tree, node) = self.search.lookup(requester, id).await?;
                Some(NodeView::new(tree, node, TreeScope::Search(requester)))
            }
        }
    }

    /// Decode a button token and look it up. Malformed tokens give `None`.
    pub async fn resolve(&self, token: &str) -> Option<NodeView> {
        match token.parse::<Target>() {
            Ok(target) => self.get(target).await,
            Err(e) => {
                debug!("Ignoring token {:?}: {}", token, e);
                None
            }
        }
    }

    pub fn serialize(&self, target: Target) -> String {
        target.encode()
    }

    /// Time the last successful sync finished
    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.read().await
    }

    /// Number of completed syncs
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn search_index(&self) -> &SearchIndex {
        &self.search
    }
}
