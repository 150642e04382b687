//! Tree Builder
//!
//! Walks the remote hierarchy depth first and produces a complete, new
//! `NodeTree` generation. Nothing is shared with the previous generation
//! except the root id, so a failed build leaves the live tree untouched.

use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use crate::config::Limits;
use crate::providers::{RemoteFile, RemoteItem, RemoteStore, StoreError, ROOT_SOURCE_ID};
use crate::strings::Strings;

use super::node::{BackMarker, ContentNode, IdAllocator, Link, NodeId};
use super::paginator::{PageOwner, Paginator};
use super::store::NodeTree;

pub struct TreeBuilder<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    ids: &'a IdAllocator,
    strings: &'a Strings,
    limits: Limits,
}

impl<'a, S: RemoteStore + ?Sized> TreeBuilder<'a, S> {
    pub fn new(store: &'a S, ids: &'a IdAllocator, strings: &'a Strings, limits: Limits) -> Self {
        Self {
            store,
            ids,
            strings,
            limits,
        }
    }

    /// Build a full generation under a root with the given id
    pub async fn build(&self, root_id: NodeId) -> Result<NodeTree, StoreError> {
        let root = ContentNode::root(root_id, self.strings.main_body());
        let mut tree = NodeTree::with_root(root.clone());
        self.populate(&mut tree, root, ROOT_SOURCE_ID).await?;
        Ok(tree)
    }

    /// Fill `node` with the content under `source_id` and install it, its
    /// subfolders and its pages into `tree`.
    pub fn populate<'b>(
        &'b self,
        tree: &'b mut NodeTree,
        mut node: ContentNode,
        source_id: &'b str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'b>> {
        Box::pin(async move {
            let items = self.store.list_entries(source_id).await?;
            debug!("Populating node {} from '{}' ({} items)", node.id, source_id, items.len());

            let mut entries = Vec::new();
            for item in &items {
                if let RemoteItem::Folder { name, source_id } = item {
                    let child = ContentNode::new(
                        self.ids.next_id(),
                        name.clone(),
                        Some(node.id),
                        self.strings.folder_body(name),
                    );
                    entries.push(Link::child(child.id));
                    self.populate(tree, child, source_id).await?;
                }
            }
            if let Some(parent) = node.parent {
                entries.push(Link::Back(BackMarker::parent(parent, &self.strings.back)));
            }
            node.entries = entries;

            let owner = PageOwner::of(&node);
            let paginator = Paginator::new(self.ids, self.strings, self.limits);

            let mut text_pages = paginator.text_chain(node, &owner, &items);
            let continuation = match text_pages.pop() {
                Some(page) => page,
                None => return Ok(()),
            };

            let files: Vec<RemoteFile> = items
                .into_iter()
                .filter_map(|item| match item {
                    RemoteItem::File(file) => Some(file),
                    _ => None,
                })
                .collect();
            let file_pages = paginator.file_chain(continuation, &owner, &files);

            for page in text_pages.into_iter().chain(file_pages) {
                tree.insert(page);
            }
            Ok(())
        })
    }
}
