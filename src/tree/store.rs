//! Node arena of one menu tree generation.

use std::collections::{HashMap, HashSet};

use super::node::{ContentNode, NodeId};

/// Arena of content nodes addressed by id. Parents and entries refer to
/// other nodes by id only.
#[derive(Debug, Clone)]
pub struct NodeTree {
    root: NodeId,
    nodes: HashMap<NodeId, ContentNode>,
}

impl NodeTree {
    pub fn with_root(root: ContentNode) -> Self {
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self { root: root_id, nodes }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &ContentNode {
        // Only `insert` mutates the arena and it never removes the root
        &self.nodes[&self.root]
    }

    /// Direct arena access, reachable or not
    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.nodes.get(&id)
    }

    /// Insert or replace a node
    pub fn insert(&mut self, node: ContentNode) {
        self.nodes.insert(node.id, node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ContentNode> {
        self.nodes.values()
    }

    /// Depth-first search from the root over content entries, in entry
    /// order. Back markers are never followed. Returns the first match.
    pub fn lookup(&self, id: NodeId) -> Option<&ContentNode> {
        let mut stack = vec![self.root];
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.entries.iter().rev().filter_map(|link| link.content_id()));
        }
        None
    }

    /// Nodes reachable from the root, in depth-first entry order
    pub fn walk(&self) -> Vec<&ContentNode> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(&current) {
                order.push(node);
                stack.extend(node.entries.iter().rev().filter_map(|link| link.content_id()));
            }
        }
        order
    }
}
