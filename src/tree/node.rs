//! Menu node types and the id allocator.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique id of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mints node ids. Shared by the main tree and every search tree.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first id is `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Next id. Strictly increasing, never reused.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The id the next call to `next_id` will return
    pub fn peek(&self) -> NodeId {
        NodeId(self.next.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackKind {
    /// Pagination: back to the previous page of the same chain
    PreviousPage,
    /// Up to the owning folder
    Parent,
}

/// Non-addressable navigation marker. Pressing it opens `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackMarker {
    pub parent: NodeId,
    pub label: String,
    pub kind: BackKind,
}

impl BackMarker {
    pub fn previous_page(page: NodeId, label: impl Into<String>) -> Self {
        Self {
            parent: page,
            label: label.into(),
            kind: BackKind::PreviousPage,
        }
    }

    pub fn parent(parent: NodeId, label: impl Into<String>) -> Self {
        Self {
            parent,
            label: label.into(),
            kind: BackKind::Parent,
        }
    }
}

/// One navigable entry of a content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Link {
    /// A folder child; captioned with the child's label
    Child { id: NodeId },
    /// The following page of a pagination chain
    NextPage { id: NodeId },
    Back(BackMarker),
}

impl Link {
    pub fn child(id: NodeId) -> Self {
        Link::Child { id }
    }

    pub fn next_page(id: NodeId) -> Self {
        Link::NextPage { id }
    }

    /// The content node this entry opens
    pub fn target(&self) -> NodeId {
        match self {
            Link::Child { id } | Link::NextPage { id } => *id,
            Link::Back(marker) => marker.parent,
        }
    }

    /// The content node this entry owns in the tree, `None` for markers
    pub fn content_id(&self) -> Option<NodeId> {
        match self {
            Link::Child { id } | Link::NextPage { id } => Some(*id),
            Link::Back(_) => None,
        }
    }

    pub fn is_back(&self, kind: BackKind) -> bool {
        matches!(self, Link::Back(marker) if marker.kind == kind)
    }
}

/// A displayable menu node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentNode {
    pub id: NodeId,
    /// Button caption, empty for the root
    pub label: String,
    /// Owning node, `None` for tree roots
    pub parent: Option<NodeId>,
    /// Rendered text
    pub body: String,
    /// Ordered navigable entries
    pub entries: Vec<Link>,
}

impl ContentNode {
    pub fn new(id: NodeId, label: impl Into<String>, parent: Option<NodeId>, body: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            parent,
            body: body.into(),
            entries: Vec::new(),
        }
    }

    pub fn root(id: NodeId, body: impl Into<String>) -> Self {
        Self::new(id, "", None, body)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn next_page(&self) -> Option<NodeId> {
        self.entries.iter().find_map(|link| match link {
            Link::NextPage { id } => Some(*id),
            _ => None,
        })
    }

    pub fn previous_page(&self) -> Option<NodeId> {
        self.entries.iter().find_map(|link| match link {
            Link::Back(marker) if marker.kind == BackKind::PreviousPage => Some(marker.parent),
            _ => None,
        })
    }

    /// Body length in characters
    pub fn body_len(&self) -> usize {
        self.body.chars().count()
    }
}
