//! Menu Tree Module
//!
//! Turns the flat listings of a remote store into a navigable tree of menu
//! nodes. Oversized text and file listings are split into linked pages.
//!
//! ```text
//!   RemoteStore ──▶ TreeBuilder ──▶ Paginator ──▶ ordering ──▶ NodeTree
//!                        │                                        ▲
//!                        └──────────── recursion per folder ──────┘
//! ```

pub mod node;
pub mod store;
pub mod ordering;
pub mod paginator;
pub mod builder;

pub use node::{BackKind, BackMarker, ContentNode, IdAllocator, Link, NodeId};
pub use store::NodeTree;
pub use paginator::{PageOwner, Paginator};
pub use builder::TreeBuilder;
