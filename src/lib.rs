// Drive Menu - paginated button menus over a remote file store
// Mirrors a folder hierarchy into a tree of message-sized pages with
// navigation buttons, plus per-requester file search.

pub mod config;
pub mod content_provider;
pub mod providers;
pub mod search_index;
pub mod strings;
pub mod sync_scheduler;
pub mod token;
pub mod tree;

pub use config::{AppConfig, ConfigError, Limits};
pub use content_provider::{Button, ContentProvider, NodeSnapshot, NodeView, SyncReport};
pub use providers::{RemoteFile, RemoteItem, RemoteStore, StoreError};
pub use search_index::SearchIndex;
pub use strings::Strings;
pub use token::{RequesterId, Target, TokenError, TreeScope};
pub use tree::{ContentNode, NodeId, NodeTree};
