//! Remote Stores Module
//!
//! This module provides the abstraction over the remote file store the menu
//! tree is built from. All stores implement the `RemoteStore` trait, so the
//! tree builder and the search index work the same against Google Drive, a
//! local folder or an in-memory fixture.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              RemoteStore Trait              │
//! │         list_entries, find_files            │
//! └─────────────────────────────────────────────┘
//!                      │
//!         ┌────────────┼─────────────┐
//!         ▼            ▼             ▼
//!    ┌────────┐ ┌─────────────┐ ┌────────┐
//!    │ Memory │ │ LocalFolder │ │ GDrive │
//!    └────────┘ └─────────────┘ └────────┘
//! ```

pub mod types;
pub mod http_retry;
pub mod memory;
pub mod local_folder;
pub mod google_drive;
pub mod oauth2;

pub use types::*;
pub use memory::MemoryStore;
pub use local_folder::LocalFolderStore;
pub use google_drive::{DriveAuth, GoogleDriveConfig, GoogleDriveStore};
pub use self::oauth2::{OAuthCredentials, TokenSource};

use async_trait::async_trait;

/// Unified remote store trait
///
/// Stores own their own timeout and retry policy. Errors are returned to the
/// caller of `sync`/`search` untouched.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Items directly under `source_id`. An empty id means the configured root.
    async fn list_entries(&self, source_id: &str) -> Result<Vec<RemoteItem>, StoreError>;

    /// Files whose name matches `predicate`. Non-recursive, folders excluded.
    async fn find_files(&self, predicate: &str) -> Result<Vec<RemoteFile>, StoreError>;

    /// Display name for logs
    fn display_name(&self) -> String {
        "remote store".to_string()
    }
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    async fn list_entries(&self, source_id: &str) -> Result<Vec<RemoteItem>, StoreError> {
        (**self).list_entries(source_id).await
    }

    async fn find_files(&self, predicate: &str) -> Result<Vec<RemoteFile>, StoreError> {
        (**self).find_files(predicate).await
    }

    fn display_name(&self) -> String {
        (**self).display_name()
    }
}
