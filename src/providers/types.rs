//! Shared types for remote stores
//!
//! This module contains the types every store produces: the items found
//! under a folder and the error type returned when the store cannot answer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source id understood by every store as "the configured root folder".
pub const ROOT_SOURCE_ID: &str = "";

/// Name of the text document that is split into text pages.
pub const TEXT_FILE_NAME: &str = "index.txt";

/// Separator between pages inside a text document.
pub const TEXT_PAGE_SEPARATOR: &str = "\n\n---***---\n\n";

/// A downloadable file as seen by the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Display name
    pub name: String,
    /// MIME type reported by the store
    pub mime_type: String,
    /// Download link rendered into the page body
    pub url: String,
}

impl RemoteFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            url: url.into(),
        }
    }
}

/// One item directly under a remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteItem {
    /// A subfolder, expanded recursively by the tree builder
    Folder { name: String, source_id: String },
    /// A downloadable file
    File(RemoteFile),
    /// One page of the folder's text document
    TextPage { page_number: u32, body: String },
}

impl RemoteItem {
    pub fn folder(name: impl Into<String>, source_id: impl Into<String>) -> Self {
        RemoteItem::Folder {
            name: name.into(),
            source_id: source_id.into(),
        }
    }

    pub fn file(name: impl Into<String>, mime_type: impl Into<String>, url: impl Into<String>) -> Self {
        RemoteItem::File(RemoteFile::new(name, mime_type, url))
    }

    pub fn text_page(page_number: u32, body: impl Into<String>) -> Self {
        RemoteItem::TextPage {
            page_number,
            body: body.into(),
        }
    }
}

/// Split a text document into numbered text pages.
pub fn split_text_document(content: &str) -> Vec<RemoteItem> {
    content
        .split(TEXT_PAGE_SEPARATOR)
        .enumerate()
        .map(|(index, body)| RemoteItem::text_page(index as u32, body))
        .collect()
}

/// Remote store error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Check if this error is recoverable (a later sync may succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionFailed(_) | StoreError::ServerError(_) | StoreError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_text_document_numbers_pages() {
        let content = format!("verse{}chorus{}bridge", TEXT_PAGE_SEPARATOR, TEXT_PAGE_SEPARATOR);
        let pages = split_text_document(&content);
        assert_eq!(
            pages,
            vec![
                RemoteItem::text_page(0, "verse"),
                RemoteItem::text_page(1, "chorus"),
                RemoteItem::text_page(2, "bridge"),
            ]
        );
    }

    #[test]
    fn test_split_text_document_without_separator() {
        let pages = split_text_document("single page");
        assert_eq!(pages, vec![RemoteItem::text_page(0, "single page")]);
    }

    #[test]
    fn test_store_error_recoverable() {
        assert!(StoreError::ConnectionFailed("reset".into()).is_recoverable());
        assert!(!StoreError::AuthenticationFailed("bad token".into()).is_recoverable());
        assert!(!StoreError::NotFound("x".into()).is_recoverable());
    }
}
