//! Local folder store
//!
//! Treats a directory on disk as the remote source: subdirectories become
//! folders, `index.txt` becomes text pages and every other file becomes a
//! downloadable file with a `file://` link.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::{
    split_text_document, RemoteFile, RemoteItem, RemoteStore, StoreError, TEXT_FILE_NAME,
};

/// Remote store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalFolderStore {
    root: PathBuf,
}

impl LocalFolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a source id (path relative to the root) to a directory.
    /// Rejects absolute paths and `..` traversal.
    fn resolve(&self, source_id: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(source_id);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(StoreError::InvalidConfig(format!("Invalid source id: {}", source_id))),
            }
        }
        Ok(self.root.join(relative))
    }

    fn source_id_for(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn file_url(path: &Path) -> Result<String, StoreError> {
        let absolute = std::path::absolute(path)?;
        url::Url::from_file_path(&absolute)
            .map(|u| u.to_string())
            .map_err(|_| StoreError::Other(format!("Cannot build file URL for {}", absolute.display())))
    }

    fn to_remote_file(path: &Path, name: String) -> Result<RemoteFile, StoreError> {
        let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
        Ok(RemoteFile {
            name,
            mime_type,
            url: Self::file_url(path)?,
        })
    }

    /// Visible directory entries sorted by name.
    async fn read_sorted(dir: &Path) -> Result<Vec<(String, PathBuf, bool)>, StoreError> {
        let mut reader = tokio::fs::read_dir(dir).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(dir.display().to_string()),
            _ => StoreError::Io(e),
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let is_dir = entry.file_type().await?.is_dir();
            entries.push((name, entry.path(), is_dir));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

#[async_trait]
impl RemoteStore for LocalFolderStore {
    async fn list_entries(&self, source_id: &str) -> Result<Vec<RemoteItem>, StoreError> {
        let dir = self.resolve(source_id)?;
        debug!("Listing local folder {}", dir.display());

        let mut items = Vec::new();
        for (name, path, is_dir) in Self::read_sorted(&dir).await? {
            if is_dir {
                items.push(RemoteItem::Folder {
                    source_id: self.source_id_for(&path),
                    name,
                });
            } else if name == TEXT_FILE_NAME {
                let content = tokio::fs::read_to_string(&path).await?;
                items.extend(split_text_document(&content));
            } else {
                items.push(RemoteItem::File(Self::to_remote_file(&path, name)?));
            }
        }
        Ok(items)
    }

    async fn find_files(&self, predicate: &str) -> Result<Vec<RemoteFile>, StoreError> {
        let needle = predicate.to_lowercase();
        let mut found = Vec::new();
        for (name, path, is_dir) in Self::read_sorted(&self.root).await? {
            if is_dir || name == TEXT_FILE_NAME || !name.to_lowercase().contains(&needle) {
                continue;
            }
            found.push(Self::to_remote_file(&path, name)?);
        }
        Ok(found)
    }

    fn display_name(&self) -> String {
        format!("local folder {}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TEXT_PAGE_SEPARATOR;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Songs")).unwrap();
        std::fs::create_dir(dir.path().join("Songs").join("Chords")).unwrap();
        std::fs::write(
            dir.path().join(TEXT_FILE_NAME),
            format!("first{}second", TEXT_PAGE_SEPARATOR),
        )
        .unwrap();
        std::fs::write(dir.path().join("tab.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"junk").unwrap();
        std::fs::write(dir.path().join("Songs").join("riff.txt"), b"riff").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_list_root() {
        let dir = fixture();
        let store = LocalFolderStore::new(dir.path());
        let items = store.list_entries("").await.unwrap();

        assert_eq!(items.len(), 4);
        assert_eq!(items[0], RemoteItem::folder("Songs", "Songs"));
        assert_eq!(items[1], RemoteItem::text_page(0, "first"));
        assert_eq!(items[2], RemoteItem::text_page(1, "second"));
        match &items[3] {
            RemoteItem::File(file) => {
                assert_eq!(file.name, "tab.pdf");
                assert_eq!(file.mime_type, "application/pdf");
                assert!(file.url.starts_with("file://"));
            }
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_subfolder_uses_relative_source_ids() {
        let dir = fixture();
        let store = LocalFolderStore::new(dir.path());
        let items = store.list_entries("Songs").await.unwrap();

        assert_eq!(items[0], RemoteItem::folder("Chords", "Songs/Chords"));
        assert!(matches!(&items[1], RemoteItem::File(f) if f.name == "riff.txt"));
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = fixture();
        let store = LocalFolderStore::new(dir.path());
        assert!(matches!(
            store.list_entries("../etc").await,
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_folder_is_not_found() {
        let dir = fixture();
        let store = LocalFolderStore::new(dir.path());
        assert!(matches!(
            store.list_entries("Missing").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_files_is_not_recursive() {
        let dir = fixture();
        let store = LocalFolderStore::new(dir.path());

        let found = store.find_files("TAB").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "tab.pdf");

        assert!(store.find_files("riff").await.unwrap().is_empty());
    }
}
