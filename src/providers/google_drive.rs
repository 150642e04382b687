//! Google Drive Remote Store
//!
//! Implements RemoteStore for Google Drive using the Drive API v3.
//! Authenticates with a refresh token exchanged through OAuth2, or with a
//! fixed access token when one is configured.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{DriveSettings, DEFAULT_APPLICATION_NAME};

use super::http_retry::{send_with_retry, RetryPolicy};
use super::oauth2::{OAuthCredentials, TokenSource};
use super::{
    split_text_document, RemoteFile, RemoteItem, RemoteStore, StoreError, TEXT_FILE_NAME,
};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
/// Appended to every query
const QUERY_DEFAULT_FILTER: &str = "trashed = false and name != '.DS_Store'";

/// Google Drive file metadata from API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
}

/// Google Drive file list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

/// How requests are authorised
#[derive(Clone)]
pub enum DriveAuth {
    /// Fixed bearer token, used as is until it is rejected
    AccessToken(String),
    /// Refresh token exchanged for short-lived access tokens
    Refresh(OAuthCredentials),
}

impl std::fmt::Debug for DriveAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriveAuth::AccessToken(_) => f.write_str("AccessToken(..)"),
            DriveAuth::Refresh(c) => write!(f, "Refresh(client_id={})", c.client_id),
        }
    }
}

/// Google Drive store configuration
#[derive(Debug, Clone)]
pub struct GoogleDriveConfig {
    pub auth: DriveAuth,
    /// Name of the folder that acts as the menu root
    pub root_folder_name: String,
    /// Sent as the User-Agent header
    pub application_name: String,
    /// API base, overridable for tests and proxies
    pub api_base: String,
    pub retry: RetryPolicy,
}

impl GoogleDriveConfig {
    pub fn new(auth: DriveAuth, root_folder_name: &str) -> Self {
        Self {
            auth,
            root_folder_name: root_folder_name.to_string(),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            api_base: DRIVE_API_BASE.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// A configured access token wins; otherwise client id and refresh
    /// token are required.
    pub fn from_drive_settings(settings: &DriveSettings) -> Result<Self, StoreError> {
        if settings.root_folder_name.is_empty() {
            return Err(StoreError::InvalidConfig("Missing root_folder_name".to_string()));
        }
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

        let auth = match (
            non_empty(&settings.access_token),
            non_empty(&settings.client_id),
            non_empty(&settings.refresh_token),
        ) {
            (Some(token), _, _) => DriveAuth::AccessToken(token),
            (None, Some(client_id), Some(refresh_token)) => DriveAuth::Refresh(OAuthCredentials::google(
                &client_id,
                non_empty(&settings.client_secret).as_deref(),
                &refresh_token,
            )),
            _ => {
                return Err(StoreError::InvalidConfig(
                    "Missing access_token, or client_id and refresh_token".to_string(),
                ))
            }
        };

        let mut config = Self::new(auth, &settings.root_folder_name);
        config.application_name = settings.application_name.clone();
        Ok(config)
    }
}

enum Authorizer {
    Static(String),
    Refreshing(TokenSource),
}

/// Google Drive Remote Store
pub struct GoogleDriveStore {
    config: GoogleDriveConfig,
    client: reqwest::Client,
    auth: Authorizer,
    /// Resolved once, on first use
    root_folder_id: OnceCell<String>,
}

impl GoogleDriveStore {
    pub fn new(config: GoogleDriveConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(config.application_name.as_str())
            .build()
            .map_err(|e| StoreError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;
        let auth = match &config.auth {
            DriveAuth::AccessToken(token) => Authorizer::Static(token.clone()),
            DriveAuth::Refresh(credentials) => Authorizer::Refreshing(TokenSource::new(credentials.clone())),
        };
        Ok(Self {
            config,
            client,
            auth,
            root_folder_id: OnceCell::new(),
        })
    }

    async fn auth_header(&self) -> Result<HeaderValue, StoreError> {
        let token = match &self.auth {
            Authorizer::Static(token) => token.clone(),
            Authorizer::Refreshing(source) => source.get_valid_token().await?,
        };
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| StoreError::InvalidConfig(format!("Invalid token: {}", e)))
    }

    /// Map 401/403 to `AuthenticationFailed`, dropping a refreshed token
    async fn check_auth(&self, status: reqwest::StatusCode) -> Result<(), StoreError> {
        if status.as_u16() != 401 && status.as_u16() != 403 {
            return Ok(());
        }
        if let Authorizer::Refreshing(source) = &self.auth {
            source.invalidate().await;
        }
        Err(StoreError::AuthenticationFailed(format!("Drive returned {}", status)))
    }

    /// Run a `files.list` query, following `nextPageToken`
    async fn query_files(&self, query: &str) -> Result<Vec<DriveFile>, StoreError> {
        let q = format!("{} and {}", query, QUERY_DEFAULT_FILTER);
        let url = format!("{}/files", self.config.api_base);
        let mut all_files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut page_url = format!(
                "{}?q={}&spaces=drive&fields={}&pageSize=1000",
                url,
                urlencoding::encode(&q),
                urlencoding::encode("files(id,name,mimeType),nextPageToken")
            );
            if let Some(ref token) = page_token {
                page_url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            debug!("Drive query: {}", q);
            let request = self
                .client
                .get(&page_url)
                .header(AUTHORIZATION, self.auth_header().await?);
            let response = send_with_retry(request, &self.config.retry).await?;

            let status = response.status();
            self.check_auth(status).await?;
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(StoreError::ServerError(format!("API error {}: {}", status, text)));
            }

            let list: DriveFileList = response
                .json()
                .await
                .map_err(|e| StoreError::ParseError(e.to_string()))?;

            all_files.extend(list.files);

            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_files)
    }

    async fn root_folder_id(&self) -> Result<&String, StoreError> {
        self.root_folder_id
            .get_or_try_init(|| async {
                let query = format!(
                    "name = '{}' and mimeType = '{}'",
                    escape_query(&self.config.root_folder_name),
                    FOLDER_MIME_TYPE
                );
                let folder = self
                    .query_files(&query)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| StoreError::NotFound(self.config.root_folder_name.clone()))?;
                info!("Resolved Drive root folder '{}' to {}", folder.name, folder.id);
                Ok(folder.id)
            })
            .await
    }

    /// Download a file's content as UTF-8 text
    async fn download_text(&self, file_id: &str) -> Result<String, StoreError> {
        let url = format!(
            "{}/files/{}?alt=media",
            self.config.api_base,
            urlencoding::encode(file_id)
        );
        let request = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.auth_header().await?);
        let response = send_with_retry(request, &self.config.retry).await?;

        self.check_auth(response.status()).await?;
        if !response.status().is_success() {
            return Err(StoreError::ServerError(format!("Download failed: {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Other(format!("Read error: {}", e)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn to_remote_items(&self, file: DriveFile) -> Vec<RemoteItem> {
        match classify(&file) {
            DriveKind::Folder => vec![RemoteItem::Folder {
                name: file.name,
                source_id: file.id,
            }],
            DriveKind::TextDocument => match self.download_text(&file.id).await {
                Ok(content) => split_text_document(&content),
                Err(e) => {
                    warn!("Failed to download {} ({}): {}", file.name, file.id, e);
                    Vec::new()
                }
            },
            DriveKind::File => vec![RemoteItem::File(to_remote_file(file))],
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum DriveKind {
    Folder,
    TextDocument,
    File,
}

fn classify(file: &DriveFile) -> DriveKind {
    if file.mime_type == FOLDER_MIME_TYPE {
        DriveKind::Folder
    } else if file.name == TEXT_FILE_NAME {
        DriveKind::TextDocument
    } else {
        DriveKind::File
    }
}

fn download_link(file_id: &str) -> String {
    format!("https://drive.google.com/uc?id={}&export=download", file_id)
}

fn to_remote_file(file: DriveFile) -> RemoteFile {
    RemoteFile {
        url: download_link(&file.id),
        name: file.name,
        mime_type: file.mime_type,
    }
}

/// Escape a literal for use inside a single-quoted Drive query string
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
impl RemoteStore for GoogleDriveStore {
    async fn list_entries(&self, source_id: &str) -> Result<Vec<RemoteItem>, StoreError> {
        let folder_id = if source_id.is_empty() {
            self.root_folder_id().await?.clone()
        } else {
            source_id.to_string()
        };

        let files = self
            .query_files(&format!("'{}' in parents", escape_query(&folder_id)))
            .await?;

        let mut items = Vec::with_capacity(files.len());
        for file in files {
            items.extend(self.to_remote_items(file).await);
        }
        Ok(items)
    }

    async fn find_files(&self, predicate: &str) -> Result<Vec<RemoteFile>, StoreError> {
        let query = format!(
            "name contains '{}' and mimeType != '{}'",
            escape_query(predicate),
            FOLDER_MIME_TYPE
        );
        Ok(self
            .query_files(&query)
            .await?
            .into_iter()
            .filter(|f| classify(f) == DriveKind::File)
            .map(to_remote_file)
            .collect())
    }

    fn display_name(&self) -> String {
        "Google Drive".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive_file(name: &str, mime_type: &str) -> DriveFile {
        DriveFile {
            id: "abc123".to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&drive_file("Songs", FOLDER_MIME_TYPE)), DriveKind::Folder);
        assert_eq!(classify(&drive_file("index.txt", "text/plain")), DriveKind::TextDocument);
        assert_eq!(classify(&drive_file("tab.pdf", "application/pdf")), DriveKind::File);
    }

    #[test]
    fn test_remote_file_uses_download_link() {
        let file = to_remote_file(drive_file("tab.pdf", "application/pdf"));
        assert_eq!(file.url, "https://drive.google.com/uc?id=abc123&export=download");
        assert_eq!(file.mime_type, "application/pdf");
    }

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("Guns N' Roses"), "Guns N\\' Roses");
    }

    #[test]
    fn test_file_list_parses_without_files() {
        let list: DriveFileList = serde_json::from_str(r#"{"nextPageToken":"t"}"#).unwrap();
        assert!(list.files.is_empty());
        assert_eq!(list.next_page_token.as_deref(), Some("t"));
    }

    fn settings() -> DriveSettings {
        DriveSettings {
            root_folder_name: "Guitar".to_string(),
            ..DriveSettings::default()
        }
    }

    #[test]
    fn test_config_requires_credentials() {
        assert!(matches!(
            GoogleDriveConfig::from_drive_settings(&settings()),
            Err(StoreError::InvalidConfig(_))
        ));

        // a refresh token alone is not enough
        let settings = DriveSettings {
            refresh_token: Some("refresh".to_string()),
            ..settings()
        };
        assert!(matches!(
            GoogleDriveConfig::from_drive_settings(&settings),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_prefers_refresh_credentials_without_token() {
        let settings = DriveSettings {
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            application_name: "guitar-bot".to_string(),
            ..settings()
        };
        let config = GoogleDriveConfig::from_drive_settings(&settings).unwrap();
        match config.auth {
            DriveAuth::Refresh(credentials) => {
                assert_eq!(credentials.client_id, "client");
                assert_eq!(credentials.client_secret.as_deref(), Some("secret"));
                assert_eq!(credentials.refresh_token, "refresh");
                assert_eq!(credentials.token_url, super::super::oauth2::GOOGLE_TOKEN_URL);
            }
            other => panic!("expected refresh auth, got {:?}", other),
        }
        assert_eq!(config.application_name, "guitar-bot");
    }

    #[test]
    fn test_access_token_overrides_refresh() {
        let settings = DriveSettings {
            access_token: Some("static".to_string()),
            client_id: Some("client".to_string()),
            refresh_token: Some("refresh".to_string()),
            ..settings()
        };
        let config = GoogleDriveConfig::from_drive_settings(&settings).unwrap();
        assert!(matches!(config.auth, DriveAuth::AccessToken(ref t) if t == "static"));
        assert!(!format!("{:?}", config).contains("static"));
    }

    #[test]
    fn test_application_name_must_be_a_valid_user_agent() {
        let mut config = GoogleDriveConfig::new(DriveAuth::AccessToken("token".to_string()), "Guitar");
        assert!(GoogleDriveStore::new(config.clone()).is_ok());

        config.application_name = "drive\nmenu".to_string();
        assert!(matches!(
            GoogleDriveStore::new(config),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_connection_failure() {
        let mut config = GoogleDriveConfig::new(DriveAuth::AccessToken("token".to_string()), "Guitar");
        config.api_base = "http://127.0.0.1:9".to_string();
        config.retry = RetryPolicy::none();
        let store = GoogleDriveStore::new(config).unwrap();

        assert!(matches!(
            store.list_entries("folder-id").await,
            Err(StoreError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_refresh_surfaces_before_listing() {
        let credentials = OAuthCredentials {
            token_url: "http://127.0.0.1:9/token".to_string(),
            ..OAuthCredentials::google("client", None, "refresh")
        };
        let mut config = GoogleDriveConfig::new(DriveAuth::Refresh(credentials), "Guitar");
        config.api_base = "http://127.0.0.1:9".to_string();
        config.retry = RetryPolicy::none();
        let store = GoogleDriveStore::new(config).unwrap();

        let err = store.list_entries("folder-id").await.unwrap_err();
        assert!(matches!(err, StoreError::ConnectionFailed(ref m) if m.starts_with("Token refresh failed")));
    }
}
