//! OAuth2 Token Refresh
//!
//! Keeps a Drive access token valid for a long-running process. Google
//! access tokens expire after about an hour, so the store asks this module
//! for a token before every request and it refreshes with the stored
//! refresh token when the cached one is about to expire.

use oauth2::{
    basic::BasicClient, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken,
    RequestTokenError, TokenResponse, TokenUrl,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::StoreError;

/// Google's token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds before expiry at which a token counts as expired
const EXPIRY_BUFFER_SECS: i64 = 300;

/// OAuth2 client with only the token endpoint set (v5 typestates)
type TokenClient = BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Simple error wrapper for the oauth2 HTTP client adapter.
#[derive(Debug)]
struct OAuth2TransportError(String);

impl std::fmt::Display for OAuth2TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for OAuth2TransportError {}

/// Async HTTP client adapter for oauth2 v5 on top of reqwest 0.13.
struct OAuth2HttpClient;

impl<'c> oauth2::AsyncHttpClient<'c> for OAuth2HttpClient {
    type Error = oauth2::HttpClientError<OAuth2TransportError>;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<oauth2::HttpResponse, Self::Error>> + Send + Sync + 'c>,
    >;

    fn call(&'c self, request: oauth2::HttpRequest) -> Self::Future {
        Box::pin(async move {
            let client = reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(|e| oauth2::HttpClientError::Other(e.to_string()))?;

            let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
                .unwrap_or(reqwest::Method::POST);
            let url = request.uri().to_string();

            let mut builder = client.request(method, &url);
            for (name, value) in request.headers() {
                builder = builder.header(name.as_str(), value.as_bytes());
            }
            builder = builder.body(request.into_body());

            let response = builder
                .send()
                .await
                .map_err(|e| oauth2::HttpClientError::Other(format!("HTTP request failed: {}", e)))?;

            let status_code = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| oauth2::HttpClientError::Other(e.to_string()))?;

            let mut http_response = http::Response::builder()
                .status(http::StatusCode::from_u16(status_code).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR));
            for (name, value) in headers.iter() {
                http_response = http_response.header(name.as_str(), value.as_bytes());
            }
            http_response
                .body(body.to_vec())
                .map_err(|e| oauth2::HttpClientError::Other(e.to_string()))
        })
    }
}

/// Client credentials plus a long-lived refresh token
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: String,
    pub token_url: String,
}

impl OAuthCredentials {
    pub fn google(client_id: &str, client_secret: Option<&str>, refresh_token: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.map(str::to_string),
            refresh_token: refresh_token.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Option<i64>, // Unix timestamp
}

impl CachedToken {
    /// Expired, or expiring within the buffer
    fn is_expired(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now + EXPIRY_BUFFER_SECS,
            None => false,
        }
    }
}

/// Hands out valid access tokens, refreshing on demand
pub struct TokenSource {
    credentials: OAuthCredentials,
    /// Also serialises refreshes
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// Current access token, refreshed first if missing or expired
    pub async fn get_valid_token(&self) -> Result<String, StoreError> {
        let mut cached = self.cached.lock().await;
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired(now)) {
            return Ok(token.access_token.clone());
        }

        let token = self.refresh().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Forget the cached token, e.g. after the API rejected it
    pub async fn invalidate(&self) {
        debug!("Dropping cached Drive access token");
        *self.cached.lock().await = None;
    }

    async fn refresh(&self) -> Result<CachedToken, StoreError> {
        let client = self.create_client()?;
        let refresh_token = RefreshToken::new(self.credentials.refresh_token.clone());

        let token_result = client
            .exchange_refresh_token(&refresh_token)
            .request_async(&OAuth2HttpClient)
            .await
            .map_err(|e| match e {
                RequestTokenError::Request(inner) => {
                    StoreError::ConnectionFailed(format!("Token refresh failed: {}", inner))
                }
                other => StoreError::AuthenticationFailed(format!("Token refresh failed: {}", other)),
            })?;

        let expires_at = token_result
            .expires_in()
            .map(|d| chrono::Utc::now().timestamp() + d.as_secs() as i64);
        info!("Drive access token refreshed");

        Ok(CachedToken {
            access_token: token_result.access_token().secret().clone(),
            expires_at,
        })
    }

    fn create_client(&self) -> Result<TokenClient, StoreError> {
        let token_url = TokenUrl::new(self.credentials.token_url.clone())
            .map_err(|e| StoreError::InvalidConfig(format!("Invalid token URL: {}", e)))?;

        let mut client = BasicClient::new(ClientId::new(self.credentials.client_id.clone())).set_token_uri(token_url);
        if let Some(ref secret) = self.credentials.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }
        Ok(client)
    }
}
