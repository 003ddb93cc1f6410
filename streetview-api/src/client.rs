use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::models::auth::{RefreshedToken, StoredCredentials};
use crate::models::places::{PlaceCandidate, PlacesSearchResponse};

/// Production endpoint of the Street View Publish API
pub const DEFAULT_BASE_URL: &str = "https://streetviewpublish.googleapis.com/v1";

/// Production endpoint of the Places API
pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Tokens within this many seconds of expiry are refreshed eagerly
const TOKEN_EXPIRY_LEEWAY_SECS: i64 = 60;

/// Configuration for the publish API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Developer key of the GCP project, appended to every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct AuthState {
    credentials: Option<StoredCredentials>,
    /// Where refreshed tokens are cached back to, if loaded from disk
    store_path: Option<PathBuf>,
}

/// Street View Publish API client with automatic token refresh
pub struct Client {
    pub(crate) http_client: reqwest::Client,
    config: ClientConfig,
    state: RwLock<AuthState>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to construct HTTP client");

        Self {
            http_client,
            config,
            state: RwLock::new(AuthState {
                credentials: None,
                store_path: None,
            }),
        }
    }

    /// Load stored OAuth credentials from disk. Refreshed access tokens
    /// are written back to the same file.
    pub async fn load_credentials_file(&self, path: &Path) -> ApiResult<()> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Credentials(format!("{}: {}", path.display(), e)))?;
        let credentials: StoredCredentials = serde_json::from_slice(&data)
            .map_err(|e| ApiError::Credentials(format!("{}: {}", path.display(), e)))?;

        let mut state = self.state.write().await;
        state.credentials = Some(credentials);
        state.store_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Set credentials directly, without a backing file
    pub async fn set_credentials(&self, credentials: StoredCredentials) {
        let mut state = self.state.write().await;
        state.credentials = Some(credentials);
        state.store_path = None;
    }

    /// Get a valid access token, refreshing it first if it is missing or
    /// about to expire
    pub async fn access_token(&self) -> ApiResult<String> {
        {
            let state = self.state.read().await;
            let credentials = state.credentials.as_ref().ok_or(ApiError::LoginRequired)?;
            if let (Some(token), Some(expiry)) =
                (&credentials.access_token, credentials.token_expiry)
            {
                let leeway = chrono::Duration::seconds(TOKEN_EXPIRY_LEEWAY_SECS);
                if expiry - leeway > Utc::now() {
                    return Ok(token.clone());
                }
            }
        }

        self.refresh_access_token().await
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh_access_token(&self) -> ApiResult<String> {
        let (token_uri, client_id, client_secret, refresh_token) = {
            let state = self.state.read().await;
            let credentials = state.credentials.as_ref().ok_or(ApiError::LoginRequired)?;
            (
                credentials.token_uri.clone(),
                credentials.client_id.clone(),
                credentials.client_secret.clone(),
                credentials.refresh_token.clone(),
            )
        };

        let form = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http_client.post(&token_uri).form(&form).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::TokenRefresh(format!("HTTP {}: {}", status, body)));
        }

        let refreshed: RefreshedToken = response
            .json()
            .await
            .map_err(|e| ApiError::TokenRefresh(e.to_string()))?;
        let expiry = Utc::now() + chrono::Duration::seconds(refreshed.expires_in);

        let mut state = self.state.write().await;
        let credentials = state.credentials.as_mut().ok_or(ApiError::LoginRequired)?;
        credentials.access_token = Some(refreshed.access_token.clone());
        credentials.token_expiry = Some(expiry);

        // Cache the refreshed token back to disk; failure to do so only
        // costs an extra refresh on the next run.
        if let Some(path) = state.store_path.clone() {
            if let Some(credentials) = &state.credentials {
                if let Ok(data) = serde_json::to_vec_pretty(credentials) {
                    let _ = tokio::fs::write(&path, data).await;
                }
            }
        }

        Ok(refreshed.access_token)
    }

    pub(crate) fn build_url(&self, path: &str) -> String {
        let mut url = format!("{}{}", self.config.base_url, path);
        if let Some(key) = &self.config.api_key {
            url.push(if path.contains('?') { '&' } else { '?' });
            url.push_str("key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }

    /// POST a JSON body and decode a JSON response. A 401 triggers one
    /// token refresh and a single retry of the original request.
    pub(crate) async fn post<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.build_url(path);
        let mut token = self.access_token().await?;
        let mut retried = false;

        loop {
            let response = self
                .http_client
                .post(&url)
                .header("Authorization", format!("Bearer {}", token))
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                token = self.refresh_access_token().await?;
                continue;
            }

            if status.is_success() {
                return Ok(response.json::<R>().await?);
            }

            let text = response.text().await.unwrap_or_default();
            if let Ok(envelope) = serde_json::from_str::<ErrorBody>(&text) {
                return Err(ApiError::from_status(envelope.error));
            }
            return Err(ApiError::Other(format!("HTTP {}: {}", status, text)));
        }
    }
}

/// Places API client. Authenticates with an API key only; no OAuth.
pub struct PlacesClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: DEFAULT_PLACES_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// GET a search endpoint and unwrap the Places response envelope
    pub(crate) async fn search(&self, path_and_query: &str) -> ApiResult<Vec<PlaceCandidate>> {
        let url = format!(
            "{}{}&key={}",
            self.base_url,
            path_and_query,
            urlencoding::encode(&self.api_key)
        );

        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Other(format!("HTTP {}: {}", status, body)));
        }

        let envelope: PlacesSearchResponse = response.json().await?;
        match envelope.status.as_str() {
            "OK" => Ok(envelope.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            status => Err(ApiError::Places {
                status: status.to_string(),
                message: envelope.error_message.unwrap_or_default(),
            }),
        }
    }
}
