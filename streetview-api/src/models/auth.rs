use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Stored OAuth credentials, as written to
/// `~/.credentials/streetviewpublish_credentials.json` by the Google auth
/// tooling. The access token and its expiry are cached back into the same
/// file after each refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_expiry: Option<DateTime<Utc>>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Token endpoint response for a `refresh_token` grant
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: i64,
}
