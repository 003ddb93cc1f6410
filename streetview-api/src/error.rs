use serde::Deserialize;
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Error envelope returned by Google APIs on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorStatus,
}

/// The `error` object inside the envelope
#[derive(Debug, Deserialize)]
pub struct ErrorStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response was produced
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected the request
    #[error("API error {status} ({code}): {message}")]
    Api {
        code: i32,
        status: String,
        message: String,
    },

    /// Places API returned a non-OK status field
    #[error("Places lookup failed ({status}): {message}")]
    Places { status: String, message: String },

    /// No credentials have been loaded
    #[error("No credentials loaded, authentication required")]
    LoginRequired,

    /// Failed to read or parse the stored credentials file
    #[error("Credential storage error: {0}")]
    Credentials(String),

    /// The token endpoint rejected the refresh request
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Response parsed but carried no usable payload
    #[error("API returned success but no data")]
    MissingData,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Check if this error requires the user to re-authenticate
    pub fn requires_login(&self) -> bool {
        match self {
            ApiError::LoginRequired | ApiError::TokenRefresh(_) | ApiError::Credentials(_) => true,
            ApiError::Api { code, .. } => *code == 401,
            _ => false,
        }
    }

    pub(crate) fn from_status(status: ErrorStatus) -> Self {
        ApiError::Api {
            code: status.code,
            status: status.status,
            message: status.message,
        }
    }
}
