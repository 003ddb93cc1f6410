//! HTTP transport seam for upload exchanges

use crate::uploader::chunk::ChunkStream;
use crate::uploader::error::{UploadError, UploadResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Body, Client as HttpClient, StatusCode};

pub const X_GOOG_UPLOAD_PROTOCOL: HeaderName = HeaderName::from_static("x-goog-upload-protocol");
pub const X_GOOG_UPLOAD_COMMAND: HeaderName = HeaderName::from_static("x-goog-upload-command");
pub const X_GOOG_UPLOAD_OFFSET: HeaderName = HeaderName::from_static("x-goog-upload-offset");
pub const X_GOOG_UPLOAD_URL: HeaderName = HeaderName::from_static("x-goog-upload-url");
pub const X_GOOG_UPLOAD_HEADER_CONTENT_LENGTH: HeaderName =
    HeaderName::from_static("x-goog-upload-header-content-length");
pub const X_GOOG_UPLOAD_HEADER_CONTENT_TYPE: HeaderName =
    HeaderName::from_static("x-goog-upload-header-content-type");
pub const X_GOOG_UPLOAD_CONTENT_LENGTH: HeaderName =
    HeaderName::from_static("x-goog-upload-content-length");

/// Outcome of a single upload exchange. A non-2xx status is data, not an
/// error; the session layer decides what to do with it.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Render the response headers for diagnostics
    pub fn headers_for_display(&self) -> String {
        self.headers
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Performs one HTTP POST carrying caller-supplied headers and an optional
/// streamed byte payload. Headers are passed through uninterpreted. Fails
/// only for transport-level faults; retry and timeout policy live in the
/// session layer.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Option<ChunkStream>,
    ) -> UploadResult<TransportResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    http_client: HttpClient,
}

impl HttpTransport {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Option<ChunkStream>,
    ) -> UploadResult<TransportResponse> {
        let mut request = self.http_client.post(url).headers(headers);
        if let Some(stream) = body {
            request = request.body(Body::wrap_stream(stream));
        }

        let response = request.send().await?;

        Ok(TransportResponse {
            status: response.status(),
            headers: response.headers().clone(),
        })
    }
}

/// Supplies bearer credentials for upload exchanges
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// A currently valid bearer token, refreshed transparently if expired
    async fn bearer_token(&self) -> UploadResult<String>;

    /// Force a refresh after the service rejected the current token
    async fn refresh_token(&self) -> UploadResult<String>;
}

#[async_trait]
impl AuthProvider for streetview_api::Client {
    async fn bearer_token(&self) -> UploadResult<String> {
        self.access_token()
            .await
            .map_err(|e| UploadError::AuthFailure(e.to_string()))
    }

    async fn refresh_token(&self) -> UploadResult<String> {
        self.refresh_access_token()
            .await
            .map_err(|e| UploadError::AuthFailure(e.to_string()))
    }
}

pub(crate) fn bearer_value(token: &str) -> UploadResult<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| UploadError::AuthFailure("bearer token contains invalid characters".to_string()))
}
