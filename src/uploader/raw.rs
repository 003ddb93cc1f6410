//! Single-shot `raw` protocol upload, used for photos
//!
//! The whole file goes in one POST. The body is still streamed from disk
//! rather than buffered, so large photos never sit in memory.

use crate::uploader::chunk::ChunkStream;
use crate::uploader::error::{UploadError, UploadResult};
use crate::uploader::transport::{
    bearer_value, AuthProvider, UploadTransport, X_GOOG_UPLOAD_CONTENT_LENGTH,
    X_GOOG_UPLOAD_PROTOCOL,
};
use crate::uploader::UploadTarget;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use tracing::{debug, warn};

/// Upload the entire target in a single exchange. A 401 triggers one
/// credential refresh and an immediate retry.
pub(crate) async fn upload<T, A>(
    transport: &T,
    auth: &A,
    upload_url: &str,
    target: &UploadTarget,
) -> UploadResult<()>
where
    T: UploadTransport,
    A: AuthProvider,
{
    if target.size == 0 {
        return Err(UploadError::EmptyPayload);
    }

    let mut reauthenticated = false;
    loop {
        let token = auth.bearer_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(target.kind.content_type()),
        );
        headers.insert(AUTHORIZATION, bearer_value(&token)?);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(target.size));
        headers.insert(X_GOOG_UPLOAD_PROTOCOL, HeaderValue::from_static("raw"));
        headers.insert(X_GOOG_UPLOAD_CONTENT_LENGTH, HeaderValue::from(target.size));

        debug!(
            target: "uploader::raw",
            path = %target.path.display(),
            size = target.size,
            "Uploading file (single-shot)"
        );

        let stream = ChunkStream::whole_file(&target.path, target.size)
            .await
            .map_err(|e| UploadError::FileReadError(e.to_string()))?;

        let response = transport.send(upload_url, headers, Some(stream)).await?;
        if response.is_success() {
            return Ok(());
        }

        if response.status.as_u16() == 401 && !reauthenticated {
            warn!(
                target: "uploader::raw",
                "Bearer token rejected, refreshing credentials"
            );
            auth.refresh_token().await?;
            reauthenticated = true;
            continue;
        }

        return Err(UploadError::RawUploadFailed {
            status: response.status.as_u16(),
            detail: response.headers_for_display(),
        });
    }
}
