//! Resumable upload session state machine
//!
//! Drives the three-phase resumable protocol against a transfer endpoint:
//! a `start` handshake that yields the resumable URL, a strictly
//! sequential chunk loop, and an `upload, finalize` command on the last
//! chunk. Chunks are never sent out of order or concurrently; each
//! chunk's acceptance depends on the server's running offset state.

use crate::uploader::chunk::{ChunkPlan, ChunkRange, ChunkStream};
use crate::uploader::error::{UploadError, UploadResult};
use crate::uploader::progress::{ProgressCallback, ProgressUpdate};
use crate::uploader::transport::{
    bearer_value, AuthProvider, TransportResponse, UploadTransport, X_GOOG_UPLOAD_COMMAND,
    X_GOOG_UPLOAD_HEADER_CONTENT_LENGTH, X_GOOG_UPLOAD_HEADER_CONTENT_TYPE, X_GOOG_UPLOAD_OFFSET,
    X_GOOG_UPLOAD_PROTOCOL, X_GOOG_UPLOAD_URL,
};
use crate::uploader::{UploadTarget, UploaderConfig};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Started,
    Uploading,
    Finalized,
    Aborted,
}

/// One resumable upload attempt. Owns the offset bookkeeping for the
/// session; discarded after finalize succeeds or the attempt is
/// abandoned. There is no resumption across process runs; a failed
/// upload restarts from offset 0.
pub struct ResumableUploadSession<T, A> {
    transport: Arc<T>,
    auth: Arc<A>,
    config: UploaderConfig,
    total_size: u64,
    content_type: &'static str,
    state: SessionState,
    resumable_url: Option<String>,
    uploaded: u64,
}

impl<T, A> ResumableUploadSession<T, A>
where
    T: UploadTransport,
    A: AuthProvider,
{
    pub fn new(
        transport: Arc<T>,
        auth: Arc<A>,
        config: UploaderConfig,
        target: &UploadTarget,
    ) -> Self {
        Self {
            transport,
            auth,
            config,
            total_size: target.size,
            content_type: target.kind.content_type(),
            state: SessionState::Idle,
            resumable_url: None,
            uploaded: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bytes acknowledged by the service so far
    pub fn bytes_uploaded(&self) -> u64 {
        self.uploaded
    }

    /// Perform the resumable-start handshake against a service-issued
    /// upload URL and capture the transfer endpoint it returns.
    pub async fn start(&mut self, upload_url: &str) -> UploadResult<()> {
        if self.state != SessionState::Idle {
            return Err(UploadError::Other(format!(
                "session already started (state {:?})",
                self.state
            )));
        }

        let token = self.auth.bearer_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_value(&token)?);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(0u64));
        headers.insert(X_GOOG_UPLOAD_PROTOCOL, HeaderValue::from_static("resumable"));
        headers.insert(X_GOOG_UPLOAD_COMMAND, HeaderValue::from_static("start"));
        headers.insert(
            X_GOOG_UPLOAD_HEADER_CONTENT_LENGTH,
            HeaderValue::from(self.total_size),
        );
        headers.insert(
            X_GOOG_UPLOAD_HEADER_CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );

        let response = self.transport.send(upload_url, headers, None).await?;
        if !response.is_success() {
            self.state = SessionState::Aborted;
            return Err(UploadError::SessionStartFailed(format!(
                "HTTP {}: {}",
                response.status,
                response.headers_for_display()
            )));
        }

        let resumable_url = match response.header(&X_GOOG_UPLOAD_URL) {
            Some(url) => url.to_string(),
            None => {
                self.state = SessionState::Aborted;
                return Err(UploadError::SessionStartFailed(
                    "response is missing the X-Goog-Upload-URL header".to_string(),
                ));
            }
        };

        debug!(
            target: "uploader::session",
            total_size = self.total_size,
            content_type = self.content_type,
            "Resumable upload session started"
        );

        self.resumable_url = Some(resumable_url);
        self.state = SessionState::Started;
        Ok(())
    }

    /// Upload every chunk of the file in plan order, finalizing with the
    /// last one. The session moves to `Finalized` only after the final
    /// chunk is acknowledged.
    pub async fn upload_chunks<P: ProgressCallback>(
        &mut self,
        path: &Path,
        progress: &P,
        cancel_token: &CancellationToken,
    ) -> UploadResult<()> {
        if self.state != SessionState::Started {
            return Err(UploadError::Other(format!(
                "session is not started (state {:?})",
                self.state
            )));
        }

        let plan = ChunkPlan::new(self.total_size, self.config.chunk_size)?;
        let num_chunks = plan.num_chunks();

        info!(
            target: "uploader::session",
            path = %path.display(),
            total_size = self.total_size,
            num_chunks,
            "Starting chunk upload"
        );

        self.state = SessionState::Uploading;

        for (index, range) in plan.ranges().enumerate() {
            if cancel_token.is_cancelled() {
                self.state = SessionState::Aborted;
                return Err(UploadError::Cancelled);
            }

            // Offsets must exactly match bytes already acknowledged; a gap
            // or overlap is a protocol violation and fails before the
            // request is issued.
            if range.offset != self.uploaded {
                self.state = SessionState::Aborted;
                return Err(UploadError::OffsetMismatch {
                    expected: self.uploaded,
                    actual: range.offset,
                });
            }

            if let Err(e) = self
                .upload_chunk_with_retry(path, &range, cancel_token)
                .await
            {
                self.state = SessionState::Aborted;
                return Err(e);
            }

            self.uploaded += range.length;
            progress.on_progress(ProgressUpdate::new(
                self.total_size,
                self.uploaded,
                Some(index as u64),
                num_chunks,
            ));
        }

        self.state = SessionState::Finalized;
        info!(
            target: "uploader::session",
            uploaded = self.uploaded,
            "Upload finalized"
        );
        Ok(())
    }

    /// Upload a single chunk with bounded retries. Transient failures
    /// (transport errors, 408, 5xx) back off exponentially; a 401 triggers
    /// one credential refresh and an immediate retry.
    async fn upload_chunk_with_retry(
        &self,
        path: &Path,
        range: &ChunkRange,
        cancel_token: &CancellationToken,
    ) -> UploadResult<()> {
        let mut attempt: u32 = 0;
        let mut reauthenticated = false;

        loop {
            if cancel_token.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            if attempt > 0 {
                let delay = self.retry_delay(attempt);
                debug!(
                    target: "uploader::session",
                    offset = range.offset,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying chunk upload"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel_token.cancelled() => {
                        return Err(UploadError::Cancelled);
                    }
                }
            }

            // Create a fresh stream for each attempt
            let stream = ChunkStream::from_range(path, range)
                .await
                .map_err(|e| UploadError::FileReadError(e.to_string()))?;

            let err = match self.send_chunk(range, stream).await {
                Ok(()) => {
                    debug!(
                        target: "uploader::session",
                        offset = range.offset,
                        length = range.length,
                        is_final = range.is_final,
                        "Chunk uploaded successfully"
                    );
                    return Ok(());
                }
                Err(e) => e,
            };

            let unauthorized = matches!(&err, UploadError::ChunkUploadFailed { status: 401, .. });
            if unauthorized && !reauthenticated {
                warn!(
                    target: "uploader::session",
                    offset = range.offset,
                    "Bearer token rejected, refreshing credentials"
                );
                self.auth.refresh_token().await?;
                reauthenticated = true;
                continue;
            }

            if !err.is_retryable() || attempt >= self.config.max_retries {
                error!(
                    target: "uploader::session",
                    offset = range.offset,
                    error = %err,
                    attempt,
                    "Chunk upload failed"
                );
                return Err(err);
            }

            warn!(
                target: "uploader::session",
                offset = range.offset,
                error = %err,
                attempt,
                "Chunk upload failed, will retry"
            );
            attempt += 1;
        }
    }

    /// Send one chunk to the resumable endpoint
    async fn send_chunk(&self, range: &ChunkRange, stream: ChunkStream) -> UploadResult<()> {
        let url = self
            .resumable_url
            .as_ref()
            .ok_or_else(|| UploadError::Other("no resumable transfer endpoint".to_string()))?;

        let token = self.auth.bearer_token().await?;
        let command = if range.is_final {
            "upload, finalize"
        } else {
            "upload"
        };

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_value(&token)?);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(range.length));
        headers.insert(X_GOOG_UPLOAD_COMMAND, HeaderValue::from_static(command));
        headers.insert(X_GOOG_UPLOAD_OFFSET, HeaderValue::from(range.offset));

        let response = self.transport.send(url, headers, Some(stream)).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(chunk_error(range.offset, &response))
        }
    }

    /// Calculate retry delay with exponential backoff
    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_base_delay.as_millis() as u64;
        let delay_ms = base * (1 << attempt.min(10)); // Cap exponential growth
        let delay = Duration::from_millis(delay_ms);
        delay.min(self.config.retry_max_delay)
    }
}

fn chunk_error(offset: u64, response: &TransportResponse) -> UploadError {
    UploadError::chunk_failed(
        offset,
        response.status.as_u16(),
        response.headers_for_display(),
    )
}
