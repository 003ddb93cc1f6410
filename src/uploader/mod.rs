//! Media upload engine for the Street View Publish service
//!
//! Photos go up in a single `raw` protocol exchange; videos go through
//! the resumable chunked protocol. Both strategies share the same
//! streaming reader, transport seam, and progress plumbing.

pub mod chunk;
pub mod error;
pub mod progress;
mod raw;
pub mod session;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use chunk::{ChunkPlan, ChunkRange, ChunkStream};
pub use error::{UploadError, UploadResult};
pub use progress::{FnProgress, NoOpProgress, ProgressCallback, ProgressUpdate};
pub use session::{ResumableUploadSession, SessionState};
pub use transport::{AuthProvider, HttpTransport, TransportResponse, UploadTransport};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use streetview_api::api::PublishApi;
use streetview_api::models::publish::{
    CreatePhotoRequest, CreatePhotoSequenceRequest, InputType, Place,
};
use streetview_api::ApiError;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Default chunk size for resumable uploads (20 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 20 * 1024 * 1024;

/// Uploader configuration
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Chunk size for resumable uploads
    pub chunk_size: u64,
    /// Maximum retries per chunk for transient failures
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
    /// Upper bound on the backoff delay
    pub retry_max_delay: Duration,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(30),
        }
    }
}

/// Kind of media being uploaded; decides the upload strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaKind::Photo => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }
}

/// The local resource to send: a readable byte source of known length and
/// a declared media type. Immutable for the duration of one upload
/// attempt; the file must not be mutated while the upload runs.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub path: PathBuf,
    pub size: u64,
    pub kind: MediaKind,
}

impl UploadTarget {
    /// Build a target from a file on disk, taking the size from metadata
    pub async fn from_path(path: impl Into<PathBuf>, kind: MediaKind) -> UploadResult<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await?;
        Ok(Self {
            size: metadata.len(),
            path,
            kind,
        })
    }
}

/// Top-level upload coordinator. Picks the strategy by media kind, wires
/// the place reference into photo metadata, and issues the metadata
/// creation call once the bytes are up.
pub struct Uploader<C, T> {
    client: Arc<C>,
    transport: Arc<T>,
    config: UploaderConfig,
}

impl<C, T> Uploader<C, T>
where
    C: PublishApi + AuthProvider,
    T: UploadTransport,
{
    pub fn new(client: Arc<C>, transport: Arc<T>, config: UploaderConfig) -> Self {
        Self {
            client,
            transport,
            config,
        }
    }

    /// Upload a target and create its metadata record. Returns the
    /// created resource's identifier.
    pub async fn upload<P: ProgressCallback>(
        &self,
        target: &UploadTarget,
        place_id: Option<String>,
        progress: &P,
        cancel_token: &CancellationToken,
    ) -> UploadResult<String> {
        match target.kind {
            MediaKind::Photo => self.upload_photo(target, place_id, progress).await,
            MediaKind::Video => self.upload_video(target, progress, cancel_token).await,
        }
    }

    /// Single-shot photo upload followed by photo creation
    pub async fn upload_photo<P: ProgressCallback>(
        &self,
        target: &UploadTarget,
        place_id: Option<String>,
        progress: &P,
    ) -> UploadResult<String> {
        info!(
            target: "uploader",
            path = %target.path.display(),
            size = target.size,
            "Uploading photo"
        );

        let upload_ref = self
            .client
            .start_photo_upload()
            .await
            .map_err(start_error)?;

        raw::upload(
            self.transport.as_ref(),
            self.client.as_ref(),
            &upload_ref.upload_url,
            target,
        )
        .await?;
        progress.on_progress(ProgressUpdate::new(target.size, target.size, None, 1));

        let request = CreatePhotoRequest {
            upload_reference: upload_ref,
            places: place_id.map(|place_id| Place { place_id }),
        };
        let photo = self
            .client
            .create_photo(&request)
            .await
            .map_err(|e| UploadError::MetadataFailed(e.to_string()))?;

        info!(target: "uploader", photo_id = %photo.photo_id.id, "Photo created");
        Ok(photo.photo_id.id)
    }

    /// Resumable video upload followed by photo sequence creation
    pub async fn upload_video<P: ProgressCallback>(
        &self,
        target: &UploadTarget,
        progress: &P,
        cancel_token: &CancellationToken,
    ) -> UploadResult<String> {
        if target.size == 0 {
            return Err(UploadError::EmptyPayload);
        }

        info!(
            target: "uploader",
            path = %target.path.display(),
            size = target.size,
            "Uploading video (resumable)"
        );

        let upload_ref = self
            .client
            .start_photo_sequence_upload()
            .await
            .map_err(start_error)?;

        let mut session = ResumableUploadSession::new(
            self.transport.clone(),
            self.client.clone(),
            self.config.clone(),
            target,
        );
        session.start(&upload_ref.upload_url).await?;
        session
            .upload_chunks(&target.path, progress, cancel_token)
            .await?;

        let request = CreatePhotoSequenceRequest {
            upload_reference: upload_ref,
        };
        let sequence = self
            .client
            .create_photo_sequence(&request, InputType::Video)
            .await
            .map_err(|e| UploadError::MetadataFailed(e.to_string()))?;

        info!(target: "uploader", name = %sequence.name, "Photo sequence created");
        Ok(sequence.name)
    }
}

fn start_error(err: ApiError) -> UploadError {
    if err.requires_login() {
        UploadError::AuthFailure(err.to_string())
    } else {
        UploadError::SessionStartFailed(err.to_string())
    }
}
