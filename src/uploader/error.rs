//! Error types for the uploader module

use thiserror::Error;

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Upload error types
#[derive(Debug, Error)]
pub enum UploadError {
    /// Upload was cancelled
    #[error("Upload cancelled")]
    Cancelled,

    /// Bad chunk-plan inputs
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Zero-length input cannot be uploaded
    #[error("Cannot upload an empty file")]
    EmptyPayload,

    /// Failed to read the local file
    #[error("Failed to read local file: {0}")]
    FileReadError(String),

    /// Network-level fault (connect, DNS, TLS) before a response existed
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The resumable-start handshake did not yield a transfer endpoint
    #[error("Failed to start upload session: {0}")]
    SessionStartFailed(String),

    /// A chunk or finalize exchange was rejected
    #[error("Chunk at offset {offset} failed with HTTP {status}: {headers}")]
    ChunkUploadFailed {
        offset: u64,
        status: u16,
        headers: String,
    },

    /// A single-shot upload exchange was rejected
    #[error("Upload failed with HTTP {status}: {detail}")]
    RawUploadFailed { status: u16, detail: String },

    /// A chunk offset diverged from the bytes already acknowledged
    #[error("Chunk offset {actual} does not match {expected} acknowledged bytes")]
    OffsetMismatch { expected: u64, actual: u64 },

    /// Credential acquisition or refresh failure
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// The post-upload metadata-creation call failed
    #[error("Metadata creation failed: {0}")]
    MetadataFailed(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl UploadError {
    /// Check if this error is retryable within a session
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::TransportFailure(_) => true,
            UploadError::ChunkUploadFailed { status, .. } => *status == 408 || *status >= 500,
            _ => false,
        }
    }

    /// Check if this error is due to cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Cancelled)
    }

    /// Create a chunk upload error
    pub fn chunk_failed(offset: u64, status: u16, headers: impl Into<String>) -> Self {
        UploadError::ChunkUploadFailed {
            offset,
            status,
            headers: headers.into(),
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::FileReadError(err.to_string())
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::TransportFailure(err.to_string())
    }
}
