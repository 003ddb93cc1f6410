//! Upload 360 photos and stitched videos to the Street View Publish API.
//!
//! Photos are sent in a single `raw` protocol exchange; videos go through
//! the `X-Goog-Upload-*` resumable chunked protocol, streaming from disk
//! so multi-gigabyte files never sit in memory. Place lookup and OAuth
//! credential refresh live in the companion `streetview-api` crate.

pub mod logging;
pub mod places;
pub mod uploader;

// Re-export commonly used types
pub use logging::{LogConfig, LogGuard};
pub use places::{PlaceLookup, PlaceQuery, PlaceResolver, SelectionPolicy};
pub use uploader::{
    MediaKind, UploadError, UploadResult, UploadTarget, Uploader, UploaderConfig,
};
