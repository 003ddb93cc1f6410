//! # Street View Publish API Client
//!
//! A Rust client for the Street View Publish API with automatic token
//! refresh support, plus a small Places client for associating photos
//! with a place.
//!
//! ## Features
//!
//! - Automatic access token refresh when expired
//! - Stored-credential loading (the `.credentials` file written by the
//!   Google auth tooling)
//! - Type-safe API methods
//!
//! ## Example
//!
//! ```no_run
//! use streetview_api::api::PublishApi;
//! use streetview_api::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new().with_api_key("DEVELOPER_KEY");
//!     let client = Client::new(config);
//!
//!     // Load the stored OAuth credentials; tokens are refreshed
//!     // transparently on subsequent requests.
//!     client
//!         .load_credentials_file("~/.credentials/streetviewpublish_credentials.json".as_ref())
//!         .await?;
//!
//!     let upload_ref = client.start_photo_upload().await?;
//!     println!("upload URL: {}", upload_ref.upload_url);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod models;

pub use client::{Client, ClientConfig, PlacesClient};
pub use error::{ApiError, ApiResult};
