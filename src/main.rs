use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::{Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use streetview_api::{Client, ClientConfig, PlacesClient};
use streetview_uploader::logging::{LogConfig, init_logging};
use streetview_uploader::places::{PlaceLookup, PlaceQuery, PlaceResolver, SelectionPolicy};
use streetview_uploader::uploader::{
    FnProgress, HttpTransport, MediaKind, ProgressUpdate, UploadTarget, Uploader, UploaderConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "streetview-uploader")]
#[command(version)]
#[command(about = "Upload 360 photos and stitched videos to the Street View Publish API")]
struct Cli {
    /// Full path to a JPEG photo file
    #[arg(long, value_name = "FILE")]
    photo: Option<PathBuf>,

    /// Full path to a stitched MP4 video file including its GPMF track
    #[arg(long, value_name = "FILE", conflicts_with = "photo")]
    video: Option<PathBuf>,

    /// Free-text place query to associate with the photo
    #[arg(long)]
    query: Option<String>,

    /// Latitude for nearby place lookup
    #[arg(long, default_value_t = 0.0)]
    lat: f64,

    /// Longitude for nearby place lookup
    #[arg(long, default_value_t = 0.0)]
    lon: f64,

    /// Google Maps API key, required for place lookup
    #[arg(long)]
    googlemaps_key: Option<String>,

    /// Path to the stored OAuth credentials file
    /// (default: ~/.credentials/streetviewpublish_credentials.json)
    #[arg(long, value_name = "FILE")]
    credentials: Option<PathBuf>,

    /// Developer key of the GCP project
    #[arg(long)]
    api_key: Option<String>,

    /// Chunk size for resumable uploads, in MiB
    #[arg(long, default_value_t = 20)]
    chunk_size_mib: u64,

    /// Pick the first candidate instead of prompting when several places match
    #[arg(long)]
    first_match: bool,

    /// Also write logs to ~/.streetview-uploader/logs
    #[arg(long)]
    log_to_file: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(LogConfig {
        log_to_file: cli.log_to_file,
        ..LogConfig::default()
    })?;

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let (path, kind) = match (&cli.photo, &cli.video) {
        (Some(photo), None) => (photo.clone(), MediaKind::Photo),
        (None, Some(video)) => (video.clone(), MediaKind::Video),
        _ => bail!("Either a photo or a video must be provided"),
    };

    let credentials_path = cli
        .credentials
        .clone()
        .unwrap_or_else(default_credentials_path);

    let mut client_config = ClientConfig::new();
    if let Some(api_key) = &cli.api_key {
        client_config = client_config.with_api_key(api_key);
    }
    let client = Client::new(client_config);
    client
        .load_credentials_file(&credentials_path)
        .await
        .with_context(|| {
            format!(
                "failed to load OAuth credentials from {}",
                credentials_path.display()
            )
        })?;

    // Only photos carry a place in this protocol version
    let place_id = if kind == MediaKind::Photo {
        resolve_place(&cli).await?
    } else {
        None
    };
    if let Some(place_id) = &place_id {
        println!("Place id: {place_id}");
    }

    let target = UploadTarget::from_path(&path, kind)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    let uploader = Uploader::new(
        Arc::new(client),
        Arc::new(HttpTransport::new(reqwest::Client::new())),
        UploaderConfig {
            chunk_size: cli.chunk_size_mib * 1024 * 1024,
            ..UploaderConfig::default()
        },
    );

    // Ctrl-C aborts the session; a partial resumable upload cannot be
    // resumed by a later run, so the next attempt starts from offset 0.
    let cancel_token = CancellationToken::new();
    {
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(target: "main", "Interrupted, aborting upload");
                cancel_token.cancel();
            }
        });
    }

    let progress_bar = ProgressBar::new(target.size);
    progress_bar.set_style(ProgressStyle::with_template(
        "{bar:40} {bytes}/{total_bytes} ({percent}%)",
    )?);
    let progress = {
        let bar = progress_bar.clone();
        FnProgress(move |update: ProgressUpdate| bar.set_position(update.uploaded))
    };

    let resource = uploader
        .upload(&target, place_id, &progress, &cancel_token)
        .await?;
    progress_bar.finish_and_clear();

    match kind {
        MediaKind::Photo => println!("Photo created successfully: {resource}"),
        MediaKind::Video => println!("Photo sequence created: {resource}"),
    }
    Ok(())
}

fn default_credentials_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".credentials")
        .join("streetviewpublish_credentials.json")
}

/// Resolve the place to associate with a photo, prompting when the lookup
/// is ambiguous.
async fn resolve_place(cli: &Cli) -> Result<Option<String>> {
    let query = if let Some(text) = &cli.query {
        Some(PlaceQuery::Text(text.clone()))
    } else if cli.lat != 0.0 && cli.lon != 0.0 {
        Some(PlaceQuery::Coordinates {
            lat: cli.lat,
            lon: cli.lon,
        })
    } else {
        None
    };
    let Some(query) = query else {
        return Ok(None);
    };

    let Some(maps_key) = &cli.googlemaps_key else {
        bail!("A valid Google Maps API key must be provided for place lookup");
    };

    let resolver = PlaceResolver::new(PlacesClient::new(maps_key.clone()));

    if cli.first_match {
        let chosen = resolver
            .resolve_with_policy(&query, SelectionPolicy::FirstMatch)
            .await?;
        if chosen.is_none() {
            println!("Place not found");
        }
        return Ok(chosen.map(|c| c.place_id));
    }

    match resolver.resolve(&query).await? {
        PlaceLookup::NoMatch => {
            println!("Place not found");
            Ok(None)
        }
        PlaceLookup::AutoSelect(candidate) => {
            let accepted = Confirm::new()
                .with_prompt(format!("Use place: {}?", candidate.label()))
                .default(true)
                .interact()?;
            Ok(accepted.then_some(candidate.place_id))
        }
        PlaceLookup::RequiresChoice(candidates) => {
            let labels: Vec<String> = candidates.iter().map(|c| c.label()).collect();
            let choice = Select::new()
                .with_prompt("Several places match")
                .items(&labels)
                .default(0)
                .interact()?;
            Ok(candidates.into_iter().nth(choice).map(|c| c.place_id))
        }
    }
}
