//! Place lookup and disambiguation
//!
//! Maps a free-text query or coordinate pair to place candidates and
//! classifies the outcome. The selection policy for ambiguous results is
//! supplied by the caller (the CLI prompts interactively; non-interactive
//! callers pick the first match or fail).

use streetview_api::api::PlacesApi;
use streetview_api::error::{ApiError, ApiResult};
use streetview_api::models::places::PlaceCandidate;
use tracing::debug;

/// Radius used for nearby lookups from a coordinate pair
pub const NEARBY_LOOKUP_RADIUS_METERS: u32 = 10;

/// What to look up
#[derive(Debug, Clone)]
pub enum PlaceQuery {
    Text(String),
    Coordinates { lat: f64, lon: f64 },
}

/// Outcome of a place lookup
#[derive(Debug, Clone)]
pub enum PlaceLookup {
    /// Exactly one candidate matched
    AutoSelect(PlaceCandidate),
    /// Several candidates matched; someone has to choose
    RequiresChoice(Vec<PlaceCandidate>),
    /// Nothing matched
    NoMatch,
}

/// Policy for resolving an ambiguous lookup without a human
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    FirstMatch,
    FailOnAmbiguous,
}

/// Resolves place queries against the Places API
pub struct PlaceResolver<P> {
    places: P,
    radius_m: u32,
}

impl<P: PlacesApi> PlaceResolver<P> {
    pub fn new(places: P) -> Self {
        Self {
            places,
            radius_m: NEARBY_LOOKUP_RADIUS_METERS,
        }
    }

    /// Look up candidates and classify the result
    pub async fn resolve(&self, query: &PlaceQuery) -> ApiResult<PlaceLookup> {
        let candidates = match query {
            PlaceQuery::Text(text) => self.places.search_text(text).await?,
            PlaceQuery::Coordinates { lat, lon } => {
                self.places.search_nearby(*lat, *lon, self.radius_m).await?
            }
        };

        debug!(
            target: "places",
            candidates = candidates.len(),
            "Place lookup finished"
        );

        let mut candidates = candidates;
        Ok(match candidates.len() {
            0 => PlaceLookup::NoMatch,
            1 => PlaceLookup::AutoSelect(candidates.remove(0)),
            _ => PlaceLookup::RequiresChoice(candidates),
        })
    }

    /// Resolve to a single place id under a non-interactive policy
    pub async fn resolve_with_policy(
        &self,
        query: &PlaceQuery,
        policy: SelectionPolicy,
    ) -> ApiResult<Option<PlaceCandidate>> {
        match self.resolve(query).await? {
            PlaceLookup::NoMatch => Ok(None),
            PlaceLookup::AutoSelect(candidate) => Ok(Some(candidate)),
            PlaceLookup::RequiresChoice(candidates) => match policy {
                SelectionPolicy::FirstMatch => Ok(candidates.into_iter().next()),
                SelectionPolicy::FailOnAmbiguous => Err(ApiError::Other(format!(
                    "{} places match the query",
                    candidates.len()
                ))),
            },
        }
    }
}
