use crate::client::PlacesClient;
use crate::error::ApiResult;
use crate::models::places::PlaceCandidate;
use async_trait::async_trait;

/// Places API search methods
#[async_trait]
pub trait PlacesApi: Send + Sync {
    /// Free-text place search
    async fn search_text(&self, query: &str) -> ApiResult<Vec<PlaceCandidate>>;

    /// Establishments within `radius_m` meters of a coordinate pair
    async fn search_nearby(&self, lat: f64, lon: f64, radius_m: u32)
        -> ApiResult<Vec<PlaceCandidate>>;
}

#[async_trait]
impl PlacesApi for PlacesClient {
    async fn search_text(&self, query: &str) -> ApiResult<Vec<PlaceCandidate>> {
        self.search(&format!(
            "/textsearch/json?query={}&type=establishment",
            urlencoding::encode(query)
        ))
        .await
    }

    async fn search_nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
    ) -> ApiResult<Vec<PlaceCandidate>> {
        self.search(&format!(
            "/nearbysearch/json?location={},{}&radius={}&type=establishment",
            lat, lon, radius_m
        ))
        .await
    }
}
