use serde::Deserialize;

/// A single place returned by the Places API
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceCandidate {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

impl PlaceCandidate {
    /// Human-readable label for prompts and logs
    pub fn label(&self) -> String {
        match &self.formatted_address {
            Some(address) => format!("{}, {}", self.name, address),
            None => self.name.clone(),
        }
    }
}

/// Places API search response envelope
#[derive(Debug, Deserialize)]
pub struct PlacesSearchResponse {
    #[serde(default)]
    pub results: Vec<PlaceCandidate>,
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
}
