use serde::{Deserialize, Serialize};
use crate::models::domain::ScoredCandidate;
use crate::services::cache::CacheStats;

/// Response for the ranking endpoints
#[derive(Debug, Clone, Serialize)]
pub struct RankResponse {
    pub matches: Vec<ScoredCandidate>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
    #[serde(rename = "unresolvedLocations")]
    pub unresolved_locations: usize,
}

/// Response for the geocode endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "formattedAddress")]
    pub formatted_address: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "geocodeCache", default, skip_serializing_if = "Option::is_none")]
    pub geocode_cache: Option<CacheStats>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            status_code,
        }
    }
}
