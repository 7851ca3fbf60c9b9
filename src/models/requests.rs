use serde::{Deserialize, Serialize};
use validator::Validate;

/// Volunteer preferences supplied inline with a scoring request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchPreferences {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Request to score the catalog against explicit coordinates and preferences
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreRequest {
    #[validate(required)]
    #[serde(rename = "locationText", default)]
    pub location_text: Option<String>,
    #[validate(required, range(min = -90.0, max = 90.0))]
    #[serde(rename = "userLat", default)]
    pub user_lat: Option<f64>,
    #[validate(required, range(min = -180.0, max = 180.0))]
    #[serde(rename = "userLng", default)]
    pub user_lng: Option<f64>,
    #[serde(default)]
    pub preferences: MatchPreferences,
}

/// Request to rank the catalog for a stored profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RankPostingsRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: Option<String>,
}

/// Request to find postings near an address
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NearbyRequest {
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(range(min = 0.0))]
    #[serde(rename = "maxRadius", default)]
    pub max_radius: Option<f64>,
}

/// Query string for the geocode endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeQuery {
    pub address: Option<String>,
}
