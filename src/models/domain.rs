use serde::{Deserialize, Serialize};

use crate::core::distance::DistanceUnit;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let coordinates = Self { lat, lng };
        coordinates.is_valid().then_some(coordinates)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Availability is stored either as a single slot ("weekends") or a list of slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Availability {
    One(String),
    Many(Vec<String>),
}

impl Availability {
    pub fn values(&self) -> &[String] {
        match self {
            Availability::One(value) => std::slice::from_ref(value),
            Availability::Many(values) => values,
        }
    }
}

/// Volunteer profile, read-only to the engine.
///
/// Every matching field is optional; a missing field means "no preference".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub availability: Option<Availability>,
    #[serde(default)]
    pub address: Option<String>,
}

impl UserProfile {
    pub fn availability(&self) -> &[String] {
        self.availability.as_ref().map(Availability::values).unwrap_or(&[])
    }

    /// Address text, if it carries anything other than whitespace
    pub fn address_text(&self) -> Option<&str> {
        non_blank(self.address.as_deref())
    }
}

/// Opportunity posting from the catalog, read-only to the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "requiredInterests", default)]
    pub required_interests: Vec<String>,
    #[serde(rename = "requiredSkills", default)]
    pub required_skills: Vec<String>,
    #[serde(rename = "requiredAvailability", default)]
    pub required_availability: Option<Availability>,
    #[serde(rename = "requiredLocation", default)]
    pub required_location: Option<String>,
    /// Pre-resolved coordinates; when present the posting is not geocoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Posting {
    pub fn required_availability(&self) -> &[String] {
        self.required_availability
            .as_ref()
            .map(Availability::values)
            .unwrap_or(&[])
    }

    /// Text used to geocode the posting: the required location, falling back
    /// to the display location
    pub fn location_text(&self) -> Option<&str> {
        non_blank(self.required_location.as_deref()).or_else(|| non_blank(self.location.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Per-dimension match quality, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub location: f64,
    pub skills: f64,
    pub availability: f64,
    pub interest: f64,
}

/// A posting with its factor breakdown and composite score.
///
/// Built fresh for every ranking call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub posting: Posting,
    pub scores: FactorScores,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    /// Distance between the volunteer and the posting, in `distance_unit`
    pub distance: Option<f64>,
    #[serde(rename = "distanceUnit")]
    pub distance_unit: DistanceUnit,
    #[serde(rename = "sharedSkills")]
    pub shared_skills: Vec<String>,
    #[serde(rename = "sharedInterests")]
    pub shared_interests: Vec<String>,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub location: f64,
    pub skills: f64,
    pub availability: f64,
    pub interest: f64,
}

impl ScoringWeights {
    /// Every weight finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.location, self.skills, self.availability, self.interest]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }

    pub fn equal() -> Self {
        Self {
            location: 0.25,
            skills: 0.25,
            availability: 0.25,
            interest: 0.25,
        }
    }

    pub fn location_only() -> Self {
        Self {
            location: 1.0,
            skills: 0.0,
            availability: 0.0,
            interest: 0.0,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            location: 0.4,
            skills: 0.3,
            availability: 0.2,
            interest: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_range_checked() {
        assert!(Coordinates::new(38.9, -77.03).is_some());
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_availability_accepts_string_or_list() {
        let posting: Posting = serde_json::from_str(
            r#"{"title": "Food bank", "requiredAvailability": "weekends"}"#,
        )
        .unwrap();
        assert_eq!(posting.required_availability(), ["weekends".to_string()]);

        let user: UserProfile =
            serde_json::from_str(r#"{"name": "Ada", "availability": ["mornings", "weekends"]}"#)
                .unwrap();
        assert_eq!(user.availability().len(), 2);
    }

    #[test]
    fn test_location_text_prefers_required_location() {
        let mut posting = Posting {
            title: "Park cleanup".to_string(),
            location: Some("Rock Creek Park".to_string()),
            required_location: Some("  ".to_string()),
            ..Posting::default()
        };
        assert_eq!(posting.location_text(), Some("Rock Creek Park"));

        posting.required_location = Some("Washington, DC".to_string());
        assert_eq!(posting.location_text(), Some("Washington, DC"));
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = ScoringWeights::default();
        assert!((w.location + w.skills + w.availability + w.interest - 1.0).abs() < 1e-9);
        assert!(w.is_valid());
        assert!(!ScoringWeights { skills: -0.1, ..w }.is_valid());
    }
}
