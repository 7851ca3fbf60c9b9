//! Volunteer Match - match scoring and ranking for volunteer opportunity postings
//!
//! This library scores how well each posting suits a volunteer on location,
//! skills, availability and interests, and ranks the catalog by that score.
//! Locations given as free text are resolved through a cached geocoder.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance::{calculate_bounding_box, haversine_distance, DistanceUnit},
    MatchEngine, Matcher, RankError, ScoringPolicy,
};
pub use crate::models::{Coordinates, Posting, ScoredCandidate, ScoringWeights, UserProfile};
pub use crate::services::{Geocoder, Resolution};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let center = Coordinates { lat: 38.9072, lng: -77.0369 };
        let bbox = calculate_bounding_box(center, 10.0, DistanceUnit::Kilometers);
        assert!(bbox.min_lat < center.lat);
        assert_eq!(haversine_distance(center, center, DistanceUnit::Miles), 0.0);
    }
}
