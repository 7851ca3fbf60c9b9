// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Availability, BoundingBox, Coordinates, FactorScores, Posting, ScoredCandidate, ScoringWeights, UserProfile};
pub use requests::{GeocodeQuery, MatchPreferences, NearbyRequest, RankPostingsRequest, ScoreRequest};
pub use responses::{ErrorResponse, GeocodeResponse, HealthResponse, RankResponse};
