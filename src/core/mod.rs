// Core algorithm exports
pub mod distance;
pub mod engine;
pub mod filters;
pub mod matcher;
pub mod scoring;

pub use distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box, DistanceUnit};
pub use engine::{MatchEngine, RankedPostings};
pub use filters::{filter_within_radius, matches_search_text, overlap_fraction};
pub use matcher::{Matcher, RankError};
pub use scoring::{composite_score, EmptyRequirementPolicy, FactorScorer, LocationPolicy, ScoringPolicy, ScoringPreset};
