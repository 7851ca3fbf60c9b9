use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::core::distance::{haversine_distance, DistanceUnit};
use crate::core::filters::{normalize_tag, normalize_tags, overlap_fraction, shared_tags};
use crate::models::{Coordinates, FactorScores, Posting, ScoringWeights, UserProfile};

/// Distance beyond which the continuous location score reaches zero
pub const DEFAULT_MAX_DISTANCE: f64 = 100.0;

/// Distance tiers as (upper bound, points), checked in order
pub const DEFAULT_DISTANCE_TIERS: [(f64, u8); 3] = [(5.0, 3), (15.0, 2), (25.0, 1)];

/// How a set-valued factor scores when either side has no values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyRequirementPolicy {
    /// Nothing to compare: the factor contributes 0
    #[default]
    Zero,
    /// No requirement is a wildcard: the factor scores 1
    Neutral,
}

/// How two non-empty tag sets are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapMode {
    /// Graded `|a ∩ b| / max(|a|, |b|)`
    Fraction,
    /// 1 if the sets share any tag
    AnyMatch,
}

/// How the location factor is derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum LocationPolicy {
    /// `max(0, 1 - distance / max_distance)`
    ContinuousDecay { max_distance: f64 },
    /// Points for the first tier the distance falls into, normalized by the top tier
    Tiered { tiers: Vec<(f64, u8)> },
    /// Case-insensitive equality of the volunteer address and the required location
    TextMatch,
}

impl LocationPolicy {
    /// Whether this policy needs geocoded coordinates at all
    pub fn needs_coordinates(&self) -> bool {
        !matches!(self, LocationPolicy::TextMatch)
    }

    /// Location factor for a known distance
    pub fn score(&self, distance: f64) -> f64 {
        match self {
            LocationPolicy::ContinuousDecay { max_distance } => {
                if *max_distance <= 0.0 {
                    return 0.0;
                }
                (1.0 - distance / max_distance).max(0.0)
            }
            LocationPolicy::Tiered { tiers } => {
                let top = tiers.iter().map(|(_, points)| *points).max().unwrap_or(0);
                if top == 0 {
                    return 0.0;
                }
                let points = tiers
                    .iter()
                    .find(|(bound, _)| distance <= *bound)
                    .map(|(_, points)| *points)
                    .unwrap_or(0);
                f64::from(points) / f64::from(top)
            }
            LocationPolicy::TextMatch => 0.0,
        }
    }
}

/// Named scoring presets, one per scoring behavior the product has shipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringPreset {
    /// One point per dimension with any overlap, location by address text
    SimpleOverlap,
    /// Location only, bucketed into 5/15/25 mile tiers
    TieredDistance,
    /// Graded overlaps plus continuous distance decay, weighted
    #[default]
    WeightedContinuous,
}

impl fmt::Display for ScoringPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoringPreset::SimpleOverlap => "simple-overlap",
            ScoringPreset::TieredDistance => "tiered-distance",
            ScoringPreset::WeightedContinuous => "weighted-continuous",
        };
        f.write_str(name)
    }
}

impl FromStr for ScoringPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "simple-overlap" => Ok(ScoringPreset::SimpleOverlap),
            "tiered-distance" => Ok(ScoringPreset::TieredDistance),
            "weighted-continuous" => Ok(ScoringPreset::WeightedContinuous),
            other => Err(format!("unknown scoring preset: {}", other)),
        }
    }
}

/// Complete scoring configuration, fixed when a `Matcher` is built
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub preset: ScoringPreset,
    pub overlap: OverlapMode,
    pub location: LocationPolicy,
    pub empty_requirement: EmptyRequirementPolicy,
    pub unit: DistanceUnit,
    pub weights: ScoringWeights,
}

impl ScoringPolicy {
    pub fn from_preset(preset: ScoringPreset) -> Self {
        match preset {
            ScoringPreset::SimpleOverlap => Self::simple_overlap(),
            ScoringPreset::TieredDistance => Self::tiered_distance(),
            ScoringPreset::WeightedContinuous => Self::weighted_continuous(),
        }
    }

    pub fn weighted_continuous() -> Self {
        Self {
            preset: ScoringPreset::WeightedContinuous,
            overlap: OverlapMode::Fraction,
            location: LocationPolicy::ContinuousDecay {
                max_distance: DEFAULT_MAX_DISTANCE,
            },
            empty_requirement: EmptyRequirementPolicy::Zero,
            unit: DistanceUnit::Kilometers,
            weights: ScoringWeights::default(),
        }
    }

    pub fn tiered_distance() -> Self {
        Self {
            preset: ScoringPreset::TieredDistance,
            overlap: OverlapMode::AnyMatch,
            location: LocationPolicy::Tiered {
                tiers: DEFAULT_DISTANCE_TIERS.to_vec(),
            },
            empty_requirement: EmptyRequirementPolicy::Zero,
            unit: DistanceUnit::Miles,
            weights: ScoringWeights::location_only(),
        }
    }

    pub fn simple_overlap() -> Self {
        Self {
            preset: ScoringPreset::SimpleOverlap,
            overlap: OverlapMode::AnyMatch,
            location: LocationPolicy::TextMatch,
            empty_requirement: EmptyRequirementPolicy::Zero,
            unit: DistanceUnit::Miles,
            weights: ScoringWeights::equal(),
        }
    }

    pub fn with_empty_requirement(mut self, policy: EmptyRequirementPolicy) -> Self {
        self.empty_requirement = policy;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_unit(mut self, unit: DistanceUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Override the decay distance; ignored by non-continuous location policies
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        if let LocationPolicy::ContinuousDecay { .. } = self.location {
            self.location = LocationPolicy::ContinuousDecay { max_distance };
        }
        self
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::weighted_continuous()
    }
}

/// Factor scores for one posting plus the details shown next to them
#[derive(Debug, Clone, PartialEq)]
pub struct FactorBreakdown {
    pub scores: FactorScores,
    pub distance: Option<f64>,
    pub shared_skills: Vec<String>,
    pub shared_interests: Vec<String>,
}

/// Computes per-dimension scores for a volunteer against a posting
#[derive(Debug, Clone)]
pub struct FactorScorer {
    policy: ScoringPolicy,
}

impl FactorScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score every factor.
    ///
    /// `user_coordinates` is the volunteer's resolved address; the posting's
    /// resolved location is read from `posting.coordinates`. Either being absent
    /// leaves the location factor at 0.
    pub fn score(
        &self,
        user: &UserProfile,
        user_coordinates: Option<Coordinates>,
        posting: &Posting,
    ) -> FactorBreakdown {
        let user_skills = normalize_tags(&user.skills);
        let required_skills = normalize_tags(&posting.required_skills);
        let user_interests = normalize_tags(&user.interests);
        let required_interests = normalize_tags(&posting.required_interests);

        let skills = self.set_factor(&user_skills, &required_skills);
        let interest = self.set_factor(&user_interests, &required_interests);
        let availability = self.set_factor(
            &normalize_tags(user.availability()),
            &normalize_tags(posting.required_availability()),
        );

        let distance = match (user_coordinates, posting.coordinates) {
            (Some(from), Some(to)) => Some(haversine_distance(from, to, self.policy.unit)),
            _ => None,
        };

        let location = match &self.policy.location {
            LocationPolicy::TextMatch => address_matches(user, posting),
            policy => distance.map(|d| policy.score(d)).unwrap_or(0.0),
        };

        FactorBreakdown {
            scores: FactorScores {
                location,
                skills,
                availability,
                interest,
            },
            distance,
            shared_skills: shared_tags(&user_skills, &required_skills),
            shared_interests: shared_tags(&user_interests, &required_interests),
        }
    }

    fn set_factor(&self, user: &BTreeSet<String>, required: &BTreeSet<String>) -> f64 {
        if user.is_empty() || required.is_empty() {
            return match self.policy.empty_requirement {
                EmptyRequirementPolicy::Zero => 0.0,
                EmptyRequirementPolicy::Neutral => 1.0,
            };
        }

        match self.policy.overlap {
            OverlapMode::Fraction => overlap_fraction(user, required),
            OverlapMode::AnyMatch => {
                if user.intersection(required).next().is_some() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

fn address_matches(user: &UserProfile, posting: &Posting) -> f64 {
    let address = user.address_text().and_then(normalize_tag);
    let required = posting.required_location.as_deref().and_then(normalize_tag);

    match (address, required) {
        (Some(a), Some(r)) if a == r => 1.0,
        _ => 0.0,
    }
}

/// Weighted sum of the factor scores, clamped to [0, 1]
#[inline]
pub fn composite_score(scores: &FactorScores, weights: &ScoringWeights) -> f64 {
    let total = scores.location * weights.location
        + scores.skills * weights.skills
        + scores.availability * weights.availability
        + scores.interest * weights.interest;

    total.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn create_test_user() -> UserProfile {
        UserProfile {
            name: "Test Volunteer".to_string(),
            skills: strings(&["teaching"]),
            interests: strings(&["environment"]),
            address: Some("Washington, DC".to_string()),
            ..UserProfile::default()
        }
    }

    fn create_test_posting() -> Posting {
        Posting {
            title: "Science tutoring".to_string(),
            required_skills: strings(&["teaching", "programming"]),
            required_interests: strings(&["environment"]),
            required_location: Some("washington, dc".to_string()),
            coordinates: Some(Coordinates { lat: 38.91, lng: -77.04 }),
            ..Posting::default()
        }
    }

    #[test]
    fn test_weighted_continuous_factors() {
        let scorer = FactorScorer::new(ScoringPolicy::weighted_continuous());
        let user_coords = Coordinates { lat: 38.90, lng: -77.03 };

        let breakdown = scorer.score(&create_test_user(), Some(user_coords), &create_test_posting());

        assert_eq!(breakdown.scores.skills, 0.5);
        assert_eq!(breakdown.scores.interest, 1.0);
        assert_eq!(breakdown.scores.availability, 0.0);
        let distance = breakdown.distance.unwrap();
        assert!(distance > 1.0 && distance < 2.0, "got {}", distance);
        assert!((breakdown.scores.location - (1.0 - distance / 100.0)).abs() < 1e-12);
        assert_eq!(breakdown.shared_skills, vec!["teaching"]);
    }

    #[test]
    fn test_empty_requirement_policies() {
        let mut posting = create_test_posting();
        posting.required_skills.clear();

        let zero = FactorScorer::new(ScoringPolicy::weighted_continuous());
        assert_eq!(zero.score(&create_test_user(), None, &posting).scores.skills, 0.0);

        let neutral = FactorScorer::new(
            ScoringPolicy::weighted_continuous().with_empty_requirement(EmptyRequirementPolicy::Neutral),
        );
        assert_eq!(neutral.score(&create_test_user(), None, &posting).scores.skills, 1.0);
    }

    #[test]
    fn test_unresolved_location_scores_zero() {
        let scorer = FactorScorer::new(ScoringPolicy::weighted_continuous());
        let mut posting = create_test_posting();
        posting.coordinates = None;

        let breakdown = scorer.score(&create_test_user(), Some(Coordinates { lat: 38.9, lng: -77.0 }), &posting);
        assert_eq!(breakdown.scores.location, 0.0);
        assert_eq!(breakdown.distance, None);
    }

    #[test]
    fn test_continuous_decay_bounds() {
        let policy = LocationPolicy::ContinuousDecay { max_distance: 100.0 };
        assert_eq!(policy.score(0.0), 1.0);
        assert_eq!(policy.score(50.0), 0.5);
        assert_eq!(policy.score(100.0), 0.0);
        assert_eq!(policy.score(250.0), 0.0);
    }

    #[test]
    fn test_tiered_score() {
        let policy = ScoringPolicy::tiered_distance().location;
        assert_eq!(policy.score(5.0), 1.0);
        assert!((policy.score(5.1) - 2.0 / 3.0).abs() < 1e-12);
        assert!((policy.score(25.0) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(policy.score(25.1), 0.0);
    }

    #[test]
    fn test_simple_overlap_matches_address_text() {
        let scorer = FactorScorer::new(ScoringPolicy::simple_overlap());
        let breakdown = scorer.score(&create_test_user(), None, &create_test_posting());

        assert_eq!(breakdown.scores.location, 1.0);
        assert_eq!(breakdown.scores.skills, 1.0);
        assert_eq!(breakdown.scores.interest, 1.0);
        assert_eq!(breakdown.scores.availability, 0.0);
        assert_eq!(composite_score(&breakdown.scores, &scorer.policy().weights), 0.75);
    }

    #[test]
    fn test_availability_single_value_is_exact_match() {
        let scorer = FactorScorer::new(ScoringPolicy::weighted_continuous());
        let mut user = create_test_user();
        user.availability = Some(crate::models::Availability::One("Weekends".to_string()));
        let mut posting = create_test_posting();
        posting.required_availability = Some(crate::models::Availability::One("weekends".to_string()));

        assert_eq!(scorer.score(&user, None, &posting).scores.availability, 1.0);
    }

    #[test]
    fn test_composite_clamped() {
        let scores = FactorScores {
            location: 1.0,
            skills: 1.0,
            availability: 1.0,
            interest: 1.0,
        };
        let heavy = ScoringWeights {
            location: 1.0,
            skills: 1.0,
            availability: 0.0,
            interest: 0.0,
        };
        assert_eq!(composite_score(&scores, &heavy), 1.0);
        assert!((composite_score(&scores, &ScoringWeights::default()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_preset_names_round_trip() {
        for preset in [
            ScoringPreset::SimpleOverlap,
            ScoringPreset::TieredDistance,
            ScoringPreset::WeightedContinuous,
        ] {
            assert_eq!(preset.to_string().parse::<ScoringPreset>(), Ok(preset));
        }
    }
}
