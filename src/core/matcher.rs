use std::cmp::Ordering;
use thiserror::Error;

use crate::core::scoring::{composite_score, FactorScorer, ScoringPolicy};
use crate::models::{Coordinates, FactorScores, Posting, ScoredCandidate, ScoringWeights, UserProfile};

/// Errors that abort a ranking pass
#[derive(Debug, Error, PartialEq)]
pub enum RankError {
    #[error("Malformed posting at index {index} ({id}): {reason}")]
    MalformedPosting {
        index: usize,
        id: String,
        reason: String,
    },

    #[error("Invalid scoring weights: {0:?}")]
    InvalidWeights(ScoringWeights),
}

/// Ranking engine - scores every posting and orders the result
///
/// # Ordering
/// 1. Composite score, descending
/// 2. Distance, ascending (unknown distances last)
/// 3. Catalog order (the sort is stable)
#[derive(Debug, Clone)]
pub struct Matcher {
    scorer: FactorScorer,
}

impl Matcher {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            scorer: FactorScorer::new(policy),
        }
    }

    pub fn with_default_policy() -> Self {
        Self::new(ScoringPolicy::default())
    }

    pub fn policy(&self) -> &ScoringPolicy {
        self.scorer.policy()
    }

    /// Rank postings for a volunteer using the policy's weights
    ///
    /// # Arguments
    /// * `user` - The volunteer, or `None` for an anonymous visitor
    /// * `user_coordinates` - The volunteer's resolved location, if any
    /// * `postings` - Catalog to rank; resolved locations are read from `Posting::coordinates`
    ///
    /// # Returns
    /// One `ScoredCandidate` per posting, in ranking order. Anonymous visitors get
    /// every posting back with all scores at zero.
    pub fn rank(
        &self,
        user: Option<&UserProfile>,
        user_coordinates: Option<Coordinates>,
        postings: &[Posting],
    ) -> Result<Vec<ScoredCandidate>, RankError> {
        self.rank_with_weights(user, user_coordinates, postings, &self.policy().weights)
    }

    /// Rank postings with explicit weights instead of the policy's
    pub fn rank_with_weights(
        &self,
        user: Option<&UserProfile>,
        user_coordinates: Option<Coordinates>,
        postings: &[Posting],
        weights: &ScoringWeights,
    ) -> Result<Vec<ScoredCandidate>, RankError> {
        if !weights.is_valid() {
            return Err(RankError::InvalidWeights(*weights));
        }

        let user_coordinates = user_coordinates.filter(Coordinates::is_valid);
        let unit = self.policy().unit;

        let mut scored = Vec::with_capacity(postings.len());

        for (index, posting) in postings.iter().enumerate() {
            validate_posting(index, posting)?;

            let candidate = match user {
                Some(user) => {
                    let breakdown = self.scorer.score(user, user_coordinates, posting);
                    let match_score = composite_score(&breakdown.scores, weights);

                    tracing::debug!(
                        posting = %posting.title,
                        location = breakdown.scores.location,
                        skills = breakdown.scores.skills,
                        availability = breakdown.scores.availability,
                        interest = breakdown.scores.interest,
                        match_score,
                        "Scored posting"
                    );

                    ScoredCandidate {
                        posting: posting.clone(),
                        scores: breakdown.scores,
                        match_score,
                        distance: breakdown.distance,
                        distance_unit: unit,
                        shared_skills: breakdown.shared_skills,
                        shared_interests: breakdown.shared_interests,
                    }
                }
                None => ScoredCandidate {
                    posting: posting.clone(),
                    scores: FactorScores::default(),
                    match_score: 0.0,
                    distance: None,
                    distance_unit: unit,
                    shared_skills: Vec::new(),
                    shared_interests: Vec::new(),
                },
            };

            scored.push(candidate);
        }

        sort_candidates(&mut scored);

        Ok(scored)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_policy()
    }
}

fn validate_posting(index: usize, posting: &Posting) -> Result<(), RankError> {
    match posting.coordinates {
        Some(coordinates) if !coordinates.is_valid() => Err(RankError::MalformedPosting {
            index,
            id: posting.id.clone().unwrap_or_else(|| posting.title.clone()),
            reason: format!("coordinates out of range: ({}, {})", coordinates.lat, coordinates.lng),
        }),
        _ => Ok(()),
    }
}

/// Sort by score (descending) and then by distance (ascending)
pub fn sort_candidates(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| compare_distance(a.distance, b.distance))
    });
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
