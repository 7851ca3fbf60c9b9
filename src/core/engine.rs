use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::core::matcher::{Matcher, RankError};
use crate::models::{Coordinates, Posting, ScoredCandidate, UserProfile};
use crate::services::geocoder::Geocoder;

/// Default cap on outstanding geocoding lookups per ranking request
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Outcome of a ranking request
#[derive(Debug)]
pub struct RankedPostings {
    pub candidates: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    /// Postings whose location could not be resolved
    pub unresolved_locations: usize,
}

/// Async front of the `Matcher`: resolves locations, then ranks
///
/// Lookups for a request run concurrently up to `max_concurrency`. Dropping the
/// returned future abandons every in-flight lookup; nothing is returned for a
/// cancelled request.
#[derive(Clone)]
pub struct MatchEngine {
    geocoder: Arc<dyn Geocoder>,
    matcher: Matcher,
    max_concurrency: usize,
}

impl MatchEngine {
    pub fn new(geocoder: Arc<dyn Geocoder>, matcher: Matcher) -> Self {
        Self {
            geocoder,
            matcher,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Resolve a volunteer's address, `None` for anonymous or unresolvable
    pub async fn resolve_user(&self, user: Option<&UserProfile>) -> Option<Coordinates> {
        let address = user?.address_text()?;
        self.geocoder.resolve(address).await.coordinates()
    }

    /// Copies of `postings` with `coordinates` filled in where a lookup succeeded.
    ///
    /// Postings that already carry coordinates are not looked up. Output order
    /// matches input order.
    pub async fn resolve_postings(&self, postings: &[Posting]) -> Vec<Posting> {
        let geocoder = &self.geocoder;

        stream::iter(postings)
            .map(|posting| async move {
                let mut resolved = posting.clone();
                if resolved.coordinates.is_none() {
                    if let Some(text) = posting.location_text() {
                        resolved.coordinates = geocoder.resolve(text).await.coordinates();
                    }
                }
                resolved
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    /// Rank the catalog for a stored profile, geocoding its address
    pub async fn rank_for_profile(
        &self,
        user: Option<&UserProfile>,
        postings: &[Posting],
    ) -> Result<RankedPostings, RankError> {
        let needs_coordinates = user.is_some() && self.matcher.policy().location.needs_coordinates();

        let user_coordinates = if needs_coordinates {
            self.resolve_user(user).await
        } else {
            None
        };

        self.rank_at(user, user_coordinates, postings).await
    }

    /// Rank the catalog for a volunteer at known coordinates
    pub async fn rank_at(
        &self,
        user: Option<&UserProfile>,
        user_coordinates: Option<Coordinates>,
        postings: &[Posting],
    ) -> Result<RankedPostings, RankError> {
        // Distances need both ends
        let needs_coordinates =
            user.is_some() && user_coordinates.is_some() && self.matcher.policy().location.needs_coordinates();

        let resolved = if needs_coordinates {
            self.resolve_postings(postings).await
        } else {
            postings.to_vec()
        };

        let unresolved_locations = if needs_coordinates {
            resolved.iter().filter(|p| p.coordinates.is_none()).count()
        } else {
            0
        };

        let candidates = self.matcher.rank(user, user_coordinates, &resolved)?;

        tracing::info!(
            "Ranked {} postings ({} unresolved locations, preset {})",
            candidates.len(),
            unresolved_locations,
            self.matcher.policy().preset
        );

        Ok(RankedPostings {
            total_candidates: postings.len(),
            candidates,
            unresolved_locations,
        })
    }
}
