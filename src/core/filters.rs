use std::collections::BTreeSet;

use crate::core::distance::{calculate_bounding_box, is_within_bounding_box, DistanceUnit};
use crate::models::{Coordinates, Posting, ScoredCandidate};

/// Canonical form of a tag: trimmed and lowercased, `None` when blank
#[inline]
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Normalize a list of tags into a set, dropping blanks and duplicates
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> BTreeSet<String> {
    tags.iter().filter_map(|t| normalize_tag(t.as_ref())).collect()
}

/// Tags present in both sets, in sorted order
pub fn shared_tags(user: &BTreeSet<String>, required: &BTreeSet<String>) -> Vec<String> {
    user.intersection(required).cloned().collect()
}

/// `|user ∩ required| / max(|user|, |required|)`, 0 if either side is empty
#[inline]
pub fn overlap_fraction(user: &BTreeSet<String>, required: &BTreeSet<String>) -> f64 {
    let denominator = user.len().max(required.len());
    if denominator == 0 {
        return 0.0;
    }
    user.intersection(required).count() as f64 / denominator as f64
}

/// Catalog search: does the posting's title or location mention `query`?
///
/// A blank query matches every posting.
pub fn matches_search_text(posting: &Posting, query: &str) -> bool {
    let Some(needle) = normalize_tag(query) else {
        return true;
    };

    [
        Some(posting.title.as_str()),
        posting.location.as_deref(),
        posting.required_location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Keep candidates with a known distance no greater than `max_distance`.
///
/// The bounding box is checked first and the exact distance second, in the same
/// unit the candidates were scored in.
pub fn filter_within_radius(
    candidates: Vec<ScoredCandidate>,
    center: Coordinates,
    max_distance: f64,
    unit: DistanceUnit,
) -> Vec<ScoredCandidate> {
    let bbox = calculate_bounding_box(center, max_distance, unit);

    candidates
        .into_iter()
        .filter(|c| {
            c.posting
                .coordinates
                .map(|p| is_within_bounding_box(p, &bbox))
                .unwrap_or(false)
        })
        .filter(|c| matches!(c.distance, Some(d) if d <= max_distance))
        .collect()
}
