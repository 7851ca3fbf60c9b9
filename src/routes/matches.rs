use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::filters::{filter_within_radius, matches_search_text};
use crate::core::{MatchEngine, Matcher, ScoringPolicy};
use crate::models::{
    Availability, Coordinates, ErrorResponse, HealthResponse, NearbyRequest, Posting, RankPostingsRequest,
    RankResponse, ScoreRequest, UserProfile,
};
use crate::services::{GeocodeCache, Geocoder, PostingCatalog, ProfileProvider};

/// Search radius for nearby postings when the request names none, in miles
pub const DEFAULT_NEARBY_RADIUS: f64 = 25.0;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub geocoder: Arc<dyn Geocoder>,
    pub profiles: Arc<dyn ProfileProvider>,
    pub catalog: Arc<dyn PostingCatalog>,
    /// Ranks with the configured policy
    pub engine: MatchEngine,
    /// Ranks nearby searches with the tiered-distance policy
    pub nearby_engine: MatchEngine,
    /// Cache behind `geocoder`, reported by the health check
    pub geocode_cache: Option<Arc<GeocodeCache>>,
}

impl AppState {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        profiles: Arc<dyn ProfileProvider>,
        catalog: Arc<dyn PostingCatalog>,
        policy: ScoringPolicy,
        max_concurrency: usize,
    ) -> Self {
        let engine = MatchEngine::new(geocoder.clone(), Matcher::new(policy)).with_max_concurrency(max_concurrency);
        let nearby_engine = MatchEngine::new(geocoder.clone(), Matcher::new(ScoringPolicy::tiered_distance()))
            .with_max_concurrency(max_concurrency);

        Self {
            geocoder,
            profiles,
            catalog,
            engine,
            nearby_engine,
            geocode_cache: None,
        }
    }

    pub fn with_geocode_cache(mut self, cache: Arc<GeocodeCache>) -> Self {
        self.geocode_cache = Some(cache);
        self
    }
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/score", web::post().to(score_postings))
        .route("/matches/postings", web::post().to(rank_postings))
        .route("/opportunities/nearby", web::post().to(find_nearby));
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", message, 400))
}

fn internal_error(error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse::new(error, message, 500))
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        geocode_cache: state.geocode_cache.as_ref().map(|cache| cache.stats()),
    })
}

/// Score the catalog for explicit coordinates and preferences
///
/// POST /api/v1/matches/score
///
/// Request body:
/// ```json
/// {
///   "locationText": "string",
///   "userLat": 38.9,
///   "userLng": -77.03,
///   "preferences": { "skills": [], "availability": [], "interests": [] }
/// }
/// ```
///
/// Returns a JSON array of scored postings in ranking order.
async fn score_postings(state: web::Data<AppState>, req: web::Json<ScoreRequest>) -> impl Responder {
    let request_id = Uuid::new_v4();

    if let Err(errors) = req.validate() {
        tracing::info!(%request_id, "Validation failed for score request: {:?}", errors);
        return bad_request(errors.to_string());
    }

    let (Some(location_text), Some(lat), Some(lng)) = (req.location_text.as_deref(), req.user_lat, req.user_lng) else {
        return bad_request("locationText, userLat and userLng are required");
    };

    // Zero is treated as "not supplied"
    if lat == 0.0 || lng == 0.0 {
        return bad_request("userLat and userLng must be non-zero");
    }

    let Some(user_coordinates) = Coordinates::new(lat, lng) else {
        return bad_request("userLat or userLng out of range");
    };

    let preferences = &req.preferences;
    let user = UserProfile {
        skills: preferences.skills.clone(),
        interests: preferences.interests.clone(),
        availability: Some(Availability::Many(preferences.availability.clone())),
        ..UserProfile::default()
    };

    tracing::info!(%request_id, "Scoring postings for {:?} at ({}, {})", location_text, lat, lng);

    let catalog = match state.catalog.list_postings().await {
        Ok(postings) => postings,
        Err(e) => {
            tracing::error!(%request_id, "Failed to list postings: {}", e);
            return internal_error("Failed to list postings", e.to_string());
        }
    };

    let postings: Vec<Posting> = catalog
        .into_iter()
        .filter(|p| matches_search_text(p, location_text))
        .collect();

    match state.engine.rank_at(Some(&user), Some(user_coordinates), &postings).await {
        Ok(ranked) => HttpResponse::Ok().json(ranked.candidates),
        Err(e) => {
            tracing::error!(%request_id, "Ranking failed: {}", e);
            internal_error("Ranking failed", e.to_string())
        }
    }
}

/// Rank the whole catalog for a stored profile
///
/// POST /api/v1/matches/postings
///
/// Request body:
/// ```json
/// { "userId": "string" }
/// ```
///
/// Without a `userId`, or for an unknown one, every posting is listed with a zero score.
async fn rank_postings(state: web::Data<AppState>, req: web::Json<RankPostingsRequest>) -> impl Responder {
    let request_id = Uuid::new_v4();

    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }

    let profile = match req.user_id.as_deref() {
        Some(user_id) => match state.profiles.get_user_profile(user_id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                tracing::info!(%request_id, "No profile for {}, ranking anonymously", user_id);
                None
            }
            Err(e) => {
                tracing::error!(%request_id, "Failed to fetch profile for {}: {}", user_id, e);
                return internal_error("Failed to fetch user profile", e.to_string());
            }
        },
        None => None,
    };

    let catalog = match state.catalog.list_postings().await {
        Ok(postings) => postings,
        Err(e) => {
            tracing::error!(%request_id, "Failed to list postings: {}", e);
            return internal_error("Failed to list postings", e.to_string());
        }
    };

    match state.engine.rank_for_profile(profile.as_ref(), &catalog).await {
        Ok(ranked) => {
            tracing::info!(
                %request_id,
                "Returning {} ranked postings (anonymous: {})",
                ranked.candidates.len(),
                profile.is_none()
            );

            HttpResponse::Ok().json(RankResponse {
                total_results: ranked.total_candidates,
                unresolved_locations: ranked.unresolved_locations,
                matches: ranked.candidates,
            })
        }
        Err(e) => {
            tracing::error!(%request_id, "Ranking failed: {}", e);
            internal_error("Ranking failed", e.to_string())
        }
    }
}

/// Find postings within a radius of an address
///
/// POST /api/v1/opportunities/nearby
///
/// Request body:
/// ```json
/// { "address": "string", "maxRadius": 25 }
/// ```
///
/// Distances are in miles, scored 3/2/1 for postings within 5/15/25 miles.
async fn find_nearby(state: web::Data<AppState>, req: web::Json<NearbyRequest>) -> impl Responder {
    let request_id = Uuid::new_v4();

    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }

    let Some(center) = state.geocoder.resolve(&req.address).await.coordinates() else {
        tracing::info!(%request_id, "Could not geocode search address {:?}", req.address);
        return HttpResponse::UnprocessableEntity().json(ErrorResponse::new(
            "unresolvable_address",
            format!("Could not find a location for {:?}", req.address),
            422,
        ));
    };

    let catalog = match state.catalog.list_postings().await {
        Ok(postings) => postings,
        Err(e) => {
            tracing::error!(%request_id, "Failed to list postings: {}", e);
            return internal_error("Failed to list postings", e.to_string());
        }
    };

    let seeker = UserProfile::default();
    let ranked = match state.nearby_engine.rank_at(Some(&seeker), Some(center), &catalog).await {
        Ok(ranked) => ranked,
        Err(e) => {
            tracing::error!(%request_id, "Ranking failed: {}", e);
            return internal_error("Ranking failed", e.to_string());
        }
    };

    let max_radius = req.max_radius.unwrap_or(DEFAULT_NEARBY_RADIUS);
    let unit = state.nearby_engine.matcher().policy().unit;
    let matches = filter_within_radius(ranked.candidates, center, max_radius, unit);

    tracing::info!(%request_id, "Found {} postings within {} {}", matches.len(), max_radius, unit);

    HttpResponse::Ok().json(RankResponse {
        matches,
        total_results: ranked.total_candidates,
        unresolved_locations: ranked.unresolved_locations,
    })
}
