use actix_web::{web, HttpResponse, Responder};

use crate::models::{ErrorResponse, GeocodeQuery, GeocodeResponse};
use crate::routes::AppState;
use crate::services::Resolution;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/geocode", web::get().to(geocode_address));
}

/// Resolve an address to coordinates
///
/// GET /api/v1/geocode?address={address}
async fn geocode_address(state: web::Data<AppState>, query: web::Query<GeocodeQuery>) -> impl Responder {
    let Some(address) = query.address.as_deref().filter(|a| !a.trim().is_empty()) else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Missing address parameter",
            "address query parameter is required",
            400,
        ));
    };

    match state.geocoder.resolve(address).await {
        Resolution::Found(location) => HttpResponse::Ok().json(GeocodeResponse {
            lat: location.coordinates.lat,
            lng: location.coordinates.lng,
            formatted_address: location.formatted_address,
        }),
        Resolution::NotFound => HttpResponse::NotFound().json(ErrorResponse::new(
            "not_found",
            format!("No location found for {:?}", address),
            404,
        )),
    }
}
