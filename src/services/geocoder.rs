use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinates;

/// Default endpoint of the Google Geocoding JSON API
pub const GOOGLE_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Errors that can occur when talking to the geocoding service
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Geocoding service returned status {0}")]
    StatusError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// A successfully geocoded location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub coordinates: Coordinates,
    #[serde(rename = "formattedAddress", default)]
    pub formatted_address: Option<String>,
}

/// Outcome of resolving a location string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    Found(GeocodedLocation),
    NotFound,
}

impl Resolution {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Resolution::Found(location) => Some(location.coordinates),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Resolves free-text locations to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up a location, reporting transport and payload failures.
    ///
    /// `Ok(Resolution::NotFound)` means the service answered and knows no such place.
    async fn lookup(&self, location_text: &str) -> Result<Resolution, GeocodeError>;

    /// Resolve a location, failing open.
    ///
    /// Blank input is `NotFound` without a lookup. Every lookup error is logged and
    /// degraded to `NotFound` so one bad address never aborts a ranking pass.
    async fn resolve(&self, location_text: &str) -> Resolution {
        if location_text.trim().is_empty() {
            return Resolution::NotFound;
        }

        match self.lookup(location_text).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!("Geocoding failed for {:?}, treating as not found: {}", location_text, e);
                Resolution::NotFound
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    #[serde(default)]
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Google Geocoding API client
pub struct GoogleGeocoder {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl GoogleGeocoder {
    /// Create a new geocoding client
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn lookup(&self, location_text: &str) -> Result<Resolution, GeocodeError> {
        tracing::debug!("Geocoding address: {}", location_text);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", location_text), ("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::StatusError(response.status().to_string()));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        match body.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Ok(Resolution::NotFound),
            other => {
                let detail = body.error_message.unwrap_or_default();
                return Err(GeocodeError::StatusError(format!("{} {}", other, detail).trim().to_string()));
            }
        }

        let Some(first) = body.results.into_iter().next() else {
            return Ok(Resolution::NotFound);
        };

        let LatLng { lat, lng } = first.geometry.location;
        let coordinates = Coordinates::new(lat, lng)
            .ok_or_else(|| GeocodeError::InvalidResponse(format!("coordinates out of range: ({}, {})", lat, lng)))?;

        Ok(Resolution::Found(GeocodedLocation {
            coordinates,
            formatted_address: first.formatted_address,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn geocoder_for(server: &mockito::ServerGuard) -> GoogleGeocoder {
        GoogleGeocoder::new(
            format!("{}/maps/api/geocode/json", server.url()),
            "test_key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolves_first_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/maps/api/geocode/json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("address".into(), "1600 Pennsylvania Ave".into()),
                Matcher::UrlEncoded("key".into(), "test_key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status": "OK", "results": [
                    {"formatted_address": "1600 Pennsylvania Ave NW, Washington, DC",
                     "geometry": {"location": {"lat": 38.8977, "lng": -77.0365}}}
                ]}"#,
            )
            .create_async()
            .await;

        let resolution = geocoder_for(&server).resolve("1600 Pennsylvania Ave").await;

        mock.assert_async().await;
        let location = match resolution {
            Resolution::Found(location) => location,
            Resolution::NotFound => panic!("expected a match"),
        };
        assert_eq!(location.coordinates, Coordinates { lat: 38.8977, lng: -77.0365 });
        assert!(location.formatted_address.unwrap().contains("Washington"));
    }

    #[tokio::test]
    async fn test_zero_results_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maps/api/geocode/json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "ZERO_RESULTS", "results": []}"#)
            .create_async()
            .await;

        let geocoder = geocoder_for(&server);
        assert_eq!(geocoder.lookup("nowhere").await.unwrap(), Resolution::NotFound);
        assert_eq!(geocoder.resolve("nowhere").await, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_upstream_failures_fail_open() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/maps/api/geocode/json")
            .match_query(Matcher::UrlEncoded("address".into(), "denied".into()))
            .with_status(200)
            .with_body(r#"{"status": "REQUEST_DENIED", "error_message": "bad key"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/maps/api/geocode/json")
            .match_query(Matcher::UrlEncoded("address".into(), "garbled".into()))
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;
        server
            .mock("GET", "/maps/api/geocode/json")
            .match_query(Matcher::UrlEncoded("address".into(), "down".into()))
            .with_status(503)
            .create_async()
            .await;

        let geocoder = geocoder_for(&server);

        assert!(matches!(geocoder.lookup("denied").await, Err(GeocodeError::StatusError(_))));
        assert!(matches!(geocoder.lookup("garbled").await, Err(GeocodeError::InvalidResponse(_))));
        assert!(matches!(geocoder.lookup("down").await, Err(GeocodeError::StatusError(_))));

        for text in ["denied", "garbled", "down"] {
            assert_eq!(geocoder.resolve(text).await, Resolution::NotFound);
        }
    }

    #[tokio::test]
    async fn test_blank_input_skips_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/maps/api/geocode/json")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let geocoder = geocoder_for(&server);
        assert_eq!(geocoder.resolve("").await, Resolution::NotFound);
        assert_eq!(geocoder.resolve("   ").await, Resolution::NotFound);

        mock.assert_async().await;
    }
}
