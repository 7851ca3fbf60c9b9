// Shared test doubles for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use volunteer_match::models::{Availability, Coordinates, Posting, UserProfile};
use volunteer_match::services::{
    DocumentStoreError, GeocodeError, GeocodedLocation, Geocoder, PostingCatalog, ProfileProvider, Resolution,
};

/// Geocoder backed by a fixed table, counting lookups
#[derive(Default)]
pub struct FakeGeocoder {
    places: HashMap<String, Coordinates>,
    failing: Vec<String>,
    calls: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, text: &str, lat: f64, lng: f64) -> Self {
        self.places.insert(text.to_string(), Coordinates { lat, lng });
        self
    }

    /// Lookups for `text` fail with a service error
    pub fn with_failure(mut self, text: &str) -> Self {
        self.failing.push(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn lookup(&self, location_text: &str) -> Result<Resolution, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(location_text.to_string());

        if self.failing.iter().any(|f| f == location_text) {
            return Err(GeocodeError::StatusError("OVER_QUERY_LIMIT".to_string()));
        }

        Ok(match self.places.get(location_text) {
            Some(coordinates) => Resolution::Found(GeocodedLocation {
                coordinates: *coordinates,
                formatted_address: Some(location_text.to_string()),
            }),
            None => Resolution::NotFound,
        })
    }
}

/// In-memory profile and posting store
#[derive(Default)]
pub struct InMemoryStore {
    pub profiles: HashMap<String, UserProfile>,
    pub postings: Vec<Posting>,
    pub unavailable: bool,
}

impl InMemoryStore {
    pub fn new(postings: Vec<Posting>) -> Self {
        Self {
            postings,
            ..Self::default()
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        let id = profile.id.clone().unwrap_or_default();
        self.profiles.insert(id, profile);
        self
    }

    /// Every call fails as if the store were unreachable
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ProfileProvider for InMemoryStore {
    async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DocumentStoreError> {
        if self.unavailable {
            return Err(DocumentStoreError::ApiError("503 Service Unavailable".to_string()));
        }
        Ok(self.profiles.get(user_id).cloned())
    }
}

#[async_trait]
impl PostingCatalog for InMemoryStore {
    async fn list_postings(&self) -> Result<Vec<Posting>, DocumentStoreError> {
        if self.unavailable {
            return Err(DocumentStoreError::ApiError("503 Service Unavailable".to_string()));
        }
        Ok(self.postings.clone())
    }
}

pub fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn volunteer(id: &str, address: &str, skills: &[&str], interests: &[&str]) -> UserProfile {
    UserProfile {
        id: Some(id.to_string()),
        name: format!("Volunteer {}", id),
        email: format!("{}@example.org", id),
        skills: tags(skills),
        interests: tags(interests),
        address: Some(address.to_string()),
        ..UserProfile::default()
    }
}

pub fn posting(id: &str, title: &str, location: &str, skills: &[&str], interests: &[&str]) -> Posting {
    Posting {
        id: Some(id.to_string()),
        title: title.to_string(),
        description: format!("{} description", title),
        location: Some(location.to_string()),
        required_skills: tags(skills),
        required_interests: tags(interests),
        ..Posting::default()
    }
}

pub fn with_availability(mut posting: Posting, slots: &[&str]) -> Posting {
    posting.required_availability = Some(Availability::Many(tags(slots)));
    posting
}
