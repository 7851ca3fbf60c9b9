// Service exports
pub mod cache;
pub mod documents;
pub mod geocoder;

pub use cache::{CacheError, CacheKey, CacheStats, CachedGeocoder, GeocodeCache};
pub use documents::{DocumentCollections, DocumentStoreClient, DocumentStoreError, PostingCatalog, ProfileProvider};
pub use geocoder::{GeocodeError, GeocodedLocation, Geocoder, GoogleGeocoder, Resolution};
