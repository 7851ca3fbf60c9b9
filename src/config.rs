use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::core::distance::DistanceUnit;
use crate::core::engine::DEFAULT_MAX_CONCURRENCY;
use crate::core::scoring::{EmptyRequirementPolicy, ScoringPolicy, ScoringPreset};
use crate::models::ScoringWeights;
use crate::services::geocoder::GOOGLE_GEOCODE_ENDPOINT;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub documents: DocumentSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    #[serde(default = "default_profiles_collection")]
    pub profiles_collection: String,
    #[serde(default = "default_postings_collection")]
    pub postings_collection: String,
}

fn default_profiles_collection() -> String { "users".to_string() }
fn default_postings_collection() -> String { "postings".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            endpoint: default_geocoder_endpoint(),
            api_key: String::new(),
            timeout_secs: default_geocoder_timeout(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_geocoder_endpoint() -> String { GOOGLE_GEOCODE_ENDPOINT.to_string() }
fn default_geocoder_timeout() -> u64 { 10 }
fn default_max_concurrency() -> usize { DEFAULT_MAX_CONCURRENCY }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
    pub redis_url: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            capacity: default_cache_capacity(),
            redis_url: None,
        }
    }
}

fn default_cache_ttl() -> u64 { 3600 }
fn default_cache_capacity() -> u64 { 10_000 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub preset: ScoringPreset,
    #[serde(default)]
    pub empty_requirement: EmptyRequirementPolicy,
    pub unit: Option<DistanceUnit>,
    pub max_distance: Option<f64>,
    pub weights: Option<WeightsConfig>,
}

impl ScoringSettings {
    /// Build the scoring policy: the preset first, then any overrides
    pub fn policy(&self) -> ScoringPolicy {
        let mut policy = ScoringPolicy::from_preset(self.preset).with_empty_requirement(self.empty_requirement);

        if let Some(unit) = self.unit {
            policy = policy.with_unit(unit);
        }
        if let Some(max_distance) = self.max_distance {
            policy = policy.with_max_distance(max_distance);
        }
        if let Some(weights) = &self.weights {
            policy = policy.with_weights(weights.into());
        }

        policy
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_skills_weight")]
    pub skills: f64,
    #[serde(default = "default_availability_weight")]
    pub availability: f64,
    #[serde(default = "default_interest_weight")]
    pub interest: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            location: default_location_weight(),
            skills: default_skills_weight(),
            availability: default_availability_weight(),
            interest: default_interest_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            location: config.location,
            skills: config.skills,
            availability: config.availability,
            interest: config.interest,
        }
    }
}

fn default_location_weight() -> f64 { 0.4 }
fn default_skills_weight() -> f64 { 0.3 }
fn default_availability_weight() -> f64 { 0.2 }
fn default_interest_weight() -> f64 { 0.1 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with VMATCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., VMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("VMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

/// Apply the conventional, unprefixed variables deployments already export
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(api_key) = env::var("GOOGLE_MAPS_API_KEY") {
        builder = builder.set_override("geocoder.api_key", api_key)?;
    }
    if let Ok(redis_url) = env::var("VMATCH_REDIS_URL") {
        builder = builder.set_override("cache.redis_url", redis_url)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [documents]
        endpoint = "https://documents.test/v1"
        api_key = "key"
        project_id = "project"
        database_id = "db"
    "#;

    fn parse(extra: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(&format!("{}\n{}", MINIMAL, extra), FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.location, 0.4);
        assert_eq!(weights.skills, 0.3);
        assert_eq!(weights.availability, 0.2);
        assert_eq!(weights.interest, 0.1);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let settings = parse("");

        assert_eq!(settings.documents.postings_collection, "postings");
        assert_eq!(settings.geocoder.endpoint, GOOGLE_GEOCODE_ENDPOINT);
        assert_eq!(settings.geocoder.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(settings.cache.ttl_secs, 3600);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.scoring.policy(), ScoringPolicy::weighted_continuous());
    }

    #[test]
    fn test_scoring_overrides() {
        let settings = parse(
            r#"
            [scoring]
            preset = "weighted-continuous"
            empty_requirement = "neutral"
            unit = "miles"
            max_distance = 50.0

            [scoring.weights]
            location = 0.5
            skills = 0.5
            availability = 0.0
            interest = 0.0
            "#,
        );

        let policy = settings.scoring.policy();
        assert_eq!(policy.empty_requirement, EmptyRequirementPolicy::Neutral);
        assert_eq!(policy.unit, DistanceUnit::Miles);
        assert_eq!(
            policy.location,
            crate::core::scoring::LocationPolicy::ContinuousDecay { max_distance: 50.0 }
        );
        assert_eq!(policy.weights.location, 0.5);
    }

    #[test]
    fn test_conventional_env_vars_override_file() {
        std::env::set_var("GOOGLE_MAPS_API_KEY", "maps-key-from-env");

        let base = Config::builder()
            .add_source(File::from_str(MINIMAL, FileFormat::Toml))
            .build()
            .unwrap();
        let settings: Settings = substitute_env_vars(base).unwrap().try_deserialize().unwrap();

        assert_eq!(settings.geocoder.api_key, "maps-key-from-env");
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_tiered_preset() {
        let settings = parse("[scoring]\npreset = \"tiered-distance\"");
        assert_eq!(settings.scoring.policy(), ScoringPolicy::tiered_distance());
    }
}
