//! Client configuration loaded from the environment.

use std::env;
use std::time::Duration;

/// Base URL used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client-wide request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Preferred base URL override.
pub const BASE_URL_VAR: &str = "WHATTHEDOG_API_URL";

/// Legacy base URL override, still honoured for existing `.env` files.
pub const LEGACY_BASE_URL_VAR: &str = "EXPO_PUBLIC_API_URL";

pub const TIMEOUT_VAR: &str = "WHATTHEDOG_TIMEOUT_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("WHATTHEDOG_TIMEOUT_MS must be a number of milliseconds, got {value:?}")]
    InvalidTimeout {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub search_text: String,
    pub search_image: String,
    pub upload_photo: String,
    pub list_dogs: String,
    /// Prefix of the per-dog endpoint; the id is appended as a path segment.
    pub get_dog_by_id: String,
    pub health: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_text: "/search".to_string(),
            search_image: "/searchByImage".to_string(),
            upload_photo: "/upload/photo".to_string(),
            list_dogs: "/dogs".to_string(),
            get_dog_by_id: "/dogs".to_string(),
            health: "/health".to_string(),
        }
    }
}

/// Everything the client needs to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub endpoints: Endpoints,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is the normal case outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_VAR)
            .or_else(|| lookup(LEGACY_BASE_URL_VAR))
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let millis: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|source| ConfigError::InvalidTimeout {
                        value: raw.clone(),
                        source,
                    })?;
                Duration::from_millis(millis)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self::new(&base_url).with_timeout(timeout))
    }
}
