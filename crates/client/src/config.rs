//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOODY_API_BASE_URL` - Backend base URL. A trailing `/api-swagger`
//!   segment is stripped, so the Swagger UI address can be pasted as-is
//!
//! ## Optional
//! - `FOODY_STORAGE_DIR` - Directory for persisted client state (default: `.foody`)
//! - `FOODY_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 15)
//! - `FOODY_CART_CACHE_TTL_SECS` - Lifetime of the cached remote cart (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const SWAGGER_SUFFIX: &str = "/api-swagger";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Foody client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without the Swagger suffix
    pub api_base_url: Url,
    /// Directory for durable client storage
    pub storage_dir: PathBuf,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Lifetime of the cached remote cart snapshot
    pub cart_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let raw_base_url = env.required("FOODY_API_BASE_URL")?;
        let api_base_url = parse_base_url(&raw_base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("FOODY_API_BASE_URL".to_string(), e))?;

        Ok(Self {
            api_base_url,
            storage_dir: PathBuf::from(env.or_default("FOODY_STORAGE_DIR", ".foody")),
            request_timeout: Duration::from_secs(env.parse_or("FOODY_REQUEST_TIMEOUT_SECS", 15)?),
            cart_cache_ttl: Duration::from_secs(env.parse_or("FOODY_CART_CACHE_TTL_SECS", 300)?),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for a given backend with every other value defaulted.
    #[must_use]
    pub fn for_base_url(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            storage_dir: PathBuf::from(".foody"),
            request_timeout: Duration::from_secs(15),
            cart_cache_ttl: Duration::from_secs(300),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

/// Strip a trailing `/api-swagger` (any case, optional trailing slash) and
/// parse what is left.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let trimmed = raw.trim();
    let without_slash = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let cut = without_slash.len().checked_sub(SWAGGER_SUFFIX.len());
    let base = match cut {
        Some(at)
            if without_slash.is_char_boundary(at)
                && without_slash[at..].eq_ignore_ascii_case(SWAGGER_SUFFIX) =>
        {
            &without_slash[..at]
        }
        _ => trimmed,
    };

    Url::parse(base).map_err(|e| e.to_string())
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a required environment variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional, non-blank environment variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get an environment variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("FOODY_API_BASE_URL", "https://api.foody.id")]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://api.foody.id/");
        assert_eq!(config.storage_dir, PathBuf::from(".foody"));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.cart_cache_ttl, Duration::from_secs(300));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::MissingEnvVar(key)) if key == "FOODY_API_BASE_URL"
        ));
    }

    #[test]
    fn test_strips_swagger_suffix() {
        for raw in [
            "https://api.foody.id/api-swagger",
            "https://api.foody.id/api-swagger/",
            "https://api.foody.id/API-Swagger",
        ] {
            let config = load(&[("FOODY_API_BASE_URL", raw)]).unwrap();
            assert_eq!(config.api_base_url.as_str(), "https://api.foody.id/", "{raw}");
        }
    }

    #[test]
    fn test_keeps_other_paths() {
        let config = load(&[("FOODY_API_BASE_URL", "https://foody.id/backend")]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://foody.id/backend");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("FOODY_API_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[
                ("FOODY_API_BASE_URL", "https://api.foody.id"),
                ("FOODY_REQUEST_TIMEOUT_SECS", "soon"),
            ]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "FOODY_REQUEST_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("FOODY_API_BASE_URL", "http://localhost:8080"),
            ("FOODY_STORAGE_DIR", "/tmp/foody"),
            ("FOODY_CART_CACHE_TTL_SECS", "30"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
            ("SENTRY_ENVIRONMENT", "staging"),
        ])
        .unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/foody"));
        assert_eq!(config.cart_cache_ttl, Duration::from_secs(30));
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
    }
}
