//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FEEDSTORE_API_BASE_URL` - Base URL of the ordering backend
//!
//! ## Optional
//! - `FEEDSTORE_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Environment variable holding the backend base URL.
pub const API_BASE_URL_VAR: &str = "FEEDSTORE_API_BASE_URL";
/// Environment variable holding the request timeout.
pub const HTTP_TIMEOUT_VAR: &str = "FEEDSTORE_HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL. The path always ends with `/` so endpoint paths can
    /// be joined onto it.
    pub api_base_url: Url,
    /// Timeout applied to every backend request
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration for the given base URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not an absolute
    /// http(s) URL.
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(API_BASE_URL_VAR, api_base_url)?,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_overrides(None, None)
    }

    /// Load configuration from environment variables, letting explicit
    /// values (command-line flags) win over the environment.
    ///
    /// `FEEDSTORE_API_BASE_URL` is only required when `api_base_url` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// is invalid.
    pub fn from_env_with_overrides(
        api_base_url: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = match api_base_url {
            Some(raw) => parse_base_url(API_BASE_URL_VAR, raw)?,
            None => parse_base_url(API_BASE_URL_VAR, &get_required_env(API_BASE_URL_VAR)?)?,
        };
        let http_timeout = match timeout_secs {
            Some(secs) => parse_timeout_secs(HTTP_TIMEOUT_VAR, &secs.to_string())?,
            None => parse_timeout_secs(
                HTTP_TIMEOUT_VAR,
                &get_env_or_default(HTTP_TIMEOUT_VAR, &DEFAULT_HTTP_TIMEOUT_SECS.to_string()),
            )?,
        };

        Ok(Self {
            api_base_url,
            http_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Replace the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not an absolute
    /// http(s) URL.
    pub fn with_api_base_url(mut self, api_base_url: &str) -> Result<Self, ConfigError> {
        self.api_base_url = parse_base_url(API_BASE_URL_VAR, api_base_url)?;
        Ok(self)
    }

    /// Replace the request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `secs` is zero.
    pub fn with_timeout_secs(mut self, secs: u64) -> Result<Self, ConfigError> {
        self.http_timeout = parse_timeout_secs(HTTP_TIMEOUT_VAR, &secs.to_string())?;
        Ok(self)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and normalize the backend base URL.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}' (expected http or https)", url.scheme()),
        ));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "base URL must not carry a query or fragment".to_string(),
        ));
    }

    // Url::join replaces the last segment unless the path ends with a slash
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Parse a positive number of seconds.
fn parse_timeout_secs(var_name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "timeout must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
