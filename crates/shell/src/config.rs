//! Shell configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `OUTLAY_API_URL` - Base URL of the Outlay backend API
//!
//! ## Optional
//! - `OUTLAY_API_TIMEOUT_SECS` - HTTP request timeout in seconds (default: 30)
//! - `OUTLAY_USER_CACHE_TTL_SECS` - User list cache TTL in seconds (default: 300)
//! - `OUTLAY_SERVICE_TOKEN` - Bearer token for operator tooling; end-user
//!   tokens come from the identity provider at runtime
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shell application configuration.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Base URL of the Outlay backend API
    pub api_url: Url,
    /// HTTP request timeout
    pub api_timeout: Duration,
    /// Time-to-live for the cached user list
    pub user_cache_ttl: Duration,
    /// Bearer token for operator tooling
    pub service_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ShellConfig {
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

        let api_url = get_required_env("OUTLAY_API_URL")?;
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("OUTLAY_API_URL".to_string(), e.to_string())
        })?;

        let api_timeout = get_duration_secs("OUTLAY_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?;
        let user_cache_ttl =
            get_duration_secs("OUTLAY_USER_CACHE_TTL_SECS", DEFAULT_USER_CACHE_TTL_SECS)?;

        let service_token = get_optional_env("OUTLAY_SERVICE_TOKEN").map(SecretString::from);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_url,
            api_timeout,
            user_cache_ttl,
            service_token,
            sentry_dsn,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable as a duration in whole seconds.
fn get_duration_secs(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(value) => {
            let secs = value
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // One combined env test; config keys are process-global.
    #[test]
    #[allow(unsafe_code)]
    fn test_from_env() {
        // SAFETY: single-threaded access to these keys within this test binary
        unsafe {
            std::env::set_var("OUTLAY_API_URL", "https://api.outlay.test");
            std::env::set_var("OUTLAY_API_TIMEOUT_SECS", "5");
            std::env::remove_var("OUTLAY_USER_CACHE_TTL_SECS");
            std::env::remove_var("OUTLAY_SERVICE_TOKEN");
        }

        let config = ShellConfig::from_env().unwrap();
        assert_eq!(config.api_url.as_str(), "https://api.outlay.test/");
        assert_eq!(config.api_timeout, Duration::from_secs(5));
        assert_eq!(
            config.user_cache_ttl,
            Duration::from_secs(DEFAULT_USER_CACHE_TTL_SECS)
        );
        assert!(config.service_token.is_none());
    }

    #[test]
    fn test_duration_falls_back_to_default_when_unset() {
        let value = get_duration_secs("OUTLAY_TEST_UNSET_DURATION", 7).unwrap();
        assert_eq!(value, Duration::from_secs(7));
    }
}
