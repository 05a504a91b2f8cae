//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the site (reset links, cookie security)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 7777)
//! - `STOREFRONT_UPLOAD_DIR` - Where uploaded photos are written
//!   (default: `crates/storefront/static/uploads`)
//! - `MAP_KEY` - Key for the map tile provider, passed to the map page
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default directory for uploaded photos, relative to the workspace root.
const DEFAULT_UPLOAD_DIR: &str = "crates/storefront/static/uploads";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without a trailing slash
    pub base_url: String,
    /// Directory uploaded photos are written to and served from
    pub upload_dir: PathBuf,
    /// Map tile provider key
    pub map_key: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "7777")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = parse_base_url(&get_required_env("STOREFRONT_BASE_URL")?)?;
        let upload_dir = PathBuf::from(get_env_or_default(
            "STOREFRONT_UPLOAD_DIR",
            DEFAULT_UPLOAD_DIR,
        ));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            upload_dir,
            map_key: get_optional_env("MAP_KEY"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute URL for a site path such as `/auth/reset/abc`.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    parse_rate(&raw).map_err(|msg| ConfigError::InvalidEnvVar(key.to_string(), msg))
}

fn parse_rate(raw: &str) -> Result<f32, String> {
    let rate = raw.trim().parse::<f32>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("must be between 0.0 and 1.0 (got {rate})"))
    }
}

/// Validate the base URL and strip any trailing slash.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 7777,
            base_url: base_url.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            map_key: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:7777").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 7777);
    }

    #[test]
    fn test_is_secure() {
        assert!(config("https://delicious.example").is_secure());
        assert!(!config("http://localhost:7777").is_secure());
    }

    #[test]
    fn test_url_for() {
        let c = config("http://localhost:7777");
        assert_eq!(
            c.url_for("/auth/reset/abc"),
            "http://localhost:7777/auth/reset/abc"
        );
    }

    #[test]
    fn test_parse_base_url_strips_trailing_slash() {
        assert_eq!(
            parse_base_url("https://delicious.example/").unwrap(),
            "https://delicious.example"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_bad_input() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("ftp://delicious.example").is_err());
    }

    #[test]
    fn test_parse_rate() {
        assert!((parse_rate("0.25").unwrap() - 0.25).abs() < f32::EPSILON);
        assert!(parse_rate("1.5").is_err());
        assert!(parse_rate("abc").is_err());
    }
}
