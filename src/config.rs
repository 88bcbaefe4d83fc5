//! Application configuration loaded from environment variables.
//!
//! Token secrets are read once at startup and cached in memory; the two
//! token kinds use distinct secrets so an access token can never pass
//! refresh verification (or vice versa).

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Allowed CORS origin (the web frontend)
    pub cors_origin: String,

    /// Signing key for access tokens (raw bytes)
    pub access_token_secret: Vec<u8>,
    /// Signing key for refresh tokens (raw bytes)
    pub refresh_token_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,
    /// Mark auth cookies `Secure` (on in production deployments)
    pub secure_cookies: bool,

    /// Media storage gateway base URL
    pub media_base_url: String,
    /// Media storage gateway API key
    pub media_api_key: String,
}

const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 60; // 1 hour
const DEFAULT_REFRESH_TTL_SECS: i64 = 10 * 24 * 60 * 60; // 10 days

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?
                .into_bytes(),
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?
                .into_bytes(),
            access_token_ttl_secs: env::var("ACCESS_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TTL_SECS),
            refresh_token_ttl_secs: env::var("REFRESH_TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_TTL_SECS),
            secure_cookies: env::var("COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),

            media_base_url: env::var("MEDIA_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("MEDIA_BASE_URL"))?,
            media_api_key: env::var("MEDIA_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("MEDIA_API_KEY"))?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            access_token_secret: b"test_access_key_32_bytes_long!!!".to_vec(),
            refresh_token_secret: b"test_refresh_key_32_bytes_long!!".to_vec(),
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            secure_cookies: false,
            media_base_url: "http://localhost:9090".to_string(),
            media_api_key: "test_media_key".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("ACCESS_TOKEN_SECRET", "test_access_secret");
        env::set_var("REFRESH_TOKEN_SECRET", "test_refresh_secret");
        env::set_var("MEDIA_BASE_URL", "http://localhost:9090/");
        env::set_var("MEDIA_API_KEY", "test_media_key");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.access_token_secret, b"test_access_secret");
        assert_eq!(config.refresh_token_secret, b"test_refresh_secret");
        // Trailing slash is trimmed so URL joins stay predictable
        assert_eq!(config.media_base_url, "http://localhost:9090");
        assert_eq!(config.port, 8080);
        assert!(config.access_token_ttl_secs < config.refresh_token_ttl_secs);
    }
}
