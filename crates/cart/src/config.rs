//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ROCKETSHOES_API_URL` - Base URL of the store API (default: `http://localhost:3333`)
//! - `ROCKETSHOES_API_TOKEN` - Bearer token sent with every store API request
//! - `ROCKETSHOES_STORAGE_DIR` - Directory backing the persisted cart slot (default: `.rocketshoes`)

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_STORAGE_DIR: &str = ".rocketshoes";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Store API configuration
    pub api: StoreApiConfig,
    /// Directory holding the persisted cart slot
    pub storage_dir: PathBuf,
}

/// Store API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct StoreApiConfig {
    /// Base URL; `stock/{id}` and `products/{id}` are resolved against it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for StoreApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StoreApiConfig {
    /// Configuration for an API at `base_url` with no token.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value or the
    /// API token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`CartConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("ROCKETSHOES_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = parse_base_url(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ROCKETSHOES_API_URL".to_string(), e)
        })?;

        let token = match lookup("ROCKETSHOES_API_TOKEN").filter(|t| !t.is_empty()) {
            Some(value) => {
                validate_token(&value, "ROCKETSHOES_API_TOKEN")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        let storage_dir = lookup("ROCKETSHOES_STORAGE_DIR")
            .filter(|d| !d.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        Ok(Self {
            api: StoreApiConfig { base_url, token },
            storage_dir,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// any path prefix (`http://host/api` + `stock/1` -> `http://host/api/stock/1`).
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|e| e.to_string())?;

    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Reject tokens that are obviously copied from a template.
fn validate_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = token.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Expose the token for building request headers.
pub(crate) fn expose_token(token: &SecretString) -> &str {
    token.expose_secret()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://localhost:3333/");
        assert!(config.api.token.is_none());
        assert_eq!(config.storage_dir, PathBuf::from(".rocketshoes"));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config =
            CartConfig::from_lookup(lookup_from(&[("ROCKETSHOES_API_URL", "https://shop.test/api")]))
                .unwrap();
        assert_eq!(config.api.base_url.as_str(), "https://shop.test/api/");
        assert_eq!(
            config.api.base_url.join("stock/1").unwrap().as_str(),
            "https://shop.test/api/stock/1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = CartConfig::from_lookup(lookup_from(&[("ROCKETSHOES_API_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref var, _) if var == "ROCKETSHOES_API_URL"));

        let err = CartConfig::from_lookup(lookup_from(&[("ROCKETSHOES_API_URL", "ftp://shop.test")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let result = CartConfig::from_lookup(lookup_from(&[(
            "ROCKETSHOES_API_TOKEN",
            "your-token-here",
        )]));
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let config = CartConfig::from_lookup(lookup_from(&[(
            "ROCKETSHOES_API_TOKEN",
            "k7Qp2vL9sX4mZ8rT",
        )]))
        .unwrap();

        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("k7Qp2vL9sX4mZ8rT"));
        assert_eq!(expose_token(config.api.token.as_ref().unwrap()), "k7Qp2vL9sX4mZ8rT");
    }

    #[test]
    fn test_storage_dir_override() {
        let config =
            CartConfig::from_lookup(lookup_from(&[("ROCKETSHOES_STORAGE_DIR", "/tmp/carts")]))
                .unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/carts"));
    }
}
