//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ROCKETSHOES_API_URL` - Base URL of the catalog/stock API (default: <http://localhost:3333>)
//! - `ROCKETSHOES_STORAGE_DIR` - Directory holding the local cart snapshot
//!   (default: `<platform data dir>/rocketshoes`)
//! - `ROCKETSHOES_REQUEST_TIMEOUT_SECS` - Per-request timeout for API calls (default: none)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3333";
const STORAGE_DIR_NAME: &str = "rocketshoes";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("No local data directory available; set ROCKETSHOES_STORAGE_DIR")]
    NoDataDir,
}

/// Cart configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Catalog/stock API base URL, always ending in `/`
    pub api_url: Url,
    /// Directory for the persisted cart snapshot
    pub storage_dir: PathBuf,
    /// Timeout applied to each API request, if any
    pub request_timeout: Option<Duration>,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if no
    /// storage directory is configured and the platform has no data dir.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("ROCKETSHOES_API_URL", DEFAULT_API_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("ROCKETSHOES_API_URL".to_string(), e))?;

        let storage_dir = match get_optional_env("ROCKETSHOES_STORAGE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join(STORAGE_DIR_NAME),
        };

        let request_timeout = get_optional_env("ROCKETSHOES_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_timeout(&raw))
            .transpose()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ROCKETSHOES_REQUEST_TIMEOUT_SECS".to_string(), e)
            })?;

        Ok(Self {
            api_url,
            storage_dir,
            request_timeout,
        })
    }

    /// Configuration for a given API URL and storage directory, no timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an http(s) URL.
    pub fn new(api_url: &str, storage_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("api_url".to_string(), e))?;
        Ok(Self {
            api_url,
            storage_dir: storage_dir.into(),
            request_timeout: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse the API base URL, normalizing it to end with `/` so relative
/// joins keep any path prefix (e.g. `https://host/api/`).
fn parse_api_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<Duration, String> {
    let secs = raw.trim().parse::<u64>().map_err(|e| e.to_string())?;
    if secs == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_adds_trailing_slash() {
        let url = parse_api_url("http://localhost:3333").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/");

        let url = parse_api_url("https://shop.example.com/api").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/");
        assert_eq!(
            url.join("stock/1").unwrap().as_str(),
            "https://shop.example.com/api/stock/1"
        );
    }

    #[test]
    fn test_parse_api_url_rejects_non_http() {
        assert!(parse_api_url("ftp://example.com").is_err());
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("15").unwrap(), Duration::from_secs(15));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_new_config() {
        let config = CartConfig::new("http://127.0.0.1:4000", "/tmp/cart").unwrap();
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:4000/");
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/cart"));
        assert!(config.request_timeout.is_none());

        let err = CartConfig::new("mailto:someone", "/tmp/cart").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_from_env() {
        // The only test touching these variables
        let set = |key: &str, value: &str| unsafe { std::env::set_var(key, value) };
        let unset = |key: &str| unsafe { std::env::remove_var(key) };

        set("ROCKETSHOES_API_URL", "https://shop.example.com/api");
        set("ROCKETSHOES_STORAGE_DIR", "/var/lib/rocketshoes");
        set("ROCKETSHOES_REQUEST_TIMEOUT_SECS", "30");
        let config = CartConfig::from_env().unwrap();
        assert_eq!(config.api_url.as_str(), "https://shop.example.com/api/");
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/rocketshoes"));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));

        set("ROCKETSHOES_REQUEST_TIMEOUT_SECS", "0");
        let err = CartConfig::from_env().unwrap_err();
        assert!(
            matches!(&err, ConfigError::InvalidEnvVar(key, _) if key == "ROCKETSHOES_REQUEST_TIMEOUT_SECS")
        );

        // Blank counts as unset; the storage dir falls back to the platform data dir
        set("ROCKETSHOES_REQUEST_TIMEOUT_SECS", " ");
        unset("ROCKETSHOES_STORAGE_DIR");
        match (CartConfig::from_env(), dirs::data_local_dir()) {
            (Ok(config), Some(data_dir)) => {
                assert_eq!(config.storage_dir, data_dir.join(STORAGE_DIR_NAME));
                assert!(config.request_timeout.is_none());
            }
            (Err(ConfigError::NoDataDir), None) => {}
            (other, data_dir) => panic!("unexpected {other:?} with data dir {data_dir:?}"),
        }

        set("ROCKETSHOES_API_URL", "ftp://shop.example.com");
        let err = CartConfig::from_env().unwrap_err();
        assert!(matches!(&err, ConfigError::InvalidEnvVar(key, _) if key == "ROCKETSHOES_API_URL"));

        unset("ROCKETSHOES_API_URL");
        unset("ROCKETSHOES_REQUEST_TIMEOUT_SECS");
    }
}
