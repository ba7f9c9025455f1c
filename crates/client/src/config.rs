//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `NEVYRA_API_URL` - API root (default: `http://localhost:8000/api`)
//! - `NEVYRA_DATA_DIR` - Where cart, wishlist and token are persisted
//!   (default: the platform data directory)
//! - `NEVYRA_GATEWAY_DELAY_MS` - Simulated gateway confirmation delay (default: 3000)
//! - `NEVYRA_CURRENCY` - Display and payment currency (default: INR)
//! - `NEVYRA_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `NEVYRA_CATALOG_TTL_SECS` - How long the product list is cached (default: 300)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use thiserror::Error;
use url::Url;

use nevyra_core::CurrencyCode;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_GATEWAY_DELAY_MS: &str = "3000";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";
const DEFAULT_CATALOG_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root all request paths are appended to
    pub api_url: Url,
    /// Directory for persisted client state
    pub data_dir: PathBuf,
    /// How long the simulated gateway takes to confirm
    pub gateway_delay: Duration,
    /// Currency for totals and gateway orders
    pub currency: CurrencyCode,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Catalog cache lifetime
    pub catalog_ttl: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but cannot be parsed.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_url = parse_var::<Url>("NEVYRA_API_URL", &get("NEVYRA_API_URL", DEFAULT_API_URL))?;
        let data_dir = lookup("NEVYRA_DATA_DIR").map_or_else(default_data_dir, PathBuf::from);
        let gateway_delay = Duration::from_millis(parse_var(
            "NEVYRA_GATEWAY_DELAY_MS",
            &get("NEVYRA_GATEWAY_DELAY_MS", DEFAULT_GATEWAY_DELAY_MS),
        )?);
        let currency = parse_var::<CurrencyCode>("NEVYRA_CURRENCY", &get("NEVYRA_CURRENCY", "INR"))?;
        let http_timeout = Duration::from_secs(parse_var(
            "NEVYRA_HTTP_TIMEOUT_SECS",
            &get("NEVYRA_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
        )?);
        let catalog_ttl = Duration::from_secs(parse_var(
            "NEVYRA_CATALOG_TTL_SECS",
            &get("NEVYRA_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS),
        )?);

        Ok(Self {
            api_url,
            data_dir,
            gateway_delay,
            currency,
            http_timeout,
            catalog_ttl,
        })
    }

    /// Defaults with state kept under `data_dir`. Handy for tests and tools.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.data_dir = data_dir.into();
        config
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            data_dir: default_data_dir(),
            gateway_delay: Duration::from_millis(3000),
            currency: CurrencyCode::default(),
            http_timeout: Duration::from_secs(30),
            catalog_ttl: Duration::from_secs(300),
        }
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "Nevyra", "nevyra")
        .map_or_else(|| PathBuf::from(".nevyra"), |dirs| dirs.data_dir().to_path_buf())
}
