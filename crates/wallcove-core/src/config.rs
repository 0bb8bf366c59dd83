//! Client configuration.
//!
//! The API base URL ships as a compile-time default and can be overridden
//! with the `WALLCOVE_API_URL` environment variable, which is how staging
//! builds and the integration-test mock server point the client elsewhere.

use serde::{Deserialize, Serialize};

/// Production API base URL.
pub const DEFAULT_API_URL: &str = "https://api.wallcove.app";

/// Environment variable that overrides the API base URL.
const API_URL_ENV: &str = "WALLCOVE_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Build configuration from the environment, falling back to defaults.
    /// Loads a `.env` file first if one is present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self { api_url }
    }

    /// Configuration pointing at an explicit base URL.
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
        }
    }
}
