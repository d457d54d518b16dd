//! Remote store connection settings

use crate::error::ConfigError;

pub const STORE_URL_VAR: &str = "PROPDASH_STORE_URL";
pub const STORE_KEY_VAR: &str = "PROPDASH_STORE_KEY";

/// Where the remote store lives and the public API key it expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL without trailing slash, e.g. `https://xyz.example.co`
    pub url: String,
    pub api_key: String,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        let api_key = api_key.into().trim().to_string();

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: STORE_URL_VAR,
                reason: format!("expected an http(s) URL, got {:?}", url),
            });
        }
        if api_key.is_empty() {
            return Err(ConfigError::Missing(STORE_KEY_VAR));
        }

        Ok(Self { url, api_key })
    }

    /// Read settings from the environment, loading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let url = std::env::var(STORE_URL_VAR).map_err(|_| ConfigError::Missing(STORE_URL_VAR))?;
        let key = std::env::var(STORE_KEY_VAR).map_err(|_| ConfigError::Missing(STORE_KEY_VAR))?;
        Self::new(url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = StoreConfig::new("http://localhost:3001/", "anon").unwrap();
        assert_eq!(config.url, "http://localhost:3001");
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(matches!(
            StoreConfig::new("localhost:3001", "anon"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_rejects_blank_key() {
        assert!(matches!(
            StoreConfig::new("https://store.example.com", "  "),
            Err(ConfigError::Missing(STORE_KEY_VAR))
        ));
    }
}
