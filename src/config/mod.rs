//! Configuration module for the catalog client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

use crate::errors::ClientError;

/// Largest page the backend accepts (`limit` is capped at 200 server-side).
pub const MAX_PAGE_SIZE: u32 = 200;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend API, including the `/api` prefix
    pub api_base_url: String,
    /// Optional key sent as `x-api-key` on every request
    pub api_key: Option<String>,
    /// Number of items requested per feed page
    pub page_size: u32,
    /// How long a cached response is served without revalidation
    pub cache_ttl: Duration,
    /// Upper bound for a single request, including feed page fetches
    pub request_timeout: Duration,
    /// Distance from the viewport edge at which the tail sentinel triggers a load
    pub sentinel_margin_px: f64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            api_key: None,
            page_size: 50,
            cache_ttl: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            sentinel_margin_px: 400.0,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("PHOTOS_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "PHOTOS_API_URL must be an http(s) URL, got {:?}",
                api_base_url
            )));
        }

        let api_key = lookup("PHOTOS_API_KEY").filter(|k| !k.trim().is_empty());

        let page_size = parse_var(&lookup, "PHOTOS_PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ClientError::Config(format!(
                "PHOTOS_PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        let cache_ttl = Duration::from_secs(parse_var(
            &lookup,
            "PHOTOS_CACHE_TTL_SECS",
            defaults.cache_ttl.as_secs(),
        )?);

        let timeout_secs: u64 = parse_var(
            &lookup,
            "PHOTOS_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ClientError::Config(
                "PHOTOS_REQUEST_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        let sentinel_margin_px = parse_var(
            &lookup,
            "PHOTOS_SENTINEL_MARGIN_PX",
            defaults.sentinel_margin_px,
        )?;

        let log_level = lookup("PHOTOS_LOG_LEVEL").unwrap_or(defaults.log_level);

        let log_format = match lookup("PHOTOS_LOG_FORMAT").as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ClientError::Config(format!(
                    "PHOTOS_LOG_FORMAT must be 'pretty' or 'json', got {:?}",
                    other
                )))
            }
        };

        Ok(Self {
            api_base_url,
            api_key,
            page_size,
            cache_ttl,
            request_timeout: Duration::from_secs(timeout_secs),
            sentinel_margin_px,
            log_level,
            log_format,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ClientError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ClientError::Config(format!("Invalid {} value {:?}: {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert!(config.api_key.is_none());
        assert_eq!(config.page_size, 50);
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.sentinel_margin_px, 400.0);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PHOTOS_API_URL", "http://10.0.0.2:9000/api/"),
            ("PHOTOS_API_KEY", "secret"),
            ("PHOTOS_PAGE_SIZE", "100"),
            ("PHOTOS_CACHE_TTL_SECS", "0"),
            ("PHOTOS_LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://10.0.0.2:9000/api");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.page_size, 100);
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = Config::from_lookup(lookup_from(&[("PHOTOS_API_KEY", "  ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_page_size_bounds() {
        for bad in ["0", "201", "fifty"] {
            let err = Config::from_lookup(lookup_from(&[("PHOTOS_PAGE_SIZE", bad)])).unwrap_err();
            assert!(matches!(err, ClientError::Config(_)), "{} accepted", bad);
        }
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err =
            Config::from_lookup(lookup_from(&[("PHOTOS_API_URL", "localhost:8000")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let err =
            Config::from_lookup(lookup_from(&[("PHOTOS_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
