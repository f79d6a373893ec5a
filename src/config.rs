use std::path::PathBuf;
use std::time::Duration;

use crate::core::news::client::DEFAULT_BASE_URL;
use crate::core::query::DEFAULT_STALE_TIME;

pub const API_KEY_ENV: &str = "NEWSDATA_API_KEY";
pub const LEGACY_API_KEY_ENV: &str = "NEXT_PUBLIC_NEWSDATA_API_KEY";
pub const BASE_URL_ENV: &str = "NEWSDATA_BASE_URL";
pub const DATA_DIR_ENV: &str = "SHELE_NEWS_DATA_DIR";
pub const TIMEOUT_ENV: &str = "SHELE_NEWS_TIMEOUT_SECS";
pub const STALE_ENV: &str = "SHELE_NEWS_STALE_SECS";

const APP_DIR_NAME: &str = "shele-news";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing API key, set {API_KEY_ENV}")]
    MissingApiKey,
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("could not determine a data directory, set {DATA_DIR_ENV}")]
    MissingDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub data_dir: PathBuf,
    pub timeout: Duration,
    pub stale_time: Duration,
}

impl AppConfig {
    /// Loads `.env.local` when present, then reads the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::from_filename(".env.local");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = non_empty(API_KEY_ENV)
            .or_else(|| non_empty(LEGACY_API_KEY_ENV))
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = non_empty(BASE_URL_ENV)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let data_dir = match non_empty(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(ConfigError::MissingDataDir)?,
        };

        let timeout = match non_empty(TIMEOUT_ENV) {
            Some(raw) => Duration::from_secs(parse_secs(TIMEOUT_ENV, &raw)?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: TIMEOUT_ENV,
                value: "0".to_string(),
            });
        }

        let stale_time = match non_empty(STALE_ENV) {
            Some(raw) => Duration::from_secs(parse_secs(STALE_ENV, &raw)?),
            None => DEFAULT_STALE_TIME,
        };

        Ok(Self {
            api_key,
            base_url,
            data_dir,
            timeout,
            stale_time,
        })
    }
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_ENV, " secret "),
            (DATA_DIR_ENV, "/tmp/shele"),
        ]))
        .expect("config should load");

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/shele"));
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.stale_time, DEFAULT_STALE_TIME);
    }

    #[test]
    fn empty_key_falls_back_to_legacy_name() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "   "),
            (LEGACY_API_KEY_ENV, "legacy"),
            (DATA_DIR_ENV, "/tmp/shele"),
        ]))
        .expect("config should load");
        assert_eq!(config.api_key, "legacy");

        let missing = AppConfig::from_lookup(lookup(&[(DATA_DIR_ENV, "/tmp/shele")]));
        assert_eq!(missing, Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "secret"),
            (BASE_URL_ENV, "http://127.0.0.1:9000/api/1/"),
            (DATA_DIR_ENV, "/tmp/shele"),
            (TIMEOUT_ENV, "5"),
            (STALE_ENV, "0"),
        ]))
        .expect("config should load");
        assert_eq!(config.base_url, "http://127.0.0.1:9000/api/1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.stale_time, Duration::ZERO);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let result = AppConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "secret"),
            (DATA_DIR_ENV, "/tmp/shele"),
            (TIMEOUT_ENV, "soon"),
        ]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                key: TIMEOUT_ENV,
                value: "soon".to_string()
            })
        );

        let zero = AppConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "secret"),
            (DATA_DIR_ENV, "/tmp/shele"),
            (TIMEOUT_ENV, "0"),
        ]));
        assert!(matches!(zero, Err(ConfigError::InvalidValue { key: TIMEOUT_ENV, .. })));
    }
}
