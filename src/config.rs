use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PokedexError;

pub const DEFAULT_CONFIG_FILE: &str = "pokedex.json";
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
/// Upper bound for any concurrency cap.
pub const MAX_CONCURRENCY: usize = 1024;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub max_pages: Option<usize>,
    #[serde(default)]
    pub collection_limit: Option<usize>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub concurrency: Option<ConcurrencyEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConcurrencyEntry {
    #[serde(default)]
    pub windowed: Option<usize>,
    #[serde(default)]
    pub name_filtered: Option<usize>,
    #[serde(default)]
    pub full_scan: Option<usize>,
    #[serde(default)]
    pub seed: Option<usize>,
}

/// In-flight detail fetch caps for each kind of enrichment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConcurrencyLimits {
    pub windowed: usize,
    pub name_filtered: usize,
    pub full_scan: usize,
    pub seed: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            windowed: 5,
            name_filtered: 25,
            full_scan: 10,
            seed: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub base_url: String,
    pub page_size: usize,
    pub max_pages: usize,
    pub collection_limit: usize,
    pub request_timeout: Duration,
    pub concurrency: ConcurrencyLimits,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 20,
            max_pages: 53,
            collection_limit: 1025,
            request_timeout: Duration::from_secs(30),
            concurrency: ConcurrencyLimits::default(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `pokedex.json` from the working directory when present.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PokedexError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PokedexError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PokedexError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PokedexError> {
        let defaults = ResolvedConfig::default();
        let concurrency = config.concurrency.unwrap_or_default();

        let resolved = ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(defaults.schema_version),
            base_url: config
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            page_size: config.page_size.unwrap_or(defaults.page_size),
            max_pages: config.max_pages.unwrap_or(defaults.max_pages),
            collection_limit: config
                .collection_limit
                .unwrap_or(defaults.collection_limit),
            request_timeout: config
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            concurrency: ConcurrencyLimits {
                windowed: concurrency
                    .windowed
                    .unwrap_or(defaults.concurrency.windowed),
                name_filtered: concurrency
                    .name_filtered
                    .unwrap_or(defaults.concurrency.name_filtered),
                full_scan: concurrency
                    .full_scan
                    .unwrap_or(defaults.concurrency.full_scan),
                seed: concurrency.seed.unwrap_or(defaults.concurrency.seed),
            },
        };

        validate(&resolved)?;
        Ok(resolved)
    }
}

fn validate(config: &ResolvedConfig) -> Result<(), PokedexError> {
    let concurrency = [
        ("concurrency.windowed", config.concurrency.windowed),
        ("concurrency.name_filtered", config.concurrency.name_filtered),
        ("concurrency.full_scan", config.concurrency.full_scan),
        ("concurrency.seed", config.concurrency.seed),
    ];
    let positive = [
        ("page_size", config.page_size),
        ("max_pages", config.max_pages),
        ("collection_limit", config.collection_limit),
    ]
    .into_iter()
    .chain(concurrency);
    for (field, value) in positive {
        if value == 0 {
            return Err(PokedexError::InvalidConfig(format!(
                "{field} must be at least 1"
            )));
        }
    }
    for (field, value) in concurrency {
        if value > MAX_CONCURRENCY {
            return Err(PokedexError::InvalidConfig(format!(
                "{field} must be at most {MAX_CONCURRENCY}"
            )));
        }
    }
    if config.request_timeout.is_zero() {
        return Err(PokedexError::InvalidConfig(
            "request_timeout_secs must be at least 1".to_string(),
        ));
    }
    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        return Err(PokedexError::InvalidConfig(format!(
            "base_url must be an http(s) URL: {}",
            config.base_url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved, ResolvedConfig::default());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = Config {
            concurrency: Some(ConcurrencyEntry {
                seed: Some(0),
                ..ConcurrencyEntry::default()
            }),
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, PokedexError::InvalidConfig(msg) if msg.contains("concurrency.seed"));
    }

    #[test]
    fn oversized_concurrency_is_rejected() {
        let config = Config {
            concurrency: Some(ConcurrencyEntry {
                windowed: Some(usize::MAX),
                ..ConcurrencyEntry::default()
            }),
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(
            err,
            PokedexError::InvalidConfig(msg) if msg.contains("concurrency.windowed")
        );

        let at_cap = Config {
            concurrency: Some(ConcurrencyEntry {
                full_scan: Some(MAX_CONCURRENCY),
                ..ConcurrencyEntry::default()
            }),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(at_cap).unwrap();
        assert_eq!(resolved.concurrency.full_scan, MAX_CONCURRENCY);
    }
}
