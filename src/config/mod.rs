//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{collections::HashMap, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::CollectionKey;

mod cli;

pub use cli::{
    ActAction, ActArgs, CliArgs, Command, GlobalOverrides, PlanArgs, RecentAction, RecentArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vitrine";
const ENV_PREFIX: &str = "VITRINE";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_AUTOPLAY_INTERVAL_MS: u64 = 6_000;
const DEFAULT_TRANSITION_MS: u64 = 500;
const DEFAULT_ITEMS_PER_PAGE: u64 = 50;
const DEFAULT_RAIL_LIMIT: u64 = 12;
const DEFAULT_RECENT_LIMIT: u64 = 10;
const DEFAULT_RECENT_MAX_AGE_DAYS: u64 = 7;
const DEFAULT_RECENT_PATH: &str = "vitrine-state.json";
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub carousel: CarouselSettings,
    pub catalog: CatalogSettings,
    pub recent: RecentSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Endpoint paths are joined onto this URL; it always ends with `/`.
    pub base_url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub default_ttl: Duration,
    pub ttl_overrides: HashMap<CollectionKey, Duration>,
}

#[derive(Debug, Clone)]
pub struct CarouselSettings {
    pub autoplay_interval: Duration,
    pub transition: Duration,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub items_per_page: usize,
    pub rail_limit: usize,
}

#[derive(Debug, Clone)]
pub struct RecentSettings {
    pub limit: usize,
    pub max_age: Duration,
    /// File backing the guest key/value store.
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    cache: RawCacheSettings,
    carousel: RawCarouselSettings,
    catalog: RawCatalogSettings,
    recent: RawRecentSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            api,
            cache,
            carousel,
            catalog,
            recent,
            logging,
        } = raw;

        Ok(Self {
            api: build_api_settings(api)?,
            cache: build_cache_settings(cache)?,
            carousel: build_carousel_settings(carousel)?,
            catalog: build_catalog_settings(catalog)?,
            recent: build_recent_settings(recent)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let raw_url = api
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoadError::invalid("api.base_url", "a base URL is required"))?;

    let mut base_url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("api.base_url", format!("failed to parse: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "api.base_url",
            format!("unsupported scheme `{}`", base_url.scheme()),
        ));
    }
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }

    let timeout_ms = api.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
    let request_timeout = positive_millis(timeout_ms, "api.request_timeout_ms")?;

    Ok(ApiSettings {
        base_url,
        request_timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let default_secs = cache.default_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if default_secs == 0 {
        return Err(LoadError::invalid(
            "cache.default_ttl_secs",
            "must be greater than zero",
        ));
    }

    let mut ttl_overrides = HashMap::with_capacity(cache.ttl_overrides.len());
    for (name, secs) in cache.ttl_overrides {
        let key = CollectionKey::from_str(&name)
            .map_err(|err| LoadError::invalid("cache.ttl_overrides", err.to_string()))?;
        ttl_overrides.insert(key, Duration::from_secs(secs));
    }

    Ok(CacheSettings {
        default_ttl: Duration::from_secs(default_secs),
        ttl_overrides,
    })
}

fn build_carousel_settings(carousel: RawCarouselSettings) -> Result<CarouselSettings, LoadError> {
    let interval_ms = carousel
        .autoplay_interval_ms
        .unwrap_or(DEFAULT_AUTOPLAY_INTERVAL_MS);
    let transition_ms = carousel.transition_ms.unwrap_or(DEFAULT_TRANSITION_MS);

    let autoplay_interval = positive_millis(interval_ms, "carousel.autoplay_interval_ms")?;
    if transition_ms >= interval_ms {
        return Err(LoadError::invalid(
            "carousel.transition_ms",
            "must be shorter than the autoplay interval",
        ));
    }

    Ok(CarouselSettings {
        autoplay_interval,
        transition: Duration::from_millis(transition_ms),
    })
}

fn build_catalog_settings(catalog: RawCatalogSettings) -> Result<CatalogSettings, LoadError> {
    let items_per_page = positive_count(
        catalog.items_per_page.unwrap_or(DEFAULT_ITEMS_PER_PAGE),
        "catalog.items_per_page",
    )?;
    let rail_limit = positive_count(
        catalog.rail_limit.unwrap_or(DEFAULT_RAIL_LIMIT),
        "catalog.rail_limit",
    )?;

    Ok(CatalogSettings {
        items_per_page,
        rail_limit,
    })
}

fn build_recent_settings(recent: RawRecentSettings) -> Result<RecentSettings, LoadError> {
    let limit = positive_count(recent.limit.unwrap_or(DEFAULT_RECENT_LIMIT), "recent.limit")?;

    let days = recent.max_age_days.unwrap_or(DEFAULT_RECENT_MAX_AGE_DAYS);
    if days == 0 {
        return Err(LoadError::invalid(
            "recent.max_age_days",
            "must be greater than zero",
        ));
    }
    let max_age = days
        .checked_mul(SECS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(|| LoadError::invalid("recent.max_age_days", "value is too large"))?;

    let path = recent
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RECENT_PATH));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid("recent.path", "path must not be empty"));
    }

    Ok(RecentSettings {
        limit,
        max_age,
        path,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    default_ttl_secs: Option<u64>,
    ttl_overrides: HashMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCarouselSettings {
    autoplay_interval_ms: Option<u64>,
    transition_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCatalogSettings {
    items_per_page: Option<u64>,
    rail_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRecentSettings {
    limit: Option<u64>,
    max_age_days: Option<u64>,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

fn positive_millis(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_millis(value))
}

fn positive_count(value: u64, key: &'static str) -> Result<usize, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    usize::try_from(value)
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))
}

#[cfg(test)]
mod tests;
