//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, RunAutoFeatureArgs, ScoreArgs, ServeArgs, ServeOverrides,
};

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::{
    application::{
        auto_feature::{
            DEFAULT_DEMOTE_BELOW_SCORE, DEFAULT_MAX_PROMOTIONS, DEFAULT_PROMOTE_MIN_SCORE,
            DEFAULT_WINDOW_DAYS, FeaturePolicy,
        },
        jobs::auto_feature_schedule,
    },
    cache::MAX_TTL,
    domain::engagement::ActivityGate,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "spotlight";
const ENV_PREFIX: &str = "SPOTLIGHT";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1000;
const DEFAULT_CACHE_CLEANUP_INTERVAL_SECS: u64 = 300;
const DEFAULT_FEATURED_TTL_SECS: u64 = 300;
const DEFAULT_TRENDING_TTL_SECS: u64 = 300;
const DEFAULT_RECENT_TTL_SECS: u64 = 300;
const DEFAULT_TRENDING_TAGS_TTL_SECS: u64 = 600;
const DEFAULT_STATS_TTL_SECS: u64 = 3600;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub admin: AdminSettings,
    pub cache: CacheSettings,
    pub auto_feature: AutoFeatureSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
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

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Clone)]
pub struct AdminSettings {
    /// Bearer token accepted by the admin endpoints; `None` rejects every call.
    pub token: Option<String>,
}

impl std::fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSettings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub max_entries: NonZeroUsize,
    pub cleanup_interval: Duration,
    pub featured_ttl: Duration,
    pub trending_ttl: Duration,
    pub recent_ttl: Duration,
    pub trending_tags_ttl: Duration,
    pub stats_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct AutoFeatureSettings {
    pub policy: FeaturePolicy,
    /// Validated cron expression; `None` disables scheduled runs.
    pub schedule: Option<String>,
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

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::RunAutoFeature(args)) => raw.apply_database_override(&args.database),
        Some(Command::Score(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    admin: RawAdminSettings,
    cache: RawCacheSettings,
    auto_feature: RawAutoFeatureSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(max) = overrides.cache_max_entries {
            self.cache.max_entries = Some(max);
        }
        if let Some(seconds) = overrides.cache_cleanup_interval_seconds {
            self.cache.cleanup_interval_seconds = Some(seconds);
        }
        if let Some(schedule) = overrides.auto_feature_schedule.as_ref() {
            self.auto_feature.schedule = Some(schedule.clone());
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            admin,
            cache,
            auto_feature,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            admin: build_admin_settings(admin),
            cache: build_cache_settings(cache)?,
            auto_feature: build_auto_feature_settings(auto_feature)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = positive_seconds(graceful_secs, "server.graceful_shutdown_seconds")?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
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

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url: non_blank(database.url),
        max_connections,
    })
}

fn build_admin_settings(admin: RawAdminSettings) -> AdminSettings {
    AdminSettings {
        token: non_blank(admin.token),
    }
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let max_entries_value = cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES);
    let max_entries = usize::try_from(max_entries_value)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            LoadError::invalid(
                "cache.max_entries",
                "must be greater than zero and fit in usize",
            )
        })?;

    Ok(CacheSettings {
        max_entries,
        cleanup_interval: positive_seconds(
            cache
                .cleanup_interval_seconds
                .unwrap_or(DEFAULT_CACHE_CLEANUP_INTERVAL_SECS),
            "cache.cleanup_interval_seconds",
        )?,
        featured_ttl: positive_seconds(
            cache.featured_ttl_seconds.unwrap_or(DEFAULT_FEATURED_TTL_SECS),
            "cache.featured_ttl_seconds",
        )?,
        trending_ttl: positive_seconds(
            cache.trending_ttl_seconds.unwrap_or(DEFAULT_TRENDING_TTL_SECS),
            "cache.trending_ttl_seconds",
        )?,
        recent_ttl: positive_seconds(
            cache.recent_ttl_seconds.unwrap_or(DEFAULT_RECENT_TTL_SECS),
            "cache.recent_ttl_seconds",
        )?,
        trending_tags_ttl: positive_seconds(
            cache
                .trending_tags_ttl_seconds
                .unwrap_or(DEFAULT_TRENDING_TAGS_TTL_SECS),
            "cache.trending_tags_ttl_seconds",
        )?,
        stats_ttl: positive_seconds(
            cache.stats_ttl_seconds.unwrap_or(DEFAULT_STATS_TTL_SECS),
            "cache.stats_ttl_seconds",
        )?,
    })
}

fn build_auto_feature_settings(
    auto_feature: RawAutoFeatureSettings,
) -> Result<AutoFeatureSettings, LoadError> {
    let defaults = ActivityGate::default();
    let max_promotions = usize::try_from(
        auto_feature
            .max_promotions
            .unwrap_or(DEFAULT_MAX_PROMOTIONS as u64),
    )
    .map_err(|_| {
        LoadError::invalid(
            "auto_feature.max_promotions",
            "value exceeds supported range for usize",
        )
    })?;

    let policy = FeaturePolicy {
        window_days: auto_feature.window_days.unwrap_or(DEFAULT_WINDOW_DAYS),
        promote_min_score: auto_feature
            .promote_min_score
            .unwrap_or(DEFAULT_PROMOTE_MIN_SCORE),
        demote_below_score: auto_feature
            .demote_below_score
            .unwrap_or(DEFAULT_DEMOTE_BELOW_SCORE),
        max_promotions,
        gate: ActivityGate {
            min_views: auto_feature.min_views.unwrap_or(defaults.min_views),
            min_likes: auto_feature.min_likes.unwrap_or(defaults.min_likes),
            min_comments: auto_feature.min_comments.unwrap_or(defaults.min_comments),
        },
    };
    policy
        .validate()
        .map_err(|err| LoadError::invalid("auto_feature", err.to_string()))?;

    let schedule = non_blank(auto_feature.schedule);
    if let Some(expression) = schedule.as_deref() {
        auto_feature_schedule(expression)
            .map_err(|reason| LoadError::invalid("auto_feature.schedule", reason))?;
    }

    Ok(AutoFeatureSettings { policy, schedule })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Clone, Deserialize, Default)]
#[serde(default)]
struct RawAdminSettings {
    token: Option<String>,
}

impl std::fmt::Debug for RawAdminSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawAdminSettings").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    max_entries: Option<u64>,
    cleanup_interval_seconds: Option<u64>,
    featured_ttl_seconds: Option<u64>,
    trending_ttl_seconds: Option<u64>,
    recent_ttl_seconds: Option<u64>,
    trending_tags_ttl_seconds: Option<u64>,
    stats_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAutoFeatureSettings {
    window_days: Option<u32>,
    promote_min_score: Option<u64>,
    demote_below_score: Option<u64>,
    max_promotions: Option<u64>,
    min_views: Option<u64>,
    min_likes: Option<u64>,
    min_comments: Option<u64>,
    schedule: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn positive_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    if value > MAX_TTL.as_secs() {
        return Err(LoadError::invalid(
            key,
            format!("must not exceed {} seconds", MAX_TTL.as_secs()),
        ));
    }
    Ok(Duration::from_secs(value))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
