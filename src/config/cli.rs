use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the spotlight binary.
#[derive(Debug, Parser)]
#[command(
    name = "spotlight",
    version,
    about = "Engagement-driven featured posts service"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SPOTLIGHT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service, cache sweeper and optional auto-feature schedule.
    Serve(Box<ServeArgs>),
    /// Run a single auto-feature pass against the database and exit.
    #[command(name = "run-auto-feature")]
    RunAutoFeature(RunAutoFeatureArgs),
    /// Print the engagement score and activity gate result for raw counters.
    Score(ScoreArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the query cache capacity.
    #[arg(long = "cache-max-entries", value_name = "COUNT")]
    pub cache_max_entries: Option<u64>,

    /// Override the cache sweep period.
    #[arg(long = "cache-cleanup-interval-seconds", value_name = "SECONDS")]
    pub cache_cleanup_interval_seconds: Option<u64>,

    /// Cron expression (six fields, seconds first) for scheduled auto-feature runs.
    #[arg(long = "auto-feature-schedule", value_name = "CRON")]
    pub auto_feature_schedule: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RunAutoFeatureArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Print the report as JSON.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ScoreArgs {
    #[arg(value_name = "VIEWS")]
    pub views: u64,
    #[arg(value_name = "LIKES")]
    pub likes: u64,
    #[arg(value_name = "COMMENTS")]
    pub comments: u64,
    #[arg(value_name = "BOOKMARKS")]
    pub bookmarks: u64,
}
