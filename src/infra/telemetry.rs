use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "spotlight_cache_hit_total",
            Unit::Count,
            "Total number of query cache hits."
        );
        describe_counter!(
            "spotlight_cache_miss_total",
            Unit::Count,
            "Total number of query cache misses, expired reads included."
        );
        describe_counter!(
            "spotlight_cache_evict_total",
            Unit::Count,
            "Total number of query cache evictions due to capacity."
        );
        describe_counter!(
            "spotlight_cache_expired_total",
            Unit::Count,
            "Total number of expired entries removed on read or sweep."
        );
        describe_gauge!(
            "spotlight_cache_entries",
            Unit::Count,
            "Current number of entries held by the query cache."
        );
        describe_counter!(
            "spotlight_auto_feature_promoted_total",
            Unit::Count,
            "Total number of posts promoted to featured."
        );
        describe_counter!(
            "spotlight_auto_feature_demoted_total",
            Unit::Count,
            "Total number of posts demoted from featured."
        );
        describe_counter!(
            "spotlight_auto_feature_failed_writes_total",
            Unit::Count,
            "Total number of featured flag writes that failed."
        );
        describe_histogram!(
            "spotlight_auto_feature_run_ms",
            Unit::Milliseconds,
            "Auto-feature run latency in milliseconds."
        );
    });
}
