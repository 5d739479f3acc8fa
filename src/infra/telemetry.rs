use std::sync::Once;

use metrics::{Unit, describe_counter};
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

    // stdout carries command output; logs go to stderr.
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "newsroom_cache_hit_total",
            Unit::Count,
            "Reads answered from the cache, by collection."
        );
        describe_counter!(
            "newsroom_cache_miss_total",
            Unit::Count,
            "Reads the cache could not answer, by collection."
        );
        describe_counter!(
            "newsroom_store_fallback_total",
            Unit::Count,
            "Successful store reads made after a cache miss, by collection."
        );
        describe_counter!(
            "newsroom_cache_error_total",
            Unit::Count,
            "Cache failures that were logged and tolerated, by operation."
        );
        describe_counter!(
            "newsroom_news_compensation_total",
            Unit::Count,
            "News rows deleted again after their tag associations failed to write."
        );
    });
}
