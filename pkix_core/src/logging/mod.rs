//! Subscriber setup for the `pkix_core::*` tracing targets.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::settings::Settings;
use crate::config::{ConfigError, InvalidParameterValueSnafu};
pub use crate::logging::error::LogError;
use crate::logging::error::{LogFileSnafu, SetGlobalDefaultSnafu};
use crate::logging::opentelemetry::{init_meter_provider, init_tracer};
use snafu::ResultExt;
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

mod error;
mod opentelemetry;

pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4318";

/// Where OTLP/HTTP spans and metrics go and how much is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OtlpConfig {
    /// Base URL; `/v1/traces` and `/v1/metrics` are appended.
    pub endpoint: String,
    pub metrics_interval: Duration,
    /// Fraction of root traces sampled, in `[0, 1]`.
    pub trace_sample_ratio: f64,
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            metrics_interval: Duration::from_secs(30),
            trace_sample_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Truncated on startup.
    pub log_file: Option<PathBuf>,
    pub stderr: bool,
    pub stderr_level: LevelFilter,
    /// OTLP export; `None` disables it.
    pub opentelemetry: Option<OtlpConfig>,
}

impl LoggingConfig {
    pub fn new(log_file: Option<PathBuf>, stderr: bool, opentelemetry: bool) -> Self {
        Self {
            log_file,
            stderr,
            stderr_level: LevelFilter::DEBUG,
            opentelemetry: opentelemetry.then(OtlpConfig::default),
        }
    }

    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.opentelemetry
            .get_or_insert_with(OtlpConfig::default)
            .endpoint = endpoint.into();
        self
    }

    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        let mut config = Self::new(
            settings.get_string("log_file").map(PathBuf::from),
            settings.get_bool("log_stderr").unwrap_or(false),
            settings.get_bool("otlp_enabled").unwrap_or(false),
        );
        if let Some(level) = settings.get_string("log_stderr_level") {
            config.stderr_level = level.parse().map_err(|_| {
                InvalidParameterValueSnafu {
                    parameter: "log_stderr_level",
                    value: level.clone(),
                    explanation: "Expected off, error, warn, info, debug or trace",
                }
                .build()
            })?;
        }
        let Some(otlp) = config.opentelemetry.as_mut() else {
            return Ok(config);
        };
        if let Some(endpoint) = settings.get_string("otlp_endpoint") {
            if url::Url::parse(&endpoint).is_err() {
                return InvalidParameterValueSnafu {
                    parameter: "otlp_endpoint",
                    value: endpoint,
                    explanation: "Not a valid URL",
                }
                .fail();
            }
            otlp.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(secs) = settings.get_int("otlp_metrics_interval_secs") {
            if secs < 1 {
                return InvalidParameterValueSnafu {
                    parameter: "otlp_metrics_interval_secs",
                    value: secs.to_string(),
                    explanation: "Interval must be at least one second",
                }
                .fail();
            }
            otlp.metrics_interval = Duration::from_secs(secs as u64);
        }
        if let Some(ratio) = settings.get_double("otlp_trace_sample_ratio") {
            if !(0.0..=1.0).contains(&ratio) {
                return InvalidParameterValueSnafu {
                    parameter: "otlp_trace_sample_ratio",
                    value: ratio.to_string(),
                    explanation: "Ratio must be between 0 and 1",
                }
                .fail();
            }
            otlp.trace_sample_ratio = ratio;
        }
        Ok(config)
    }
}

struct EmptyLayer;

impl Layer<Registry> for EmptyLayer {}

pub fn init(config: LoggingConfig) -> Result<(), LogError> {
    init_logging::<EmptyLayer>(config, None)
}

/// Installs the global subscriber. `extra_layer` sits closest to the
/// registry, ahead of the file, OpenTelemetry and stderr layers.
pub fn init_logging<L>(config: LoggingConfig, extra_layer: Option<L>) -> Result<(), LogError>
where
    L: Layer<Registry> + Send + Sync,
{
    let subscriber = Registry::default().with(extra_layer);

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = std::fs::File::create(path).context(LogFileSnafu {
                path: path.display().to_string(),
            })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(file),
            )
        }
        None => None,
    };
    let subscriber = subscriber.with(file_layer);

    let opentelemetry_layer = match &config.opentelemetry {
        Some(otlp) => {
            init_meter_provider(otlp)?;
            Some(OpenTelemetryLayer::new(init_tracer(otlp)?))
        }
        None => None,
    };
    let subscriber = subscriber.with(opentelemetry_layer);

    let stderr_layer = config.stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(config.stderr_level)
    });
    let subscriber = subscriber.with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber).context(SetGlobalDefaultSnafu)?;
    Ok(())
}
