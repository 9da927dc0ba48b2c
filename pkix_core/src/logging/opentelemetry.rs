use crate::logging::OtlpConfig;
use crate::logging::error::{ExporterSnafu, LogError};
use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider, Temporality};
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider, Tracer};
use opentelemetry_semantic_conventions::SCHEMA_URL;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;
use snafu::ResultExt;

fn resource() -> Resource {
    Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .with_schema_url(
            [KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION"))],
            SCHEMA_URL,
        )
        .build()
}

fn sampler(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::ParentBased(Box::new(Sampler::AlwaysOn))
    } else {
        Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(ratio)))
    }
}

/// Installs the global meter provider behind the `pkix_core.fetch` and
/// `pkix_core.path` meters.
pub fn init_meter_provider(config: &OtlpConfig) -> Result<SdkMeterProvider, LogError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_temporality(Temporality::Cumulative)
        .with_endpoint(format!("{}/v1/metrics", config.endpoint))
        .build()
        .context(ExporterSnafu { signal: "metrics" })?;

    let meter_provider = SdkMeterProvider::builder()
        .with_resource(resource())
        .with_reader(
            PeriodicReader::builder(exporter)
                .with_interval(config.metrics_interval)
                .build(),
        )
        .build();
    global::set_meter_provider(meter_provider.clone());
    Ok(meter_provider)
}

pub fn init_tracer(config: &OtlpConfig) -> Result<Tracer, LogError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpJson)
        .with_endpoint(format!("{}/v1/traces", config.endpoint))
        .build()
        .context(ExporterSnafu { signal: "traces" })?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_sampler(sampler(config.trace_sample_ratio))
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build();
    Ok(tracer_provider.tracer(env!("CARGO_PKG_NAME")))
}
