use snafu::{Location, Snafu};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum LogError {
    #[snafu(display("Failed to open log file {path}"))]
    LogFile {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to build the OTLP {signal} exporter"))]
    Exporter {
        signal: &'static str,
        source: opentelemetry_otlp::ExporterBuildError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("A global tracing subscriber is already installed"))]
    SetGlobalDefault {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },
}
