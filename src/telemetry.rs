use std::path::Path;
use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Layer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Directory, relative to the working directory, holding the TUI log
const LOG_DIR: &str = ".kbview";

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| Resource::builder().with_service_name("kbview").build())
        .clone()
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder().with_http().build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Filter for exported spans; keeps exporter traffic (reqwest/hyper) out
fn otel_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::new("info")
        .add_directive("hyper=off".parse()?)
        .add_directive("reqwest=off".parse()?))
}

/// Console logging to stderr, plus OTLP span export when `otel` is set.
///
/// The OTLP endpoint comes from the standard `OTEL_EXPORTER_OTLP_*`
/// environment variables.
pub fn init_tracing_subscriber(otel: bool) -> anyhow::Result<OtelGuard> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let tracer_provider = if otel { Some(init_traces()?) } else { None };
    let otel_layer = match &tracer_provider {
        Some(provider) => {
            Some(OpenTelemetryLayer::new(provider.tracer("kbview")).with_filter(otel_filter()?))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(otel_layer)
        .init();

    Ok(OtelGuard { tracer_provider })
}

/// File logging for the terminal UI, which owns stdout/stderr while running.
///
/// With `otel` set, spans are also exported over OTLP as for the other
/// commands.
pub fn setup_file_logging(work_dir: &Path, otel: bool) -> anyhow::Result<OtelGuard> {
    let log_dir = work_dir.join(LOG_DIR);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, "tui.log");

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter());

    let tracer_provider = if otel { Some(init_traces()?) } else { None };
    let otel_layer = match &tracer_provider {
        Some(provider) => {
            Some(OpenTelemetryLayer::new(provider.tracer("kbview")).with_filter(otel_filter()?))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(otel_layer)
        .init();

    Ok(OtelGuard { tracer_provider })
}

/// Flushes and shuts down exporters on drop
pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
