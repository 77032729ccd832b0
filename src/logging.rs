use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Tracer;
use opentelemetry_sdk::{Resource, runtime};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing::{Span, debug, debug_span, field};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::{EnvFilter, prelude::*, registry};

/// Name workboard reports itself under in collected traces and metrics
const SERVICE_NAME: &str = "workboard";

/// Background OpenTelemetry pipelines for spans and metrics
pub struct OtelExporters {
    pub tracer: Tracer,
    pub meter: SdkMeterProvider,
}

/// Opens a span for each incoming request, continuing any W3C trace context the caller sent
fn request_span(request: &Request<Body>) -> Span {
    let span = debug_span!(
        "request",
        method = request.method().as_str(),
        path = request.uri().path(),
        response_status = field::Empty,
        latency_ms = field::Empty,
    );
    let caller_context = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(request.headers()))
    });
    span.set_parent(caller_context);

    span
}

fn record_response(response: &Response<Body>, latency: Duration, span: &Span) {
    span.record("response_status", field::display(response.status()));
    span.record("latency_ms", latency.as_millis() as u64);
    debug!("Finished handling request");
}

/// Wraps every route of the router in a request span
pub fn attach_tracing_http<T>(router: Router<T>) -> Router<T>
where
    T: Clone + Send + Sync + 'static,
{
    let request_tracing = ServiceBuilder::new().layer(
        TraceLayer::new_for_http()
            .make_span_with(request_span)
            .on_response(record_response),
    );

    router.layer(request_tracing)
}

fn service_resource() -> Resource {
    Resource::new([KeyValue::new("service.name", SERVICE_NAME)])
}

/// Starts gRPC exporters for spans and metrics. Must be called from inside the tokio runtime.
pub fn init_exporters(
    traces_endpoint: &str,
    metrics_endpoint: &str,
) -> Result<OtelExporters, anyhow::Error> {
    let span_exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(traces_endpoint)
        .build()
        .with_context(|| format!("building the span exporter for {traces_endpoint}"))?;
    let metric_exporter = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(metrics_endpoint)
        .build()
        .with_context(|| format!("building the metric exporter for {metrics_endpoint}"))?;

    let tracer = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(span_exporter, runtime::Tokio)
        .with_resource(service_resource())
        .build()
        .tracer(SERVICE_NAME);
    let meter = SdkMeterProvider::builder()
        .with_reader(PeriodicReader::builder(metric_exporter, runtime::Tokio).build())
        .with_resource(service_resource())
        .build();

    Ok(OtelExporters { tracer, meter })
}

/// Parses `LOG_LEVEL`-style directives (e.g. "info,sqlx=warn") into the filter for the stdout logger.
/// With no directives everything at "info" and above is printed.
pub fn env_filter(directives: Option<&str>) -> Result<EnvFilter, anyhow::Error> {
    let directives = directives.unwrap_or_default();

    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse(directives)
        .with_context(|| format!("parsing the log filter \"{directives}\""))
}

/// Installs the global subscriber. JSON logs go to stdout through `env_filter`, and when exporters are
/// given, every span and event at "debug" and above is also shipped to OpenTelemetry.
pub fn setup_logging_and_tracing(
    env_filter: EnvFilter,
    otel_exporters: Option<OtelExporters>,
) -> Result<(), anyhow::Error> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let (trace_layer, metrics_layer) = match otel_exporters {
        Some(OtelExporters { tracer, meter }) => (
            Some(OpenTelemetryLayer::new(tracer)),
            Some(MetricsLayer::new(meter)),
        ),
        None => (None, None),
    };

    registry()
        .with(LevelFilter::DEBUG)
        .with(trace_layer)
        .with(metrics_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_filter(env_filter),
        )
        .try_init()
        .context("installing the global tracing subscriber")
}
