use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace as sdktrace, Resource};
use opentelemetry_semantic_conventions::resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the tracing subscriber: EnvFilter + text or JSON fmt layer, and
/// an OTLP export pipeline when OTEL_EXPORTER_OTLP_ENDPOINT is set.
pub fn init_telemetry(service_name: &str) {
    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

    // Keep DB driver chatter at warn unless overridden.
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,denguewatch_server=info,sqlx=warn,sea_orm=warn".into()),
    );

    let registry = tracing_subscriber::registry().with(env_filter);

    let otel_layer = if let Some(endpoint) = otlp_endpoint {
        let resource = Resource::new(vec![KeyValue::new(
            resource::SERVICE_NAME,
            service_name.to_string(),
        )]);

        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint),
            )
            .with_trace_config(
                sdktrace::config()
                    .with_resource(resource)
                    .with_sampler(sdktrace::Sampler::AlwaysOn),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .expect("failed to install OpenTelemetry tracer");

        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .without_time();
        registry.with(otel_layer).with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer();
        registry.with(otel_layer).with(fmt_layer).init();
    };
}
