use std::sync::OnceLock;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

fn init_tracer(level: &str, otel: bool) {
    // stdout carries command output, so diagnostics go to stderr
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true);

    let telemetry = otel.then(|| {
        let sdk_provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();

        let tracer = sdk_provider.tracer("pyxctl");
        global::set_tracer_provider(sdk_provider);

        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    Registry::default()
        .with(EnvFilter::new(level))
        .with(fmt)
        .with(telemetry)
        .init();
}

pub fn init(level: &str, otel: bool) {
    static INITIALIZED: OnceLock<()> = OnceLock::new();

    INITIALIZED.get_or_init(|| init_tracer(level, otel));
}
