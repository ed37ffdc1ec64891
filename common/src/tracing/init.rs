use crate::error::{AskError, Result};
use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_sdk::Resource;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// tracing settings resolved by the binary from cli/env
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub otlp_endpoint: Option<String>,
}

impl TracingConfig {
    fn export_endpoint(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.otlp_endpoint.as_deref().filter(|e| !e.trim().is_empty())
    }
}

pub struct OtelGuard {
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            // flush remaining spans on shutdown
            if let Err(e) = provider.shutdown() {
                eprintln!("error shutting down tracer provider: {}", e);
            }
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,sqlx=warn,actix_server=warn,h2=warn".into())
}

pub fn init_tracing(service_name: &str, config: &TracingConfig) -> Result<OtelGuard> {
    let Some(endpoint_url) = config.export_endpoint() else {
        // no exporter, console logging only
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .try_init()
            .map_err(|e| AskError::Config(format!("tracing init failed: {}", e)))?;

        tracing::info!("basic logging initialized (service={})", service_name);

        return Ok(OtelGuard {
            tracer_provider: None,
        });
    };

    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint_url)
        .build()
        .map_err(|e| AskError::Config(format!("otlp exporter build failed: {}", e)))?;

    let resource = Resource::builder_empty()
        .with_attribute(KeyValue::new("service.name", service_name.to_string()))
        .build();

    let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let telemetry =
        tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()));

    tracing_subscriber::registry()
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter())
        .try_init()
        .map_err(|e| AskError::Config(format!("tracing init failed: {}", e)))?;

    tracing::info!(
        "opentelemetry tracing initialized for {} (endpoint: {})",
        service_name,
        endpoint_url
    );

    Ok(OtelGuard {
        tracer_provider: Some(provider),
    })
}
