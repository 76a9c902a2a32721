//! Subscriber and tracer setup

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{SimpleSpanProcessor, TracerProvider};
use runbridge_core::config::ObservabilityConfig;
use runbridge_core::{Error, LogFormat, Result};
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Global tracer provider holder
static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Span processor builders registered before initialization
type ProcessorBuilder = Box<dyn FnOnce() -> SimpleSpanProcessor + Send>;
static SPAN_PROCESSOR_BUILDERS: Mutex<Option<Vec<ProcessorBuilder>>> =
    Mutex::new(Some(Vec::new()));

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryOptions {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl TelemetryOptions {
    pub fn from_config(config: &ObservabilityConfig) -> Self {
        Self {
            level: config.log_level.clone(),
            format: config.log_format,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self::from_config(&ObservabilityConfig::default())
    }
}

/// Register a span processor to be attached when telemetry is initialized.
///
/// Must be called BEFORE [`init_telemetry`]; later registrations are ignored.
///
/// ```ignore
/// use runbridge_telemetry::{register_span_processor, init_telemetry, TelemetryOptions};
/// use opentelemetry_sdk::trace::SimpleSpanProcessor;
///
/// register_span_processor(Box::new(|| {
///     SimpleSpanProcessor::new(Box::new(/* your exporter */))
/// }));
/// init_telemetry(&TelemetryOptions::default())?;
/// ```
pub fn register_span_processor(builder: ProcessorBuilder) {
    let mut builders = SPAN_PROCESSOR_BUILDERS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    match builders.as_mut() {
        Some(pending) => pending.push(builder),
        None => tracing::warn!("Span processor registered after telemetry initialization"),
    }
}

/// Install the global subscriber: an OpenTelemetry layer plus formatted
/// logs on stderr. Stdout is left alone; it carries the tool protocol.
///
/// `RUST_LOG` takes precedence over `options.level`.
pub fn init_telemetry(options: &TelemetryOptions) -> Result<()> {
    let builders = SPAN_PROCESSOR_BUILDERS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
        .unwrap_or_default();

    let mut provider_builder = TracerProvider::builder();
    for builder in builders {
        provider_builder = provider_builder.with_span_processor(builder());
    }
    let tracer_provider = provider_builder.build();
    let tracer = tracer_provider.tracer(crate::attributes::SYSTEM_NAME);
    let _ = TRACER_PROVIDER.set(Arc::new(tracer_provider));

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.level))
        .map_err(|e| Error::config_error(format!("invalid log level '{}': {}", options.level, e)))?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match options.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(filter)
        .try_init()
        .map_err(|e| Error::message(format!("failed to install tracing subscriber: {}", e)))
}

/// Get the global tracer provider if initialized
pub fn tracer_provider() -> Option<Arc<TracerProvider>> {
    TRACER_PROVIDER.get().cloned()
}
