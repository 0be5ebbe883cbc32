//! # Observability
//!
//! Tracing + Prometheus metrics for the mesh analysis pipeline.
//!
//! ## Features
//!
//! - Tracing initialisation (JSON/Pretty/Compact, stdout or stderr)
//! - Prometheus exporter
//! - Dispatch metrics recording and in-memory aggregation
//!
//! ## Example
//!
//! ```ignore
//! use observability::{LogFormat, ObservabilityConfig};
//!
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     ..Default::default()
//! })?;
//!
//! let outcome = dispatcher.process(metric)?;
//! observability::record_metric_processed(true);
//! ```

pub mod metrics;

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_endpoint_renamed, record_metric_processed, record_source_emitted,
    DispatchStatsAggregator, HistogramLatencyTimer, MetricsSummary, RunningStats, StatsSummary,
    MESH_ANALYSIS_LATENCY,
};

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Where log lines are written
    pub log_target: LogTarget,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Filter used when `RUST_LOG` is unset or ignored
    pub log_level: String,
    /// Let `RUST_LOG` override `log_level`
    pub honor_rust_log: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            log_target: LogTarget::Stdout,
            metrics_port: None,
            log_level: "info".to_string(),
            honor_rust_log: true,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON
    #[default]
    Json,
    /// Human readable
    Pretty,
    /// Compact single line
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!(
                "unknown log format '{other}' (expected json, pretty or compact)"
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
        })
    }
}

/// Log destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogTarget {
    #[default]
    Stdout,
    /// Keeps stdout free for command output
    Stderr,
}

/// Initialise tracing and, when a port is set, the Prometheus exporter
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = if config.honor_rust_log {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    } else {
        EnvFilter::new(&config.log_level)
    };

    let fmt_layer = match config.log_target {
        LogTarget::Stdout => format_layer(config.log_format, std::io::stdout),
        LogTarget::Stderr => format_layer(config.log_format, std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = %config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

fn format_layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    use tracing_subscriber::fmt;

    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(writer).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(writer).boxed(),
    }
}

/// Initialise Prometheus metrics only
pub fn init_metrics_only(port: u16) -> Result<()> {
    let builder = PrometheusBuilder::new();
    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    ::metrics::describe_histogram!(
        MESH_ANALYSIS_LATENCY,
        ::metrics::Unit::Seconds,
        "The process latency of service mesh telemetry"
    );
    ::metrics::describe_counter!(
        "mesh_sources_emitted_total",
        "Sources forwarded to the receiver, by kind"
    );
    ::metrics::describe_counter!(
        "mesh_metrics_processed_total",
        "Service mesh metrics processed, by status"
    );
    ::metrics::describe_counter!(
        "mesh_endpoint_renamed_total",
        "Endpoint names rewritten by naming rules"
    );
}
