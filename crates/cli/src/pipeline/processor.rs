//! Replays newline-delimited metric records through the dispatcher.

use std::future::Future;
use std::path::PathBuf;
use std::pin::{pin, Pin};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};

use contracts::{MeshAnalysisConfig, ReceiverConfig, ServiceMeshMetric, SourceReceiver};
use dispatcher::{build_receivers, EndpointNamingRules, ReceiverSet, TelemetryDataDispatcher};
use observability::{record_metric_processed, DispatchStatsAggregator};

use super::ProcessStats;

/// Name of the receiver used when the configuration declares none
const DEFAULT_RECEIVER: &str = "log";

/// Processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Loaded analysis configuration
    pub config: MeshAnalysisConfig,

    /// Input path, `-` for stdin
    pub input: PathBuf,

    /// Maximum records to dispatch (None = unlimited)
    pub max_records: Option<u64>,

    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
}

impl ProcessorConfig {
    fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}

/// Metric record processor
pub struct Processor {
    config: ProcessorConfig,
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Dispatch every record of the input and return run statistics
    ///
    /// Stops reading once `shutdown` resolves; receivers are flushed either way.
    #[instrument(
        name = "processor_run",
        skip(self, shutdown),
        fields(input = %self.config.input.display())
    )]
    pub async fn run<F>(&self, shutdown: F) -> Result<ProcessStats>
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now();
        let mut shutdown = pin!(shutdown);

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)
                .context("Failed to initialize metrics exporter")?;
        }

        let receivers = Arc::new(self.build_receiver_set()?);
        let rules = EndpointNamingRules::from_config(&self.config.config.endpoint_naming)
            .context("Failed to compile endpoint naming rules")?;

        info!(
            receivers = receivers.len(),
            naming_services = rules.service_count(),
            naming_rules = rules.rule_count(),
            "Dispatcher ready"
        );

        let dispatcher = TelemetryDataDispatcher::builder(receivers.clone())
            .formatter(Arc::new(rules))
            .build();

        let mut stats = if self.config.reads_stdin() {
            let reader = BufReader::new(tokio::io::stdin());
            self.replay(reader, &dispatcher, shutdown.as_mut()).await?
        } else {
            let file = tokio::fs::File::open(&self.config.input)
                .await
                .with_context(|| format!("Failed to open {}", self.config.input.display()))?;
            self.replay(BufReader::new(file), &dispatcher, shutdown.as_mut())
                .await?
        };

        receivers.flush().context("Failed to flush receivers")?;

        stats.active_receivers = receivers.len();
        stats.receiver_metrics = receivers.metrics();
        stats.duration = start.elapsed();
        Ok(stats)
    }

    fn build_receiver_set(&self) -> Result<ReceiverSet> {
        let configs = &self.config.config.receivers;
        let set = if configs.is_empty() {
            info!(receiver = DEFAULT_RECEIVER, "No receivers configured, logging sources");
            build_receivers(&[ReceiverConfig::log(DEFAULT_RECEIVER)])
        } else {
            build_receivers(configs)
        };
        set.context("Failed to create receivers")
    }

    async fn replay<R, F>(
        &self,
        reader: R,
        dispatcher: &TelemetryDataDispatcher,
        mut shutdown: Pin<&mut F>,
    ) -> Result<ProcessStats>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let mut stats = ProcessStats::default();
        let mut aggregator = DispatchStatsAggregator::new();
        let mut lines = reader.lines();
        let mut line_number: u64 = 0;

        loop {
            // `next_line` is cancel safe, so an interrupted read loses no record
            let line = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!(line = line_number, "Shutdown requested, stopping replay");
                    stats.interrupted = true;
                    break;
                }
                line = lines.next_line() => line.context("Failed to read input")?,
            };
            let Some(line) = line else {
                break;
            };
            line_number += 1;

            if self
                .config
                .max_records
                .is_some_and(|max| stats.records_read >= max)
            {
                info!(max_records = stats.records_read, "Reached record limit");
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let metric: ServiceMeshMetric = match serde_json::from_str(line) {
                Ok(metric) => metric,
                Err(e) => {
                    warn!(line = line_number, error = %e, "Skipping malformed record");
                    stats.records_malformed += 1;
                    continue;
                }
            };
            stats.records_read += 1;

            let latency = metric.latency;
            match dispatcher.process(metric) {
                Ok(outcome) => {
                    debug!(
                        line = line_number,
                        time_bucket = outcome.time_bucket,
                        sources = outcome.emitted.len(),
                        "Record dispatched"
                    );
                    aggregator.record_success(latency, &outcome.emitted, outcome.endpoint_renamed);
                    record_metric_processed(true);
                }
                Err(e) => {
                    warn!(line = line_number, error = %e, "Record dispatch failed");
                    aggregator.record_failure();
                    record_metric_processed(false);
                }
            }
        }

        stats.dispatch = aggregator;
        Ok(stats)
    }
}
