//! Dispatch metrics
//!
//! Recording functions on top of the `metrics` facade, the histogram-backed
//! latency timer and an in-memory aggregator for run summaries.

use std::collections::BTreeMap;

use contracts::{LatencyTimer, SourceKind, TimerStart};
use metrics::{counter, histogram};

/// Histogram name of the per-metric processing latency
pub const MESH_ANALYSIS_LATENCY: &str = "mesh_analysis_latency";

/// Record one source forwarded to the receiver
pub fn record_source_emitted(kind: SourceKind) {
    counter!("mesh_sources_emitted_total", "kind" => kind.as_str()).increment(1);
}

/// Record one processed metric
pub fn record_metric_processed(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("mesh_metrics_processed_total", "status" => status).increment(1);
}

/// Record an endpoint renamed by naming rules
pub fn record_endpoint_renamed(service: &str) {
    counter!(
        "mesh_endpoint_renamed_total",
        "service" => service.to_string()
    )
    .increment(1);
}

/// `LatencyTimer` backed by a Prometheus histogram (seconds)
#[derive(Debug, Clone)]
pub struct HistogramLatencyTimer {
    name: &'static str,
}

impl HistogramLatencyTimer {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Default for HistogramLatencyTimer {
    fn default() -> Self {
        Self::new(MESH_ANALYSIS_LATENCY)
    }
}

impl LatencyTimer for HistogramLatencyTimer {
    fn finish(&self, started: TimerStart) {
        histogram!(self.name).record(started.instant().elapsed().as_secs_f64());
    }
}

/// Dispatch statistics aggregator
///
/// Aggregates in memory for end-of-run summaries.
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// Metrics dispatched successfully
    pub total_processed: u64,

    /// Metrics whose dispatch failed
    pub total_failed: u64,

    /// Endpoints rewritten by naming rules
    pub endpoints_renamed: u64,

    /// Forwarded sources per kind
    pub sources_by_kind: BTreeMap<SourceKind, u64>,

    /// Reported call latency (ms)
    pub call_latency: RunningStats,
}

impl DispatchStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one successfully dispatched metric
    pub fn record_success(&mut self, call_latency_ms: i32, emitted: &[SourceKind], renamed: bool) {
        self.total_processed += 1;
        if renamed {
            self.endpoints_renamed += 1;
        }
        for kind in emitted {
            *self.sources_by_kind.entry(*kind).or_insert(0) += 1;
        }
        self.call_latency.push(call_latency_ms as f64);
    }

    /// Account for one failed dispatch
    pub fn record_failure(&mut self) {
        self.total_failed += 1;
    }

    pub fn total_sources(&self) -> u64 {
        self.sources_by_kind.values().sum()
    }

    /// Build the summary report
    pub fn summary(&self) -> MetricsSummary {
        let total = self.total_processed + self.total_failed;
        MetricsSummary {
            total_processed: self.total_processed,
            total_failed: self.total_failed,
            failure_rate: if total > 0 {
                self.total_failed as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            endpoints_renamed: self.endpoints_renamed,
            total_sources: self.total_sources(),
            sources_by_kind: self.sources_by_kind.clone(),
            call_latency_ms: StatsSummary::from(&self.call_latency),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_processed: u64,
    pub total_failed: u64,
    pub failure_rate: f64,
    pub endpoints_renamed: u64,
    pub total_sources: u64,
    pub sources_by_kind: BTreeMap<SourceKind, u64>,
    pub call_latency_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Mesh Analysis Summary ===")?;
        writeln!(f, "Metrics processed: {}", self.total_processed)?;
        writeln!(
            f,
            "Metrics failed: {} ({:.2}%)",
            self.total_failed, self.failure_rate
        )?;
        writeln!(f, "Endpoints renamed: {}", self.endpoints_renamed)?;
        writeln!(f, "Call latency (ms): {}", self.call_latency_ms)?;
        writeln!(f, "Sources emitted: {}", self.total_sources)?;
        for (kind, count) in &self.sources_by_kind {
            writeln!(f, "  {}: {}", kind, count)?;
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
