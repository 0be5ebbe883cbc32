//! Processing statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::DispatchStatsAggregator;

/// Statistics from a `process` run
#[derive(Debug, Clone, Default)]
pub struct ProcessStats {
    /// Records parsed from the input
    pub records_read: u64,

    /// Lines that were not valid metric records
    pub records_malformed: u64,

    /// Replay stopped by a shutdown signal before the input ended
    pub interrupted: bool,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of receivers sources were routed to
    pub active_receivers: usize,

    /// Per-receiver counters
    pub receiver_metrics: Vec<(String, MetricsSnapshot)>,

    /// Dispatch outcome aggregator
    pub dispatch: DispatchStatsAggregator,
}

impl ProcessStats {
    /// Records dispatched per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.records_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Processing Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Records read: {}", self.records_read);
        println!("   ├─ Malformed lines: {}", self.records_malformed);
        println!("   ├─ Records/s: {:.2}", self.throughput());
        if self.interrupted {
            println!("   ├─ Interrupted: yes");
        }
        println!("   └─ Active receivers: {}", self.active_receivers);

        println!("\n{}", self.dispatch.summary());

        if !self.receiver_metrics.is_empty() {
            println!("\nReceivers");
            for (name, snapshot) in &self.receiver_metrics {
                println!(
                    "   ├─ {}: received={} failures={}",
                    name, snapshot.received_count, snapshot.failure_count
                );
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        let stats = ProcessStats {
            records_read: 100,
            duration: Duration::from_secs(4),
            ..Default::default()
        };
        assert!((stats.throughput() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_throughput_zero_duration() {
        assert_eq!(ProcessStats::default().throughput(), 0.0);
    }
}
