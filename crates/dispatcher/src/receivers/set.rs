//! ReceiverSet - fans each source out to several receivers

use std::sync::Arc;

use contracts::{ContractError, Source, SourceReceiver};
use tracing::error;

use crate::metrics::{MetricsSnapshot, ReceiverMetrics};

struct ReceiverEntry {
    receiver: Arc<dyn SourceReceiver>,
    metrics: ReceiverMetrics,
}

/// Forwards every source to each receiver, in registration order
///
/// Stops at the first receiver that fails and returns its error.
pub struct ReceiverSet {
    name: String,
    entries: Vec<ReceiverEntry>,
}

impl ReceiverSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, receiver: Arc<dyn SourceReceiver>) {
        self.entries.push(ReceiverEntry {
            receiver,
            metrics: ReceiverMetrics::new(),
        });
    }

    pub fn with(mut self, receiver: Arc<dyn SourceReceiver>) -> Self {
        self.push(receiver);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metrics of every receiver
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.entries
            .iter()
            .map(|e| (e.receiver.name().to_string(), e.metrics.snapshot()))
            .collect()
    }
}

impl SourceReceiver for ReceiverSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, source: Source) -> Result<(), ContractError> {
        for entry in &self.entries {
            match entry.receiver.receive(source.clone()) {
                Ok(()) => entry.metrics.inc_received_count(),
                Err(e) => {
                    entry.metrics.inc_failure_count();
                    error!(
                        receiver = %entry.receiver.name(),
                        kind = %source.kind(),
                        error = %e,
                        "Receiver rejected source"
                    );
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Flush every receiver, reporting the first failure after trying all
    fn flush(&self) -> Result<(), ContractError> {
        let mut first_error = None;
        for entry in &self.entries {
            if let Err(e) = entry.receiver.flush() {
                error!(receiver = %entry.receiver.name(), error = %e, "Receiver flush failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
