//! LogReceiver - logs sources via tracing

use contracts::{ContractError, Source, SourceReceiver};
use tracing::info;

/// Receiver that logs every source, for debugging
pub struct LogReceiver {
    name: String,
}

impl LogReceiver {
    /// Create a new LogReceiver with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl SourceReceiver for LogReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, source: Source) -> Result<(), ContractError> {
        info!(
            receiver = %self.name,
            kind = %source.kind(),
            time_bucket = source.time_bucket(),
            source = ?source,
            "Source received"
        );
        Ok(())
    }
}
