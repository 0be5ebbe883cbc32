//! SourceReceiver trait - dispatcher output interface
//!
//! Defines the abstract interface of the downstream aggregation pipeline.

use crate::{ContractError, Source};

/// Downstream source receiver
///
/// Must tolerate repeated, concurrent and out-of-order calls. The dispatcher
/// calls `receive` once per emitted source.
pub trait SourceReceiver: Send + Sync {
    /// Receiver name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Accept one source
    ///
    /// # Errors
    /// Returns receive error (should include context); the dispatcher
    /// propagates it to its caller untouched
    fn receive(&self, source: Source) -> Result<(), ContractError>;

    /// Flush buffered sources (if any)
    fn flush(&self) -> Result<(), ContractError> {
        Ok(())
    }
}
