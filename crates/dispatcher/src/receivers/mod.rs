//! Receiver implementations
//!
//! Contains LogReceiver, FileReceiver, MemoryReceiver and ReceiverSet.
//! Only log and file receivers are reachable from configuration; the memory
//! receiver is wired in code.

mod file;
mod log;
mod memory;
mod set;

use std::sync::Arc;

use contracts::{ReceiverConfig, ReceiverType, SourceReceiver};
use tracing::instrument;

use crate::error::DispatcherError;

pub use self::file::{FileReceiver, FileReceiverConfig};
pub use self::log::LogReceiver;
pub use self::memory::MemoryReceiver;
pub use self::set::ReceiverSet;

/// Create a receiver from configuration
#[instrument(
    name = "dispatcher_create_receiver",
    skip(config),
    fields(receiver = %config.name, receiver_type = ?config.receiver_type)
)]
pub fn create_receiver(config: &ReceiverConfig) -> Result<Arc<dyn SourceReceiver>, DispatcherError> {
    match config.receiver_type {
        ReceiverType::Log => Ok(Arc::new(LogReceiver::new(&config.name))),
        ReceiverType::File => {
            let receiver = FileReceiver::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::receiver_creation(&config.name, e.to_string()))?;
            Ok(Arc::new(receiver))
        }
    }
}

/// Build a ReceiverSet from receiver configs
#[instrument(
    name = "dispatcher_build_receivers",
    skip(configs),
    fields(receiver_count = configs.len())
)]
pub fn build_receivers(configs: &[ReceiverConfig]) -> Result<ReceiverSet, DispatcherError> {
    let mut set = ReceiverSet::new("receivers");
    for config in configs {
        set.push(create_receiver(config)?);
    }
    Ok(set)
}
