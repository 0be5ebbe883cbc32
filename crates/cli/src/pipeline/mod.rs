//! Metric replay pipeline.

mod processor;
mod stats;

pub use processor::{Processor, ProcessorConfig};
pub use stats::ProcessStats;
