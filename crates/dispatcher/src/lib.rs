//! # Dispatcher
//!
//! Service mesh telemetry analysis core.
//!
//! Responsible for:
//! - Normalizing endpoint names with per-service naming rules
//! - Fanning each `ServiceMeshMetric` out into heartbeat, node and relation sources
//! - Forwarding sources to the configured receivers

pub mod dispatcher;
pub mod error;
pub mod heartbeat;
pub mod identity;
pub mod mapping;
pub mod metrics;
pub mod naming;
pub mod normalizer;
pub mod receivers;
pub mod time_bucket;

pub use contracts::{ServiceMeshMetric, Source, SourceReceiver};
pub use dispatcher::{
    DispatchContext, DispatchOutcome, DispatcherBuilder, TelemetryDataDispatcher,
    MAX_SOURCES_PER_METRIC,
};
pub use error::DispatcherError;
pub use heartbeat::HeartbeatEmitter;
pub use identity::ServiceIdEncoder;
pub use mapping::{map_detect_point, protocol_to_component, protocol_to_type};
pub use metrics::{MetricsSnapshot, ReceiverMetrics};
pub use naming::{EndpointNamingRules, StringFormatGroup};
pub use normalizer::{MetricNormalizer, NormalizedMetric};
pub use receivers::{
    build_receivers, create_receiver, FileReceiver, FileReceiverConfig, LogReceiver,
    MemoryReceiver, ReceiverSet,
};
pub use time_bucket::MinuteTimeBucket;
