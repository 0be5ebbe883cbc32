//! ServiceMeshMetric - ingestion input
//!
//! One observed remote call, as delivered by a service-mesh sidecar.

use serde::{Deserialize, Serialize};

/// Wire protocol of the observed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "HTTP", alias = "http")]
    Http,
    #[serde(rename = "gRPC", alias = "grpc", alias = "GRPC")]
    Grpc,
    /// Any value this version does not know about
    #[default]
    #[serde(other)]
    Unrecognized,
}

impl Protocol {
    /// Map a protobuf enum number onto a protocol
    pub fn from_wire(value: i32) -> Self {
        match value {
            0 => Self::Http,
            1 => Self::Grpc,
            _ => Self::Unrecognized,
        }
    }
}

/// Which side of the call produced the report, as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireDetectPoint {
    Client,
    Server,
    Proxy,
    /// Unspecified or unknown
    #[default]
    #[serde(other)]
    Unrecognized,
}

impl WireDetectPoint {
    /// Map a protobuf enum number onto a detect point
    pub fn from_wire(value: i32) -> Self {
        match value {
            0 => Self::Client,
            1 => Self::Server,
            2 => Self::Proxy,
            _ => Self::Unrecognized,
        }
    }
}

/// Service mesh metric record
///
/// Immutable input of the analysis core. Missing string fields deserialize
/// to empty strings, which the dispatcher treats as "not reported".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceMeshMetric {
    /// Call start time (epoch milliseconds)
    pub start_time: i64,

    #[serde(default)]
    pub source_service_name: String,

    #[serde(default)]
    pub source_service_instance: String,

    #[serde(default)]
    pub dest_service_name: String,

    #[serde(default)]
    pub dest_service_instance: String,

    /// Raw endpoint name (before naming rules are applied)
    #[serde(default)]
    pub endpoint: String,

    /// Call latency (milliseconds)
    #[serde(default)]
    pub latency: i32,

    /// Whether the call succeeded
    #[serde(default)]
    pub status: bool,

    #[serde(default)]
    pub response_code: i32,

    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default)]
    pub detect_point: WireDetectPoint,
}
