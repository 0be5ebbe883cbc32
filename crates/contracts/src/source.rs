//! Source - dispatcher output
//!
//! Domain events handed to the downstream aggregation pipeline. Each one is
//! built fresh per metric and never mutated after it is forwarded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Component ids from the shared component library registry.
///
/// These values key existing stored data and must never change.
pub mod component {
    /// gRPC
    pub const GRPC: i32 = 23;
    /// HTTP
    pub const HTTP: i32 = 49;
    /// Generic RPC
    pub const RPC: i32 = 50;
}

/// Request type of an analysed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    Rpc,
    Database,
    Http,
    Grpc,
    Mq,
    Logic,
}

/// Side of the call the observation was made on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectPoint {
    Client,
    Server,
    Proxy,
}

/// Node type of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeType {
    /// A service instrumented by an agent or a sidecar
    #[default]
    Normal,
    Database,
    Rpc,
    User,
    Mq,
    Http,
    Browser,
    Unrecognized,
}

impl NodeType {
    /// Stable numeric value used in storage
    pub fn value(self) -> i32 {
        match self {
            NodeType::Normal => 0,
            NodeType::Database => 1,
            NodeType::Rpc => 2,
            NodeType::User => 3,
            NodeType::Mq => 4,
            NodeType::Http => 5,
            NodeType::Browser => 6,
            NodeType::Unrecognized => 7,
        }
    }
}

/// Service instance liveness refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceUpdate {
    /// Encoded service id
    pub service_id: String,
    /// Instance name
    pub name: String,
    pub time_bucket: i64,
}

/// Global traffic, keyed by destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct All {
    pub time_bucket: i64,
    /// Destination service name
    pub name: String,
    pub service_instance_name: String,
    pub endpoint_name: String,
    pub latency: i32,
    pub status: bool,
    pub response_code: i32,
    pub request_type: RequestType,
}

/// Per-service traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub time_bucket: i64,
    pub name: String,
    pub node_type: NodeType,
    pub service_instance_name: String,
    pub endpoint_name: String,
    pub latency: i32,
    pub status: bool,
    pub response_code: i32,
    pub request_type: RequestType,
}

/// Per-instance traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub time_bucket: i64,
    /// Instance name
    pub name: String,
    pub service_name: String,
    pub node_type: NodeType,
    pub endpoint_name: String,
    pub latency: i32,
    pub status: bool,
    pub response_code: i32,
    pub request_type: RequestType,
}

/// Per-endpoint traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub time_bucket: i64,
    /// Endpoint name
    pub name: String,
    pub service_name: String,
    pub service_node_type: NodeType,
    pub service_instance_name: String,
    pub latency: i32,
    pub status: bool,
    pub response_code: i32,
    pub request_type: RequestType,
}

/// Service to service edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRelation {
    pub time_bucket: i64,
    pub source_service_name: String,
    pub source_service_node_type: NodeType,
    pub source_service_instance_name: String,
    pub dest_service_name: String,
    pub dest_service_node_type: NodeType,
    pub dest_service_instance_name: String,
    pub endpoint: String,
    pub latency: i32,
    pub status: bool,
    pub response_code: i32,
    pub request_type: RequestType,
    pub component_id: i32,
    pub detect_point: DetectPoint,
}

/// Instance to instance edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceRelation {
    pub time_bucket: i64,
    pub source_service_name: String,
    pub source_service_node_type: NodeType,
    pub source_service_instance_name: String,
    pub dest_service_name: String,
    pub dest_service_node_type: NodeType,
    pub dest_service_instance_name: String,
    pub endpoint: String,
    pub latency: i32,
    pub status: bool,
    pub response_code: i32,
    pub request_type: RequestType,
    pub component_id: i32,
    pub detect_point: DetectPoint,
}

/// Any event accepted by a `SourceReceiver`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    ServiceInstanceUpdate(ServiceInstanceUpdate),
    All(All),
    Service(Service),
    ServiceInstance(ServiceInstance),
    Endpoint(Endpoint),
    ServiceRelation(ServiceRelation),
    ServiceInstanceRelation(ServiceInstanceRelation),
}

impl Source {
    /// Variant discriminant
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::ServiceInstanceUpdate(_) => SourceKind::ServiceInstanceUpdate,
            Source::All(_) => SourceKind::All,
            Source::Service(_) => SourceKind::Service,
            Source::ServiceInstance(_) => SourceKind::ServiceInstance,
            Source::Endpoint(_) => SourceKind::Endpoint,
            Source::ServiceRelation(_) => SourceKind::ServiceRelation,
            Source::ServiceInstanceRelation(_) => SourceKind::ServiceInstanceRelation,
        }
    }

    /// Minute time bucket shared by every source of one metric
    pub fn time_bucket(&self) -> i64 {
        match self {
            Source::ServiceInstanceUpdate(s) => s.time_bucket,
            Source::All(s) => s.time_bucket,
            Source::Service(s) => s.time_bucket,
            Source::ServiceInstance(s) => s.time_bucket,
            Source::Endpoint(s) => s.time_bucket,
            Source::ServiceRelation(s) => s.time_bucket,
            Source::ServiceInstanceRelation(s) => s.time_bucket,
        }
    }
}

/// Source variant tag (used for logging and metric labels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ServiceInstanceUpdate,
    All,
    Service,
    ServiceInstance,
    Endpoint,
    ServiceRelation,
    ServiceInstanceRelation,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::ServiceInstanceUpdate => "service_instance_update",
            SourceKind::All => "all",
            SourceKind::Service => "service",
            SourceKind::ServiceInstance => "service_instance",
            SourceKind::Endpoint => "endpoint",
            SourceKind::ServiceRelation => "service_relation",
            SourceKind::ServiceInstanceRelation => "service_instance_relation",
        }
    }

    /// Node events describe a single entity
    pub fn is_node(self) -> bool {
        matches!(
            self,
            SourceKind::All | SourceKind::Service | SourceKind::ServiceInstance | SourceKind::Endpoint
        )
    }

    /// Relation events describe an edge between two entities
    pub fn is_relation(self) -> bool {
        matches!(
            self,
            SourceKind::ServiceRelation | SourceKind::ServiceInstanceRelation
        )
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
